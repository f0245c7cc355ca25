use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

use parley_config::schema::ParleyConfig;
use parley_gateway::ModelGateway;

use crate::session::ChatSession;

/// Snapshot of one session for listing and info endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub message_count: usize,
    pub tools_available: bool,
}

/// Shared collection of live sessions, keyed by id.
///
/// Each session sits behind its own mutex so one slow generation call never
/// blocks traffic to other sessions.
pub struct SessionRegistry {
    gateway: Arc<dyn ModelGateway>,
    config: ParleyConfig,
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<ChatSession>>>>,
}

impl SessionRegistry {
    pub fn new(gateway: Arc<dyn ModelGateway>, config: ParleyConfig) -> Self {
        Self {
            gateway,
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch the session with the given id, or create it (under a fresh id
    /// when none was supplied).
    pub async fn get_or_create(&self, id: Option<Uuid>) -> (Uuid, Arc<Mutex<ChatSession>>) {
        if let Some(id) = id {
            if let Some(session) = self.sessions.read().await.get(&id) {
                return (id, session.clone());
            }
        }

        let id = id.unwrap_or_else(Uuid::new_v4);
        let session = Arc::new(Mutex::new(ChatSession::with_id(
            id,
            self.gateway.clone(),
            &self.config,
        )));
        self.sessions.write().await.insert(id, session.clone());
        info!(session_id = %id, "session created");
        (id, session)
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<Mutex<ChatSession>>> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Remove a session. Returns false when no such session exists.
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            info!(session_id = %id, "session removed");
        }
        removed
    }

    pub async fn summary(&self, id: Uuid) -> Option<SessionSummary> {
        let session = self.get(id).await?;
        let session = session.lock().await;
        Some(SessionSummary {
            session_id: id,
            created_at: session.created_at(),
            message_count: session.transcript().len(),
            tools_available: !session.tools().is_empty(),
        })
    }

    pub async fn list(&self) -> Vec<SessionSummary> {
        let ids: Vec<Uuid> = self.sessions.read().await.keys().copied().collect();
        let mut summaries = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(summary) = self.summary(id).await {
                summaries.push(summary);
            }
        }
        summaries.sort_by_key(|s| s.created_at);
        summaries
    }
}
