use thiserror::Error;

/// Unified error type for the Parley workspace.
#[derive(Error, Debug)]
pub enum ParleyError {
    // ── Gateway errors ─────────────────────────────────────────
    #[error("gateway error: {0}")]
    Gateway(String),

    #[error("gateway rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    // ── Session errors ─────────────────────────────────────────
    #[error("session error: {0}")]
    Session(String),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    // ── Config errors ──────────────────────────────────────────
    #[error("config error: {0}")]
    Config(String),

    // ── Generic wrappers ───────────────────────────────────────
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ParleyError>;
