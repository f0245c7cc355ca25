use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declaration of an external capability the model may request. Parley never
/// executes these itself — it only attaches the declarations to the primary
/// generation call and reacts to the `function-result` turns a collaborator
/// appends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDecl {
    /// Unique name, e.g. "compute_statistics", "render_chart".
    pub name: String,
    /// Human-readable description for the model.
    pub description: String,
    /// JSON Schema of the parameters object.
    pub parameters: Value,
}
