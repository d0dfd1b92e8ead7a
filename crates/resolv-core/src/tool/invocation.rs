//! Tool invocation and result types exchanged with the model service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A request from the model to run a declared tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Correlation token echoed back in the matching `ToolResult`
    pub invocation_id: String,
    pub name: String,
    pub arguments: Map<String, Value>,
    /// Opaque token some services attach to a call and require back verbatim
    /// when the call is replayed in history
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl ToolInvocation {
    pub fn new(
        invocation_id: impl Into<String>,
        name: impl Into<String>,
        arguments: Map<String, Value>,
    ) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            name: name.into(),
            arguments,
            signature: None,
        }
    }
}

/// Outcome of one tool invocation, returned to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub invocation_id: String,
    /// Name of the invoked tool; the wire format needs it next to the id.
    pub name: String,
    /// Human-readable confirmation or complaint the model can act on
    pub outcome: String,
}

impl ToolResult {
    /// Builds the result answering `invocation`.
    pub fn for_invocation(invocation: &ToolInvocation, outcome: impl Into<String>) -> Self {
        Self {
            invocation_id: invocation.invocation_id.clone(),
            name: invocation.name.clone(),
            outcome: outcome.into(),
        }
    }
}

/// Callback that carries out a tool invocation on behalf of the dialogue.
///
/// Executors may mutate external state. They never fail: problems with the
/// invocation are reported in the returned `ToolResult` so the model can
/// correct itself on the next round.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, invocation: &ToolInvocation) -> ToolResult;
}
