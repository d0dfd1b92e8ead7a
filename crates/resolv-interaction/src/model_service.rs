//! Boundary to the external language-model service.

use async_trait::async_trait;
use resolv_core::Result;
use resolv_core::session::ConversationTurn;
use resolv_core::tool::{ToolDeclaration, ToolInvocation};

/// Everything the service needs for one round.
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    pub system_instruction: &'a str,
    pub turns: &'a [ConversationTurn],
    pub tools: &'a [ToolDeclaration],
}

/// One completed reply from the service.
///
/// A reply with no invocations is final; otherwise the caller must answer
/// every invocation before asking again.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    pub text: String,
    pub invocations: Vec<ToolInvocation>,
}

impl ModelResponse {
    /// A final, text-only reply.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            invocations: Vec::new(),
        }
    }

    /// A reply requesting tool invocations.
    pub fn invocations(invocations: Vec<ToolInvocation>) -> Self {
        Self {
            text: String::new(),
            invocations,
        }
    }

    pub fn has_invocations(&self) -> bool {
        !self.invocations.is_empty()
    }
}

/// A language-model capability that understands declared tools.
#[async_trait]
pub trait ModelService: Send + Sync {
    /// Human-readable description of the backend, used in logs.
    fn describe(&self) -> String;

    /// Verifies credentials and reachability before a session is bound.
    ///
    /// Failures must be `ResolvError::Initialization`.
    async fn ensure_ready(&self) -> Result<()>;

    /// Sends one round and waits for the complete reply.
    ///
    /// Failures must be `ResolvError::Service`.
    async fn generate(&self, request: ModelRequest<'_>) -> Result<ModelResponse>;
}
