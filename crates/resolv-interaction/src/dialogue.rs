//! Tool-calling dialogue session.
//!
//! A `DialogueSession` owns one conversation with the model service. Each
//! call to [`DialogueSession::advance`] appends the user's text and keeps
//! requesting model turns, executing any tool invocations in between, until
//! the model answers with plain text.

use crate::coach::COACH_INSTRUCTION;
use crate::model_service::{ModelRequest, ModelResponse, ModelService};
use resolv_core::config::DEFAULT_MAX_ROUNDS;
use resolv_core::session::ConversationTurn;
use resolv_core::tool::{ToolDeclaration, ToolExecutor, ToolInvocation, ToolResult};
use resolv_core::{ResolvError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Reply used when the model's final turn carries no text.
pub const FALLBACK_REPLY: &str = "I've noted that down.";

/// Fixed parameters of a dialogue session.
#[derive(Debug, Clone)]
pub struct DialogueOptions {
    pub system_instruction: String,
    pub tools: Vec<ToolDeclaration>,
    /// Maximum model requests per `advance` call
    pub max_rounds: usize,
}

impl Default for DialogueOptions {
    fn default() -> Self {
        Self {
            system_instruction: COACH_INSTRUCTION.to_string(),
            tools: vec![ToolDeclaration::save_resolution()],
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }
}

impl DialogueOptions {
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }
}

/// One continuous conversation with the model service.
pub struct DialogueSession {
    service: Arc<dyn ModelService>,
    options: DialogueOptions,
    history: Vec<ConversationTurn>,
    rounds_used_last: usize,
}

impl DialogueSession {
    /// Binds a new session to `service` after checking the service is usable.
    ///
    /// # Errors
    ///
    /// Returns `ResolvError::Initialization` when credentials are missing,
    /// the service is unreachable, or `max_rounds` is zero.
    pub async fn create(service: Arc<dyn ModelService>, options: DialogueOptions) -> Result<Self> {
        if options.max_rounds == 0 {
            return Err(ResolvError::initialization("max_rounds must be at least 1"));
        }

        service
            .ensure_ready()
            .await
            .map_err(|e| match e {
                ResolvError::Initialization(_) => e,
                other => ResolvError::initialization(other.to_string()),
            })?;

        tracing::info!(
            "[Dialogue] Session created with {} (max_rounds={})",
            service.describe(),
            options.max_rounds
        );

        Ok(Self {
            service,
            options,
            history: Vec::new(),
            rounds_used_last: 0,
        })
    }

    /// Runs one logical user turn to completion and returns the reply text.
    ///
    /// Invocations within a round are executed sequentially in the order the
    /// model issued them, and all of their results are appended as a single
    /// turn before the next request. Nothing is rolled back on failure: the
    /// history keeps every turn appended before the error.
    ///
    /// # Errors
    ///
    /// - `ResolvError::Service` if a round fails
    /// - `ResolvError::ProtocolExhausted` if the model still requests tools
    ///   after `max_rounds` requests
    pub async fn advance(&mut self, user_text: &str, executor: &dyn ToolExecutor) -> Result<String> {
        self.history.push(ConversationTurn::user_text(user_text));
        self.rounds_used_last = 0;

        for round in 1..=self.options.max_rounds {
            self.rounds_used_last = round;
            let mut response = self.request_round().await?;

            if !response.has_invocations() {
                self.history
                    .push(ConversationTurn::assistant(&response.text, Vec::new()));
                tracing::debug!("[Dialogue] Final reply after {} round(s)", round);
                return Ok(if response.text.trim().is_empty() {
                    FALLBACK_REPLY.to_string()
                } else {
                    response.text
                });
            }

            let mut pending = PendingRound::default();
            for invocation in &mut response.invocations {
                pending.register(invocation);
            }
            let invocations = std::mem::take(&mut response.invocations);
            self.history
                .push(ConversationTurn::assistant(&response.text, invocations.clone()));

            tracing::info!(
                "[Dialogue] Round {}: executing {} tool invocation(s)",
                round,
                invocations.len()
            );
            for invocation in &invocations {
                let result = executor.execute(invocation).await;
                pending.resolve(result)?;
            }

            self.history
                .push(ConversationTurn::tool_results(pending.into_results()?));
        }

        tracing::warn!(
            "[Dialogue] Round cap of {} reached without a final reply",
            self.options.max_rounds
        );
        Err(ResolvError::ProtocolExhausted {
            rounds: self.options.max_rounds,
        })
    }

    async fn request_round(&self) -> Result<ModelResponse> {
        let request = ModelRequest {
            system_instruction: &self.options.system_instruction,
            turns: &self.history,
            tools: &self.options.tools,
        };

        self.service.generate(request).await.map_err(|e| match e {
            ResolvError::Service { .. } => e,
            other => ResolvError::service(other.to_string()),
        })
    }

    /// The full append-only conversation.
    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    pub fn turn_count(&self) -> usize {
        self.history.len()
    }

    /// Number of model requests made by the most recent `advance` call.
    pub fn rounds_used_last(&self) -> usize {
        self.rounds_used_last
    }

    pub fn tool_contract(&self) -> &[ToolDeclaration] {
        &self.options.tools
    }

    pub fn options(&self) -> &DialogueOptions {
        &self.options
    }
}

/// Correlation map for the invocations of a single round.
///
/// Results are emitted in registration order regardless of the order they
/// are resolved in.
#[derive(Default)]
struct PendingRound {
    order: Vec<String>,
    results: HashMap<String, Option<ToolResult>>,
}

impl PendingRound {
    /// Registers an invocation, assigning a fresh id when the service sent
    /// none or reused one already pending in this round.
    fn register(&mut self, invocation: &mut ToolInvocation) {
        if invocation.invocation_id.is_empty()
            || self.results.contains_key(&invocation.invocation_id)
        {
            invocation.invocation_id = uuid::Uuid::new_v4().to_string();
        }
        self.order.push(invocation.invocation_id.clone());
        self.results.insert(invocation.invocation_id.clone(), None);
    }

    fn resolve(&mut self, result: ToolResult) -> Result<()> {
        let Some(slot) = self.results.get_mut(&result.invocation_id) else {
            return Err(ResolvError::service(format!(
                "tool result for unknown invocation '{}'",
                result.invocation_id
            )));
        };
        if slot.is_some() {
            return Err(ResolvError::service(format!(
                "duplicate tool result for invocation '{}'",
                result.invocation_id
            )));
        }
        *slot = Some(result);
        Ok(())
    }

    fn into_results(mut self) -> Result<Vec<ToolResult>> {
        self.order
            .iter()
            .map(|id| {
                self.results.remove(id).flatten().ok_or_else(|| {
                    ResolvError::service(format!("no tool result for invocation '{id}'"))
                })
            })
            .collect()
    }
}
