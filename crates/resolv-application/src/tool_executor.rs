//! Resolution tool executor.
//!
//! Turns a validated `saveResolution` invocation into a board entry. Invalid
//! invocations never touch the store; the complaint is handed back to the
//! model as the tool result so it can ask the user and try again.

use async_trait::async_trait;
use resolv_core::resolution::{Resolution, ResolutionCategory, ResolutionStore};
use resolv_core::tool::{SAVE_RESOLUTION_TOOL, ToolExecutor, ToolInvocation, ToolResult};
use serde_json::{Map, Value};
use thiserror::Error;

/// Outcome returned to the model after a successful commit.
pub const SAVED_OUTCOME: &str = "Resolution saved successfully to the board.";

/// Why an invocation could not be turned into a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("field '{0}' must be a string")]
    NotAString(&'static str),

    #[error("field '{0}' must not be empty")]
    Blank(&'static str),

    #[error("unknown category '{given}'; expected one of: {allowed}")]
    UnknownCategory { given: String, allowed: String },
}

impl ValidationError {
    /// Text handed back to the model.
    fn outcome(&self) -> String {
        match self {
            ValidationError::UnknownTool(_) => self.to_string(),
            _ => format!("Invalid arguments for {SAVE_RESOLUTION_TOOL}: {self}"),
        }
    }
}

/// The validated payload of a `saveResolution` call.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SaveResolutionArgs {
    title: String,
    category: ResolutionCategory,
    motivation: String,
    first_step: String,
}

impl SaveResolutionArgs {
    fn parse(invocation: &ToolInvocation) -> Result<Self, ValidationError> {
        if invocation.name != SAVE_RESOLUTION_TOOL {
            return Err(ValidationError::UnknownTool(invocation.name.clone()));
        }

        let args = &invocation.arguments;
        let title = required_string(args, "title")?;
        let category_text = required_string(args, "category")?;
        let motivation = required_string(args, "motivation")?;
        let first_step = required_string(args, "firstStep")?;

        let category = category_text.parse::<ResolutionCategory>().map_err(|_| {
            ValidationError::UnknownCategory {
                given: category_text.clone(),
                allowed: ResolutionCategory::wire_names().join(", "),
            }
        })?;

        Ok(Self {
            title,
            category,
            motivation,
            first_step,
        })
    }
}

fn required_string(args: &Map<String, Value>, field: &'static str) -> Result<String, ValidationError> {
    match args.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField(field)),
        Some(Value::String(text)) if text.trim().is_empty() => Err(ValidationError::Blank(field)),
        Some(Value::String(text)) => Ok(text.trim().to_string()),
        Some(_) => Err(ValidationError::NotAString(field)),
    }
}

/// Commits `saveResolution` invocations to a `ResolutionStore`.
#[derive(Clone)]
pub struct ResolutionToolExecutor {
    store: ResolutionStore,
}

impl ResolutionToolExecutor {
    pub fn new(store: ResolutionStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ResolutionStore {
        &self.store
    }

    /// Validates and commits one invocation.
    ///
    /// Returns the committed resolution, or the validation failure. The store
    /// is mutated only on success.
    pub fn commit(&self, invocation: &ToolInvocation) -> Result<Resolution, ValidationError> {
        let args = SaveResolutionArgs::parse(invocation)?;
        let resolution = Resolution::new(args.title, args.category, args.motivation, args.first_step);
        self.store.add(resolution.clone());
        Ok(resolution)
    }
}

#[async_trait]
impl ToolExecutor for ResolutionToolExecutor {
    async fn execute(&self, invocation: &ToolInvocation) -> ToolResult {
        match self.commit(invocation) {
            Ok(resolution) => {
                tracing::info!(
                    "[ToolExecutor] Saved resolution '{}' ({}) as {}",
                    resolution.title,
                    resolution.category,
                    resolution.id
                );
                ToolResult::for_invocation(invocation, SAVED_OUTCOME)
            }
            Err(err) => {
                tracing::warn!(
                    "[ToolExecutor] Rejected invocation {} of '{}': {}",
                    invocation.invocation_id,
                    invocation.name,
                    err
                );
                ToolResult::for_invocation(invocation, err.outcome())
            }
        }
    }
}
