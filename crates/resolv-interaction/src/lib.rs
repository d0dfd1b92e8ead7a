//! Model-service interaction for Resolv.
//!
//! - `model_service`: The `ModelService` boundary trait
//! - `gemini_api_agent`: Gemini REST implementation with function calling
//! - `dialogue`: The tool-calling `DialogueSession`
//! - `config`: secret.json / config.toml / environment loading
//! - `coach`: The coaching persona's instruction and greeting

pub mod coach;
pub mod config;
pub mod dialogue;
pub mod gemini_api_agent;
pub mod model_service;

pub use coach::{COACH_GREETING, COACH_INSTRUCTION};
pub use config::ResolvSettings;
pub use dialogue::{DialogueOptions, DialogueSession, FALLBACK_REPLY};
pub use gemini_api_agent::GeminiApiAgent;
pub use model_service::{ModelRequest, ModelResponse, ModelService};
