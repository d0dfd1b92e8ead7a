//! Application layer for Resolv.
//!
//! Wires the dialogue session to the resolution board:
//!
//! - `tool_executor`: validates `saveResolution` calls and commits them
//! - `session_factory`: lazily builds dialogue sessions
//! - `turn_controller`: single-flight entry point for user messages

pub mod session_factory;
pub mod tool_executor;
pub mod turn_controller;

pub use session_factory::{GeminiSessionFactory, ServiceSessionFactory, SessionFactory};
pub use tool_executor::{ResolutionToolExecutor, SAVED_OUTCOME, ValidationError};
pub use turn_controller::{APOLOGY, TurnController};
