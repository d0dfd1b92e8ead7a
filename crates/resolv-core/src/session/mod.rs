//! Session domain module.
//!
//! This module contains the conversation turn types shared between the
//! dialogue session and the model service implementations.
//!
//! # Usage
//!
//! ```ignore
//! use resolv_core::session::{ConversationTurn, MessageRole, TurnPart};
//! ```

mod message;

// Re-export public API
pub use message::{ConversationTurn, MessageRole, TurnPart};
