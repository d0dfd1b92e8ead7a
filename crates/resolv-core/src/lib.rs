pub mod config;
pub mod error;
pub mod resolution;
pub mod session;
pub mod tool;

// Re-export common error type
pub use error::{ResolvError, Result};
