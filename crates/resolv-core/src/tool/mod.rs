//! Tool-calling domain module.
//!
//! - `contract`: The `saveResolution` declaration handed to the model
//! - `invocation`: Invocations, results and the `ToolExecutor` seam

mod contract;
mod invocation;

pub use contract::{SAVE_RESOLUTION_FIELDS, SAVE_RESOLUTION_TOOL, ToolDeclaration};
pub use invocation::{ToolExecutor, ToolInvocation, ToolResult};
