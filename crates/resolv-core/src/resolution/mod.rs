//! Resolution domain module.
//!
//! # Module Structure
//!
//! - `model`: Committed record and category set (`Resolution`, `ResolutionCategory`)
//! - `store`: Shared most-recent-first collection with change notifications
//! - `board`: Per-category aggregation for the board chart
//!
//! # Usage
//!
//! ```ignore
//! use resolv_core::resolution::{Resolution, ResolutionCategory, ResolutionStore};
//! ```

mod board;
mod model;
mod store;

// Re-export public API
pub use board::{BOARD_FULL_MARK, CategoryTally, tally_by_category};
pub use model::{Resolution, ResolutionCategory, UnknownCategory};
pub use store::{ResolutionStore, StoreEvent};
