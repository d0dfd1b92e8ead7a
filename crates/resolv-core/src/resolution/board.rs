//! Board aggregation: resolution counts per category for the radar chart.

use super::model::{Resolution, ResolutionCategory};
use serde::{Deserialize, Serialize};

/// Upper bound of the board chart's axis.
pub const BOARD_FULL_MARK: u32 = 5;

/// One axis of the board chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTally {
    /// Category wire name
    pub subject: String,
    pub count: u32,
    pub full_mark: u32,
}

/// Counts resolutions per category.
///
/// Every category appears exactly once, in declaration order, even when its
/// count is zero.
pub fn tally_by_category(resolutions: &[Resolution]) -> Vec<CategoryTally> {
    ResolutionCategory::ALL
        .iter()
        .map(|category| CategoryTally {
            subject: category.as_str().to_string(),
            count: resolutions
                .iter()
                .filter(|r| r.category == *category)
                .count() as u32,
            full_mark: BOARD_FULL_MARK,
        })
        .collect()
}
