//! Resolution domain model.
//!
//! This module contains the committed `Resolution` record and the fixed
//! category set the coach is allowed to file resolutions under.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The life area a resolution belongs to.
///
/// Wire names are the exact strings exposed to the model in the tool
/// contract's enum, so they must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionCategory {
    Health,
    Career,
    Relationships,
    #[serde(rename = "Personal Growth")]
    PersonalGrowth,
    Finance,
    Other,
}

impl ResolutionCategory {
    /// All categories in declaration order.
    pub const ALL: [ResolutionCategory; 6] = [
        ResolutionCategory::Health,
        ResolutionCategory::Career,
        ResolutionCategory::Relationships,
        ResolutionCategory::PersonalGrowth,
        ResolutionCategory::Finance,
        ResolutionCategory::Other,
    ];

    /// Returns the wire name used in the tool contract and on the board.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionCategory::Health => "Health",
            ResolutionCategory::Career => "Career",
            ResolutionCategory::Relationships => "Relationships",
            ResolutionCategory::PersonalGrowth => "Personal Growth",
            ResolutionCategory::Finance => "Finance",
            ResolutionCategory::Other => "Other",
        }
    }

    /// Wire names of every category, in declaration order.
    pub fn wire_names() -> Vec<&'static str> {
        Self::ALL.iter().map(|c| c.as_str()).collect()
    }
}

impl fmt::Display for ResolutionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name any `ResolutionCategory`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for ResolutionCategory {
    type Err = UnknownCategory;

    /// Accepts the exact wire name or a case-insensitive match of it.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .iter()
            .find(|c| c.as_str() == trimmed)
            .or_else(|| {
                Self::ALL
                    .iter()
                    .find(|c| c.as_str().eq_ignore_ascii_case(trimmed))
            })
            .copied()
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// A resolution committed to the user's board.
///
/// Records are created only by the tool executor and removed only by the
/// user. There is no update path; every field is fixed at commit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    /// Unique identifier (UUID format)
    pub id: String,
    /// Concise title, e.g. "Run a Marathon"
    pub title: String,
    pub category: ResolutionCategory,
    /// The user's core "why"
    pub motivation: String,
    /// The immediate first action the user will take
    pub first_step: String,
    /// Creation time, serialized as epoch milliseconds
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Resolution {
    /// Creates a resolution with a fresh id and the current timestamp.
    pub fn new(
        title: impl Into<String>,
        category: ResolutionCategory,
        motivation: impl Into<String>,
        first_step: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            category,
            motivation: motivation.into(),
            first_step: first_step.into(),
            created_at: Utc::now(),
        }
    }
}
