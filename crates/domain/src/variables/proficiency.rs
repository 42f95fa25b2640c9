//! Proficiency ranks and proficiency write values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// Ordered proficiency ranks, `U < T < E < M < L`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum ProficiencyRank {
    /// Untrained
    #[default]
    #[serde(rename = "U")]
    Untrained,
    /// Trained
    #[serde(rename = "T")]
    Trained,
    /// Expert
    #[serde(rename = "E")]
    Expert,
    /// Master
    #[serde(rename = "M")]
    Master,
    /// Legendary
    #[serde(rename = "L")]
    Legendary,
}

impl ProficiencyRank {
    pub const ALL: [ProficiencyRank; 5] = [
        ProficiencyRank::Untrained,
        ProficiencyRank::Trained,
        ProficiencyRank::Expert,
        ProficiencyRank::Master,
        ProficiencyRank::Legendary,
    ];

    /// Get the rank bonus (before adding level).
    pub fn rank_bonus(&self) -> i32 {
        match self {
            ProficiencyRank::Untrained => 0,
            ProficiencyRank::Trained => 2,
            ProficiencyRank::Expert => 4,
            ProficiencyRank::Master => 6,
            ProficiencyRank::Legendary => 8,
        }
    }

    /// One rank up, saturating at Legendary.
    pub fn raised(self) -> Self {
        match self {
            ProficiencyRank::Untrained => ProficiencyRank::Trained,
            ProficiencyRank::Trained => ProficiencyRank::Expert,
            ProficiencyRank::Expert => ProficiencyRank::Master,
            ProficiencyRank::Master | ProficiencyRank::Legendary => ProficiencyRank::Legendary,
        }
    }

    /// One rank down, saturating at Untrained.
    pub fn lowered(self) -> Self {
        match self {
            ProficiencyRank::Untrained | ProficiencyRank::Trained => ProficiencyRank::Untrained,
            ProficiencyRank::Expert => ProficiencyRank::Trained,
            ProficiencyRank::Master => ProficiencyRank::Expert,
            ProficiencyRank::Legendary => ProficiencyRank::Master,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ProficiencyRank::Untrained => "U",
            ProficiencyRank::Trained => "T",
            ProficiencyRank::Expert => "E",
            ProficiencyRank::Master => "M",
            ProficiencyRank::Legendary => "L",
        }
    }

    /// Display label (e.g., "Expert").
    pub fn label(&self) -> &'static str {
        match self {
            ProficiencyRank::Untrained => "Untrained",
            ProficiencyRank::Trained => "Trained",
            ProficiencyRank::Expert => "Expert",
            ProficiencyRank::Master => "Master",
            ProficiencyRank::Legendary => "Legendary",
        }
    }
}

impl fmt::Display for ProficiencyRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ProficiencyRank {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "U" | "UNTRAINED" => Ok(ProficiencyRank::Untrained),
            "T" | "TRAINED" => Ok(ProficiencyRank::Trained),
            "E" | "EXPERT" => Ok(ProficiencyRank::Expert),
            "M" | "MASTER" => Ok(ProficiencyRank::Master),
            "L" | "LEGENDARY" => Ok(ProficiencyRank::Legendary),
            other => Err(DomainError::parse(format!(
                "Unknown proficiency rank: {}",
                other
            ))),
        }
    }
}

/// What a proficiency write carries: a concrete rank, or a relative step
/// (`"1"` raises by one rank, `"-1"` lowers by one).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProficiencyLevel {
    Rank(ProficiencyRank),
    Raise,
    Lower,
}

impl ProficiencyLevel {
    /// The concrete rank, if this is not a relative step.
    pub fn rank(&self) -> Option<ProficiencyRank> {
        match self {
            ProficiencyLevel::Rank(rank) => Some(*rank),
            _ => None,
        }
    }

    /// Resolve against the currently committed rank.
    pub fn apply_to(&self, current: ProficiencyRank) -> ProficiencyRank {
        match self {
            ProficiencyLevel::Rank(rank) => current.max(*rank),
            ProficiencyLevel::Raise => current.raised(),
            ProficiencyLevel::Lower => current.lowered(),
        }
    }
}

impl From<ProficiencyRank> for ProficiencyLevel {
    fn from(rank: ProficiencyRank) -> Self {
        ProficiencyLevel::Rank(rank)
    }
}

impl TryFrom<String> for ProficiencyLevel {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim() {
            "1" => Ok(ProficiencyLevel::Raise),
            "-1" => Ok(ProficiencyLevel::Lower),
            other => other.parse().map(ProficiencyLevel::Rank),
        }
    }
}

impl From<ProficiencyLevel> for String {
    fn from(value: ProficiencyLevel) -> Self {
        match value {
            ProficiencyLevel::Rank(rank) => rank.code().to_string(),
            ProficiencyLevel::Raise => "1".to_string(),
            ProficiencyLevel::Lower => "-1".to_string(),
        }
    }
}

/// Proficiency value with its optional associated attribute variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProficiencyValue {
    pub value: ProficiencyLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl ProficiencyValue {
    pub fn new(rank: ProficiencyRank) -> Self {
        Self {
            value: ProficiencyLevel::Rank(rank),
            attribute: None,
        }
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Committed rank; steps count as untrained until applied.
    pub fn rank(&self) -> ProficiencyRank {
        self.value.rank().unwrap_or_default()
    }
}
