//! ReasoningMode - What kind of prose a query asks for

use serde::{Deserialize, Serialize};

/// Reasoning mode requested alongside a query
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningMode {
    #[default]
    Summary,
    Recommendation,
    Comparison,
}

impl std::fmt::Display for ReasoningMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReasoningMode::Summary => write!(f, "summary"),
            ReasoningMode::Recommendation => write!(f, "recommendation"),
            ReasoningMode::Comparison => write!(f, "comparison"),
        }
    }
}

impl std::str::FromStr for ReasoningMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" => Ok(ReasoningMode::Summary),
            "recommendation" => Ok(ReasoningMode::Recommendation),
            "comparison" => Ok(ReasoningMode::Comparison),
            _ => Err(format!("Unknown reasoning mode: {}", s)),
        }
    }
}
