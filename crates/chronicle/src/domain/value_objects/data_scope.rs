//! DataScope - Which content types a query should consider

use serde::{Deserialize, Serialize};

use super::ContentType;

/// Query-level content scope (`data_type` on the query API)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DataScope {
    Text,
    Image,
    #[default]
    Both,
}

impl DataScope {
    /// The type restriction this scope imposes, if any
    pub fn content_type(&self) -> Option<ContentType> {
        match self {
            DataScope::Text => Some(ContentType::Text),
            DataScope::Image => Some(ContentType::Image),
            DataScope::Both => None,
        }
    }
}
