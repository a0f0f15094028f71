//! NewMemory - Ingest input before an id and vector exist

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::memory_record::{payload_keys, Payload};
use crate::domain::value_objects::ContentType;

/// Content plus metadata submitted for ingest.
///
/// `metadata` must carry `department`, `date`, `outcome` and `type`; any
/// other keys are stored verbatim in the payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewMemory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default)]
    pub metadata: Payload,
}

impl NewMemory {
    /// A text memory with the required metadata
    pub fn text(
        text: impl Into<String>,
        department: impl Into<String>,
        date: impl Into<String>,
        outcome: impl Into<String>,
    ) -> Self {
        Self {
            text: Some(text.into()),
            image_path: None,
            metadata: Self::base_metadata(ContentType::Text, department, date, outcome),
        }
    }

    /// An image memory with the required metadata
    pub fn image(
        image_path: impl Into<String>,
        department: impl Into<String>,
        date: impl Into<String>,
        outcome: impl Into<String>,
    ) -> Self {
        Self {
            text: None,
            image_path: Some(image_path.into()),
            metadata: Self::base_metadata(ContentType::Image, department, date, outcome),
        }
    }

    /// Attach a description to an image memory (stored as `text`)
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.text = Some(description.into());
        self
    }

    pub fn with_location(self, location: impl Into<String>) -> Self {
        self.with_attribute(payload_keys::LOCATION, location.into())
    }

    pub fn with_tags<I, S>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: Vec<Value> = tags.into_iter().map(|t| Value::String(t.into())).collect();
        self.with_attribute(payload_keys::TAGS, tags)
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Declared `type` tag, if present and a string
    pub fn type_tag(&self) -> Option<&str> {
        self.metadata.get(payload_keys::TYPE).and_then(Value::as_str)
    }

    fn base_metadata(
        content_type: ContentType,
        department: impl Into<String>,
        date: impl Into<String>,
        outcome: impl Into<String>,
    ) -> Payload {
        let mut metadata = Payload::new();
        metadata.insert(payload_keys::DEPARTMENT.into(), Value::String(department.into()));
        metadata.insert(payload_keys::DATE.into(), Value::String(date.into()));
        metadata.insert(payload_keys::OUTCOME.into(), Value::String(outcome.into()));
        metadata.insert(payload_keys::TYPE.into(), Value::String(content_type.to_string()));
        metadata
    }
}
