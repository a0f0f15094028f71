//! QueryFilters - Structured restriction of a retrieval

use serde::{Deserialize, Serialize};

use super::{parse_record_date, ContentType};
use crate::domain::errors::DomainError;

/// Optional predicate over record fields.
///
/// Scalars match exactly, `tags` matches when any listed tag is present on the
/// record, and `date_from`/`date_to` are inclusive bounds. A value with no
/// field set matches every record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(
        rename = "type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub content_type: Option<ContentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,
}

impl QueryFilters {
    /// Filters restricted to one department
    pub fn department(department: impl Into<String>) -> Self {
        Self {
            department: Some(department.into()),
            ..Default::default()
        }
    }

    /// Filters matching any of the given tags
    pub fn tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: Some(tags.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }

    pub fn with_date_range(mut self, from: Option<String>, to: Option<String>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    /// Check date bounds before the filter reaches the store
    pub fn validate(&self) -> Result<(), DomainError> {
        let from = Self::checked_bound("date_from", self.date_from.as_deref())?;
        let to = Self::checked_bound("date_to", self.date_to.as_deref())?;

        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(DomainError::invalid_input(
                    "query",
                    "date_from",
                    format!(
                        "date_from ({}) is after date_to ({})",
                        self.date_from.as_deref().unwrap_or_default(),
                        self.date_to.as_deref().unwrap_or_default()
                    ),
                ));
            }
        }

        Ok(())
    }

    fn checked_bound(
        field: &str,
        value: Option<&str>,
    ) -> Result<Option<chrono::DateTime<chrono::Utc>>, DomainError> {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            None => Ok(None),
            Some(v) => parse_record_date(v).map(Some).ok_or_else(|| {
                DomainError::validation(
                    "query",
                    field,
                    format!("'{}' is not an ISO-8601 date", v),
                )
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserializes_type_field() {
        let filters: QueryFilters =
            serde_json::from_str(r#"{"department": "Finance", "type": "image"}"#).unwrap();
        assert_eq!(filters.department.as_deref(), Some("Finance"));
        assert_eq!(filters.content_type, Some(ContentType::Image));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let result = serde_json::from_str::<QueryFilters>(r#"{"departmnet": "Finance"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_unparseable_bound() {
        let filters = QueryFilters::default().with_date_range(Some("soon".into()), None);
        let err = filters.validate().unwrap_err();
        assert!(err.to_string().contains("date_from"));
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let filters = QueryFilters::default()
            .with_date_range(Some("2024-02-01".into()), Some("2024-01-01".into()));
        assert!(filters.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_single_bound() {
        let filters = QueryFilters::default().with_date_range(None, Some("2024-01-01".into()));
        assert!(filters.validate().is_ok());
    }
}
