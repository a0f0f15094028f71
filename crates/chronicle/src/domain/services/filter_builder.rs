//! Filter Builder
//!
//! Translates [`QueryFilters`] into a store-agnostic [`Predicate`]. Vector
//! store adapters translate the predicate into their native filter form; the
//! predicate can also evaluate itself against a payload.

use std::cmp::Ordering;

use serde_json::Value;

use crate::domain::entities::{payload_keys, Payload};
use crate::domain::value_objects::{parse_record_date, QueryFilters};

/// A single field condition
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Field equals the value (or, for array fields, contains it)
    Equals { key: String, value: String },
    /// Field shares at least one value with `values`
    AnyOf { key: String, values: Vec<String> },
    /// Inclusive date range; a missing bound is unconstrained
    DateRange {
        key: String,
        gte: Option<String>,
        lte: Option<String>,
    },
}

impl Condition {
    pub fn key(&self) -> &str {
        match self {
            Condition::Equals { key, .. }
            | Condition::AnyOf { key, .. }
            | Condition::DateRange { key, .. } => key,
        }
    }

    pub fn matches(&self, payload: &Payload) -> bool {
        let Some(field) = payload.get(self.key()) else {
            return false;
        };

        match self {
            Condition::Equals { value, .. } => field_values(field).any(|v| v == value),
            Condition::AnyOf { values, .. } => {
                field_values(field).any(|v| values.iter().any(|wanted| wanted == v))
            }
            Condition::DateRange { gte, lte, .. } => {
                let Some(date) = field.as_str() else {
                    return false;
                };
                within_bound(date, gte.as_deref(), |o| o != Ordering::Less)
                    && within_bound(date, lte.as_deref(), |o| o != Ordering::Greater)
            }
        }
    }
}

/// Conjunction of conditions
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    must: Vec<Condition>,
}

impl Predicate {
    pub fn conditions(&self) -> &[Condition] {
        &self.must
    }

    pub fn matches(&self, payload: &Payload) -> bool {
        self.must.iter().all(|c| c.matches(payload))
    }
}

/// Build the store predicate for a set of filters.
///
/// Returns `None` when no field is set (blank strings and empty tag lists
/// count as unset), which means the search is unconstrained.
pub fn build_filter(filters: &QueryFilters) -> Option<Predicate> {
    let mut must = Vec::new();

    let exact = [
        (payload_keys::DEPARTMENT, filters.department.as_deref()),
        (payload_keys::OUTCOME, filters.outcome.as_deref()),
        (
            payload_keys::TYPE,
            filters.content_type.as_ref().map(|t| t.as_str()),
        ),
        (payload_keys::LOCATION, filters.location.as_deref()),
    ];

    for (key, value) in exact {
        if let Some(value) = non_blank(value) {
            must.push(Condition::Equals {
                key: key.to_string(),
                value: value.to_string(),
            });
        }
    }

    if let Some(tags) = &filters.tags {
        let mut values: Vec<String> = Vec::new();
        for tag in tags.iter().filter_map(|t| non_blank(Some(t.as_str()))) {
            if !values.iter().any(|v| v == tag) {
                values.push(tag.to_string());
            }
        }
        if !values.is_empty() {
            must.push(Condition::AnyOf {
                key: payload_keys::TAGS.to_string(),
                values,
            });
        }
    }

    let gte = non_blank(filters.date_from.as_deref()).map(str::to_string);
    let lte = non_blank(filters.date_to.as_deref()).map(str::to_string);
    if gte.is_some() || lte.is_some() {
        must.push(Condition::DateRange {
            key: payload_keys::DATE.to_string(),
            gte,
            lte,
        });
    }

    if must.is_empty() {
        None
    } else {
        Some(Predicate { must })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn field_values(field: &Value) -> Box<dyn Iterator<Item = &str> + '_> {
    match field {
        Value::String(s) => Box::new(std::iter::once(s.as_str())),
        Value::Array(items) => Box::new(items.iter().filter_map(Value::as_str)),
        _ => Box::new(std::iter::empty()),
    }
}

/// Compare as instants when both sides parse, lexically otherwise
fn within_bound(date: &str, bound: Option<&str>, accept: fn(Ordering) -> bool) -> bool {
    let Some(bound) = bound else {
        return true;
    };

    let ordering = match (parse_record_date(date), parse_record_date(bound)) {
        (Some(d), Some(b)) => d.cmp(&b),
        _ => date.cmp(bound),
    };
    accept(ordering)
}
