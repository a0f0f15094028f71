//! Value Objects
//!
//! Immutable objects defined by their attributes rather than identity.

mod content_type;
mod data_scope;
mod query_filters;
mod reasoning_mode;
mod record_date;

pub use content_type::*;
pub use data_scope::*;
pub use query_filters::*;
pub use reasoning_mode::*;
pub use record_date::*;
