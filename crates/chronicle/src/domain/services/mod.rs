//! Domain Services
//!
//! Stateless logic shared by every adapter: filter construction, id
//! derivation, payload hydration, ingest/update planning, reasoning text and
//! the retry policy for upstream calls.

mod content_plan;
mod filter_builder;
mod hydration;
pub mod reasoning;
mod record_id;
mod retry;

pub use content_plan::*;
pub use filter_builder::*;
pub use hydration::*;
pub use record_id::*;
pub use retry::*;
