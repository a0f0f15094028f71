//! Chronicle API Models
//!
//! - Memory: query, ingest and update DTOs
//! - Error: the `{kind, message}` error body

mod error;
mod memory;

pub use error::*;
pub use memory::*;
