//! Repository Ports
//!
//! Abstract interfaces for data persistence operations.

mod vector_store;

pub use vector_store::*;
