//! Domain Entities
//!
//! Pure domain models without infrastructure dependencies.
//! - MemoryRecord: a stored, retrievable piece of institutional memory
//! - NewMemory: ingest input before it has an id and a vector

mod memory_record;
mod new_memory;

pub use memory_record::*;
pub use new_memory::*;
