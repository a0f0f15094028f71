//! Application Layer (Use Cases)
//!
//! Orchestrates domain operations and coordinates between
//! the vector store, the embedder and the LLM.

mod memory_service;
mod reasoning_service;

pub use memory_service::MemoryService;
pub use reasoning_service::ReasoningService;
