//! Infrastructure Adapters
//!
//! Implementations of domain ports for external systems.

pub mod http_embedder;
pub mod in_memory;
pub mod openai;
pub mod qdrant;

#[cfg(feature = "fastembed")]
pub mod fastembed_embedder;

// Re-exports
pub use http_embedder::{HttpEmbedder, HttpEmbedderConfig};
pub use in_memory::InMemoryVectorStore;
pub use openai::{OpenAiChatProvider, OpenAiConfig};
pub use qdrant::QdrantStore;

#[cfg(feature = "fastembed")]
pub use fastembed_embedder::FastEmbedEmbedder;
