//! Embedder Port
//!
//! Text and images are embedded into one shared vector space so a text
//! query can retrieve image records and the other way round.

use std::path::Path;

use async_trait::async_trait;

use crate::domain::errors::DomainError;

/// Service interface for generating embeddings
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Length of every vector this embedder returns
    fn dimension(&self) -> usize;

    /// Embed a piece of text
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, DomainError>;

    /// Embed the image at `path`.
    ///
    /// Fails with `NotFound` when the file does not exist and `InvalidInput`
    /// when it cannot be read or decoded.
    async fn embed_image(&self, path: &Path) -> Result<Vec<f32>, DomainError>;

    /// Embed several texts; output order matches input order
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed_text(text).await?);
        }
        Ok(vectors)
    }

    /// Embed several images; output order matches input order
    async fn embed_images(&self, paths: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        let mut vectors = Vec::with_capacity(paths.len());
        for path in paths {
            vectors.push(self.embed_image(Path::new(path)).await?);
        }
        Ok(vectors)
    }
}

/// Read an image file for embedding, mapping IO failures to domain errors
pub async fn read_image(operation: &str, path: &Path) -> Result<Vec<u8>, DomainError> {
    match tokio::fs::read(path).await {
        Ok(bytes) if bytes.is_empty() => Err(DomainError::invalid_input(
            operation,
            "image_path",
            format!("{} is empty", path.display()),
        )),
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(DomainError::not_found(operation, "image", path.display()))
        }
        Err(e) => Err(DomainError::invalid_input(
            operation,
            "image_path",
            format!("cannot read {}: {}", path.display(), e),
        )),
    }
}

/// Check that an embedder returned a vector of the expected length
pub fn check_dimension(
    operation: &str,
    service: &str,
    expected: usize,
    vector: &[f32],
) -> Result<(), DomainError> {
    if vector.len() == expected {
        Ok(())
    } else {
        Err(DomainError::upstream(
            operation,
            service,
            format!("expected {} dimensions, got {}", expected, vector.len()),
        ))
    }
}
