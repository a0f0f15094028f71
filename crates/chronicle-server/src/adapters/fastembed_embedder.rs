//! Local CLIP Embedder (fastembed)
//!
//! CLIP ViT-B/32 text and vision ONNX models. Both produce 512-dimensional
//! vectors in the same space. Inference is blocking, so each call moves the
//! model onto the blocking pool and puts it back afterwards.

use async_trait::async_trait;
use fastembed::{
    EmbeddingModel, ImageEmbedding, ImageEmbeddingModel, ImageInitOptions, InitOptions,
    TextEmbedding,
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use chronicle::{check_dimension, DomainError, Embedder};

const SERVICE: &str = "fastembed";

/// CLIP ViT-B/32 output size
pub const CLIP_DIMENSION: usize = 512;

/// [`Embedder`] running CLIP locally
pub struct FastEmbedEmbedder {
    text_model: Arc<Mutex<Option<TextEmbedding>>>,
    image_model: Arc<Mutex<Option<ImageEmbedding>>>,
}

impl FastEmbedEmbedder {
    /// Load (and download on first use) both CLIP models
    pub async fn load() -> Result<Self, DomainError> {
        tracing::info!("Initializing fastembed CLIP ViT-B/32 models...");

        let (text, image) = tokio::task::spawn_blocking(|| {
            let text = TextEmbedding::try_new(InitOptions::new(EmbeddingModel::ClipVitB32))?;
            let image =
                ImageEmbedding::try_new(ImageInitOptions::new(ImageEmbeddingModel::ClipVitB32))?;
            Ok::<_, anyhow::Error>((text, image))
        })
        .await
        .map_err(|e| DomainError::upstream("init", SERVICE, e))?
        .map_err(|e| DomainError::upstream("init", SERVICE, e))?;

        Ok(Self {
            text_model: Arc::new(Mutex::new(Some(text))),
            image_model: Arc::new(Mutex::new(Some(image))),
        })
    }

    async fn run_text(&self, operation: &str, texts: Vec<String>) -> Result<Vec<Vec<f32>>, DomainError> {
        let mut guard = self.text_model.lock().await;
        let mut owned_model = guard
            .take()
            .ok_or_else(|| DomainError::upstream(operation, SERVICE, "text model unavailable"))?;

        let (result, returned_model) = tokio::task::spawn_blocking(move || {
            let result = owned_model.embed(texts, None);
            (result, owned_model)
        })
        .await
        .map_err(|e| DomainError::upstream(operation, SERVICE, e))?;

        *guard = Some(returned_model);
        let vectors = result.map_err(|e| DomainError::upstream(operation, SERVICE, e))?;
        for vector in &vectors {
            check_dimension(operation, SERVICE, CLIP_DIMENSION, vector)?;
        }
        Ok(vectors)
    }

    async fn run_images(&self, operation: &str, paths: Vec<String>) -> Result<Vec<Vec<f32>>, DomainError> {
        for path in &paths {
            if !tokio::fs::try_exists(path).await.unwrap_or(false) {
                return Err(DomainError::not_found(operation, "image", path));
            }
        }

        let mut guard = self.image_model.lock().await;
        let mut owned_model = guard
            .take()
            .ok_or_else(|| DomainError::upstream(operation, SERVICE, "image model unavailable"))?;

        let (result, returned_model) = tokio::task::spawn_blocking(move || {
            let result = owned_model.embed(paths, None);
            (result, owned_model)
        })
        .await
        .map_err(|e| DomainError::upstream(operation, SERVICE, e))?;

        *guard = Some(returned_model);
        // Decode failures surface here; the files are known to exist.
        let vectors =
            result.map_err(|e| DomainError::invalid_input(operation, "image_path", e.to_string()))?;
        for vector in &vectors {
            check_dimension(operation, SERVICE, CLIP_DIMENSION, vector)?;
        }
        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for FastEmbedEmbedder {
    fn dimension(&self) -> usize {
        CLIP_DIMENSION
    }

    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        self.run_text("embed_text", vec![text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| DomainError::upstream("embed_text", SERVICE, "no embedding returned"))
    }

    async fn embed_image(&self, path: &Path) -> Result<Vec<f32>, DomainError> {
        self.run_images("embed_image", vec![path.to_string_lossy().into_owned()])
            .await?
            .pop()
            .ok_or_else(|| DomainError::upstream("embed_image", SERVICE, "no embedding returned"))
    }

    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.run_text("embed_texts", texts.to_vec()).await
    }

    async fn embed_images(&self, paths: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        if paths.is_empty() {
            return Ok(Vec::new());
        }
        self.run_images("embed_images", paths.to_vec()).await
    }
}
