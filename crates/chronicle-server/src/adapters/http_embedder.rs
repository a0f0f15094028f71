//! HTTP Embedder
//!
//! Calls an OpenAI-compatible `/embeddings` endpoint serving a CLIP model.
//! Texts are sent as plain strings, images as `{"image": "data:..."}`
//! objects so both land in the same vector space.

use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use chronicle::{check_dimension, read_image, DomainError, Embedder, RetryPolicy};

const SERVICE: &str = "embedding";

/// Connection settings for [`HttpEmbedder`]
#[derive(Debug, Clone)]
pub struct HttpEmbedderConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub dimension: usize,
    pub retry: RetryPolicy,
}

/// Embedding service client
#[derive(Clone)]
pub struct HttpEmbedder {
    client: Client,
    config: HttpEmbedderConfig,
}

#[derive(Serialize)]
#[serde(untagged)]
enum EmbeddingInput {
    Text(String),
    Image { image: String },
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [EmbeddingInput],
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

impl HttpEmbedder {
    pub fn new(config: HttpEmbedderConfig) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DomainError::upstream("init", SERVICE, e))?;

        Ok(Self { client, config })
    }

    async fn request(
        &self,
        operation: &str,
        inputs: &[EmbeddingInput],
    ) -> Result<Vec<Vec<f32>>, DomainError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let vectors = self
            .config
            .retry
            .run(operation, || self.send(operation, inputs))
            .await?;

        if vectors.len() != inputs.len() {
            return Err(DomainError::upstream(
                operation,
                SERVICE,
                format!("expected {} embeddings, got {}", inputs.len(), vectors.len()),
            ));
        }
        for vector in &vectors {
            check_dimension(operation, SERVICE, self.config.dimension, vector)?;
        }
        Ok(vectors)
    }

    async fn send(
        &self,
        operation: &str,
        inputs: &[EmbeddingInput],
    ) -> Result<Vec<Vec<f32>>, DomainError> {
        let url = format!("{}/embeddings", self.config.base_url.trim_end_matches('/'));
        let body = EmbeddingRequest {
            input: inputs,
            model: &self.config.model,
        };

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DomainError::upstream(operation, SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(status_error(operation, status, &error_text));
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| DomainError::upstream(operation, SERVICE, e))?;

        parsed.data.sort_by_key(|d| d.index.unwrap_or(usize::MAX));
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    async fn image_input(&self, operation: &str, path: &Path) -> Result<EmbeddingInput, DomainError> {
        let bytes = read_image(operation, path).await?;
        let mime = image_mime(path).ok_or_else(|| {
            DomainError::invalid_input(
                operation,
                "image_path",
                format!("unsupported image format: {}", path.display()),
            )
        })?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        Ok(EmbeddingInput::Image {
            image: format!("data:{};base64,{}", mime, encoded),
        })
    }
}

/// Client errors mean the input was rejected; everything else is upstream
fn status_error(operation: &str, status: StatusCode, body: &str) -> DomainError {
    if status.is_client_error()
        && status != StatusCode::TOO_MANY_REQUESTS
        && status != StatusCode::REQUEST_TIMEOUT
        && status != StatusCode::UNAUTHORIZED
        && status != StatusCode::FORBIDDEN
    {
        DomainError::invalid_input(operation, "input", format!("{}: {}", status, body))
    } else {
        DomainError::upstream(operation, SERVICE, format!("{}: {}", status, body))
    }
}

fn image_mime(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let inputs = [EmbeddingInput::Text(text.to_string())];
        let mut vectors = self.request("embed_text", &inputs).await?;
        vectors
            .pop()
            .ok_or_else(|| DomainError::upstream("embed_text", SERVICE, "no embedding returned"))
    }

    async fn embed_image(&self, path: &Path) -> Result<Vec<f32>, DomainError> {
        let inputs = [self.image_input("embed_image", path).await?];
        let mut vectors = self.request("embed_image", &inputs).await?;
        vectors
            .pop()
            .ok_or_else(|| DomainError::upstream("embed_image", SERVICE, "no embedding returned"))
    }

    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        let inputs: Vec<EmbeddingInput> =
            texts.iter().cloned().map(EmbeddingInput::Text).collect();
        self.request("embed_texts", &inputs).await
    }

    async fn embed_images(&self, paths: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        let mut inputs = Vec::with_capacity(paths.len());
        for path in paths {
            inputs.push(self.image_input("embed_images", Path::new(path)).await?);
        }
        self.request("embed_images", &inputs).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronicle::ErrorKind;

    #[test]
    fn test_image_input_serializes_as_object() {
        let inputs = vec![
            EmbeddingInput::Text("flood map".into()),
            EmbeddingInput::Image {
                image: "data:image/png;base64,AAAA".into(),
            },
        ];
        let body = serde_json::to_value(EmbeddingRequest {
            input: &inputs,
            model: "clip",
        })
        .unwrap();

        assert_eq!(body["input"][0], "flood map");
        assert_eq!(body["input"][1]["image"], "data:image/png;base64,AAAA");
        assert_eq!(body["model"], "clip");
    }

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(image_mime(Path::new("a/route.PNG")), Some("image/png"));
        assert_eq!(image_mime(Path::new("photo.jpeg")), Some("image/jpeg"));
        assert_eq!(image_mime(Path::new("notes.txt")), None);
        assert_eq!(image_mime(Path::new("noext")), None);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_error("embed", StatusCode::BAD_REQUEST, "bad image").kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            status_error("embed", StatusCode::TOO_MANY_REQUESTS, "slow down").kind(),
            ErrorKind::Upstream
        );
        assert_eq!(
            status_error("embed", StatusCode::REQUEST_TIMEOUT, "").kind(),
            ErrorKind::Upstream
        );
        assert_eq!(
            status_error("embed", StatusCode::BAD_GATEWAY, "").kind(),
            ErrorKind::Upstream
        );
    }

    #[tokio::test]
    async fn test_unsupported_image_is_invalid_input() {
        let embedder = HttpEmbedder::new(HttpEmbedderConfig {
            base_url: "http://127.0.0.1:9".into(),
            model: "clip".into(),
            api_key: None,
            timeout: Duration::from_secs(1),
            dimension: 512,
            retry: RetryPolicy::none(),
        })
        .unwrap();

        let path = std::env::temp_dir().join("chronicle-http-embedder-scan.tiff");
        std::fs::write(&path, b"II*\0").unwrap();

        let err = embedder.embed_image(&path).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = embedder.embed_image(Path::new("/missing/route.png")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
