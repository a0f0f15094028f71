//! Error body returned by every failing route

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::{async_trait, Json};
use serde::Serialize;
use utoipa::ToSchema;

use chronicle::{DomainError, ErrorKind};

/// Error response
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// not_found | invalid_input | validation | upstream | cancelled
    #[schema(value_type = String)]
    pub kind: ErrorKind,
    pub message: String,
}

/// Handler error: status plus JSON body
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidInput | ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
        ErrorKind::Cancelled => StatusCode::REQUEST_TIMEOUT,
    }
}

pub fn api_error(err: DomainError) -> ApiError {
    let kind = err.kind();
    let status = status_for(kind);
    if status.is_server_error() {
        tracing::error!("{}", err);
    } else {
        tracing::warn!("{}", err);
    }
    (
        status,
        Json(ErrorResponse {
            kind,
            message: err.to_string(),
        }),
    )
}

/// `Json` extractor whose rejections use the `{kind, message}` body.
/// Malformed or mistyped bodies are `invalid_input`.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(api_error(DomainError::invalid_input(
                "request",
                "body",
                rejection.body_text(),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::Validation), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::InvalidInput), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::Upstream), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(ErrorKind::Cancelled), StatusCode::REQUEST_TIMEOUT);
    }
}
