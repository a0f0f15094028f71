//! Chronicle API Routes
//!
//! - / and /health - Service info (public)
//! - /query - Retrieval with reasoning and summary
//! - /ingest, /ingest/batch - Store text and image records
//! - /update/:memory_id, /memories/:memory_id - Edit and fetch one record

pub mod memory;
pub mod swagger;
pub mod system;

use axum::{middleware, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{auth, AppState};

/// Build the full router over `state`
pub fn app(state: AppState) -> Router {
    // Protected routes (require authentication when a key is configured)
    let protected_routes = Router::new()
        .merge(memory::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    let openapi = swagger::ApiDoc::openapi();

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .merge(system::router())
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::application::ReasoningService;
    use crate::test_support::memory_service;

    async fn test_app(api_key: Option<&str>) -> Router {
        let (memory, _) = memory_service().await;
        app(AppState {
            memory: Arc::new(memory),
            reasoning: Arc::new(ReasoningService::from_provider(None)),
            api_key: api_key.map(Arc::from),
        })
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    fn flood_report() -> Value {
        json!({
            "text": "Flood evacuation of the river district went smoothly",
            "department": "Emergency",
            "date": "2019-05-01",
            "outcome": "success",
            "type": "text",
            "tags": ["flood", "evacuation"]
        })
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = test_app(Some("secret")).await;
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let (status, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_service_info_lists_endpoints() {
        let app = test_app(None).await;
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let (status, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["collection"], "memories");
        assert_eq!(body["reasoning"], "template");
        assert!(body["endpoints"]
            .as_array()
            .unwrap()
            .iter()
            .any(|e| e == "POST /query"));
    }

    #[tokio::test]
    async fn test_ingest_then_query() {
        let app = test_app(None).await;

        let (status, ingested) =
            send(&app, json_request(Method::POST, "/ingest", flood_report())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ingested["message"], "Text ingested successfully");

        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                "/query",
                json!({"query": "flood evacuation", "filters": {"department": "Emergency"}}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["query"], "flood evacuation");
        let memories = body["memories"].as_array().unwrap();
        assert_eq!(memories.len(), 1);
        assert_eq!(memories[0]["id"], ingested["id"]);
        assert_eq!(memories[0]["type"], "text");
        assert_eq!(body["reasoning"], "Summary of 1 relevant memories.");
        assert!(body["summary"]
            .as_str()
            .unwrap()
            .starts_with("Summary for 'flood evacuation': Found 1 memories"));
    }

    #[tokio::test]
    async fn test_comparison_mode() {
        let app = test_app(None).await;
        send(&app, json_request(Method::POST, "/ingest", flood_report())).await;

        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                "/query",
                json!({"query": "flood", "reasoning_mode": "comparison"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["reasoning"]
            .as_str()
            .unwrap()
            .starts_with("Comparing retrieved memories: 1 items found."));
    }

    #[tokio::test]
    async fn test_image_scope_excludes_text_records() {
        let app = test_app(None).await;
        send(&app, json_request(Method::POST, "/ingest", flood_report())).await;

        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                "/query",
                json!({"query": "flood", "data_type": "image"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["memories"].as_array().unwrap().is_empty());
        assert_eq!(
            body["summary"],
            "Summary for 'flood': Found 0 memories.\n\nSources:"
        );
    }

    #[tokio::test]
    async fn test_ingest_missing_text_is_bad_request() {
        let app = test_app(None).await;
        let mut report = flood_report();
        report.as_object_mut().unwrap().remove("text");

        let (status, body) = send(&app, json_request(Method::POST, "/ingest", report)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_input");
    }

    #[tokio::test]
    async fn test_ingest_missing_department_is_validation_error() {
        let app = test_app(None).await;
        let mut report = flood_report();
        report.as_object_mut().unwrap().remove("department");

        let (status, body) = send(&app, json_request(Method::POST, "/ingest", report)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "validation");
        assert!(body["message"].as_str().unwrap().contains("department"));
    }

    #[tokio::test]
    async fn test_unknown_filter_type_is_invalid_input() {
        let app = test_app(None).await;

        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                "/query",
                json!({"query": "flood", "filters": {"type": "video"}}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_input");
    }

    #[tokio::test]
    async fn test_malformed_bodies_use_error_body() {
        let app = test_app(None).await;

        let (status, body) = send(
            &app,
            json_request(Method::POST, "/query", json!({"query": "flood", "limit": -1})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_input");

        let request = Request::builder()
            .method(Method::POST)
            .uri("/ingest")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_input");
    }

    #[tokio::test]
    async fn test_batch_ingest_and_get() {
        let app = test_app(None).await;
        let second = json!({
            "description": "Sandbag wall along the levee",
            "image_path": "data/raw/images/levee.png",
            "department": "Public Works",
            "date": "2019-05-02",
            "outcome": "partial",
            "type": "image"
        });

        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                "/ingest/batch",
                json!({"items": [flood_report(), second]}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ingested"], 2);

        let image_id = body["ids"][1].as_str().unwrap().to_string();
        let request = Request::builder()
            .uri(format!("/memories/{}", image_id))
            .body(Body::empty())
            .unwrap();
        let (status, record) = send(&app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(record["type"], "image");
        assert_eq!(record["image_url"], "data/raw/images/levee.png");
        assert_eq!(record["text"], "Sandbag wall along the levee");
    }

    #[tokio::test]
    async fn test_update_reports_reembedding() {
        let app = test_app(None).await;
        let (_, ingested) =
            send(&app, json_request(Method::POST, "/ingest", flood_report())).await;
        let uri = format!("/update/{}", ingested["id"].as_str().unwrap());

        let (status, body) = send(
            &app,
            json_request(Method::PUT, &uri, json!({"notes": "reviewed"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reembedded"], false);

        let (status, body) = send(
            &app,
            json_request(Method::PUT, &uri, json!({"text": "Evacuation was delayed"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reembedded"], true);
    }

    #[tokio::test]
    async fn test_unknown_memory_is_not_found() {
        let app = test_app(None).await;
        let request = Request::builder()
            .uri("/memories/42")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "not_found");
    }

    #[tokio::test]
    async fn test_malformed_id_is_bad_request() {
        let app = test_app(None).await;

        let (status, body) = send(
            &app,
            json_request(Method::PUT, "/update/not-a-number", json!({"notes": "x"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_input");
    }

    #[tokio::test]
    async fn test_protected_routes_require_key() {
        let app = test_app(Some("secret")).await;

        let (status, _) = send(
            &app,
            json_request(Method::POST, "/query", json!({"query": "flood"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let mut request = json_request(Method::POST, "/query", json!({"query": "flood"}));
        request.headers_mut().insert(
            header::AUTHORIZATION,
            "Bearer secret".parse().unwrap(),
        );
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
    }
}
