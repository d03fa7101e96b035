//! Axum router construction and route mapping.
//!
//! The [`app`] function wires every endpoint to its handler and returns a
//! ready-to-serve [`axum::Router`].

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::{HeaderMap, HeaderValue, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::errors::{generate_request_id, S3Error};
use crate::AppState;

/// Build the axum [`Router`] with all routes.
///
/// The returned router is ready to be passed to `axum::serve`.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint (not part of the storage API).
        .route("/health", get(health_check))
        // Service-level: GET / -> ListBuckets
        .route("/", get(handle_list_buckets))
        // Bucket-level routes
        .route("/:bucket", put(handle_create_bucket))
        .route("/:bucket", delete(handle_delete_bucket))
        // Object-level routes (wildcard key captures slashes)
        .route("/:bucket/*key", put(handle_put_object))
        .route("/:bucket/*key", get(handle_get_object))
        .route("/:bucket/*key", delete(handle_delete_object))
        .with_state(state)
        .layer(middleware::from_fn(common_headers_middleware))
        .layer(TraceLayer::new_for_http())
        // Disable the default 2MB body size limit (objects can be large).
        .layer(DefaultBodyLimit::disable())
}

// -- Common headers middleware -----------------------------------------------

/// Tower middleware that adds common response headers to every response:
/// - `x-amz-request-id`: 16-character uppercase hex string
/// - `Date`: RFC 7231 formatted timestamp
/// - `Server`: `triple-s`
async fn common_headers_middleware(req: Request<axum::body::Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    // Only set x-amz-request-id if not already present (the error renderer
    // may have set it).
    if !headers.contains_key("x-amz-request-id") {
        let request_id = generate_request_id();
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            headers.insert("x-amz-request-id", value);
        }
    }

    let date = httpdate::fmt_http_date(std::time::SystemTime::now());
    if let Ok(value) = HeaderValue::from_str(&date) {
        headers.insert("date", value);
    }
    headers.insert("server", HeaderValue::from_static("triple-s"));

    response
}

// -- Health check ------------------------------------------------------------

/// `GET /health` -- Returns `{"status": "ok"}` with 200 OK.
async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "application/json")],
        r#"{"status":"ok"}"#,
    )
}

// -- Route dispatch ----------------------------------------------------------

/// `GET /` -- ListBuckets
async fn handle_list_buckets(State(state): State<Arc<AppState>>) -> Result<Response, S3Error> {
    crate::handlers::bucket::list_buckets(state).await
}

/// `PUT /:bucket` -- CreateBucket
async fn handle_create_bucket(
    State(state): State<Arc<AppState>>,
    Path(bucket): Path<String>,
) -> Result<Response, S3Error> {
    crate::handlers::bucket::create_bucket(state, &bucket).await
}

/// `DELETE /:bucket` -- DeleteBucket
async fn handle_delete_bucket(
    State(state): State<Arc<AppState>>,
    Path(bucket): Path<String>,
) -> Result<Response, S3Error> {
    crate::handlers::bucket::delete_bucket(state, &bucket).await
}

/// `PUT /:bucket/*key` -- PutObject
async fn handle_put_object(
    State(state): State<Arc<AppState>>,
    Path((bucket, key)): Path<(String, String)>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<Response, S3Error> {
    crate::handlers::object::put_object(state, &bucket, &key, &headers, &body).await
}

/// `GET /:bucket/*key` -- GetObject
async fn handle_get_object(
    State(state): State<Arc<AppState>>,
    Path((bucket, key)): Path<(String, String)>,
) -> Result<Response, S3Error> {
    crate::handlers::object::get_object(state, &bucket, &key).await
}

/// `DELETE /:bucket/*key` -- DeleteObject
async fn handle_delete_object(
    State(state): State<Arc<AppState>>,
    Path((bucket, key)): Path<(String, String)>,
) -> Result<Response, S3Error> {
    crate::handlers::object::delete_object(state, &bucket, &key).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;
    use tower::ServiceExt;

    async fn body_bytes(response: Response) -> axum::body::Bytes {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
    }

    fn test_app() -> (Router, TempDir) {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let mut config = Config::default();
        config.storage.root = tmp.path().to_path_buf();
        let state = Arc::new(AppState::new(config).expect("failed to build state"));
        (app(state), tmp)
    }

    fn request(method: &str, uri: &str, body: &[u8]) -> Request<axum::body::Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(axum::body::Body::from(body.to_vec()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _tmp) = test_app();
        let response = app.oneshot(request("GET", "/health", b"")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_common_headers_on_every_response() {
        let (app, _tmp) = test_app();
        let response = app.oneshot(request("GET", "/", b"")).await.unwrap();

        assert!(response.headers().contains_key("x-amz-request-id"));
        assert!(response.headers().contains_key("date"));
        assert_eq!(response.headers().get("server").unwrap(), "triple-s");
    }

    #[tokio::test]
    async fn test_bucket_and_object_lifecycle() {
        let (app, _tmp) = test_app();

        let response = app
            .clone()
            .oneshot(request("PUT", "/my-bucket", b""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("location").unwrap(), "/my-bucket");

        let response = app
            .clone()
            .oneshot(request("PUT", "/my-bucket/docs/a.txt", b"hello"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(request("GET", "/my-bucket/docs/a.txt", b""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_bytes(response).await;
        assert_eq!(&body[..], b"hello");

        let response = app
            .clone()
            .oneshot(request("GET", "/", b""))
            .await
            .unwrap();
        let body = body_bytes(response).await;
        let xml = String::from_utf8(body.to_vec()).unwrap();
        assert!(xml.contains("<Name>my-bucket</Name>"));
        assert!(xml.contains("<Status>Active</Status>"));

        let response = app
            .clone()
            .oneshot(request("DELETE", "/my-bucket/docs/a.txt", b""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .clone()
            .oneshot(request("DELETE", "/my-bucket", b""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_error_is_rendered_as_xml() {
        let (app, _tmp) = test_app();
        let response = app
            .oneshot(request("GET", "/no-such-bucket/key.txt", b""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/xml"
        );
        let body = body_bytes(response).await;
        let xml = String::from_utf8(body.to_vec()).unwrap();
        assert!(xml.contains("<Code>NoSuchBucket</Code>"));
    }

    #[tokio::test]
    async fn test_invalid_bucket_name_is_bad_request() {
        let (app, _tmp) = test_app();
        let response = app
            .oneshot(request("PUT", "/UPPERCASE", b""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_nonempty_bucket_conflicts() {
        let (app, _tmp) = test_app();
        app.clone()
            .oneshot(request("PUT", "/my-bucket", b""))
            .await
            .unwrap();
        app.clone()
            .oneshot(request("PUT", "/my-bucket/a.txt", b"x"))
            .await
            .unwrap();

        let response = app
            .oneshot(request("DELETE", "/my-bucket", b""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
