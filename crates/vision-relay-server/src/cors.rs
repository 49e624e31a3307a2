use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tracing::warn;

use crate::routes::AppState;

/// Whether a request carrying `origin` may proceed.
///
/// Requests without an `Origin` header come from non-browser clients and
/// always pass. With no configured origin, every browser origin is refused.
pub fn origin_allowed(allowed: Option<&str>, origin: Option<&HeaderValue>) -> bool {
    match origin {
        None => true,
        Some(origin) => match allowed {
            Some(allowed) => origin.as_bytes() == allowed.as_bytes(),
            None => false,
        },
    }
}

/// Axum middleware that refuses requests from foreign origins before any
/// handler runs.
pub async fn origin_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let origin = request.headers().get(header::ORIGIN);
    if origin_allowed(state.allowed_origin.as_deref(), origin) {
        return next.run(request).await;
    }

    warn!(
        origin = ?origin,
        method = %request.method(),
        path = %request.uri().path(),
        "rejected request from disallowed origin"
    );
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "error": "Not allowed by CORS" })),
    )
        .into_response()
}

/// CORS response headers for the configured frontend, credentials allowed.
pub fn cors_layer(allowed: Option<&str>) -> CorsLayer {
    let origin = match allowed.and_then(|o| HeaderValue::from_str(o).ok()) {
        Some(origin) => origin,
        None => return CorsLayer::new(),
    };

    CorsLayer::new()
        .allow_origin(AllowOrigin::exact(origin))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::test_helpers::{test_router, StubAnnotator, TEST_ORIGIN};

    #[test]
    fn no_origin_header_passes() {
        assert!(origin_allowed(Some("https://app.example.com"), None));
        assert!(origin_allowed(None, None));
    }

    #[test]
    fn matching_origin_passes() {
        let origin = HeaderValue::from_static("https://app.example.com");
        assert!(origin_allowed(Some("https://app.example.com"), Some(&origin)));
    }

    #[test]
    fn foreign_origin_is_refused() {
        let origin = HeaderValue::from_static("https://evil.example.com");
        assert!(!origin_allowed(Some("https://app.example.com"), Some(&origin)));
    }

    #[test]
    fn origin_match_is_exact() {
        let origin = HeaderValue::from_static("https://app.example.com:8443");
        assert!(!origin_allowed(Some("https://app.example.com"), Some(&origin)));
        let origin = HeaderValue::from_static("http://app.example.com");
        assert!(!origin_allowed(Some("https://app.example.com"), Some(&origin)));
    }

    #[test]
    fn unconfigured_origin_refuses_browsers() {
        let origin = HeaderValue::from_static("http://localhost:3000");
        assert!(!origin_allowed(None, Some(&origin)));
    }

    #[tokio::test]
    async fn foreign_origin_rejected_before_handler() {
        let stub = StubAnnotator::ok("{}");
        let (app, _uploads) = test_router(stub.clone());
        let resp = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/anotate")
                    .header("origin", "https://evil.example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(stub.calls(), 0);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], br#"{"error":"Not allowed by CORS"}"#);
    }

    #[tokio::test]
    async fn allowed_origin_gets_cors_headers() {
        let (app, _uploads) = test_router(StubAnnotator::ok("{}"));
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("origin", TEST_ORIGIN)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let headers = resp.headers();
        assert_eq!(
            headers.get("access-control-allow-origin").unwrap(),
            TEST_ORIGIN
        );
        assert_eq!(
            headers.get("access-control-allow-credentials").unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn preflight_from_allowed_origin() {
        let (app, _uploads) = test_router(StubAnnotator::ok("{}"));
        let resp = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/anotate")
                    .header("origin", TEST_ORIGIN)
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("access-control-allow-origin").unwrap(),
            TEST_ORIGIN
        );
    }

    #[tokio::test]
    async fn preflight_from_foreign_origin_is_refused() {
        let (app, _uploads) = test_router(StubAnnotator::ok("{}"));
        let resp = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/anotate")
                    .header("origin", "https://evil.example.com")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert!(resp.headers().get("access-control-allow-origin").is_none());
    }
}
