pub mod health;

use axum::{
    extract::Request,
    http::{header, HeaderValue},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::documents;
use crate::payments;
use crate::security;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/csrf-token", get(security::handlers::handle_csrf_token))
        .route(
            "/api/process-payment",
            post(payments::handlers::handle_process_payment),
        )
        .route(
            "/api/initiate-payment",
            post(payments::handlers::handle_initiate_payment),
        )
        .route(
            "/api/generate-document",
            post(documents::handlers::handle_generate_document),
        )
        // Static single-page front end; unknown paths fall through to it.
        .fallback_service(static_files)
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

/// Conservative security headers applied to every response, static files
/// included.
async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'self'; frame-ancestors 'none'"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::{Request as HttpRequest, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::documents::renderer::BasicRenderer;
    use crate::payments::gateway::{
        Checkout, GatewayError, PaymentGateway, VerificationOutcome,
    };
    use crate::security::gate::Gate;
    use crate::state::AppState;

    enum MockMode {
        Success,
        Declined,
        ServerError,
    }

    struct MockGateway {
        mode: MockMode,
    }

    #[async_trait]
    impl PaymentGateway for MockGateway {
        async fn verify(&self, _reference: &str) -> Result<VerificationOutcome, GatewayError> {
            match self.mode {
                MockMode::Success => Ok(VerificationOutcome {
                    success: true,
                    status: "success".to_string(),
                }),
                MockMode::Declined => Ok(VerificationOutcome {
                    success: false,
                    status: "failed".to_string(),
                }),
                MockMode::ServerError => Err(GatewayError::Api {
                    status: 502,
                    message: "bad gateway".to_string(),
                }),
            }
        }

        async fn initialize(
            &self,
            _email: &str,
            _amount: f64,
            _currency: &str,
        ) -> Result<Checkout, GatewayError> {
            Ok(Checkout {
                checkout_url: "https://checkout.example/abc".to_string(),
                reference: "ref_test_1".to_string(),
            })
        }
    }

    fn app(mode: MockMode) -> Router {
        let config = Config {
            paystack_secret_key: "sk_test".to_string(),
            session_secret: "session-secret".to_string(),
            static_dir: "static".to_string(),
            port: 0,
            rust_log: "info".to_string(),
        };
        let state = AppState {
            config,
            gate: Arc::new(Gate::new("session-secret".to_string())),
            gateway: Arc::new(MockGateway { mode }),
            renderer: Arc::new(BasicRenderer),
        };
        build_router(state).layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))))
    }

    fn post_json(uri: &str, body: &Value) -> HttpRequest<Body> {
        HttpRequest::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(MockMode::Success)
            .oneshot(
                HttpRequest::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_security_headers_present() {
        let response = app(MockMode::Success)
            .oneshot(
                HttpRequest::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
        assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
    }

    #[tokio::test]
    async fn test_csrf_token_issued_with_session_cookie() {
        let response = app(MockMode::Success)
            .oneshot(
                HttpRequest::builder()
                    .uri("/api/csrf-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get("set-cookie")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("sid="));
        assert!(cookie.contains("HttpOnly"));
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["token"].as_str().unwrap().len(), 64);
    }

    #[tokio::test]
    async fn test_generate_document_both_succeeds() {
        let body = json!({
            "packageType": "both",
            "work_experience": "Five years building backend services.",
            "education": "BSc Computer Science",
            "skills": "Rust, PostgreSQL",
        });
        let response = app(MockMode::Success)
            .oneshot(post_json("/api/generate-document", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["documents"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_generate_document_too_long_rejected() {
        let body = json!({
            "packageType": "both",
            "work_experience": "x".repeat(6000),
            "education": "BSc",
            "skills": "Rust",
        });
        let response = app(MockMode::Success)
            .oneshot(post_json("/api/generate-document", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Input too long");
    }

    #[tokio::test]
    async fn test_generate_document_missing_field_named() {
        let body = json!({
            "work_experience": "Five years.",
            "education": "BSc",
            "skills": "Rust",
        });
        let response = app(MockMode::Success)
            .oneshot(post_json("/api/generate-document", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Missing required field: packageType");
    }

    #[tokio::test]
    async fn test_process_payment_verified() {
        let body = json!({
            "reference": "ref_123",
            "email": "user@example.com",
            "phone": "254712345678",
            "gateway": "paystack",
        });
        let response = app(MockMode::Success)
            .oneshot(post_json("/api/process-payment", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn test_process_payment_declined_is_401() {
        let body = json!({
            "reference": "ref_123",
            "email": "user@example.com",
            "phone": "254712345678",
            "gateway": "paystack",
        });
        let response = app(MockMode::Declined)
            .oneshot(post_json("/api/process-payment", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_process_payment_gateway_down_is_503() {
        let body = json!({
            "reference": "ref_123",
            "email": "user@example.com",
            "phone": "254712345678",
            "gateway": "paystack",
        });
        let response = app(MockMode::ServerError)
            .oneshot(post_json("/api/process-payment", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_process_payment_bad_reference_rejected() {
        let body = json!({
            "reference": "ref/../../etc",
            "email": "user@example.com",
            "phone": "254712345678",
            "gateway": "paystack",
        });
        let response = app(MockMode::Success)
            .oneshot(post_json("/api/process-payment", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid reference");
    }

    #[tokio::test]
    async fn test_initiate_payment_returns_checkout_url() {
        let body = json!({
            "email": "user@example.com",
            "amount": 1500,
            "currency": "KES",
        });
        let response = app(MockMode::Success)
            .oneshot(post_json("/api/initiate-payment", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["checkout_url"], "https://checkout.example/abc");
    }

    #[tokio::test]
    async fn test_mutating_route_requires_json_content_type() {
        let request = HttpRequest::builder()
            .method("POST")
            .uri("/api/generate-document")
            .header("content-type", "text/plain")
            .body(Body::from("whatever"))
            .unwrap();
        let response = app(MockMode::Success).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid content type");
    }

    #[tokio::test]
    async fn test_rate_limit_on_payment_scope() {
        let app = app(MockMode::Success);
        let body = json!({
            "email": "user@example.com",
            "amount": 100,
            "currency": "KES",
        });
        // Payment scope allows 10 per hour per client.
        for _ in 0..10 {
            let response = app
                .clone()
                .oneshot(post_json("/api/initiate-payment", &body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        let response = app
            .clone()
            .oneshot(post_json("/api/initiate-payment", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert!(body["retry_after"].as_u64().unwrap() > 0);
    }
}
