use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{create_url_handler, get_url_handler, health_handler};
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/", post(create_url_handler))
            .route("/health", get(health_handler))
            .route("/{short_code}", get(get_url_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ErrorResponse, UrlResponse};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use burrow_shortener::ShortenerService;
    use burrow_storage::InMemoryLinkStore;
    use serde::de::DeserializeOwned;
    use std::sync::Arc;
    use tower::ServiceExt;

    const BASE_URL: &str = "http://short.test";

    fn router() -> Router {
        let shortener = ShortenerService::new(InMemoryLinkStore::new());
        App::router(AppState::new(Arc::new(shortener), BASE_URL))
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json<T: DeserializeOwned>(response: Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn create_returns_short_url() {
        let response = router()
            .oneshot(post_json(r#"{"url":"https://example.com"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: UrlResponse = json(response).await;
        assert_eq!(body.url, "http://short.test/A");
    }

    #[tokio::test]
    async fn create_accepts_uppercase_field() {
        let response = router()
            .oneshot(post_json(r#"{"URL":"https://example.com"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn create_then_resolve() {
        let app = router();

        let created = app
            .clone()
            .oneshot(post_json(r#"{"url":"https://example.com/page"}"#))
            .await
            .unwrap();
        let created: UrlResponse = json(created).await;
        let code = created.url.rsplit('/').next().unwrap().to_owned();

        let again = app
            .clone()
            .oneshot(post_json(r#"{"url":"https://example.com/page"}"#))
            .await
            .unwrap();
        let again: UrlResponse = json(again).await;
        assert_eq!(again.url, created.url);

        let resolved = app.oneshot(get_request(&format!("/{code}"))).await.unwrap();
        assert_eq!(resolved.status(), StatusCode::OK);
        let resolved: UrlResponse = json(resolved).await;
        assert_eq!(resolved.url, "https://example.com/page");
    }

    #[tokio::test]
    async fn invalid_payload_is_rejected() {
        let response = router().oneshot(post_json("")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = json(response).await;
        assert_eq!(body.error, "invalid request payload");
    }

    #[tokio::test]
    async fn empty_url_is_rejected() {
        let response = router().oneshot(post_json(r#"{"url":""}"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = json(response).await;
        assert_eq!(body.error, "url must not be empty");
    }

    #[tokio::test]
    async fn unknown_code_is_not_found() {
        let response = router().oneshot(get_request("/ZZZ")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: ErrorResponse = json(response).await;
        assert_eq!(body.error, "link not found");
    }

    #[tokio::test]
    async fn malformed_code_is_not_found() {
        let response = router().oneshot(get_request("/abc123")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health() {
        let response = router().oneshot(get_request("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = json(response).await;
        assert_eq!(body["status"], "ok");
    }
}
