pub mod management;
pub mod storages;

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use cosfs_core::error::CosfsError;
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/refresh", post(management::refresh_default))
        .route(
            "/api/storages/{name}/refresh",
            post(management::refresh_storage),
        )
        .route("/api/storages", get(storages::list_storages))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Error wrapper ────────────────────────────────────────────

pub(crate) enum ApiError {
    BadRequest(String),
    Storage(CosfsError),
}

impl From<CosfsError> for ApiError {
    fn from(e: CosfsError) -> Self {
        ApiError::Storage(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Storage(e) => {
                let status = match &e {
                    CosfsError::StorageNotFound(_) => StatusCode::NOT_FOUND,
                    CosfsError::Config(_) | CosfsError::InvalidFileRef(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status.is_server_error() {
                    tracing::error!(error = %e, "Management request failed");
                }
                (status, e.to_string())
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, header};
    use cosfs_core::config::{StaticSettings, StorageSettings};
    use cosfs_storage::local::LocalFileStorage;
    use cosfs_storage::locator::StorageLocator;
    use cosfs_storage::management::{NOT_COS, REFRESHED, StorageManagement};
    use cosfs_storage::memory::MemoryClientFactory;
    use cosfs_storage::storage::CosFileStorage;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn settings() -> StorageSettings {
        StorageSettings {
            secret_id: "AKIDexample".into(),
            secret_key: "secret".into(),
            bucket: "web-1250000000".into(),
            region: "ap-guangzhou".into(),
            chunk_size_kb: 8192,
            endpoint_url: None,
        }
    }

    fn create_test_router(
        tmp: &TempDir,
        admin_token: Option<&str>,
    ) -> (Router, Arc<MemoryClientFactory>) {
        let factory = Arc::new(MemoryClientFactory::default());
        let mut locator = StorageLocator::new("cos");
        locator.register(Arc::new(CosFileStorage::new(
            "cos",
            StaticSettings(settings()),
            factory.clone(),
        )));
        locator.register(Arc::new(
            LocalFileStorage::new(tmp.path(), "local").unwrap(),
        ));
        let state = Arc::new(AppState {
            management: StorageManagement::new(Arc::new(locator)),
            admin_token: admin_token.map(String::from),
        });
        (build_router(state), factory)
    }

    fn post(uri: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn refresh_default_storage() {
        let tmp = TempDir::new().unwrap();
        let (app, factory) = create_test_router(&tmp, None);

        let response = app.oneshot(post("/api/refresh")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], REFRESHED);
        assert_eq!(factory.builds(), 1);
    }

    #[tokio::test]
    async fn refresh_with_credentials_body() {
        let tmp = TempDir::new().unwrap();
        let (app, factory) = create_test_router(&tmp, None);

        let response = app
            .oneshot(post_json(
                "/api/storages/cos/refresh",
                serde_json::json!({ "secret_id": "AKIDrotated", "secret_key": "rotated" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(factory.last_settings().unwrap().secret_id, "AKIDrotated");
    }

    #[tokio::test]
    async fn refresh_with_full_settings_body() {
        let tmp = TempDir::new().unwrap();
        let (app, factory) = create_test_router(&tmp, None);

        let response = app
            .oneshot(post_json(
                "/api/storages/cos/refresh",
                serde_json::json!({
                    "secret_id": "AKIDother",
                    "secret_key": "other",
                    "region": "ap-chengdu",
                    "bucket": "other-1250000000",
                    "chunk_size_kb": 4096
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let used = factory.last_settings().unwrap();
        assert_eq!(used.region, "ap-chengdu");
        assert_eq!(used.chunk_size_kb, 4096);
    }

    #[tokio::test]
    async fn incomplete_settings_body_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let (app, factory) = create_test_router(&tmp, None);

        let response = app
            .oneshot(post_json(
                "/api/storages/cos/refresh",
                serde_json::json!({ "secret_id": "AKID", "secret_key": "k", "region": "ap-chengdu" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(factory.builds(), 0);
    }

    #[tokio::test]
    async fn endpoint_without_full_settings_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let (app, factory) = create_test_router(&tmp, None);

        for body in [
            serde_json::json!({
                "secret_id": "AKID",
                "secret_key": "k",
                "endpoint_url": "https://cos.ap-chengdu.myqcloud.com"
            }),
            serde_json::json!({ "endpoint_url": "https://cos.ap-chengdu.myqcloud.com" }),
        ] {
            let response = app
                .clone()
                .oneshot(post_json("/api/storages/cos/refresh", body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
        assert_eq!(factory.builds(), 0);
    }

    #[tokio::test]
    async fn endpoint_is_applied_with_full_settings() {
        let tmp = TempDir::new().unwrap();
        let (app, factory) = create_test_router(&tmp, None);

        let response = app
            .oneshot(post_json(
                "/api/storages/cos/refresh",
                serde_json::json!({
                    "secret_id": "AKID",
                    "secret_key": "k",
                    "region": "ap-chengdu",
                    "bucket": "b-1250000000",
                    "chunk_size_kb": 1024,
                    "endpoint_url": "https://cos.ap-chengdu.myqcloud.com"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            factory.last_settings().unwrap().endpoint_url.as_deref(),
            Some("https://cos.ap-chengdu.myqcloud.com")
        );
    }

    #[tokio::test]
    async fn local_storage_refresh_is_ignored() {
        let tmp = TempDir::new().unwrap();
        let (app, _) = create_test_router(&tmp, None);

        let response = app
            .oneshot(post("/api/storages/local/refresh"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], NOT_COS);
    }

    #[tokio::test]
    async fn unknown_storage_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let (app, _) = create_test_router(&tmp, None);

        let response = app
            .oneshot(post("/api/storages/missing/refresh"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_storages_hides_credentials() {
        let tmp = TempDir::new().unwrap();
        let (app, _) = create_test_router(&tmp, None);

        let response = app
            .clone()
            .oneshot(post("/api/refresh"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/storages")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        let storages = body.as_array().unwrap();
        assert_eq!(storages.len(), 2);
        let cos = storages.iter().find(|s| s["name"] == "cos").unwrap();
        assert_eq!(cos["storage_type"], "cos");
        assert_eq!(cos["default"], true);
        assert_eq!(cos["initialized"], true);
        assert_eq!(cos["bucket"], "web-1250000000");
        assert!(!body.to_string().contains("secret"));
    }

    #[tokio::test]
    async fn admin_token_is_required_when_configured() {
        let tmp = TempDir::new().unwrap();
        let (app, factory) = create_test_router(&tmp, Some("s3cret"));

        let response = app.clone().oneshot(post("/api/refresh")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let mut request = post("/api/refresh");
        request.headers_mut().insert(
            header::AUTHORIZATION,
            "Bearer wrong".parse().unwrap(),
        );
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(factory.builds(), 0);

        let mut request = post("/api/refresh");
        request.headers_mut().insert(
            header::AUTHORIZATION,
            "Bearer s3cret".parse().unwrap(),
        );
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(factory.builds(), 1);
    }
}
