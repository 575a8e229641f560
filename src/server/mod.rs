//! JSON API over a [`Gallery`].

mod error;
mod images;
mod likes;
mod mutate;

pub use self::error::ApiError;

use axum::Router;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::HeaderMap;
use axum::response::Json;
use axum::routing::{get, post};
use gallery_library::{Gallery, Limits};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;

const TOKEN_HEADER: &str = "x-upload-token";
/// Room for multipart boundaries and headers on top of the file payloads.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// What the frontend needs to know about this deployment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub build_id: String,
    pub autoplay_ms: u64,
}

#[derive(Clone)]
pub struct AppState {
    gallery: Arc<Gallery>,
    limits: Limits,
    upload_token: Option<Arc<str>>,
    client: Arc<ClientConfig>,
}

impl AppState {
    pub fn new(gallery: Gallery, limits: Limits, upload_token: Option<&str>, client: ClientConfig) -> Self {
        Self {
            gallery: Arc::new(gallery),
            limits,
            upload_token: upload_token.filter(|token| !token.is_empty()).map(Arc::from),
            client: Arc::new(client),
        }
    }

    /// Mutations are open when no token is configured. Otherwise the header
    /// wins, falling back to a token sent in the request body.
    fn authorize(&self, headers: &HeaderMap, body_token: Option<&str>) -> Result<(), ApiError> {
        let Some(expected) = self.upload_token.as_deref() else {
            return Ok(());
        };
        let given = headers
            .get(TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .or(body_token)
            .unwrap_or_default();
        match given == expected {
            true => Ok(()),
            false => Err(ApiError::BadToken),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let settings = state.gallery.settings();
    let upload_limit = settings
        .max_files
        .saturating_mul(usize::try_from(settings.max_file_size).unwrap_or(usize::MAX))
        .saturating_add(MULTIPART_OVERHEAD);
    Router::new()
        .route("/api/images", get(images::list))
        .route("/api/upload", post(mutate::upload).layer(DefaultBodyLimit::max(upload_limit)))
        .route("/api/delete", post(mutate::delete))
        .route("/api/likes", get(likes::counts))
        .route("/api/like", post(likes::like))
        .route("/api/config", get(client_config))
        .with_state(state)
}

async fn client_config(State(state): State<AppState>) -> Json<ClientConfig> {
    Json(ClientConfig::clone(&state.client))
}

/// Serve until Ctrl-C.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, router(state)).with_graceful_shutdown(shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "Could not listen for Ctrl-C; shutting down");
        return;
    }
    tracing::info!("Shutting down");
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use gallery_cache::{ListingCache, MemoryStore};
    use gallery_library::{LikeStore, Settings};
    use gallery_storage::backend::MockBackend;
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    pub(crate) struct TestApp {
        pub(crate) router: Router,
        pub(crate) backend: Arc<MockBackend>,
        _likes: TempDir,
    }

    pub(crate) fn app(files: &[&str], token: Option<&str>) -> TestApp {
        app_with_settings(files, token, Settings::default())
    }

    pub(crate) fn app_with_settings(files: &[&str], token: Option<&str>, settings: Settings) -> TestApp {
        let backend = Arc::new(MockBackend::with_files(files.iter().map(|path| (*path, b"img".to_vec()))));
        let likes = tempfile::tempdir().unwrap();
        let gallery = Gallery::new(
            backend.clone(),
            ListingCache::new(Some(Arc::new(MemoryStore::new())), std::time::Duration::from_secs(30)),
            LikeStore::new(likes.path().join("likes.json")),
            settings,
        );
        let client = ClientConfig {
            build_id: "test-build".to_string(),
            autoplay_ms: 4500,
        };
        TestApp {
            router: router(AppState::new(gallery, Limits::default(), token, client)),
            backend,
            _likes: likes,
        }
    }

    pub(crate) async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    pub(crate) fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    pub(crate) fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_client_config() {
        let app = app(&[], None);
        let (status, body) = send(&app.router, get("/api/config")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"buildId": "test-build", "autoplayMs": 4500}));
    }

    #[test]
    fn test_authorize() {
        let headers = |token: &str| {
            let mut headers = HeaderMap::new();
            headers.insert(TOKEN_HEADER, token.parse().unwrap());
            headers
        };
        let open = AppState::new(
            Gallery::new(
                Arc::new(MockBackend::default()),
                ListingCache::disabled(),
                LikeStore::new("/nonexistent/likes.json"),
                Settings::default(),
            ),
            Limits::default(),
            Some(""),
            ClientConfig {
                build_id: "dev".to_string(),
                autoplay_ms: 3000,
            },
        );
        assert!(open.authorize(&HeaderMap::new(), None).is_ok());

        let locked = AppState {
            upload_token: Some(Arc::from("s3cret")),
            ..open
        };
        assert!(locked.authorize(&HeaderMap::new(), None).is_err());
        assert!(locked.authorize(&headers("wrong"), Some("s3cret")).is_err());
        assert!(locked.authorize(&headers("s3cret"), None).is_ok());
        assert!(locked.authorize(&headers(""), Some("s3cret")).is_ok());
        assert!(locked.authorize(&HeaderMap::new(), Some("s3cret")).is_ok());
    }
}
