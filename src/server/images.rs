use super::{ApiError, AppState};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::Json;
use gallery_library::{ListingPage, PageRequest};
use serde::Deserialize;

/// Raw query values; parsing them is lenient. Only a malformed query string
/// (such as a repeated key) is rejected.
#[derive(Debug, Default, Deserialize)]
pub struct ImagesQuery {
    dir: Option<String>,
    offset: Option<String>,
    limit: Option<String>,
    order: Option<String>,
    seed: Option<String>,
}

/// `GET /api/images`: one page of a directory.
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<ImagesQuery>, QueryRejection>,
) -> Result<Json<ListingPage>, ApiError> {
    let Query(query) = query?;
    let request = PageRequest::parse(
        query.offset.as_deref(),
        query.limit.as_deref(),
        query.order.as_deref(),
        query.seed.as_deref(),
        state.limits,
    );
    let dir = query.dir.unwrap_or_default();
    Ok(Json(state.gallery.list(&dir, &request).await?))
}

#[cfg(test)]
mod tests {
    use crate::server::tests::{app, get, send};
    use axum::http::StatusCode;
    use rstest::rstest;
    use serde_json::Value;

    fn names(body: &Value) -> Vec<&str> {
        body["files"].as_array().unwrap().iter().map(|f| f["name"].as_str().unwrap()).collect()
    }

    #[tokio::test]
    async fn test_stable_pagination() {
        let app = app(&["d/b.jpg", "d/a.png", "d/c.gif", "d/sub/x.jpg"], None);
        let (status, body) = send(&app.router, get("/api/images?dir=d&limit=2&offset=0")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(names(&body), vec!["a.png", "b.jpg"]);
        assert_eq!(body["dir"], "d");
        assert_eq!(body["dirs"], serde_json::json!(["sub"]));
        assert_eq!(body["total"], 3);
        assert_eq!(body["nextOffset"], 2);
        assert_eq!(body["hasMore"], true);
        assert_eq!(body["cached"], true);
        assert_eq!(body["files"][0]["url"], "/images/d/a.png");
        assert_eq!(body["files"][0]["thumbUrl"], "/api/thumb?dir=d&name=a.png");

        let (_, body) = send(&app.router, get("/api/images?dir=d&limit=2&offset=2")).await;
        assert_eq!(names(&body), vec!["c.gif"]);
        assert_eq!(body["hasMore"], false);
    }

    #[tokio::test]
    async fn test_random_order_is_repeatable() {
        let files: Vec<String> = (0..40).map(|i| format!("{i:02}.jpg")).collect();
        let refs: Vec<&str> = files.iter().map(String::as_str).collect();
        let app = app(&refs, None);
        let uri = "/api/images?order=random&seed=abc&limit=10&offset=10";
        let (_, first) = send(&app.router, get(uri)).await;
        let (_, second) = send(&app.router, get(uri)).await;
        assert_eq!(names(&first), names(&second));
        assert_eq!(names(&first).len(), 10);
    }

    #[rstest]
    #[case("/api/images?offset=99", 0, false)]
    #[case("/api/images?limit=0", 2, false)]
    #[case("/api/images?limit=abc&offset=-4", 2, false)]
    #[case("/api/images?limit=1", 1, true)]
    #[case("/api/images?offset=99999999999999999999", 0, false)]
    #[case("/api/images?limit=99999999999999999999", 2, false)]
    #[tokio::test]
    async fn test_lenient_query(#[case] uri: &str, #[case] count: usize, #[case] has_more: bool) {
        let app = app(&["a.jpg", "b.jpg"], None);
        let (status, body) = send(&app.router, get(uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(names(&body).len(), count);
        assert_eq!(body["hasMore"], has_more);
    }

    #[rstest]
    #[case("/api/images?dir=..")]
    #[case("/api/images?dir=a%2F..%2F..%2Fetc")]
    #[case("/api/images?dir=missing")]
    #[case("/api/images?dir=a.jpg")]
    #[tokio::test]
    async fn test_bad_dir(#[case] uri: &str) {
        let app = app(&["a.jpg"], None);
        let (status, body) = send(&app.router, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("bad dir"));
    }

    #[tokio::test]
    async fn test_malformed_query_is_json_error() {
        let app = app(&["a/x.jpg", "b/y.jpg"], None);
        let (status, body) = send(&app.router, get("/api/images?dir=a&dir=b")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }
}
