use super::{ApiError, AppState};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Default, Deserialize)]
pub struct LikesQuery {
    #[serde(default)]
    dir: String,
    /// Comma-separated, each name URL-encoded on its own.
    #[serde(default)]
    names: String,
}

#[derive(Debug, Serialize)]
pub struct LikesResponse {
    ok: bool,
    likes: BTreeMap<String, u64>,
}

/// `GET /api/likes?dir=&names=a,b`
pub async fn counts(
    State(state): State<AppState>,
    query: Result<Query<LikesQuery>, QueryRejection>,
) -> Result<Json<LikesResponse>, ApiError> {
    let Query(query) = query?;
    let names = split_names(&query.names);
    let likes = state.gallery.likes(&query.dir, &names).await?;
    Ok(Json(LikesResponse { ok: true, likes }))
}

fn split_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|name| match urlencoding::decode(name) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => name.to_string(),
        })
        .filter(|name| !name.is_empty())
        .collect()
}

#[derive(Debug, Default, Deserialize)]
pub struct LikeBody {
    #[serde(default)]
    dir: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    ok: bool,
    name: String,
    count: u64,
}

/// `POST /api/like { dir, name }`
pub async fn like(
    State(state): State<AppState>,
    body: Result<Json<LikeBody>, JsonRejection>,
) -> Result<Json<LikeResponse>, ApiError> {
    let Json(body) = body?;
    let count = state.gallery.like(&body.dir, &body.name).await?;
    Ok(Json(LikeResponse {
        ok: true,
        name: body.name,
        count,
    }))
}
