use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
};
use std::sync::Arc;

use super::manager::CacheManager;
use super::protocol::{GetResponse, PutRequest, PutResponse, SizeResponse};

pub async fn handle_put(
    Extension(caches): Extension<Arc<CacheManager>>,
    Path(cache_name): Path<String>,
    Json(req): Json<PutRequest>,
) -> (StatusCode, Json<PutResponse>) {
    caches.get_or_create(&cache_name).put(req.key, req.value);
    (StatusCode::OK, Json(PutResponse { success: true }))
}

pub async fn handle_get(
    Extension(caches): Extension<Arc<CacheManager>>,
    Path((cache_name, key)): Path<(String, i64)>,
) -> (StatusCode, Json<GetResponse>) {
    match caches.get_or_create(&cache_name).get(key) {
        Some(value) => (StatusCode::OK, Json(GetResponse { value: Some(value) })),
        None => (StatusCode::NOT_FOUND, Json(GetResponse { value: None })),
    }
}

pub async fn handle_size(
    Extension(caches): Extension<Arc<CacheManager>>,
    Path(cache_name): Path<String>,
) -> Json<SizeResponse> {
    let entries = caches
        .get(&cache_name)
        .map(|cache| cache.len())
        .unwrap_or(0);

    Json(SizeResponse {
        cache: cache_name,
        entries,
    })
}
