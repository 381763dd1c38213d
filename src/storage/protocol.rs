//! Storage Network Protocol
//!
//! Endpoints and DTOs for remote cache access. Paths take the cache name as their first
//! segment, e.g. `/cache/RecordsCache/get/42`.

use serde::{Deserialize, Serialize};

pub const ENDPOINT_CACHE: &str = "/cache";

pub fn put_path(cache: &str) -> String {
    format!("{}/{}/put", ENDPOINT_CACHE, cache)
}

pub fn get_path(cache: &str, key: i64) -> String {
    format!("{}/{}/get/{}", ENDPOINT_CACHE, cache, key)
}

pub fn size_path(cache: &str) -> String {
    format!("{}/{}/size", ENDPOINT_CACHE, cache)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PutRequest {
    pub key: i64,
    pub value: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PutResponse {
    pub success: bool,
}

/// `value` is `None` (with `404 NOT_FOUND`) when the key was never written.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetResponse {
    pub value: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SizeResponse {
    pub cache: String,
    pub entries: usize,
}
