use serde::{Serialize, de::DeserializeOwned};
use worker::{Cache, Response};

use crate::error::ApiError;

/// Edge cache entries live under a synthetic origin; keys are percent-encoded.
fn cache_url(key: &str) -> String {
    format!("https://pdf-tables.cache.local/{}", urlencoding::encode(key))
}

async fn lookup(key: &str) -> Result<Option<Response>, ApiError> {
    let cached = Cache::default().get(cache_url(key), true).await?;
    Ok(cached)
}

async fn store(
    key: &str,
    mut response: Response,
    ttl_seconds: u32,
    content_type: &str,
) -> Result<(), ApiError> {
    let headers = response.headers_mut();
    headers.set("Cache-Control", &format!("public, max-age={ttl_seconds}"))?;
    headers.set("Content-Type", content_type)?;

    Cache::default().put(cache_url(key), response).await?;
    Ok(())
}

pub async fn get_bytes(key: &str) -> Result<Option<Vec<u8>>, ApiError> {
    let Some(mut response) = lookup(key).await? else {
        return Ok(None);
    };
    Ok(Some(response.bytes().await?))
}

pub async fn put_bytes(
    key: &str,
    bytes: Vec<u8>,
    ttl_seconds: u32,
    content_type: &str,
) -> Result<(), ApiError> {
    store(key, Response::from_bytes(bytes)?, ttl_seconds, content_type).await
}

pub async fn get_json<T>(key: &str) -> Result<Option<T>, ApiError>
where
    T: DeserializeOwned,
{
    let Some(mut response) = lookup(key).await? else {
        return Ok(None);
    };
    let body = response.text().await?;
    Ok(Some(serde_json::from_str::<T>(&body)?))
}

pub async fn put_json<T>(key: &str, value: &T, ttl_seconds: u32) -> Result<(), ApiError>
where
    T: Serialize,
{
    let body = serde_json::to_string(value)?;
    store(
        key,
        Response::ok(body)?,
        ttl_seconds,
        "application/json; charset=utf-8",
    )
    .await
}
