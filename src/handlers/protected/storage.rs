use axum::{body::Bytes, http::header, http::HeaderMap, Extension};
use serde::Serialize;

use crate::config;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::AccountService;
use crate::storage::{avatar_key, check_upload, BlobStore, LocalBlobStore};

#[derive(Debug, Serialize)]
pub struct Uploaded {
    pub key: String,
    pub url: String,
}

/// POST /api/storage/avatar - raw image body, typed by `Content-Type`
pub async fn upload_avatar(
    Extension(user): Extension<AuthUser>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Uploaded> {
    let storage_config = &config::config().storage;
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let kind = check_upload(content_type, &body, storage_config.max_upload_bytes)?;

    let store = LocalBlobStore::from_config(storage_config);
    let key = avatar_key(user.user_id, kind, &body);
    store.put(&key, &body).await?;
    let url = store.public_url(&key);

    let accounts = AccountService::new()?;
    let previous = accounts.profile(user.user_id).await?.and_then(|p| p.avatar_url);
    accounts
        .set_avatar_url(user.user_id, &url)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;

    // Replaced avatars from this store are removed; anything else is left alone
    if let Some(old_key) = previous
        .filter(|old| *old != url)
        .and_then(|old| old.strip_prefix(&format!("{}/", storage_config.public_base_url)).map(str::to_string))
    {
        if let Err(e) = store.delete(&old_key).await {
            tracing::warn!("Could not remove old avatar {}: {}", old_key, e);
        }
    }

    tracing::info!("Stored avatar for {} ({} bytes)", user.user_id, body.len());
    Ok(ApiResponse::created(Uploaded { key, url }))
}
