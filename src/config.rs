use std::env;

use crate::error::ApiError;

/// Env-backed configuration, loaded from `.env` at startup (see `main`).
pub fn var(name: &str) -> Result<String, ApiError> {
    env::var(name).map_err(|_| ApiError::Internal(format!("{} must be set", name)))
}

pub fn database_url() -> Result<String, ApiError> {
    var("DATABASE_URL")
}

pub fn bind_addr() -> String {
    env::var("BIND_ADDR").unwrap_or_else(|_| String::from("127.0.0.1:5000"))
}

/// Secret the identity provider signs session tokens with.
pub fn session_jwt_secret() -> Result<String, ApiError> {
    var("SESSION_JWT_SECRET")
}

pub fn identity_webhook_secret() -> Result<String, ApiError> {
    var("IDENTITY_WEBHOOK_SECRET")
}

pub fn video_host_webhook_secret() -> Result<String, ApiError> {
    var("VIDEO_HOST_WEBHOOK_SECRET")
}

pub fn video_host_api_url() -> String {
    env::var("VIDEO_HOST_API_URL").unwrap_or_else(|_| String::from("https://api.mux.com"))
}

pub fn video_host_image_url() -> String {
    env::var("VIDEO_HOST_IMAGE_URL").unwrap_or_else(|_| String::from("https://image.mux.com"))
}

pub fn video_host_token_id() -> Result<String, ApiError> {
    var("VIDEO_HOST_TOKEN_ID")
}

pub fn video_host_token_secret() -> Result<String, ApiError> {
    var("VIDEO_HOST_TOKEN_SECRET")
}

pub fn s3_bucket() -> Result<String, ApiError> {
    var("S3_BUCKET")
}

pub fn s3_region() -> Result<String, ApiError> {
    var("S3_REGION")
}

pub fn s3_endpoint() -> Result<String, ApiError> {
    var("S3_ENDPOINT")
}

pub fn s3_key() -> Result<String, ApiError> {
    var("S3_KEY")
}

pub fn s3_secret() -> Result<String, ApiError> {
    var("S3_SECRET")
}

/// Public base URL objects are served from, e.g. a CDN in front of the bucket.
pub fn s3_public_base() -> Result<String, ApiError> {
    var("S3_PUBLIC_BASE")
}
