use serde::Deserialize;
use serde_json::json;

use crate::config;
use crate::error::ApiError;

// Thin client for the video host's REST API. Uploads happen directly from
// the browser to the host; we only create the direct upload, poll it, and
// read asset state back.

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
pub struct DirectUpload {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub asset_id: Option<String>,
}

#[derive(Deserialize)]
pub struct PlaybackId {
    pub id: String,
}

#[derive(Deserialize)]
pub struct Asset {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub playback_ids: Vec<PlaybackId>,
}

fn auth() -> Result<(String, String), ApiError> {
    Ok((
        config::video_host_token_id()?,
        config::video_host_token_secret()?,
    ))
}

pub fn create_direct_upload(user_id: &str) -> Result<DirectUpload, ApiError> {
    let (token_id, token_secret) = auth()?;
    let client = reqwest::blocking::Client::new();

    let body = json!({
        "new_asset_settings": {
            "passthrough": user_id,
            "playback_policy": ["public"],
            "input": [{
                "generated_subtitles": [{ "language_code": "en", "name": "English" }]
            }]
        },
        "cors_origin": "*"
    });

    let response = client
        .post(format!("{}/video/v1/uploads", config::video_host_api_url()))
        .basic_auth(token_id, Some(token_secret))
        .json(&body)
        .send()?;

    if !response.status().is_success() {
        return Err(ApiError::Internal(format!(
            "Video host upload creation returned {}",
            response.status()
        )));
    }

    let envelope: Envelope<DirectUpload> = response.json()?;
    Ok(envelope.data)
}

pub fn get_direct_upload(upload_id: &str) -> Result<DirectUpload, ApiError> {
    let (token_id, token_secret) = auth()?;
    let client = reqwest::blocking::Client::new();

    let response = client
        .get(format!(
            "{}/video/v1/uploads/{}",
            config::video_host_api_url(),
            upload_id
        ))
        .basic_auth(token_id, Some(token_secret))
        .send()?;

    if !response.status().is_success() {
        return Err(ApiError::Internal(format!(
            "Video host upload lookup returned {}",
            response.status()
        )));
    }

    let envelope: Envelope<DirectUpload> = response.json()?;
    Ok(envelope.data)
}

pub fn get_asset(asset_id: &str) -> Result<Asset, ApiError> {
    let (token_id, token_secret) = auth()?;
    let client = reqwest::blocking::Client::new();

    let response = client
        .get(format!(
            "{}/video/v1/assets/{}",
            config::video_host_api_url(),
            asset_id
        ))
        .basic_auth(token_id, Some(token_secret))
        .send()?;

    if !response.status().is_success() {
        return Err(ApiError::Internal(format!(
            "Video host asset lookup returned {}",
            response.status()
        )));
    }

    let envelope: Envelope<Asset> = response.json()?;
    Ok(envelope.data)
}

pub fn thumbnail_url(playback_id: &str) -> String {
    format!(
        "{}/{}/thumbnail.jpg",
        config::video_host_image_url(),
        playback_id
    )
}

pub fn preview_url(playback_id: &str) -> String {
    format!(
        "{}/{}/animated.gif",
        config::video_host_image_url(),
        playback_id
    )
}

/// The host reports seconds as a float; the schema stores milliseconds.
pub fn duration_ms(duration: Option<f64>) -> i32 {
    (duration.unwrap_or(0.0) * 1000.0).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_upload_envelope_parses() {
        let raw = r#"{"data":{"id":"up_123","url":"https://storage.example/put","asset_id":null}}"#;
        let envelope: Envelope<DirectUpload> = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.data.id, "up_123");
        assert_eq!(envelope.data.url.as_deref(), Some("https://storage.example/put"));
        assert!(envelope.data.asset_id.is_none());
    }

    #[test]
    fn asset_envelope_parses_with_missing_optionals() {
        let raw = r#"{"data":{"id":"asset_9","status":"preparing"}}"#;
        let envelope: Envelope<Asset> = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.data.status, "preparing");
        assert!(envelope.data.playback_ids.is_empty());
        assert!(envelope.data.duration.is_none());
    }

    #[test]
    fn asset_envelope_parses_playback_ids() {
        let raw = r#"{"data":{"id":"asset_9","status":"ready","duration":12.345,"playback_ids":[{"id":"pb_1","policy":"public"}]}}"#;
        let envelope: Envelope<Asset> = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.data.playback_ids[0].id, "pb_1");
    }

    #[test]
    fn duration_rounds_seconds_to_millis() {
        assert_eq!(duration_ms(Some(12.3456)), 12346);
        assert_eq!(duration_ms(Some(0.0004)), 0);
        assert_eq!(duration_ms(None), 0);
    }
}
