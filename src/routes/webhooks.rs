use actix_web::{post, web, HttpRequest, HttpResponse};
use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config;
use crate::db;
use crate::error::ApiError;
use crate::helpers::signature::{verify_identity_webhook, verify_video_webhook};
use crate::helpers::storage::Storage;
use crate::helpers::videohost;
use crate::models::{new_id, NewUser, Video};
use crate::schema::users::dsl as users_dsl;
use crate::schema::videos::dsl as videos_dsl;

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

#[derive(Deserialize)]
struct IdentityEvent {
    #[serde(rename = "type")]
    kind: String,
    data: IdentityUser,
}

#[derive(Deserialize)]
struct IdentityUser {
    id: String,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
}

impl IdentityUser {
    fn display_name(&self) -> String {
        let name = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        );
        let name = name.trim();
        if name.is_empty() {
            String::from("User")
        } else {
            name.to_string()
        }
    }
}

/// Account lifecycle events pushed by the identity provider. Our user rows
/// exist only as mirrors of these deliveries.
#[post("/identity")]
pub async fn identity_webhook(
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let secret = config::identity_webhook_secret()?;

    let msg_id = header(&req, "svix-id")
        .ok_or_else(|| ApiError::BadRequest("Missing webhook headers".into()))?;
    let timestamp = header(&req, "svix-timestamp")
        .ok_or_else(|| ApiError::BadRequest("Missing webhook headers".into()))?;
    let signature = header(&req, "svix-signature")
        .ok_or_else(|| ApiError::BadRequest("Missing webhook headers".into()))?;

    verify_identity_webhook(
        &secret,
        msg_id,
        timestamp,
        signature,
        &body,
        Utc::now().timestamp(),
    )
    .map_err(|_| ApiError::BadRequest("Invalid webhook signature".into()))?;

    let event: IdentityEvent = serde_json::from_slice(&body)
        .map_err(|_| ApiError::BadRequest("Malformed webhook payload".into()))?;

    let conn = db::connect()?;

    match event.kind.as_str() {
        "user.created" => {
            let user_id = new_id();
            let name = event.data.display_name();
            let new_user = NewUser {
                id: &user_id,
                external_id: &event.data.id,
                name: &name,
                image_url: event.data.image_url.as_deref().unwrap_or(""),
            };
            diesel::insert_into(users_dsl::users)
                .values(&new_user)
                .execute(&conn)?;
            info!(external_id = %event.data.id, "user created");
        }
        "user.updated" => {
            diesel::update(users_dsl::users.filter(users_dsl::external_id.eq(&event.data.id)))
                .set((
                    users_dsl::name.eq(event.data.display_name()),
                    users_dsl::image_url.eq(event.data.image_url.as_deref().unwrap_or("")),
                    users_dsl::updated_at.eq(Utc::now()),
                ))
                .execute(&conn)?;
        }
        "user.deleted" => {
            diesel::delete(users_dsl::users.filter(users_dsl::external_id.eq(&event.data.id)))
                .execute(&conn)?;
            info!(external_id = %event.data.id, "user deleted");
        }
        other => {
            return Err(ApiError::BadRequest(format!(
                "Unhandled event type: {}",
                other
            )));
        }
    }

    Ok(HttpResponse::Ok().json("Webhook received"))
}

#[derive(Deserialize)]
struct VideoEvent {
    #[serde(rename = "type")]
    kind: String,
    data: serde_json::Value,
}

#[derive(Deserialize)]
struct AssetEvent {
    id: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    upload_id: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    playback_ids: Vec<videohost::PlaybackId>,
}

#[derive(Deserialize)]
struct TrackEvent {
    id: String,
    asset_id: String,
    #[serde(default)]
    status: Option<String>,
}

fn asset_event(data: serde_json::Value) -> Result<AssetEvent, ApiError> {
    serde_json::from_value(data)
        .map_err(|_| ApiError::BadRequest("Malformed webhook payload".into()))
}

/// Asset lifecycle events from the video host, matched back to our rows by
/// the upload id handed out at creation time (or the asset id once known).
#[post("/video")]
pub async fn video_webhook(req: HttpRequest, body: web::Bytes) -> Result<HttpResponse, ApiError> {
    let secret = config::video_host_webhook_secret()?;

    let signature = header(&req, "mux-signature")
        .ok_or_else(|| ApiError::Unauthorized("Missing signature header".into()))?;
    verify_video_webhook(&secret, signature, &body, Utc::now().timestamp())?;

    let event: VideoEvent = serde_json::from_slice(&body)
        .map_err(|_| ApiError::BadRequest("Malformed webhook payload".into()))?;

    let conn = db::connect()?;

    match event.kind.as_str() {
        "video.asset.created" => {
            let asset = asset_event(event.data)?;
            let upload_id = asset
                .upload_id
                .ok_or_else(|| ApiError::BadRequest("Missing upload id".into()))?;

            diesel::update(videos_dsl::videos.filter(videos_dsl::upload_id.eq(&upload_id)))
                .set((
                    videos_dsl::asset_id.eq(&asset.id),
                    videos_dsl::asset_status.eq(asset.status.as_deref().unwrap_or("preparing")),
                    videos_dsl::updated_at.eq(Utc::now()),
                ))
                .execute(&conn)?;
        }
        "video.asset.ready" => {
            let asset = asset_event(event.data)?;
            let upload_id = asset
                .upload_id
                .ok_or_else(|| ApiError::BadRequest("Missing upload id".into()))?;
            let playback_id = asset
                .playback_ids
                .first()
                .map(|p| p.id.clone())
                .ok_or_else(|| ApiError::BadRequest("Missing playback id".into()))?;

            let storage = Storage::from_env()?;
            let thumbnail = storage
                .import_from_url("thumbnails", "jpg", &videohost::thumbnail_url(&playback_id))
                .await?;
            let preview = storage
                .import_from_url("previews", "gif", &videohost::preview_url(&playback_id))
                .await?;

            diesel::update(videos_dsl::videos.filter(videos_dsl::upload_id.eq(&upload_id)))
                .set((
                    videos_dsl::asset_status.eq("ready"),
                    videos_dsl::asset_id.eq(&asset.id),
                    videos_dsl::playback_id.eq(&playback_id),
                    videos_dsl::thumbnail_url.eq(&thumbnail.url),
                    videos_dsl::thumbnail_key.eq(&thumbnail.key),
                    videos_dsl::preview_url.eq(&preview.url),
                    videos_dsl::preview_key.eq(&preview.key),
                    videos_dsl::duration.eq(videohost::duration_ms(asset.duration)),
                    videos_dsl::updated_at.eq(Utc::now()),
                ))
                .execute(&conn)?;
            info!(asset_id = %asset.id, "asset ready");
        }
        "video.asset.errored" => {
            let asset = asset_event(event.data)?;
            let upload_id = asset
                .upload_id
                .ok_or_else(|| ApiError::BadRequest("Missing upload id".into()))?;

            diesel::update(videos_dsl::videos.filter(videos_dsl::upload_id.eq(&upload_id)))
                .set((
                    videos_dsl::asset_status.eq(asset.status.as_deref().unwrap_or("errored")),
                    videos_dsl::updated_at.eq(Utc::now()),
                ))
                .execute(&conn)?;
            warn!(asset_id = %asset.id, "asset errored");
        }
        "video.asset.deleted" => {
            let asset = asset_event(event.data)?;

            let deleted: Option<Video> =
                diesel::delete(videos_dsl::videos.filter(videos_dsl::asset_id.eq(&asset.id)))
                    .get_result::<Video>(&conn)
                    .optional()?;

            if let Some(video) = deleted {
                let storage = Storage::from_env()?;
                for key in video.thumbnail_key.iter().chain(video.preview_key.iter()) {
                    if let Err(err) = storage.delete(key).await {
                        warn!(%key, error = %err, "failed to delete stored object");
                    }
                }
                info!(video_id = %video.id, "video removed after asset deletion");
            }
        }
        "video.asset.track.ready" => {
            let track: TrackEvent = serde_json::from_value(event.data)
                .map_err(|_| ApiError::BadRequest("Malformed webhook payload".into()))?;

            diesel::update(videos_dsl::videos.filter(videos_dsl::asset_id.eq(&track.asset_id)))
                .set((
                    videos_dsl::track_id.eq(&track.id),
                    videos_dsl::track_status.eq(track.status.as_deref().unwrap_or("ready")),
                    videos_dsl::updated_at.eq(Utc::now()),
                ))
                .execute(&conn)?;
        }
        other => {
            // The host sends more event types than we track.
            info!(event = %other, "ignoring video webhook event");
        }
    }

    Ok(HttpResponse::Ok().json("Webhook received"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_display_name_joins_and_falls_back() {
        let user = IdentityUser {
            id: "user_1".into(),
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            image_url: None,
        };
        assert_eq!(user.display_name(), "Ada Lovelace");

        let partial = IdentityUser {
            id: "user_2".into(),
            first_name: Some("Ada".into()),
            last_name: None,
            image_url: None,
        };
        assert_eq!(partial.display_name(), "Ada");

        let empty = IdentityUser {
            id: "user_3".into(),
            first_name: None,
            last_name: None,
            image_url: None,
        };
        assert_eq!(empty.display_name(), "User");
    }

    #[test]
    fn asset_ready_payload_parses() {
        let raw = serde_json::json!({
            "id": "asset_1",
            "status": "ready",
            "upload_id": "up_1",
            "duration": 61.5,
            "playback_ids": [{"id": "pb_1"}]
        });
        let asset = asset_event(raw).unwrap();
        assert_eq!(asset.upload_id.as_deref(), Some("up_1"));
        assert_eq!(asset.playback_ids[0].id, "pb_1");
        assert_eq!(videohost::duration_ms(asset.duration), 61500);
    }

    #[test]
    fn track_payload_parses() {
        let raw = serde_json::json!({
            "id": "track_1",
            "asset_id": "asset_1",
            "status": "ready"
        });
        let track: TrackEvent = serde_json::from_value(raw).unwrap();
        assert_eq!(track.asset_id, "asset_1");
    }
}
