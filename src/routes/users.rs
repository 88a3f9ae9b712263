use actix_multipart::Multipart;
use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::Text;
use serde::Serialize;
use tracing::warn;

use crate::claims::user::Identity;
use crate::db;
use crate::error::ApiError;
use crate::helpers::multipart_parsing::read_image;
use crate::helpers::storage::Storage;
use crate::helpers::users::{require_user, viewer_id};
use crate::models::{UserProfile, UserProfileRow};
use crate::schema::users::dsl as users_dsl;

/// Public channel page header: counts plus whether the caller subscribes.
#[get("/{user_id}")]
pub async fn get_user(
    identity: Option<Identity>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    let conn = db::connect()?;
    let viewer = viewer_id(&conn, identity.as_ref())?;

    let sql = "SELECT \
        u.id, u.name, u.image_url, u.banner_url, u.created_at, \
        (SELECT count(*) FROM videos v WHERE v.user_id = u.id AND v.visibility = 'PUBLIC') AS video_count, \
        (SELECT count(*) FROM subscriptions s WHERE s.creator_id = u.id) AS subscriber_count, \
        EXISTS(SELECT 1 FROM subscriptions s WHERE s.creator_id = u.id AND s.viewer_id = $2) AS is_subscribed \
        FROM users u WHERE u.id = $1";

    let row: Option<UserProfileRow> = sql_query(sql)
        .bind::<Text, _>(&user_id)
        .bind::<Text, _>(&viewer)
        .get_result(&conn)
        .optional()?;

    let row = row.ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(HttpResponse::Ok().json(UserProfile::from(row)))
}

#[derive(Serialize)]
pub struct BannerResponse {
    pub banner_url: String,
}

/// Replaces the channel banner with an uploaded image.
#[post("/banner")]
pub async fn upload_banner(
    identity: Identity,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let image = read_image(payload).await?;

    let conn = db::connect()?;
    let user = require_user(&conn, &identity)?;

    let storage = Storage::from_env()?;
    if let Some(key) = &user.banner_key {
        if let Err(err) = storage.delete(key).await {
            warn!(%key, error = %err, "failed to delete stored object");
        }
    }

    let stored = storage
        .store_bytes("banners", &image.ext, &image.bytes)
        .await?;

    diesel::update(users_dsl::users.find(&user.id))
        .set((
            users_dsl::banner_url.eq(&stored.url),
            users_dsl::banner_key.eq(&stored.key),
            users_dsl::updated_at.eq(Utc::now()),
        ))
        .execute(&conn)?;

    Ok(HttpResponse::Ok().json(BannerResponse {
        banner_url: stored.url,
    }))
}
