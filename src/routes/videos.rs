use actix_web::{delete, get, post, web, HttpResponse};
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use crate::claims::user::Identity;
use crate::db;
use crate::error::ApiError;
use crate::helpers::storage::Storage;
use crate::helpers::users::{require_user, viewer_id};
use crate::helpers::videohost;
use crate::models::{
    new_id, video_list_select, NewVideo, Video, VideoDetail, VideoDetailRow, VideoListRow,
    VideoSummary, Visibility,
};
use crate::pagination::{paginate, PageParams};
use crate::schema::videos::dsl as videos_dsl;

#[derive(Serialize)]
pub struct CreateVideoResponse {
    pub video_id: String,
    pub upload_url: String,
}

/// Provisions a direct upload at the video host and a placeholder row for
/// it. The browser uploads straight to the host; webhooks fill in the rest.
#[post("/")]
pub async fn create_video(identity: Identity) -> Result<HttpResponse, ApiError> {
    let conn = db::connect()?;
    let user = require_user(&conn, &identity)?;

    let upload = videohost::create_direct_upload(&user.id)?;
    let upload_url = upload
        .url
        .ok_or_else(|| ApiError::Internal("Video host returned no upload URL".into()))?;

    let video_id = new_id();
    let new_video = NewVideo {
        id: &video_id,
        title: "UNTITLED",
        asset_status: "waiting",
        upload_id: &upload.id,
        user_id: &user.id,
    };

    diesel::insert_into(videos_dsl::videos)
        .values(&new_video)
        .execute(&conn)?;

    info!(%video_id, user_id = %user.id, "created direct upload");

    Ok(HttpResponse::Ok().json(CreateVideoResponse {
        video_id,
        upload_url,
    }))
}

#[derive(Deserialize, Validate)]
pub struct UpdateVideoBody {
    pub video_id: String,
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: String,
    #[validate(length(max = 1200, message = "Description is too long"))]
    pub description: Option<String>,
    pub category_id: Option<String>,
    #[validate(url)]
    pub thumbnail_url: Option<String>,
    pub visibility: Visibility,
}

/// An update pointing at a category that does not exist is the caller's
/// mistake, not ours.
fn update_conflict(err: DieselError) -> ApiError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            ApiError::BadRequest("Category not found".into())
        }
        other => ApiError::from(other),
    }
}

#[post("/update")]
pub async fn update_video(
    identity: Identity,
    data: web::Json<UpdateVideoBody>,
) -> Result<HttpResponse, ApiError> {
    data.validate()?;

    let conn = db::connect()?;
    let user = require_user(&conn, &identity)?;

    // Empty strings from the form mean "clear the field".
    let description = data.description.as_deref().filter(|v| !v.is_empty());
    let category_id = data.category_id.as_deref().filter(|v| !v.is_empty());

    let updated = diesel::update(
        videos_dsl::videos.filter(
            videos_dsl::id
                .eq(&data.video_id)
                .and(videos_dsl::user_id.eq(&user.id)),
        ),
    )
    .set((
        videos_dsl::title.eq(&data.title),
        videos_dsl::description.eq(description),
        videos_dsl::category_id.eq(category_id),
        videos_dsl::thumbnail_url.eq(data.thumbnail_url.as_deref()),
        videos_dsl::visibility.eq(data.visibility.as_str()),
        videos_dsl::updated_at.eq(Utc::now()),
    ))
    .execute(&conn)
    .map_err(update_conflict)?;

    if updated == 0 {
        return Err(ApiError::NotFound("No video updated".into()));
    }

    Ok(HttpResponse::Ok().json("Video updated"))
}

#[delete("/{video_id}")]
pub async fn remove_video(
    identity: Identity,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let video_id = path.into_inner();
    let conn = db::connect()?;
    let user = require_user(&conn, &identity)?;

    let deleted: Option<Video> = diesel::delete(
        videos_dsl::videos.filter(
            videos_dsl::id
                .eq(&video_id)
                .and(videos_dsl::user_id.eq(&user.id)),
        ),
    )
    .get_result::<Video>(&conn)
    .optional()?;

    let deleted = match deleted {
        Some(v) => v,
        None => return Err(ApiError::BadRequest("Video could not be deleted".into())),
    };

    // The row is gone either way; a dangling object is only worth a warning.
    let storage = Storage::from_env()?;
    for key in deleted.thumbnail_key.iter().chain(deleted.preview_key.iter()) {
        if let Err(err) = storage.delete(key).await {
            warn!(%key, error = %err, "failed to delete stored object");
        }
    }

    info!(%video_id, "video deleted");

    Ok(HttpResponse::Ok().json("Video deleted"))
}

#[derive(Deserialize)]
pub struct VideoIdBody {
    pub video_id: String,
}

/// Drops a custom thumbnail and re-imports the host-generated one.
#[post("/restore-thumbnail")]
pub async fn restore_thumbnail(
    identity: Identity,
    data: web::Json<VideoIdBody>,
) -> Result<HttpResponse, ApiError> {
    let conn = db::connect()?;
    let user = require_user(&conn, &identity)?;

    let video: Video = videos_dsl::videos
        .filter(
            videos_dsl::id
                .eq(&data.video_id)
                .and(videos_dsl::user_id.eq(&user.id)),
        )
        .first::<Video>(&conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Video not found".into()))?;

    let playback_id = video
        .playback_id
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("No playback id".into()))?;

    let storage = Storage::from_env()?;
    if let Some(key) = &video.thumbnail_key {
        if let Err(err) = storage.delete(key).await {
            warn!(%key, error = %err, "failed to delete stored object");
        }
    }

    let stored = storage
        .import_from_url("thumbnails", "jpg", &videohost::thumbnail_url(playback_id))
        .await?;

    diesel::update(videos_dsl::videos.find(&video.id))
        .set((
            videos_dsl::thumbnail_url.eq(&stored.url),
            videos_dsl::thumbnail_key.eq(&stored.key),
            videos_dsl::updated_at.eq(Utc::now()),
        ))
        .execute(&conn)?;

    Ok(HttpResponse::Ok().json("Thumbnail restored"))
}

/// Re-polls the video host for rows whose webhook went missing.
#[post("/revalidate")]
pub async fn revalidate(
    identity: Identity,
    data: web::Json<VideoIdBody>,
) -> Result<HttpResponse, ApiError> {
    let conn = db::connect()?;
    let user = require_user(&conn, &identity)?;

    let video: Video = videos_dsl::videos
        .filter(
            videos_dsl::id
                .eq(&data.video_id)
                .and(videos_dsl::user_id.eq(&user.id)),
        )
        .first::<Video>(&conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Video not found".into()))?;

    let upload = videohost::get_direct_upload(&video.upload_id)?;
    let asset_id = upload
        .asset_id
        .ok_or_else(|| ApiError::BadRequest("Upload has no asset yet".into()))?;

    let asset = videohost::get_asset(&asset_id)?;
    let playback_id = asset.playback_ids.first().map(|p| p.id.clone());

    diesel::update(videos_dsl::videos.find(&video.id))
        .set((
            videos_dsl::asset_status.eq(&asset.status),
            videos_dsl::asset_id.eq(&asset.id),
            videos_dsl::playback_id.eq(playback_id),
            videos_dsl::duration.eq(videohost::duration_ms(asset.duration)),
            videos_dsl::updated_at.eq(Utc::now()),
        ))
        .execute(&conn)?;

    Ok(HttpResponse::Ok().json("Video revalidated"))
}

#[derive(Deserialize)]
pub struct FeedParams {
    pub limit: Option<i64>,
    pub cursor: Option<i64>,
    pub category_id: Option<String>,
    pub user_id: Option<String>,
}

#[get("/")]
pub async fn get_feed(params: web::Query<FeedParams>) -> Result<HttpResponse, ApiError> {
    let conn = db::connect()?;
    let page = PageParams {
        limit: params.limit,
        cursor: params.cursor,
    };
    let limit = page.limit();
    let offset = page.offset();

    let sql = format!(
        "{} WHERE v.visibility = 'PUBLIC' \
         AND ($1 = '' OR v.category_id = $1) \
         AND ($2 = '' OR v.user_id = $2) \
         ORDER BY v.created_at DESC LIMIT $3 OFFSET $4",
        video_list_select()
    );

    let rows: Vec<VideoListRow> = sql_query(sql)
        .bind::<Text, _>(params.category_id.clone().unwrap_or_default())
        .bind::<Text, _>(params.user_id.clone().unwrap_or_default())
        .bind::<BigInt, _>(limit + 1)
        .bind::<BigInt, _>(offset)
        .load(&conn)?;

    let summaries: Vec<VideoSummary> = rows.into_iter().map(VideoSummary::from).collect();
    Ok(HttpResponse::Ok().json(paginate(summaries, limit, offset)))
}

#[get("/trending")]
pub async fn get_trending(params: web::Query<PageParams>) -> Result<HttpResponse, ApiError> {
    let conn = db::connect()?;
    let limit = params.limit();
    let offset = params.offset();

    let sql = format!(
        "{} WHERE v.visibility = 'PUBLIC' \
         ORDER BY view_count DESC, v.created_at DESC LIMIT $1 OFFSET $2",
        video_list_select()
    );

    let rows: Vec<VideoListRow> = sql_query(sql)
        .bind::<BigInt, _>(limit + 1)
        .bind::<BigInt, _>(offset)
        .load(&conn)?;

    let summaries: Vec<VideoSummary> = rows.into_iter().map(VideoSummary::from).collect();
    Ok(HttpResponse::Ok().json(paginate(summaries, limit, offset)))
}

#[get("/subscribed")]
pub async fn get_subscribed_feed(
    identity: Identity,
    params: web::Query<PageParams>,
) -> Result<HttpResponse, ApiError> {
    let conn = db::connect()?;
    let user = require_user(&conn, &identity)?;
    let limit = params.limit();
    let offset = params.offset();

    let sql = format!(
        "{} INNER JOIN subscriptions s ON s.creator_id = v.user_id AND s.viewer_id = $1 \
         WHERE v.visibility = 'PUBLIC' \
         ORDER BY v.created_at DESC LIMIT $2 OFFSET $3",
        video_list_select()
    );

    let rows: Vec<VideoListRow> = sql_query(sql)
        .bind::<Text, _>(&user.id)
        .bind::<BigInt, _>(limit + 1)
        .bind::<BigInt, _>(offset)
        .load(&conn)?;

    let summaries: Vec<VideoSummary> = rows.into_iter().map(VideoSummary::from).collect();
    Ok(HttpResponse::Ok().json(paginate(summaries, limit, offset)))
}

#[get("/{video_id}")]
pub async fn get_video(
    identity: Option<Identity>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let video_id = path.into_inner();
    let conn = db::connect()?;
    let viewer = viewer_id(&conn, identity.as_ref())?;

    let sql = "SELECT \
        v.id, v.title, v.description, v.asset_status, v.playback_id, \
        v.thumbnail_url, v.preview_url, v.duration, v.visibility, v.category_id, \
        v.created_at, v.updated_at, \
        u.id AS user_id, u.name AS user_name, u.image_url AS user_image_url, \
        (SELECT count(*) FROM subscriptions s WHERE s.creator_id = u.id) AS subscriber_count, \
        EXISTS(SELECT 1 FROM subscriptions s WHERE s.creator_id = u.id AND s.viewer_id = $2) AS is_subscribed, \
        (SELECT count(*) FROM video_views vv WHERE vv.video_id = v.id) AS view_count, \
        (SELECT count(*) FROM video_reactions vr WHERE vr.video_id = v.id AND vr.reaction_type = 'like') AS like_count, \
        (SELECT count(*) FROM video_reactions vr WHERE vr.video_id = v.id AND vr.reaction_type = 'dislike') AS dislike_count, \
        (SELECT vr.reaction_type FROM video_reactions vr WHERE vr.video_id = v.id AND vr.user_id = $2) AS viewer_reaction \
        FROM videos v INNER JOIN users u ON u.id = v.user_id WHERE v.id = $1";

    let row: Option<VideoDetailRow> = sql_query(sql)
        .bind::<Text, _>(&video_id)
        .bind::<Text, _>(&viewer)
        .get_result(&conn)
        .optional()?;

    let row = row.ok_or_else(|| ApiError::NotFound("Video not found".into()))?;

    Ok(HttpResponse::Ok().json(VideoDetail::from(row)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_category_on_update_is_a_bad_request() {
        let err = update_conflict(DieselError::DatabaseError(
            DatabaseErrorKind::ForeignKeyViolation,
            Box::new(String::from("violates foreign key constraint")),
        ));
        assert_eq!(err.code(), "BAD_REQUEST");
    }

    #[test]
    fn other_update_failures_stay_internal() {
        let err = update_conflict(DieselError::RollbackTransaction);
        assert_eq!(err.code(), "INTERNAL_SERVER_ERROR");
    }
}
