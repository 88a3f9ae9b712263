use actix_web::{get, web, HttpResponse};
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text};

use crate::claims::user::Identity;
use crate::db;
use crate::error::ApiError;
use crate::helpers::users::require_user;
use crate::models::{video_list_select, VideoListRow, VideoSummary};
use crate::pagination::{paginate, PageParams};

/// The creator's own uploads, private ones included, newest first.
#[get("/videos")]
pub async fn get_own_videos(
    identity: Identity,
    params: web::Query<PageParams>,
) -> Result<HttpResponse, ApiError> {
    let conn = db::connect()?;
    let user = require_user(&conn, &identity)?;
    let limit = params.limit();
    let offset = params.offset();

    let sql = format!(
        "{} WHERE v.user_id = $1 \
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

/// Single upload for the edit form. Scoped to the caller, so somebody
/// else's video id reads as missing.
#[get("/videos/{video_id}")]
pub async fn get_own_video(
    identity: Identity,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let video_id = path.into_inner();
    let conn = db::connect()?;
    let user = require_user(&conn, &identity)?;

    let sql = format!(
        "{} WHERE v.id = $1 AND v.user_id = $2",
        video_list_select()
    );

    let row: Option<VideoListRow> = sql_query(sql)
        .bind::<Text, _>(&video_id)
        .bind::<Text, _>(&user.id)
        .get_result(&conn)
        .optional()?;

    let row = row.ok_or_else(|| ApiError::NotFound("Video not found".into()))?;
    Ok(HttpResponse::Ok().json(VideoSummary::from(row)))
}
