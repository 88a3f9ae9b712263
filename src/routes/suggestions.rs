use actix_web::{get, web, HttpResponse};
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text};

use crate::db;
use crate::error::ApiError;
use crate::models::{video_list_select, Video, VideoListRow, VideoSummary};
use crate::pagination::{paginate, PageParams};
use crate::schema::videos::dsl as videos_dsl;

/// Related videos for the watch page: same category first when the source
/// video has one, otherwise anything public except the video itself.
#[get("/{video_id}")]
pub async fn get_suggestions(
    path: web::Path<String>,
    params: web::Query<PageParams>,
) -> Result<HttpResponse, ApiError> {
    let video_id = path.into_inner();
    let conn = db::connect()?;
    let limit = params.limit();
    let offset = params.offset();

    let source: Video = videos_dsl::videos
        .find(&video_id)
        .first::<Video>(&conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Video not found".into()))?;

    let category_id = source.category_id.unwrap_or_default();

    let sql = format!(
        "{} WHERE v.visibility = 'PUBLIC' AND v.id <> $1 \
         AND ($2 = '' OR v.category_id = $2) \
         ORDER BY v.created_at DESC LIMIT $3 OFFSET $4",
        video_list_select()
    );

    let rows: Vec<VideoListRow> = sql_query(sql)
        .bind::<Text, _>(&video_id)
        .bind::<Text, _>(category_id)
        .bind::<BigInt, _>(limit + 1)
        .bind::<BigInt, _>(offset)
        .load(&conn)?;

    let summaries: Vec<VideoSummary> = rows.into_iter().map(VideoSummary::from).collect();
    Ok(HttpResponse::Ok().json(paginate(summaries, limit, offset)))
}
