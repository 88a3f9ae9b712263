use actix_web::{get, web, HttpResponse};
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text};
use serde::Deserialize;

use crate::db;
use crate::error::ApiError;
use crate::models::{video_list_select, VideoListRow, VideoSummary};
use crate::pagination::{paginate, PageParams};

#[derive(Deserialize)]
pub struct SearchParams {
    pub limit: Option<i64>,
    pub cursor: Option<i64>,
    pub query: Option<String>,
    pub category_id: Option<String>,
}

/// Case-insensitive substring search over titles and descriptions. An empty
/// query degrades to a plain category-filtered listing.
#[get("/")]
pub async fn search_videos(params: web::Query<SearchParams>) -> Result<HttpResponse, ApiError> {
    let conn = db::connect()?;
    let page = PageParams {
        limit: params.limit,
        cursor: params.cursor,
    };
    let limit = page.limit();
    let offset = page.offset();

    let query = params.query.clone().unwrap_or_default();
    let category_id = params.category_id.clone().unwrap_or_default();

    let sql = format!(
        "{} WHERE v.visibility = 'PUBLIC' \
         AND ($1 = '' OR v.title ILIKE '%' || $1 || '%' OR v.description ILIKE '%' || $1 || '%') \
         AND ($2 = '' OR v.category_id = $2) \
         ORDER BY v.created_at DESC LIMIT $3 OFFSET $4",
        video_list_select()
    );

    let rows: Vec<VideoListRow> = sql_query(sql)
        .bind::<Text, _>(query)
        .bind::<Text, _>(category_id)
        .bind::<BigInt, _>(limit + 1)
        .bind::<BigInt, _>(offset)
        .load(&conn)?;

    let summaries: Vec<VideoSummary> = rows.into_iter().map(VideoSummary::from).collect();
    Ok(HttpResponse::Ok().json(paginate(summaries, limit, offset)))
}
