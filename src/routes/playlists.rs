use actix_web::{delete, get, post, web, HttpResponse};
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text};
use diesel::PgConnection;
use serde::Deserialize;

use crate::claims::user::Identity;
use crate::db;
use crate::error::ApiError;
use crate::helpers::users::require_user;
use crate::models::{
    new_id, NewPlaylist, NewPlaylistVideo, Playlist, PlaylistForVideoRow, PlaylistListRow,
    PlaylistSummary, TimedVideoListRow, VideoListRow, VideoSummary, VIDEO_LIST_COLUMNS,
};
use crate::pagination::{paginate, PageParams};
use crate::schema::playlist_videos::dsl as playlist_videos_dsl;
use crate::schema::playlists::dsl as playlists_dsl;

const PLAYLIST_LIST_COLUMNS: &str = "\
    p.id, p.name, p.description, p.user_id, p.created_at, p.updated_at, \
    (SELECT count(*) FROM playlist_videos pv WHERE pv.playlist_id = p.id) AS video_count, \
    (SELECT v.thumbnail_url FROM playlist_videos pv \
       INNER JOIN videos v ON v.id = pv.video_id \
       WHERE pv.playlist_id = p.id ORDER BY pv.created_at DESC LIMIT 1) AS latest_video_thumbnail";

// History and liked listings deliberately skip the visibility filter: a
// video the viewer watched or liked stays on their own lists even after
// its owner makes it private.
fn history_sql() -> String {
    format!(
        "SELECT {}, vv2.updated_at AS occurred_at \
         FROM videos v INNER JOIN users u ON u.id = v.user_id \
         INNER JOIN video_views vv2 ON vv2.video_id = v.id AND vv2.user_id = $1 \
         ORDER BY vv2.updated_at DESC LIMIT $2 OFFSET $3",
        VIDEO_LIST_COLUMNS
    )
}

fn liked_sql() -> String {
    format!(
        "SELECT {}, vr2.created_at AS occurred_at \
         FROM videos v INNER JOIN users u ON u.id = v.user_id \
         INNER JOIN video_reactions vr2 ON vr2.video_id = v.id \
           AND vr2.user_id = $1 AND vr2.reaction_type = 'like' \
         ORDER BY vr2.created_at DESC LIMIT $2 OFFSET $3",
        VIDEO_LIST_COLUMNS
    )
}

fn playlist_videos_sql() -> String {
    format!(
        "SELECT {} FROM videos v INNER JOIN users u ON u.id = v.user_id \
         INNER JOIN playlist_videos pv ON pv.video_id = v.id AND pv.playlist_id = $1 \
         WHERE v.visibility = 'PUBLIC' \
         ORDER BY v.updated_at DESC LIMIT $2 OFFSET $3",
        VIDEO_LIST_COLUMNS
    )
}

fn owned_playlist(
    conn: &PgConnection,
    playlist_id: &str,
    user_id: &str,
) -> Result<Playlist, ApiError> {
    playlists_dsl::playlists
        .filter(
            playlists_dsl::id
                .eq(playlist_id)
                .and(playlists_dsl::user_id.eq(user_id)),
        )
        .first::<Playlist>(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Playlist not found".into()))
}

#[derive(Deserialize)]
pub struct CreatePlaylistBody {
    pub name: String,
}

#[post("/")]
pub async fn create_playlist(
    identity: Identity,
    data: web::Json<CreatePlaylistBody>,
) -> Result<HttpResponse, ApiError> {
    let conn = db::connect()?;
    let user = require_user(&conn, &identity)?;

    let name = data.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Playlist name must not be empty".into()));
    }

    let playlist_id = new_id();
    let new_playlist = NewPlaylist {
        id: &playlist_id,
        name,
        user_id: &user.id,
    };

    let created: Playlist = diesel::insert_into(playlists_dsl::playlists)
        .values(&new_playlist)
        .get_result::<Playlist>(&conn)?;

    Ok(HttpResponse::Ok().json(created))
}

#[get("/")]
pub async fn get_playlists(
    identity: Identity,
    params: web::Query<PageParams>,
) -> Result<HttpResponse, ApiError> {
    let conn = db::connect()?;
    let user = require_user(&conn, &identity)?;
    let limit = params.limit();
    let offset = params.offset();

    let sql = format!(
        "SELECT {} FROM playlists p WHERE p.user_id = $1 \
         ORDER BY p.updated_at DESC LIMIT $2 OFFSET $3",
        PLAYLIST_LIST_COLUMNS
    );

    let rows: Vec<PlaylistListRow> = sql_query(sql)
        .bind::<Text, _>(&user.id)
        .bind::<BigInt, _>(limit + 1)
        .bind::<BigInt, _>(offset)
        .load(&conn)?;

    let items: Vec<PlaylistSummary> = rows.into_iter().map(PlaylistSummary::from).collect();
    Ok(HttpResponse::Ok().json(paginate(items, limit, offset)))
}

/// Same listing as `get_playlists`, with a flag per playlist saying whether
/// it already holds the given video. Backs the save-to-playlist dialog.
#[get("/for-video/{video_id}")]
pub async fn get_playlists_for_video(
    identity: Identity,
    path: web::Path<String>,
    params: web::Query<PageParams>,
) -> Result<HttpResponse, ApiError> {
    let video_id = path.into_inner();
    let conn = db::connect()?;
    let user = require_user(&conn, &identity)?;
    let limit = params.limit();
    let offset = params.offset();

    let sql = format!(
        "SELECT {}, \
         EXISTS(SELECT 1 FROM playlist_videos pv2 \
                WHERE pv2.playlist_id = p.id AND pv2.video_id = $2) AS contains_video \
         FROM playlists p WHERE p.user_id = $1 \
         ORDER BY p.updated_at DESC LIMIT $3 OFFSET $4",
        PLAYLIST_LIST_COLUMNS
    );

    let rows: Vec<PlaylistForVideoRow> = sql_query(sql)
        .bind::<Text, _>(&user.id)
        .bind::<Text, _>(&video_id)
        .bind::<BigInt, _>(limit + 1)
        .bind::<BigInt, _>(offset)
        .load(&conn)?;

    let items: Vec<PlaylistSummary> = rows.into_iter().map(PlaylistSummary::from).collect();
    Ok(HttpResponse::Ok().json(paginate(items, limit, offset)))
}

/// Watch history, ordered by when the caller last viewed each video.
#[get("/history")]
pub async fn get_history(
    identity: Identity,
    params: web::Query<PageParams>,
) -> Result<HttpResponse, ApiError> {
    let conn = db::connect()?;
    let user = require_user(&conn, &identity)?;
    let limit = params.limit();
    let offset = params.offset();

    let rows: Vec<TimedVideoListRow> = sql_query(history_sql())
        .bind::<Text, _>(&user.id)
        .bind::<BigInt, _>(limit + 1)
        .bind::<BigInt, _>(offset)
        .load(&conn)?;

    let items: Vec<VideoSummary> = rows
        .into_iter()
        .map(|row| {
            let (mut summary, occurred_at) = row.split();
            summary.viewed_at = Some(occurred_at);
            summary
        })
        .collect();

    Ok(HttpResponse::Ok().json(paginate(items, limit, offset)))
}

/// Videos the caller liked, most recent like first.
#[get("/liked")]
pub async fn get_liked(
    identity: Identity,
    params: web::Query<PageParams>,
) -> Result<HttpResponse, ApiError> {
    let conn = db::connect()?;
    let user = require_user(&conn, &identity)?;
    let limit = params.limit();
    let offset = params.offset();

    let rows: Vec<TimedVideoListRow> = sql_query(liked_sql())
        .bind::<Text, _>(&user.id)
        .bind::<BigInt, _>(limit + 1)
        .bind::<BigInt, _>(offset)
        .load(&conn)?;

    let items: Vec<VideoSummary> = rows
        .into_iter()
        .map(|row| {
            let (mut summary, occurred_at) = row.split();
            summary.liked_at = Some(occurred_at);
            summary
        })
        .collect();

    Ok(HttpResponse::Ok().json(paginate(items, limit, offset)))
}

#[derive(Deserialize)]
pub struct PlaylistVideoBody {
    pub playlist_id: String,
    pub video_id: String,
}

#[post("/add-video")]
pub async fn add_video(
    identity: Identity,
    data: web::Json<PlaylistVideoBody>,
) -> Result<HttpResponse, ApiError> {
    let conn = db::connect()?;
    let user = require_user(&conn, &identity)?;
    owned_playlist(&conn, &data.playlist_id, &user.id)?;

    let new_entry = NewPlaylistVideo {
        playlist_id: &data.playlist_id,
        video_id: &data.video_id,
    };
    diesel::insert_into(playlist_videos_dsl::playlist_videos)
        .values(&new_entry)
        .execute(&conn)
        .map_err(|err| match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                ApiError::BadRequest("Video already in playlist".into())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                ApiError::BadRequest("Video not found".into())
            }
            other => ApiError::from(other),
        })?;

    diesel::update(playlists_dsl::playlists.find(&data.playlist_id))
        .set(playlists_dsl::updated_at.eq(Utc::now()))
        .execute(&conn)?;

    Ok(HttpResponse::Ok().json("Video added to playlist"))
}

#[post("/remove-video")]
pub async fn remove_video(
    identity: Identity,
    data: web::Json<PlaylistVideoBody>,
) -> Result<HttpResponse, ApiError> {
    let conn = db::connect()?;
    let user = require_user(&conn, &identity)?;
    owned_playlist(&conn, &data.playlist_id, &user.id)?;

    let deleted = diesel::delete(
        playlist_videos_dsl::playlist_videos.filter(
            playlist_videos_dsl::playlist_id
                .eq(&data.playlist_id)
                .and(playlist_videos_dsl::video_id.eq(&data.video_id)),
        ),
    )
    .execute(&conn)?;

    if deleted == 0 {
        return Err(ApiError::BadRequest("Video not in playlist".into()));
    }

    diesel::update(playlists_dsl::playlists.find(&data.playlist_id))
        .set(playlists_dsl::updated_at.eq(Utc::now()))
        .execute(&conn)?;

    Ok(HttpResponse::Ok().json("Video removed from playlist"))
}

#[get("/{playlist_id}")]
pub async fn get_playlist(
    identity: Identity,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let playlist_id = path.into_inner();
    let conn = db::connect()?;
    let user = require_user(&conn, &identity)?;

    let playlist = owned_playlist(&conn, &playlist_id, &user.id)?;
    Ok(HttpResponse::Ok().json(playlist))
}

#[delete("/{playlist_id}")]
pub async fn remove_playlist(
    identity: Identity,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let playlist_id = path.into_inner();
    let conn = db::connect()?;
    let user = require_user(&conn, &identity)?;

    let deleted = diesel::delete(
        playlists_dsl::playlists.filter(
            playlists_dsl::id
                .eq(&playlist_id)
                .and(playlists_dsl::user_id.eq(&user.id)),
        ),
    )
    .execute(&conn)?;

    if deleted == 0 {
        return Err(ApiError::NotFound("Playlist not found".into()));
    }

    Ok(HttpResponse::Ok().json("Playlist deleted"))
}

#[get("/{playlist_id}/videos")]
pub async fn get_playlist_videos(
    identity: Identity,
    path: web::Path<String>,
    params: web::Query<PageParams>,
) -> Result<HttpResponse, ApiError> {
    let playlist_id = path.into_inner();
    let conn = db::connect()?;
    let user = require_user(&conn, &identity)?;
    owned_playlist(&conn, &playlist_id, &user.id)?;

    let limit = params.limit();
    let offset = params.offset();

    let rows: Vec<VideoListRow> = sql_query(playlist_videos_sql())
        .bind::<Text, _>(&playlist_id)
        .bind::<BigInt, _>(limit + 1)
        .bind::<BigInt, _>(offset)
        .load(&conn)?;

    let items: Vec<VideoSummary> = rows.into_iter().map(VideoSummary::from).collect();
    Ok(HttpResponse::Ok().json(paginate(items, limit, offset)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playlist_videos_are_ordered_by_video_update_time() {
        assert!(playlist_videos_sql().contains("ORDER BY v.updated_at DESC"));
    }

    #[test]
    fn history_and_liked_keep_the_viewers_private_videos() {
        assert!(!history_sql().contains("visibility"));
        assert!(!liked_sql().contains("visibility"));
    }

    #[test]
    fn history_and_liked_order_by_the_interaction_time() {
        assert!(history_sql().contains("ORDER BY vv2.updated_at DESC"));
        assert!(liked_sql().contains("ORDER BY vr2.created_at DESC"));
    }
}
