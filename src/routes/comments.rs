use actix_web::{delete, get, post, web, HttpResponse};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text};
use serde::{Deserialize, Serialize};

use crate::claims::user::Identity;
use crate::db;
use crate::error::ApiError;
use crate::helpers::users::{require_user, viewer_id};
use crate::models::{new_id, Comment, CommentListRow, CommentView, NewComment};
use crate::pagination::PageParams;
use crate::schema::comments::dsl as comments_dsl;

pub const MAX_COMMENT_LEN: usize = 250;

// The limit counts characters, so multibyte text is not short-changed.
fn check_body(body: &str) -> Result<(), ApiError> {
    if body.is_empty() || body.chars().count() > MAX_COMMENT_LEN {
        return Err(ApiError::BadRequest(format!(
            "Comment must be between 1 and {} characters",
            MAX_COMMENT_LEN
        )));
    }
    Ok(())
}

#[derive(Deserialize)]
pub struct CreateCommentBody {
    pub video_id: String,
    pub parent_id: Option<String>,
    pub body: String,
}

/// Threads are one level deep: a reply must point at a top-level comment.
#[post("/")]
pub async fn create_comment(
    identity: Identity,
    data: web::Json<CreateCommentBody>,
) -> Result<HttpResponse, ApiError> {
    let conn = db::connect()?;
    let user = require_user(&conn, &identity)?;

    let body = data.body.trim();
    check_body(body)?;

    let parent_id = data.parent_id.as_deref().filter(|v| !v.is_empty());
    if let Some(parent_id) = parent_id {
        let parent: Comment = comments_dsl::comments
            .find(parent_id)
            .first::<Comment>(&conn)
            .optional()?
            .ok_or_else(|| ApiError::NotFound("Comment not found".into()))?;

        if parent.parent_id.is_some() {
            return Err(ApiError::BadRequest("Cannot reply to a reply".into()));
        }
    }

    let comment_id = new_id();
    let new_comment = NewComment {
        id: &comment_id,
        user_id: &user.id,
        video_id: &data.video_id,
        parent_id,
        body,
    };

    let created: Comment = diesel::insert_into(comments_dsl::comments)
        .values(&new_comment)
        .get_result::<Comment>(&conn)
        .map_err(|err| match err {
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                ApiError::BadRequest("Video not found".into())
            }
            other => ApiError::from(other),
        })?;

    Ok(HttpResponse::Ok().json(created))
}

#[derive(Deserialize)]
pub struct CommentListParams {
    pub limit: Option<i64>,
    pub cursor: Option<i64>,
    pub parent_id: Option<String>,
}

#[derive(Serialize)]
pub struct CommentPage {
    pub items: Vec<CommentView>,
    pub next_cursor: Option<i64>,
    pub total_count: i64,
}

/// Lists either a video's top-level comments or the replies under one
/// comment, depending on `parent_id`. The total is for the whole video, so
/// the UI can show a comment count above the thread.
#[get("/{video_id}")]
pub async fn get_comments(
    identity: Option<Identity>,
    path: web::Path<String>,
    params: web::Query<CommentListParams>,
) -> Result<HttpResponse, ApiError> {
    let video_id = path.into_inner();
    let conn = db::connect()?;
    let viewer = viewer_id(&conn, identity.as_ref())?;

    let page = PageParams {
        limit: params.limit,
        cursor: params.cursor,
    };
    let limit = page.limit();
    let offset = page.offset();
    let parent_id = params.parent_id.clone().unwrap_or_default();

    let total_count: i64 = comments_dsl::comments
        .filter(comments_dsl::video_id.eq(&video_id))
        .count()
        .get_result(&conn)?;

    let sql = "SELECT \
        c.id, c.video_id, c.parent_id, c.body, c.created_at, c.updated_at, \
        u.id AS user_id, u.name AS user_name, u.image_url AS user_image_url, \
        (SELECT count(*) FROM comment_reactions cr WHERE cr.comment_id = c.id AND cr.reaction_type = 'like') AS like_count, \
        (SELECT count(*) FROM comment_reactions cr WHERE cr.comment_id = c.id AND cr.reaction_type = 'dislike') AS dislike_count, \
        (SELECT count(*) FROM comments r WHERE r.parent_id = c.id) AS reply_count, \
        (SELECT cr.reaction_type FROM comment_reactions cr WHERE cr.comment_id = c.id AND cr.user_id = $2) AS viewer_reaction \
        FROM comments c INNER JOIN users u ON u.id = c.user_id \
        WHERE c.video_id = $1 \
        AND (($3 = '' AND c.parent_id IS NULL) OR ($3 <> '' AND c.parent_id = $3)) \
        ORDER BY c.created_at DESC LIMIT $4 OFFSET $5";

    let rows: Vec<CommentListRow> = sql_query(sql)
        .bind::<Text, _>(&video_id)
        .bind::<Text, _>(&viewer)
        .bind::<Text, _>(&parent_id)
        .bind::<BigInt, _>(limit + 1)
        .bind::<BigInt, _>(offset)
        .load(&conn)?;

    let mut items: Vec<CommentView> = rows.into_iter().map(CommentView::from).collect();
    let next_cursor = if items.len() as i64 > limit {
        items.truncate(limit as usize);
        Some(offset + limit)
    } else {
        None
    };

    Ok(HttpResponse::Ok().json(CommentPage {
        items,
        next_cursor,
        total_count,
    }))
}

#[delete("/{comment_id}")]
pub async fn remove_comment(
    identity: Identity,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let comment_id = path.into_inner();
    let conn = db::connect()?;
    let user = require_user(&conn, &identity)?;

    let deleted = diesel::delete(
        comments_dsl::comments.filter(
            comments_dsl::id
                .eq(&comment_id)
                .and(comments_dsl::user_id.eq(&user.id)),
        ),
    )
    .execute(&conn)?;

    if deleted == 0 {
        return Err(ApiError::NotFound("Comment not found".into()));
    }

    Ok(HttpResponse::Ok().json("Comment deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

    #[test]
    fn page_size_bounds_apply_to_comment_listing_params() {
        let page = PageParams {
            limit: Some(MAX_PAGE_SIZE + 10),
            cursor: None,
        };
        assert_eq!(page.limit(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn comment_length_counts_characters_not_bytes() {
        let body = "é".repeat(MAX_COMMENT_LEN);
        assert!(body.len() > MAX_COMMENT_LEN);
        assert!(check_body(&body).is_ok());
        assert!(check_body(&"é".repeat(MAX_COMMENT_LEN + 1)).is_err());
    }

    #[test]
    fn empty_comment_is_rejected() {
        assert!(check_body("").is_err());
        assert!(check_body("a").is_ok());
    }
}
