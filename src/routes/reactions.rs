use actix_web::{post, web, HttpResponse};
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::{Deserialize, Serialize};

use crate::claims::user::Identity;
use crate::db;
use crate::error::ApiError;
use crate::helpers::users::require_user;
use crate::models::{NewCommentReaction, NewVideoReaction, ReactionKind};
use crate::schema::comment_reactions::dsl as comment_reactions_dsl;
use crate::schema::video_reactions::dsl as video_reactions_dsl;

#[derive(Serialize)]
pub struct ReactionState {
    pub reaction: Option<&'static str>,
}

/// Toggle semantics: repeating a reaction clears it, reacting the other way
/// flips it, and the first reaction inserts a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReactionChange {
    Remove,
    Replace,
    Insert,
}

fn plan_reaction(existing: Option<&str>, requested: &str) -> ReactionChange {
    match existing {
        Some(current) if current == requested => ReactionChange::Remove,
        Some(_) => ReactionChange::Replace,
        None => ReactionChange::Insert,
    }
}

fn reaction_after(change: ReactionChange, requested: &'static str) -> Option<&'static str> {
    match change {
        ReactionChange::Remove => None,
        ReactionChange::Replace | ReactionChange::Insert => Some(requested),
    }
}

fn fk_to_bad_request(what: &'static str) -> impl Fn(DieselError) -> ApiError {
    move |err| match err {
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            ApiError::BadRequest(format!("{} not found", what))
        }
        other => ApiError::from(other),
    }
}

#[derive(Deserialize)]
pub struct VideoReactionBody {
    pub video_id: String,
    pub reaction: ReactionKind,
}

#[post("/video")]
pub async fn react_to_video(
    identity: Identity,
    data: web::Json<VideoReactionBody>,
) -> Result<HttpResponse, ApiError> {
    let conn = db::connect()?;
    let user = require_user(&conn, &identity)?;

    let target = video_reactions_dsl::video_reactions.filter(
        video_reactions_dsl::user_id
            .eq(&user.id)
            .and(video_reactions_dsl::video_id.eq(&data.video_id)),
    );

    let existing: Option<String> = target
        .select(video_reactions_dsl::reaction_type)
        .first::<String>(&conn)
        .optional()?;

    let change = plan_reaction(existing.as_deref(), data.reaction.as_str());
    match change {
        ReactionChange::Remove => {
            diesel::delete(target).execute(&conn)?;
        }
        ReactionChange::Replace => {
            diesel::update(target)
                .set((
                    video_reactions_dsl::reaction_type.eq(data.reaction.as_str()),
                    video_reactions_dsl::updated_at.eq(Utc::now()),
                ))
                .execute(&conn)?;
        }
        ReactionChange::Insert => {
            let new_reaction = NewVideoReaction {
                user_id: &user.id,
                video_id: &data.video_id,
                reaction_type: data.reaction.as_str(),
            };
            diesel::insert_into(video_reactions_dsl::video_reactions)
                .values(&new_reaction)
                .execute(&conn)
                .map_err(fk_to_bad_request("Video"))?;
        }
    }

    Ok(HttpResponse::Ok().json(ReactionState {
        reaction: reaction_after(change, data.reaction.as_str()),
    }))
}

#[derive(Deserialize)]
pub struct CommentReactionBody {
    pub comment_id: String,
    pub reaction: ReactionKind,
}

#[post("/comment")]
pub async fn react_to_comment(
    identity: Identity,
    data: web::Json<CommentReactionBody>,
) -> Result<HttpResponse, ApiError> {
    let conn = db::connect()?;
    let user = require_user(&conn, &identity)?;

    let target = comment_reactions_dsl::comment_reactions.filter(
        comment_reactions_dsl::user_id
            .eq(&user.id)
            .and(comment_reactions_dsl::comment_id.eq(&data.comment_id)),
    );

    let existing: Option<String> = target
        .select(comment_reactions_dsl::reaction_type)
        .first::<String>(&conn)
        .optional()?;

    let change = plan_reaction(existing.as_deref(), data.reaction.as_str());
    match change {
        ReactionChange::Remove => {
            diesel::delete(target).execute(&conn)?;
        }
        ReactionChange::Replace => {
            diesel::update(target)
                .set((
                    comment_reactions_dsl::reaction_type.eq(data.reaction.as_str()),
                    comment_reactions_dsl::updated_at.eq(Utc::now()),
                ))
                .execute(&conn)?;
        }
        ReactionChange::Insert => {
            let new_reaction = NewCommentReaction {
                user_id: &user.id,
                comment_id: &data.comment_id,
                reaction_type: data.reaction.as_str(),
            };
            diesel::insert_into(comment_reactions_dsl::comment_reactions)
                .values(&new_reaction)
                .execute(&conn)
                .map_err(fk_to_bad_request("Comment"))?;
        }
    }

    Ok(HttpResponse::Ok().json(ReactionState {
        reaction: reaction_after(change, data.reaction.as_str()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeating_a_reaction_returns_to_no_reaction() {
        let first = plan_reaction(None, "like");
        assert_eq!(first, ReactionChange::Insert);
        let state = reaction_after(first, "like");
        assert_eq!(state, Some("like"));

        let second = plan_reaction(state, "like");
        assert_eq!(second, ReactionChange::Remove);
        assert_eq!(reaction_after(second, "like"), None);
    }

    #[test]
    fn opposite_reaction_flips_in_place() {
        let change = plan_reaction(Some("like"), "dislike");
        assert_eq!(change, ReactionChange::Replace);
        assert_eq!(reaction_after(change, "dislike"), Some("dislike"));
    }

    #[test]
    fn fk_violation_on_insert_reads_as_bad_request() {
        let err = fk_to_bad_request("Video")(DieselError::DatabaseError(
            DatabaseErrorKind::ForeignKeyViolation,
            Box::new(String::from("violates foreign key constraint")),
        ));
        assert_eq!(err.code(), "BAD_REQUEST");
    }
}
