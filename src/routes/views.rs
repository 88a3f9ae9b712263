use actix_web::{post, web, HttpResponse};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::Deserialize;

use crate::claims::user::Identity;
use crate::db;
use crate::error::ApiError;
use crate::helpers::users::find_by_external_id;
use crate::models::NewVideoView;
use crate::schema::video_views::dsl as video_views_dsl;

#[derive(Deserialize)]
pub struct RecordViewBody {
    pub video_id: String,
}

/// One view per user per video; repeats are silently absorbed. Anonymous
/// playback is not counted at all.
#[post("/")]
pub async fn record_view(
    identity: Option<Identity>,
    data: web::Json<RecordViewBody>,
) -> Result<HttpResponse, ApiError> {
    let identity = match identity {
        Some(v) => v,
        None => return Ok(HttpResponse::Ok().json("View ignored")),
    };

    let conn = db::connect()?;
    let user = match find_by_external_id(&conn, &identity.external_id)? {
        Some(v) => v,
        None => return Ok(HttpResponse::Ok().json("View ignored")),
    };

    let new_view = NewVideoView {
        user_id: &user.id,
        video_id: &data.video_id,
    };
    diesel::insert_into(video_views_dsl::video_views)
        .values(&new_view)
        .on_conflict_do_nothing()
        .execute(&conn)
        .map_err(|err| match err {
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                ApiError::BadRequest("Video not found".into())
            }
            other => ApiError::from(other),
        })?;

    Ok(HttpResponse::Ok().json("View recorded"))
}
