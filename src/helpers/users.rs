use diesel::prelude::*;
use diesel::PgConnection;

use crate::claims::user::Identity;
use crate::error::ApiError;
use crate::models::User;
use crate::schema::users::dsl::{external_id, users};

pub fn find_by_external_id(
    conn: &PgConnection,
    target: &str,
) -> Result<Option<User>, ApiError> {
    let user = users
        .filter(external_id.eq(target))
        .first::<User>(conn)
        .optional()?;
    Ok(user)
}

/// Resolves the caller to a database row. Having a valid session token for
/// a user the identity webhook never delivered is treated as unauthorized.
pub fn require_user(conn: &PgConnection, identity: &Identity) -> Result<User, ApiError> {
    find_by_external_id(conn, &identity.external_id)?
        .ok_or_else(|| ApiError::Unauthorized("Unknown user".into()))
}

/// The caller's internal id for read queries that personalise results.
/// Anonymous or unknown callers get a value that matches no row.
pub fn viewer_id(conn: &PgConnection, identity: Option<&Identity>) -> Result<String, ApiError> {
    match identity {
        Some(identity) => Ok(find_by_external_id(conn, &identity.external_id)?
            .map(|u| u.id)
            .unwrap_or_default()),
        None => Ok(String::new()),
    }
}
