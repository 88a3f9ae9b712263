use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::config;
use crate::error::ApiError;

/// One connection per request. Handlers call this at the top and thread the
/// connection through their queries.
pub fn connect() -> Result<PgConnection, ApiError> {
    let database_url = config::database_url()?;
    let conn = PgConnection::establish(&database_url)?;
    Ok(conn)
}
