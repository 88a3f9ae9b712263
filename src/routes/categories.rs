use actix_web::{get, HttpResponse};
use diesel::prelude::*;

use crate::db;
use crate::error::ApiError;
use crate::models::Category;
use crate::schema::categories::dsl::{categories, name};

#[get("/")]
pub async fn get_categories() -> Result<HttpResponse, ApiError> {
    let conn = db::connect()?;

    let result: Vec<Category> = categories.order_by(name.asc()).load::<Category>(&conn)?;

    Ok(HttpResponse::Ok().json(result))
}
