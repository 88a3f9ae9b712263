use actix_web::{get, post, web, HttpResponse};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text};
use serde::{Deserialize, Serialize};

use crate::claims::user::Identity;
use crate::db;
use crate::error::ApiError;
use crate::helpers::users::require_user;
use crate::models::{NewSubscription, Subscription, SubscriptionListRow, SubscriptionView};
use crate::pagination::{paginate, PageParams};
use crate::schema::subscriptions::dsl as subscriptions_dsl;

#[derive(Deserialize)]
pub struct ToggleBody {
    pub creator_id: String,
}

#[derive(Serialize)]
pub struct ToggleResponse {
    pub subscribed: bool,
}

/// Whether the toggle should end in a subscription. Subscribing to your own
/// channel is rejected outright.
fn plan_toggle(
    viewer_id: &str,
    creator_id: &str,
    currently_subscribed: bool,
) -> Result<bool, ApiError> {
    if viewer_id == creator_id {
        return Err(ApiError::BadRequest("Cannot subscribe to yourself".into()));
    }
    Ok(!currently_subscribed)
}

#[post("/toggle")]
pub async fn toggle_subscription(
    identity: Identity,
    data: web::Json<ToggleBody>,
) -> Result<HttpResponse, ApiError> {
    let conn = db::connect()?;
    let user = require_user(&conn, &identity)?;

    let target = subscriptions_dsl::subscriptions.filter(
        subscriptions_dsl::viewer_id
            .eq(&user.id)
            .and(subscriptions_dsl::creator_id.eq(&data.creator_id)),
    );

    let existing: Option<Subscription> = target.first::<Subscription>(&conn).optional()?;
    let subscribed = plan_toggle(&user.id, &data.creator_id, existing.is_some())?;

    if subscribed {
        let new_subscription = NewSubscription {
            viewer_id: &user.id,
            creator_id: &data.creator_id,
        };
        diesel::insert_into(subscriptions_dsl::subscriptions)
            .values(&new_subscription)
            .execute(&conn)
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                    ApiError::BadRequest("Channel not found".into())
                }
                other => ApiError::from(other),
            })?;
    } else {
        diesel::delete(target).execute(&conn)?;
    }

    Ok(HttpResponse::Ok().json(ToggleResponse { subscribed }))
}

/// Channels the caller subscribes to, most recent first.
#[get("/")]
pub async fn get_subscriptions(
    identity: Identity,
    params: web::Query<PageParams>,
) -> Result<HttpResponse, ApiError> {
    let conn = db::connect()?;
    let user = require_user(&conn, &identity)?;
    let limit = params.limit();
    let offset = params.offset();

    let sql = "SELECT \
        s.creator_id, s.created_at, \
        u.name AS user_name, u.image_url AS user_image_url, \
        (SELECT count(*) FROM subscriptions s2 WHERE s2.creator_id = s.creator_id) AS subscriber_count \
        FROM subscriptions s INNER JOIN users u ON u.id = s.creator_id \
        WHERE s.viewer_id = $1 \
        ORDER BY s.created_at DESC LIMIT $2 OFFSET $3";

    let rows: Vec<SubscriptionListRow> = sql_query(sql)
        .bind::<Text, _>(&user.id)
        .bind::<BigInt, _>(limit + 1)
        .bind::<BigInt, _>(offset)
        .load(&conn)?;

    let items: Vec<SubscriptionView> = rows.into_iter().map(SubscriptionView::from).collect();
    Ok(HttpResponse::Ok().json(paginate(items, limit, offset)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_twice_returns_to_the_starting_state() {
        let after_first = plan_toggle("viewer", "creator", false).unwrap();
        assert!(after_first);
        let after_second = plan_toggle("viewer", "creator", after_first).unwrap();
        assert!(!after_second);
    }

    #[test]
    fn self_subscription_is_rejected() {
        let err = plan_toggle("same", "same", false).unwrap_err();
        assert_eq!(err.code(), "BAD_REQUEST");
    }
}
