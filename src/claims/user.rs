use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::ApiError;

/// Session token claims minted by the identity provider. `sub` is the
/// provider's user id, which `users.external_id` mirrors.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub exp: usize,
}

/// The authenticated caller, extracted from the `Authorization: Bearer`
/// header. Public endpoints take `Option<Identity>` instead and treat a
/// failed extraction as an anonymous request.
#[derive(Debug)]
pub struct Identity {
    pub external_id: String,
}

pub fn decode_session(token: &str, secret: &str) -> Result<SessionClaims, ApiError> {
    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized("Invalid session token".into()))?;
    Ok(data.claims)
}

fn identity_from_request(req: &HttpRequest) -> Result<Identity, ApiError> {
    let header = req
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Expected a bearer token".into()))?;

    let secret = config::session_jwt_secret()?;
    let claims = decode_session(token, &secret)?;

    Ok(Identity {
        external_id: claims.sub,
    })
}

impl FromRequest for Identity {
    type Error = ApiError;
    type Future = Ready<Result<Identity, ApiError>>;
    type Config = ();

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(identity_from_request(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn issue(sub: &str, exp: usize, secret: &str) -> String {
        let claims = SessionClaims {
            sub: sub.to_string(),
            exp,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn far_future() -> usize {
        4102444800 // 2100-01-01
    }

    #[test]
    fn valid_token_round_trips() {
        let token = issue("user_2abc", far_future(), "s3cret");
        let claims = decode_session(&token, "s3cret").unwrap();
        assert_eq!(claims.sub, "user_2abc");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue("user_2abc", far_future(), "s3cret");
        assert!(decode_session(&token, "other").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue("user_2abc", 1000, "s3cret");
        assert!(decode_session(&token, "s3cret").is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(decode_session("not-a-jwt", "s3cret").is_err());
    }
}
