//! Token authentication for the order endpoints.
//!
//! Clients send `Authorization: Token <key>` (or `Bearer <key>`); the key
//! is the token issued at registration. Handlers that take an [`AuthUser`]
//! never run for anonymous requests.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use mongodb::bson::doc;

use crate::{
    action::Resource,
    error::ApiError,
    models::user_model::User,
    state::AppState,
};

const SCHEMES: [&str; 2] = ["Token ", "Bearer "];

/// Extracts the key from an `Authorization` header value.
pub fn parse_authorization(value: &str) -> Result<&str, ApiError> {
    let key = SCHEMES
        .iter()
        .find_map(|scheme| value.strip_prefix(scheme))
        .ok_or_else(|| ApiError::Unauthorized("Invalid authorization header. Expected 'Token <key>'".into()))?
        .trim();

    if key.is_empty() || key.contains(char::is_whitespace) {
        return Err(ApiError::Unauthorized(
            "Invalid token header. Token string should not contain spaces.".into(),
        ));
    }
    Ok(key)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Authentication credentials were not provided.".into()))?;
        let key = parse_authorization(header_value)?;

        let state = parts
            .extensions
            .get::<Arc<AppState>>()
            .cloned()
            .ok_or_else(|| ApiError::Internal("application state is not installed".into()))?;

        let user = state
            .collection::<User>(Resource::User)
            .find_one(doc! { "token": key }, None)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Invalid token.".into()))?;

        Ok(AuthUser {
            id: user.id,
            username: user.username,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_token_and_bearer_schemes() {
        assert_eq!(parse_authorization("Token abc123").unwrap(), "abc123");
        assert_eq!(parse_authorization("Bearer abc123").unwrap(), "abc123");
    }

    #[test]
    fn rejects_other_schemes() {
        assert!(matches!(
            parse_authorization("Basic dXNlcjpwYXNz"),
            Err(ApiError::Unauthorized(_))
        ));
        assert!(matches!(parse_authorization("abc123"), Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn rejects_empty_or_spaced_keys() {
        assert!(parse_authorization("Token ").is_err());
        assert!(parse_authorization("Token a b").is_err());
    }
}
