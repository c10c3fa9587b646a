//! Caller identity.
//!
//! Sessions are issued elsewhere; callers name themselves with an
//! `X-User-Id` header holding their user id.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use super::AppState;
use crate::error::AppError;
use crate::models::User;

pub const USER_ID_HEADER: &str = "x-user-id";

/// An active user named by the `X-User-Id` header.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// A current user who may edit course content.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized("Missing X-User-Id header".to_string()))?
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid X-User-Id header".to_string()))?;

        let user_id = Uuid::parse_str(raw.trim())
            .map_err(|_| AppError::Unauthorized("Invalid X-User-Id header".to_string()))?
            .to_string();

        let user = state
            .with_tx(move |db, _| Ok(db.get_user(&user_id)?))
            .await?;

        match user {
            Some(user) if user.is_active => Ok(CurrentUser(user)),
            _ => Err(AppError::Unauthorized(
                "Unknown or inactive user".to_string(),
            )),
        }
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if user.is_admin() {
            Ok(AdminUser(user))
        } else {
            Err(AppError::Forbidden("Admin privileges required".to_string()))
        }
    }
}
