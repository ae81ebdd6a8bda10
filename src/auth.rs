use crate::errors::AppError;
use crate::models::UserId;
use crate::state::AppState;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

pub const USER_HEADER: &str = "x-user-id";

/// The signed-in user, taken from the `x-user-id` header or the configured default.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserId);

/// `None` only when no header was sent and no default user is configured. A header
/// that is present but unusable is still rejected.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<UserId>);

fn resolve_user(parts: &Parts, state: &AppState) -> Result<Option<UserId>, AppError> {
    match parts.headers.get(USER_HEADER) {
        Some(value) => {
            let raw = value
                .to_str()
                .map_err(|_| AppError::bad_request("x-user-id must be valid text"))?;
            let user = UserId::parse(raw).map_err(|_| AppError::unauthorized("x-user-id is empty"))?;
            Ok(Some(user))
        }
        None => Ok(state.config.default_user.clone()),
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve_user(parts, state)?
            .map(Self)
            .ok_or_else(|| AppError::unauthorized("missing x-user-id header"))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve_user(parts, state).map(Self)
    }
}
