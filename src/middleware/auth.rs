use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    auth::SESSION_COOKIE,
    errors::{AppError, Result},
    handlers::AppState,
};

/// The signed-in user behind a request. Extracting it is what makes a route
/// protected.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub session_expires: DateTime<Utc>,
}

impl AuthenticatedUser {
    /// Records belonging to someone else are reported exactly like a missing
    /// session.
    pub fn ensure_owns(&self, owner_id: Uuid) -> Result<()> {
        if self.id == owner_id {
            Ok(())
        } else {
            tracing::warn!(user_id = %self.id, %owner_id, "Access to foreign record denied");
            Err(AppError::Unauthorized)
        }
    }
}

fn session_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string());

    bearer.or_else(|| {
        CookieJar::from_headers(&parts.headers)
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
    })
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let token = session_token(parts).ok_or(AppError::Unauthorized)?;
        let claims = state.sessions.verify(&token)?;
        let user_id = claims.user_id()?;

        let user = state
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        Ok(AuthenticatedUser {
            id: user.id,
            email: user.email,
            name: user.name,
            image: user.image,
            session_expires: claims.expires_at(),
        })
    }
}
