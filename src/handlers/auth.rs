use axum::{
    extract::{Query, State},
    response::{Json, Redirect},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::{generate_state, normalize_claims, sign_in, SESSION_COOKIE, STATE_COOKIE},
    errors::{AppError, Result},
    handlers::AppState,
    middleware::auth::AuthenticatedUser,
    models::{SessionResponse, SessionUser},
};

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn build_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

fn expired_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}

/// Starts the OAuth round trip.
pub async fn signin(State(state): State<AppState>, jar: CookieJar) -> Result<(CookieJar, Redirect)> {
    let csrf_state = generate_state();
    let url = state.identity.authorization_url(&csrf_state)?;

    let jar = jar.add(build_cookie(STATE_COOKIE, csrf_state, state.config.secure_cookies));
    Ok((jar, Redirect::to(&url)))
}

pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect)> {
    if let Some(error) = params.error {
        return Err(AppError::Auth(format!("Identity provider returned error: {}", error)));
    }

    let expected = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    match (expected.as_deref(), params.state.as_deref()) {
        (Some(expected), Some(received)) if !expected.is_empty() && expected == received => {}
        _ => return Err(AppError::Auth("OAuth state mismatch".to_string())),
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::Auth("Missing authorization code".to_string()))?;

    let claims = state.identity.exchange_code(&code).await?;
    let profile = normalize_claims(claims)?;
    let user = sign_in(state.users.as_ref(), profile).await?;

    let token = state.sessions.issue(user.id, &user.email)?;
    tracing::info!(user_id = %user.id, "User signed in");

    let jar = jar
        .remove(expired_cookie(STATE_COOKIE))
        .add(build_cookie(SESSION_COOKIE, token, state.config.secure_cookies));

    Ok((jar, Redirect::to(&state.config.post_login_redirect)))
}

#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses(
        (status = 200, description = "Current session", body = SessionResponse),
        (status = 401, description = "No valid session")
    ),
    tag = "auth"
)]
pub async fn session(user: AuthenticatedUser) -> Result<Json<SessionResponse>> {
    Ok(Json(SessionResponse {
        user: SessionUser {
            id: user.id,
            email: user.email,
            name: user.name,
            image: user.image,
        },
        expires: user.session_expires,
    }))
}

pub async fn signout(jar: CookieJar) -> (CookieJar, Json<serde_json::Value>) {
    let jar = jar.remove(expired_cookie(SESSION_COOKIE));
    (jar, Json(json!({ "success": true })))
}
