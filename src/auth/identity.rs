use crate::auth::oauth::IdentityClaims;
use crate::database::UserRepository;
use crate::errors::{AppError, Result};
use crate::models::{NewUser, User};

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Provider claims to a user profile. The email is the join key, so claims
/// without one are rejected.
pub fn normalize_claims(claims: IdentityClaims) -> Result<NewUser> {
    let email = non_empty(claims.email)
        .map(|email| email.to_lowercase())
        .ok_or_else(|| AppError::Auth("Identity provider returned no email".to_string()))?;

    Ok(NewUser {
        email,
        name: non_empty(claims.name),
        image: non_empty(claims.picture),
    })
}

/// Creates the user on first sign-in, otherwise bumps `updated_at`.
pub async fn sign_in(users: &dyn UserRepository, profile: NewUser) -> Result<User> {
    match users.find_by_email(&profile.email).await? {
        Some(existing) => {
            tracing::debug!(user_id = %existing.id, "Returning user signed in");
            users.touch(existing.id).await
        }
        None => {
            let user = users.create(&profile).await?;
            tracing::info!(user_id = %user.id, "Created user on first sign-in");
            Ok(user)
        }
    }
}
