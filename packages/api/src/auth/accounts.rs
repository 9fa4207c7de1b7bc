//! Email + password accounts.

use serde::Deserialize;
use store::{NewUser, Storage, Transaction, UserInfo};

use super::password::{hash_password, verify_password};
use super::session::Identity;
use crate::error::ApiError;
use crate::validate;

const BAD_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Register a new user with email and password.
pub async fn register<S: Storage>(store: &S, input: RegisterInput) -> Result<UserInfo, ApiError> {
    let email = normalize_email(&input.email);
    let name = input
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    validate::email(&email)?;
    validate::password(&input.password)?;
    if let Some(name) = &name {
        validate::display_name(name)?;
    }

    let password_hash = hash_password(&input.password)?;

    let mut tx = store.begin().await?;
    if tx.user_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict(
            "An account with this email already exists".into(),
        ));
    }
    let user = tx
        .insert_user(NewUser {
            email,
            name,
            password_hash,
        })
        .await
        .map_err(ApiError::conflict_on_unique(
            "An account with this email already exists",
        ))?;
    tx.commit().await?;

    tracing::info!(user_id = %user.id, "registered account");
    Ok(user.to_info())
}

/// Log in with email and password.
pub async fn login<S: Storage>(store: &S, input: LoginInput) -> Result<UserInfo, ApiError> {
    let email = normalize_email(&input.email);
    if input.password.is_empty() {
        return Err(ApiError::Validation("Password is required".into()));
    }

    let mut tx = store.begin().await?;
    let user = tx.user_by_email(&email).await?;
    drop(tx);

    let Some(user) = user else {
        return Err(ApiError::Unauthenticated(BAD_CREDENTIALS));
    };
    if !verify_password(&input.password, &user.password_hash)? {
        return Err(ApiError::Unauthenticated(BAD_CREDENTIALS));
    }
    Ok(user.to_info())
}

/// The signed-in user's profile, if the account still exists.
pub async fn current_user<S: Storage>(
    store: &S,
    who: &Identity,
) -> Result<Option<UserInfo>, ApiError> {
    let mut tx = store.begin().await?;
    Ok(tx.user_by_id(who.user_id).await?.map(|u| u.to_info()))
}
