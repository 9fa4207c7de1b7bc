//! # Identity guard — session credential to [`Identity`]
//!
//! The session cookie is the only credential. Its server-side record holds the
//! user id under [`SESSION_USER_ID_KEY`]; resolving a request means reading that
//! key and nothing else. Core operations never see the session: handlers extract
//! a [`CurrentUser`] at the boundary and pass the [`Identity`] inside it down
//! explicitly.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::ApiError;
use store::UserInfo;

/// Key for storing user ID in session.
pub const SESSION_USER_ID_KEY: &str = "user_id";

/// An authenticated caller. Every owner-scoped operation takes one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identity {
    pub user_id: Uuid,
}

impl Identity {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

/// Resolve the session to an identity, or `None` when nobody is signed in.
pub async fn resolve(session: &Session) -> Result<Option<Identity>, ApiError> {
    let user_id: Option<Uuid> = session.get(SESSION_USER_ID_KEY).await?;
    Ok(user_id.map(Identity::new))
}

/// Bind the session to a user, issuing a fresh session id.
pub async fn sign_in(session: &Session, user: &UserInfo) -> Result<(), ApiError> {
    session.cycle_id().await?;
    session.insert(SESSION_USER_ID_KEY, user.id).await?;
    Ok(())
}

/// Forget the session entirely.
pub async fn sign_out(session: &Session) -> Result<(), ApiError> {
    session.flush().await?;
    Ok(())
}

/// Extractor that rejects with 401 unless the session carries an identity.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Identity);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, reason)| ApiError::Internal(reason.to_string()))?;

        match resolve(&session).await? {
            Some(identity) => Ok(CurrentUser(identity)),
            None => Err(ApiError::Unauthenticated("Not authenticated")),
        }
    }
}
