//! # Share capability
//!
//! A document is readable without an identity when it is public *and* the reader
//! presents its share token. The token is minted the first time a document is
//! published and is never rotated afterwards:
//!
//! | State before [`issue_share`] | Effect |
//! |------------------------------|--------|
//! | public, token present | nothing; the existing token is returned |
//! | private, token present (revoked earlier) | republished with the same token |
//! | private, no token | a fresh token is generated and published |
//!
//! [`revoke_share`] only clears the public flag. A revoked link stops resolving
//! immediately, and publishing again brings the very same link back.

use store::{ShareLink, SharedDocument, Storage, Transaction};
use uuid::Uuid;

use crate::auth::Identity;
use crate::crypto::generate_share_token;
use crate::documents::DOCUMENT_NOT_FOUND;
use crate::error::ApiError;

const SHARED_NOT_FOUND: &str = "Document not found or not shared";

/// Public URL for a token under the configured base.
pub fn share_url(public_url: &str, token: &str) -> String {
    format!("{}/share/{}", public_url.trim_end_matches('/'), token)
}

/// Publish a document and return its link.
pub async fn issue_share<S: Storage>(
    store: &S,
    who: &Identity,
    document_id: Uuid,
    public_url: &str,
) -> Result<ShareLink, ApiError> {
    let mut tx = store.begin().await?;
    let document = tx
        .lock_document(document_id, who.user_id)
        .await?
        .ok_or(ApiError::NotFound(DOCUMENT_NOT_FOUND))?;

    let token = match (document.is_public, document.share_token) {
        (true, Some(token)) => token,
        (false, Some(token)) => {
            tx.set_sharing(document_id, who.user_id, true, None).await?;
            tx.commit().await?;
            tracing::info!(%document_id, "republished document");
            token
        }
        (_, None) => {
            let token = generate_share_token();
            tx.set_sharing(document_id, who.user_id, true, Some(&token))
                .await?;
            tx.commit().await?;
            tracing::info!(%document_id, "published document");
            token
        }
    };

    Ok(ShareLink {
        share_url: share_url(public_url, &token),
        share_token: token,
    })
}

/// Stop serving the document publicly. The token is kept for later republishing.
pub async fn revoke_share<S: Storage>(
    store: &S,
    who: &Identity,
    document_id: Uuid,
) -> Result<(), ApiError> {
    let mut tx = store.begin().await?;
    tx.set_sharing(document_id, who.user_id, false, None)
        .await?
        .ok_or(ApiError::NotFound(DOCUMENT_NOT_FOUND))?;
    tx.commit().await?;

    tracing::info!(%document_id, "revoked share link");
    Ok(())
}

/// Read a public document by token. No identity is involved.
pub async fn resolve_share<S: Storage>(store: &S, token: &str) -> Result<SharedDocument, ApiError> {
    let mut tx = store.begin().await?;
    tx.shared_document(token)
        .await?
        .ok_or(ApiError::NotFound(SHARED_NOT_FOUND))
}
