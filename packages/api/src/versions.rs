//! # Version log and restore
//!
//! Versions are append-only snapshots of a document's title and content. They are
//! created in exactly two places: an explicit [`save_version`] and the checkpoint
//! written by [`restore_version`]. Autosave never creates one.
//!
//! ## Restore
//!
//! Restoring runs in a single transaction:
//!
//! 1. lock the caller's document (no concurrent update can commit until we finish),
//! 2. load the target version, which must belong to that document,
//! 3. append the document's current title/content as a checkpoint,
//! 4. overwrite the document with the target's fields.
//!
//! A missing document or version returns before anything is written, and a
//! failure after step 3 drops the transaction, so the checkpoint never exists
//! without the overwrite.

use store::{Document, Storage, Transaction, Version, VersionSummary};
use uuid::Uuid;

use crate::auth::Identity;
use crate::documents::DOCUMENT_NOT_FOUND;
use crate::error::ApiError;

const VERSION_NOT_FOUND: &str = "Version not found";

/// History of one of the caller's documents, newest first, without content.
pub async fn list_versions<S: Storage>(
    store: &S,
    who: &Identity,
    document_id: Uuid,
) -> Result<Vec<VersionSummary>, ApiError> {
    let mut tx = store.begin().await?;
    tx.document(document_id, who.user_id)
        .await?
        .ok_or(ApiError::NotFound(DOCUMENT_NOT_FOUND))?;
    Ok(tx.versions(document_id).await?)
}

/// Snapshot the document as currently stored.
pub async fn save_version<S: Storage>(
    store: &S,
    who: &Identity,
    document_id: Uuid,
) -> Result<Version, ApiError> {
    let mut tx = store.begin().await?;
    let document = tx
        .document(document_id, who.user_id)
        .await?
        .ok_or(ApiError::NotFound(DOCUMENT_NOT_FOUND))?;
    let version = tx
        .insert_version(document.id, &document.title, &document.content)
        .await?;
    tx.commit().await?;

    tracing::debug!(%document_id, version_id = %version.id, "saved version");
    Ok(version)
}

/// One snapshot with its full content.
pub async fn get_version<S: Storage>(
    store: &S,
    who: &Identity,
    document_id: Uuid,
    version_id: Uuid,
) -> Result<Version, ApiError> {
    let mut tx = store.begin().await?;
    tx.document(document_id, who.user_id)
        .await?
        .ok_or(ApiError::NotFound(DOCUMENT_NOT_FOUND))?;
    tx.version(document_id, version_id)
        .await?
        .ok_or(ApiError::NotFound(VERSION_NOT_FOUND))
}

/// Move a snapshot back into the live document, checkpointing what it replaces.
pub async fn restore_version<S: Storage>(
    store: &S,
    who: &Identity,
    document_id: Uuid,
    version_id: Uuid,
) -> Result<Document, ApiError> {
    let mut tx = store.begin().await?;

    let current = tx
        .lock_document(document_id, who.user_id)
        .await?
        .ok_or(ApiError::NotFound(DOCUMENT_NOT_FOUND))?;
    let target = tx
        .version(document_id, version_id)
        .await?
        .ok_or(ApiError::NotFound(VERSION_NOT_FOUND))?;

    let checkpoint = tx
        .insert_version(current.id, &current.title, &current.content)
        .await?;
    let restored = tx
        .update_document(
            document_id,
            who.user_id,
            Some(&target.title),
            Some(&target.content),
        )
        .await?
        .ok_or_else(|| ApiError::Internal("locked document vanished during restore".into()))?;

    tx.commit().await?;

    tracing::info!(
        %document_id,
        %version_id,
        checkpoint_id = %checkpoint.id,
        "restored version"
    );
    Ok(restored)
}
