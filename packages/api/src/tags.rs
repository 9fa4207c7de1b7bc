//! Per-owner tags and their attachment to documents.

use serde::Deserialize;
use store::{Storage, Tag, TagSummary, Transaction};
use uuid::Uuid;

use crate::auth::Identity;
use crate::documents::DOCUMENT_NOT_FOUND;
use crate::error::ApiError;
use crate::validate;

pub const DEFAULT_TAG_COLOR: &str = "#3b82f6";

pub const TAG_NOT_FOUND: &str = "Tag not found";

#[derive(Debug, Clone, Deserialize)]
pub struct TagInput {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

pub async fn list_tags<S: Storage>(store: &S, who: &Identity) -> Result<Vec<TagSummary>, ApiError> {
    let mut tx = store.begin().await?;
    Ok(tx.tags(who.user_id).await?)
}

pub async fn create_tag<S: Storage>(
    store: &S,
    who: &Identity,
    input: TagInput,
) -> Result<Tag, ApiError> {
    validate::tag_name(&input.name)?;
    let color = input.color.as_deref().unwrap_or(DEFAULT_TAG_COLOR);

    let mut tx = store.begin().await?;
    let tag = tx
        .insert_tag(who.user_id, &input.name, color)
        .await
        .map_err(ApiError::conflict_on_unique("Tag name already exists"))?;
    tx.commit().await?;
    Ok(tag)
}

/// Rename and optionally recolour. A missing colour keeps the stored one.
pub async fn update_tag<S: Storage>(
    store: &S,
    who: &Identity,
    tag_id: Uuid,
    input: TagInput,
) -> Result<Tag, ApiError> {
    validate::tag_name(&input.name)?;

    let mut tx = store.begin().await?;
    let tag = tx
        .update_tag(tag_id, who.user_id, &input.name, input.color.as_deref())
        .await
        .map_err(ApiError::conflict_on_unique("Tag name already exists"))?
        .ok_or(ApiError::NotFound(TAG_NOT_FOUND))?;
    tx.commit().await?;
    Ok(tag)
}

/// Delete a tag. Documents carrying it simply lose the association.
pub async fn delete_tag<S: Storage>(store: &S, who: &Identity, tag_id: Uuid) -> Result<(), ApiError> {
    let mut tx = store.begin().await?;
    if !tx.delete_tag(tag_id, who.user_id).await? {
        return Err(ApiError::NotFound(TAG_NOT_FOUND));
    }
    tx.commit().await?;
    Ok(())
}

pub async fn document_tags<S: Storage>(
    store: &S,
    who: &Identity,
    document_id: Uuid,
) -> Result<Vec<Tag>, ApiError> {
    let mut tx = store.begin().await?;
    tx.document(document_id, who.user_id)
        .await?
        .ok_or(ApiError::NotFound(DOCUMENT_NOT_FOUND))?;
    Ok(tx.document_tags(document_id).await?)
}

/// Attach one of the caller's tags to one of the caller's documents.
pub async fn add_document_tag<S: Storage>(
    store: &S,
    who: &Identity,
    document_id: Uuid,
    tag_id: Uuid,
) -> Result<(), ApiError> {
    let mut tx = store.begin().await?;
    tx.document(document_id, who.user_id)
        .await?
        .ok_or(ApiError::NotFound(DOCUMENT_NOT_FOUND))?;
    tx.tag(tag_id, who.user_id)
        .await?
        .ok_or(ApiError::NotFound(TAG_NOT_FOUND))?;
    tx.insert_document_tag(document_id, tag_id)
        .await
        .map_err(ApiError::conflict_on_unique("Tag already added"))?;
    tx.commit().await?;
    Ok(())
}

/// Detach a tag. Removing a tag that was never attached is not an error.
pub async fn remove_document_tag<S: Storage>(
    store: &S,
    who: &Identity,
    document_id: Uuid,
    tag_id: Uuid,
) -> Result<(), ApiError> {
    let mut tx = store.begin().await?;
    tx.document(document_id, who.user_id)
        .await?
        .ok_or(ApiError::NotFound(DOCUMENT_NOT_FOUND))?;
    tx.delete_document_tag(document_id, tag_id).await?;
    tx.commit().await?;
    Ok(())
}
