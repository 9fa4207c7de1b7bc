//! # Document store
//!
//! Owner-scoped CRUD over the live state of documents. Every lookup is keyed by
//! `(document id, caller)`, so another user's document is reported exactly like a
//! missing one.
//!
//! [`update_document`] is a plain overwrite with no version check. The autosave
//! timer and explicit saves both land here, and whichever transaction commits
//! last is what readers see.

use serde::Deserialize;
use store::{Document, DocumentSummary, Storage, Transaction};
use uuid::Uuid;

use crate::auth::Identity;
use crate::error::ApiError;
use crate::validate;

pub(crate) const DOCUMENT_NOT_FOUND: &str = "Document not found";

/// Body of create and update requests. Absent fields keep their stored value on update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl DocumentInput {
    fn validate(&self) -> Result<(), ApiError> {
        if let Some(title) = &self.title {
            validate::title(title)?;
        }
        Ok(())
    }
}

/// All of the caller's documents, most recently edited first.
pub async fn list_documents<S: Storage>(
    store: &S,
    who: &Identity,
) -> Result<Vec<DocumentSummary>, ApiError> {
    let mut tx = store.begin().await?;
    Ok(tx.document_summaries(who.user_id).await?)
}

/// Create a document. An empty or missing title becomes `default_title`.
pub async fn create_document<S: Storage>(
    store: &S,
    who: &Identity,
    input: DocumentInput,
    default_title: &str,
) -> Result<Document, ApiError> {
    input.validate()?;
    let title = input
        .title
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| default_title.to_string());
    let content = input.content.unwrap_or_default();

    let mut tx = store.begin().await?;
    let document = tx.insert_document(who.user_id, &title, &content).await?;
    tx.commit().await?;

    tracing::debug!(document_id = %document.id, "created document");
    Ok(document)
}

pub async fn get_document<S: Storage>(
    store: &S,
    who: &Identity,
    document_id: Uuid,
) -> Result<Document, ApiError> {
    let mut tx = store.begin().await?;
    tx.document(document_id, who.user_id)
        .await?
        .ok_or(ApiError::NotFound(DOCUMENT_NOT_FOUND))
}

/// Overwrite title and/or content. Creates no version.
pub async fn update_document<S: Storage>(
    store: &S,
    who: &Identity,
    document_id: Uuid,
    input: DocumentInput,
) -> Result<Document, ApiError> {
    input.validate()?;

    let mut tx = store.begin().await?;
    let document = tx
        .update_document(
            document_id,
            who.user_id,
            input.title.as_deref(),
            input.content.as_deref(),
        )
        .await?
        .ok_or(ApiError::NotFound(DOCUMENT_NOT_FOUND))?;
    tx.commit().await?;
    Ok(document)
}

/// Delete a document with its history and tag associations.
pub async fn delete_document<S: Storage>(
    store: &S,
    who: &Identity,
    document_id: Uuid,
) -> Result<(), ApiError> {
    let mut tx = store.begin().await?;
    if !tx.delete_document(document_id, who.user_id).await? {
        return Err(ApiError::NotFound(DOCUMENT_NOT_FOUND));
    }
    tx.commit().await?;

    tracing::info!(%document_id, "deleted document");
    Ok(())
}
