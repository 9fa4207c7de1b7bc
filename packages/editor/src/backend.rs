//! The editor's view of the server.

use std::future::Future;

use serde::Serialize;
use store::{Document, ShareLink, Version};
use thiserror::Error;
use uuid::Uuid;

/// The in-memory text being edited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Draft {
    pub title: String,
    pub content: String,
}

impl Draft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

impl From<&Document> for Draft {
    fn from(document: &Document) -> Self {
        Self::new(document.title.clone(), document.content.clone())
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error body.
    #[error("server returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("no document is open")]
    NoDocument,
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(err) => err.status().map(|s| s.as_u16()),
            ClientError::NoDocument => None,
        }
    }
}

/// Document operations the editor needs. Implemented over HTTP by
/// [`crate::HttpBackend`].
pub trait Backend: Send + Sync + 'static {
    fn get_document(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Document, ClientError>> + Send;

    /// Overwrite the stored title and content with the draft.
    fn update_document(
        &self,
        id: Uuid,
        draft: &Draft,
    ) -> impl Future<Output = Result<Document, ClientError>> + Send;

    fn save_version(&self, id: Uuid)
        -> impl Future<Output = Result<Version, ClientError>> + Send;

    fn restore_version(
        &self,
        id: Uuid,
        version_id: Uuid,
    ) -> impl Future<Output = Result<Document, ClientError>> + Send;

    fn share(&self, id: Uuid) -> impl Future<Output = Result<ShareLink, ClientError>> + Send;

    fn unshare(&self, id: Uuid) -> impl Future<Output = Result<(), ClientError>> + Send;
}
