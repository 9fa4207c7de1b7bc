//! # Domain rows and their client-safe projections
//!
//! Every type here is `Serialize + Deserialize` with camelCase field names so the
//! same structs travel over the JSON API and are decoded again by the `editor`
//! crate. With the `postgres` feature the row types also derive [`sqlx::FromRow`].
//!
//! | Struct | Represents |
//! |--------|-----------|
//! | [`User`] | A `users` row, including the Argon2 hash. Never serialised; project with [`User::to_info`]. |
//! | [`UserInfo`] | The public part of a user. |
//! | [`Document`] | The live state of a document, including its sharing flag and token. |
//! | [`DocumentSummary`] | A document without content, with its tags, for listings. |
//! | [`Version`] / [`VersionSummary`] | An immutable snapshot, with or without its content. |
//! | [`Tag`] / [`TagSummary`] | A per-owner label, optionally with its usage count. |
//! | [`SharedDocument`] | The read-only projection served to holders of a share token. |
//! | [`ShareLink`] | The token and URL handed back when sharing is enabled. |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Full user record from the database.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Convert to UserInfo for client consumption.
    pub fn to_info(&self) -> UserInfo {
        UserInfo {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
        }
    }
}

/// Fields required to create a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: Option<String>,
    pub password_hash: String,
}

/// User information safe to send to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserInfo {
    /// Get display name, falling back to email if name is not set.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

/// The live state of a document.
///
/// `share_token` is set the first time the document is shared and is kept
/// afterwards; `is_public` alone decides whether the token currently grants access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub content: String,
    pub is_public: bool,
    pub share_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A document as shown in the owner's document list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: Uuid,
    pub title: String,
    pub is_public: bool,
    pub share_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[cfg_attr(feature = "postgres", sqlx(skip))]
    pub tags: Vec<Tag>,
}

impl DocumentSummary {
    pub fn from_document(document: &Document, tags: Vec<Tag>) -> Self {
        Self {
            id: document.id,
            title: document.title.clone(),
            is_public: document.is_public,
            share_token: document.share_token.clone(),
            created_at: document.created_at,
            updated_at: document.updated_at,
            tags,
        }
    }
}

/// An immutable snapshot of a document's title and content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub id: Uuid,
    pub document_id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A history entry without its content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct VersionSummary {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Version> for VersionSummary {
    fn from(version: &Version) -> Self {
        Self {
            id: version.id,
            title: version.title.clone(),
            created_at: version.created_at,
        }
    }
}

/// A label owned by one user. Names are unique per owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

/// A tag together with the number of documents carrying it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct TagSummary {
    #[serde(flatten)]
    #[cfg_attr(feature = "postgres", sqlx(flatten))]
    pub tag: Tag,
    pub document_count: i64,
}

/// What an anonymous reader sees through a share link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct SharedDocument {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Owner's name, or their email when no name was given.
    pub author: String,
}

/// Returned when a document is published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareLink {
    pub share_token: String,
    pub share_url: String,
}
