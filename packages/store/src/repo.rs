//! # Storage traits — the transactional seam between the core and a database
//!
//! The core in the `api` crate never talks to a database directly. It opens a
//! [`Transaction`] through a [`Storage`] handle, issues scoped row operations, and
//! commits. Dropping a transaction without committing discards every write made
//! through it, so a multi-step operation (a restore writes a checkpoint and then
//! overwrites the document) is all-or-nothing.
//!
//! Implementations live in sibling modules: [`crate::memory`] for tests and
//! single-process deployments, and `crate::postgres` behind the `postgres`
//! feature.
//!
//! ## Scoping
//!
//! Every document and tag lookup takes the owner id alongside the row id and
//! returns `None` when the row belongs to somebody else. Version and association
//! methods take a document id that the caller has already resolved through a
//! scoped document lookup in the same transaction.
//!
//! ## Optional fields
//!
//! Methods taking `Option<&str>` for a column keep the stored value when given
//! `None`.

use std::future::Future;

use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    Document, DocumentSummary, NewUser, SharedDocument, Tag, TagSummary, User, Version,
    VersionSummary,
};

/// A handle that can open transactions.
pub trait Storage: Clone + Send + Sync + 'static {
    type Tx: Transaction;

    fn begin(&self) -> impl Future<Output = Result<Self::Tx, StoreError>> + Send;
}

/// A unit of work. Writes become visible to other transactions on [`commit`](Transaction::commit).
pub trait Transaction: Send {
    fn commit(self) -> impl Future<Output = Result<(), StoreError>> + Send;

    // users

    /// Fails with [`StoreError::UniqueViolation`] if the email is taken.
    fn insert_user(
        &mut self,
        user: NewUser,
    ) -> impl Future<Output = Result<User, StoreError>> + Send;
    fn user_by_email(
        &mut self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, StoreError>> + Send;
    fn user_by_id(
        &mut self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<User>, StoreError>> + Send;

    // documents

    fn insert_document(
        &mut self,
        owner_id: Uuid,
        title: &str,
        content: &str,
    ) -> impl Future<Output = Result<Document, StoreError>> + Send;
    fn document(
        &mut self,
        id: Uuid,
        owner_id: Uuid,
    ) -> impl Future<Output = Result<Option<Document>, StoreError>> + Send;
    /// Like [`document`](Transaction::document), but also blocks concurrent writers
    /// of the row until this transaction ends.
    fn lock_document(
        &mut self,
        id: Uuid,
        owner_id: Uuid,
    ) -> impl Future<Output = Result<Option<Document>, StoreError>> + Send;
    /// Newest `updated_at` first.
    fn document_summaries(
        &mut self,
        owner_id: Uuid,
    ) -> impl Future<Output = Result<Vec<DocumentSummary>, StoreError>> + Send;
    /// Overwrites the given fields and advances `updated_at`.
    fn update_document(
        &mut self,
        id: Uuid,
        owner_id: Uuid,
        title: Option<&str>,
        content: Option<&str>,
    ) -> impl Future<Output = Result<Option<Document>, StoreError>> + Send;
    /// Removes the document with its versions and tag associations.
    fn delete_document(
        &mut self,
        id: Uuid,
        owner_id: Uuid,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;
    fn set_sharing(
        &mut self,
        id: Uuid,
        owner_id: Uuid,
        is_public: bool,
        share_token: Option<&str>,
    ) -> impl Future<Output = Result<Option<Document>, StoreError>> + Send;
    /// Only matches documents that are currently public.
    fn shared_document(
        &mut self,
        share_token: &str,
    ) -> impl Future<Output = Result<Option<SharedDocument>, StoreError>> + Send;

    // versions

    fn insert_version(
        &mut self,
        document_id: Uuid,
        title: &str,
        content: &str,
    ) -> impl Future<Output = Result<Version, StoreError>> + Send;
    /// Newest first; snapshots taken within the same instant keep insertion order reversed.
    fn versions(
        &mut self,
        document_id: Uuid,
    ) -> impl Future<Output = Result<Vec<VersionSummary>, StoreError>> + Send;
    fn version(
        &mut self,
        document_id: Uuid,
        version_id: Uuid,
    ) -> impl Future<Output = Result<Option<Version>, StoreError>> + Send;

    // tags

    /// Fails with [`StoreError::UniqueViolation`] if the owner already has a tag with this name.
    fn insert_tag(
        &mut self,
        owner_id: Uuid,
        name: &str,
        color: &str,
    ) -> impl Future<Output = Result<Tag, StoreError>> + Send;
    /// Newest first.
    fn tags(
        &mut self,
        owner_id: Uuid,
    ) -> impl Future<Output = Result<Vec<TagSummary>, StoreError>> + Send;
    fn tag(
        &mut self,
        id: Uuid,
        owner_id: Uuid,
    ) -> impl Future<Output = Result<Option<Tag>, StoreError>> + Send;
    fn update_tag(
        &mut self,
        id: Uuid,
        owner_id: Uuid,
        name: &str,
        color: Option<&str>,
    ) -> impl Future<Output = Result<Option<Tag>, StoreError>> + Send;
    fn delete_tag(
        &mut self,
        id: Uuid,
        owner_id: Uuid,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    // document <-> tag associations

    /// Ordered by tag name.
    fn document_tags(
        &mut self,
        document_id: Uuid,
    ) -> impl Future<Output = Result<Vec<Tag>, StoreError>> + Send;
    /// Fails with [`StoreError::UniqueViolation`] if the pair already exists.
    fn insert_document_tag(
        &mut self,
        document_id: Uuid,
        tag_id: Uuid,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
    fn delete_document_tag(
        &mut self,
        document_id: Uuid,
        tag_id: Uuid,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;
}
