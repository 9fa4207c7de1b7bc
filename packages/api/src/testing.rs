//! Fixtures shared by the unit tests in this crate.

use store::{
    Document, DocumentSummary, MemoryStore, MemoryTx, NewUser, SharedDocument, Storage,
    StoreError, Tag, TagSummary, Transaction, User, Version, VersionSummary,
};
use uuid::Uuid;

use crate::auth::Identity;

/// Insert a user directly, skipping password hashing.
pub async fn user(store: &MemoryStore, email: &str) -> Identity {
    let mut tx = store.begin().await.unwrap();
    let user = tx
        .insert_user(NewUser {
            email: email.to_string(),
            name: None,
            password_hash: String::new(),
        })
        .await
        .unwrap();
    tx.commit().await.unwrap();
    Identity::new(user.id)
}

/// A [`MemoryStore`] whose transactions fail every document update. Seed and
/// inspect it through `inner`.
#[derive(Clone, Default)]
pub struct RefusingUpdates {
    pub inner: MemoryStore,
}

pub struct RefusingUpdatesTx(MemoryTx);

impl Storage for RefusingUpdates {
    type Tx = RefusingUpdatesTx;

    async fn begin(&self) -> Result<RefusingUpdatesTx, StoreError> {
        Ok(RefusingUpdatesTx(self.inner.begin().await?))
    }
}

impl Transaction for RefusingUpdatesTx {
    async fn commit(self) -> Result<(), StoreError> {
        self.0.commit().await
    }

    async fn insert_user(&mut self, user: NewUser) -> Result<User, StoreError> {
        self.0.insert_user(user).await
    }

    async fn user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        self.0.user_by_email(email).await
    }

    async fn user_by_id(&mut self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.0.user_by_id(id).await
    }

    async fn insert_document(
        &mut self,
        owner_id: Uuid,
        title: &str,
        content: &str,
    ) -> Result<Document, StoreError> {
        self.0.insert_document(owner_id, title, content).await
    }

    async fn document(&mut self, id: Uuid, owner_id: Uuid) -> Result<Option<Document>, StoreError> {
        self.0.document(id, owner_id).await
    }

    async fn lock_document(
        &mut self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Document>, StoreError> {
        self.0.lock_document(id, owner_id).await
    }

    async fn document_summaries(
        &mut self,
        owner_id: Uuid,
    ) -> Result<Vec<DocumentSummary>, StoreError> {
        self.0.document_summaries(owner_id).await
    }

    async fn update_document(
        &mut self,
        _id: Uuid,
        _owner_id: Uuid,
        _title: Option<&str>,
        _content: Option<&str>,
    ) -> Result<Option<Document>, StoreError> {
        Err(StoreError::UniqueViolation("update refused".into()))
    }

    async fn delete_document(&mut self, id: Uuid, owner_id: Uuid) -> Result<bool, StoreError> {
        self.0.delete_document(id, owner_id).await
    }

    async fn set_sharing(
        &mut self,
        id: Uuid,
        owner_id: Uuid,
        is_public: bool,
        share_token: Option<&str>,
    ) -> Result<Option<Document>, StoreError> {
        self.0.set_sharing(id, owner_id, is_public, share_token).await
    }

    async fn shared_document(
        &mut self,
        share_token: &str,
    ) -> Result<Option<SharedDocument>, StoreError> {
        self.0.shared_document(share_token).await
    }

    async fn insert_version(
        &mut self,
        document_id: Uuid,
        title: &str,
        content: &str,
    ) -> Result<Version, StoreError> {
        self.0.insert_version(document_id, title, content).await
    }

    async fn versions(&mut self, document_id: Uuid) -> Result<Vec<VersionSummary>, StoreError> {
        self.0.versions(document_id).await
    }

    async fn version(
        &mut self,
        document_id: Uuid,
        version_id: Uuid,
    ) -> Result<Option<Version>, StoreError> {
        self.0.version(document_id, version_id).await
    }

    async fn insert_tag(&mut self, owner_id: Uuid, name: &str, color: &str) -> Result<Tag, StoreError> {
        self.0.insert_tag(owner_id, name, color).await
    }

    async fn tags(&mut self, owner_id: Uuid) -> Result<Vec<TagSummary>, StoreError> {
        self.0.tags(owner_id).await
    }

    async fn tag(&mut self, id: Uuid, owner_id: Uuid) -> Result<Option<Tag>, StoreError> {
        self.0.tag(id, owner_id).await
    }

    async fn update_tag(
        &mut self,
        id: Uuid,
        owner_id: Uuid,
        name: &str,
        color: Option<&str>,
    ) -> Result<Option<Tag>, StoreError> {
        self.0.update_tag(id, owner_id, name, color).await
    }

    async fn delete_tag(&mut self, id: Uuid, owner_id: Uuid) -> Result<bool, StoreError> {
        self.0.delete_tag(id, owner_id).await
    }

    async fn document_tags(&mut self, document_id: Uuid) -> Result<Vec<Tag>, StoreError> {
        self.0.document_tags(document_id).await
    }

    async fn insert_document_tag(&mut self, document_id: Uuid, tag_id: Uuid) -> Result<(), StoreError> {
        self.0.insert_document_tag(document_id, tag_id).await
    }

    async fn delete_document_tag(
        &mut self,
        document_id: Uuid,
        tag_id: Uuid,
    ) -> Result<bool, StoreError> {
        self.0.delete_document_tag(document_id, tag_id).await
    }
}
