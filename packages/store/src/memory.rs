use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    Document, DocumentSummary, NewUser, SharedDocument, Tag, TagSummary, User, Version,
    VersionSummary,
};
use crate::repo::{Storage, Transaction};

/// In-memory Storage for tests and single-process deployments.
///
/// Transactions are serialised: [`begin`](Storage::begin) takes the table lock.
/// Reads go straight to the locked tables. The first write stages a copy, which
/// replaces the tables on commit and is discarded on drop.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Clone, Debug, Default)]
struct Tables {
    users: Vec<User>,
    documents: Vec<Document>,
    versions: Vec<Version>,
    tags: Vec<Tag>,
    document_tags: Vec<(Uuid, Uuid)>,
}

impl Tables {
    fn document(&self, id: Uuid, owner_id: Uuid) -> Option<&Document> {
        self.documents
            .iter()
            .find(|d| d.id == id && d.owner_id == owner_id)
    }

    fn tag(&self, id: Uuid, owner_id: Uuid) -> Option<&Tag> {
        self.tags.iter().find(|t| t.id == id && t.owner_id == owner_id)
    }

    fn document_mut(&mut self, id: Uuid, owner_id: Uuid) -> Option<&mut Document> {
        self.documents
            .iter_mut()
            .find(|d| d.id == id && d.owner_id == owner_id)
    }

    fn tags_of(&self, document_id: Uuid) -> Vec<Tag> {
        let mut tags: Vec<Tag> = self
            .document_tags
            .iter()
            .filter(|(doc, _)| *doc == document_id)
            .filter_map(|(_, tag_id)| self.tags.iter().find(|t| t.id == *tag_id).cloned())
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        tags
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    /// Copy made by the first write. A transaction that only reads never has one.
    staged: Option<Tables>,
}

impl MemoryTx {
    fn tables(&self) -> &Tables {
        self.staged.as_ref().unwrap_or(&*self.guard)
    }

    fn tables_mut(&mut self) -> &mut Tables {
        let guard = &self.guard;
        self.staged.get_or_insert_with(|| (**guard).clone())
    }
}

impl Storage for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, StoreError> {
        let guard = self.tables.clone().lock_owned().await;
        Ok(MemoryTx {
            guard,
            staged: None,
        })
    }
}

impl Transaction for MemoryTx {
    async fn commit(self) -> Result<(), StoreError> {
        let MemoryTx { mut guard, staged } = self;
        if let Some(staged) = staged {
            *guard = staged;
        }
        Ok(())
    }

    async fn insert_user(&mut self, user: NewUser) -> Result<User, StoreError> {
        if self.tables().users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation("users_email_key".into()));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: user.email,
            name: user.name,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        self.tables_mut().users.push(user.clone());
        Ok(user)
    }

    async fn user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.tables().users.iter().find(|u| u.email == email).cloned())
    }

    async fn user_by_id(&mut self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.tables().users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert_document(
        &mut self,
        owner_id: Uuid,
        title: &str,
        content: &str,
    ) -> Result<Document, StoreError> {
        let now = Utc::now();
        let document = Document {
            id: Uuid::new_v4(),
            owner_id,
            title: title.to_string(),
            content: content.to_string(),
            is_public: false,
            share_token: None,
            created_at: now,
            updated_at: now,
        };
        self.tables_mut().documents.push(document.clone());
        Ok(document)
    }

    async fn document(&mut self, id: Uuid, owner_id: Uuid) -> Result<Option<Document>, StoreError> {
        Ok(self.tables().document(id, owner_id).cloned())
    }

    async fn lock_document(
        &mut self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Document>, StoreError> {
        // The whole store is already locked for the lifetime of the transaction.
        self.document(id, owner_id).await
    }

    async fn document_summaries(
        &mut self,
        owner_id: Uuid,
    ) -> Result<Vec<DocumentSummary>, StoreError> {
        let tables = self.tables();
        let mut documents: Vec<&Document> = tables
            .documents
            .iter()
            .filter(|d| d.owner_id == owner_id)
            .collect();
        documents.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(documents
            .into_iter()
            .map(|d| DocumentSummary::from_document(d, tables.tags_of(d.id)))
            .collect())
    }

    async fn update_document(
        &mut self,
        id: Uuid,
        owner_id: Uuid,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<Option<Document>, StoreError> {
        if self.tables().document(id, owner_id).is_none() {
            return Ok(None);
        }
        let Some(document) = self.tables_mut().document_mut(id, owner_id) else {
            return Ok(None);
        };
        if let Some(title) = title {
            document.title = title.to_string();
        }
        if let Some(content) = content {
            document.content = content.to_string();
        }
        document.updated_at = Utc::now();
        Ok(Some(document.clone()))
    }

    async fn delete_document(&mut self, id: Uuid, owner_id: Uuid) -> Result<bool, StoreError> {
        if self.tables().document(id, owner_id).is_none() {
            return Ok(false);
        }
        let tables = self.tables_mut();
        tables
            .documents
            .retain(|d| !(d.id == id && d.owner_id == owner_id));
        tables.versions.retain(|v| v.document_id != id);
        tables.document_tags.retain(|(doc, _)| *doc != id);
        Ok(true)
    }

    async fn set_sharing(
        &mut self,
        id: Uuid,
        owner_id: Uuid,
        is_public: bool,
        share_token: Option<&str>,
    ) -> Result<Option<Document>, StoreError> {
        if let Some(token) = share_token {
            let taken = self
                .tables()
                .documents
                .iter()
                .any(|d| d.id != id && d.share_token.as_deref() == Some(token));
            if taken {
                return Err(StoreError::UniqueViolation("documents_share_token_key".into()));
            }
        }
        if self.tables().document(id, owner_id).is_none() {
            return Ok(None);
        }
        let Some(document) = self.tables_mut().document_mut(id, owner_id) else {
            return Ok(None);
        };
        document.is_public = is_public;
        if let Some(token) = share_token {
            document.share_token = Some(token.to_string());
        }
        document.updated_at = Utc::now();
        Ok(Some(document.clone()))
    }

    async fn shared_document(
        &mut self,
        share_token: &str,
    ) -> Result<Option<SharedDocument>, StoreError> {
        let tables = self.tables();
        let Some(document) = tables
            .documents
            .iter()
            .find(|d| d.is_public && d.share_token.as_deref() == Some(share_token))
        else {
            return Ok(None);
        };
        let Some(owner) = tables.users.iter().find(|u| u.id == document.owner_id) else {
            return Ok(None);
        };
        Ok(Some(SharedDocument {
            id: document.id,
            title: document.title.clone(),
            content: document.content.clone(),
            created_at: document.created_at,
            updated_at: document.updated_at,
            author: owner.to_info().display_name().to_string(),
        }))
    }

    async fn insert_version(
        &mut self,
        document_id: Uuid,
        title: &str,
        content: &str,
    ) -> Result<Version, StoreError> {
        let version = Version {
            id: Uuid::new_v4(),
            document_id,
            title: title.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        };
        self.tables_mut().versions.push(version.clone());
        Ok(version)
    }

    async fn versions(&mut self, document_id: Uuid) -> Result<Vec<VersionSummary>, StoreError> {
        // Walk newest insert first; the stable sort keeps that order for equal timestamps.
        let mut versions: Vec<VersionSummary> = self
            .tables()
            .versions
            .iter()
            .rev()
            .filter(|v| v.document_id == document_id)
            .map(VersionSummary::from)
            .collect();
        versions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(versions)
    }

    async fn version(
        &mut self,
        document_id: Uuid,
        version_id: Uuid,
    ) -> Result<Option<Version>, StoreError> {
        Ok(self
            .tables()
            .versions
            .iter()
            .find(|v| v.id == version_id && v.document_id == document_id)
            .cloned())
    }

    async fn insert_tag(&mut self, owner_id: Uuid, name: &str, color: &str) -> Result<Tag, StoreError> {
        if self
            .tables()
            .tags
            .iter()
            .any(|t| t.owner_id == owner_id && t.name == name)
        {
            return Err(StoreError::UniqueViolation("tags_owner_id_name_key".into()));
        }
        let tag = Tag {
            id: Uuid::new_v4(),
            owner_id,
            name: name.to_string(),
            color: color.to_string(),
            created_at: Utc::now(),
        };
        self.tables_mut().tags.push(tag.clone());
        Ok(tag)
    }

    async fn tags(&mut self, owner_id: Uuid) -> Result<Vec<TagSummary>, StoreError> {
        let tables = self.tables();
        let mut tags: Vec<TagSummary> = tables
            .tags
            .iter()
            .rev()
            .filter(|t| t.owner_id == owner_id)
            .map(|t| TagSummary {
                tag: t.clone(),
                document_count: tables
                    .document_tags
                    .iter()
                    .filter(|(_, tag_id)| *tag_id == t.id)
                    .count() as i64,
            })
            .collect();
        tags.sort_by(|a, b| b.tag.created_at.cmp(&a.tag.created_at));
        Ok(tags)
    }

    async fn tag(&mut self, id: Uuid, owner_id: Uuid) -> Result<Option<Tag>, StoreError> {
        Ok(self.tables().tag(id, owner_id).cloned())
    }

    async fn update_tag(
        &mut self,
        id: Uuid,
        owner_id: Uuid,
        name: &str,
        color: Option<&str>,
    ) -> Result<Option<Tag>, StoreError> {
        let tables = self.tables();
        if tables
            .tags
            .iter()
            .any(|t| t.owner_id == owner_id && t.name == name && t.id != id)
        {
            return Err(StoreError::UniqueViolation("tags_owner_id_name_key".into()));
        }
        if tables.tag(id, owner_id).is_none() {
            return Ok(None);
        }
        let Some(tag) = self
            .tables_mut()
            .tags
            .iter_mut()
            .find(|t| t.id == id && t.owner_id == owner_id)
        else {
            return Ok(None);
        };
        tag.name = name.to_string();
        if let Some(color) = color {
            tag.color = color.to_string();
        }
        Ok(Some(tag.clone()))
    }

    async fn delete_tag(&mut self, id: Uuid, owner_id: Uuid) -> Result<bool, StoreError> {
        if self.tables().tag(id, owner_id).is_none() {
            return Ok(false);
        }
        let tables = self.tables_mut();
        tables
            .tags
            .retain(|t| !(t.id == id && t.owner_id == owner_id));
        tables.document_tags.retain(|(_, tag_id)| *tag_id != id);
        Ok(true)
    }

    async fn document_tags(&mut self, document_id: Uuid) -> Result<Vec<Tag>, StoreError> {
        Ok(self.tables().tags_of(document_id))
    }

    async fn insert_document_tag(&mut self, document_id: Uuid, tag_id: Uuid) -> Result<(), StoreError> {
        if self.tables().document_tags.contains(&(document_id, tag_id)) {
            return Err(StoreError::UniqueViolation("document_tags_pkey".into()));
        }
        self.tables_mut().document_tags.push((document_id, tag_id));
        Ok(())
    }

    async fn delete_document_tag(
        &mut self,
        document_id: Uuid,
        tag_id: Uuid,
    ) -> Result<bool, StoreError> {
        if !self.tables().document_tags.contains(&(document_id, tag_id)) {
            return Ok(false);
        }
        self.tables_mut()
            .document_tags
            .retain(|pair| *pair != (document_id, tag_id));
        Ok(true)
    }
}
