//! An in-process [`Backend`] that records what the editor sent.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use store::{Document, ShareLink, Version};
use uuid::Uuid;

use crate::backend::{Backend, ClientError, Draft};

#[derive(Default)]
struct State {
    documents: HashMap<Uuid, Document>,
    versions: Vec<Version>,
    writes: Vec<(Uuid, Draft)>,
    events: Vec<&'static str>,
    failing_updates: usize,
}

#[derive(Default)]
pub struct FakeBackend {
    latency: Duration,
    state: Mutex<State>,
}

fn not_found() -> ClientError {
    ClientError::Api {
        status: 404,
        message: "Document not found".into(),
    }
}

impl FakeBackend {
    /// Every update takes `latency` to complete.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    /// The next `count` updates answer 500 and change nothing.
    pub fn fail_updates(&self, count: usize) {
        self.state.lock().unwrap().failing_updates = count;
    }

    pub fn insert(&self, title: &str, content: &str) -> Uuid {
        let now = Utc::now();
        let document = Document {
            id: Uuid::new_v4(),
            owner_id: Uuid::nil(),
            title: title.into(),
            content: content.into(),
            is_public: false,
            share_token: None,
            created_at: now,
            updated_at: now,
        };
        let id = document.id;
        self.state.lock().unwrap().documents.insert(id, document);
        id
    }

    pub fn document(&self, id: Uuid) -> Document {
        self.state.lock().unwrap().documents[&id].clone()
    }

    /// Updates in the order they completed.
    pub fn writes(&self) -> Vec<(Uuid, Draft)> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn events(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().events.clone()
    }

    /// Oldest first.
    pub fn versions_of(&self, id: Uuid) -> Vec<Version> {
        self.state
            .lock()
            .unwrap()
            .versions
            .iter()
            .filter(|v| v.document_id == id)
            .cloned()
            .collect()
    }
}

fn snapshot(document: &Document) -> Version {
    Version {
        id: Uuid::new_v4(),
        document_id: document.id,
        title: document.title.clone(),
        content: document.content.clone(),
        created_at: Utc::now(),
    }
}

impl Backend for FakeBackend {
    async fn get_document(&self, id: Uuid) -> Result<Document, ClientError> {
        let state = self.state.lock().unwrap();
        state.documents.get(&id).cloned().ok_or_else(not_found)
    }

    async fn update_document(&self, id: Uuid, draft: &Draft) -> Result<Document, ClientError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let mut state = self.state.lock().unwrap();
        if state.failing_updates > 0 {
            state.failing_updates -= 1;
            return Err(ClientError::Api {
                status: 500,
                message: "Internal server error".into(),
            });
        }
        state.events.push("update");
        state.writes.push((id, draft.clone()));
        let document = state.documents.get_mut(&id).ok_or_else(not_found)?;
        document.title = draft.title.clone();
        document.content = draft.content.clone();
        document.updated_at = Utc::now();
        Ok(document.clone())
    }

    async fn save_version(&self, id: Uuid) -> Result<Version, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.events.push("save_version");
        let version = snapshot(state.documents.get(&id).ok_or_else(not_found)?);
        state.versions.push(version.clone());
        Ok(version)
    }

    async fn restore_version(&self, id: Uuid, version_id: Uuid) -> Result<Document, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.events.push("restore");
        let target = state
            .versions
            .iter()
            .find(|v| v.id == version_id && v.document_id == id)
            .cloned()
            .ok_or_else(not_found)?;
        let checkpoint = snapshot(state.documents.get(&id).ok_or_else(not_found)?);
        state.versions.push(checkpoint);

        let document = state.documents.get_mut(&id).ok_or_else(not_found)?;
        document.title = target.title;
        document.content = target.content;
        document.updated_at = Utc::now();
        Ok(document.clone())
    }

    async fn share(&self, id: Uuid) -> Result<ShareLink, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.events.push("share");
        let document = state.documents.get_mut(&id).ok_or_else(not_found)?;
        let token = document
            .share_token
            .get_or_insert_with(|| Uuid::new_v4().simple().to_string())
            .clone();
        document.is_public = true;
        Ok(ShareLink {
            share_url: format!("http://localhost:8080/share/{token}"),
            share_token: token,
        })
    }

    async fn unshare(&self, id: Uuid) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();
        state.events.push("unshare");
        state.documents.get_mut(&id).ok_or_else(not_found)?.is_public = false;
        Ok(())
    }
}
