//! The editing surface for one user: at most one open document, its local draft,
//! and the autosave slot that trails behind it.

use std::sync::Arc;

use store::{ShareLink, Version};
use uuid::Uuid;

use crate::autosave::{Autosave, PendingWrite};
use crate::backend::{Backend, ClientError, Draft};
use crate::config::AutosaveConfig;

struct OpenDocument {
    id: Uuid,
    draft: Draft,
}

pub struct EditorSession<B: Backend> {
    backend: Arc<B>,
    autosave: Autosave<B>,
    open: Option<OpenDocument>,
}

impl<B: Backend> EditorSession<B> {
    pub fn new(backend: Arc<B>, config: &AutosaveConfig) -> Self {
        Self {
            autosave: Autosave::new(backend.clone(), config.delay()),
            backend,
            open: None,
        }
    }

    pub fn document_id(&self) -> Option<Uuid> {
        self.open.as_ref().map(|open| open.id)
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.open.as_ref().map(|open| &open.draft)
    }

    /// True until the server holds the draft, including after a failed autosave.
    pub fn has_unsaved_changes(&self) -> bool {
        self.autosave.is_pending()
    }

    /// Switch to another document. A write still waiting for the previous one
    /// is dropped.
    pub async fn open(&mut self, id: Uuid) -> Result<&Draft, ClientError> {
        self.autosave.cancel();
        self.open = None;

        let document = self.backend.get_document(id).await?;
        let open = self.open.insert(OpenDocument {
            id,
            draft: Draft::from(&document),
        });
        Ok(&open.draft)
    }

    pub fn edit_title(&mut self, title: impl Into<String>) -> Result<(), ClientError> {
        let open = self.open.as_mut().ok_or(ClientError::NoDocument)?;
        open.draft.title = title.into();
        self.autosave.arm(open.id, open.draft.clone());
        Ok(())
    }

    pub fn edit_content(&mut self, content: impl Into<String>) -> Result<(), ClientError> {
        let open = self.open.as_mut().ok_or(ClientError::NoDocument)?;
        open.draft.content = content.into();
        self.autosave.arm(open.id, open.draft.clone());
        Ok(())
    }

    /// Snapshot the draft as a version.
    pub async fn save_version(&mut self) -> Result<Version, ClientError> {
        let id = self.settled().await?;
        self.backend.save_version(id).await
    }

    /// Restore a version and load its text into the draft. The text it replaces
    /// is kept on the server as a checkpoint.
    pub async fn restore(&mut self, version_id: Uuid) -> Result<&Draft, ClientError> {
        let id = self.settled().await?;
        let document = self.backend.restore_version(id, version_id).await?;
        let open = self.open.insert(OpenDocument {
            id,
            draft: Draft::from(&document),
        });
        Ok(&open.draft)
    }

    pub async fn share(&mut self) -> Result<ShareLink, ClientError> {
        let id = self.settled().await?;
        self.backend.share(id).await
    }

    pub async fn unshare(&mut self) -> Result<(), ClientError> {
        let id = self.settled().await?;
        self.backend.unshare(id).await
    }

    /// Leave the document without writing the waiting draft.
    pub fn close(&mut self) -> Option<PendingWrite> {
        self.open = None;
        self.autosave.cancel()
    }

    async fn settled(&self) -> Result<Uuid, ClientError> {
        let id = self.document_id().ok_or(ClientError::NoDocument)?;
        self.autosave.settle().await?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testing::FakeBackend;

    fn session(backend: &Arc<FakeBackend>) -> EditorSession<FakeBackend> {
        EditorSession::new(backend.clone(), &AutosaveConfig { delay_ms: 5000 })
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_autosaves_without_versions() {
        let backend = Arc::new(FakeBackend::default());
        let id = backend.insert("Untitled", "");
        let mut editor = session(&backend);

        editor.open(id).await.unwrap();
        editor.edit_title("Plan").unwrap();
        editor.edit_content("<p>step one</p>").unwrap();
        assert!(editor.has_unsaved_changes());

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(!editor.has_unsaved_changes());
        assert_eq!(backend.writes(), vec![(id, Draft::new("Plan", "<p>step one</p>"))]);
        assert!(backend.versions_of(id).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_version_captures_unsaved_text() {
        let backend = Arc::new(FakeBackend::default());
        let id = backend.insert("A", "old");
        let mut editor = session(&backend);

        editor.open(id).await.unwrap();
        editor.edit_content("new").unwrap();
        let version = editor.save_version().await.unwrap();

        assert_eq!(version.content, "new");
        assert_eq!(backend.events(), vec!["update", "save_version"]);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.writes().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restore_is_not_overwritten_by_stale_timer() {
        let backend = Arc::new(FakeBackend::default());
        let id = backend.insert("A", "first");
        let mut editor = session(&backend);

        editor.open(id).await.unwrap();
        let snapshot = editor.save_version().await.unwrap();
        editor.edit_content("second").unwrap();

        let draft = editor.restore(snapshot.id).await.unwrap();
        assert_eq!(draft.content, "first");

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.document(id).content, "first");
        // The checkpoint holds the text the restore replaced.
        let versions = backend.versions_of(id);
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[1].content, "second");
        assert_eq!(backend.events(), vec!["save_version", "update", "restore"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_holds_text_whose_autosave_failed() {
        let backend = Arc::new(FakeBackend::default());
        let id = backend.insert("A", "old");
        backend.fail_updates(1);
        let mut editor = session(&backend);

        editor.open(id).await.unwrap();
        editor.edit_content("new text").unwrap();
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(backend.document(id).content, "old");
        assert!(editor.has_unsaved_changes());

        let version = editor.save_version().await.unwrap();
        assert_eq!(version.content, "new text");
        assert_eq!(backend.document(id).content, "new text");
        assert!(!editor.has_unsaved_changes());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restore_does_not_run_while_draft_cannot_be_saved() {
        let backend = Arc::new(FakeBackend::default());
        let id = backend.insert("A", "old");
        let mut editor = session(&backend);

        editor.open(id).await.unwrap();
        let snapshot = editor.save_version().await.unwrap();
        backend.fail_updates(2);
        editor.edit_content("new text").unwrap();
        tokio::time::sleep(Duration::from_secs(6)).await;

        let err = editor.restore(snapshot.id).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(editor.draft().unwrap().content, "new text");
        assert!(editor.has_unsaved_changes());
        assert_eq!(backend.versions_of(id).len(), 1);
        assert_eq!(backend.events(), vec!["save_version"]);

        // Once the server accepts the draft, the restore checkpoints it.
        editor.restore(snapshot.id).await.unwrap();
        let versions = backend.versions_of(id);
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[1].content, "new text");
    }

    #[tokio::test(start_paused = true)]
    async fn test_switching_documents_drops_pending_write() {
        let backend = Arc::new(FakeBackend::default());
        let first = backend.insert("one", "");
        let second = backend.insert("two", "");
        let mut editor = session(&backend);

        editor.open(first).await.unwrap();
        editor.edit_content("never sent").unwrap();
        let draft = editor.open(second).await.unwrap();
        assert_eq!(draft.title, "two");

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(backend.writes().is_empty());
        assert_eq!(editor.document_id(), Some(second));
    }

    #[tokio::test(start_paused = true)]
    async fn test_share_and_unshare_flush_first() {
        let backend = Arc::new(FakeBackend::default());
        let id = backend.insert("A", "");
        let mut editor = session(&backend);

        editor.open(id).await.unwrap();
        editor.edit_title("Published").unwrap();
        let link = editor.share().await.unwrap();
        assert!(link.share_url.ends_with(&link.share_token));
        assert_eq!(backend.document(id).title, "Published");

        editor.unshare().await.unwrap();
        assert!(!backend.document(id).is_public);
        assert_eq!(backend.events(), vec!["update", "share", "unshare"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_actions_need_an_open_document() {
        let backend = Arc::new(FakeBackend::default());
        let mut editor = session(&backend);

        assert!(matches!(editor.edit_content("x"), Err(ClientError::NoDocument)));
        assert!(matches!(editor.save_version().await, Err(ClientError::NoDocument)));
        assert!(editor.close().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_returns_unsent_draft() {
        let backend = Arc::new(FakeBackend::default());
        let id = backend.insert("A", "");
        let mut editor = session(&backend);

        editor.open(id).await.unwrap();
        editor.edit_content("draft").unwrap();
        let unsent = editor.close().unwrap();
        assert_eq!(unsent.draft.content, "draft");
        assert!(editor.document_id().is_none());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(backend.writes().is_empty());
    }
}
