//! # Autosave — one debounced write per editor
//!
//! [`Autosave`] owns a single slot. Every [`arm`](Autosave::arm) replaces whatever
//! was waiting in it and restarts the quiet-period timer; when the timer runs out
//! the draft is sent as one `update`. Nothing here ever creates a version.
//!
//! Once a timer has fired its write belongs to the server: later calls to `arm`,
//! [`cancel`](Autosave::cancel) or a drop of the `Autosave` do not abort it.
//! Writes that fire back to back are chained so they reach the server in order.
//! A fired write the server rejects puts its draft back in the slot (without a
//! timer) unless the user has typed since. A later write that succeeds makes
//! that draft stale and clears it.
//!
//! [`settle`](Autosave::settle) is for explicit actions (save version, restore,
//! share). It cancels the timer, waits for a write that already fired, and then
//! sends whatever draft is left right away, so the action sees the latest text
//! and no stale autosave can land on top of its result. If that send fails the
//! draft stays in the slot and the error is returned, so the action does not run.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use store::Document;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::backend::{Backend, ClientError, Draft};

/// A write that was waiting in the slot when it was cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWrite {
    pub document_id: Uuid,
    pub draft: Draft,
}

struct Pending {
    write: PendingWrite,
    /// `None` for a draft kept after its write failed.
    timer: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct Slot {
    /// Bumped whenever the pending write is replaced or removed. A timer that
    /// wakes up with an older generation does nothing.
    generation: u64,
    pending: Option<Pending>,
    in_flight: Option<JoinHandle<()>>,
}

impl Slot {
    fn take_pending(&mut self) -> Option<PendingWrite> {
        self.generation += 1;
        self.pending.take().map(|pending| {
            if let Some(timer) = pending.timer {
                timer.abort();
            }
            pending.write
        })
    }

    /// Hold on to a draft the server did not accept, unless a newer one is
    /// already waiting for its timer.
    fn keep_failed(&mut self, write: PendingWrite) {
        if self.pending.as_ref().is_some_and(|p| p.timer.is_some()) {
            return;
        }
        self.generation += 1;
        self.pending = Some(Pending { write, timer: None });
    }

    fn clear_failed(&mut self) {
        if self.pending.as_ref().is_some_and(|p| p.timer.is_none()) {
            self.generation += 1;
            self.pending = None;
        }
    }
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Autosave<B: Backend> {
    backend: Arc<B>,
    delay: Duration,
    slot: Arc<Mutex<Slot>>,
}

impl<B: Backend> Autosave<B> {
    pub fn new(backend: Arc<B>, delay: Duration) -> Self {
        Self {
            backend,
            delay,
            slot: Arc::default(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `draft` to be written after the quiet period, replacing any
    /// write still waiting.
    pub fn arm(&self, document_id: Uuid, draft: Draft) {
        let mut slot = lock(&self.slot);
        slot.take_pending();
        let generation = slot.generation;

        let timer = tokio::spawn(fire(
            self.backend.clone(),
            self.slot.clone(),
            self.delay,
            generation,
        ));
        slot.pending = Some(Pending {
            write: PendingWrite { document_id, draft },
            timer: Some(timer),
        });
    }

    /// Drop the waiting write without sending it. This includes a draft kept
    /// after a failed write.
    pub fn cancel(&self) -> Option<PendingWrite> {
        let cancelled = lock(&self.slot).take_pending();
        if let Some(write) = &cancelled {
            tracing::debug!(document_id = %write.document_id, "autosave cancelled");
        }
        cancelled
    }

    /// Whether a draft has yet to reach the server, either waiting for its
    /// timer or kept after a failed write.
    pub fn is_pending(&self) -> bool {
        lock(&self.slot).pending.is_some()
    }

    /// Bring the server up to date with the editor before an explicit action.
    ///
    /// Returns the stored document when a waiting draft had to be sent. On error
    /// the draft is kept and [`is_pending`](Autosave::is_pending) stays true.
    pub async fn settle(&self) -> Result<Option<Document>, ClientError> {
        let (pending, in_flight) = {
            let mut slot = lock(&self.slot);
            (slot.take_pending(), slot.in_flight.take())
        };

        if let Some(handle) = in_flight {
            if let Err(err) = handle.await {
                tracing::warn!(error = %err, "autosave task did not finish");
            }
        }

        // A write that failed while we waited left its draft behind. It is older
        // than anything taken above.
        let failed = lock(&self.slot).take_pending();
        let Some(write) = pending.or(failed) else {
            return Ok(None);
        };

        match self
            .backend
            .update_document(write.document_id, &write.draft)
            .await
        {
            Ok(document) => {
                tracing::debug!(document_id = %write.document_id, "flushed draft");
                Ok(Some(document))
            }
            Err(err) => {
                tracing::warn!(document_id = %write.document_id, error = %err, "flush failed");
                lock(&self.slot).keep_failed(write);
                Err(err)
            }
        }
    }
}

impl<B: Backend> Drop for Autosave<B> {
    fn drop(&mut self) {
        lock(&self.slot).take_pending();
    }
}

async fn fire<B: Backend>(
    backend: Arc<B>,
    shared: Arc<Mutex<Slot>>,
    delay: Duration,
    generation: u64,
) {
    tokio::time::sleep(delay).await;

    let mut slot = lock(&shared);
    if slot.generation != generation {
        return;
    }
    let Some(pending) = slot.pending.take() else {
        return;
    };

    let previous = slot.in_flight.take();
    slot.in_flight = Some(tokio::spawn(write(
        backend,
        shared.clone(),
        pending.write,
        previous,
    )));
}

async fn write<B: Backend>(
    backend: Arc<B>,
    shared: Arc<Mutex<Slot>>,
    pending: PendingWrite,
    previous: Option<JoinHandle<()>>,
) {
    if let Some(previous) = previous {
        let _ = previous.await;
    }

    let document_id = pending.document_id;
    match backend.update_document(document_id, &pending.draft).await {
        Ok(document) => {
            tracing::debug!(%document_id, updated_at = %document.updated_at, "autosaved");
            lock(&shared).clear_failed();
        }
        Err(err) => {
            tracing::warn!(%document_id, error = %err, "autosave failed");
            lock(&shared).keep_failed(pending);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;

    const DELAY: Duration = Duration::from_secs(5);

    fn setup(latency: Duration) -> (Arc<FakeBackend>, Autosave<FakeBackend>, Uuid) {
        let backend = Arc::new(FakeBackend::with_latency(latency));
        let id = backend.insert("Untitled", "");
        let autosave = Autosave::new(backend.clone(), DELAY);
        (backend, autosave, id)
    }

    #[tokio::test(start_paused = true)]
    async fn test_edits_are_debounced_into_one_write() {
        let (backend, autosave, id) = setup(Duration::ZERO);

        for content in ["h", "he", "hello"] {
            autosave.arm(id, Draft::new("Untitled", content));
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        assert!(backend.writes().is_empty());

        tokio::time::sleep(Duration::from_millis(3900)).await;
        assert!(backend.writes().is_empty());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(backend.writes(), vec![(id, Draft::new("Untitled", "hello"))]);
        assert!(!autosave.is_pending());
        assert!(backend.versions_of(id).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_the_write() {
        let (backend, autosave, id) = setup(Duration::ZERO);

        autosave.arm(id, Draft::new("T", "unsaved"));
        let cancelled = autosave.cancel().unwrap();
        assert_eq!(cancelled.draft.content, "unsaved");
        assert!(autosave.cancel().is_none());

        tokio::time::sleep(DELAY * 3).await;
        assert!(backend.writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_sends_waiting_draft_now() {
        let (backend, autosave, id) = setup(Duration::ZERO);

        autosave.arm(id, Draft::new("T", "latest"));
        let document = autosave.settle().await.unwrap().unwrap();
        assert_eq!(document.content, "latest");
        assert_eq!(backend.writes().len(), 1);

        tokio::time::sleep(DELAY * 3).await;
        assert_eq!(backend.writes().len(), 1);
        assert!(autosave.settle().await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fired_write_is_not_aborted() {
        let (backend, autosave, id) = setup(Duration::from_secs(2));

        autosave.arm(id, Draft::new("T", "first"));
        tokio::time::sleep(DELAY + Duration::from_millis(100)).await;
        // The first write is now waiting on the server.
        autosave.arm(id, Draft::new("T", "second"));
        autosave.cancel();

        tokio::time::sleep(DELAY * 3).await;
        assert_eq!(backend.writes(), vec![(id, Draft::new("T", "first"))]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_waits_for_in_flight_write() {
        let (backend, autosave, id) = setup(Duration::from_secs(2));

        autosave.arm(id, Draft::new("T", "fired"));
        tokio::time::sleep(DELAY + Duration::from_millis(100)).await;
        autosave.arm(id, Draft::new("T", "typed since"));

        let document = autosave.settle().await.unwrap().unwrap();
        assert_eq!(document.content, "typed since");
        assert_eq!(
            backend.writes(),
            vec![
                (id, Draft::new("T", "fired")),
                (id, Draft::new("T", "typed since")),
            ]
        );
        assert_eq!(backend.document(id).content, "typed since");
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_to_back_writes_stay_ordered() {
        let (backend, autosave, id) = setup(DELAY * 2);

        autosave.arm(id, Draft::new("T", "one"));
        tokio::time::sleep(DELAY + Duration::from_millis(100)).await;
        autosave.arm(id, Draft::new("T", "two"));

        tokio::time::sleep(DELAY * 6).await;
        assert_eq!(
            backend.writes(),
            vec![(id, Draft::new("T", "one")), (id, Draft::new("T", "two"))]
        );
        assert_eq!(backend.document(id).content, "two");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_write_is_sent_by_settle() {
        let (backend, autosave, id) = setup(Duration::ZERO);
        backend.fail_updates(1);

        autosave.arm(id, Draft::new("T", "new text"));
        tokio::time::sleep(DELAY + Duration::from_secs(1)).await;
        assert!(backend.writes().is_empty());
        assert!(autosave.is_pending());

        let document = autosave.settle().await.unwrap().unwrap();
        assert_eq!(document.content, "new text");
        assert_eq!(backend.writes(), vec![(id, Draft::new("T", "new text"))]);
        assert!(!autosave.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_settle_keeps_the_draft() {
        let (backend, autosave, id) = setup(Duration::ZERO);
        backend.fail_updates(2);

        autosave.arm(id, Draft::new("T", "new text"));
        tokio::time::sleep(DELAY + Duration::from_secs(1)).await;

        let err = autosave.settle().await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(autosave.is_pending());

        let document = autosave.settle().await.unwrap().unwrap();
        assert_eq!(document.content, "new text");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_write_yields_to_newer_typing() {
        let (backend, autosave, id) = setup(Duration::from_secs(2));
        backend.fail_updates(1);

        autosave.arm(id, Draft::new("T", "one"));
        tokio::time::sleep(DELAY + Duration::from_millis(100)).await;
        // "one" is on its way and will fail; "two" is typed meanwhile.
        autosave.arm(id, Draft::new("T", "two"));

        tokio::time::sleep(DELAY * 3).await;
        assert_eq!(backend.writes(), vec![(id, Draft::new("T", "two"))]);
        assert!(!autosave.is_pending());
        assert!(autosave.settle().await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_behind_newer_write_is_dropped() {
        let (backend, autosave, id) = setup(DELAY * 2);
        backend.fail_updates(1);

        autosave.arm(id, Draft::new("T", "one"));
        tokio::time::sleep(DELAY + Duration::from_millis(100)).await;
        autosave.arm(id, Draft::new("T", "two"));
        // Both writes have fired; "one" fails while "two" waits behind it.

        tokio::time::sleep(DELAY * 6).await;
        assert_eq!(backend.writes(), vec![(id, Draft::new("T", "two"))]);
        assert_eq!(backend.document(id).content, "two");
        assert!(!autosave.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_waiting_write() {
        let (backend, autosave, id) = setup(Duration::ZERO);

        autosave.arm(id, Draft::new("T", "gone"));
        drop(autosave);

        tokio::time::sleep(DELAY * 3).await;
        assert!(backend.writes().is_empty());
    }
}
