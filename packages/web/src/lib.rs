//! # Web crate — the HTTP surface
//!
//! [`router`] mounts every JSON route under `/api` on top of any [`Storage`]
//! backend. The binary in `main.rs` picks the backend and the session store from
//! [`Settings`] and adds the session layer; tests do the same with the in-memory
//! pair.

use std::sync::Arc;

use axum::Router;
use store::Storage;

mod routes;
pub mod settings;

pub use settings::Settings;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState<S> {
    pub store: S,
    pub settings: Arc<Settings>,
}

impl<S: Storage> AppState<S> {
    pub fn new(store: S, settings: Settings) -> Self {
        Self {
            store,
            settings: Arc::new(settings),
        }
    }
}

/// All API routes. The caller must add a `tower_sessions::SessionManagerLayer`.
pub fn router<S: Storage>(state: AppState<S>) -> Router {
    routes::api().with_state(state)
}
