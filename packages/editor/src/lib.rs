//! # Editor crate — the client half of autosave
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`backend`] | The [`Backend`] trait, the [`Draft`] being edited, and [`ClientError`] |
//! | [`http`] | [`HttpBackend`]: the JSON API over reqwest, with a cookie jar for the session |
//! | [`autosave`] | [`Autosave`]: the single-slot debounced writer |
//! | [`session`] | [`EditorSession`]: open document, local draft, explicit actions |
//! | [`config`] | [`EditorConfig`]: `scribe-editor.toml` (server URL, autosave delay) |

pub mod autosave;
pub mod backend;
pub mod config;
pub mod http;
pub mod session;

#[cfg(test)]
mod testing;

pub use autosave::{Autosave, PendingWrite};
pub use backend::{Backend, ClientError, Draft};
pub use config::{AutosaveConfig, EditorConfig, ServerConfig};
pub use http::HttpBackend;
pub use session::EditorSession;
