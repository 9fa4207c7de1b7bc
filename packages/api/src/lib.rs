//! # API crate — the document core for Scribe
//!
//! Every operation here takes a storage handle and, except for share resolution,
//! the caller's [`auth::Identity`]. Nothing in this crate knows about HTTP routes;
//! the `web` crate maps requests onto these functions and [`ApiError`] onto
//! responses.
//!
//! ## Modules
//!
//! | Module | Feature gate | Purpose |
//! |--------|-------------|---------|
//! | [`auth`] | — | Session identity guard, the `CurrentUser` extractor, local accounts, password hashing |
//! | [`documents`] | — | Owner-scoped document CRUD, last writer wins |
//! | [`versions`] | — | Append-only version log and transactional restore |
//! | [`share`] | — | Share token issue, revoke and anonymous resolve |
//! | [`tags`] | — | Per-owner tags and document associations |
//! | [`crypto`] | — | Share token generation |
//! | [`validate`] | — | Field constraints on request bodies |
//! | [`db`] | `server` | PostgreSQL pool and embedded migrations |
//! | [`error`] | — | The [`ApiError`] taxonomy and its HTTP mapping |

pub mod auth;
pub mod crypto;
pub mod db;
pub mod documents;
pub mod error;
pub mod share;
pub mod tags;
pub mod validate;
pub mod versions;

#[cfg(test)]
mod testing;

pub use error::ApiError;
pub use store::{
    Document, DocumentSummary, ShareLink, SharedDocument, Tag, TagSummary, UserInfo, Version,
    VersionSummary,
};
