pub mod error;
pub mod models;
pub mod repo;

mod memory;
pub use memory::{MemoryStore, MemoryTx};

#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "postgres")]
pub use postgres::PgStore;

pub use error::StoreError;
pub use models::{
    Document, DocumentSummary, NewUser, ShareLink, SharedDocument, Tag, TagSummary, User,
    UserInfo, Version, VersionSummary,
};
pub use repo::{Storage, Transaction};
