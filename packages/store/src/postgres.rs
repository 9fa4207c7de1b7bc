//! PostgreSQL backend built on `sqlx` transactions.
//!
//! Schema lives in `packages/api/migrations`. Ids are generated here rather than
//! by the database so no extension is required.

use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    Document, DocumentSummary, NewUser, SharedDocument, Tag, TagSummary, User, Version,
    VersionSummary,
};
use crate::repo::{Storage, Transaction};

const USER_COLUMNS: &str = "id, email, name, password_hash, created_at, updated_at";
const DOCUMENT_COLUMNS: &str =
    "id, owner_id, title, content, is_public, share_token, created_at, updated_at";
const TAG_COLUMNS: &str = "id, owner_id, name, color, created_at";

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

pub struct PgTx {
    tx: sqlx::Transaction<'static, Postgres>,
}

impl Storage for PgStore {
    type Tx = PgTx;

    async fn begin(&self) -> Result<PgTx, StoreError> {
        Ok(PgTx {
            tx: self.pool.begin().await?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct DocumentTagRow {
    document_id: Uuid,
    #[sqlx(flatten)]
    tag: Tag,
}

impl Transaction for PgTx {
    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn insert_user(&mut self, user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (id, email, name, password_hash) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        Ok(sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.email)
            .bind(&user.name)
            .bind(&user.password_hash)
            .fetch_one(&mut *self.tx)
            .await?)
    }

    async fn user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        Ok(sqlx::query_as(&sql)
            .bind(email)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn user_by_id(&mut self, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn insert_document(
        &mut self,
        owner_id: Uuid,
        title: &str,
        content: &str,
    ) -> Result<Document, StoreError> {
        let sql = format!(
            "INSERT INTO documents (id, owner_id, title, content) VALUES ($1, $2, $3, $4) RETURNING {DOCUMENT_COLUMNS}"
        );
        Ok(sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(owner_id)
            .bind(title)
            .bind(content)
            .fetch_one(&mut *self.tx)
            .await?)
    }

    async fn document(&mut self, id: Uuid, owner_id: Uuid) -> Result<Option<Document>, StoreError> {
        let sql = format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1 AND owner_id = $2");
        Ok(sqlx::query_as(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn lock_document(
        &mut self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Document>, StoreError> {
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1 AND owner_id = $2 FOR UPDATE"
        );
        Ok(sqlx::query_as(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn document_summaries(
        &mut self,
        owner_id: Uuid,
    ) -> Result<Vec<DocumentSummary>, StoreError> {
        let mut documents: Vec<DocumentSummary> = sqlx::query_as(
            "SELECT id, title, is_public, share_token, created_at, updated_at
             FROM documents WHERE owner_id = $1 ORDER BY updated_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&mut *self.tx)
        .await?;

        let rows: Vec<DocumentTagRow> = sqlx::query_as(
            "SELECT dt.document_id, t.id, t.owner_id, t.name, t.color, t.created_at
             FROM document_tags dt
             JOIN tags t ON t.id = dt.tag_id
             JOIN documents d ON d.id = dt.document_id
             WHERE d.owner_id = $1
             ORDER BY t.name",
        )
        .bind(owner_id)
        .fetch_all(&mut *self.tx)
        .await?;

        for row in rows {
            if let Some(doc) = documents.iter_mut().find(|d| d.id == row.document_id) {
                doc.tags.push(row.tag);
            }
        }
        Ok(documents)
    }

    async fn update_document(
        &mut self,
        id: Uuid,
        owner_id: Uuid,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<Option<Document>, StoreError> {
        let sql = format!(
            "UPDATE documents
             SET title = COALESCE($3, title), content = COALESCE($4, content), updated_at = clock_timestamp()
             WHERE id = $1 AND owner_id = $2
             RETURNING {DOCUMENT_COLUMNS}"
        );
        Ok(sqlx::query_as(&sql)
            .bind(id)
            .bind(owner_id)
            .bind(title)
            .bind(content)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn delete_document(&mut self, id: Uuid, owner_id: Uuid) -> Result<bool, StoreError> {
        // versions and tag associations go with it via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM documents WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_sharing(
        &mut self,
        id: Uuid,
        owner_id: Uuid,
        is_public: bool,
        share_token: Option<&str>,
    ) -> Result<Option<Document>, StoreError> {
        let sql = format!(
            "UPDATE documents
             SET is_public = $3, share_token = COALESCE($4, share_token), updated_at = clock_timestamp()
             WHERE id = $1 AND owner_id = $2
             RETURNING {DOCUMENT_COLUMNS}"
        );
        Ok(sqlx::query_as(&sql)
            .bind(id)
            .bind(owner_id)
            .bind(is_public)
            .bind(share_token)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn shared_document(
        &mut self,
        share_token: &str,
    ) -> Result<Option<SharedDocument>, StoreError> {
        Ok(sqlx::query_as(
            "SELECT d.id, d.title, d.content, d.created_at, d.updated_at,
                    COALESCE(u.name, u.email) AS author
             FROM documents d
             JOIN users u ON u.id = d.owner_id
             WHERE d.share_token = $1 AND d.is_public",
        )
        .bind(share_token)
        .fetch_optional(&mut *self.tx)
        .await?)
    }

    async fn insert_version(
        &mut self,
        document_id: Uuid,
        title: &str,
        content: &str,
    ) -> Result<Version, StoreError> {
        Ok(sqlx::query_as(
            "INSERT INTO document_versions (id, document_id, title, content)
             VALUES ($1, $2, $3, $4)
             RETURNING id, document_id, title, content, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(document_id)
        .bind(title)
        .bind(content)
        .fetch_one(&mut *self.tx)
        .await?)
    }

    async fn versions(&mut self, document_id: Uuid) -> Result<Vec<VersionSummary>, StoreError> {
        Ok(sqlx::query_as(
            "SELECT id, title, created_at FROM document_versions
             WHERE document_id = $1
             ORDER BY created_at DESC, seq DESC",
        )
        .bind(document_id)
        .fetch_all(&mut *self.tx)
        .await?)
    }

    async fn version(
        &mut self,
        document_id: Uuid,
        version_id: Uuid,
    ) -> Result<Option<Version>, StoreError> {
        Ok(sqlx::query_as(
            "SELECT id, document_id, title, content, created_at FROM document_versions
             WHERE id = $1 AND document_id = $2",
        )
        .bind(version_id)
        .bind(document_id)
        .fetch_optional(&mut *self.tx)
        .await?)
    }

    async fn insert_tag(&mut self, owner_id: Uuid, name: &str, color: &str) -> Result<Tag, StoreError> {
        let sql = format!(
            "INSERT INTO tags (id, owner_id, name, color) VALUES ($1, $2, $3, $4) RETURNING {TAG_COLUMNS}"
        );
        Ok(sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(owner_id)
            .bind(name)
            .bind(color)
            .fetch_one(&mut *self.tx)
            .await?)
    }

    async fn tags(&mut self, owner_id: Uuid) -> Result<Vec<TagSummary>, StoreError> {
        Ok(sqlx::query_as(
            "SELECT t.id, t.owner_id, t.name, t.color, t.created_at,
                    COUNT(dt.document_id) AS document_count
             FROM tags t
             LEFT JOIN document_tags dt ON dt.tag_id = t.id
             WHERE t.owner_id = $1
             GROUP BY t.id
             ORDER BY t.created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&mut *self.tx)
        .await?)
    }

    async fn tag(&mut self, id: Uuid, owner_id: Uuid) -> Result<Option<Tag>, StoreError> {
        let sql = format!("SELECT {TAG_COLUMNS} FROM tags WHERE id = $1 AND owner_id = $2");
        Ok(sqlx::query_as(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn update_tag(
        &mut self,
        id: Uuid,
        owner_id: Uuid,
        name: &str,
        color: Option<&str>,
    ) -> Result<Option<Tag>, StoreError> {
        let sql = format!(
            "UPDATE tags SET name = $3, color = COALESCE($4, color)
             WHERE id = $1 AND owner_id = $2
             RETURNING {TAG_COLUMNS}"
        );
        Ok(sqlx::query_as(&sql)
            .bind(id)
            .bind(owner_id)
            .bind(name)
            .bind(color)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn delete_tag(&mut self, id: Uuid, owner_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn document_tags(&mut self, document_id: Uuid) -> Result<Vec<Tag>, StoreError> {
        Ok(sqlx::query_as(
            "SELECT t.id, t.owner_id, t.name, t.color, t.created_at
             FROM tags t
             JOIN document_tags dt ON dt.tag_id = t.id
             WHERE dt.document_id = $1
             ORDER BY t.name",
        )
        .bind(document_id)
        .fetch_all(&mut *self.tx)
        .await?)
    }

    async fn insert_document_tag(&mut self, document_id: Uuid, tag_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO document_tags (document_id, tag_id) VALUES ($1, $2)")
            .bind(document_id)
            .bind(tag_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn delete_document_tag(
        &mut self,
        document_id: Uuid,
        tag_id: Uuid,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM document_tags WHERE document_id = $1 AND tag_id = $2")
            .bind(document_id)
            .bind(tag_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
