//! [`Backend`] over the JSON API, with the session kept in reqwest's cookie jar.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use store::{Document, ShareLink, SharedDocument, UserInfo, Version, VersionSummary};
use uuid::Uuid;

use crate::backend::{Backend, ClientError, Draft};
use crate::config::EditorConfig;

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct UserBody {
    user: UserInfo,
}

#[derive(Deserialize)]
struct DocumentBody<T> {
    document: T,
}

#[derive(Deserialize)]
struct VersionBody {
    version: Version,
}

#[derive(Deserialize)]
struct VersionsBody {
    versions: Vec<VersionSummary>,
}

/// Turn a response into `T`, or into [`ClientError::Api`] with the server's message.
async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
    };
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &EditorConfig) -> Result<Self, ClientError> {
        Self::new(&config.server.base_url)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Create an account and keep its session.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<UserInfo, ClientError> {
        let response = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&json!({ "email": email, "password": password, "name": name }))
            .send()
            .await?;
        Ok(read::<UserBody>(response).await?.user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<UserInfo, ClientError> {
        let response = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        Ok(read::<UserBody>(response).await?.user)
    }

    pub async fn create_document(&self, draft: &Draft) -> Result<Document, ClientError> {
        let response = self
            .client
            .post(self.url("/api/documents"))
            .json(draft)
            .send()
            .await?;
        Ok(read::<DocumentBody<Document>>(response).await?.document)
    }

    pub async fn list_versions(&self, id: Uuid) -> Result<Vec<VersionSummary>, ClientError> {
        let response = self
            .client
            .get(self.url(&format!("/api/documents/{id}/versions")))
            .send()
            .await?;
        Ok(read::<VersionsBody>(response).await?.versions)
    }

    /// Read a published document the way an anonymous reader would.
    pub async fn shared_document(&self, token: &str) -> Result<SharedDocument, ClientError> {
        let response = self
            .client
            .get(self.url(&format!("/api/share/{token}")))
            .send()
            .await?;
        Ok(read::<DocumentBody<SharedDocument>>(response).await?.document)
    }
}

impl Backend for HttpBackend {
    async fn get_document(&self, id: Uuid) -> Result<Document, ClientError> {
        let response = self
            .client
            .get(self.url(&format!("/api/documents/{id}")))
            .send()
            .await?;
        Ok(read::<DocumentBody<Document>>(response).await?.document)
    }

    async fn update_document(&self, id: Uuid, draft: &Draft) -> Result<Document, ClientError> {
        let response = self
            .client
            .put(self.url(&format!("/api/documents/{id}")))
            .json(draft)
            .send()
            .await?;
        Ok(read::<DocumentBody<Document>>(response).await?.document)
    }

    async fn save_version(&self, id: Uuid) -> Result<Version, ClientError> {
        let response = self
            .client
            .post(self.url(&format!("/api/documents/{id}/versions")))
            .send()
            .await?;
        Ok(read::<VersionBody>(response).await?.version)
    }

    async fn restore_version(&self, id: Uuid, version_id: Uuid) -> Result<Document, ClientError> {
        let response = self
            .client
            .post(self.url(&format!("/api/documents/{id}/versions/{version_id}")))
            .send()
            .await?;
        Ok(read::<DocumentBody<Document>>(response).await?.document)
    }

    async fn share(&self, id: Uuid) -> Result<ShareLink, ClientError> {
        let response = self
            .client
            .post(self.url(&format!("/api/documents/{id}/share")))
            .send()
            .await?;
        read(response).await
    }

    async fn unshare(&self, id: Uuid) -> Result<(), ClientError> {
        let response = self
            .client
            .delete(self.url(&format!("/api/documents/{id}/share")))
            .send()
            .await?;
        read::<serde_json::Value>(response).await?;
        Ok(())
    }
}
