//! JSON handlers. Each one extracts the caller, calls into `api`, and wraps the
//! result in the envelope clients expect (`{"document": ...}`, `{"success": true}`).

use api::auth::{self, CurrentUser, LoginInput, RegisterInput};
use api::documents::{self, DocumentInput};
use api::tags::{self, TagInput, TAG_NOT_FOUND};
use api::{share, versions, ApiError};
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request, State};
use axum::http::request::Parts;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use store::Storage;
use tower_sessions::Session;
use uuid::Uuid;

use crate::AppState;

type ApiResult = Result<Json<Value>, ApiError>;

pub(crate) fn api<S: Storage>() -> Router<AppState<S>> {
    Router::new()
        .route("/api/auth/register", post(register::<S>))
        .route("/api/auth/login", post(login::<S>))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me::<S>))
        .route(
            "/api/documents",
            get(list_documents::<S>).post(create_document::<S>),
        )
        .route(
            "/api/documents/{id}",
            get(get_document::<S>)
                .put(update_document::<S>)
                .delete(delete_document::<S>),
        )
        .route(
            "/api/documents/{id}/share",
            post(issue_share::<S>).delete(revoke_share::<S>),
        )
        .route(
            "/api/documents/{id}/versions",
            get(list_versions::<S>).post(save_version::<S>),
        )
        .route(
            "/api/documents/{id}/versions/{version_id}",
            get(get_version::<S>).post(restore_version::<S>),
        )
        .route(
            "/api/documents/{id}/tags",
            get(document_tags::<S>)
                .post(add_document_tag::<S>)
                .delete(remove_document_tag::<S>),
        )
        .route("/api/tags", get(list_tags::<S>).post(create_tag::<S>))
        .route("/api/tags/{id}", put(update_tag::<S>).delete(delete_tag::<S>))
        .route("/api/share/{token}", get(resolve_share::<S>))
}

/// `Json` whose rejection is reported as a validation error.
struct JsonBody<T>(T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// `Query` whose rejection is reported as a validation error.
struct QueryParams<T>(T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Ids that do not parse cannot name a row, so they are reported like missing ones.
fn parse_id(raw: &str, missing: &'static str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(missing))
}

fn document_id(raw: &str) -> Result<Uuid, ApiError> {
    parse_id(raw, "Document not found")
}

fn success() -> Json<Value> {
    Json(json!({ "success": true }))
}

// auth

async fn register<S: Storage>(
    State(state): State<AppState<S>>,
    session: Session,
    JsonBody(input): JsonBody<RegisterInput>,
) -> ApiResult {
    let user = auth::register(&state.store, input).await?;
    auth::sign_in(&session, &user).await?;
    Ok(Json(json!({ "user": user })))
}

async fn login<S: Storage>(
    State(state): State<AppState<S>>,
    session: Session,
    JsonBody(input): JsonBody<LoginInput>,
) -> ApiResult {
    let user = auth::login(&state.store, input).await?;
    auth::sign_in(&session, &user).await?;
    Ok(Json(json!({ "user": user })))
}

async fn logout(session: Session) -> ApiResult {
    auth::sign_out(&session).await?;
    Ok(success())
}

async fn me<S: Storage>(
    State(state): State<AppState<S>>,
    CurrentUser(who): CurrentUser,
) -> ApiResult {
    let user = auth::current_user(&state.store, &who)
        .await?
        .ok_or(ApiError::Unauthenticated("Not authenticated"))?;
    Ok(Json(json!({ "user": user })))
}

// documents

async fn list_documents<S: Storage>(
    State(state): State<AppState<S>>,
    CurrentUser(who): CurrentUser,
) -> ApiResult {
    let documents = documents::list_documents(&state.store, &who).await?;
    Ok(Json(json!({ "documents": documents })))
}

async fn create_document<S: Storage>(
    State(state): State<AppState<S>>,
    CurrentUser(who): CurrentUser,
    JsonBody(input): JsonBody<DocumentInput>,
) -> ApiResult {
    let document = documents::create_document(
        &state.store,
        &who,
        input,
        &state.settings.documents.default_title,
    )
    .await?;
    Ok(Json(json!({ "document": document })))
}

async fn get_document<S: Storage>(
    State(state): State<AppState<S>>,
    CurrentUser(who): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult {
    let document = documents::get_document(&state.store, &who, document_id(&id)?).await?;
    Ok(Json(json!({ "document": document })))
}

async fn update_document<S: Storage>(
    State(state): State<AppState<S>>,
    CurrentUser(who): CurrentUser,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<DocumentInput>,
) -> ApiResult {
    let document =
        documents::update_document(&state.store, &who, document_id(&id)?, input).await?;
    Ok(Json(json!({ "document": document })))
}

async fn delete_document<S: Storage>(
    State(state): State<AppState<S>>,
    CurrentUser(who): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult {
    documents::delete_document(&state.store, &who, document_id(&id)?).await?;
    Ok(success())
}

// sharing

async fn issue_share<S: Storage>(
    State(state): State<AppState<S>>,
    CurrentUser(who): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult {
    let link = share::issue_share(
        &state.store,
        &who,
        document_id(&id)?,
        &state.settings.server.public_url,
    )
    .await?;
    Ok(Json(json!(link)))
}

async fn revoke_share<S: Storage>(
    State(state): State<AppState<S>>,
    CurrentUser(who): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult {
    share::revoke_share(&state.store, &who, document_id(&id)?).await?;
    Ok(success())
}

async fn resolve_share<S: Storage>(
    State(state): State<AppState<S>>,
    Path(token): Path<String>,
) -> ApiResult {
    let document = share::resolve_share(&state.store, &token).await?;
    Ok(Json(json!({ "document": document })))
}

// versions

async fn list_versions<S: Storage>(
    State(state): State<AppState<S>>,
    CurrentUser(who): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult {
    let versions = versions::list_versions(&state.store, &who, document_id(&id)?).await?;
    Ok(Json(json!({ "versions": versions })))
}

async fn save_version<S: Storage>(
    State(state): State<AppState<S>>,
    CurrentUser(who): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult {
    let version = versions::save_version(&state.store, &who, document_id(&id)?).await?;
    Ok(Json(json!({ "version": version })))
}

async fn get_version<S: Storage>(
    State(state): State<AppState<S>>,
    CurrentUser(who): CurrentUser,
    Path((id, version_id)): Path<(String, String)>,
) -> ApiResult {
    let version = versions::get_version(
        &state.store,
        &who,
        document_id(&id)?,
        parse_id(&version_id, "Version not found")?,
    )
    .await?;
    Ok(Json(json!({ "version": version })))
}

async fn restore_version<S: Storage>(
    State(state): State<AppState<S>>,
    CurrentUser(who): CurrentUser,
    Path((id, version_id)): Path<(String, String)>,
) -> ApiResult {
    let document = versions::restore_version(
        &state.store,
        &who,
        document_id(&id)?,
        parse_id(&version_id, "Version not found")?,
    )
    .await?;
    Ok(Json(json!({ "document": document })))
}

// tags

/// `{"tagId": ...}` in a body, or `?tagId=...` in a query string.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TagRef {
    tag_id: Option<String>,
}

impl TagRef {
    fn id(&self) -> Result<Uuid, ApiError> {
        let raw = self
            .tag_id
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Validation("Tag id is required".into()))?;
        parse_id(raw, TAG_NOT_FOUND)
    }
}

async fn list_tags<S: Storage>(
    State(state): State<AppState<S>>,
    CurrentUser(who): CurrentUser,
) -> ApiResult {
    let tags = tags::list_tags(&state.store, &who).await?;
    Ok(Json(json!({ "tags": tags })))
}

async fn create_tag<S: Storage>(
    State(state): State<AppState<S>>,
    CurrentUser(who): CurrentUser,
    JsonBody(input): JsonBody<TagInput>,
) -> ApiResult {
    let tag = tags::create_tag(&state.store, &who, input).await?;
    Ok(Json(json!({ "tag": tag })))
}

async fn update_tag<S: Storage>(
    State(state): State<AppState<S>>,
    CurrentUser(who): CurrentUser,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<TagInput>,
) -> ApiResult {
    let tag_id = parse_id(&id, TAG_NOT_FOUND)?;
    let tag = tags::update_tag(&state.store, &who, tag_id, input).await?;
    Ok(Json(json!({ "tag": tag })))
}

async fn delete_tag<S: Storage>(
    State(state): State<AppState<S>>,
    CurrentUser(who): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult {
    tags::delete_tag(&state.store, &who, parse_id(&id, TAG_NOT_FOUND)?).await?;
    Ok(success())
}

async fn document_tags<S: Storage>(
    State(state): State<AppState<S>>,
    CurrentUser(who): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult {
    let tags = tags::document_tags(&state.store, &who, document_id(&id)?).await?;
    Ok(Json(json!({ "tags": tags })))
}

async fn add_document_tag<S: Storage>(
    State(state): State<AppState<S>>,
    CurrentUser(who): CurrentUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<TagRef>,
) -> ApiResult {
    let doc_id = document_id(&id)?;
    tags::add_document_tag(&state.store, &who, doc_id, body.id()?).await?;
    Ok(success())
}

async fn remove_document_tag<S: Storage>(
    State(state): State<AppState<S>>,
    CurrentUser(who): CurrentUser,
    Path(id): Path<String>,
    QueryParams(query): QueryParams<TagRef>,
) -> ApiResult {
    let doc_id = document_id(&id)?;
    tags::remove_document_tag(&state.store, &who, doc_id, query.id()?).await?;
    Ok(success())
}
