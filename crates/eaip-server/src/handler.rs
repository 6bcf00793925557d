use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use eaip_history::{ChainReport, ChangeSet, HistoryError, Snapshot, SnapshotMeta};
use eaip_types::{Document, DocumentContent, DocumentId, OrganizationId, VersionId};

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PutDocumentRequest {
    /// Required when the document does not exist yet.
    #[serde(default)]
    pub organization: Option<OrganizationId>,
    pub content: DocumentContent,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateSnapshotRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct RestoreRequest {
    pub version: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CompareQuery {
    pub from: String,
    pub to: String,
}

fn parse_document(raw: &str) -> ServerResult<DocumentId> {
    raw.parse()
        .map_err(|e| ServerError::BadRequest(format!("document id {raw:?}: {e}")))
}

fn parse_version(raw: &str) -> ServerResult<VersionId> {
    VersionId::from_hex(raw)
        .map_err(|e| ServerError::BadRequest(format!("version id {raw:?}: {e}")))
}

/// Health check handler.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Info handler.
pub async fn info_handler() -> Json<serde_json::Value> {
    Json(json!({
        "name": "eaip-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Write live document content. Creates the document on first write; a
/// document never changes organization.
pub async fn put_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<PutDocumentRequest>,
) -> ServerResult<Json<Document>> {
    let id = parse_document(&id)?;
    let actor = state.actor(&headers).await?;

    let mut document = match state.history.document(&id) {
        Ok(mut existing) => {
            if let Some(organization) = request.organization {
                existing.organization = organization;
            }
            existing.content = request.content;
            existing
        }
        Err(HistoryError::DocumentNotFound(_)) => {
            let organization = request.organization.ok_or_else(|| {
                ServerError::BadRequest("organization is required for a new document".into())
            })?;
            Document::new(id, organization, request.content)
        }
        Err(err) => return Err(err.into()),
    };
    document.updated_at = Utc::now();
    document.updated_by = Some(actor.id);

    state.history.put_document(&document)?;
    debug!(document = %id, actor = %actor.id, "live document written");
    Ok(Json(state.history.document(&id)?))
}

pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<Document>> {
    let id = parse_document(&id)?;
    Ok(Json(state.history.document(&id)?))
}

pub async fn create_snapshot(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<CreateSnapshotRequest>,
) -> ServerResult<(StatusCode, Json<Snapshot>)> {
    let id = parse_document(&id)?;
    let actor = state.actor(&headers).await?;
    let snapshot = state.history.create_snapshot(&id, &actor, &request.message)?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

pub async fn list_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> ServerResult<Json<Vec<SnapshotMeta>>> {
    let id = parse_document(&id)?;
    Ok(Json(state.history.history(&id, query.limit)?))
}

pub async fn get_snapshot(
    State(state): State<AppState>,
    Path((id, version)): Path<(String, String)>,
    headers: HeaderMap,
) -> ServerResult<Json<Snapshot>> {
    let id = parse_document(&id)?;
    let version = parse_version(&version)?;
    let actor = state.actor(&headers).await?;
    Ok(Json(state.history.snapshot(&id, &version, &actor)?))
}

pub async fn compare_versions(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<CompareQuery>,
    headers: HeaderMap,
) -> ServerResult<Json<ChangeSet>> {
    let id = parse_document(&id)?;
    let from = parse_version(&query.from)?;
    let to = parse_version(&query.to)?;
    let actor = state.actor(&headers).await?;
    let set = state.history.compare(&id, &from, &to, &actor)?;
    Ok(Json(ChangeSet::clone(&set)))
}

/// Changes introduced by the head snapshot; 204 when there is no predecessor.
pub async fn compare_previous(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ServerResult<Response> {
    let id = parse_document(&id)?;
    let actor = state.actor(&headers).await?;
    Ok(match state.history.compare_with_previous(&id, &actor)? {
        Some(set) => Json(ChangeSet::clone(&set)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

pub async fn compare_live(
    State(state): State<AppState>,
    Path((id, version)): Path<(String, String)>,
    headers: HeaderMap,
) -> ServerResult<Json<ChangeSet>> {
    let id = parse_document(&id)?;
    let version = parse_version(&version)?;
    let actor = state.actor(&headers).await?;
    Ok(Json(state.history.compare_with_live(&id, &version, &actor)?))
}

pub async fn restore_version(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<RestoreRequest>,
) -> ServerResult<(StatusCode, Json<Snapshot>)> {
    let id = parse_document(&id)?;
    let version = parse_version(&request.version)?;
    let actor = state.actor(&headers).await?;
    let snapshot = state.history.restore(&id, &version, &actor)?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

pub async fn validate_chain(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<ChainReport>> {
    let id = parse_document(&id)?;
    Ok(Json(state.history.validate(&id)?))
}
