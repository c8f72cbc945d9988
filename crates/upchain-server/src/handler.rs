use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use serde_json::json;
use tracing::info;
use upchain_fingerprint::Fingerprint;
use upchain_ledger::{Block, LedgerReader, LedgerWriter, StreamValidator};
use upchain_types::OwnerId;
use uuid::Uuid;

use crate::auth::Credentials;
use crate::error::{ServerError, ServerResult};
use crate::router::AppState;
use crate::store::UploadRecord;
use crate::upload::{file_extension, sanitize_file_name, staging_file_name};

/// Health check handler.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Info handler.
pub async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let head = state.ledger.head();
    Json(json!({
        "name": "upchain-server",
        "version": env!("CARGO_PKG_VERSION"),
        "block_count": state.ledger.block_count(),
        "head_hash": head.map(|b| b.hash),
        "journaled": state.config.journal_path.is_some(),
        "allowed_extensions": state.config.allowed_extensions,
    }))
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> ServerResult<OwnerId> {
    state.auth.authenticate(&Credentials::from_headers(headers)).await
}

/// `PUT /v1/uploads/:file_name`: store the body, fingerprint it, and record it
/// on the chain.
pub async fn upload_handler(
    State(state): State<AppState>,
    Path(raw_name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ServerResult<(StatusCode, Json<UploadRecord>)> {
    let owner = authenticate(&state, &headers).await?;

    let file_name = sanitize_file_name(&raw_name).ok_or_else(|| ServerError::InvalidFileName(raw_name.clone()))?;
    let file_type = file_extension(&file_name)
        .filter(|ext| state.config.is_allowed(ext))
        .ok_or_else(|| ServerError::UnsupportedType(file_name.clone()))?;

    tokio::fs::create_dir_all(&state.config.upload_dir).await?;
    let path = state.config.upload_dir.join(&file_name);
    let staging = state.config.upload_dir.join(staging_file_name(&file_name, Uuid::now_v7()));
    tokio::fs::write(&staging, &body).await?;

    let committed = commit_upload(&state, owner, &file_name, &file_type, &staging, &path).await;
    if committed.is_err() {
        if let Err(e) = tokio::fs::remove_file(&staging).await {
            tracing::debug!(path = %staging.display(), error = %e, "staging file not removed");
        }
    }
    let (fingerprint, block) = committed?;
    let file_path = path.to_string_lossy().into_owned();

    let record = UploadRecord {
        id: Uuid::now_v7(),
        owner_id: owner,
        file_name,
        file_type,
        file_path,
        content_hash: fingerprint.digest,
        block_index: block.index,
        block_hash: block.hash,
        prev_hash: block.prev_hash,
        timestamp: block.timestamp,
    };
    state.records.insert(record.clone()).await?;

    info!(
        owner = %record.owner_id,
        file = %record.file_name,
        bytes = body.len(),
        basis = ?fingerprint.basis,
        index = record.block_index,
        block = record.block_hash.short(),
        "upload recorded"
    );
    Ok((StatusCode::CREATED, Json(record)))
}

/// Fingerprint the staged bytes, then move them into place and chain the
/// upload while holding the commit lock.
async fn commit_upload(
    state: &AppState,
    owner: OwnerId,
    file_name: &str,
    file_type: &str,
    staging: &std::path::Path,
    path: &std::path::Path,
) -> ServerResult<(Fingerprint, Block)> {
    let fingerprinter = state.fingerprinter.clone();
    let (fp_path, fp_type) = (staging.to_path_buf(), file_type.to_string());
    let fingerprint = tokio::task::spawn_blocking(move || fingerprinter.fingerprint_detailed(&fp_path, &fp_type))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;

    let _commit = state.commit_lock.lock().await;
    tokio::fs::rename(staging, path).await?;

    // Journal writes may fsync; keep them off the async workers.
    let ledger = state.ledger.clone();
    let (name, stored_path) = (file_name.to_string(), path.to_string_lossy().into_owned());
    let block = tokio::task::spawn_blocking(move || ledger.append_next(owner, &name, &stored_path))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;
    Ok((fingerprint, block))
}

/// `GET /v1/records`: the caller's uploads whose files are still on disk.
pub async fn records_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ServerResult<Json<Vec<UploadRecord>>> {
    let owner = authenticate(&state, &headers).await?;
    let mut present = Vec::new();
    for record in state.records.list_by_owner(owner).await? {
        if tokio::fs::try_exists(&record.file_path).await.unwrap_or(false) {
            present.push(record);
        } else {
            tracing::debug!(path = %record.file_path, "recorded file missing; omitted");
        }
    }
    Ok(Json(present))
}

/// `GET /v1/chain`: every block, genesis first.
pub async fn chain_handler(State(state): State<AppState>) -> Json<Vec<Block>> {
    Json(state.ledger.read_all())
}

/// `GET /v1/chain/verify`: full validation report for the chain.
pub async fn verify_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let report = StreamValidator::validate(state.ledger.as_ref());
    Json(json!({
        "valid": report.is_valid(),
        "report": report,
    }))
}
