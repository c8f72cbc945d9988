use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, put};
use axum::Router;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use upchain_fingerprint::ContentFingerprinter;
use upchain_ledger::{LedgerReader, LedgerWriter};

use crate::auth::AuthProvider;
use crate::config::ServerConfig;
use crate::handler;
use crate::store::RecordStore;

/// A chain the service can both append to and read back.
pub trait UploadLedger: LedgerReader + LedgerWriter {}

impl<T: LedgerReader + LedgerWriter> UploadLedger for T {}

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub ledger: Arc<dyn UploadLedger>,
    pub fingerprinter: Arc<ContentFingerprinter>,
    pub auth: Arc<dyn AuthProvider>,
    pub records: Arc<dyn RecordStore>,
    /// Held while an upload is moved into place and chained, so the file on
    /// disk always belongs to the newest block that names it.
    pub commit_lock: Arc<Mutex<()>>,
}

/// Build the axum router with all UpChain endpoints.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_size;
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route("/v1/uploads/:file_name", put(handler::upload_handler))
        .route("/v1/records", get(handler::records_handler))
        .route("/v1/chain", get(handler::chain_handler))
        .route("/v1/chain/verify", get(handler::verify_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
