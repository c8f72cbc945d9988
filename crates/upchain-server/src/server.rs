use std::sync::Arc;

use tokio::net::TcpListener;
use upchain_fingerprint::ContentFingerprinter;
use upchain_journal::DurableLedger;
use upchain_ledger::{Ledger, LedgerReader};

use crate::auth::TokenAuth;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::{build_router, AppState, UploadLedger};
use crate::store::InMemoryRecordStore;

/// UpChain upload server.
pub struct UpchainServer {
    state: AppState,
}

impl UpchainServer {
    /// Assemble the service from its configuration.
    ///
    /// With `journal_path` set the chain is recovered from (and appended to)
    /// that journal; otherwise it starts from a fresh genesis block in memory.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let ledger: Arc<dyn UploadLedger> = match &config.journal_path {
            Some(path) => Arc::new(DurableLedger::open(path, config.journal.clone())?),
            None => Arc::new(Ledger::new()?),
        };
        tracing::info!(
            blocks = ledger.block_count(),
            journal = ?config.journal_path,
            "ledger ready"
        );

        let state = AppState {
            fingerprinter: Arc::new(ContentFingerprinter::new().with_chunk_size(config.hash_chunk_size)),
            auth: Arc::new(TokenAuth::new(config.tokens.clone())),
            records: Arc::new(InMemoryRecordStore::new()),
            commit_lock: Arc::default(),
            ledger,
            config: Arc::new(config),
        };
        Ok(Self { state })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let bind_addr = self.state.config.bind_addr;
        let app = build_router(self.state);
        let listener = TcpListener::bind(bind_addr).await?;
        tracing::info!("UpChain server listening on {bind_addr}");
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use upchain_ledger::LedgerWriter;
    use upchain_types::OwnerId;

    use super::*;

    #[test]
    fn in_memory_server_starts_with_genesis() {
        let server = UpchainServer::new(ServerConfig::default()).unwrap();
        assert_eq!(server.config().bind_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(server.state().ledger.block_count(), 1);
        let _router = server.router();
    }

    #[test]
    fn journaled_server_recovers_chain() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            journal_path: Some(dir.path().join("chain.journal")),
            ..ServerConfig::default()
        };

        {
            let server = UpchainServer::new(config.clone()).unwrap();
            server
                .state()
                .ledger
                .append_next(OwnerId::new(5), "a.txt", "/u/a.txt")
                .unwrap();
        }

        let server = UpchainServer::new(config).unwrap();
        let ledger = &server.state().ledger;
        assert_eq!(ledger.block_count(), 2);
        assert_eq!(ledger.head().unwrap().owner_id, OwnerId::new(5));
    }
}
