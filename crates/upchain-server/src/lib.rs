//! HTTP upload service for UpChain.
//!
//! Accepts authenticated file uploads, fingerprints their content, records
//! each one as a block on the ledger, and exposes the chain and its
//! validation report for inspection.

pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod store;
pub mod upload;

pub use auth::{AuthProvider, Credentials, TokenAuth};
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use router::{build_router, AppState, UploadLedger};
pub use server::UpchainServer;
pub use store::{InMemoryRecordStore, RecordStore, UploadRecord};
