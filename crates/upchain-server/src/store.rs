use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use upchain_types::{BlockTimestamp, HexDigest, OwnerId};
use uuid::Uuid;

use crate::error::ServerResult;

/// One accepted upload and the block that records it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub id: Uuid,
    pub owner_id: OwnerId,
    pub file_name: String,
    /// Lowercase extension.
    pub file_type: String,
    pub file_path: String,
    pub content_hash: HexDigest,
    pub block_index: u64,
    pub block_hash: HexDigest,
    pub prev_hash: HexDigest,
    pub timestamp: BlockTimestamp,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert(&self, record: UploadRecord) -> ServerResult<()>;

    /// Records for `owner`, oldest first.
    async fn list_by_owner(&self, owner: OwnerId) -> ServerResult<Vec<UploadRecord>>;
}

#[derive(Default)]
pub struct InMemoryRecordStore {
    records: RwLock<Vec<UploadRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn insert(&self, record: UploadRecord) -> ServerResult<()> {
        self.records.write().await.push(record);
        Ok(())
    }

    async fn list_by_owner(&self, owner: OwnerId) -> ServerResult<Vec<UploadRecord>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.owner_id == owner)
            .cloned()
            .collect())
    }
}
