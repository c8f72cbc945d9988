use upchain_crypto::HasherError;

/// Errors produced by ledger operations.
///
/// The ledger never rejects an append on content grounds; these only cover
/// encoding failures and a persistence layer refusing a block.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("cannot restore a ledger from an empty block list")]
    EmptyChain,

    #[error("persistence error: {0}")]
    Persistence(String),
}

impl From<HasherError> for LedgerError {
    fn from(err: HasherError) -> Self {
        match err {
            HasherError::Serialization(msg) => Self::Serialization(msg),
        }
    }
}
