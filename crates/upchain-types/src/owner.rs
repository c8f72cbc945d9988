use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of the user that owns an uploaded file.
///
/// Owner `0` is reserved for the genesis block, which is never a real upload.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(u64);

impl OwnerId {
    /// The owner recorded on the genesis block.
    pub const GENESIS: Self = Self(0);

    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub fn is_genesis(self) -> bool {
        self == Self::GENESIS
    }
}

impl fmt::Debug for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OwnerId({})", self.0)
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for OwnerId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl FromStr for OwnerId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_owner_is_zero() {
        assert_eq!(OwnerId::GENESIS.get(), 0);
        assert!(OwnerId::GENESIS.is_genesis());
        assert!(!OwnerId::new(1).is_genesis());
    }

    #[test]
    fn parses_from_string() {
        assert_eq!(" 42 ".parse::<OwnerId>().unwrap(), OwnerId::new(42));
        assert!("alice".parse::<OwnerId>().is_err());
    }

    #[test]
    fn serializes_as_integer() {
        assert_eq!(serde_json::to_string(&OwnerId::new(7)).unwrap(), "7");
        let parsed: OwnerId = serde_json::from_str("7").unwrap();
        assert_eq!(parsed, OwnerId::new(7));
    }
}
