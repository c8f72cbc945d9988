use serde::Serialize;

use crate::block::Block;
use crate::traits::LedgerReader;

/// Result of chain validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub block_count: u64,
    pub genesis_valid: bool,
    pub hash_chain_valid: bool,
    pub index_continuous: bool,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Position of the first defective block, if any.
    pub fn first_violation(&self) -> Option<u64> {
        self.violations.iter().map(|v| v.index).min()
    }
}

/// A specific integrity violation detected during validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub index: u64,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    MissingGenesis,
    MalformedGenesis,
    IndexGap,
    HashMismatch,
    HashChainBreak,
}

/// Chain integrity validator.
///
/// Unlike [`Ledger::is_valid`](crate::Ledger::is_valid), which answers yes or
/// no for the blocks after genesis, this walks the whole chain and records
/// every defect it finds.
pub struct StreamValidator;

impl StreamValidator {
    /// Validate everything a reader holds.
    pub fn validate<R: LedgerReader + ?Sized>(reader: &R) -> ValidationReport {
        Self::validate_blocks(&reader.read_all())
    }

    /// Validate a block sequence in index order.
    pub fn validate_blocks(blocks: &[Block]) -> ValidationReport {
        let mut violations = Vec::new();
        let mut genesis_valid = true;
        let mut hash_chain_valid = true;
        let mut index_continuous = true;

        match blocks.first() {
            None => {
                genesis_valid = false;
                violations.push(Violation {
                    index: 0,
                    kind: ViolationKind::MissingGenesis,
                    description: "chain has no genesis block".into(),
                });
            }
            Some(genesis) if !genesis.prev_hash.is_zero() || !genesis.owner_id.is_genesis() => {
                genesis_valid = false;
                violations.push(Violation {
                    index: genesis.index,
                    kind: ViolationKind::MalformedGenesis,
                    description: format!(
                        "genesis must have prev_hash \"0\" and owner 0, found {:?} and {}",
                        genesis.prev_hash.as_str(),
                        genesis.owner_id
                    ),
                });
            }
            Some(_) => {}
        }

        for (position, block) in blocks.iter().enumerate() {
            let expected_index = position as u64;
            if block.index != expected_index {
                index_continuous = false;
                violations.push(Violation {
                    index: expected_index,
                    kind: ViolationKind::IndexGap,
                    description: format!("expected index {expected_index}, found {}", block.index),
                });
            }

            // Recompute and verify hash
            let hash_ok = match block.recompute_hash() {
                Ok(h) => h == block.hash,
                Err(_) => false,
            };
            if !hash_ok {
                if position == 0 {
                    genesis_valid = false;
                } else {
                    hash_chain_valid = false;
                }
                violations.push(Violation {
                    index: expected_index,
                    kind: ViolationKind::HashMismatch,
                    description: "stored hash does not match recomputed hash".into(),
                });
            }

            // Check prev_hash link
            if position > 0 && block.prev_hash != blocks[position - 1].hash {
                hash_chain_valid = false;
                violations.push(Violation {
                    index: expected_index,
                    kind: ViolationKind::HashChainBreak,
                    description: format!(
                        "prev_hash {} does not match hash {} of block {}",
                        block.prev_hash.short(),
                        blocks[position - 1].hash.short(),
                        position - 1
                    ),
                });
            }
        }

        ValidationReport {
            block_count: blocks.len() as u64,
            genesis_valid,
            hash_chain_valid,
            index_continuous,
            violations,
        }
    }
}
