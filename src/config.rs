use serde::{Deserialize, Serialize};

/// ledger service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// attempts at the optimistic append before giving up with
    /// ConcurrentModification
    pub max_conflict_retries: u32,
}

impl LedgerConfig {
    pub fn new(max_conflict_retries: u32) -> Self {
        Self {
            max_conflict_retries,
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: 3,
        }
    }
}
