use serde::{Deserialize, Serialize};

/// Default cap on how many distinct roles a single drawing may use.
pub const DEFAULT_MAX_ROLE_SLOTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub max_role_slots: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_role_slots: DEFAULT_MAX_ROLE_SLOTS,
        }
    }
}
