//! Walker options

use serde::{Deserialize, Serialize};

/// Controls optional checks made by the walkers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkOptions {
    /// Check block item counts against `min_items` / `max_items`
    pub enforce_block_item_limits: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            enforce_block_item_limits: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let options: WalkOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, WalkOptions::default());
        assert!(options.enforce_block_item_limits);
    }
}
