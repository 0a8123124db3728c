//! Block cursor for range-atomic signal detection.

use serde::{Deserialize, Serialize};

/// Last fully-processed block number.
///
/// Monotonically non-decreasing; advanced only after all signals for a range
/// were extracted successfully. A partial failure mid-range must not advance
/// the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockCursor {
    pub last_block: u64,
}

impl BlockCursor {
    pub fn at(last_block: u64) -> Self {
        Self { last_block }
    }

    /// Advance to `head`, keeping monotonicity even against a reorged head.
    pub fn advanced_to(self, head: u64) -> Self {
        Self {
            last_block: self.last_block.max(head),
        }
    }
}
