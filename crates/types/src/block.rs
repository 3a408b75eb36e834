use serde::{Deserialize, Serialize};

/// Unique identifier for a block within one tangle.
///
/// The facade allocates these monotonically starting from 1 and never reuses
/// one; graph-level callers may supply arbitrary values.
pub type BlockId = u64;

/// Per-block bookkeeping maintained by the graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMeta {
    /// Count of distinct blocks that transitively reference this one.
    pub weight: u64,
    /// Longest parent-chain depth, with parentless blocks at 0.
    pub height: u64,
}

impl BlockMeta {
    /// Metadata for a freshly appended block at the given height.
    pub fn at_height(height: u64) -> Self {
        Self { weight: 0, height }
    }
}
