//! DAG consensus substrate: an in-memory, transactional block graph with
//! weighted random walks and tip selection.
//!
//! The [`graph`] operations run over any [`Store`] backend; the [`Tangle`]
//! facade owns the store, assigns monotonic block ids, and drives weighted
//! tip selection from its genesis pair.

pub mod frontier;
pub mod graph;
pub mod shuffle;
pub mod tangle;

pub use tangle::{Tangle, TangleError};

// Storage seam and shared scalars, re-exported so embedders use one crate.
pub use tangle_storage::{MemoryStore, Store, StoreError, StoreTx};
pub use tangle_types::{BlockId, BlockMeta};
