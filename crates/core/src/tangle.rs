//! High-level tangle facade: genesis initialisation, block ingestion with
//! monotonic id assignment, and weighted tip selection.

use crate::graph::{self, Step, Traversal};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tangle_storage::{MemoryStore, Store, StoreError, StoreTx};
use tangle_types::BlockId;
use tracing::{debug, trace};

/// Errors surfaced by the tangle facade.
#[derive(thiserror::Error, Debug)]
pub enum TangleError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("render error: {0}")]
    Io(#[from] io::Error),
}

/// The consensus data structure: a block DAG rooted at two genesis blocks.
///
/// Owns the store and the id allocator; all selection randomness derives from
/// the master seed, so two tangles built with the same seed and the same
/// operation sequence behave identically.
pub struct Tangle {
    store: Arc<dyn Store + Send + Sync>,
    genesis: [BlockId; 2],
    seed: u64,
    next_id: AtomicU64,
    walk_epoch: AtomicU64,
}

impl Tangle {
    /// Create a tangle over the in-memory store and ingest the genesis pair.
    pub fn new(seed: u64) -> Result<Self, TangleError> {
        Self::with_store(Arc::new(MemoryStore::new()), seed)
    }

    /// Create a tangle over a caller-supplied store backend.
    pub fn with_store(
        store: Arc<dyn Store + Send + Sync>,
        seed: u64,
    ) -> Result<Self, TangleError> {
        let mut tangle = Self {
            store,
            genesis: [0, 0],
            seed,
            next_id: AtomicU64::new(0),
            walk_epoch: AtomicU64::new(0),
        };

        let mut tx = tangle.store.begin(true);
        let first = tangle.append_next(tx.as_mut(), vec![0x01], &[]);
        let second = tangle.append_next(tx.as_mut(), vec![0x02], &[]);
        tx.commit()?;
        tangle.genesis = [first, second];

        debug!("tangle initialised, genesis blocks {first} and {second}");
        Ok(tangle)
    }

    /// The genesis block ids in insertion order.
    pub fn genesis(&self) -> [BlockId; 2] {
        self.genesis
    }

    /// Ingest a block: allocate the next id, append it under a write
    /// transaction, commit. Returns the assigned id.
    pub fn receive_block(&self, data: Vec<u8>, parents: &[BlockId]) -> Result<BlockId, TangleError> {
        let mut tx = self.store.begin(true);
        let id = self.append_next(tx.as_mut(), data, parents);
        tx.commit()?;
        trace!("block {id} appended with {} parent(s)", parents.len());
        Ok(id)
    }

    /// Block data by id, or `None` if the tangle does not contain it.
    pub fn get(&self, id: BlockId) -> Result<Option<Vec<u8>>, TangleError> {
        let tx = self.store.begin(false);
        let data = graph::get(tx.as_ref(), id).map(|data| data.to_vec());
        tx.commit()?;
        Ok(data)
    }

    /// Select tips by repeated weighted depth-first walks from genesis.
    ///
    /// Walks until `n` distinct childless blocks are held or `max` walks have
    /// run, whichever comes first, and returns the collected set sorted
    /// ascending. A single walk can collect more than `n` tips.
    pub fn select_tips(&self, n: usize, max: usize) -> Result<Vec<BlockId>, TangleError> {
        let tx = self.store.begin(false);
        let mut rng = self.walk_rng();
        let mut found: HashSet<BlockId> = HashSet::new();

        for _ in 0..max {
            if found.len() >= n {
                break;
            }
            graph::walk(
                tx.as_ref(),
                &self.genesis,
                Some(|tx: &dyn StoreTx, id: BlockId| graph::rev_children_wrs(tx, &mut rng, id)),
                Traversal::DepthFirst,
                |id, _, _, ahead| {
                    if ahead.is_empty() {
                        found.insert(id);
                    }
                    Ok::<_, TangleError>(Step::Continue)
                },
            )?;
        }
        tx.commit()?;

        let mut selected: Vec<BlockId> = found.into_iter().collect();
        selected.sort_unstable();
        debug!("selected {} tip(s)", selected.len());
        Ok(selected)
    }

    /// Render the tangle as a Graphviz digraph, mainly for debugging.
    pub fn draw<W: io::Write>(&self, w: &mut W) -> Result<(), TangleError> {
        let tx = self.store.begin(false);
        let mut rng = self.walk_rng();

        writeln!(w, "digraph {{")?;
        graph::walk(
            tx.as_ref(),
            &self.genesis,
            Some(|tx: &dyn StoreTx, id: BlockId| graph::rev_children_wrs(tx, &mut rng, id)),
            Traversal::DepthFirst,
            |id, _, _, ahead| {
                writeln!(w, "\t\"{id}\" [shape=box];")?;
                for child in ahead {
                    writeln!(w, "\t\"{id}\" -> \"{child}\";")?;
                }
                Ok::<_, TangleError>(Step::Continue)
            },
        )?;
        writeln!(w, "}}")?;
        tx.commit()?;
        Ok(())
    }

    /// Allocate the next monotonic id and append under the caller's write
    /// transaction, keeping ids gapless even under contention.
    fn append_next(&self, tx: &mut dyn StoreTx, data: Vec<u8>, parents: &[BlockId]) -> BlockId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        graph::append(tx, id, data, parents);
        id
    }

    /// One generator per walk sequence, derived from the master seed and a
    /// counter; selection stays deterministic without a shared PRNG lock.
    fn walk_rng(&self) -> StdRng {
        let epoch = self.walk_epoch.fetch_add(1, Ordering::SeqCst);
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(&epoch.to_le_bytes());
        StdRng::from_seed(*hasher.finalize().as_bytes())
    }
}
