//! Tangle storage abstraction layer. Defines the `Store` and `StoreTx` traits
//! shared by every graph operation, plus the in-memory `MemoryStore` backend
//! whose transactions are reader/writer lock guards. Persistent backends plug
//! in by implementing the same two traits.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::{HashMap, HashSet};
use tangle_types::{BlockId, BlockMeta};

/// Storage errors
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Reserved for backends with real durability; the in-memory store never
    /// constructs it.
    #[error("commit failed: {0}")]
    Commit(String),
}

/// A scoped acquisition of the graph's state tables.
///
/// Accessors are primitive and unchecked: they maintain no graph invariants
/// and trust the caller (the graph layer) to keep the tables consistent.
/// Reads are valid on any transaction; mutation through a read transaction is
/// a caller bug and panics. Committing consumes the transaction and releases
/// its locks.
pub trait StoreTx {
    fn get_meta(&self, id: BlockId) -> Option<BlockMeta>;
    fn set_meta(&mut self, id: BlockId, meta: BlockMeta);
    fn get_data(&self, id: BlockId) -> Option<&[u8]>;
    fn set_data(&mut self, id: BlockId, data: Vec<u8>);
    /// Unordered snapshot of the ids that currently have no children.
    fn get_tips(&self) -> Vec<BlockId>;
    fn set_tip(&mut self, id: BlockId);
    /// Removing an id that is not a tip is a no-op.
    fn del_tip(&mut self, id: BlockId);
    /// Parent ids in insertion order; absent ids read as empty.
    fn get_parents(&self, id: BlockId) -> &[BlockId];
    fn set_parents(&mut self, id: BlockId, parents: Vec<BlockId>);
    /// Child ids in append order; absent ids read as empty.
    fn get_children(&self, id: BlockId) -> &[BlockId];
    fn set_children(&mut self, id: BlockId, children: Vec<BlockId>);
    fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// Transaction factory over a graph state backend.
///
/// A write transaction (`update = true`) is mutually exclusive with all other
/// transactions; read transactions run concurrently with each other.
pub trait Store {
    fn begin(&self, update: bool) -> Box<dyn StoreTx + '_>;
}

#[derive(Default)]
struct Tables {
    data: HashMap<BlockId, Vec<u8>>,
    meta: HashMap<BlockId, BlockMeta>,
    parents: HashMap<BlockId, Vec<BlockId>>,
    children: HashMap<BlockId, Vec<BlockId>>,
    tips: HashSet<BlockId>,
}

/// In-memory backend
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn begin(&self, update: bool) -> Box<dyn StoreTx + '_> {
        let guard = if update {
            Guard::Write(self.tables.write())
        } else {
            Guard::Read(self.tables.read())
        };
        Box::new(MemoryTx { guard })
    }
}

enum Guard<'a> {
    Read(RwLockReadGuard<'a, Tables>),
    Write(RwLockWriteGuard<'a, Tables>),
}

/// An atomic interaction with the in-memory store. Holds the lock guard for
/// its lifetime; dropping or committing releases it.
pub struct MemoryTx<'a> {
    guard: Guard<'a>,
}

impl MemoryTx<'_> {
    fn tables(&self) -> &Tables {
        match &self.guard {
            Guard::Read(guard) => guard,
            Guard::Write(guard) => guard,
        }
    }

    fn tables_mut(&mut self) -> &mut Tables {
        match &mut self.guard {
            Guard::Write(guard) => guard,
            Guard::Read(_) => panic!("state mutation through a read transaction"),
        }
    }
}

impl StoreTx for MemoryTx<'_> {
    fn get_meta(&self, id: BlockId) -> Option<BlockMeta> {
        self.tables().meta.get(&id).copied()
    }

    fn set_meta(&mut self, id: BlockId, meta: BlockMeta) {
        self.tables_mut().meta.insert(id, meta);
    }

    fn get_data(&self, id: BlockId) -> Option<&[u8]> {
        self.tables().data.get(&id).map(Vec::as_slice)
    }

    fn set_data(&mut self, id: BlockId, data: Vec<u8>) {
        self.tables_mut().data.insert(id, data);
    }

    fn get_tips(&self) -> Vec<BlockId> {
        self.tables().tips.iter().copied().collect()
    }

    fn set_tip(&mut self, id: BlockId) {
        self.tables_mut().tips.insert(id);
    }

    fn del_tip(&mut self, id: BlockId) {
        self.tables_mut().tips.remove(&id);
    }

    fn get_parents(&self, id: BlockId) -> &[BlockId] {
        self.tables().parents.get(&id).map_or(&[], Vec::as_slice)
    }

    fn set_parents(&mut self, id: BlockId, parents: Vec<BlockId>) {
        self.tables_mut().parents.insert(id, parents);
    }

    fn get_children(&self, id: BlockId) -> &[BlockId] {
        self.tables().children.get(&id).map_or(&[], Vec::as_slice)
    }

    fn set_children(&mut self, id: BlockId, children: Vec<BlockId>) {
        self.tables_mut().children.insert(id, children);
    }

    fn commit(self: Box<Self>) -> Result<(), StoreError> {
        drop(self);
        Ok(())
    }
}
