//! Append-only DAG operations over a store transaction: block insertion with
//! weight and tip maintenance, the generic walk engine, and weighted-random
//! child ordering.

use crate::frontier::Frontier;
use crate::shuffle;
use rand::RngCore;
use std::collections::HashSet;
use tangle_storage::StoreTx;
use tangle_types::{BlockId, BlockMeta};

/// Traversal discipline for [`walk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    BreadthFirst,
    DepthFirst,
}

/// Visitor verdict for the current block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Mark the block visited and expand its look-ahead neighbours.
    Continue,
    /// Leave the block unvisited and expand nothing; the walk moves on.
    SkipNext,
}

/// Append a new block to the DAG.
///
/// `parents` must already exist; the new block becomes a tip and de-tips each
/// parent. Every distinct ancestor's weight rises by one. Panics when `id`
/// already exists, a parent is unknown, or a parent is referenced twice;
/// those are caller bugs.
pub fn append(tx: &mut dyn StoreTx, id: BlockId, data: Vec<u8>, parents: &[BlockId]) {
    if tx.get_data(id).is_some() {
        panic!("block {id} already exists");
    }

    let mut height = 0;
    let mut distinct = HashSet::with_capacity(parents.len());
    for &pid in parents {
        let pmeta = match tx.get_meta(pid) {
            Some(meta) => meta,
            None => panic!("parent {pid} does not exist"),
        };
        if !distinct.insert(pid) {
            panic!("parent {pid} referenced twice");
        }
        height = height.max(pmeta.height + 1);
    }

    tx.set_data(id, data);
    tx.set_tip(id);

    for &pid in parents {
        tx.del_tip(pid);
        let mut children = tx.get_children(pid).to_vec();
        children.push(id);
        tx.set_children(pid, children);
    }
    tx.set_parents(id, parents.to_vec());

    // Each distinct ancestor gains exactly one descendant; the visited set
    // keeps merge paths from counting an ancestor twice.
    let mut frontier = Frontier::new(parents);
    let mut bumped: HashSet<BlockId> = HashSet::new();
    while let Some(aid) = frontier.pop() {
        if !bumped.insert(aid) {
            continue;
        }
        let grandparents = tx.get_parents(aid).to_vec();
        let mut meta = match tx.get_meta(aid) {
            Some(meta) => meta,
            None => panic!("ancestor {aid} has no metadata"),
        };
        meta.weight += 1;
        tx.set_meta(aid, meta);
        frontier.append(&grandparents);
    }

    tx.set_meta(id, BlockMeta::at_height(height));
}

/// Parents of `id` in insertion order.
pub fn parents(tx: &dyn StoreTx, id: BlockId) -> &[BlockId] {
    tx.get_parents(id)
}

/// Children of `id` in append order.
pub fn children(tx: &dyn StoreTx, id: BlockId) -> &[BlockId] {
    tx.get_children(id)
}

/// Cumulative weight of `id`. Panics when the block does not exist.
pub fn weight(tx: &dyn StoreTx, id: BlockId) -> u64 {
    match tx.get_meta(id) {
        Some(meta) => meta.weight,
        None => panic!("block {id} does not exist"),
    }
}

/// Unordered snapshot of the current tips.
pub fn tips(tx: &dyn StoreTx) -> Vec<BlockId> {
    tx.get_tips()
}

/// Block data by id, or `None` if absent.
pub fn get(tx: &dyn StoreTx, id: BlockId) -> Option<&[u8]> {
    tx.get_data(id)
}

/// Walk the graph from `start`.
///
/// `next` produces the look-ahead neighbours of each block (`None` expands
/// nothing). The visitor receives each frontier block along with its
/// look-ahead: [`Step::Continue`] marks it visited (never to be presented
/// again) and enqueues the look-ahead, [`Step::SkipNext`] leaves it unvisited
/// and enqueues nothing, and an error aborts the walk and surfaces unchanged.
/// A frontier id with no stored data panics.
pub fn walk<N, V, E>(
    tx: &dyn StoreTx,
    start: &[BlockId],
    mut next: Option<N>,
    traversal: Traversal,
    mut visit: V,
) -> Result<(), E>
where
    N: FnMut(&dyn StoreTx, BlockId) -> Vec<BlockId>,
    V: FnMut(BlockId, &[u8], BlockMeta, &[BlockId]) -> Result<Step, E>,
{
    let mut frontier = Frontier::new(start);
    let mut visited: HashSet<BlockId> = HashSet::new();

    while let Some(id) = frontier.pop() {
        if visited.contains(&id) {
            continue;
        }

        let data = match tx.get_data(id) {
            Some(data) => data,
            None => panic!("block {id} is not in the store"),
        };
        let meta = match tx.get_meta(id) {
            Some(meta) => meta,
            None => panic!("block {id} has no metadata"),
        };

        let ahead = match next.as_mut() {
            Some(next) => next(tx, id),
            None => Vec::new(),
        };

        match visit(id, data, meta, &ahead)? {
            Step::SkipNext => continue,
            Step::Continue => {}
        }

        visited.insert(id);
        match traversal {
            // Pushing one entry at a time leaves the final look-ahead entry
            // on top of the stack; the rev_* neighbour functions rely on this
            // to expand their heaviest candidate first.
            Traversal::DepthFirst => {
                for &n in &ahead {
                    frontier.prepend(&[n]);
                }
            }
            Traversal::BreadthFirst => frontier.append(&ahead),
        }
    }

    Ok(())
}

/// Children of `id` in weighted-random-shuffle order.
///
/// The children are sorted by id before shuffling, so the outcome depends
/// only on the PRNG state and never on storage order. Each child is weighted
/// by its cumulative weight plus one, keeping every weight non-zero.
pub fn children_wrs<R: RngCore + ?Sized>(
    tx: &dyn StoreTx,
    rng: &mut R,
    id: BlockId,
) -> Vec<BlockId> {
    let mut ids = tx.get_children(id).to_vec();
    ids.sort_unstable();
    let weights: Vec<u64> = ids.iter().map(|&child| weight(tx, child) + 1).collect();
    shuffle::weighted_shuffle(rng, ids, weights)
}

/// [`children_wrs`] reversed. Combined with the depth-first head push this
/// expands the most heavily weighted child first.
pub fn rev_children_wrs<R: RngCore + ?Sized>(
    tx: &dyn StoreTx,
    rng: &mut R,
    id: BlockId,
) -> Vec<BlockId> {
    let mut ids = children_wrs(tx, rng, id);
    ids.reverse();
    ids
}
