//! Deterministic weighted sampling over (id, weight) pairs. All procedures
//! take an injected PRNG; identical generator state and inputs produce
//! bit-identical outputs.

use rand::RngCore;
use tangle_types::BlockId;

/// Draw uniformly from `[0, n)` without modulo bias.
///
/// Panics on `n == 0`.
pub fn uniform<R: RngCore + ?Sized>(rng: &mut R, n: u64) -> u64 {
    assert!(n > 0, "uniform bound must be positive");
    if n.is_power_of_two() {
        return rng.next_u64() & (n - 1);
    }
    // Largest value one below a multiple of n; draws above it would skew the
    // modulo toward small residues. For n above 2^63 the subtraction wraps to
    // u64::MAX and no draw is rejected.
    let max = ((1u64 << 63) - 1).wrapping_sub((1u64 << 63) % n);
    let mut v = rng.next_u64();
    while v > max {
        v = rng.next_u64();
    }
    v % n
}

/// Pick an index with probability proportional to its weight.
///
/// Returns `None` when every weight is zero. Panics when the slice lengths
/// differ or the weight sum does not fit in 64 bits; both are caller bugs.
pub fn pick_weighted<R: RngCore + ?Sized>(
    rng: &mut R,
    ids: &[BlockId],
    weights: &[u64],
) -> Option<usize> {
    assert_eq!(
        ids.len(),
        weights.len(),
        "every id needs exactly one weight"
    );

    let mut tot: u64 = 0;
    for &w in weights {
        tot = match tot.checked_add(w) {
            Some(tot) => tot,
            None => panic!("weights too large, sum wraps around u64"),
        };
    }
    if tot == 0 {
        return None;
    }

    let mut r = uniform(rng, tot);
    for (i, &w) in weights.iter().enumerate() {
        if r < w {
            return Some(i);
        }
        r -= w;
    }
    unreachable!("a draw below the total weight always lands in a band")
}

/// Permute `ids` so position 0 is distributed proportionally to `weights`,
/// position 1 proportionally to the remaining weights, and so on.
///
/// Panics if the weights reach all-zero before the output is filled; callers
/// are expected to supply non-zero weights (the graph layer adds one to every
/// child weight).
pub fn weighted_shuffle<R: RngCore + ?Sized>(
    rng: &mut R,
    ids: Vec<BlockId>,
    mut weights: Vec<u64>,
) -> Vec<BlockId> {
    let mut shuffled = Vec::with_capacity(ids.len());
    for _ in 0..ids.len() {
        let picked = match pick_weighted(rng, &ids, &weights) {
            Some(picked) => picked,
            None => panic!("ran out of non-zero weights mid-shuffle"),
        };
        shuffled.push(ids[picked]);
        weights[picked] = 0;
    }
    shuffled
}
