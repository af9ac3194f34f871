//! Binary Merkle commitment over field elements.
//!
//! Interior nodes are `Poseidon(left, right)`. When the number of leaves is
//! not a power of two the leaf level is padded with the zero element up to
//! the next power of two, so a tree over `n` leaves always has depth
//! `ceil(log2(n))` and every inclusion proof has `depth + 1` path entries.

use crate::error::{MatchError, Result};
use crate::utils::{ceil_log2, field_to_hex, poseidon_hash};
use log::debug;
use pasta_curves::group::ff::Field;
use pasta_curves::pallas;
use rayon::prelude::*;
use std::fmt;

/// Value used to fill the leaf level up to a power of two.
pub const PADDING_LEAF: pallas::Base = <pallas::Base as Field>::ZERO;

/// An opening of one leaf.
///
/// `path[0]` is the opened leaf value and `path[1..]` are the sibling hashes
/// from the leaf level up to just below the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InclusionProof {
    pub root: pallas::Base,
    pub path: Vec<pallas::Base>,
    pub index: usize,
}

/// A binary Merkle tree.
///
/// Leaf order is fixed at construction; the index of a leaf is part of what
/// an inclusion proof attests to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    pub root: pallas::Base,
    pub leaves: Vec<pallas::Base>,
    levels: Vec<Vec<pallas::Base>>,
}

impl MerkleTree {
    /// Builds the tree bottom-up from already hashed leaves.
    ///
    /// Each level is reduced in parallel; a level depends only on the one
    /// below it.
    ///
    /// # Errors
    /// Returns [`MatchError::Commitment`] for an empty leaf set.
    pub fn new(leaves: Vec<pallas::Base>) -> Result<Self> {
        if leaves.is_empty() {
            return Err(MatchError::Commitment(
                "cannot build a Merkle tree with no leaves".into(),
            ));
        }

        let depth = ceil_log2(leaves.len());
        let mut level = leaves.clone();
        level.resize(1usize << depth, PADDING_LEAF);

        let mut levels = Vec::with_capacity(depth as usize + 1);
        while level.len() > 1 {
            let next: Vec<_> = level
                .par_chunks(2)
                .map(|pair| poseidon_hash(pair[0], pair[1]))
                .collect();
            levels.push(std::mem::replace(&mut level, next));
        }
        let root = level[0];
        levels.push(level);

        debug!(
            "Built Merkle tree over {} leaves (depth {depth}), root {}",
            leaves.len(),
            field_to_hex(root)
        );

        Ok(MerkleTree {
            root,
            leaves,
            levels,
        })
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    /// Opens the leaf at `index`.
    ///
    /// # Errors
    /// Returns [`MatchError::Commitment`] if `index` is out of range.
    pub fn open(&self, index: usize) -> Result<InclusionProof> {
        if index >= self.leaves.len() {
            return Err(MatchError::Commitment(format!(
                "leaf index {index} out of range for {} leaves",
                self.leaves.len()
            )));
        }

        let mut path = Vec::with_capacity(self.depth() + 1);
        path.push(self.leaves[index]);

        let mut position = index;
        for level in &self.levels[..self.depth()] {
            path.push(level[position ^ 1]);
            position >>= 1;
        }

        Ok(InclusionProof {
            root: self.root,
            path,
            index,
        })
    }

    /// Verifies a proof against this tree's root and leaf count.
    pub fn verify_proof(&self, proof: &InclusionProof) -> bool {
        proof.root == self.root
            && matches!(
                verify_inclusion(self.root, &proof.path, proof.index, self.leaves.len()),
                Ok(true)
            )
    }
}

impl InclusionProof {
    /// The opened leaf value.
    pub fn leaf(&self) -> pallas::Base {
        self.path[0]
    }

    pub fn siblings(&self) -> &[pallas::Base] {
        &self.path[1..]
    }

    /// Direction bits of the index, least significant (leaf level) first.
    /// `true` means the running node is the right child at that level.
    pub fn index_bits(&self) -> Vec<bool> {
        (0..self.siblings().len())
            .map(|level| (self.index >> level) & 1 == 1)
            .collect()
    }

    pub fn verify(&self, leaf_count: usize) -> Result<bool> {
        verify_inclusion(self.root, &self.path, self.index, leaf_count)
    }
}

/// Recomputes the root from `path`, combining with each sibling on the side
/// chosen by the corresponding bit of `index`.
///
/// # Errors
/// An `index` outside `[0, leaf_count)` is a caller error and yields
/// [`MatchError::Commitment`]. A path of the wrong length for `leaf_count`
/// is an invalid proof and yields `Ok(false)`.
pub fn verify_inclusion(
    root: pallas::Base,
    path: &[pallas::Base],
    index: usize,
    leaf_count: usize,
) -> Result<bool> {
    if index >= leaf_count {
        return Err(MatchError::Commitment(format!(
            "leaf index {index} out of range for {leaf_count} leaves"
        )));
    }

    let depth = ceil_log2(leaf_count) as usize;
    if path.len() != depth + 1 {
        debug!(
            "Rejecting inclusion proof: path length {} but depth {depth}",
            path.len()
        );
        return Ok(false);
    }

    let mut current = path[0];
    let mut position = index;
    for sibling in &path[1..] {
        current = if position & 1 == 0 {
            poseidon_hash(current, *sibling)
        } else {
            poseidon_hash(*sibling, current)
        };
        position >>= 1;
    }

    Ok(current == root)
}

impl fmt::Display for InclusionProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InclusionProof:\n  Leaf: {}\n  Root: {}\n  Index: {}\n  Siblings: {}",
            field_to_hex(self.leaf()),
            field_to_hex(self.root),
            self.index,
            self.siblings().len()
        )
    }
}
