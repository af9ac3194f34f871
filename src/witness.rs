//! Private and public inputs of the in-circuit matching protocol.
//!
//! The server commits to its raw patterns, one leaf `Hash(pattern)` per
//! pattern, wildcards included. A prover holding the client string then
//! needs a pattern, the offset it matches at and the pattern's opening.

use crate::circuit::{CircuitShape, NUM_PUBLIC_INPUTS};
use crate::encoding::{hash_elements, Alphabet};
use crate::error::{MatchError, Result};
use crate::merkle::{verify_inclusion, InclusionProof, MerkleTree};
use crate::utils::field_to_hex;
use log::debug;
use pasta_curves::pallas;
use rayon::prelude::*;
use std::fmt;

/// The secret the prover demonstrates knowledge of: a committed raw pattern
/// and an offset at which it matches the client string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchWitness {
    pub raw_pattern: Vec<pallas::Base>,
    pub offset: usize,
}

/// Values the verifier sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicInputs {
    pub root: pallas::Base,
    pub client_hash: pallas::Base,
}

impl PublicInputs {
    /// The instance column, in the row order the circuit expects.
    pub fn to_instance(&self) -> Vec<pallas::Base> {
        let instance = vec![self.root, self.client_hash];
        debug_assert_eq!(instance.len(), NUM_PUBLIC_INPUTS);
        instance
    }
}

impl fmt::Display for PublicInputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PublicInputs:\n  Root: {}\n  Client hash: {}",
            field_to_hex(self.root),
            field_to_hex(self.client_hash)
        )
    }
}

/// Everything the prover feeds into the circuit.
#[derive(Debug, Clone)]
pub struct ProverInputs {
    pub witness: MatchWitness,
    pub client: Vec<pallas::Base>,
    pub inclusion: InclusionProof,
    pub leaf_count: usize,
}

impl ProverInputs {
    pub fn shape(&self) -> Result<CircuitShape> {
        CircuitShape::new(
            self.leaf_count,
            self.witness.raw_pattern.len(),
            self.client.len(),
        )
    }

    /// The public inputs these private inputs claim.
    pub fn public_inputs(&self) -> PublicInputs {
        PublicInputs {
            root: self.inclusion.root,
            client_hash: hash_elements(&self.client),
        }
    }

    /// # Errors
    /// [`MatchError::MalformedInput`] if any length disagrees with `shape`.
    pub fn check_shape(&self, shape: &CircuitShape) -> Result<()> {
        if self.inclusion.path.is_empty() {
            return Err(MatchError::MalformedInput(
                "inclusion proof has an empty path; it must start with the opened leaf".into(),
            ));
        }
        if self.witness.raw_pattern.len() != shape.pattern_len {
            return Err(MatchError::MalformedInput(format!(
                "pattern has {} symbols, circuit expects {}",
                self.witness.raw_pattern.len(),
                shape.pattern_len
            )));
        }
        if self.client.len() != shape.client_len {
            return Err(MatchError::MalformedInput(format!(
                "client string has {} symbols, circuit expects {}",
                self.client.len(),
                shape.client_len
            )));
        }
        if self.inclusion.siblings().len() != shape.depth() {
            return Err(MatchError::MalformedInput(format!(
                "inclusion proof has {} siblings, circuit expects {}",
                self.inclusion.siblings().len(),
                shape.depth()
            )));
        }
        Ok(())
    }

    /// Evaluates every circuit constraint natively.
    ///
    /// # Errors
    /// [`MatchError::ConstraintInfeasible`] naming the first constraint the
    /// inputs violate, or [`MatchError::MalformedInput`] on a shape mismatch.
    pub fn check(&self, shape: &CircuitShape, wildcard: pallas::Base, public: &PublicInputs) -> Result<()> {
        self.check_shape(shape)?;

        let pattern = &self.witness.raw_pattern;
        if self.witness.offset > shape.max_offset() {
            return Err(MatchError::ConstraintInfeasible(format!(
                "offset {} exceeds maximum {}",
                self.witness.offset,
                shape.max_offset()
            )));
        }
        if !matches_at(pattern, &self.client, self.witness.offset, wildcard) {
            return Err(MatchError::ConstraintInfeasible(format!(
                "pattern does not match the client string at offset {}",
                self.witness.offset
            )));
        }
        if hash_elements(pattern) != self.inclusion.leaf() {
            return Err(MatchError::ConstraintInfeasible(
                "pattern does not hash to the opened leaf".into(),
            ));
        }
        if !verify_inclusion(
            public.root,
            &self.inclusion.path,
            self.inclusion.index,
            self.leaf_count,
        )? {
            return Err(MatchError::ConstraintInfeasible(
                "inclusion proof does not reach the public root".into(),
            ));
        }
        if hash_elements(&self.client) != public.client_hash {
            return Err(MatchError::ConstraintInfeasible(
                "client string does not hash to the public client commitment".into(),
            ));
        }
        Ok(())
    }
}

/// True iff every pattern position is the wildcard or equals the client
/// symbol at `offset + i`.
pub fn matches_at(
    pattern: &[pallas::Base],
    client: &[pallas::Base],
    offset: usize,
    wildcard: pallas::Base,
) -> bool {
    offset + pattern.len() <= client.len()
        && pattern
            .iter()
            .zip(&client[offset..])
            .all(|(p, c)| *p == wildcard || p == c)
}

/// Server-side commitment to raw patterns, one leaf per pattern.
#[derive(Debug, Clone)]
pub struct PatternCommitment {
    patterns: Vec<String>,
    encoded: Vec<Vec<pallas::Base>>,
    tree: MerkleTree,
}

impl PatternCommitment {
    /// Encodes and hashes every pattern, in order, and commits to them.
    ///
    /// # Errors
    /// [`MatchError::Encoding`] for a pattern outside the alphabet or an
    /// empty pattern, [`MatchError::Commitment`] for an empty pattern set.
    pub fn build(patterns: &[&str], alphabet: &Alphabet) -> Result<Self> {
        let encoded = patterns
            .iter()
            .map(|pattern| {
                if pattern.is_empty() {
                    return Err(MatchError::Encoding("patterns cannot be empty".into()));
                }
                alphabet.encode_pattern(pattern)
            })
            .collect::<Result<Vec<_>>>()?;

        let leaves = encoded.par_iter().map(|e| hash_elements(e)).collect();
        let tree = MerkleTree::new(leaves)?;

        Ok(Self {
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            encoded,
            tree,
        })
    }

    pub fn root(&self) -> pallas::Base {
        self.tree.root
    }

    pub fn leaf_count(&self) -> usize {
        self.tree.len()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn tree(&self) -> &MerkleTree {
        &self.tree
    }

    /// The first `(index, offset)` at which a committed pattern matches
    /// `client`, scanning patterns in commitment order and offsets
    /// ascending.
    pub fn find_match(&self, client: &[pallas::Base], wildcard: pallas::Base) -> Option<(usize, usize)> {
        self.encoded.iter().enumerate().find_map(|(index, pattern)| {
            if pattern.len() > client.len() {
                return None;
            }
            (0..=client.len() - pattern.len())
                .find(|&offset| matches_at(pattern, client, offset, wildcard))
                .map(|offset| (index, offset))
        })
    }

    /// Assembles the prover inputs for pattern `index` at `offset`.
    ///
    /// No matching is checked here; the prover checks the inputs before
    /// proving.
    ///
    /// # Errors
    /// [`MatchError::Encoding`] for an invalid client string and
    /// [`MatchError::Commitment`] for an out-of-range index.
    pub fn witness(&self, index: usize, offset: usize, client: &str, alphabet: &Alphabet) -> Result<ProverInputs> {
        let client = alphabet.encode_client_string(client)?;
        let inclusion = self.tree.open(index)?;

        Ok(ProverInputs {
            witness: MatchWitness {
                raw_pattern: self.encoded[index].clone(),
                offset,
            },
            client,
            inclusion,
            leaf_count: self.leaf_count(),
        })
    }

    /// Finds the first match for `client` and assembles its prover inputs.
    ///
    /// # Errors
    /// [`MatchError::NoMatchFound`] if no committed pattern matches.
    pub fn witness_for(&self, client: &str, alphabet: &Alphabet) -> Result<ProverInputs> {
        let encoded = alphabet.encode_client_string(client)?;
        let (index, offset) = self
            .find_match(&encoded, alphabet.wildcard_element())
            .ok_or(MatchError::NoMatchFound)?;

        debug!(
            "Pattern {index} ({:?}) matches at offset {offset}",
            self.patterns[index]
        );
        self.witness(index, offset, client, alphabet)
    }
}
