//! Expansion-based matching.
//!
//! Wildcard and offset matching is turned into exact matching: every pattern
//! is padded to the client string's length at every possible offset, each
//! wildcard is replaced by every alphabet symbol, and the resulting universe
//! of concrete strings is committed to. The prover opens the leaf equal to
//! `Hash(client)`; the verifier only checks that equality and Merkle
//! membership, so no circuit is involved.
//!
//! The universe has `(maxOffset + 1) * |alphabet|^(wildcards + maxOffset)`
//! members per pattern. Its size is computed up front and checked against a
//! configured limit before anything is enumerated.

use crate::encoding::Alphabet;
use crate::error::{MatchError, Result};
use crate::merkle::{verify_inclusion, InclusionProof, MerkleTree};
use crate::utils::field_to_hex;
use log::{debug, info};
use rayon::prelude::*;
use std::time::Instant;

/// Default bound on the number of expanded leaves.
pub const DEFAULT_MAX_LEAVES: u64 = 1 << 20;

/// Pads `pattern` with `i` leading and `max_offset - i` trailing wildcards
/// for every `i` in `[0, max_offset]`.
pub fn expand_offset(pattern: &str, max_offset: usize, wildcard: u8) -> Vec<String> {
    let wildcard = (wildcard as char).to_string();
    (0..=max_offset)
        .map(|i| {
            format!(
                "{}{}{}",
                wildcard.repeat(i),
                pattern,
                wildcard.repeat(max_offset - i)
            )
        })
        .collect()
}

/// Every concrete string consistent with `variant`, in lexicographic order
/// of the alphabet with the first position most significant.
pub fn expand_wildcards(variant: &str, alphabet: &Alphabet) -> Vec<String> {
    let mut expanded = vec![String::with_capacity(variant.len())];
    for symbol in variant.bytes() {
        if symbol == alphabet.wildcard() {
            expanded = expanded
                .iter()
                .flat_map(|prefix| {
                    alphabet.symbols().iter().map(move |&choice| {
                        let mut next = prefix.clone();
                        next.push(choice as char);
                        next
                    })
                })
                .collect();
        } else {
            for prefix in &mut expanded {
                prefix.push(symbol as char);
            }
        }
    }
    expanded
}

/// All offsets and all wildcard instantiations of one pattern against a
/// client string of length `client_len`. Empty if the pattern is longer.
pub fn expand_pattern(pattern: &str, client_len: usize, alphabet: &Alphabet) -> Vec<String> {
    let Some(max_offset) = client_len.checked_sub(pattern.len()) else {
        return Vec::new();
    };
    expand_offset(pattern, max_offset, alphabet.wildcard())
        .iter()
        .flat_map(|variant| expand_wildcards(variant, alphabet))
        .collect()
}

/// Exact number of strings [`expand_pattern`] yields, or `None` on overflow.
pub fn pattern_expansion_size(
    pattern: &str,
    client_len: usize,
    alphabet: &Alphabet,
) -> Option<u128> {
    let Some(max_offset) = client_len.checked_sub(pattern.len()) else {
        return Some(0);
    };
    let wildcards = pattern
        .bytes()
        .filter(|&symbol| symbol == alphabet.wildcard())
        .count();
    let free_positions = u32::try_from(wildcards + max_offset).ok()?;

    (alphabet.len() as u128)
        .checked_pow(free_positions)?
        .checked_mul(max_offset as u128 + 1)
}

/// Size of the whole expanded universe, or `None` on overflow.
pub fn expansion_size(patterns: &[&str], client_len: usize, alphabet: &Alphabet) -> Option<u128> {
    patterns.iter().try_fold(0u128, |total, pattern| {
        total.checked_add(pattern_expansion_size(pattern, client_len, alphabet)?)
    })
}

/// Commitment to the expanded universe of a pattern set.
#[derive(Debug, Clone)]
pub struct ExpandedCommitment {
    expanded: Vec<String>,
    tree: MerkleTree,
}

impl ExpandedCommitment {
    /// Expands `patterns` for a client string of length `client_len` and
    /// commits to the result.
    ///
    /// # Errors
    /// * [`MatchError::Encoding`] if a pattern holds a symbol outside the
    ///   alphabet.
    /// * [`MatchError::ExpansionOverflow`] if the universe would exceed
    ///   `max_leaves`; nothing is enumerated in that case.
    /// * [`MatchError::Commitment`] if no pattern fits the client length.
    pub fn build(
        patterns: &[&str],
        client_len: usize,
        alphabet: &Alphabet,
        max_leaves: u64,
    ) -> Result<Self> {
        for pattern in patterns {
            alphabet.validate_pattern(pattern)?;
        }

        let required = expansion_size(patterns, client_len, alphabet).ok_or(
            MatchError::ExpansionOverflow {
                required: u128::MAX,
                limit: max_leaves,
            },
        )?;
        if required > max_leaves as u128 {
            return Err(MatchError::ExpansionOverflow {
                required,
                limit: max_leaves,
            });
        }
        debug!(
            "Expanding {} patterns into {required} leaves for client length {client_len}",
            patterns.len()
        );

        let expanded: Vec<String> = patterns
            .iter()
            .flat_map(|pattern| expand_pattern(pattern, client_len, alphabet))
            .collect();

        let hashed = expanded
            .par_iter()
            .map(|candidate| alphabet.hash_client_string(candidate))
            .collect::<Result<Vec<_>>>()?;

        let tree = MerkleTree::new(hashed)?;
        Ok(Self { expanded, tree })
    }

    pub fn root(&self) -> pasta_curves::pallas::Base {
        self.tree.root
    }

    pub fn leaf_count(&self) -> usize {
        self.tree.len()
    }

    pub fn expanded(&self) -> &[String] {
        &self.expanded
    }

    pub fn tree(&self) -> &MerkleTree {
        &self.tree
    }

    /// Index of the first expanded string equal to `client`.
    pub fn find(&self, client: &str) -> Option<usize> {
        self.expanded.iter().position(|candidate| candidate == client)
    }

    /// Opens the leaf equal to `client`.
    ///
    /// # Errors
    /// [`MatchError::NoMatchFound`] if the client string is not in the
    /// expanded universe.
    pub fn prove(&self, client: &str) -> Result<InclusionProof> {
        let start = Instant::now();
        let index = self.find(client).ok_or(MatchError::NoMatchFound)?;
        let proof = self.tree.open(index)?;
        info!("Expansion prover time: {:?}", start.elapsed());
        Ok(proof)
    }
}

/// Checks that `proof` opens `Hash(client)` under `root`.
///
/// Returns `Ok(false)` for a proof that does not verify; errors are reserved
/// for malformed inputs (a client string outside the alphabet or an index
/// outside `[0, leaf_count)`).
pub fn verify_expanded(
    alphabet: &Alphabet,
    root: pasta_curves::pallas::Base,
    client: &str,
    proof: &InclusionProof,
    leaf_count: usize,
) -> Result<bool> {
    let start = Instant::now();
    let client_hash = alphabet.hash_client_string(client)?;

    if proof.path.first() != Some(&client_hash) {
        debug!(
            "Opened leaf does not equal client hash {}",
            field_to_hex(client_hash)
        );
        return Ok(false);
    }

    let accepted = verify_inclusion(root, &proof.path, proof.index, leaf_count)?;
    info!("Expansion verifier time: {:?}", start.elapsed());
    Ok(accepted)
}

/// Like [`verify_expanded`] but turns a refused proof into
/// [`MatchError::VerificationRejected`].
pub fn ensure_expanded(
    alphabet: &Alphabet,
    root: pasta_curves::pallas::Base,
    client: &str,
    proof: &InclusionProof,
    leaf_count: usize,
) -> Result<()> {
    if verify_expanded(alphabet, root, client, proof, leaf_count)? {
        Ok(())
    } else {
        Err(MatchError::VerificationRejected(
            "opened leaf is not the client string's hash under this root".into(),
        ))
    }
}
