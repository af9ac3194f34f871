//! Error kinds shared by both matching protocols.

use thiserror::Error;

/// Errors produced by encoding, commitment, expansion and proving.
///
/// `NoMatchFound`, `ConstraintInfeasible` and `VerificationRejected` are
/// expected outcomes a caller may branch on. `ProofSystem` is reserved for
/// failures of the proving backend itself.
#[derive(Error, Debug)]
pub enum MatchError {
    /// A symbol outside the configured alphabet, or a wildcard where only
    /// concrete symbols are allowed.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Empty leaf set or an index outside `[0, leaf_count)`.
    #[error("commitment error: {0}")]
    Commitment(String),

    /// Expanding the patterns would produce more leaves than allowed.
    #[error("expansion of {required} leaves exceeds the configured limit of {limit}")]
    ExpansionOverflow { required: u128, limit: u64 },

    /// No expanded pattern (or no pattern/offset pair) equals the client string.
    #[error("no committed pattern matches the client string")]
    NoMatchFound,

    /// The witness does not satisfy the matching circuit.
    #[error("witness does not satisfy the circuit: {0}")]
    ConstraintInfeasible(String),

    /// A well-formed proof that the verifier refuses.
    #[error("verification rejected: {0}")]
    VerificationRejected(String),

    /// Lengths or shapes of caller-supplied data are inconsistent.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("proof system failure: {0}")]
    ProofSystem(#[from] halo2_proofs::plonk::Error),
}

pub type Result<T> = std::result::Result<T, MatchError>;
