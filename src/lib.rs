//! ZKP Pattern Matching
//!
//! Proves that a private client string matches some pattern of a committed
//! set of wildcard patterns, without revealing which pattern matched or
//! where.
//!
//! Two protocols share one encoding and one Merkle commitment:
//!
//! - **Expansion** ([`expansion`]): every pattern is expanded into all the
//!   concrete strings it can match for a given client length, and the
//!   client proves membership of `Hash(client)` in that set.
//! - **In-circuit matching** ([`circuit`], [`prover`]): one leaf per raw
//!   pattern, and a halo2 circuit proves the match predicate at a private
//!   offset together with Merkle membership of the pattern.
//!
//! # Components
//!
//! - [`Alphabet`]: the symbol set and its reserved wildcard
//! - [`MerkleTree`]: Poseidon Merkle commitment over field elements
//! - [`ExpandedCommitment`]: commitment to the expanded universe
//! - [`PatternCommitment`]: commitment to raw patterns, with witness search
//! - [`MatchCircuit`]: the matching circuit for one [`CircuitShape`]
//! - [`MatchProver`]: key cache, prover and verifier
//! - [`MatchProofOutput`]: serialized proof output format
//!
//! # Example
//!
//! ```no_run
//! use zkp_pattern_match::{Alphabet, MatchProver, PatternCommitment};
//!
//! let alphabet = Alphabet::default();
//! let commitment = PatternCommitment::build(&["abc", "de*"], &alphabet).unwrap();
//!
//! let prover = MatchProver::new(alphabet);
//! let output = prover.prove(&commitment, "xxdefx").unwrap();
//! assert!(prover.verify(&output).unwrap());
//! ```

pub mod circuit;
pub mod config;
pub mod encoding;
pub mod error;
pub mod expansion;
pub mod merkle;
pub mod prover;
pub mod types;
pub mod utils;
pub mod witness;


pub use circuit::{CircuitShape, MatchCircuit};
pub use config::Config;
pub use encoding::{hash_elements, Alphabet};
pub use error::{MatchError, Result};
pub use expansion::{verify_expanded, ExpandedCommitment};
pub use merkle::{verify_inclusion, InclusionProof, MerkleTree};
pub use prover::{MatchKeys, MatchProver};
pub use types::MatchProofOutput;
pub use utils::{bytes_to_field, field_to_bytes, poseidon_hash};
pub use witness::{MatchWitness, PatternCommitment, ProverInputs, PublicInputs};
