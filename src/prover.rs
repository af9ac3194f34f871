//! Key generation, proving and verification for the matching circuit.
//!
//! Keys depend only on the [`CircuitShape`] and the wildcard symbol, never
//! on a witness. [`MatchProver`] generates them once per shape and hands
//! out shared, read-only copies, so concurrent sessions of the same shape
//! prove and verify against one key set.

use crate::circuit::{CircuitShape, MatchCircuit, MAX_CIRCUIT_K, MIN_CIRCUIT_K};
use crate::encoding::Alphabet;
use crate::error::{MatchError, Result};
use crate::types::MatchProofOutput;
use crate::witness::{PatternCommitment, ProverInputs, PublicInputs};
use halo2_proofs::{
    plonk::{
        create_proof, keygen_pk, keygen_vk, verify_proof, ProvingKey, SingleVerifier,
        VerifyingKey,
    },
    poly::commitment::Params,
    transcript::{Blake2bRead, Blake2bWrite, Challenge255},
};
use log::{debug, info};
use pasta_curves::{pallas, vesta};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use std::time::Instant;

/// Parameters and keys for one circuit shape.
pub struct MatchKeys {
    shape: CircuitShape,
    wildcard: pallas::Base,
    params: Params<vesta::Affine>,
    pk: ProvingKey<vesta::Affine>,
}

impl MatchKeys {
    /// Runs parameter and key generation for `shape`.
    pub fn setup(shape: CircuitShape, wildcard: pallas::Base, min_k: u32) -> Result<Self> {
        let start = Instant::now();
        let k = shape.k(min_k);
        let params = Params::<vesta::Affine>::new(k);

        let circuit = MatchCircuit::blank(shape, wildcard);
        let vk = keygen_vk(&params, &circuit)?;
        let pk = keygen_pk(&params, vk, &circuit)?;

        info!(
            "Generated keys for {shape:?} (k = {k}) in {:?}",
            start.elapsed()
        );

        Ok(Self {
            shape,
            wildcard,
            params,
            pk,
        })
    }

    pub fn shape(&self) -> CircuitShape {
        self.shape
    }

    pub fn k(&self) -> u32 {
        self.params.k()
    }

    pub fn verifying_key(&self) -> &VerifyingKey<vesta::Affine> {
        self.pk.get_vk()
    }

    /// Proves that `inputs` satisfy the circuit for `public`.
    ///
    /// This is the one place the inputs are evaluated natively before
    /// proving, for callers holding keys directly as well as for
    /// [`MatchProver`]. An unsatisfiable witness
    /// is reported as [`MatchError::ConstraintInfeasible`] instead of
    /// producing a proof that would fail verification.
    pub fn prove(&self, inputs: &ProverInputs, public: &PublicInputs) -> Result<Vec<u8>> {
        inputs.check(&self.shape, self.wildcard, public)?;

        let start = Instant::now();
        let circuit = MatchCircuit::new(self.shape, self.wildcard, inputs)?;
        let instance = public.to_instance();

        let mut transcript = Blake2bWrite::<_, vesta::Affine, Challenge255<_>>::init(vec![]);
        let mut rng = rand::rngs::ThreadRng::default();

        let instances: &[&[&[pallas::Base]]] = &[&[&instance]];
        create_proof(
            &self.params,
            &self.pk,
            &[circuit],
            instances,
            &mut rng,
            &mut transcript,
        )?;
        let proof = transcript.finalize();

        info!(
            "Prover time: {:?} ({} proof bytes)",
            start.elapsed(),
            proof.len()
        );
        Ok(proof)
    }

    /// Checks `proof` against `public`.
    ///
    /// Returns `false` for any proof the verifier does not accept, including
    /// truncated or garbled bytes.
    pub fn verify(&self, proof: &[u8], public: &PublicInputs) -> bool {
        let start = Instant::now();
        let instance = public.to_instance();

        let strategy = SingleVerifier::new(&self.params);
        let mut transcript = Blake2bRead::<_, vesta::Affine, Challenge255<_>>::init(proof);

        let instances: &[&[&[pallas::Base]]] = &[&[&instance]];
        let result = verify_proof(
            &self.params,
            self.pk.get_vk(),
            strategy,
            instances,
            &mut transcript,
        );

        info!("Verifier time: {:?}", start.elapsed());
        if let Err(e) = &result {
            debug!("Proof rejected: {e:?}");
        }
        result.is_ok()
    }
}

/// Prover and verifier for in-circuit pattern matching, with keys cached
/// per circuit shape.
pub struct MatchProver {
    alphabet: Alphabet,
    min_k: u32,
    max_k: u32,
    keys: RwLock<HashMap<CircuitShape, Arc<MatchKeys>>>,
}

impl MatchProver {
    pub fn new(alphabet: Alphabet) -> Self {
        Self::with_k_bounds(alphabet, MIN_CIRCUIT_K, MAX_CIRCUIT_K)
    }

    /// Circuits are sized at least `2^min_k` rows; shapes needing more than
    /// `2^max_k` rows are refused before any key generation.
    pub fn with_k_bounds(alphabet: Alphabet, min_k: u32, max_k: u32) -> Self {
        Self {
            alphabet,
            min_k,
            max_k,
            keys: RwLock::new(HashMap::new()),
        }
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// Keys for `shape`, generating them on first use.
    ///
    /// # Errors
    /// [`MatchError::MalformedInput`] for a shape that violates the
    /// [`CircuitShape::new`] checks or needs more than `2^max_k` rows.
    pub fn keys_for(&self, shape: CircuitShape) -> Result<Arc<MatchKeys>> {
        shape.validate()?;
        let k = shape.k(self.min_k);
        if k > self.max_k {
            return Err(MatchError::MalformedInput(format!(
                "circuit for {shape:?} needs k = {k}, above the limit of {}",
                self.max_k
            )));
        }

        if let Some(keys) = self.read_cache().get(&shape) {
            return Ok(Arc::clone(keys));
        }

        let keys = Arc::new(MatchKeys::setup(
            shape,
            self.alphabet.wildcard_element(),
            self.min_k,
        )?);

        let mut cache = self.keys.write().unwrap_or_else(PoisonError::into_inner);
        // another session may have finished setup for this shape meanwhile
        Ok(Arc::clone(cache.entry(shape).or_insert(keys)))
    }

    fn read_cache(&self) -> RwLockReadGuard<'_, HashMap<CircuitShape, Arc<MatchKeys>>> {
        self.keys.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Proves that `client` matches some pattern in `commitment`.
    ///
    /// The first matching pattern and offset are used.
    ///
    /// # Errors
    /// [`MatchError::NoMatchFound`] if no committed pattern matches, and any
    /// proof-system failure.
    pub fn prove(&self, commitment: &PatternCommitment, client: &str) -> Result<MatchProofOutput> {
        let inputs = commitment.witness_for(client, &self.alphabet)?;
        self.prove_inputs(&inputs)
    }

    /// Proves for explicitly chosen prover inputs.
    pub fn prove_inputs(&self, inputs: &ProverInputs) -> Result<MatchProofOutput> {
        let shape = inputs.shape()?;
        inputs.check_shape(&shape)?;
        let public = inputs.public_inputs();
        let keys = self.keys_for(shape)?;
        let proof = keys.prove(inputs, &public)?;

        Ok(MatchProofOutput::new(shape, &public, proof))
    }

    /// Verifies a serialized proof.
    ///
    /// # Errors
    /// [`MatchError::MalformedInput`] if the output cannot be parsed or its
    /// shape is impossible or too large; a proof that parses but does not
    /// verify yields `Ok(false)`.
    pub fn verify(&self, output: &MatchProofOutput) -> Result<bool> {
        let public = output.public_inputs()?;
        let keys = self.keys_for(output.shape)?;
        Ok(keys.verify(&output.zkp_proof, &public))
    }

    /// Like [`MatchProver::verify`], with rejection reported as
    /// [`MatchError::VerificationRejected`].
    pub fn ensure_verified(&self, output: &MatchProofOutput) -> Result<()> {
        if self.verify(output)? {
            Ok(())
        } else {
            Err(MatchError::VerificationRejected(
                "match proof did not verify".into(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_cached_per_shape() {
        let prover = MatchProver::new(Alphabet::default());
        let shape = CircuitShape::new(1, 1, 1).unwrap();

        let first = prover.keys_for(shape).unwrap();
        let second = prover.keys_for(shape).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.k() >= MIN_CIRCUIT_K);
    }

    #[test]
    fn test_infeasible_witness_is_not_proved() {
        let alphabet = Alphabet::default();
        let commitment = PatternCommitment::build(&["abc", "de*"], &alphabet).unwrap();
        let inputs = commitment.witness(1, 3, "xxdefx", &alphabet).unwrap();

        let prover = MatchProver::new(alphabet);
        let err = prover.prove_inputs(&inputs).unwrap_err();
        assert!(matches!(err, MatchError::ConstraintInfeasible(_)));
    }

    #[test]
    fn test_empty_inclusion_path_is_refused_before_setup() {
        let alphabet = Alphabet::default();
        let commitment = PatternCommitment::build(&["abc", "de*"], &alphabet).unwrap();
        let mut inputs = commitment.witness_for("xxdefx", &alphabet).unwrap();
        inputs.inclusion.path.clear();

        let prover = MatchProver::new(alphabet);
        assert!(matches!(
            prover.prove_inputs(&inputs),
            Err(MatchError::MalformedInput(_))
        ));
        assert!(prover.read_cache().is_empty());
    }

    fn output_with_shape(shape: CircuitShape) -> MatchProofOutput {
        let public = PublicInputs {
            root: pallas::Base::from(7),
            client_hash: pallas::Base::from(11),
        };
        MatchProofOutput {
            shape,
            ..MatchProofOutput::new(CircuitShape::new(2, 3, 6).unwrap(), &public, vec![1, 2, 3])
        }
    }

    #[test]
    fn test_verify_rejects_impossible_shape_without_setup() {
        let prover = MatchProver::new(Alphabet::default());
        let output = output_with_shape(CircuitShape {
            pattern_count: 2,
            pattern_len: 9,
            client_len: 6,
        });

        assert!(matches!(
            prover.verify(&output),
            Err(MatchError::MalformedInput(_))
        ));
        assert!(prover.read_cache().is_empty());
    }

    #[test]
    fn test_verify_rejects_oversized_shape_without_setup() {
        let prover = MatchProver::new(Alphabet::default());
        let output = output_with_shape(CircuitShape::new(2, 3, 1_000_000_000).unwrap());

        let err = prover.verify(&output).unwrap_err();
        assert!(err.to_string().contains("above the limit"));
        assert!(prover.read_cache().is_empty());
    }

    #[test]
    fn test_configured_max_k_is_enforced() {
        let prover = MatchProver::with_k_bounds(Alphabet::default(), MIN_CIRCUIT_K, 4);
        let shape = CircuitShape::new(1, 1, 1).unwrap();
        assert!(matches!(
            prover.keys_for(shape),
            Err(MatchError::MalformedInput(_))
        ));
    }
}
