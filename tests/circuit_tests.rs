use halo2_proofs::dev::MockProver;
use pasta_curves::pallas;
use zkp_pattern_match::{
    circuit::MIN_CIRCUIT_K, Alphabet, CircuitShape, MatchCircuit, PatternCommitment,
    ProverInputs, PublicInputs,
};

fn build_inputs(patterns: &[&str], index: usize, offset: usize, client: &str) -> (ProverInputs, Alphabet) {
    let alphabet = Alphabet::default();
    let commitment = PatternCommitment::build(patterns, &alphabet).unwrap();
    let inputs = commitment.witness(index, offset, client, &alphabet).unwrap();
    (inputs, alphabet)
}

fn run_mock(inputs: &ProverInputs, alphabet: &Alphabet, public: &PublicInputs) -> bool {
    let shape = inputs.shape().unwrap();
    let circuit = MatchCircuit::new(shape, alphabet.wildcard_element(), inputs).unwrap();
    let prover = MockProver::run(shape.k(MIN_CIRCUIT_K), &circuit, vec![public.to_instance()]).unwrap();
    prover.verify().is_ok()
}

#[test]
fn test_wildcard_pattern_satisfies_circuit_at_matching_offset() {
    let (inputs, alphabet) = build_inputs(&["abc", "de*"], 1, 2, "xxdefx");
    assert!(run_mock(&inputs, &alphabet, &inputs.public_inputs()));
}

#[test]
fn test_wrong_offset_has_no_satisfying_assignment() {
    let (inputs, alphabet) = build_inputs(&["abc", "de*"], 1, 3, "xxdefx");
    assert!(!run_mock(&inputs, &alphabet, &inputs.public_inputs()));
}

#[test]
fn test_exact_pattern_without_wildcards_is_equality() {
    let (inputs, alphabet) = build_inputs(&["abc", "de*"], 0, 0, "abc");
    assert!(run_mock(&inputs, &alphabet, &inputs.public_inputs()));

    let (inputs, alphabet) = build_inputs(&["abc", "de*"], 0, 0, "abd");
    assert!(!run_mock(&inputs, &alphabet, &inputs.public_inputs()));
}

#[test]
fn test_all_wildcard_pattern_matches_every_offset() {
    for offset in 0..=3 {
        let (inputs, alphabet) = build_inputs(&["***"], 0, offset, "qwerty");
        assert!(
            run_mock(&inputs, &alphabet, &inputs.public_inputs()),
            "offset {offset} should be accepted"
        );
    }
}

#[test]
fn test_wrong_public_client_hash_is_rejected() {
    let (inputs, alphabet) = build_inputs(&["abc", "de*"], 1, 2, "xxdefx");
    let public = PublicInputs {
        client_hash: alphabet.hash_client_string("xxdefy").unwrap(),
        ..inputs.public_inputs()
    };
    assert!(!run_mock(&inputs, &alphabet, &public));
}

#[test]
fn test_wrong_public_root_is_rejected() {
    let (inputs, alphabet) = build_inputs(&["abc", "de*"], 1, 2, "xxdefx");
    let public = PublicInputs {
        root: pallas::Base::from(1234),
        ..inputs.public_inputs()
    };
    assert!(!run_mock(&inputs, &alphabet, &public));
}

#[test]
fn test_pattern_from_another_commitment_is_rejected() {
    let (inputs, alphabet) = build_inputs(&["abc", "de*"], 1, 2, "xxdefx");
    let other = PatternCommitment::build(&["abc", "d**"], &alphabet).unwrap();
    let public = PublicInputs {
        root: other.root(),
        ..inputs.public_inputs()
    };
    assert!(!run_mock(&inputs, &alphabet, &public));
}

#[test]
fn test_larger_commitment_with_padding() {
    let patterns = ["aaa", "bbb", "ccc", "d*f", "eee"];
    let (inputs, alphabet) = build_inputs(&patterns, 3, 1, "zdqfz");
    let shape = inputs.shape().unwrap();
    assert_eq!(shape, CircuitShape::new(5, 3, 5).unwrap());
    assert_eq!(shape.depth(), 3);
    assert!(run_mock(&inputs, &alphabet, &inputs.public_inputs()));
}

#[test]
fn test_inputs_for_another_shape_are_malformed() {
    let (inputs, alphabet) = build_inputs(&["abc", "de*"], 1, 2, "xxdefx");
    let shape = CircuitShape::new(2, 3, 8).unwrap();
    assert!(MatchCircuit::new(shape, alphabet.wildcard_element(), &inputs).is_err());
}
