use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pasta_curves::pallas;
use zkp_pattern_match::{
    expansion::DEFAULT_MAX_LEAVES, Alphabet, ExpandedCommitment, MatchProver, MerkleTree,
    PatternCommitment,
};

const CLIENT: &str = "xxdefx";

fn patterns(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let symbol = (b'a' + (i % 26) as u8) as char;
            format!("{symbol}e*")
        })
        .collect()
}

fn bench_proof_generation(c: &mut Criterion) {
    let alphabet = Alphabet::default();
    let prover = MatchProver::new(alphabet.clone());

    let mut group = c.benchmark_group("proof_generation");
    group.sample_size(10);

    for pattern_count in [2usize, 8, 32].iter() {
        let owned = patterns(*pattern_count);
        let refs: Vec<&str> = owned.iter().map(String::as_str).collect();
        let commitment = PatternCommitment::build(&refs, &alphabet).unwrap();

        // warm the key cache outside the measurement
        prover.prove(&commitment, CLIENT).unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(pattern_count),
            pattern_count,
            |b, _| b.iter(|| black_box(prover.prove(&commitment, CLIENT).unwrap())),
        );
    }

    group.finish();
}

fn bench_proof_verification(c: &mut Criterion) {
    let alphabet = Alphabet::default();
    let prover = MatchProver::new(alphabet.clone());
    let commitment = PatternCommitment::build(&["abc", "de*"], &alphabet).unwrap();
    let output = prover.prove(&commitment, CLIENT).unwrap();

    let mut group = c.benchmark_group("proof_verification");
    group.sample_size(10);
    group.bench_function("two_patterns", |b| {
        b.iter(|| black_box(prover.verify(&output).unwrap()))
    });
    group.finish();
}

fn bench_expanded_commitment(c: &mut Criterion) {
    let alphabet = Alphabet::default();
    let mut group = c.benchmark_group("expanded_commitment");

    for client_len in [3usize, 4, 5].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(client_len),
            client_len,
            |b, &len| {
                b.iter(|| {
                    black_box(
                        ExpandedCommitment::build(&["abc", "de*"], len, &alphabet, DEFAULT_MAX_LEAVES)
                            .unwrap(),
                    )
                })
            },
        );
    }

    group.finish();
}

fn bench_merkle_tree_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("merkle_tree_construction");

    for leaf_count in [4, 8, 16, 32, 64, 128, 256, 512, 1024].iter() {
        let leaves: Vec<pallas::Base> = (0..*leaf_count)
            .map(|i| pallas::Base::from(i as u64))
            .collect();

        group.bench_with_input(
            BenchmarkId::from_parameter(leaf_count),
            leaf_count,
            |b, _| b.iter(|| black_box(MerkleTree::new(black_box(leaves.clone())).unwrap())),
        );
    }

    group.finish();
}

fn bench_merkle_proof_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("merkle_proof_generation");

    for leaf_count in [4, 8, 16, 32, 64, 128, 256].iter() {
        let leaves: Vec<pallas::Base> = (0..*leaf_count)
            .map(|i| pallas::Base::from(i as u64))
            .collect();

        let tree = MerkleTree::new(leaves).unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(leaf_count),
            leaf_count,
            |b, _| b.iter(|| black_box(tree.open(black_box(0)).unwrap())),
        );
    }

    group.finish();
}

fn bench_poseidon_hash(c: &mut Criterion) {
    c.bench_function("poseidon_hash", |b| {
        b.iter(|| {
            black_box(zkp_pattern_match::poseidon_hash(
                black_box(pallas::Base::from(42)),
                black_box(pallas::Base::from(99)),
            ))
        })
    });
}

criterion_group!(
    benches,
    bench_proof_generation,
    bench_proof_verification,
    bench_expanded_commitment,
    bench_merkle_tree_construction,
    bench_merkle_proof_generation,
    bench_poseidon_hash
);
criterion_main!(benches);
