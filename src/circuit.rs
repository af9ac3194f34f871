//! Halo2 circuit proving that a committed pattern matches a private client
//! string at a private offset.
//!
//! Public inputs (one instance column):
//! * row 0: Merkle root of the pattern commitment,
//! * row 1: `Hash(client)`.
//!
//! Private inputs: the raw pattern, the client string, the offset, the Merkle
//! siblings and the leaf index bits.
//!
//! Constraints:
//! 1. the leaf index bits and siblings lead from `Hash(pattern)` to the root,
//! 2. `Hash(client)` equals the public client commitment,
//! 3. the offset is encoded as one-hot indicator bits `e_k`,
//!    `k in [0, client_len - pattern_len]`, with `sum e_k = 1` and
//!    `sum k * e_k = offset`,
//! 4. for each pattern position `i`, the selected client symbol is
//!    `sum_k e_k * client[i + k]`, and either the pattern symbol is the
//!    wildcard or it equals the selected symbol.
//!
//! The offset is a circuit value, not a layout-time index, so the client
//! symbol at `i + offset` is selected by a dot product with the indicator
//! bits instead of being read from a fixed cell.

use crate::error::{MatchError, Result};
use crate::utils::ceil_log2;
use crate::witness::ProverInputs;
use halo2_gadgets::poseidon::{
    primitives::{ConstantLength, P128Pow5T3},
    Hash as PoseidonHash, Pow5Chip, Pow5Config,
};
use halo2_proofs::{
    circuit::{AssignedCell, Layouter, SimpleFloorPlanner, Value},
    plonk::{Advice, Circuit, Column, ConstraintSystem, Error, Expression, Fixed, Instance, Selector},
    poly::Rotation,
};
use pasta_curves::group::ff::Field;
use pasta_curves::pallas;
use serde::{Deserialize, Serialize};

type Fp = pallas::Base;
type Cell = AssignedCell<Fp, Fp>;

/// Instance row of the Merkle root.
pub const ROOT_ROW: usize = 0;
/// Instance row of the client-string commitment.
pub const CLIENT_HASH_ROW: usize = 1;
/// Number of public inputs.
pub const NUM_PUBLIC_INPUTS: usize = 2;

/// Smallest circuit size used regardless of shape.
pub const MIN_CIRCUIT_K: u32 = 8;
/// Largest circuit size a verifier sets up keys for.
pub const MAX_CIRCUIT_K: u32 = 18;

/// Upper bound on rows one Poseidon pair hash occupies (initial state,
/// absorption and the permutation region).
const ROWS_PER_HASH: usize = 64;
/// Rows halo2 reserves for blinding plus slack.
const RESERVED_ROWS: usize = 16;

/// The dimensions that fix a circuit's constraint system.
///
/// Keys generated for one shape cannot verify proofs of another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawShape")]
pub struct CircuitShape {
    pub pattern_count: usize,
    pub pattern_len: usize,
    pub client_len: usize,
}

/// Unchecked wire form of [`CircuitShape`].
#[derive(Deserialize)]
struct RawShape {
    pattern_count: usize,
    pattern_len: usize,
    client_len: usize,
}

impl TryFrom<RawShape> for CircuitShape {
    type Error = MatchError;

    fn try_from(raw: RawShape) -> Result<Self> {
        CircuitShape::new(raw.pattern_count, raw.pattern_len, raw.client_len)
    }
}

impl CircuitShape {
    /// # Errors
    /// [`MatchError::MalformedInput`] unless
    /// `pattern_count >= 1` and `1 <= pattern_len <= client_len`.
    pub fn new(pattern_count: usize, pattern_len: usize, client_len: usize) -> Result<Self> {
        if pattern_count == 0 {
            return Err(MatchError::MalformedInput(
                "circuit shape needs at least one committed pattern".into(),
            ));
        }
        if pattern_len == 0 || pattern_len > client_len {
            return Err(MatchError::MalformedInput(format!(
                "pattern length {pattern_len} must be in [1, {client_len}]"
            )));
        }
        Ok(Self {
            pattern_count,
            pattern_len,
            client_len,
        })
    }

    /// Merkle tree depth, `ceil(log2(pattern_count))`.
    pub fn depth(&self) -> usize {
        ceil_log2(self.pattern_count) as usize
    }

    pub fn max_offset(&self) -> usize {
        self.client_len.saturating_sub(self.pattern_len)
    }

    /// Re-runs the checks of [`CircuitShape::new`] on a shape whose public
    /// fields may have been set directly.
    pub fn validate(&self) -> Result<()> {
        Self::new(self.pattern_count, self.pattern_len, self.client_len).map(|_| ())
    }

    /// Saturating, so an absurd shape yields a huge `k`.
    fn estimated_rows(&self) -> usize {
        let (pattern_len, client_len, depth) = (self.pattern_len, self.client_len, self.depth());
        let hashes = pattern_len.saturating_add(client_len).saturating_add(depth);
        let indicators = self.max_offset().saturating_add(1);
        // pattern_len selections plus the count and weighted sums
        let dot_rows = pattern_len
            .saturating_add(2)
            .saturating_mul(indicators.saturating_add(1));
        let loads = client_len
            .saturating_add(pattern_len)
            .saturating_add(indicators)
            .saturating_add(1);
        let constants = hashes
            .saturating_mul(2)
            .saturating_add(indicators.saturating_mul(2))
            .saturating_add(pattern_len)
            .saturating_add(8);

        hashes
            .saturating_mul(ROWS_PER_HASH)
            .saturating_add(dot_rows)
            .saturating_add(loads)
            .saturating_add(pattern_len)
            .saturating_add(depth)
            .max(constants)
    }

    /// `log2` of the number of rows the circuit needs, at least `min_k`.
    pub fn k(&self, min_k: u32) -> u32 {
        ceil_log2(self.estimated_rows().saturating_add(RESERVED_ROWS)).max(min_k)
    }
}

#[derive(Debug, Clone)]
pub struct MatchConfig {
    advice: [Column<Advice>; 6],
    instance: Column<Instance>,
    wildcard: Column<Fixed>,
    q_dot: Selector,
    q_bool: Selector,
    q_match: Selector,
    q_swap: Selector,
    poseidon: Pow5Config<Fp, 3, 2>,
}

/// The matching circuit for one [`CircuitShape`] and wildcard symbol.
///
/// The wildcard is laid out in a fixed column and is therefore part of the
/// verifying key.
#[derive(Debug, Clone)]
pub struct MatchCircuit {
    shape: CircuitShape,
    wildcard: Fp,
    pattern: Vec<Value<Fp>>,
    client: Vec<Value<Fp>>,
    offset: Value<Fp>,
    offset_indicators: Vec<Value<Fp>>,
    siblings: Vec<Value<Fp>>,
    index_bits: Vec<Value<Fp>>,
}

impl MatchCircuit {
    /// A circuit with every witness unknown, used for key generation.
    pub fn blank(shape: CircuitShape, wildcard: Fp) -> Self {
        Self {
            shape,
            wildcard,
            pattern: vec![Value::unknown(); shape.pattern_len],
            client: vec![Value::unknown(); shape.client_len],
            offset: Value::unknown(),
            offset_indicators: vec![Value::unknown(); shape.max_offset() + 1],
            siblings: vec![Value::unknown(); shape.depth()],
            index_bits: vec![Value::unknown(); shape.depth()],
        }
    }

    /// Assigns a prover's private inputs.
    ///
    /// Only lengths are checked here; whether the values satisfy the
    /// constraints is the business of the proof system.
    ///
    /// # Errors
    /// [`MatchError::MalformedInput`] if the inputs do not fit `shape`.
    pub fn new(shape: CircuitShape, wildcard: Fp, inputs: &ProverInputs) -> Result<Self> {
        inputs.check_shape(&shape)?;

        let known = |values: &[Fp]| values.iter().copied().map(Value::known).collect();
        let flag = |bit: bool| Value::known(if bit { Fp::ONE } else { Fp::ZERO });

        Ok(Self {
            shape,
            wildcard,
            pattern: known(&inputs.witness.raw_pattern),
            client: known(&inputs.client),
            offset: Value::known(Fp::from(inputs.witness.offset as u64)),
            offset_indicators: (0..=shape.max_offset())
                .map(|k| flag(k == inputs.witness.offset))
                .collect(),
            siblings: known(inputs.inclusion.siblings()),
            index_bits: inputs.inclusion.index_bits().into_iter().map(flag).collect(),
        })
    }

    pub fn shape(&self) -> CircuitShape {
        self.shape
    }
}

impl Circuit<Fp> for MatchCircuit {
    type Config = MatchConfig;
    type FloorPlanner = SimpleFloorPlanner;

    fn without_witnesses(&self) -> Self {
        Self::blank(self.shape, self.wildcard)
    }

    fn configure(meta: &mut ConstraintSystem<Fp>) -> Self::Config {
        let advice = [
            meta.advice_column(),
            meta.advice_column(),
            meta.advice_column(),
            meta.advice_column(),
            meta.advice_column(),
            meta.advice_column(),
        ];
        let instance = meta.instance_column();
        let wildcard = meta.fixed_column();
        let constants = meta.fixed_column();

        for column in &advice {
            meta.enable_equality(*column);
        }
        meta.enable_equality(instance);
        meta.enable_constant(constants);

        let rc_a = [meta.fixed_column(), meta.fixed_column(), meta.fixed_column()];
        let rc_b = [meta.fixed_column(), meta.fixed_column(), meta.fixed_column()];
        let poseidon = Pow5Chip::configure::<P128Pow5T3>(
            meta,
            [advice[0], advice[1], advice[2]],
            advice[3],
            rc_a,
            rc_b,
        );

        let q_dot = meta.selector();
        let q_bool = meta.selector();
        let q_match = meta.selector();
        let q_swap = meta.selector();
        let one = || Expression::Constant(Fp::ONE);

        // acc[next] = acc[cur] + lhs[cur] * rhs[cur]
        meta.create_gate("dot product step", |meta| {
            let q = meta.query_selector(q_dot);
            let lhs = meta.query_advice(advice[0], Rotation::cur());
            let rhs = meta.query_advice(advice[1], Rotation::cur());
            let acc = meta.query_advice(advice[2], Rotation::cur());
            let acc_next = meta.query_advice(advice[2], Rotation::next());

            vec![q * (acc_next - (acc + lhs * rhs))]
        });

        meta.create_gate("boolean", |meta| {
            let q = meta.query_selector(q_bool);
            let bit = meta.query_advice(advice[0], Rotation::cur());

            vec![q * bit.clone() * (one() - bit)]
        });

        // is_wildcard = (pattern == wildcard), is_same = (selected == pattern),
        // each pinned by an inverse witness, and at least one must hold.
        meta.create_gate("match position", |meta| {
            let q = meta.query_selector(q_match);
            let pattern = meta.query_advice(advice[0], Rotation::cur());
            let selected = meta.query_advice(advice[1], Rotation::cur());
            let wildcard_inv = meta.query_advice(advice[2], Rotation::cur());
            let is_wildcard = meta.query_advice(advice[3], Rotation::cur());
            let same_inv = meta.query_advice(advice[4], Rotation::cur());
            let is_same = meta.query_advice(advice[5], Rotation::cur());
            let wildcard = meta.query_fixed(wildcard);

            let wildcard_diff = pattern.clone() - wildcard;
            let same_diff = selected - pattern;

            vec![
                q.clone() * wildcard_diff.clone() * is_wildcard.clone(),
                q.clone() * (wildcard_diff * wildcard_inv - (one() - is_wildcard.clone())),
                q.clone() * same_diff.clone() * is_same.clone(),
                q.clone() * (same_diff * same_inv - (one() - is_same.clone())),
                q * (is_wildcard.clone() + is_same.clone() - is_wildcard * is_same - one()),
            ]
        });

        // (left, right) = bit ? (sibling, current) : (current, sibling)
        meta.create_gate("merkle swap", |meta| {
            let q = meta.query_selector(q_swap);
            let current = meta.query_advice(advice[0], Rotation::cur());
            let sibling = meta.query_advice(advice[1], Rotation::cur());
            let bit = meta.query_advice(advice[2], Rotation::cur());
            let left = meta.query_advice(advice[3], Rotation::cur());
            let right = meta.query_advice(advice[4], Rotation::cur());

            vec![
                q.clone() * bit.clone() * (one() - bit.clone()),
                q.clone()
                    * (left - (current.clone() + bit.clone() * (sibling.clone() - current.clone()))),
                q * (right - (sibling.clone() + bit * (current - sibling))),
            ]
        });

        MatchConfig {
            advice,
            instance,
            wildcard,
            q_dot,
            q_bool,
            q_match,
            q_swap,
            poseidon,
        }
    }

    fn synthesize(&self, config: Self::Config, mut layouter: impl Layouter<Fp>) -> std::result::Result<(), Error> {
        let chip = MatchChip::new(config.clone());
        let max_offset = self.shape.max_offset();

        let client = chip.load(layouter.namespace(|| "client string"), &self.client, false)?;
        let pattern = chip.load(layouter.namespace(|| "raw pattern"), &self.pattern, false)?;
        let indicators = chip.load(
            layouter.namespace(|| "offset indicators"),
            &self.offset_indicators,
            true,
        )?;
        let offset = chip.load(layouter.namespace(|| "offset"), &[self.offset], false)?;

        let ones = vec![Fp::ONE; max_offset + 1];
        let positions: Vec<Fp> = (0..=max_offset).map(|k| Fp::from(k as u64)).collect();
        let count = chip.dot(
            layouter.namespace(|| "indicator count"),
            &indicators,
            Rhs::Constants(&ones),
        )?;
        let weighted = chip.dot(
            layouter.namespace(|| "indicator position"),
            &indicators,
            Rhs::Constants(&positions),
        )?;
        layouter.assign_region(
            || "one-hot offset",
            |mut region| {
                region.constrain_constant(count.cell(), Fp::ONE)?;
                region.constrain_equal(weighted.cell(), offset[0].cell())
            },
        )?;

        for (i, symbol) in pattern.iter().enumerate() {
            let selected = chip.dot(
                layouter.namespace(|| format!("select client symbol {i}")),
                &indicators,
                Rhs::Cells(&client[i..=i + max_offset]),
            )?;
            chip.assert_match(
                layouter.namespace(|| format!("match position {i}")),
                symbol,
                &selected,
                self.wildcard,
            )?;
        }

        let leaf = chip.hash_sequence(layouter.namespace(|| "pattern hash"), &pattern)?;
        let client_hash = chip.hash_sequence(layouter.namespace(|| "client hash"), &client)?;
        let root = chip.merkle_root(
            layouter.namespace(|| "merkle path"),
            leaf,
            &self.siblings,
            &self.index_bits,
        )?;

        layouter.constrain_instance(root.cell(), config.instance, ROOT_ROW)?;
        layouter.constrain_instance(client_hash.cell(), config.instance, CLIENT_HASH_ROW)?;

        Ok(())
    }
}

enum Rhs<'a> {
    Cells(&'a [Cell]),
    Constants(&'a [Fp]),
}

struct MatchChip {
    config: MatchConfig,
}

impl MatchChip {
    fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    /// Assigns private values into one column, optionally constraining each
    /// to be boolean.
    fn load(
        &self,
        mut layouter: impl Layouter<Fp>,
        values: &[Value<Fp>],
        boolean: bool,
    ) -> std::result::Result<Vec<Cell>, Error> {
        let config = &self.config;
        layouter.assign_region(
            || "load private values",
            |mut region| {
                values
                    .iter()
                    .enumerate()
                    .map(|(row, value)| {
                        if boolean {
                            config.q_bool.enable(&mut region, row)?;
                        }
                        region.assign_advice(|| "private value", config.advice[0], row, || *value)
                    })
                    .collect()
            },
        )
    }

    /// `sum lhs[k] * rhs[k]` as a running sum, one row per term.
    fn dot(
        &self,
        mut layouter: impl Layouter<Fp>,
        lhs: &[Cell],
        rhs: Rhs<'_>,
    ) -> std::result::Result<Cell, Error> {
        let config = &self.config;
        layouter.assign_region(
            || "dot product",
            |mut region| {
                let mut acc = region.assign_advice_from_constant(
                    || "initial sum",
                    config.advice[2],
                    0,
                    Fp::ZERO,
                )?;

                for (row, left) in lhs.iter().enumerate() {
                    config.q_dot.enable(&mut region, row)?;
                    let left = left.copy_advice(|| "lhs", &mut region, config.advice[0], row)?;
                    let right = match &rhs {
                        Rhs::Cells(cells) => {
                            cells[row].copy_advice(|| "rhs", &mut region, config.advice[1], row)?
                        }
                        Rhs::Constants(constants) => region.assign_advice_from_constant(
                            || "rhs",
                            config.advice[1],
                            row,
                            constants[row],
                        )?,
                    };

                    let next = acc
                        .value()
                        .zip(left.value())
                        .zip(right.value())
                        .map(|((acc, l), r)| *acc + *l * *r);
                    acc = region.assign_advice(|| "partial sum", config.advice[2], row + 1, || next)?;
                }

                Ok(acc)
            },
        )
    }

    fn assert_match(
        &self,
        mut layouter: impl Layouter<Fp>,
        pattern: &Cell,
        selected: &Cell,
        wildcard: Fp,
    ) -> std::result::Result<(), Error> {
        let config = &self.config;
        layouter.assign_region(
            || "match position",
            |mut region| {
                config.q_match.enable(&mut region, 0)?;

                let pattern = pattern.copy_advice(|| "pattern symbol", &mut region, config.advice[0], 0)?;
                let selected =
                    selected.copy_advice(|| "selected symbol", &mut region, config.advice[1], 0)?;
                region.assign_fixed(|| "wildcard", config.wildcard, 0, || Value::known(wildcard))?;

                let wildcard_diff = pattern.value().map(|p| *p - wildcard);
                let same_diff = selected.value().zip(pattern.value()).map(|(s, p)| *s - *p);

                region.assign_advice(
                    || "wildcard inverse",
                    config.advice[2],
                    0,
                    || wildcard_diff.map(invert_or_zero),
                )?;
                region.assign_advice(
                    || "is wildcard",
                    config.advice[3],
                    0,
                    || wildcard_diff.map(is_zero),
                )?;
                region.assign_advice(
                    || "same inverse",
                    config.advice[4],
                    0,
                    || same_diff.map(invert_or_zero),
                )?;
                region.assign_advice(|| "is same", config.advice[5], 0, || same_diff.map(is_zero))?;

                Ok(())
            },
        )
    }

    fn hash_pair(
        &self,
        mut layouter: impl Layouter<Fp>,
        left: Cell,
        right: Cell,
    ) -> std::result::Result<Cell, Error> {
        let chip = Pow5Chip::construct(self.config.poseidon.clone());
        let hasher = PoseidonHash::<Fp, Pow5Chip<Fp, 3, 2>, P128Pow5T3, ConstantLength<2>, 3, 2>::init(
            chip,
            layouter.namespace(|| "poseidon init"),
        )?;
        hasher.hash(layouter.namespace(|| "poseidon hash"), [left, right])
    }

    /// Length-prefixed Poseidon chain, matching `encoding::hash_elements`.
    fn hash_sequence(
        &self,
        mut layouter: impl Layouter<Fp>,
        elements: &[Cell],
    ) -> std::result::Result<Cell, Error> {
        let config = &self.config;
        let mut acc = layouter.assign_region(
            || "length prefix",
            |mut region| {
                region.assign_advice_from_constant(
                    || "length",
                    config.advice[0],
                    0,
                    Fp::from(elements.len() as u64),
                )
            },
        )?;

        for (i, element) in elements.iter().enumerate() {
            acc = self.hash_pair(layouter.namespace(|| format!("absorb {i}")), acc, element.clone())?;
        }
        Ok(acc)
    }

    fn merkle_root(
        &self,
        mut layouter: impl Layouter<Fp>,
        leaf: Cell,
        siblings: &[Value<Fp>],
        index_bits: &[Value<Fp>],
    ) -> std::result::Result<Cell, Error> {
        let config = &self.config;
        let mut current = leaf;

        for (level, (sibling, bit)) in siblings.iter().zip(index_bits).enumerate() {
            let (left, right) = layouter.assign_region(
                || format!("merkle swap {level}"),
                |mut region| {
                    config.q_swap.enable(&mut region, 0)?;

                    let node = current.copy_advice(|| "current", &mut region, config.advice[0], 0)?;
                    let sibling = region.assign_advice(|| "sibling", config.advice[1], 0, || *sibling)?;
                    let bit = region.assign_advice(|| "index bit", config.advice[2], 0, || *bit)?;

                    let ordered = node
                        .value()
                        .zip(sibling.value())
                        .zip(bit.value())
                        .map(|((node, sibling), bit)| {
                            if *bit == Fp::ONE {
                                (*sibling, *node)
                            } else {
                                (*node, *sibling)
                            }
                        });

                    let left =
                        region.assign_advice(|| "left", config.advice[3], 0, || ordered.map(|(l, _)| l))?;
                    let right =
                        region.assign_advice(|| "right", config.advice[4], 0, || ordered.map(|(_, r)| r))?;
                    Ok((left, right))
                },
            )?;

            current = self.hash_pair(layouter.namespace(|| format!("merkle level {level}")), left, right)?;
        }

        Ok(current)
    }
}

fn invert_or_zero(value: Fp) -> Fp {
    Option::from(value.invert()).unwrap_or(Fp::ZERO)
}

fn is_zero(value: Fp) -> Fp {
    if value.is_zero_vartime() {
        Fp::ONE
    } else {
        Fp::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::Alphabet;
    use crate::witness::PatternCommitment;
    use halo2_proofs::dev::MockProver;

    #[test]
    fn test_shape_rejects_degenerate_dimensions() {
        assert!(CircuitShape::new(0, 3, 6).is_err());
        assert!(CircuitShape::new(2, 0, 6).is_err());
        assert!(CircuitShape::new(2, 7, 6).is_err());
    }

    #[test]
    fn test_shape_derived_dimensions() {
        let shape = CircuitShape::new(5, 3, 6).unwrap();
        assert_eq!(shape.depth(), 3);
        assert_eq!(shape.max_offset(), 3);

        let single = CircuitShape::new(1, 4, 4).unwrap();
        assert_eq!(single.depth(), 0);
        assert_eq!(single.max_offset(), 0);
    }

    #[test]
    fn test_k_grows_with_shape_and_respects_minimum() {
        let small = CircuitShape::new(2, 3, 6).unwrap();
        let large = CircuitShape::new(64, 12, 48).unwrap();
        assert!(small.k(MIN_CIRCUIT_K) >= MIN_CIRCUIT_K);
        assert!(large.k(MIN_CIRCUIT_K) > small.k(MIN_CIRCUIT_K));
        assert_eq!(small.k(20), 20);
    }

    fn wildcard_circuit() -> (MatchCircuit, Vec<Fp>) {
        let alphabet = Alphabet::default();
        let commitment = PatternCommitment::build(&["***"], &alphabet).unwrap();
        let inputs = commitment.witness(0, 0, "qwerty", &alphabet).unwrap();
        let shape = inputs.shape().unwrap();
        let circuit = MatchCircuit::new(shape, alphabet.wildcard_element(), &inputs).unwrap();
        (circuit, inputs.public_inputs().to_instance())
    }

    #[test]
    fn test_honest_indicators_are_accepted() {
        let (circuit, instance) = wildcard_circuit();
        let k = circuit.shape.k(MIN_CIRCUIT_K);
        let prover = MockProver::run(k, &circuit, vec![instance]).unwrap();
        assert_eq!(prover.verify(), Ok(()));
    }

    #[test]
    fn test_two_hot_indicators_are_rejected() {
        let (mut circuit, instance) = wildcard_circuit();
        let k = circuit.shape.k(MIN_CIRCUIT_K);
        circuit.offset_indicators[1] = Value::known(Fp::ONE);
        circuit.offset = Value::known(Fp::ONE);

        let prover = MockProver::run(k, &circuit, vec![instance]).unwrap();
        assert!(prover.verify().is_err());
    }

    #[test]
    fn test_offset_disagreeing_with_indicators_is_rejected() {
        let (mut circuit, instance) = wildcard_circuit();
        let k = circuit.shape.k(MIN_CIRCUIT_K);
        circuit.offset = Value::known(Fp::from(2));

        let prover = MockProver::run(k, &circuit, vec![instance]).unwrap();
        assert!(prover.verify().is_err());
    }

    #[test]
    fn test_non_boolean_index_bit_is_rejected() {
        let alphabet = Alphabet::default();
        let commitment = PatternCommitment::build(&["abc", "de*"], &alphabet).unwrap();
        let inputs = commitment.witness(1, 2, "xxdefx", &alphabet).unwrap();
        let shape = inputs.shape().unwrap();
        let mut circuit = MatchCircuit::new(shape, alphabet.wildcard_element(), &inputs).unwrap();
        circuit.index_bits[0] = Value::known(Fp::from(2));

        let prover = MockProver::run(
            shape.k(MIN_CIRCUIT_K),
            &circuit,
            vec![inputs.public_inputs().to_instance()],
        )
        .unwrap();
        assert!(prover.verify().is_err());
    }

    #[test]
    fn test_deserialization_rejects_impossible_shape() {
        let json = r#"{"pattern_count":2,"pattern_len":9,"client_len":6}"#;
        assert!(serde_json::from_str::<CircuitShape>(json).is_err());

        let json = r#"{"pattern_count":2,"pattern_len":3,"client_len":6}"#;
        let shape: CircuitShape = serde_json::from_str(json).unwrap();
        assert_eq!(shape, CircuitShape::new(2, 3, 6).unwrap());
    }

    #[test]
    fn test_oversized_shape_estimate_does_not_overflow() {
        let shape = CircuitShape::new(usize::MAX, 1, usize::MAX).unwrap();
        assert!(shape.k(MIN_CIRCUIT_K) > MAX_CIRCUIT_K);

        let tampered = CircuitShape {
            pattern_count: 2,
            pattern_len: 9,
            client_len: 6,
        };
        assert!(tampered.validate().is_err());
        assert_eq!(tampered.max_offset(), 0);
    }

    #[test]
    fn test_blank_circuit_has_shape_lengths() {
        let shape = CircuitShape::new(4, 3, 6).unwrap();
        let circuit = MatchCircuit::blank(shape, Fp::from(b'*' as u64));
        assert_eq!(circuit.pattern.len(), 3);
        assert_eq!(circuit.client.len(), 6);
        assert_eq!(circuit.offset_indicators.len(), 4);
        assert_eq!(circuit.siblings.len(), 2);
        assert_eq!(circuit.index_bits.len(), 2);
    }
}
