//! Field conversion, Poseidon hashing and hex helpers.

use anyhow::Result;
use halo2_gadgets::poseidon::primitives::{
    self as poseidon, ConstantLength, P128Pow5T3 as PoseidonSpec,
};
use pasta_curves::group::ff::PrimeField;
use pasta_curves::pallas;

/// Width of one encoded block in bytes.
pub const FIELD_BYTES: usize = 32;

fn is_valid_hex_string(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_hexdigit())
}

fn strip_hex_prefix(input: &str) -> &str {
    input
        .trim()
        .strip_prefix("0x")
        .or_else(|| input.trim().strip_prefix("0X"))
        .unwrap_or_else(|| input.trim())
}

/// Validates and strips the hex prefix from a string.
///
/// # Errors
/// Returns an error if the stripped string has the wrong length or contains
/// non-hex characters.
///
/// # Examples
///
/// ```
/// use zkp_pattern_match::utils::validate_and_strip_hex;
///
/// let result = validate_and_strip_hex("0x1234abcd", 8).unwrap();
/// assert_eq!(result, "1234abcd");
/// ```
pub fn validate_and_strip_hex(input: &str, expected_len: usize) -> Result<String> {
    let stripped = strip_hex_prefix(input);

    if stripped.len() != expected_len {
        return Err(anyhow::anyhow!(
            "Invalid hex string: must be {} characters (got {})",
            expected_len,
            stripped.len()
        ));
    }

    if !is_valid_hex_string(stripped) {
        return Err(anyhow::anyhow!(
            "Invalid hex string: contains non-hex characters"
        ));
    }

    Ok(stripped.to_string())
}

const BASE_U64: u64 = 256;

/// Interprets 32 bytes as a big-endian base-256 number reduced into the
/// Pallas base field.
///
/// A block whose only non-zero byte is the last one maps to that byte's
/// value, which is how single symbols are encoded.
#[inline]
#[must_use]
pub fn bytes_to_field(bytes: &[u8; FIELD_BYTES]) -> pallas::Base {
    let mut value = pallas::Base::zero();
    let base = pallas::Base::from(BASE_U64);

    for &byte in bytes.iter() {
        value = value * base + pallas::Base::from(byte as u64);
    }

    value
}

/// Canonical little-endian representation of a field element.
#[inline]
#[must_use]
pub fn field_to_bytes(field: pallas::Base) -> [u8; FIELD_BYTES] {
    let mut bytes = [0u8; FIELD_BYTES];
    let repr = field.to_repr();
    bytes.copy_from_slice(repr.as_ref());
    bytes
}

/// Hex encoding of [`field_to_bytes`].
#[must_use]
pub fn field_to_hex(field: pallas::Base) -> String {
    hex::encode(field_to_bytes(field))
}

/// Parses the output of [`field_to_hex`].
///
/// # Errors
/// Fails on malformed hex or on a non-canonical encoding (a value not
/// below the field modulus).
pub fn hex_to_field(input: &str) -> Result<pallas::Base> {
    let stripped = validate_and_strip_hex(input, FIELD_BYTES * 2)?;
    let bytes = hex::decode(&stripped)?;

    let mut repr = <pallas::Base as PrimeField>::Repr::default();
    repr.as_mut().copy_from_slice(&bytes);

    Option::from(pallas::Base::from_repr(repr))
        .ok_or_else(|| anyhow::anyhow!("Non-canonical field element encoding: {stripped}"))
}

/// Poseidon hash of two field elements with the `P128Pow5T3` permutation
/// (width 3, rate 2).
///
/// This is the same primitive the in-circuit Poseidon chip implements.
///
/// ```
/// use zkp_pattern_match::utils::poseidon_hash;
/// use pasta_curves::pallas;
///
/// let a = poseidon_hash(pallas::Base::from(1), pallas::Base::from(2));
/// let b = poseidon_hash(pallas::Base::from(2), pallas::Base::from(1));
/// assert_ne!(a, b);
/// ```
#[inline]
#[must_use]
pub fn poseidon_hash(left: pallas::Base, right: pallas::Base) -> pallas::Base {
    let inputs = [left, right];
    poseidon::Hash::<_, PoseidonSpec, ConstantLength<2>, 3, 2>::init().hash(inputs)
}

/// Smallest `k` with `2^k >= n` (0 for `n <= 1`).
#[inline]
#[must_use]
pub fn ceil_log2(n: usize) -> u32 {
    if n <= 1 {
        0
    } else {
        usize::BITS - (n - 1).leading_zeros()
    }
}
