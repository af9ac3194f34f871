//! Symbol encoding and sequence hashing.
//!
//! Every symbol becomes one field element: a 32-byte block whose low-order
//! byte carries the symbol and whose remaining bytes are zero. A sequence of
//! elements is hashed with a length-prefixed Poseidon chain,
//! `acc = len; acc = H(acc, e)` for each element, so sequences of different
//! lengths never share a chain prefix.

use crate::error::{MatchError, Result};
use crate::utils::{bytes_to_field, poseidon_hash, FIELD_BYTES};
use pasta_curves::pallas;

pub const DEFAULT_SYMBOLS: &str = "abcdefghijklmnopqrstuvwxyz";
pub const DEFAULT_WILDCARD: char = '*';

/// The concrete symbols a client string may contain, plus the reserved
/// wildcard that only patterns may use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<u8>,
    wildcard: u8,
}

impl Default for Alphabet {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_SYMBOLS.as_bytes().to_vec(),
            wildcard: DEFAULT_WILDCARD as u8,
        }
    }
}

impl Alphabet {
    /// Builds an alphabet from a symbol string and a wildcard character.
    ///
    /// # Errors
    /// Returns [`MatchError::Encoding`] if the symbol set is empty, holds
    /// non-ASCII or duplicate characters, or contains the wildcard.
    pub fn new(symbols: &str, wildcard: char) -> Result<Self> {
        if symbols.is_empty() {
            return Err(MatchError::Encoding("alphabet cannot be empty".into()));
        }
        if !symbols.is_ascii() || !wildcard.is_ascii() {
            return Err(MatchError::Encoding(
                "alphabet and wildcard must be ASCII".into(),
            ));
        }

        let wildcard = wildcard as u8;
        let mut seen = [false; 128];
        for &symbol in symbols.as_bytes() {
            if symbol == wildcard {
                return Err(MatchError::Encoding(format!(
                    "wildcard '{}' cannot also be an alphabet symbol",
                    wildcard as char
                )));
            }
            if std::mem::replace(&mut seen[symbol as usize], true) {
                return Err(MatchError::Encoding(format!(
                    "duplicate alphabet symbol '{}'",
                    symbol as char
                )));
            }
        }

        Ok(Self {
            symbols: symbols.as_bytes().to_vec(),
            wildcard,
        })
    }

    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }

    pub fn wildcard(&self) -> u8 {
        self.wildcard
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn contains(&self, symbol: u8) -> bool {
        self.symbols.contains(&symbol)
    }

    /// Field element the circuit compares pattern positions against.
    pub fn wildcard_element(&self) -> pallas::Base {
        encode_symbol(self.wildcard)
    }

    /// Checks that every character of `pattern` is an alphabet symbol or
    /// the wildcard.
    pub fn validate_pattern(&self, pattern: &str) -> Result<()> {
        for (position, symbol) in pattern.bytes().enumerate() {
            if symbol != self.wildcard && !self.contains(symbol) {
                return Err(MatchError::Encoding(format!(
                    "pattern symbol {:?} at position {position} is outside the alphabet",
                    symbol as char
                )));
            }
        }
        Ok(())
    }

    /// Checks that every character of `client` is an alphabet symbol. The
    /// wildcard is reserved and rejected here explicitly.
    pub fn validate_client_string(&self, client: &str) -> Result<()> {
        for (position, symbol) in client.bytes().enumerate() {
            if symbol == self.wildcard {
                return Err(MatchError::Encoding(format!(
                    "client string contains the reserved wildcard at position {position}"
                )));
            }
            if !self.contains(symbol) {
                return Err(MatchError::Encoding(format!(
                    "client symbol {:?} at position {position} is outside the alphabet",
                    symbol as char
                )));
            }
        }
        Ok(())
    }

    /// Encodes a pattern, one field element per symbol.
    pub fn encode_pattern(&self, pattern: &str) -> Result<Vec<pallas::Base>> {
        self.validate_pattern(pattern)?;
        Ok(encode_bytes(pattern.as_bytes()))
    }

    /// Encodes a client string, one field element per symbol.
    pub fn encode_client_string(&self, client: &str) -> Result<Vec<pallas::Base>> {
        self.validate_client_string(client)?;
        Ok(encode_bytes(client.as_bytes()))
    }

    /// `Hash(Encode(pattern))`, the value committed as a Merkle leaf.
    pub fn hash_pattern(&self, pattern: &str) -> Result<pallas::Base> {
        Ok(hash_elements(&self.encode_pattern(pattern)?))
    }

    /// `Hash(Encode(client))`, the public client-string commitment.
    pub fn hash_client_string(&self, client: &str) -> Result<pallas::Base> {
        Ok(hash_elements(&self.encode_client_string(client)?))
    }
}

/// Encodes a single symbol into the low-order byte of a 32-byte block.
#[inline]
#[must_use]
pub fn encode_symbol(symbol: u8) -> pallas::Base {
    let mut block = [0u8; FIELD_BYTES];
    block[FIELD_BYTES - 1] = symbol;
    bytes_to_field(&block)
}

fn encode_bytes(bytes: &[u8]) -> Vec<pallas::Base> {
    bytes.iter().copied().map(encode_symbol).collect()
}

/// Length-prefixed Poseidon chain over a sequence of field elements.
#[must_use]
pub fn hash_elements(elements: &[pallas::Base]) -> pallas::Base {
    elements
        .iter()
        .fold(pallas::Base::from(elements.len() as u64), |acc, element| {
            poseidon_hash(acc, *element)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_alphabet() {
        let alphabet = Alphabet::default();
        assert_eq!(alphabet.len(), 26);
        assert_eq!(alphabet.wildcard(), b'*');
        assert!(alphabet.contains(b'q'));
        assert!(!alphabet.contains(b'*'));
    }

    #[test]
    fn test_alphabet_rejects_wildcard_symbol() {
        let err = Alphabet::new("ab*", '*').unwrap_err();
        assert!(matches!(err, MatchError::Encoding(_)));
    }

    #[test]
    fn test_alphabet_rejects_duplicates_and_empty() {
        assert!(matches!(
            Alphabet::new("abca", '*'),
            Err(MatchError::Encoding(_))
        ));
        assert!(matches!(Alphabet::new("", '*'), Err(MatchError::Encoding(_))));
    }

    #[test]
    fn test_encode_places_symbol_in_low_byte() {
        let alphabet = Alphabet::default();
        let encoded = alphabet.encode_pattern("a*").unwrap();
        assert_eq!(
            encoded,
            vec![pallas::Base::from(b'a' as u64), pallas::Base::from(b'*' as u64)]
        );
        assert_eq!(alphabet.wildcard_element(), encoded[1]);
    }

    #[test]
    fn test_pattern_outside_alphabet_is_rejected() {
        let alphabet = Alphabet::default();
        let err = alphabet.encode_pattern("aBc").unwrap_err();
        assert!(err.to_string().contains("outside the alphabet"));
    }

    #[test]
    fn test_client_string_rejects_wildcard() {
        let alphabet = Alphabet::default();
        let err = alphabet.encode_client_string("ab*").unwrap_err();
        assert!(err.to_string().contains("reserved wildcard"));
    }

    #[test]
    fn test_hash_depends_on_length_and_order() {
        let alphabet = Alphabet::default();
        let abc = alphabet.hash_pattern("abc").unwrap();
        assert_eq!(abc, alphabet.hash_pattern("abc").unwrap());
        assert_ne!(abc, alphabet.hash_pattern("acb").unwrap());
        assert_ne!(abc, alphabet.hash_pattern("abca").unwrap());
        assert_ne!(hash_elements(&[]), hash_elements(&[pallas::Base::zero()]));
    }

    #[test]
    fn test_client_and_pattern_hash_agree_on_concrete_strings() {
        let alphabet = Alphabet::default();
        assert_eq!(
            alphabet.hash_pattern("def").unwrap(),
            alphabet.hash_client_string("def").unwrap()
        );
    }
}
