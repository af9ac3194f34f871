//! Serialized output of an in-circuit match proof.

use crate::circuit::CircuitShape;
use crate::error::{MatchError, Result};
use crate::utils::{field_to_hex, hex_to_field, FIELD_BYTES};
use crate::witness::PublicInputs;
use log::debug;
use serde::{Deserialize, Serialize};

/// Everything a verifier needs besides the alphabet.
///
/// The shape selects the verifying key; the two commitments are the public
/// inputs. Neither the pattern, its index nor the offset is included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchProofOutput {
    /// Merkle root of the pattern commitment, 64 hex chars.
    pub merkle_root: String,
    /// `Hash(client)`, 64 hex chars.
    pub client_hash: String,
    pub shape: CircuitShape,
    /// Raw proof bytes
    pub zkp_proof: Vec<u8>,
    /// Unix timestamp when the proof was generated
    pub timestamp: u64,
}

impl MatchProofOutput {
    const TIMESTAMP_TOLERANCE_SECS: u64 = 30;

    pub fn new(shape: CircuitShape, public: &PublicInputs, proof: Vec<u8>) -> Self {
        Self {
            merkle_root: field_to_hex(public.root),
            client_hash: field_to_hex(public.client_hash),
            shape,
            zkp_proof: proof,
            timestamp: unix_now().unwrap_or_default(),
        }
    }

    /// Parses the public inputs.
    ///
    /// # Errors
    /// [`MatchError::MalformedInput`] for hex that is not a canonical
    /// field element.
    pub fn public_inputs(&self) -> Result<PublicInputs> {
        let parse = |name: &str, hex: &str| {
            hex_to_field(hex)
                .map_err(|e| MatchError::MalformedInput(format!("invalid {name}: {e}")))
        };

        Ok(PublicInputs {
            root: parse("merkle root", &self.merkle_root)?,
            client_hash: parse("client hash", &self.client_hash)?,
        })
    }

    /// Structural checks that need no keys.
    ///
    /// # Errors
    /// [`MatchError::MalformedInput`] for an empty proof, unparseable
    /// commitments, an impossible shape or a timestamp in the future.
    pub fn validate(&self) -> Result<()> {
        debug!("Starting proof output validation");
        debug!("ZK proof size: {} bytes", self.zkp_proof.len());
        debug!("Shape: {:?}", self.shape);
        debug!("Timestamp: {}", self.timestamp);

        if self.zkp_proof.is_empty() {
            return Err(MatchError::MalformedInput(
                "ZK proof cannot be empty. The proof data is missing.".into(),
            ));
        }

        for (name, hex) in [("merkle root", &self.merkle_root), ("client hash", &self.client_hash)] {
            if hex.len() != FIELD_BYTES * 2 {
                return Err(MatchError::MalformedInput(format!(
                    "{name} must be {} hex characters, got {}",
                    FIELD_BYTES * 2,
                    hex.len()
                )));
            }
        }
        self.public_inputs()?;

        CircuitShape::new(
            self.shape.pattern_count,
            self.shape.pattern_len,
            self.shape.client_len,
        )?;

        if let Some(now) = unix_now() {
            if self.timestamp > now + Self::TIMESTAMP_TOLERANCE_SECS {
                return Err(MatchError::MalformedInput(format!(
                    "Timestamp is too far in the future: {} (current: {now}, tolerance: {}s)",
                    self.timestamp,
                    Self::TIMESTAMP_TOLERANCE_SECS
                )));
            }
        }

        Ok(())
    }
}

fn unix_now() -> Option<u64> {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pasta_curves::pallas;

    fn output() -> MatchProofOutput {
        let public = PublicInputs {
            root: pallas::Base::from(7),
            client_hash: pallas::Base::from(11),
        };
        MatchProofOutput::new(CircuitShape::new(2, 3, 6).unwrap(), &public, vec![1, 2, 3])
    }

    #[test]
    fn test_public_inputs_round_trip_through_hex() {
        let output = output();
        let public = output.public_inputs().unwrap();
        assert_eq!(public.root, pallas::Base::from(7));
        assert_eq!(public.client_hash, pallas::Base::from(11));
        output.validate().unwrap();
    }

    #[test]
    fn test_json_serialization() {
        let output = output();
        let json = serde_json::to_string(&output).unwrap();
        let parsed: MatchProofOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, output);
    }

    #[test]
    fn test_empty_proof_is_rejected() {
        let mut output = output();
        output.zkp_proof.clear();
        assert!(matches!(output.validate(), Err(MatchError::MalformedInput(_))));
    }

    #[test]
    fn test_bad_hex_is_rejected() {
        let mut output = output();
        output.client_hash = "zz".repeat(FIELD_BYTES);
        assert!(output.validate().is_err());
        assert!(output.public_inputs().is_err());
    }

    #[test]
    fn test_impossible_shape_is_rejected() {
        let mut output = output();
        output.shape.pattern_len = 9;
        assert!(output.validate().is_err());
    }

    #[test]
    fn test_future_timestamp_is_rejected() {
        let mut output = output();
        output.timestamp = u64::MAX / 2;
        assert!(output.validate().unwrap_err().to_string().contains("future"));
    }
}
