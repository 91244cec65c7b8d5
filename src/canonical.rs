//! Canonical serialization for deterministic graph fingerprints.
//!
//! Graphs and fitted parameters are hashed from their canonical JSON bytes so
//! that two runs over the same data and configuration can be compared by a
//! single string.
//!
//! ## Determinism Guarantees
//!
//! - Stable field order: struct fields serialize in declaration order
//! - Stable Vec order: nodes and edges are stored sorted before hashing
//! - No HashMap in hashed data: use BTreeMap
//! - Floats are quantized with [`quantize_float`] before they enter a hash

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

/// Quantization factor for float normalization.
/// Floats are multiplied by this value and rounded to i64.
pub const FLOAT_QUANTIZATION_FACTOR: f64 = 1_000_000.0;

/// Serialize a value to canonical JSON bytes for hashing.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    // Plain data types with derived Serialize cannot fail to encode as JSON.
    serde_json::to_vec(value).expect("Canonical serialization failed")
}

/// Compute canonical hash of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    xxh64(&to_canonical_bytes(value), 0)
}

/// Compute canonical hash and return as hex string.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}

/// Quantize a float to an i64 for deterministic hashing.
///
/// Infinite values saturate to `i64::MIN`/`i64::MAX`; NaN maps to 0.
pub fn quantize_float(value: f64) -> i64 {
    (value * FLOAT_QUANTIZATION_FACTOR).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Interval {
        lower: i64,
        upper: i64,
    }

    #[test]
    fn test_determinism() {
        let interval = Interval { lower: 0, upper: 3_076_923 };

        assert_eq!(canonical_hash(&interval), canonical_hash(&interval));
        assert_eq!(canonical_hash_hex(&interval).len(), 16);
    }

    #[test]
    fn test_quantize_float() {
        assert_eq!(quantize_float(0.2), 200_000);
        assert_eq!(quantize_float(-1.5), -1_500_000);
        assert_eq!(quantize_float(f64::INFINITY), i64::MAX);
        assert_eq!(quantize_float(f64::NAN), 0);
    }
}
