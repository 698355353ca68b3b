//! Deterministic pseudo-embedding derived from a content hash.
//!
//! Used when the remote embedding service is unreachable. Carries no
//! semantic information, but identical text always yields a bit-identical
//! vector, so re-ingestion under retries stays idempotent.

use sha2::{Digest, Sha256};

/// Expand the SHA-256 of `text` counter-mode into `dimension` floats
/// in [-1, 1].
pub fn fallback_embedding(text: &str, dimension: usize) -> Vec<f32> {
    let seed = Sha256::digest(text.as_bytes());
    let mut values = Vec::with_capacity(dimension);
    let mut counter: u32 = 0;

    while values.len() < dimension {
        let mut hasher = Sha256::new();
        hasher.update(seed);
        hasher.update(counter.to_le_bytes());
        let block = hasher.finalize();

        for word in block.chunks_exact(4) {
            if values.len() == dimension {
                break;
            }
            let n = u32::from_le_bytes([word[0], word[1], word[2], word[3]]);
            values.push((n as f64 / u32::MAX as f64 * 2.0 - 1.0) as f32);
        }
        counter += 1;
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_dimension() {
        assert_eq!(fallback_embedding("hello", 768).len(), 768);
        assert_eq!(fallback_embedding("hello", 7).len(), 7);
        assert_eq!(fallback_embedding("", 16).len(), 16);
    }

    #[test]
    fn test_deterministic() {
        let a = fallback_embedding("the same text", 768);
        let b = fallback_embedding("the same text", 768);
        assert_eq!(a, b);
    }

    #[test]
    fn test_distinct_texts_differ() {
        let a = fallback_embedding("text one", 64);
        let b = fallback_embedding("text two", 64);
        assert_ne!(a, b);
    }

    #[test]
    fn test_values_in_range() {
        for v in fallback_embedding("range check", 256) {
            assert!((-1.0..=1.0).contains(&v), "out of range: {}", v);
        }
    }
}
