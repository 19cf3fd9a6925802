//! SHA-256 hashing over ordered concatenations of byte segments.

use sha2::{Digest, Sha256};

use super::bytes::Hash32;

/// Folds an ordered sequence of byte segments into a single SHA-256 digest.
///
/// Segment boundaries introduce no framing: this is pure concatenation
/// followed by one SHA-256 pass, matching the reference implementation's
/// `SHA256::getHash(std::vector<std::string>)`.
pub fn hash<I, S>(parts: I) -> Hash32
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_ref());
    }
    Hash32(hasher.finalize().into())
}

/// Iterates `hash` `n` times: `h0 = hash(parts)`, `hi = hash({h(i-1)})` for
/// `i` in `1..n`. For `n = 2` this is SHA-256 of SHA-256, used as the chain's
/// genesis seed (I3).
pub fn hash_n<I, S>(parts: I, n: usize) -> Hash32
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    assert!(n >= 1, "hash_n requires at least one round");
    let mut digest = hash(parts);
    for _ in 1..n {
        digest = hash([digest.as_slice()]);
    }
    digest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_pure_concatenation() {
        let a = hash([b"ab".as_slice()]);
        let b = hash([b"a".as_slice(), b"b".as_slice()]);
        assert_eq!(a, b, "segment boundaries must not introduce framing");
    }

    #[test]
    fn hash_n_of_two_is_double_sha256() {
        let once = hash([b"seed".as_slice()]);
        let twice = hash([once.as_slice()]);
        assert_eq!(hash_n([b"seed".as_slice()], 2), twice);
    }

    #[test]
    fn hash_n_of_one_is_single_round() {
        assert_eq!(hash_n([b"seed".as_slice()], 1), hash([b"seed".as_slice()]));
    }

    #[test]
    fn different_inputs_produce_different_hashes() {
        assert_ne!(hash([b"a".as_slice()]), hash([b"b".as_slice()]));
    }
}
