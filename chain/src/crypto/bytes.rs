//! Fixed-width byte containers for hashes, keys, nonces and signatures.

use std::fmt;

/// A generic fixed-width byte array, used for every fixed-size value the
/// chain protocol moves around: hashes, private/public keys, nonces and
/// signatures.
///
/// `FixedBytes` never allocates beyond its `N`-byte backing array, and
/// equality is plain byte comparison (constant-time comparison is not
/// required by this protocol).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedBytes<const N: usize>(pub [u8; N]);

impl<const N: usize> FixedBytes<N> {
    pub fn data(&self) -> &[u8; N] {
        &self.0
    }

    pub fn length(&self) -> usize {
        N
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl<const N: usize> Default for FixedBytes<N> {
    fn default() -> Self {
        Self([0u8; N])
    }
}

impl<const N: usize> From<[u8; N]> for FixedBytes<N> {
    fn from(value: [u8; N]) -> Self {
        Self(value)
    }
}

impl<const N: usize> AsRef<[u8]> for FixedBytes<N> {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl<const N: usize> std::ops::Deref for FixedBytes<N> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

/// Error returned when a byte slice has the wrong length to become a
/// [`FixedBytes<N>`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("expected {expected} bytes, got {actual}")]
pub struct WrongLength {
    pub expected: usize,
    pub actual: usize,
}

impl<const N: usize> TryFrom<&[u8]> for FixedBytes<N> {
    type Error = WrongLength;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        if value.len() != N {
            return Err(WrongLength {
                expected: N,
                actual: value.len(),
            });
        }
        let mut out = [0u8; N];
        out.copy_from_slice(value);
        Ok(Self(out))
    }
}

impl<const N: usize> TryFrom<Vec<u8>> for FixedBytes<N> {
    type Error = WrongLength;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        Self::try_from(value.as_slice())
    }
}

impl<const N: usize> fmt::Debug for FixedBytes<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// 32-byte SHA-256 digest.
pub type Hash32 = FixedBytes<32>;
/// 32-byte secp256k1 private key scalar.
pub type PrivateKey32 = FixedBytes<32>;
/// 33-byte compressed secp256k1 public key.
pub type PublicKey33 = FixedBytes<33>;
/// 64-byte compact ECDSA signature.
pub type Signature64 = FixedBytes<64>;
/// 8-byte per-block nonce.
pub type Nonce8 = FixedBytes<8>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_slice() {
        let raw = [7u8; 32];
        let fb: Hash32 = Hash32::try_from(raw.as_slice()).unwrap();
        assert_eq!(fb.as_slice(), &raw[..]);
        assert_eq!(fb.length(), 32);
    }

    #[test]
    fn rejects_wrong_length() {
        let err = Hash32::try_from(&[1u8, 2, 3][..]).unwrap_err();
        assert_eq!(err.expected, 32);
        assert_eq!(err.actual, 3);
    }

    #[test]
    fn equality_is_by_content() {
        let a = Hash32::from([1u8; 32]);
        let b = Hash32::from([1u8; 32]);
        let c = Hash32::from([2u8; 32]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
