//! Deterministic ECDSA over secp256k1 (RFC 6979 nonce derivation).

use secp256k1::{Message, Secp256k1, SecretKey, ecdsa::Signature as EcdsaSignature};

use super::bytes::{Hash32, PrivateKey32, PublicKey33, Signature64};

/// Errors from the secp256k1 primitive. Key generation and signing over a
/// valid 32-byte message are infallible with this crate, but parsing
/// attacker-controlled bytes during verification is not.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("secp256k1 error: {0}")]
    Secp256k1(#[from] secp256k1::Error),
}

/// Generates a fresh secp256k1 private key from the OS CSPRNG.
///
/// `SecretKey::new` already rejection-samples until the scalar is in
/// range, the Rust equivalent of the reference implementation's explicit
/// `secp256k1_ec_seckey_verify` retry loop.
pub fn generate_private_key() -> PrivateKey32 {
    let sk = SecretKey::new(&mut rand::rngs::OsRng);
    PrivateKey32(sk.secret_bytes())
}

/// Derives the 33-byte compressed public key for a private key.
pub fn derive_public_key(sk: &PrivateKey32) -> Result<PublicKey33, CryptoError> {
    let secp = Secp256k1::new();
    let secret = SecretKey::from_slice(sk.as_slice())?;
    let public = secret.public_key(&secp);
    PublicKey33::try_from(public.serialize().as_slice())
        .map_err(|_| CryptoError::Secp256k1(secp256k1::Error::InvalidPublicKey))
}

/// Signs a 32-byte digest with deterministic (RFC 6979) ECDSA, returning
/// the compact 64-byte signature encoding.
pub fn sign(digest: &Hash32, sk: &PrivateKey32) -> Result<Signature64, CryptoError> {
    let secp = Secp256k1::signing_only();
    let secret = SecretKey::from_slice(sk.as_slice())?;
    let message = Message::from_slice(digest.as_slice())?;
    let signature = secp.sign_ecdsa(&message, &secret);
    Ok(Signature64(signature.serialize_compact()))
}

/// Verifies a compact ECDSA signature over a 32-byte digest. Returns
/// `false` (never an error) on a malformed public key or signature,
/// matching the reference `Secp256k1::verifySignature` contract.
pub fn verify(digest: &Hash32, pk: &PublicKey33, signature: &Signature64) -> bool {
    let secp = Secp256k1::verification_only();

    let public = match secp256k1::PublicKey::from_slice(pk.as_slice()) {
        Ok(p) => p,
        Err(_) => return false,
    };

    let sig = match EcdsaSignature::from_compact(signature.as_slice()) {
        Ok(s) => s,
        Err(_) => return false,
    };

    let message = match Message::from_slice(digest.as_slice()) {
        Ok(m) => m,
        Err(_) => return false,
    };

    secp.verify_ecdsa(&message, &sig, &public).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::hash;

    #[test]
    fn sign_then_verify_round_trips() {
        let sk = generate_private_key();
        let pk = derive_public_key(&sk).unwrap();
        let digest = hash([b"hello world".as_slice()]);

        let sig = sign(&digest, &sk).unwrap();
        assert!(verify(&digest, &pk, &sig));
    }

    #[test]
    fn verify_fails_on_wrong_key() {
        let sk1 = generate_private_key();
        let sk2 = generate_private_key();
        let pk2 = derive_public_key(&sk2).unwrap();
        let digest = hash([b"payload".as_slice()]);

        let sig = sign(&digest, &sk1).unwrap();
        assert!(!verify(&digest, &pk2, &sig));
    }

    #[test]
    fn verify_fails_on_tampered_digest() {
        let sk = generate_private_key();
        let pk = derive_public_key(&sk).unwrap();
        let digest = hash([b"payload".as_slice()]);
        let other = hash([b"different".as_slice()]);

        let sig = sign(&digest, &sk).unwrap();
        assert!(!verify(&other, &pk, &sig));
    }

    #[test]
    fn signing_is_deterministic() {
        let sk = generate_private_key();
        let digest = hash([b"deterministic".as_slice()]);

        let sig_a = sign(&digest, &sk).unwrap();
        let sig_b = sign(&digest, &sk).unwrap();
        assert_eq!(sig_a, sig_b, "RFC 6979 signing must be deterministic");
    }

    #[test]
    fn verify_returns_false_on_malformed_public_key() {
        let digest = hash([b"x".as_slice()]);
        let sig = Signature64::default();
        let bad_pk = PublicKey33::default();
        assert!(!verify(&digest, &bad_pk, &sig));
    }
}
