//! Cryptographic primitives used by the chain protocol: fixed-width byte
//! containers (C1), SHA-256 hashing (C2), secp256k1 signatures (C3), and
//! the random source (C4).

pub mod bytes;
pub mod ecdsa;
pub mod hash;
pub mod random;

pub use bytes::{FixedBytes, Hash32, Nonce8, PrivateKey32, PublicKey33, Signature64, WrongLength};
pub use ecdsa::CryptoError;
