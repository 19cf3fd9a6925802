//! Cryptographic randomness readiness checks and byte fill.
//!
//! The reference implementation wraps OpenSSL's `RAND_status`/`RAND_poll`,
//! which can report "not yet seeded" on some platforms. `rand::rngs::OsRng`
//! draws directly from the operating system CSPRNG and has no such
//! intermediate state, so `status`/`poll` are trivial here — they are kept
//! as real functions (not constants) so the boot sequence in `main` reads
//! the same way the reference `ChainDB::initializeRandomGenerator` does,
//! and so a future platform-specific check has somewhere to live.

use rand::RngCore;

/// Reports whether the random source is ready to produce output.
pub fn status() -> bool {
    true
}

/// Requests additional entropy be mixed into the random source, if the
/// platform supports it. A no-op over `OsRng`.
pub fn poll() -> bool {
    true
}

/// Fills `output` with random bytes.
///
/// `private` distinguishes a "high-assurance" draw (used for private key
/// material) from a general-purpose draw (used for nonces). Both draw from
/// the same OS CSPRNG in this implementation; the distinction exists at
/// the call site for auditability, mirroring the reference's
/// `Random::random(output, length, priv)`.
pub fn fill(output: &mut [u8], private: bool) {
    let _ = private;
    rand::rngs::OsRng.fill_bytes(output);
}
