//! Detached PGP signature verification seam.
//!
//! The PGP backend is a capability that may be absent. The resolver talks
//! to a [`SignatureVerifier`] trait object; when no real backend is
//! installed, [`NullVerifier`] reports every signature as skipped, which
//! forces the effective value of `no_pgp` to true.

use async_trait::async_trait;

/// Outcome of checking a detached signature against its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureVerdict {
    /// The signature is valid for the payload.
    Valid,
    /// The signature does not match the payload.
    InvalidSignature,
    /// No configured key server knows the signing key.
    KeyNotFound,
    /// The backend or its key servers could not be reached.
    Unavailable,
    /// No verifier is installed; nothing was checked.
    Skipped,
}

/// Verification backend for detached `.asc` signatures.
#[async_trait]
pub trait SignatureVerifier: Send + Sync {
    async fn verify(
        &self,
        data: &[u8],
        detached_signature: &[u8],
        key_servers: &[String],
    ) -> SignatureVerdict;

    /// Whether this verifier actually checks anything.
    fn enabled(&self) -> bool {
        true
    }
}

/// The absent-backend verifier: skips every signature.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullVerifier;

#[async_trait]
impl SignatureVerifier for NullVerifier {
    async fn verify(
        &self,
        _data: &[u8],
        _detached_signature: &[u8],
        _key_servers: &[String],
    ) -> SignatureVerdict {
        SignatureVerdict::Skipped
    }

    fn enabled(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_verifier_skips() {
        let verifier = NullVerifier;
        assert!(!verifier.enabled());
        let verdict = verifier.verify(b"data", b"sig", &[]).await;
        assert_eq!(verdict, SignatureVerdict::Skipped);
    }
}
