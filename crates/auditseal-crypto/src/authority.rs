//! ECDSA signing authority.
//!
//! Signatures are ECDSA over P-256 with SHA-256, computed over the UTF-8
//! bytes of the chain hash string, DER-encoded, then base64 (standard
//! alphabet, padded).  ECDSA signatures are randomized, so signing the same
//! hash twice yields different strings that both verify.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use tracing::debug;

use auditseal_contracts::{AuditSealError, AuditSealResult};
use auditseal_core::traits::SignatureAuthority;

use crate::keypair::SigningKeypair;

/// Process-wide signer.  Read-only after construction and shared by
/// reference across all writers.
pub struct EcdsaSignatureAuthority {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
    public_sec1: Vec<u8>,
    key_id: String,
}

impl EcdsaSignatureAuthority {
    /// Produce a fresh keypair.
    pub fn generate_keypair() -> SigningKeypair {
        SigningKeypair::generate()
    }

    /// An authority with a freshly generated, in-memory key.
    ///
    /// Signatures made with it cannot be verified after the process exits.
    pub fn generate() -> Self {
        Self::from_keypair(&Self::generate_keypair())
    }

    pub fn from_keypair(keypair: &SigningKeypair) -> Self {
        let signing_key = SigningKey::from(keypair.secret_key().clone());
        let verifying_key = VerifyingKey::from(&signing_key);
        Self {
            signing_key,
            verifying_key,
            public_sec1: keypair.public_key_sec1(),
            key_id: keypair.key_id(),
        }
    }

    /// SEC1-encoded public key, for publishing to external verifiers.
    pub fn public_key_sec1(&self) -> &[u8] {
        &self.public_sec1
    }

    /// Verify against an arbitrary SEC1 public key.  Returns false on any
    /// decoding failure.
    pub fn verify_with_public_key(public_sec1: &[u8], hash: &str, signature: &str) -> bool {
        match VerifyingKey::from_sec1_bytes(public_sec1) {
            Ok(key) => verify_encoded(&key, hash, signature),
            Err(_) => false,
        }
    }
}

impl SignatureAuthority for EcdsaSignatureAuthority {
    fn sign(&self, hash: &str) -> AuditSealResult<String> {
        let signature: Signature = self
            .signing_key
            .try_sign(hash.as_bytes())
            .map_err(|e| AuditSealError::SigningFailed {
                reason: e.to_string(),
            })?;
        Ok(STANDARD.encode(signature.to_der().as_bytes()))
    }

    fn verify(&self, hash: &str, signature: &str) -> bool {
        verify_encoded(&self.verifying_key, hash, signature)
    }

    fn key_id(&self) -> &str {
        &self.key_id
    }
}

fn verify_encoded(key: &VerifyingKey, hash: &str, signature: &str) -> bool {
    if signature.is_empty() {
        return false;
    }
    let Ok(der) = STANDARD.decode(signature) else {
        debug!("signature is not valid base64");
        return false;
    };
    let Ok(signature) = Signature::from_der(&der) else {
        debug!("signature is not a valid DER ECDSA signature");
        return false;
    };
    key.verify(hash.as_bytes(), &signature).is_ok()
}

impl std::fmt::Debug for EcdsaSignatureAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EcdsaSignatureAuthority")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}
