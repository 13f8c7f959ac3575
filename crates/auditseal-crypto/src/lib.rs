//! # auditseal-crypto
//!
//! The signing authority for AuditSeal: ECDSA over NIST P-256, implementing
//! [`SignatureAuthority`](auditseal_core::traits::SignatureAuthority).
//!
//! ## Key lifecycle
//!
//! By default the key is generated once at process start and held only in
//! memory.  Pass a key file path to [`SigningKeypair::load_or_generate`] to
//! keep signatures verifiable across restarts.

pub mod authority;
pub mod keypair;

pub use authority::EcdsaSignatureAuthority;
pub use keypair::SigningKeypair;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    use auditseal_core::traits::SignatureAuthority;

    use super::{EcdsaSignatureAuthority, SigningKeypair};

    const HASH: &str = "3f0a9c1e5b7d2f4a6c8e0b1d3f5a7c9e1b3d5f7a9c0e2b4d6f8a0c2e4b6d8f0a";

    /// Flip one bit of the decoded signature and re-encode it.
    fn flip_signature_bit(signature: &str, byte: usize) -> String {
        let mut raw = STANDARD.decode(signature).unwrap();
        let idx = byte.min(raw.len() - 1);
        raw[idx] ^= 0x01;
        STANDARD.encode(raw)
    }

    #[test]
    fn test_sign_then_verify() {
        let authority = EcdsaSignatureAuthority::generate();
        let signature = authority.sign(HASH).unwrap();
        assert!(!signature.is_empty());
        assert!(authority.verify(HASH, &signature));
    }

    #[test]
    fn test_altered_hash_fails() {
        let authority = EcdsaSignatureAuthority::generate();
        let signature = authority.sign(HASH).unwrap();
        let altered = format!("4{}", &HASH[1..]);
        assert!(!authority.verify(&altered, &signature));
    }

    #[test]
    fn test_altered_signature_fails() {
        let authority = EcdsaSignatureAuthority::generate();
        let signature = authority.sign(HASH).unwrap();
        let last = STANDARD.decode(&signature).unwrap().len() - 1;
        assert!(!authority.verify(HASH, &flip_signature_bit(&signature, last)));
        assert!(!authority.verify(HASH, &flip_signature_bit(&signature, 10)));
    }

    #[test]
    fn test_malformed_signatures_are_false_not_errors() {
        let authority = EcdsaSignatureAuthority::generate();
        assert!(!authority.verify(HASH, ""));
        assert!(!authority.verify(HASH, "not base64 !!"));
        assert!(!authority.verify(HASH, &STANDARD.encode(b"not a DER signature")));
    }

    #[test]
    fn test_other_key_does_not_verify() {
        let signer = EcdsaSignatureAuthority::generate();
        let other = EcdsaSignatureAuthority::generate();
        let signature = signer.sign(HASH).unwrap();
        assert!(!other.verify(HASH, &signature));
        assert_ne!(signer.key_id(), other.key_id());
    }

    #[test]
    fn test_verify_with_published_public_key() {
        let authority = EcdsaSignatureAuthority::generate();
        let signature = authority.sign(HASH).unwrap();
        let public = authority.public_key_sec1().to_vec();
        assert!(EcdsaSignatureAuthority::verify_with_public_key(&public, HASH, &signature));
        assert!(!EcdsaSignatureAuthority::verify_with_public_key(b"junk", HASH, &signature));
    }

    #[test]
    fn test_key_id_is_stable_for_a_keypair() {
        let keypair = SigningKeypair::generate();
        assert_eq!(keypair.key_id(), keypair.key_id());
        assert_eq!(keypair.key_id().len(), 16);
        let authority = EcdsaSignatureAuthority::from_keypair(&keypair);
        assert_eq!(authority.key_id(), keypair.key_id());
    }

    #[test]
    fn test_secret_hex_round_trip_keeps_identity() {
        let keypair = SigningKeypair::generate();
        let restored = SigningKeypair::from_secret_hex(&keypair.to_secret_hex()).unwrap();
        assert_eq!(restored.key_id(), keypair.key_id());
        assert!(SigningKeypair::from_secret_hex("zz").is_err());
        assert!(SigningKeypair::from_secret_bytes(&[0u8; 32]).is_err());
    }

    /// A signature made before a "restart" verifies after reloading the key file.
    #[test]
    fn test_key_file_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys").join("signing.key");

        let first = EcdsaSignatureAuthority::from_keypair(
            &SigningKeypair::load_or_generate(&path).unwrap(),
        );
        let signature = first.sign(HASH).unwrap();
        assert!(path.exists());

        let second = EcdsaSignatureAuthority::from_keypair(
            &SigningKeypair::load_or_generate(&path).unwrap(),
        );
        assert_eq!(first.key_id(), second.key_id());
        assert!(second.verify(HASH, &signature));
    }

    #[cfg(unix)]
    #[test]
    fn test_key_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signing.key");
        SigningKeypair::load_or_generate(&path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode & 0o077, 0, "key file mode {mode:o} is readable by others");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1, "staging file left behind");
    }

    #[test]
    fn test_write_to_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signing.key");
        let original = SigningKeypair::generate();
        original.write_to(&path).unwrap();

        assert!(SigningKeypair::generate().write_to(&path).is_err());
        assert_eq!(SigningKeypair::load(&path).unwrap().key_id(), original.key_id());
    }

    /// Racing first starts all converge on the one key that was published.
    #[test]
    fn test_concurrent_first_start_agrees_on_one_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signing.key");

        let key_ids: Vec<String> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| SigningKeypair::load_or_generate(&path).unwrap().key_id()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let on_disk = SigningKeypair::load(&path).unwrap().key_id();
        assert!(key_ids.iter().all(|id| *id == on_disk), "{key_ids:?}");
    }

    #[test]
    fn test_debug_does_not_leak_secret() {
        let keypair = SigningKeypair::generate();
        let debug = format!("{keypair:?}");
        assert!(!debug.contains(&keypair.to_secret_hex()));
    }
}
