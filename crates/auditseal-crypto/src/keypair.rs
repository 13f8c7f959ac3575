//! P-256 key material.
//!
//! The secret half never leaves this type except through `to_secret_hex`,
//! used only when writing a key file.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use p256::{PublicKey, SecretKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use auditseal_contracts::{AuditSealError, AuditSealResult};

/// Length of the key id prefix taken from the public key digest.
const KEY_ID_BYTES: usize = 8;

/// An elliptic-curve (NIST P-256) keypair.
#[derive(Clone)]
pub struct SigningKeypair {
    secret: SecretKey,
    public: PublicKey,
}

impl SigningKeypair {
    /// Generate a fresh keypair from the OS random source.
    pub fn generate() -> Self {
        let secret = SecretKey::random(&mut OsRng);
        let public = secret.public_key();
        Self { secret, public }
    }

    /// Rebuild a keypair from the 32-byte big-endian secret scalar.
    pub fn from_secret_bytes(bytes: &[u8]) -> AuditSealResult<Self> {
        let secret = SecretKey::from_slice(bytes).map_err(|_| AuditSealError::KeyMaterial {
            reason: format!("invalid P-256 secret key ({} bytes)", bytes.len()),
        })?;
        let public = secret.public_key();
        Ok(Self { secret, public })
    }

    /// Rebuild a keypair from a hex-encoded secret scalar.
    pub fn from_secret_hex(s: &str) -> AuditSealResult<Self> {
        let bytes = hex::decode(s.trim()).map_err(|e| AuditSealError::KeyMaterial {
            reason: format!("secret key is not valid hex: {e}"),
        })?;
        Self::from_secret_bytes(&bytes)
    }

    pub fn to_secret_hex(&self) -> String {
        hex::encode(self.secret.to_bytes())
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.secret
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// SEC1-encoded public key (uncompressed point).
    pub fn public_key_sec1(&self) -> Vec<u8> {
        self.public.to_sec1_bytes().to_vec()
    }

    /// Hex of the first 8 bytes of SHA-256 over the SEC1 public key.
    pub fn key_id(&self) -> String {
        let digest = Sha256::digest(self.public_key_sec1());
        hex::encode(&digest[..KEY_ID_BYTES])
    }

    /// Load the keypair stored at `path`.
    ///
    /// The file holds the hex-encoded secret scalar on a single line.
    pub fn load(path: impl AsRef<Path>) -> AuditSealResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| AuditSealError::KeyMaterial {
            reason: format!("failed to read key file '{}': {}", path.display(), e),
        })?;
        let keypair = Self::from_secret_hex(&contents)?;
        info!(path = %path.display(), key_id = %keypair.key_id(), "loaded signing key");
        Ok(keypair)
    }

    /// Load the keypair stored at `path`, or generate one and write it there.
    ///
    /// When several processes start against the same missing file, exactly
    /// one key is published and every caller ends up with it.
    pub fn load_or_generate(path: impl AsRef<Path>) -> AuditSealResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }

        let keypair = Self::generate();
        match keypair.publish(path) {
            Ok(()) => {
                info!(path = %path.display(), key_id = %keypair.key_id(), "generated signing key");
                Ok(keypair)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "key file created concurrently, loading it");
                Self::load(path)
            }
            Err(e) => Err(AuditSealError::KeyMaterial {
                reason: format!("failed to write key file '{}': {}", path.display(), e),
            }),
        }
    }

    /// Write the secret to a new file at `path`, creating parent directories.
    ///
    /// The file is readable by its owner only (mode 0600 on Unix).  An
    /// existing file is never overwritten.
    pub fn write_to(&self, path: impl AsRef<Path>) -> AuditSealResult<()> {
        let path = path.as_ref();
        self.publish(path).map_err(|e| AuditSealError::KeyMaterial {
            reason: format!("failed to write key file '{}': {}", path.display(), e),
        })
    }

    /// Write the secret to an owner-only temporary file beside `path`, then
    /// hard-link it into place.  The link fails with `AlreadyExists` if
    /// `path` appeared in the meantime, and readers never see a partial file.
    fn publish(&self, path: &Path) -> io::Result<()> {
        let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            fs::create_dir_all(parent)?;
        }
        let file_name = path
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "key path has no file name"))?;
        let staging = parent.unwrap_or_else(|| Path::new("")).join(format!(
            ".{}.{:016x}.tmp",
            file_name.to_string_lossy(),
            rand::random::<u64>()
        ));

        let written = write_owner_only(&staging, &format!("{}\n", self.to_secret_hex()))
            .and_then(|()| fs::hard_link(&staging, path));
        let _ = fs::remove_file(&staging);
        written
    }
}

fn write_owner_only(path: &Path, contents: &str) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()
}

impl fmt::Debug for SigningKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKeypair")
            .field("key_id", &self.key_id())
            .finish_non_exhaustive()
    }
}
