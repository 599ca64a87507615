//! Session-scoped key pair storage.
//!
//! `KeyStore` is the only owner of the active key pair. It is created
//! explicitly and handed to the code paths that seal and verify bookings;
//! there is no global instance.
//!
//! Persistence goes through a pluggable [`KeyBackend`]. Two ship with the
//! crate: in-memory (process scope) and a JSON file (survives restarts for
//! as long as the file does).

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info};

use crate::config::EnvelopeConfig;
use crate::error::EnvelopeError;
use crate::keys::{self, KeyPair, MIN_RSA_BITS};

/// A place where one serialized key pair lives. Implement this to keep the
/// pair in a database row, an OS keychain, or similar.
pub trait KeyBackend: Send {
    /// Return the stored pair, or `None` if the scope holds no pair yet.
    fn load(&mut self) -> Result<Option<KeyPair>, EnvelopeError>;

    /// Persist `pair`, replacing anything already stored.
    fn save(&mut self, pair: &KeyPair) -> Result<(), EnvelopeError>;
}

// ---------------------------------------------------------------------------
// Built-in backend: memory
// ---------------------------------------------------------------------------

/// Keeps the pair for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryKeyBackend {
    pair: Option<KeyPair>,
}

impl MemoryKeyBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyBackend for MemoryKeyBackend {
    fn load(&mut self) -> Result<Option<KeyPair>, EnvelopeError> {
        Ok(self.pair.clone())
    }

    fn save(&mut self, pair: &KeyPair) -> Result<(), EnvelopeError> {
        self.pair = Some(pair.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Built-in backend: file
// ---------------------------------------------------------------------------

/// Stores the pair as a single JSON document
/// (`{"publicKey": "...", "privateKey": "..."}`).
#[derive(Debug, Clone)]
pub struct FileKeyBackend {
    path: PathBuf,
}

impl FileKeyBackend {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyBackend for FileKeyBackend {
    fn load(&mut self) -> Result<Option<KeyPair>, EnvelopeError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored: KeyPair = serde_json::from_str(&text)
            .map_err(|e| EnvelopeError::MalformedInput(format!("stored key pair: {e}")))?;
        // Re-validate so a hand-edited file cannot pair mismatched keys.
        let pair = KeyPair::from_pem(
            stored.public_key().to_string(),
            stored.private_key().to_string(),
        )?;
        Ok(Some(pair))
    }

    fn save(&mut self, pair: &KeyPair) -> Result<(), EnvelopeError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string(pair)
            .map_err(|e| EnvelopeError::Serialization(e.to_string()))?;
        let mut file = fs::File::create(&self.path)?;
        file.write_all(json.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Key store
// ---------------------------------------------------------------------------

struct Inner {
    backend: Box<dyn KeyBackend>,
    active: Option<KeyPair>,
}

/// Owns the session's key pair. Lazily generates it on first use.
///
/// `Send + Sync`: share it behind an `Arc`. The first-use path holds a lock
/// across load-or-generate, so concurrent first callers still observe a
/// single pair.
pub struct KeyStore {
    inner: Mutex<Inner>,
    rsa_bits: usize,
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyStore")
            .field("rsa_bits", &self.rsa_bits)
            .finish_non_exhaustive()
    }
}

impl KeyStore {
    /// A store scoped to this process, generating 2048-bit keys.
    pub fn in_memory() -> Self {
        Self::with_backend(Box::new(MemoryKeyBackend::new()), MIN_RSA_BITS)
    }

    /// A store backed by `backend`, generating `rsa_bits`-bit keys when the
    /// backend is empty.
    pub fn with_backend(backend: Box<dyn KeyBackend>, rsa_bits: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                backend,
                active: None,
            }),
            rsa_bits,
        }
    }

    /// Build a store from configuration: file backend when `key_file` is
    /// set, memory otherwise.
    pub fn from_config(config: &EnvelopeConfig) -> Self {
        let backend: Box<dyn KeyBackend> = match &config.key_file {
            Some(path) => Box::new(FileKeyBackend::new(path)),
            None => Box::new(MemoryKeyBackend::new()),
        };
        Self::with_backend(backend, config.rsa_bits)
    }

    /// Return the active pair, loading or generating it on first call.
    ///
    /// Every call within one scope returns the same pair.
    pub fn get_or_create_key_pair(&self) -> Result<KeyPair, EnvelopeError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| EnvelopeError::KeyGeneration("key store lock poisoned".into()))?;

        if let Some(pair) = &inner.active {
            return Ok(pair.clone());
        }

        if let Some(pair) = inner.backend.load()? {
            info!("loaded persisted key pair");
            inner.active = Some(pair.clone());
            return Ok(pair);
        }

        debug!(bits = self.rsa_bits, "generating key pair");
        let pair = keys::generate_key_pair(self.rsa_bits)?;
        inner.backend.save(&pair)?;
        info!(bits = self.rsa_bits, "generated and persisted new key pair");
        inner.active = Some(pair.clone());
        Ok(pair)
    }

    /// The active public key PEM.
    pub fn public_key(&self) -> Result<String, EnvelopeError> {
        Ok(self.get_or_create_key_pair()?.public_key().to_string())
    }
}
