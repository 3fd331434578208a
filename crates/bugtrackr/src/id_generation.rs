//! Hash-based bug ID generation.
//!
//! IDs look like `{prefix}-{hash}` (e.g. `bug-k3f9`), where the hash is a
//! base36 rendering of a SHA-256 digest over the report text, the filer, the
//! current time and a retry nonce. The hash grows from 4 to 6 characters as
//! the collection grows so short IDs stay collision-free.
//!
//! ```
//! use bugtrackr::id_generation::BugIdGenerator;
//!
//! let mut generator = BugIdGenerator::new("bug");
//! let id = generator.generate("Crash on save", "Steps...", "alice").unwrap();
//! assert!(id.starts_with("bug-"));
//! ```

use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

const BASE36_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const MAX_NONCE: u32 = 100;
const MIN_HASH_LENGTH: usize = 4;
const MAX_HASH_LENGTH: usize = 6;

/// Errors that can occur during ID generation
#[derive(Debug, Error)]
pub enum IdGenerationError {
    /// Every nonce collided, even at the maximum hash length
    #[error("Unable to generate unique ID after {attempts} attempts")]
    CollisionExhausted {
        /// Nonces tried
        attempts: u32,
    },
}

/// Collision-checking generator for bug IDs.
///
/// The generator remembers every ID it produced or was told about through
/// [`register_id`](Self::register_id), and uses that count to pick the hash
/// length.
#[derive(Debug, Clone)]
pub struct BugIdGenerator {
    prefix: String,
    known_ids: HashSet<String>,
}

impl BugIdGenerator {
    /// Create a generator for the given prefix
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            known_ids: HashSet::new(),
        }
    }

    /// The configured prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Record an ID that already exists in the store
    pub fn register_id(&mut self, id: impl Into<String>) {
        self.known_ids.insert(id.into());
    }

    /// Forget an ID after its bug was deleted
    pub fn forget_id(&mut self, id: &str) {
        self.known_ids.remove(id);
    }

    /// Generate a fresh ID.
    ///
    /// # Errors
    ///
    /// Returns [`IdGenerationError::CollisionExhausted`] if no unique ID could
    /// be produced.
    pub fn generate(
        &mut self,
        title: &str,
        description: &str,
        filer: &str,
    ) -> Result<String, IdGenerationError> {
        let mut length = self.hash_length();

        loop {
            for nonce in 0..MAX_NONCE {
                let id = self.hash_id(title, description, filer, nonce, length);
                if self.known_ids.insert(id.clone()) {
                    if nonce > 0 {
                        debug!(nonce, length, "Bug ID collided, retried with nonce");
                    }
                    return Ok(id);
                }
            }

            if length >= MAX_HASH_LENGTH {
                return Err(IdGenerationError::CollisionExhausted {
                    attempts: MAX_NONCE,
                });
            }
            length += 1;
            warn!(length, "All nonces collided, lengthening bug ID hash");
        }
    }

    fn hash_id(
        &self,
        title: &str,
        description: &str,
        filer: &str,
        nonce: u32,
        length: usize,
    ) -> String {
        let timestamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(format!("{title}|{description}|{filer}|{timestamp}|{nonce}").as_bytes());
        let digest = hasher.finalize();

        format!("{}-{}", self.prefix, encode_base36(&digest[..8], length))
    }

    /// 4 characters up to 500 bugs, 5 up to 1500, 6 beyond.
    fn hash_length(&self) -> usize {
        match self.known_ids.len() {
            0..=500 => MIN_HASH_LENGTH,
            501..=1500 => MIN_HASH_LENGTH + 1,
            _ => MAX_HASH_LENGTH,
        }
    }
}

/// Render up to 8 bytes as a fixed-width base36 string.
fn encode_base36(bytes: &[u8], length: usize) -> String {
    let mut n = bytes
        .iter()
        .fold(0u64, |acc, &byte| acc.wrapping_shl(8) | u64::from(byte));

    let mut out = vec![b'0'; length];
    for slot in out.iter_mut().rev() {
        *slot = BASE36_CHARS[(n % 36) as usize];
        n /= 36;
    }
    out.into_iter().map(char::from).collect()
}
