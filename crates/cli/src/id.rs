//! Record key generation for new tasks
//!
//! Keys are six lowercase alphanumeric characters derived from a SHA-256
//! digest of the task name and a random salt. The first character is
//! always a letter so the key never parses as a number in SurrealQL.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of generated keys
pub const ID_LENGTH: usize = 6;

/// Candidates offered before giving up on a collision-free key
pub const MAX_ATTEMPTS: usize = 10;

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Produces candidate record keys for one task
#[derive(Debug)]
pub struct IdGenerator {
    seed: String,
    attempts: usize,
}

impl IdGenerator {
    pub fn new(seed: &str) -> Self {
        Self {
            seed: seed.to_string(),
            attempts: 0,
        }
    }

    /// Next candidate key, or `None` once [`MAX_ATTEMPTS`] have been used.
    pub fn next_id(&mut self) -> Option<String> {
        if self.attempts >= MAX_ATTEMPTS {
            return None;
        }
        self.attempts += 1;

        let salt: u64 = rand::rng().random();
        let mut hasher = Sha256::new();
        hasher.update(self.seed.as_bytes());
        hasher.update(self.attempts.to_le_bytes());
        hasher.update(salt.to_le_bytes());
        let digest = hasher.finalize();

        let mut id = String::with_capacity(ID_LENGTH);
        id.push(LETTERS[digest[0] as usize % LETTERS.len()] as char);
        for byte in digest.iter().skip(1).take(ID_LENGTH - 1) {
            id.push(ALPHANUMERIC[*byte as usize % ALPHANUMERIC.len()] as char);
        }
        Some(id)
    }
}
