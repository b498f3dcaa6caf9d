//! Password hashing
//!
//! Argon2id over `password ++ pepper` with a random 16-byte salt. The encoded
//! form is `v=<argon2 version>$<base64(key ++ salt)>` using the standard
//! alphabet without padding.

use argon2::{Algorithm, Argon2, Params, Version};
use base64::{Engine, engine::general_purpose::STANDARD_NO_PAD};
use rand::{RngCore, rngs::OsRng};

/// Argon2 memory cost in KiB
pub const MEMORY_KIB: u32 = 46 * 1024;
/// Argon2 passes over memory
pub const TIME_COST: u32 = 1;
/// Argon2 lanes
pub const PARALLELISM: u32 = 1;
/// Derived key length in bytes
pub const KEY_LEN: usize = 32;
/// Salt length in bytes
pub const SALT_LEN: usize = 16;

/// Argon2 version 0x13, written as a decimal in the encoded hash
const VERSION_TAG: u32 = 19;

/// Password hashing errors
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("invalid hash format")]
    Invalid,

    #[error("hash doesn't match")]
    Mismatched,

    #[error("incompatible version")]
    Incompatible,

    #[error("hashing failed: {0}")]
    Internal(String),
}

impl From<argon2::Error> for HashError {
    fn from(err: argon2::Error) -> Self {
        HashError::Internal(err.to_string())
    }
}

/// Hashes and verifies passwords
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, HashError>;

    /// `Ok(())` when `password` produces `encoded`
    fn compare(&self, password: &str, encoded: &str) -> Result<(), HashError>;
}

/// Peppered Argon2id hasher
#[derive(Clone)]
pub struct Argon2idHasher {
    pepper: String,
    memory_kib: u32,
    time_cost: u32,
    parallelism: u32,
}

impl Argon2idHasher {
    /// Hasher with the production cost parameters
    pub fn new(pepper: impl Into<String>) -> Self {
        Self::with_cost(pepper, MEMORY_KIB, TIME_COST, PARALLELISM)
    }

    /// Hasher with custom cost parameters.
    ///
    /// Hashes produced with one set of parameters only verify under the same
    /// parameters; the encoded form does not record them.
    pub fn with_cost(
        pepper: impl Into<String>,
        memory_kib: u32,
        time_cost: u32,
        parallelism: u32,
    ) -> Self {
        Self {
            pepper: pepper.into(),
            memory_kib,
            time_cost,
            parallelism,
        }
    }

    fn derive(&self, password: &str, salt: &[u8]) -> Result<[u8; KEY_LEN], HashError> {
        let params = Params::new(
            self.memory_kib,
            self.time_cost,
            self.parallelism,
            Some(KEY_LEN),
        )?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut input = Vec::with_capacity(password.len() + self.pepper.len());
        input.extend_from_slice(password.as_bytes());
        input.extend_from_slice(self.pepper.as_bytes());

        let mut key = [0u8; KEY_LEN];
        argon2.hash_password_into(&input, salt, &mut key)?;
        Ok(key)
    }
}

impl std::fmt::Debug for Argon2idHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2idHasher")
            .field("pepper", &"[REDACTED]")
            .field("memory_kib", &self.memory_kib)
            .field("time_cost", &self.time_cost)
            .field("parallelism", &self.parallelism)
            .finish()
    }
}

impl PasswordHasher for Argon2idHasher {
    fn hash(&self, password: &str) -> Result<String, HashError> {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);

        let key = self.derive(password, &salt)?;

        let mut payload = Vec::with_capacity(KEY_LEN + SALT_LEN);
        payload.extend_from_slice(&key);
        payload.extend_from_slice(&salt);

        Ok(format!(
            "v={}${}",
            VERSION_TAG,
            STANDARD_NO_PAD.encode(payload)
        ))
    }

    fn compare(&self, password: &str, encoded: &str) -> Result<(), HashError> {
        let parts: Vec<&str> = encoded.split('$').collect();
        let [tag, payload] = parts.as_slice() else {
            return Err(HashError::Invalid);
        };

        let version: u32 = tag
            .strip_prefix("v=")
            .and_then(|v| v.parse().ok())
            .ok_or(HashError::Incompatible)?;
        if version != VERSION_TAG {
            return Err(HashError::Incompatible);
        }

        let payload = STANDARD_NO_PAD
            .decode(payload)
            .map_err(|_| HashError::Invalid)?;
        if payload.len() < KEY_LEN + argon2::MIN_SALT_LEN {
            return Err(HashError::Invalid);
        }

        let (stored_key, salt) = payload.split_at(KEY_LEN);
        let key = self.derive(password, salt)?;

        if constant_time_eq(&key, stored_key) {
            Ok(())
        } else {
            Err(HashError::Mismatched)
        }
    }
}

/// Compare two byte slices without short-circuiting on the first difference
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_hasher() -> Argon2idHasher {
        Argon2idHasher::with_cost("pepper", 64, 1, 1)
    }

    // ========================================================================
    // Hash / Compare Tests
    // ========================================================================

    #[test]
    fn test_hash_and_compare_round_trip() {
        let hasher = test_hasher();
        let encoded = hasher.hash("Abcdef1!").unwrap();

        assert!(encoded.starts_with("v=19$"));
        assert!(hasher.compare("Abcdef1!", &encoded).is_ok());
    }

    #[test]
    fn test_compare_wrong_password() {
        let hasher = test_hasher();
        let encoded = hasher.hash("Abcdef1!").unwrap();

        let result = hasher.compare("Abcdef1?", &encoded);
        assert!(matches!(result, Err(HashError::Mismatched)));
    }

    #[test]
    fn test_compare_with_different_pepper() {
        let encoded = test_hasher().hash("Abcdef1!").unwrap();
        let other = Argon2idHasher::with_cost("another", 64, 1, 1);

        assert!(matches!(
            other.compare("Abcdef1!", &encoded),
            Err(HashError::Mismatched)
        ));
    }

    #[test]
    fn test_hash_uses_fresh_salt() {
        let hasher = test_hasher();
        let first = hasher.hash("Abcdef1!").unwrap();
        let second = hasher.hash("Abcdef1!").unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_encoded_payload_holds_key_and_salt() {
        let encoded = test_hasher().hash("Abcdef1!").unwrap();
        let payload = encoded.strip_prefix("v=19$").unwrap();

        assert!(!payload.ends_with('='));
        assert_eq!(
            STANDARD_NO_PAD.decode(payload).unwrap().len(),
            KEY_LEN + SALT_LEN
        );
    }

    // ========================================================================
    // Malformed Input Tests
    // ========================================================================

    #[test]
    fn test_compare_without_separator_is_invalid() {
        let result = test_hasher().compare("Abcdef1!", "nodollarsign");
        assert!(matches!(result, Err(HashError::Invalid)));
    }

    #[test]
    fn test_compare_with_extra_separator_is_invalid() {
        let result = test_hasher().compare("Abcdef1!", "v=19$abc$def");
        assert!(matches!(result, Err(HashError::Invalid)));
    }

    #[test]
    fn test_compare_other_version_is_incompatible() {
        let encoded = test_hasher().hash("Abcdef1!").unwrap();
        let tampered = encoded.replacen("v=19", "v=16", 1);

        let result = test_hasher().compare("Abcdef1!", &tampered);
        assert!(matches!(result, Err(HashError::Incompatible)));
    }

    #[test]
    fn test_compare_bad_tag_is_incompatible() {
        let result = test_hasher().compare("Abcdef1!", "version$AAAA");
        assert!(matches!(result, Err(HashError::Incompatible)));
    }

    #[test]
    fn test_compare_bad_base64_is_invalid() {
        let result = test_hasher().compare("Abcdef1!", "v=19$!!!not-base64!!!");
        assert!(matches!(result, Err(HashError::Invalid)));
    }

    #[test]
    fn test_compare_short_payload_is_invalid() {
        let short = STANDARD_NO_PAD.encode([7u8; KEY_LEN]);
        let result = test_hasher().compare("Abcdef1!", &format!("v=19${}", short));
        assert!(matches!(result, Err(HashError::Invalid)));

        let result = test_hasher().compare("Abcdef1!", "v=19$");
        assert!(matches!(result, Err(HashError::Invalid)));

        // A salt too short for argon2 is a format error, not an internal one
        for len in KEY_LEN + 1..KEY_LEN + argon2::MIN_SALT_LEN {
            let payload = STANDARD_NO_PAD.encode(vec![7u8; len]);
            let result = test_hasher().compare("Abcdef1!", &format!("v=19${}", payload));
            assert!(matches!(result, Err(HashError::Invalid)), "payload of {len} bytes");
        }
    }

    // ========================================================================
    // Helper Tests
    // ========================================================================

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }

    #[test]
    fn test_debug_redacts_pepper() {
        let debug = format!("{:?}", Argon2idHasher::new("super-secret-pepper"));
        assert!(!debug.contains("super-secret-pepper"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_hash_error_display() {
        assert_eq!(HashError::Invalid.to_string(), "invalid hash format");
        assert_eq!(HashError::Mismatched.to_string(), "hash doesn't match");
        assert_eq!(HashError::Incompatible.to_string(), "incompatible version");
    }
}
