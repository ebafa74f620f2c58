//! Pseudonymous visitor identifiers
//!
//! A visitor is identified by a SHA-256 digest of the client address, the
//! user agent and a secret salt. The raw address is never persisted, and
//! without the salt the digest cannot be linked back to it.

use sha2::{Digest, Sha256};

/// Placeholder used when the address or user agent is not available
pub const UNKNOWN: &str = "unknown";

/// Length of a rendered visitor hash (SHA-256 as lowercase hex)
pub const VISITOR_HASH_LEN: usize = 64;

/// Derives visitor hashes with a salt fixed at construction
#[derive(Clone)]
pub struct VisitorHasher {
    salt: String,
}

impl VisitorHasher {
    pub fn new(salt: impl Into<String>) -> Self {
        Self { salt: salt.into() }
    }

    /// Hash an (address, user agent) pair into a 64 character hex token
    ///
    /// Empty inputs are treated as [`UNKNOWN`] so that a missing header and
    /// an absent one hash identically.
    pub fn hash(&self, address: &str, user_agent: &str) -> String {
        let address = if address.is_empty() { UNKNOWN } else { address };
        let user_agent = if user_agent.is_empty() {
            UNKNOWN
        } else {
            user_agent
        };

        let mut hasher = Sha256::new();
        hasher.update(format!("{}-{}-{}", address, user_agent, self.salt).as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

// Never print the salt.
impl std::fmt::Debug for VisitorHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisitorHasher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UA: &str = "Mozilla/5.0 (X11; Linux x86_64) Firefox/128.0";

    #[test]
    fn test_hash_is_deterministic() {
        let hasher = VisitorHasher::new("salt");
        assert_eq!(hasher.hash("203.0.113.7", UA), hasher.hash("203.0.113.7", UA));
    }

    #[test]
    fn test_hash_is_fixed_length_lowercase_hex() {
        let hash = VisitorHasher::new("salt").hash("203.0.113.7", UA);
        assert_eq!(hash.len(), VISITOR_HASH_LEN);
        assert!(hash
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_each_input_changes_hash() {
        let base = VisitorHasher::new("salt").hash("203.0.113.7", UA);
        assert_ne!(base, VisitorHasher::new("salt").hash("203.0.113.8", UA));
        assert_ne!(base, VisitorHasher::new("salt").hash("203.0.113.7", "curl/8.0"));
        assert_ne!(base, VisitorHasher::new("pepper").hash("203.0.113.7", UA));
    }

    #[test]
    fn test_hash_matches_reference_digest() {
        // sha256("1.2.3.4-ua-s")
        let mut reference = Sha256::new();
        reference.update(b"1.2.3.4-ua-s");
        let expected = format!("{:x}", reference.finalize());
        assert_eq!(VisitorHasher::new("s").hash("1.2.3.4", "ua"), expected);
    }

    #[test]
    fn test_empty_inputs_hash_as_unknown() {
        let hasher = VisitorHasher::new("salt");
        assert_eq!(hasher.hash("", ""), hasher.hash(UNKNOWN, UNKNOWN));
    }

    #[test]
    fn test_debug_hides_salt() {
        let rendered = format!("{:?}", VisitorHasher::new("top-secret"));
        assert!(!rendered.contains("top-secret"));
    }
}
