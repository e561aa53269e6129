use sha2::{Digest, Sha256};

/// Stable cache key over multiple text parts. Used to avoid re-scoring
/// identical (response, question) pairs and re-running question detection
/// on identical text within a session.
pub fn cache_key(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_stable_and_part_sensitive() {
        assert_eq!(cache_key(&["a", "b"]), cache_key(&["a", "b"]));
        assert_ne!(cache_key(&["a", "b"]), cache_key(&["ab"]));
        assert_ne!(cache_key(&["a", "b"]), cache_key(&["b", "a"]));
    }
}
