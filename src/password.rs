use crate::error::ModelResult;

/// Hash a plaintext password for storage in `user.password`.
pub fn hash_password(plaintext: &str, cost: u32) -> ModelResult<String> {
    Ok(bcrypt::hash(plaintext, cost)?)
}

/// Verify plaintext against a stored hash. Malformed hashes never match.
pub fn verify_password(plaintext: &str, stored: &str) -> bool {
    bcrypt::verify(plaintext, stored).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    #[test]
    fn hash_is_not_plaintext_and_verifies() {
        let hash = hash_password("hunter2", TEST_COST).unwrap();
        assert_ne!(hash, "hunter2");
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn malformed_hash_does_not_verify() {
        assert!(!verify_password("hunter2", "not-a-bcrypt-hash"));
    }

    #[test]
    fn invalid_cost_is_an_error() {
        assert!(hash_password("hunter2", 1).is_err());
    }
}
