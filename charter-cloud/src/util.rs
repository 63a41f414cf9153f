//! Password hashing helpers

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    use argon2::password_hash::SaltString;
    use argon2::password_hash::rand_core::OsRng;
    use argon2::{Argon2, PasswordHasher};
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Lowercased, trimmed email used as the account key
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("hooked-on-tarpon").unwrap();
        assert!(verify_password("hooked-on-tarpon", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("hooked-on-tarpon", "not-a-phc-string"));
    }

    #[test]
    fn email_normalization() {
        assert_eq!(normalize_email("  Skipper@Example.COM "), "skipper@example.com");
    }
}
