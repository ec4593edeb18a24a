use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::{RngExt, distr::Alphanumeric, rng};

const TOKEN_LEN: usize = 48;

/// Opaque auth token: `tok_` plus 48 random alphanumeric characters.
pub fn new_token() -> String {
    let body: String = rng()
        .sample_iter(Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect();
    format!("tok_{}", body)
}

/// Issues a token only when the record has none. Creation is the single
/// issuance point; a re-save must never overwrite an existing token.
pub fn ensure_token(user: &mut crate::db::models::User) {
    if user.auth_token.is_none() {
        user.auth_token = Some(new_token());
    }
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_token_shape() {
        let token = new_token();
        assert!(token.starts_with("tok_"));
        assert_eq!(token.len(), 4 + TOKEN_LEN);
        assert!(token[4..].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_tokens_are_unique() {
        let tokens: HashSet<String> = (0..200).map(|_| new_token()).collect();
        assert_eq!(tokens.len(), 200);
    }

    #[test]
    fn test_ensure_token_never_overwrites() {
        let mut user = crate::db::models::User {
            id: "u1".to_string(),
            firstname: "Ada".to_string(),
            lastname: "Lovelace".to_string(),
            username: "ada".to_string(),
            age: None,
            password_hash: String::new(),
            auth_token: None,
            created_at: 0,
        };

        ensure_token(&mut user);
        let issued = user.auth_token.clone().unwrap();
        assert!(issued.starts_with("tok_"));

        ensure_token(&mut user);
        assert_eq!(user.auth_token.as_deref(), Some(issued.as_str()));
    }

    #[test]
    fn test_password_hash_verifies() {
        let hash = hash_password("hunter2").unwrap();
        assert_ne!(hash, "hunter2");
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(!verify_password("hunter2", "not-a-phc-string"));
    }
}
