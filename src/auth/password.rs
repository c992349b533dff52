use std::sync::OnceLock;

use crate::error::AppResult;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_USERNAME_LEN: usize = 150;

pub fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    Ok(bcrypt::hash(password, cost)?)
}

/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match bcrypt::verify(password, hash) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!("Unreadable password hash: {}", e);
            false
        }
    }
}

/// Runs a bcrypt check against a throwaway hash so that a login for an
/// unknown account costs as much as one for a real account. Always false.
pub fn verify_without_account(password: &str, cost: u32) -> bool {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();
    let hash = DUMMY_HASH.get_or_init(|| bcrypt::hash("quill-no-such-account", cost).ok());
    if let Some(hash) = hash {
        let _ = bcrypt::verify(password, hash);
    }
    false
}

/// Usernames appear in profile URLs, so they are limited to letters,
/// digits and `@ . + - _`.
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    if username.is_empty() {
        return Err("Username is required.");
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err("Username must be 150 characters or fewer.");
    }
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if !username.chars().all(allowed) {
        return Err("Username may only contain letters, digits and @/./+/-/_ characters.");
    }
    Ok(())
}

pub fn validate_password(password: &str, confirmation: &str) -> Result<(), &'static str> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err("Password must be at least 8 characters.");
    }
    if password != confirmation {
        return Err("The two password fields didn't match.");
    }
    Ok(())
}
