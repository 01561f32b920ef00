//! Accounts and bearer-token sessions
//!
//! Passwords are stored as BLAKE3 digests keyed with a per-user random salt.
//! Session tokens are random and only their digest is persisted, so a leaked
//! database does not leak usable tokens.

use crate::storage::{SqliteStore, StoredUser};
use crate::{Error, Result};
use serde::Serialize;

/// Shortest accepted password, in bytes
pub const MIN_PASSWORD_LEN: usize = 8;

const SALT_LEN: usize = 32;
const TOKEN_LEN: usize = 32;

/// Public view of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
}

impl From<StoredUser> for UserProfile {
    fn from(user: StoredUser) -> Self {
        Self { id: user.id, username: user.username }
    }
}

/// A freshly issued session
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user: UserProfile,
    pub token: String,
}

/// Account operations over a store
pub struct AuthService<'a> {
    store: &'a SqliteStore,
}

impl<'a> AuthService<'a> {
    pub fn new(store: &'a SqliteStore) -> Self {
        Self { store }
    }

    /// Create an account and log it in
    pub fn signup(&self, username: &str, password: &str) -> Result<Session> {
        let username = username.trim();
        if username.is_empty() {
            return Err(Error::Validation("username must not be blank".to_string()));
        }
        check_password_strength(password)?;

        let salt = random_bytes::<SALT_LEN>()?;
        let user = self.store.insert_user(username, &salt, &hash_password(&salt, password))?;
        tracing::info!(user_id = user.id, "account created");

        let token = self.issue_token(user.id)?;
        Ok(Session { user: user.into(), token })
    }

    /// Exchange credentials for a new bearer token
    pub fn login(&self, username: &str, password: &str) -> Result<Session> {
        let Some(user) = self.store.find_user_by_username(username.trim())? else {
            // Unknown usernames still pay for one digest
            std::hint::black_box(hash_password(&[0u8; SALT_LEN], password));
            return Err(bad_credentials());
        };

        if !verify_password(&user, password) {
            return Err(bad_credentials());
        }

        let token = self.issue_token(user.id)?;
        Ok(Session { user: user.into(), token })
    }

    /// Resolve a bearer token to its user
    pub fn authenticate(&self, token: &str) -> Result<UserProfile> {
        self.store
            .find_user_by_session(&hash_token(token))?
            .map(UserProfile::from)
            .ok_or_else(|| Error::Unauthorized("invalid token".to_string()))
    }

    /// Replace a user's password. All existing sessions are revoked and a
    /// new token is issued.
    pub fn change_password(&self, username: &str, current: &str, new: &str) -> Result<Session> {
        let user = self
            .store
            .find_user_by_username(username)?
            .ok_or_else(|| Error::Unauthorized("unknown user".to_string()))?;

        if !verify_password(&user, current) {
            return Err(Error::Unauthorized("current password is incorrect".to_string()));
        }
        check_password_strength(new)?;

        let salt = random_bytes::<SALT_LEN>()?;
        self.store.update_user_password(user.id, &salt, &hash_password(&salt, new))?;
        let revoked = self.store.delete_sessions_for_user(user.id)?;
        tracing::info!(user_id = user.id, revoked, "password changed");

        let token = self.issue_token(user.id)?;
        Ok(Session { user: user.into(), token })
    }

    fn issue_token(&self, user_id: i64) -> Result<String> {
        let token = blake3::Hash::from(random_bytes::<TOKEN_LEN>()?).to_hex().to_string();
        self.store.insert_session(&hash_token(&token), user_id)?;
        Ok(token)
    }
}

fn bad_credentials() -> Error {
    Error::Unauthorized("invalid username or password".to_string())
}

fn check_password_strength(password: &str) -> Result<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(Error::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

fn hash_password(salt: &[u8; SALT_LEN], password: &str) -> String {
    blake3::keyed_hash(salt, password.as_bytes()).to_hex().to_string()
}

fn verify_password(user: &StoredUser, password: &str) -> bool {
    let Ok(salt) = <[u8; SALT_LEN]>::try_from(user.password_salt.as_slice()) else {
        tracing::warn!(user_id = user.id, "stored salt has unexpected length");
        return false;
    };
    let Ok(expected) = blake3::Hash::from_hex(&user.password_hash) else {
        tracing::warn!(user_id = user.id, "stored password hash is not valid hex");
        return false;
    };
    // blake3::Hash equality is constant-time
    blake3::keyed_hash(&salt, password.as_bytes()) == expected
}

fn hash_token(token: &str) -> String {
    blake3::hash(token.as_bytes()).to_hex().to_string()
}

fn random_bytes<const N: usize>() -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    getrandom::fill(&mut buf).map_err(|e| Error::Random(e.to_string()))?;
    Ok(buf)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_login_authenticate() {
        let store = SqliteStore::open_in_memory().unwrap();
        let auth = AuthService::new(&store);

        let session = auth.signup("grace", "correct horse").unwrap();
        assert_eq!(session.user.username, "grace");
        assert_eq!(session.token.len(), TOKEN_LEN * 2);

        let user = auth.authenticate(&session.token).unwrap();
        assert_eq!(user, session.user);

        let login = auth.login("grace", "correct horse").unwrap();
        assert_ne!(login.token, session.token);
        assert!(matches!(auth.login("grace", "wrong pass"), Err(Error::Unauthorized(_))));
        assert!(matches!(auth.login("nobody", "correct horse"), Err(Error::Unauthorized(_))));
    }

    #[test]
    fn test_signup_rejects_weak_or_duplicate() {
        let store = SqliteStore::open_in_memory().unwrap();
        let auth = AuthService::new(&store);

        assert!(matches!(auth.signup("grace", "short"), Err(Error::Validation(_))));
        assert!(matches!(auth.signup("  ", "long enough"), Err(Error::Validation(_))));

        auth.signup("grace", "long enough").unwrap();
        assert!(matches!(auth.signup("grace", "long enough"), Err(Error::Conflict(_))));
    }

    #[test]
    fn test_change_password_revokes_sessions() {
        let store = SqliteStore::open_in_memory().unwrap();
        let auth = AuthService::new(&store);

        let old = auth.signup("linus", "first password").unwrap();
        assert!(matches!(
            auth.change_password("linus", "not it at all", "second password"),
            Err(Error::Unauthorized(_))
        ));

        let fresh = auth.change_password("linus", "first password", "second password").unwrap();
        assert!(matches!(auth.authenticate(&old.token), Err(Error::Unauthorized(_))));
        assert_eq!(auth.authenticate(&fresh.token).unwrap().username, "linus");

        assert!(auth.login("linus", "first password").is_err());
        assert!(auth.login("linus", "second password").is_ok());
    }

    #[test]
    fn test_login_failures_are_indistinguishable() {
        let store = SqliteStore::open_in_memory().unwrap();
        let auth = AuthService::new(&store);
        auth.signup("grace", "correct horse").unwrap();

        let unknown = auth.login("nobody", "correct horse").unwrap_err().to_string();
        let wrong = auth.login("grace", "wrong password").unwrap_err().to_string();
        assert_eq!(unknown, wrong);
    }

    #[test]
    fn test_unknown_token_message() {
        let store = SqliteStore::open_in_memory().unwrap();
        let auth = AuthService::new(&store);

        let err = auth.authenticate("deadbeef").unwrap_err();
        assert!(matches!(&err, Error::Unauthorized(msg) if msg == "invalid token"));
    }

    #[test]
    fn test_tokens_are_lowercase_hex() {
        let store = SqliteStore::open_in_memory().unwrap();
        let auth = AuthService::new(&store);

        let session = auth.signup("ken", "unix philosophy").unwrap();
        assert!(session.token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(hash_token(&session.token).len(), 64);
    }

    #[test]
    fn test_password_digest_is_salted() {
        let a = hash_password(&[1u8; SALT_LEN], "same password");
        let b = hash_password(&[2u8; SALT_LEN], "same password");
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
    }
}
