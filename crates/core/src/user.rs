//! User credential record (relational store).

use serde::{Deserialize, Serialize};

use crate::record::Record;

/// A user able to authenticate.
///
/// `password` holds a password verifier (PHC string), never plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password: String,
}

impl User {
    pub fn new(username: &str, password_hash: impl Into<String>) -> Self {
        Self {
            username: normalize_username(username),
            password: password_hash.into(),
        }
    }
}

/// Partial user update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Record for User {
    type Patch = UserPatch;
}

/// Usernames are stored and looked up lowercase.
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames_are_lowercased() {
        assert_eq!(normalize_username(" XuxaDaSilva "), "xuxadasilva");
        assert_eq!(User::new("ADMIN", "hash").username, "admin");
    }
}
