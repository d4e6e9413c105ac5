//! Identity lookup for sign-in.
//!
//! The built-in table compares plain secrets and exists for demos only. Real
//! deployments load a users file whose secrets are argon2 PHC strings.

use crate::ports::CheckOutcome;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::Deserialize;
use thiserror::Error;

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Secret {
    Plain(String),
    Argon2(String),
}

impl Secret {
    fn matches(&self, password: &str) -> bool {
        match self {
            Secret::Plain(secret) => secret == password,
            Secret::Argon2(hash) => verify_password(password, hash),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub secret: Secret,
    pub display_name: String,
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to read users file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse users file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("users file entry '{0}' has an invalid password hash")]
    BadHash(String),
    #[error("users file lists '{0}' more than once")]
    Duplicate(String),
    #[error("users file does not define any users")]
    Empty,
    #[error("failed to hash password: {0}")]
    Hash(String),
}

#[derive(Debug, Deserialize)]
struct UsersFile {
    #[serde(default)]
    users: Vec<UserEntry>,
}

#[derive(Debug, Deserialize)]
struct UserEntry {
    email: String,
    name: String,
    password_hash: String,
}

#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    entries: HashMap<String, Credential>,
}

const BUILTIN_USERS: [(&str, &str, &str); 4] = [
    ("ian@yixy.com", "yixyian", "Ian"),
    ("john@yixy.com", "yixy123", "John"),
    ("sarah@yixy.com", "yixy456", "Sarah"),
    ("mike@yixy.com", "yixy789", "Mike"),
];

static BUILTIN: LazyLock<CredentialStore> = LazyLock::new(CredentialStore::builtin);

impl CredentialStore {
    pub fn builtin() -> Self {
        let entries = BUILTIN_USERS
            .iter()
            .map(|(email, password, name)| {
                (
                    email.to_string(),
                    Credential {
                        secret: Secret::Plain(password.to_string()),
                        display_name: name.to_string(),
                    },
                )
            })
            .collect();
        Self { entries }
    }

    pub fn load(path: &Path) -> Result<Self, CredentialError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, CredentialError> {
        let file: UsersFile = toml::from_str(contents)?;
        if file.users.is_empty() {
            return Err(CredentialError::Empty);
        }

        let mut entries = HashMap::with_capacity(file.users.len());
        for user in file.users {
            if PasswordHash::new(&user.password_hash).is_err() {
                return Err(CredentialError::BadHash(user.email));
            }
            if entries.contains_key(&user.email) {
                return Err(CredentialError::Duplicate(user.email));
            }
            entries.insert(
                user.email,
                Credential {
                    secret: Secret::Argon2(user.password_hash),
                    display_name: user.name,
                },
            );
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&self, email: &str) -> Option<&Credential> {
        self.entries.get(email)
    }

    /// Exact, case-sensitive match on both email and password.
    pub fn validate(&self, email: &str, password: &str) -> bool {
        self.lookup(email)
            .is_some_and(|credential| credential.secret.matches(password))
    }

    pub fn check(&self, email: &str, password: &str) -> CheckOutcome {
        match self.lookup(email) {
            Some(credential) if credential.secret.matches(password) => CheckOutcome::Accepted {
                display_name: credential.display_name.clone(),
            },
            _ => CheckOutcome::Rejected,
        }
    }
}

/// Checks against the built-in demo table.
pub fn validate_credentials(email: &str, password: &str) -> bool {
    BUILTIN.validate(email, password)
}

/// Produces an argon2 PHC string suitable for the users file.
pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let mut salt_bytes = [0u8; 16];
    OsRng.fill_bytes(&mut salt_bytes);
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|err| CredentialError::Hash(err.to_string()))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| CredentialError::Hash(err.to_string()))
}

fn verify_password(password: &str, password_hash: &str) -> bool {
    let hash = match PasswordHash::new(password_hash) {
        Ok(hash) => hash,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &hash)
        .is_ok()
}
