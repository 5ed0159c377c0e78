//! In-memory user directory.
//!
//! Secrets are kept as SHA-256 digests and compared in constant time.

use std::collections::HashMap;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::ports::outbound::UserDirectory;

#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    users: HashMap<String, [u8; 32]>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_user(mut self, username: &str, secret: &str) -> Self {
        self.insert(username, secret);
        self
    }

    pub fn insert(&mut self, username: &str, secret: &str) {
        self.users.insert(username.to_string(), digest(secret));
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for InMemoryUserDirectory {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut directory = Self::new();
        for (username, secret) in iter {
            directory.insert(username, secret);
        }
        directory
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn exists(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    fn verify_credentials(&self, username: &str, secret: &str) -> bool {
        match self.users.get(username) {
            Some(stored) => bool::from(stored.ct_eq(&digest(secret))),
            None => false,
        }
    }
}

fn digest(secret: &str) -> [u8; 32] {
    Sha256::digest(secret.as_bytes()).into()
}
