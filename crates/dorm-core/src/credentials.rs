//! Admin credential store.
//!
//! Accounts come from configuration and are fixed for the process lifetime.
//! Passwords are compared as plain text, matching how the accounts are
//! configured. A password written as an argon2 PHC string (`$argon2id$…`) is
//! verified with argon2 instead.

use std::collections::HashMap;

use argon2::{Argon2, PasswordHash, PasswordVerifier};

use crate::{Error, Result};

/// Separates accounts in a delimited list.
pub const ACCOUNT_SEPARATOR: char = ',';

/// Separates username and password within one account.
pub const PAIR_SEPARATOR: char = ':';

#[derive(Debug, Clone)]
pub struct CredentialStore {
  accounts: HashMap<String, String>,
}

impl CredentialStore {
  /// A store holding exactly one account.
  pub fn single(username: impl Into<String>, password: impl Into<String>) -> Self {
    let mut accounts = HashMap::new();
    accounts.insert(username.into(), password.into());
    Self { accounts }
  }

  /// Parse `user:password,user2:password2`.
  ///
  /// Whitespace around entries is ignored and empty entries are skipped. The
  /// password is everything after the first `:`, so it may itself contain
  /// colons.
  pub fn parse_list(list: &str) -> Result<Self> {
    let mut accounts = HashMap::new();

    for entry in list.split(ACCOUNT_SEPARATOR).map(str::trim) {
      if entry.is_empty() {
        continue;
      }
      let (username, password) = entry
        .split_once(PAIR_SEPARATOR)
        .ok_or_else(|| Error::MalformedAccount(entry.to_owned()))?;
      let username = username.trim();
      if username.is_empty() || password.is_empty() {
        return Err(Error::MalformedAccount(entry.to_owned()));
      }
      accounts.insert(username.to_owned(), password.to_owned());
    }

    if accounts.is_empty() {
      return Err(Error::NoAccounts);
    }
    Ok(Self { accounts })
  }

  /// Build from configuration: a non-blank `list` replaces the single pair.
  pub fn from_config(
    username: &str,
    password: &str,
    list: Option<&str>,
  ) -> Result<Self> {
    match list.map(str::trim).filter(|l| !l.is_empty()) {
      Some(list) => Self::parse_list(list),
      None if username.is_empty() => Err(Error::NoAccounts),
      None => Ok(Self::single(username, password)),
    }
  }

  pub fn verify(&self, username: &str, password: &str) -> bool {
    let Some(expected) = self.accounts.get(username) else {
      return false;
    };

    if expected.starts_with("$argon2") {
      return match PasswordHash::new(expected) {
        Ok(hash) => Argon2::default()
          .verify_password(password.as_bytes(), &hash)
          .is_ok(),
        Err(e) => {
          tracing::warn!(username, error = %e, "unparseable argon2 hash in configuration");
          false
        }
      };
    }

    expected == password
  }

  pub fn usernames(&self) -> impl Iterator<Item = &str> {
    self.accounts.keys().map(String::as_str)
  }

  pub fn len(&self) -> usize { self.accounts.len() }

  pub fn is_empty(&self) -> bool { self.accounts.is_empty() }
}

#[cfg(test)]
mod tests {
  use argon2::{PasswordHasher, password_hash::SaltString};

  use super::*;

  #[test]
  fn single_account_exact_match() {
    let store = CredentialStore::single("admin", "admin123");
    assert!(store.verify("admin", "admin123"));
    assert!(!store.verify("admin", "Admin123"));
    assert!(!store.verify("admin", "admin123 "));
    assert!(!store.verify("root", "admin123"));
  }

  #[test]
  fn parse_list_accepts_multiple_accounts() {
    let store = CredentialStore::parse_list(" alice:pw1 , bob:p:w2,").unwrap();
    assert_eq!(store.len(), 2);
    assert!(store.verify("alice", "pw1"));
    assert!(store.verify("bob", "p:w2"));
    assert!(!store.verify("bob", "p"));
  }

  #[test]
  fn parse_list_rejects_malformed_entries() {
    assert!(matches!(
      CredentialStore::parse_list("alice"),
      Err(Error::MalformedAccount(_))
    ));
    assert!(matches!(
      CredentialStore::parse_list(":pw"),
      Err(Error::MalformedAccount(_))
    ));
    assert!(matches!(CredentialStore::parse_list(" , "), Err(Error::NoAccounts)));
  }

  #[test]
  fn list_overrides_single_pair() {
    let store = CredentialStore::from_config("admin", "admin123", Some("warden:keys")).unwrap();
    assert!(!store.verify("admin", "admin123"));
    assert!(store.verify("warden", "keys"));

    let fallback = CredentialStore::from_config("admin", "admin123", Some("  ")).unwrap();
    assert!(fallback.verify("admin", "admin123"));
  }

  #[test]
  fn argon2_hashes_are_verified() {
    let salt = SaltString::from_b64("c29tZXNhbHR2YWx1ZQ").unwrap();
    let hash = Argon2::default()
      .hash_password(b"s3cret", &salt)
      .unwrap()
      .to_string();

    let store = CredentialStore::single("admin", hash.clone());
    assert!(store.verify("admin", "s3cret"));
    assert!(!store.verify("admin", "wrong"));
    assert!(!store.verify("admin", &hash));
  }
}
