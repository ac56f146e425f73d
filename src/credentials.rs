//! Network credentials: the single (name, secret) pair the station joins.
//!
//! On disk the pair is a JSON object `{"ssid": "...", "password": "..."}`.
//! Once persisted both fields are non-empty; records that break the
//! invariant are treated as absent by the store.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Longest SSID the radio accepts (802.11).
pub const MAX_NAME_LEN: usize = 32;
/// Longest WPA2 passphrase the radio accepts.
pub const MAX_SECRET_LEN: usize = 64;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(rename = "ssid")]
    pub name: String,
    #[serde(rename = "password")]
    pub secret: String,
}

/// Which field of a submission was unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialsError {
    EmptyName,
    NameTooLong,
    EmptySecret,
    SecretTooLong,
}

impl fmt::Display for CredentialsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "network name is empty"),
            Self::NameTooLong => write!(f, "network name longer than {MAX_NAME_LEN} bytes"),
            Self::EmptySecret => write!(f, "secret is empty"),
            Self::SecretTooLong => write!(f, "secret longer than {MAX_SECRET_LEN} bytes"),
        }
    }
}

impl Credentials {
    /// Build a validated pair.
    pub fn new(name: impl Into<String>, secret: impl Into<String>) -> Result<Self, CredentialsError> {
        let creds = Self {
            name: name.into(),
            secret: secret.into(),
        };
        creds.validate()?;
        Ok(creds)
    }

    pub fn validate(&self) -> Result<(), CredentialsError> {
        if self.name.is_empty() {
            return Err(CredentialsError::EmptyName);
        }
        if self.name.len() > MAX_NAME_LEN {
            return Err(CredentialsError::NameTooLong);
        }
        if self.secret.is_empty() {
            return Err(CredentialsError::EmptySecret);
        }
        if self.secret.len() > MAX_SECRET_LEN {
            return Err(CredentialsError::SecretTooLong);
        }
        Ok(())
    }
}

// Secrets never reach the log.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("name", &self.name)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_pair() {
        let c = Credentials::new("Home", "Secret123").unwrap();
        assert_eq!(c.name, "Home");
        assert_eq!(c.secret, "Secret123");
    }

    #[test]
    fn rejects_empty_fields() {
        assert_eq!(Credentials::new("", "x"), Err(CredentialsError::EmptyName));
        assert_eq!(Credentials::new("Home", ""), Err(CredentialsError::EmptySecret));
    }

    #[test]
    fn rejects_oversized_fields() {
        let long_name = "n".repeat(MAX_NAME_LEN + 1);
        assert_eq!(Credentials::new(long_name, "x"), Err(CredentialsError::NameTooLong));
        let long_secret = "s".repeat(MAX_SECRET_LEN + 1);
        assert_eq!(Credentials::new("Home", long_secret), Err(CredentialsError::SecretTooLong));
    }

    #[test]
    fn json_uses_device_field_names() {
        let c = Credentials::new("Home", "Secret123").unwrap();
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, r#"{"ssid":"Home","password":"Secret123"}"#);
    }

    #[test]
    fn debug_redacts_secret() {
        let c = Credentials::new("Home", "Secret123").unwrap();
        let dbg = format!("{:?}", c);
        assert!(dbg.contains("Home"));
        assert!(!dbg.contains("Secret123"));
    }
}
