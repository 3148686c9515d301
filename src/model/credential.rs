use std::fmt;

use serde::{Deserialize, Serialize};

/// Keys of the four required credential fields, in display order.
pub const CREDENTIAL_FIELDS: [&str; 4] = ["apiKey", "apiSecret", "accessToken", "refreshToken"];

/// The single shared storage-provider credential set.
///
/// `Debug` output never shows the secret values.
#[derive(Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct CredentialRecord {
    pub api_key: String,
    pub api_secret: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl CredentialRecord {
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Value of a field by its key, see [`CREDENTIAL_FIELDS`].
    pub fn field(
        &self,
        key: &str,
    ) -> Option<&str> {
        match key {
            "apiKey" => Some(&self.api_key),
            "apiSecret" => Some(&self.api_secret),
            "accessToken" => Some(&self.access_token),
            "refreshToken" => Some(&self.refresh_token),
            _ => None,
        }
    }
}

fn mask(value: &str) -> &'static str {
    if value.is_empty() { "" } else { "****" }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("api_key", &mask(&self.api_key))
            .field("api_secret", &mask(&self.api_secret))
            .field("access_token", &mask(&self.access_token))
            .field("refresh_token", &mask(&self.refresh_token))
            .finish()
    }
}
