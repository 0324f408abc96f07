//! Upload-ticket signing for the media host.
//!
//! The browser uploads files straight to Cloudinary; the server's only job
//! is to hand out a short-lived signed parameter set so the signing secret
//! never leaves the server. Cloudinary's signature is the SHA-1 hex digest
//! of the canonical parameter string (`key=value` pairs sorted by key,
//! joined with `&`) with the API secret appended.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use sha1::{Digest, Sha1};

use crate::config::CloudinaryConfig;

/// Signed parameter set authorizing one client-side upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadTicket {
    pub signature: String,
    pub timestamp: i64,
    #[serde(rename = "cloudName")]
    pub cloud_name: String,
    #[serde(rename = "apiKey")]
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
}

/// Computes upload tickets from the server-held media credentials.
#[derive(Clone)]
pub struct UploadSigner {
    cloud_name: String,
    api_key: String,
    api_secret: SecretString,
}

impl UploadSigner {
    /// Create a signer from the media host configuration.
    #[must_use]
    pub fn new(config: &CloudinaryConfig) -> Self {
        Self {
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        }
    }

    /// Build a signer from raw credentials (used by tests).
    #[must_use]
    pub fn from_parts(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: SecretString,
    ) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret,
        }
    }

    /// Sign an arbitrary parameter set.
    ///
    /// Pure: identical parameters always produce the identical signature.
    #[must_use]
    pub fn sign(&self, params: &[(&str, &str)]) -> String {
        let mut sorted: Vec<&(&str, &str)> = params.iter().collect();
        sorted.sort_by_key(|(key, _)| *key);

        let canonical = sorted
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha1::new();
        hasher.update(canonical.as_bytes());
        hasher.update(self.api_secret.expose_secret().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Issue an upload ticket for the given timestamp and optional folder.
    ///
    /// The caller reads the clock; everything here is deterministic.
    #[must_use]
    pub fn issue_ticket(&self, folder: Option<&str>, timestamp: i64) -> UploadTicket {
        let ts = timestamp.to_string();
        let mut params: Vec<(&str, &str)> = vec![("timestamp", &ts)];
        if let Some(folder) = folder {
            params.push(("folder", folder));
        }

        UploadTicket {
            signature: self.sign(&params),
            timestamp,
            cloud_name: self.cloud_name.clone(),
            api_key: self.api_key.clone(),
            folder: folder.map(str::to_owned),
        }
    }
}
