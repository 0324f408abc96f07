//! Application state shared across handlers.

use std::sync::Arc;

use secrecy::SecretString;

use crate::config::SiteConfig;
use crate::services::{CatalogClient, IdentityClient, UploadSigner};

/// Error building the shared application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("catalog client: {0}")]
    Catalog(#[from] crate::services::CatalogError),
    #[error("identity client: {0}")]
    Identity(#[from] crate::services::IdentityError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// hosted-service clients and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SiteConfig,
    catalog: CatalogClient,
    identity: IdentityClient,
    signer: UploadSigner,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the HTTP clients fails to build.
    pub fn new(config: SiteConfig) -> Result<Self, StateError> {
        let catalog = CatalogClient::new(&config.supabase)?;
        let identity = IdentityClient::new(&config.supabase)?;
        let signer = UploadSigner::new(&config.cloudinary);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                identity,
                signer,
            }),
        })
    }

    /// Build state from preconstructed clients (used by tests).
    #[must_use]
    pub fn from_parts(
        config: SiteConfig,
        catalog: CatalogClient,
        identity: IdentityClient,
        signer: UploadSigner,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                identity,
                signer,
            }),
        }
    }

    /// Get a reference to the site configuration.
    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    /// Get a reference to the catalog store client.
    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    /// Get a reference to the identity provider client.
    #[must_use]
    pub fn identity(&self) -> &IdentityClient {
        &self.inner.identity
    }

    /// Get a reference to the upload-ticket signer.
    #[must_use]
    pub fn signer(&self) -> &UploadSigner {
        &self.inner.signer
    }

    /// The secret used to sign the admin session cookie.
    #[must_use]
    pub fn session_secret(&self) -> &SecretString {
        &self.inner.config.session_secret
    }
}
