//! Identity provider (GoTrue) client.
//!
//! Wraps the hosted identity endpoints used by the admin console: password
//! login, signup, OAuth initiation/completion, and token-to-user resolution.
//! There is no retry logic anywhere; every call is attempted once and the
//! provider's own message is surfaced where available.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use sonie_atelier_core::UserId;

use crate::config::SupabaseConfig;

/// Errors that can occur when talking to the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider rejected the call; the message is its own where it sent one.
    #[error("{message}")]
    Provider { status: u16, message: String },

    /// Signup succeeded but no session was issued (email verification pending).
    #[error("Please verify your email before signing in.")]
    VerificationRequired,

    /// Failed to parse a provider response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Session material issued by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Epoch seconds; the provider omits this on some grant types.
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub user: Option<ProviderUser>,
}

/// User object embedded in token responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// The resolved current user; gates every admin-only action and page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub email: Option<String>,
}

/// Client for the hosted identity provider.
#[derive(Clone)]
pub struct IdentityClient {
    client: reqwest::Client,
    base_url: String,
}

impl IdentityClient {
    /// Create a client from the Supabase configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &SupabaseConfig) -> Result<Self, IdentityError> {
        Self::from_parts(format!("{}/auth/v1", config.url), &config.anon_key)
    }

    /// Create a client against an explicit base URL (used by tests).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_parts(
        base_url: impl Into<String>,
        anon_key: &SecretString,
    ) -> Result<Self, IdentityError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(anon_key.expose_secret())
                .map_err(|e| IdentityError::Parse(format!("Invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns the provider's message on rejected credentials, or a
    /// transport error.
    pub async fn login_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, IdentityError> {
        let url = format!("{}/token?grant_type=password", self.base_url);
        let body = serde_json::json!({ "email": email, "password": password });

        let response = self.client.post(&url).json(&body).send().await?;
        Self::session_from_response(response).await
    }

    /// Create an account. The display name travels in the user metadata.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::VerificationRequired`] when the provider
    /// created the account but withheld a session pending email
    /// verification, the provider's message on rejection, or a transport
    /// error.
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, IdentityError> {
        let url = format!("{}/signup", self.base_url);
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "data": { "name": name },
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Self::provider_error(status.as_u16(), response).await);
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| IdentityError::Parse(e.to_string()))?;

        // Signup without an active session means verification is pending.
        if value.get("access_token").is_none() {
            return Err(IdentityError::VerificationRequired);
        }

        serde_json::from_value(value).map_err(|e| IdentityError::Parse(e.to_string()))
    }

    /// Build the provider's OAuth authorization URL for a redirect.
    ///
    /// No network call; failures only happen later, at the provider.
    #[must_use]
    pub fn authorize_url(&self, provider: &str, redirect_to: &str) -> String {
        format!(
            "{}/authorize?provider={}&redirect_to={}&prompt=select_account",
            self.base_url,
            urlencoding::encode(provider),
            urlencoding::encode(redirect_to),
        )
    }

    /// Exchange an authorization code for a session (server-side code flow).
    ///
    /// # Errors
    ///
    /// Returns the provider's message when the exchange is rejected, or a
    /// transport error.
    pub async fn exchange_code(&self, code: &str) -> Result<ProviderSession, IdentityError> {
        let url = format!("{}/token?grant_type=pkce", self.base_url);
        let body = serde_json::json!({ "auth_code": code });

        let response = self.client.post(&url).json(&body).send().await?;
        Self::session_from_response(response).await
    }

    /// Resolve an access token to the current user.
    ///
    /// Fails soft: any rejection (including an expired token) is `None`.
    /// Nothing here refreshes tokens.
    pub async fn resolve_user(&self, access_token: &str) -> Option<AuthenticatedUser> {
        let url = format!("{}/user", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            return None;
        }

        let user: ProviderUser = response.json().await.ok()?;
        Some(AuthenticatedUser {
            id: UserId::new(user.id),
            email: user.email,
        })
    }

    async fn session_from_response(
        response: reqwest::Response,
    ) -> Result<ProviderSession, IdentityError> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::provider_error(status.as_u16(), response).await);
        }
        response
            .json()
            .await
            .map_err(|e| IdentityError::Parse(e.to_string()))
    }

    /// Pull the most specific message out of a GoTrue error body.
    async fn provider_error(status: u16, response: reqwest::Response) -> IdentityError {
        let message = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| {
                ["error_description", "msg", "message", "error"]
                    .iter()
                    .find_map(|key| body.get(key).and_then(Value::as_str).map(str::to_owned))
            })
            .unwrap_or_else(|| "Invalid credentials. Please try again.".to_owned());

        IdentityError::Provider { status, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> IdentityClient {
        #[allow(clippy::unwrap_used)]
        IdentityClient::from_parts(
            "https://project.supabase.co/auth/v1",
            &SecretString::from("anon-key"),
        )
        .unwrap()
    }

    #[test]
    fn test_authorize_url_encodes_redirect() {
        let url = client().authorize_url("google", "http://localhost:3000/admin/callback");
        assert!(url.starts_with("https://project.supabase.co/auth/v1/authorize?provider=google"));
        assert!(url.contains("redirect_to=http%3A%2F%2Flocalhost%3A3000%2Fadmin%2Fcallback"));
        assert!(url.contains("prompt=select_account"));
    }

    #[test]
    fn test_provider_session_tolerates_missing_expiry() {
        let session: ProviderSession = serde_json::from_value(serde_json::json!({
            "access_token": "at",
            "refresh_token": "rt",
        }))
        .expect("session without expiry should parse");
        assert!(session.expires_at.is_none());
        assert!(session.user.is_none());
    }
}
