//! Authentication extractors for the admin console.
//!
//! The session is a signed cookie; these extractors verify it against the
//! site's session secret and then resolve the access token to a user at the
//! identity provider. A cookie whose token no longer resolves (expired or
//! revoked) is treated the same as no cookie at all, so an admin page never
//! renders for a stale session.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};

use crate::services::AuthenticatedUser;
use crate::session::{self, AdminSession};
use crate::state::AppState;

/// Extractor that requires a verified admin session whose access token still
/// resolves to a user.
///
/// Without one, HTML requests are redirected to the login page and `/api/`
/// requests get a plain 401.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(admin: RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", admin.session.email)
/// }
/// ```
#[derive(Debug)]
pub struct RequireAdmin {
    pub session: AdminSession,
    pub user: AuthenticatedUser,
}

/// Rejection when the admin session is missing or does not verify.
pub enum AuthRejection {
    /// Redirect to the login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl AuthRejection {
    fn for_request(parts: &Parts) -> Self {
        if parts.uri.path().starts_with("/api/") {
            Self::Unauthorized
        } else {
            Self::RedirectToLogin
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/admin").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(session) = session::read(&parts.headers, state.session_secret()) else {
            return Err(AuthRejection::for_request(parts));
        };

        // Local signature verification is not enough: the token inside the
        // cookie can expire or be revoked well before the cookie does.
        let Some(user) = state.identity().resolve_user(&session.access_token).await else {
            return Err(AuthRejection::for_request(parts));
        };

        Ok(Self { session, user })
    }
}

/// Extractor that optionally reads the admin session cookie.
///
/// Purely local: no identity-provider call. Used by the login page to skip
/// itself when a cookie is present; never gates content.
pub struct OptionalAdmin(pub Option<AdminSession>);

impl FromRequestParts<AppState> for OptionalAdmin {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(session::read(&parts.headers, state.session_secret())))
    }
}
