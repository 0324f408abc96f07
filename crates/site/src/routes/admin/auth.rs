//! Admin authentication handlers.
//!
//! Three ways in: password login, signup, and Google OAuth. All of them end
//! the same way, with the signed session cookie set and a redirect to
//! `/admin/bags`. Failures re-render the login page with a message (form
//! posts) or redirect to `/admin?error=...` (OAuth legs).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use sonie_atelier_core::Email;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::OptionalAdmin;
use crate::services::ProviderSession;
use crate::session::{self, AdminSession};
use crate::state::AppState;

/// Access-token lifetime assumed when the provider omits `expires_at`.
const FALLBACK_TOKEN_LIFETIME_SECONDS: i64 = 60 * 60;

/// Login/signup page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthQuery {
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteQuery {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<String>,
}

fn login_error_redirect(message: &str) -> Redirect {
    Redirect::to(&format!("/admin?error={}", urlencoding::encode(message)))
}

/// Build the session from a provider response and respond with the cookie set.
fn establish_session(
    state: &AppState,
    provider: &ProviderSession,
    email: String,
) -> Response {
    let session = AdminSession {
        access_token: provider.access_token.clone(),
        refresh_token: provider.refresh_token.clone(),
        expires_at: provider
            .expires_at
            .unwrap_or_else(|| Utc::now().timestamp() + FALLBACK_TOKEN_LIFETIME_SECONDS),
        email,
    };

    if let Some(user) = &provider.user {
        set_sentry_user(&user.id, user.email.as_deref());
    }

    let cookie = session::persist_cookie(&session, state.session_secret());
    (
        AppendHeaders([(SET_COOKIE, cookie)]),
        Redirect::to("/admin/bags"),
    )
        .into_response()
}

/// Display the login page, or skip it when already signed in.
#[instrument(skip_all)]
pub async fn login_page(
    OptionalAdmin(existing): OptionalAdmin,
    Query(query): Query<AuthQuery>,
) -> Response {
    if existing.is_some() {
        return Redirect::to("/admin/bags").into_response();
    }
    LoginTemplate { error: query.error }.into_response()
}

/// Password login.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    axum::Form(form): axum::Form<LoginForm>,
) -> Response {
    let email = form.email.trim().to_owned();
    if email.is_empty() || form.password.is_empty() {
        return LoginTemplate {
            error: Some("Email and password are required.".to_owned()),
        }
        .into_response();
    }

    match state
        .identity()
        .login_with_password(&email, &form.password)
        .await
    {
        Ok(provider) => establish_session(&state, &provider, email),
        Err(err) => LoginTemplate {
            error: Some(err.to_string()),
        }
        .into_response(),
    }
}

/// Account creation.
#[instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    axum::Form(form): axum::Form<SignupForm>,
) -> Response {
    let name = form.name.trim().to_owned();
    let email = form.email.trim().to_owned();

    if name.is_empty() || email.is_empty() || form.password.is_empty() {
        return LoginTemplate {
            error: Some("Name, email, and password are required.".to_owned()),
        }
        .into_response();
    }
    if Email::parse(&email).is_err() {
        return LoginTemplate {
            error: Some("Please enter a valid email address.".to_owned()),
        }
        .into_response();
    }
    if form.password.len() < 8 {
        return LoginTemplate {
            error: Some("Password must be at least 8 characters.".to_owned()),
        }
        .into_response();
    }

    // A signup that succeeds without a session surfaces as
    // `VerificationRequired`, rendered like any other message.
    match state.identity().signup(&name, &email, &form.password).await {
        Ok(provider) => establish_session(&state, &provider, email),
        Err(err) => LoginTemplate {
            error: Some(err.to_string()),
        }
        .into_response(),
    }
}

/// Logout: drop the cookie and return to the login page.
#[instrument(skip_all)]
pub async fn logout() -> impl IntoResponse {
    clear_sentry_user();
    (
        AppendHeaders([(SET_COOKIE, session::clear_cookie())]),
        Redirect::to("/admin"),
    )
}

/// Start the Google OAuth flow.
#[instrument(skip_all)]
pub async fn login_google(State(state): State<AppState>) -> Redirect {
    let redirect_to = format!("{}/admin/callback", state.config().base_url);
    Redirect::to(&state.identity().authorize_url("google", &redirect_to))
}

/// OAuth callback: server-side code exchange.
///
/// A visit without a `code` query parameter ends back at the login page
/// with "Missing authorization code". No cookie is set on any failure path.
#[instrument(skip_all)]
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let Some(code) = query.code else {
        return login_error_redirect("Missing authorization code").into_response();
    };

    match state.identity().exchange_code(&code).await {
        Ok(provider) => {
            let email = provider
                .user
                .as_ref()
                .and_then(|user| user.email.clone())
                .unwrap_or_else(|| "admin".to_owned());
            establish_session(&state, &provider, email)
        }
        Err(err) => {
            tracing::error!("Code exchange failed: {err}");
            login_error_redirect(&err.to_string()).into_response()
        }
    }
}

/// Completion leg for providers that return tokens in the URL fragment.
///
/// Fragments never reach the server, so a client relaying them forwards the
/// tokens here as query parameters.
#[instrument(skip_all)]
pub async fn callback_complete(
    State(state): State<AppState>,
    Query(query): Query<CompleteQuery>,
) -> Response {
    let Some(access_token) = query.access_token.filter(|t| !t.is_empty()) else {
        return login_error_redirect("Missing access token").into_response();
    };

    let session = AdminSession {
        access_token,
        refresh_token: query.refresh_token.unwrap_or_default(),
        expires_at: query
            .expires_at
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_else(|| Utc::now().timestamp() + FALLBACK_TOKEN_LIFETIME_SECONDS),
        email: "Email".to_owned(),
    };

    let cookie = session::persist_cookie(&session, state.session_secret());
    (
        AppendHeaders([(SET_COOKIE, cookie)]),
        Redirect::to("/admin/bags"),
    )
        .into_response()
}
