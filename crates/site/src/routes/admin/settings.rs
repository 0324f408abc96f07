//! Admin settings handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use crate::actions::{self, SettingsForm};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SettingsQuery {
    pub error: Option<String>,
    pub saved: Option<String>,
}

/// Settings page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/settings.html")]
pub struct SettingsTemplate {
    pub whatsapp_number: String,
    pub error: Option<String>,
    pub saved: bool,
}

/// The settings form, pre-filled with the stored number.
///
/// A missing settings row (or a read failure) renders an empty form.
#[instrument(skip(state))]
pub async fn page(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(query): Query<SettingsQuery>,
) -> SettingsTemplate {
    let whatsapp_number = state
        .catalog()
        .get_settings()
        .await
        .map_or_else(
            |e| {
                tracing::error!("Failed to fetch settings: {e}");
                None
            },
            |settings| settings.and_then(|s| s.whatsapp_number),
        )
        .unwrap_or_default();

    SettingsTemplate {
        whatsapp_number,
        error: query.error,
        saved: query.saved.is_some(),
    }
}

/// Settings upsert action.
#[instrument(skip_all)]
pub async fn update(
    State(state): State<AppState>,
    admin: RequireAdmin,
    axum::Form(form): axum::Form<SettingsForm>,
) -> Response {
    let result = actions::update_settings(&state, &admin.session, &form).await;
    match result.error {
        None => Redirect::to("/admin/settings?saved=1").into_response(),
        Some(message) => Redirect::to(&format!(
            "/admin/settings?error={}",
            urlencoding::encode(&message)
        ))
        .into_response(),
    }
}
