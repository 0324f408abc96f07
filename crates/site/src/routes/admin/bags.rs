//! Admin bag management handlers.
//!
//! Mutations follow post-redirect-get: a failed action redirects back to the
//! originating form with the message in the `error` query parameter, a
//! successful one lands on the bag table.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::instrument;

use sonie_atelier_core::{Bag, BagId, Price};

use crate::actions::{self, BagForm};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FormQuery {
    pub error: Option<String>,
}

/// Row data for the admin bag table.
#[derive(Clone)]
pub struct AdminBagRow {
    pub id: i64,
    pub name: String,
    pub pricing: Option<Price>,
    pub available: bool,
    pub image_count: usize,
    pub hero_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Bag> for AdminBagRow {
    fn from(bag: &Bag) -> Self {
        Self {
            id: bag.id.as_i64(),
            name: bag.display_name().to_owned(),
            pricing: bag.pricing,
            available: bag.available,
            image_count: bag.images.len(),
            hero_url: bag.hero_image().map(|image| image.url.clone()),
            created_at: bag.created_at,
        }
    }
}

/// Bag table template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/bags.html")]
pub struct AdminBagsTemplate {
    pub bags: Vec<AdminBagRow>,
    pub email: String,
    pub error: Option<String>,
}

/// Create form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/add_bag.html")]
pub struct AddBagTemplate {
    pub error: Option<String>,
}

/// Edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/edit_bag.html")]
pub struct EditBagTemplate {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub color: String,
    pub size: String,
    pub pricing: String,
    pub available: bool,
    /// Canonical image list as JSON, seeded into the upload widget.
    pub images_json: String,
    pub default_index: usize,
    pub error: Option<String>,
}

fn redirect_with_error(path: &str, message: &str) -> Redirect {
    Redirect::to(&format!("{path}?error={}", urlencoding::encode(message)))
}

/// The bag table, every row regardless of availability.
#[instrument(skip(state, admin))]
pub async fn list(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Query(query): Query<FormQuery>,
) -> Result<AdminBagsTemplate, AppError> {
    let bags = actions::admin_bags(&state).await?;

    Ok(AdminBagsTemplate {
        bags: bags.iter().map(AdminBagRow::from).collect(),
        email: admin.session.email,
        error: query.error,
    })
}

/// The create form.
#[instrument(skip_all)]
pub async fn add_page(_admin: RequireAdmin, Query(query): Query<FormQuery>) -> AddBagTemplate {
    AddBagTemplate { error: query.error }
}

/// Create action.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    admin: RequireAdmin,
    axum::Form(form): axum::Form<BagForm>,
) -> Response {
    let result = actions::create_bag(&state, &admin.session, &form).await;
    match result.error {
        None => Redirect::to("/admin/bags").into_response(),
        Some(message) => redirect_with_error("/admin/add-bag", &message).into_response(),
    }
}

/// The edit form, populated from the owner-scoped row.
#[instrument(skip(state, admin))]
pub async fn edit_page(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<BagId>,
    Query(query): Query<FormQuery>,
) -> Result<Response, AppError> {
    let Some(bag) = state.catalog().get_owned(id, admin.user.id).await? else {
        return Err(AppError::NotFound(format!("bag {id}")));
    };

    let default_index = bag
        .images
        .iter()
        .position(|image| image.is_default)
        .unwrap_or(0);
    let images_json = serde_json::to_string(&bag.images)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(EditBagTemplate {
        id: bag.id.as_i64(),
        name: bag.name.unwrap_or_default(),
        description: bag.description.unwrap_or_default(),
        color: bag.color.unwrap_or_default(),
        size: bag.size.unwrap_or_default(),
        // Raw decimal, not the display form; this refills the numeric input.
        pricing: bag
            .pricing
            .map(|p| p.amount().to_string())
            .unwrap_or_default(),
        available: bag.available,
        images_json,
        default_index,
        error: query.error,
    }
    .into_response())
}

/// Update action.
#[instrument(skip(state, admin, form))]
pub async fn update(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<BagId>,
    axum::Form(form): axum::Form<BagForm>,
) -> Response {
    let result = actions::update_bag(&state, &admin.session, id, &form).await;
    match result.error {
        None => Redirect::to("/admin/bags").into_response(),
        Some(message) => {
            redirect_with_error(&format!("/admin/bags/{id}"), &message).into_response()
        }
    }
}

/// Delete action.
#[instrument(skip(state, admin))]
pub async fn delete(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<BagId>,
) -> Response {
    let result = actions::delete_bag(&state, &admin.session, id).await;
    match result.error {
        None => Redirect::to("/admin/bags").into_response(),
        Some(message) => redirect_with_error("/admin/bags", &message).into_response(),
    }
}
