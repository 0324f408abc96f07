//! Content mutation actions for the admin console.
//!
//! Each action runs the same pipeline: validate the submitted fields, resolve
//! the session's access token to a user, normalize the image payload, persist
//! against the catalog store, and report. Every internal failure, whether
//! validation, network, or parse, is converted into the uniform
//! [`ActionResult`] shape; nothing escapes past an action's boundary. The
//! calling form re-renders with the message.

use serde::Deserialize;

use sonie_atelier_core::{Bag, BagId, BagImage, Price, UploadedImage};

use crate::services::CatalogError;
use crate::services::catalog::{BagChanges, NewBag};
use crate::session::AdminSession;
use crate::state::AppState;

/// Uniform outcome of a mutation action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResult {
    pub error: Option<String>,
    pub success: bool,
}

impl ActionResult {
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            error: None,
            success: true,
        }
    }

    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            success: false,
        }
    }
}

/// Bag create/update form fields as the browser submits them.
#[derive(Debug, Default, Deserialize)]
pub struct BagForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub pricing: Option<String>,
    #[serde(default)]
    pub available: Option<String>,
    #[serde(default, rename = "defaultImageIndex")]
    pub default_image_index: Option<String>,
    #[serde(default, rename = "imagesPayload")]
    pub images_payload: Option<String>,
}

/// Settings form fields.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsForm {
    #[serde(default)]
    pub whatsapp_number: Option<String>,
}

const UNAUTHORIZED: &str = "Unauthorized. Please login to continue.";
const NAME_REQUIRED: &str = "A bag name is required.";
const PRICE_INVALID: &str = "Price must be a valid number.";
const IMAGE_REQUIRED: &str = "Please upload at least one image.";

/// Checkbox-style truthiness: only "true" and "on" count.
fn form_bool(value: Option<&str>) -> bool {
    matches!(value, Some("true" | "on"))
}

/// The requested default index, tolerating absent or non-numeric input.
fn form_default_index(value: Option<&str>) -> i64 {
    value.and_then(|s| s.trim().parse().ok()).unwrap_or(0)
}

/// Trim a field to `None` when empty.
fn optional_field(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Validated field set shared by create and update.
#[derive(Debug)]
struct ValidatedBag {
    name: String,
    description: Option<String>,
    color: Option<String>,
    size: Option<String>,
    pricing: Option<Price>,
    available: bool,
    default_index: i64,
}

fn validate_fields(form: &BagForm) -> Result<ValidatedBag, ActionResult> {
    let name = form
        .name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ActionResult::fail(NAME_REQUIRED))?
        .to_owned();

    let pricing = Price::parse_form_value(form.pricing.as_deref().unwrap_or(""))
        .map_err(|_| ActionResult::fail(PRICE_INVALID))?;

    Ok(ValidatedBag {
        name,
        description: optional_field(form.description.as_ref()),
        color: optional_field(form.color.as_ref()),
        size: optional_field(form.size.as_ref()),
        pricing,
        available: form_bool(form.available.as_deref()),
        default_index: form_default_index(form.default_image_index.as_deref()),
    })
}

/// Parse the JSON image payload the upload widget accumulates.
fn parse_images_payload(payload: &str) -> Result<Vec<UploadedImage>, serde_json::Error> {
    serde_json::from_str(payload)
}

fn store_error_message(error: &CatalogError) -> String {
    match error {
        CatalogError::Api { message, .. } if !message.is_empty() => message.clone(),
        other => other.to_string(),
    }
}

/// Create a bag owned by the session's user.
pub async fn create_bag(state: &AppState, session: &AdminSession, form: &BagForm) -> ActionResult {
    let Some(user) = state.identity().resolve_user(&session.access_token).await else {
        return ActionResult::fail(UNAUTHORIZED);
    };

    let fields = match validate_fields(form) {
        Ok(fields) => fields,
        Err(result) => return result,
    };

    let uploaded = match form.images_payload.as_deref().filter(|p| !p.is_empty()) {
        Some(payload) => match parse_images_payload(payload) {
            Ok(images) => images,
            Err(_) => {
                return ActionResult::fail(
                    "Images payload is invalid. Please re-upload your images.",
                );
            }
        },
        None => Vec::new(),
    };

    if uploaded.is_empty() {
        return ActionResult::fail(IMAGE_REQUIRED);
    }

    let bag = NewBag {
        user_id: user.id.as_uuid(),
        name: fields.name,
        description: fields.description,
        color: fields.color,
        size: fields.size,
        pricing: fields.pricing,
        available: fields.available,
        images: BagImage::assign_default(uploaded, fields.default_index),
    };

    match state.catalog().insert_bag(&bag, &session.access_token).await {
        Ok(()) => ActionResult::ok(),
        Err(err) => {
            tracing::error!(error = %err, "Error creating bag");
            ActionResult::fail(store_error_message(&err))
        }
    }
}

/// Update a bag, scoped to the session's user.
///
/// When the form carries no new image payload, the stored image list is
/// re-fetched and only the default flag is reassigned. Existing images are
/// never dropped by an update that did not send replacements.
pub async fn update_bag(
    state: &AppState,
    session: &AdminSession,
    id: BagId,
    form: &BagForm,
) -> ActionResult {
    let Some(user) = state.identity().resolve_user(&session.access_token).await else {
        return ActionResult::fail(UNAUTHORIZED);
    };

    let fields = match validate_fields(form) {
        Ok(fields) => fields,
        Err(result) => return result,
    };

    let images = match form.images_payload.as_deref().filter(|p| !p.is_empty()) {
        Some(payload) => match parse_images_payload(payload) {
            Ok(uploaded) => BagImage::assign_default(uploaded, fields.default_index),
            Err(_) => {
                return ActionResult::fail("Images payload is invalid. Please try again.");
            }
        },
        None => {
            let existing = match state.catalog().fetch_images(id).await {
                Ok(images) => images,
                Err(err) => {
                    tracing::error!(error = %err, "Error fetching existing images");
                    return ActionResult::fail(store_error_message(&err));
                }
            };
            BagImage::reassign_default(existing, fields.default_index)
        }
    };

    if images.is_empty() {
        return ActionResult::fail(IMAGE_REQUIRED);
    }

    let changes = BagChanges {
        name: fields.name,
        description: fields.description,
        color: fields.color,
        size: fields.size,
        pricing: fields.pricing,
        available: fields.available,
        images,
    };

    match state
        .catalog()
        .update_bag(id, user.id, &changes, &session.access_token)
        .await
    {
        Ok(()) => ActionResult::ok(),
        Err(err) => {
            tracing::error!(error = %err, bag_id = %id, "Error updating bag");
            ActionResult::fail(store_error_message(&err))
        }
    }
}

/// Delete a bag, scoped to the session's user.
pub async fn delete_bag(state: &AppState, session: &AdminSession, id: BagId) -> ActionResult {
    let Some(user) = state.identity().resolve_user(&session.access_token).await else {
        return ActionResult::fail(UNAUTHORIZED);
    };

    match state
        .catalog()
        .delete_bag(id, user.id, &session.access_token)
        .await
    {
        Ok(()) => ActionResult::ok(),
        Err(err) => {
            tracing::error!(error = %err, bag_id = %id, "Error deleting bag");
            ActionResult::fail(store_error_message(&err))
        }
    }
}

/// Upsert the single settings row.
///
/// Read-then-branch: update the existing row when one exists, insert
/// otherwise. An empty table is an expected state, not an error.
pub async fn update_settings(
    state: &AppState,
    session: &AdminSession,
    form: &SettingsForm,
) -> ActionResult {
    let Some(_user) = state.identity().resolve_user(&session.access_token).await else {
        return ActionResult::fail(UNAUTHORIZED);
    };

    let number = optional_field(form.whatsapp_number.as_ref());

    let existing = match state.catalog().get_settings().await {
        Ok(existing) => existing,
        Err(err) => {
            tracing::error!(error = %err, "Error fetching settings");
            return ActionResult::fail(store_error_message(&err));
        }
    };

    let result = match existing.and_then(|settings| settings.id) {
        Some(id) => {
            state
                .catalog()
                .update_settings(id, number.as_deref(), &session.access_token)
                .await
        }
        None => {
            state
                .catalog()
                .insert_settings(number.as_deref(), &session.access_token)
                .await
        }
    };

    match result {
        Ok(()) => ActionResult::ok(),
        Err(err) => {
            tracing::error!(error = %err, "Error saving settings");
            ActionResult::fail(store_error_message(&err))
        }
    }
}

/// The list of bags an admin page renders; not filtered by availability.
///
/// # Errors
///
/// Returns an error on transport failure or a store rejection.
pub async fn admin_bags(state: &AppState) -> Result<Vec<Bag>, CatalogError> {
    state.catalog().list_all().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_form_bool_accepts_checkbox_values() {
        assert!(form_bool(Some("on")));
        assert!(form_bool(Some("true")));
        assert!(!form_bool(Some("false")));
        assert!(!form_bool(Some("yes")));
        assert!(!form_bool(None));
    }

    #[test]
    fn test_default_index_tolerates_garbage() {
        assert_eq!(form_default_index(Some("2")), 2);
        assert_eq!(form_default_index(Some(" 1 ")), 1);
        assert_eq!(form_default_index(Some("abc")), 0);
        assert_eq!(form_default_index(Some("")), 0);
        assert_eq!(form_default_index(None), 0);
        assert_eq!(form_default_index(Some("-3")), -3);
    }

    #[test]
    fn test_validate_requires_name() {
        let form = BagForm {
            name: Some("   ".to_owned()),
            ..BagForm::default()
        };
        let result = validate_fields(&form).unwrap_err();
        assert_eq!(result.error.as_deref(), Some(NAME_REQUIRED));
    }

    #[test]
    fn test_validate_rejects_non_numeric_price() {
        let form = BagForm {
            name: Some("Safari Tote".to_owned()),
            pricing: Some("abc".to_owned()),
            ..BagForm::default()
        };
        let result = validate_fields(&form).unwrap_err();
        assert_eq!(result.error.as_deref(), Some(PRICE_INVALID));
    }

    #[test]
    fn test_validate_trims_optional_fields_to_none() {
        let form = BagForm {
            name: Some(" Safari Tote ".to_owned()),
            description: Some("  ".to_owned()),
            color: Some(" tan ".to_owned()),
            pricing: Some(String::new()),
            available: Some("on".to_owned()),
            ..BagForm::default()
        };
        let fields = validate_fields(&form).unwrap();
        assert_eq!(fields.name, "Safari Tote");
        assert!(fields.description.is_none());
        assert_eq!(fields.color.as_deref(), Some("tan"));
        assert!(fields.pricing.is_none());
        assert!(fields.available);
    }

    #[test]
    fn test_images_payload_parses_with_either_id_field() {
        let uploaded = parse_images_payload(
            r#"[{"url":"https://x/a.jpg","publicId":"bags/a"},{"url":"https://x/b.jpg"}]"#,
        )
        .unwrap();
        assert_eq!(uploaded.len(), 2);
        assert_eq!(uploaded[0].public_id.as_deref(), Some("bags/a"));
        assert!(uploaded[1].public_id.is_none());
    }

    #[test]
    fn test_images_payload_rejects_malformed_json() {
        assert!(parse_images_payload("not json").is_err());
        assert!(parse_images_payload(r#"{"url":"x"}"#).is_err());
    }
}
