//! Upload-ticket endpoint.

use axum::{Json, extract::State};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use crate::services::UploadTicket;
use crate::state::AppState;

/// Optional request body; an empty or malformed body means no folder.
#[derive(Debug, Default, Deserialize)]
pub struct SignatureRequest {
    #[serde(default)]
    pub folder: Option<String>,
}

/// Issue a signed upload ticket for a direct browser upload.
///
/// The signature covers the current timestamp and, when requested, the
/// target folder. The signing secret never appears in the response.
#[instrument(skip_all)]
pub async fn signature(
    State(state): State<AppState>,
    body: Option<Json<SignatureRequest>>,
) -> Json<UploadTicket> {
    let folder = body.and_then(|Json(request)| request.folder);
    let ticket = state
        .signer()
        .issue_ticket(folder.as_deref(), Utc::now().timestamp());
    Json(ticket)
}
