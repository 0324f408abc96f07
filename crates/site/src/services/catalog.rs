//! Catalog store (PostgREST) client.
//!
//! Reads and writes the `bags` and `settings` rows over the hosted store's
//! REST surface. Row shapes are normalized into the canonical core types at
//! this boundary; nothing past here sees legacy image field names.
//!
//! Every mutating call takes the owning user's id and bakes it into the row
//! filter (`id=eq.*&user_id=eq.*`). Ownership is enforced by that predicate,
//! not by application-level checks: a call that matches zero rows is a no-op
//! reported as [`CatalogError::RowNotFound`].

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use sonie_atelier_core::{Bag, BagId, BagImage, Price, Settings, UserId};

use crate::config::SupabaseConfig;

/// Errors that can occur when talking to the catalog store.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Store rejected the call.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Failed to parse a store response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A scoped mutation matched no row (missing id or wrong owner).
    #[error("No matching record found.")]
    RowNotFound,
}

/// Raw bag row as the store returns it.
///
/// `images` stays a raw JSON value here because historical rows mix field
/// namings; [`BagRow::into_bag`] runs them through the canonical adapter.
#[derive(Debug, Deserialize)]
pub struct BagRow {
    pub id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub pricing: Option<Price>,
    #[serde(default)]
    pub available: Option<bool>,
    #[serde(default)]
    pub images: Option<Value>,
}

impl BagRow {
    /// Normalize the raw row into the canonical shape.
    #[must_use]
    pub fn into_bag(self) -> Bag {
        Bag {
            id: BagId::new(self.id),
            name: self.name,
            description: self.description,
            color: self.color,
            size: self.size,
            pricing: self.pricing,
            available: self.available.unwrap_or(false),
            images: BagImage::normalize_list(self.images.as_ref()),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Insert payload for a new bag.
#[derive(Debug, Serialize)]
pub struct NewBag {
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub pricing: Option<Price>,
    pub available: bool,
    pub images: Vec<BagImage>,
}

/// Update payload for an existing bag. The owner travels in the row filter,
/// not in the body.
#[derive(Debug, Serialize)]
pub struct BagChanges {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub pricing: Option<Price>,
    pub available: bool,
    pub images: Vec<BagImage>,
}

/// Client for the hosted catalog store.
#[derive(Clone)]
pub struct CatalogClient {
    client: reqwest::Client,
    base_url: String,
}

impl CatalogClient {
    /// Create a client from the Supabase configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &SupabaseConfig) -> Result<Self, CatalogError> {
        Self::from_parts(format!("{}/rest/v1", config.url), &config.anon_key)
    }

    /// Create a client against an explicit base URL (used by tests).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_parts(
        base_url: impl Into<String>,
        anon_key: &SecretString,
    ) -> Result<Self, CatalogError> {
        let mut headers = HeaderMap::new();
        let key = anon_key.expose_secret();
        headers.insert(
            "apikey",
            HeaderValue::from_str(key)
                .map_err(|e| CatalogError::Parse(format!("Invalid API key format: {e}")))?,
        );
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| CatalogError::Parse(format!("Invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Newest available bags for the public catalog grid.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a store rejection.
    pub async fn list_available(&self, limit: usize) -> Result<Vec<Bag>, CatalogError> {
        let url = format!(
            "{}/bags?select=*&available=eq.true&order=created_at.desc&limit={limit}",
            self.base_url
        );
        self.fetch_bags(&url).await
    }

    /// Every bag, newest first, for the admin table.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a store rejection.
    pub async fn list_all(&self) -> Result<Vec<Bag>, CatalogError> {
        let url = format!("{}/bags?select=*&order=created_at.desc", self.base_url);
        self.fetch_bags(&url).await
    }

    /// One available bag by id, for the public detail page.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a store rejection; a missing
    /// or unavailable bag is `Ok(None)`.
    pub async fn get_available(&self, id: BagId) -> Result<Option<Bag>, CatalogError> {
        let url = format!(
            "{}/bags?select=*&id=eq.{id}&available=eq.true&limit=1",
            self.base_url
        );
        Ok(self.fetch_bags(&url).await?.into_iter().next())
    }

    /// Other available bags for the "more from collection" strip.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a store rejection.
    pub async fn more_available(
        &self,
        exclude: BagId,
        limit: usize,
    ) -> Result<Vec<Bag>, CatalogError> {
        let url = format!(
            "{}/bags?select=*&available=eq.true&id=neq.{exclude}&order=created_at.desc&limit={limit}",
            self.base_url
        );
        self.fetch_bags(&url).await
    }

    /// One bag scoped to its owner, for the admin edit form.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a store rejection; a missing
    /// row (or another owner's row) is `Ok(None)`.
    pub async fn get_owned(&self, id: BagId, owner: UserId) -> Result<Option<Bag>, CatalogError> {
        let url = format!(
            "{}/bags?select=*&id=eq.{id}&user_id=eq.{owner}&limit=1",
            self.base_url
        );
        Ok(self.fetch_bags(&url).await?.into_iter().next())
    }

    /// The stored image list of one bag, canonicalized.
    ///
    /// Used by updates that arrive without a new image payload.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a store rejection.
    pub async fn fetch_images(&self, id: BagId) -> Result<Vec<BagImage>, CatalogError> {
        let url = format!("{}/bags?select=images&id=eq.{id}&limit=1", self.base_url);
        let rows: Vec<Value> = self.fetch_json(&url).await?;
        Ok(rows
            .first()
            .and_then(|row| row.get("images"))
            .map(|images| BagImage::normalize_list(Some(images)))
            .unwrap_or_default())
    }

    // =========================================================================
    // Mutations (always owner-scoped)
    // =========================================================================

    /// Insert a new bag owned by the resolved user.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a store rejection.
    pub async fn insert_bag(&self, bag: &NewBag, access_token: &str) -> Result<(), CatalogError> {
        let url = format!("{}/bags", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .header("Prefer", "return=representation")
            .json(bag)
            .send()
            .await?;
        Self::expect_rows(response).await.map(|_| ())
    }

    /// Update a bag, scoped by record id and owning-user id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::RowNotFound`] when no row matched the owner
    /// predicate, or an error on transport failure / store rejection.
    pub async fn update_bag(
        &self,
        id: BagId,
        owner: UserId,
        changes: &BagChanges,
        access_token: &str,
    ) -> Result<(), CatalogError> {
        let url = format!("{}/bags?id=eq.{id}&user_id=eq.{owner}", self.base_url);
        let response = self
            .client
            .patch(&url)
            .bearer_auth(access_token)
            .header("Prefer", "return=representation")
            .json(changes)
            .send()
            .await?;

        let rows = Self::expect_rows(response).await?;
        if rows.is_empty() {
            return Err(CatalogError::RowNotFound);
        }
        Ok(())
    }

    /// Delete a bag, scoped by record id and owning-user id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::RowNotFound`] when no row matched the owner
    /// predicate, or an error on transport failure / store rejection.
    pub async fn delete_bag(
        &self,
        id: BagId,
        owner: UserId,
        access_token: &str,
    ) -> Result<(), CatalogError> {
        let url = format!("{}/bags?id=eq.{id}&user_id=eq.{owner}", self.base_url);
        let response = self
            .client
            .delete(&url)
            .bearer_auth(access_token)
            .header("Prefer", "return=representation")
            .send()
            .await?;

        let rows = Self::expect_rows(response).await?;
        if rows.is_empty() {
            return Err(CatalogError::RowNotFound);
        }
        Ok(())
    }

    // =========================================================================
    // Settings
    // =========================================================================

    /// The single settings row, if one exists. Absence is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a store rejection.
    pub async fn get_settings(&self) -> Result<Option<Settings>, CatalogError> {
        let url = format!("{}/settings?select=id,whatsapp_number&limit=1", self.base_url);
        let rows: Vec<Settings> = self.fetch_json(&url).await?;
        Ok(rows.into_iter().next())
    }

    /// Insert the settings row (first write).
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a store rejection.
    pub async fn insert_settings(
        &self,
        whatsapp_number: Option<&str>,
        access_token: &str,
    ) -> Result<(), CatalogError> {
        let url = format!("{}/settings", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({ "whatsapp_number": whatsapp_number }))
            .send()
            .await?;
        Self::expect_rows(response).await.map(|_| ())
    }

    /// Update the existing settings row in place.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a store rejection.
    pub async fn update_settings(
        &self,
        id: i64,
        whatsapp_number: Option<&str>,
        access_token: &str,
    ) -> Result<(), CatalogError> {
        let url = format!("{}/settings?id=eq.{id}", self.base_url);
        let response = self
            .client
            .patch(&url)
            .bearer_auth(access_token)
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({ "whatsapp_number": whatsapp_number }))
            .send()
            .await?;
        Self::expect_rows(response).await.map(|_| ())
    }

    // =========================================================================
    // Shared plumbing
    // =========================================================================

    async fn fetch_bags(&self, url: &str) -> Result<Vec<Bag>, CatalogError> {
        let rows: Vec<BagRow> = self.fetch_json(url).await?;
        Ok(rows.into_iter().map(BagRow::into_bag).collect())
    }

    async fn fetch_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, CatalogError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))
    }

    /// Check a mutation response and return the representation rows.
    async fn expect_rows(response: reqwest::Response) -> Result<Vec<Value>, CatalogError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message,
            });
        }

        // 204 No Content can come back when the Prefer header is ignored.
        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(vec![Value::Null]);
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&text).map_err(|e| CatalogError::Parse(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_normalizes_legacy_image_names() {
        let row: BagRow = serde_json::from_value(json!({
            "id": 3,
            "created_at": "2025-06-01T10:00:00Z",
            "name": "Safari Tote",
            "available": true,
            "images": [
                {"url": "https://x/a.jpg", "is_default": false, "public_id": "bags/a"},
                {"url": "https://x/b.jpg", "isDefault": true, "publicId": "bags/b"},
            ],
        }))
        .unwrap();

        let bag = row.into_bag();
        assert_eq!(bag.id, BagId::new(3));
        assert!(bag.available);
        assert_eq!(bag.images.len(), 2);
        assert_eq!(bag.hero_image().unwrap().url, "https://x/b.jpg");
        assert_eq!(bag.images[0].public_id.as_deref(), Some("bags/a"));
    }

    #[test]
    fn test_row_tolerates_null_images_and_availability() {
        let row: BagRow = serde_json::from_value(json!({
            "id": 9,
            "created_at": "2025-06-01T10:00:00Z",
            "images": null,
        }))
        .unwrap();

        let bag = row.into_bag();
        assert!(!bag.available);
        assert!(bag.images.is_empty());
        assert_eq!(bag.display_name(), "Untitled bag");
    }

    #[test]
    fn test_new_bag_payload_shape() {
        let payload = NewBag {
            user_id: Uuid::nil(),
            name: "Atelier Weekender".to_owned(),
            description: None,
            color: None,
            size: None,
            pricing: Price::parse_form_value("1250").unwrap(),
            available: true,
            images: BagImage::assign_default(
                vec![
                    sonie_atelier_core::UploadedImage {
                        url: "https://x/a.jpg".to_owned(),
                        public_id: None,
                    },
                    sonie_atelier_core::UploadedImage {
                        url: "https://x/b.jpg".to_owned(),
                        public_id: None,
                    },
                ],
                1,
            ),
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["available"], json!(true));
        assert_eq!(value["pricing"], json!(1250.0));
        assert_eq!(value["images"][1]["isDefault"], json!(true));
        assert_eq!(value["images"][0]["isDefault"], json!(false));
    }
}
