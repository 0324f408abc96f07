//! Catalog bag and image types.
//!
//! The catalog store keeps a bag's images as a JSON array. Historical rows
//! were written with snake_case keys (`is_default`, `public_id`) while
//! current rows use camelCase (`isDefault`, `publicId`); [`BagImage::normalize`]
//! is the single adapter that accepts either shape so the rest of the system
//! only ever sees the canonical form. Precedence: the current key wins, the
//! legacy key is the fallback.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::id::BagId;
use crate::types::price::Price;

/// A single catalog image in canonical shape.
///
/// Invariant: within a bag's image list at most one entry has
/// `is_default = true`, and a non-empty list has exactly one. The invariant
/// is established by [`BagImage::assign_default`] / [`BagImage::reassign_default`]
/// on every write path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BagImage {
    /// Delivery URL at the media host.
    pub url: String,
    /// Opaque media-host identifier, absent on some historical rows.
    #[serde(rename = "publicId", skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
    /// Whether this image is the bag's hero image.
    #[serde(rename = "isDefault")]
    pub is_default: bool,
}

/// Image metadata as submitted by the upload coordinator.
///
/// Carries no default flag; the default is a separate index over the ordered
/// payload and is applied by [`BagImage::assign_default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub url: String,
    #[serde(
        rename = "publicId",
        alias = "public_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub public_id: Option<String>,
}

impl BagImage {
    /// Normalize a raw stored image object into the canonical shape.
    ///
    /// Returns `None` when the value is not an object or carries no `url`;
    /// such entries are dropped rather than failing the whole row.
    #[must_use]
    pub fn normalize(raw: &Value) -> Option<Self> {
        let obj = raw.as_object()?;
        let url = obj.get("url")?.as_str()?.to_owned();

        let is_default = obj
            .get("isDefault")
            .or_else(|| obj.get("is_default"))
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let public_id = obj
            .get("publicId")
            .or_else(|| obj.get("public_id"))
            .and_then(Value::as_str)
            .map(str::to_owned);

        Some(Self {
            url,
            public_id,
            is_default,
        })
    }

    /// Normalize a stored image column (JSON array or null) into canonical images.
    #[must_use]
    pub fn normalize_list(raw: Option<&Value>) -> Vec<Self> {
        raw.and_then(Value::as_array).map_or_else(Vec::new, |arr| {
            arr.iter().filter_map(Self::normalize).collect()
        })
    }

    /// Build a canonical image list from an upload payload, flagging exactly
    /// one entry as default. The requested index is clamped into range.
    #[must_use]
    pub fn assign_default(uploads: Vec<UploadedImage>, requested_index: i64) -> Vec<Self> {
        let default_index = clamp_default_index(requested_index, uploads.len());
        uploads
            .into_iter()
            .enumerate()
            .map(|(index, image)| Self {
                url: image.url,
                public_id: image.public_id,
                is_default: index == default_index,
            })
            .collect()
    }

    /// Re-apply the default flag over an existing image list, preserving
    /// URLs and public ids. Used when an update supplies no new payload.
    #[must_use]
    pub fn reassign_default(images: Vec<Self>, requested_index: i64) -> Vec<Self> {
        let default_index = clamp_default_index(requested_index, images.len());
        images
            .into_iter()
            .enumerate()
            .map(|(index, image)| Self {
                is_default: index == default_index,
                ..image
            })
            .collect()
    }

    /// Pick the hero image: the default entry, falling back to the first.
    #[must_use]
    pub fn hero(images: &[Self]) -> Option<&Self> {
        images
            .iter()
            .find(|image| image.is_default)
            .or_else(|| images.first())
    }
}

/// Clamp a submitted default-image index into `[0, len - 1]`.
///
/// Negative and out-of-range values resolve to the nearest valid position;
/// an empty list resolves to 0 (no entry will match it).
#[must_use]
pub fn clamp_default_index(requested: i64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let max = i64::try_from(len - 1).unwrap_or(i64::MAX);
    usize::try_from(requested.clamp(0, max)).unwrap_or(0)
}

/// A catalog item in canonical shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bag {
    pub id: BagId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub pricing: Option<Price>,
    pub available: bool,
    pub images: Vec<BagImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Bag {
    /// Display name with the catalog's untitled fallback.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Untitled bag")
    }

    /// The bag's hero image, if it has any images at all.
    #[must_use]
    pub fn hero_image(&self) -> Option<&BagImage> {
        BagImage::hero(&self.images)
    }
}

/// The single optional settings row.
///
/// Holds the WhatsApp contact number used to build the order deep link.
/// At most one row is expected to exist; absence is not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub whatsapp_number: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_current_field_names() {
        let raw = json!({"url": "https://x/a.jpg", "publicId": "bags/a", "isDefault": true});
        let image = BagImage::normalize(&raw).unwrap();
        assert_eq!(image.url, "https://x/a.jpg");
        assert_eq!(image.public_id.as_deref(), Some("bags/a"));
        assert!(image.is_default);
    }

    #[test]
    fn test_normalize_legacy_field_names() {
        let raw = json!({"url": "https://x/a.jpg", "public_id": "bags/a", "is_default": true});
        let image = BagImage::normalize(&raw).unwrap();
        assert_eq!(image.public_id.as_deref(), Some("bags/a"));
        assert!(image.is_default);
    }

    #[test]
    fn test_normalize_current_name_wins_over_legacy() {
        let raw = json!({
            "url": "https://x/a.jpg",
            "isDefault": true,
            "is_default": false,
            "publicId": "current",
            "public_id": "legacy",
        });
        let image = BagImage::normalize(&raw).unwrap();
        assert!(image.is_default);
        assert_eq!(image.public_id.as_deref(), Some("current"));
    }

    #[test]
    fn test_normalize_drops_entries_without_url() {
        let raw = json!([{"publicId": "no-url"}, {"url": "https://x/b.jpg"}, "garbage"]);
        let images = BagImage::normalize_list(Some(&raw));
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].url, "https://x/b.jpg");
    }

    #[test]
    fn test_normalize_list_tolerates_null_column() {
        assert!(BagImage::normalize_list(None).is_empty());
        assert!(BagImage::normalize_list(Some(&Value::Null)).is_empty());
    }

    #[test]
    fn test_clamp_default_index_bounds() {
        assert_eq!(clamp_default_index(-3, 4), 0);
        assert_eq!(clamp_default_index(0, 4), 0);
        assert_eq!(clamp_default_index(3, 4), 3);
        assert_eq!(clamp_default_index(4, 4), 3);
        assert_eq!(clamp_default_index(100, 4), 3);
        assert_eq!(clamp_default_index(2, 0), 0);
    }

    fn uploads(n: usize) -> Vec<UploadedImage> {
        (0..n)
            .map(|i| UploadedImage {
                url: format!("https://x/{i}.jpg"),
                public_id: Some(format!("bags/{i}")),
            })
            .collect()
    }

    #[test]
    fn test_assign_default_flags_exactly_one() {
        let images = BagImage::assign_default(uploads(3), 1);
        let defaults: Vec<_> = images.iter().filter(|i| i.is_default).collect();
        assert_eq!(defaults.len(), 1);
        assert!(images[1].is_default);
        assert!(!images[0].is_default);
        assert!(!images[2].is_default);
    }

    #[test]
    fn test_assign_default_clamps_out_of_range_index() {
        let images = BagImage::assign_default(uploads(2), 9);
        assert!(images[1].is_default);

        let images = BagImage::assign_default(uploads(2), -1);
        assert!(images[0].is_default);
    }

    #[test]
    fn test_reassign_default_preserves_urls_and_public_ids() {
        let existing = vec![
            BagImage {
                url: "https://x/a.jpg".into(),
                public_id: Some("bags/a".into()),
                is_default: true,
            },
            BagImage {
                url: "https://x/b.jpg".into(),
                public_id: None,
                is_default: false,
            },
        ];
        let images = BagImage::reassign_default(existing, 1);
        assert_eq!(images[0].url, "https://x/a.jpg");
        assert_eq!(images[0].public_id.as_deref(), Some("bags/a"));
        assert!(!images[0].is_default);
        assert!(images[1].is_default);
    }

    #[test]
    fn test_hero_prefers_default_then_first() {
        let mut images = BagImage::assign_default(uploads(3), 2);
        assert_eq!(BagImage::hero(&images).unwrap().url, "https://x/2.jpg");

        for image in &mut images {
            image.is_default = false;
        }
        assert_eq!(BagImage::hero(&images).unwrap().url, "https://x/0.jpg");
        assert!(BagImage::hero(&[]).is_none());
    }

    #[test]
    fn test_stored_shape_uses_current_field_names() {
        let images = BagImage::assign_default(uploads(1), 0);
        let stored = serde_json::to_value(&images).unwrap();
        assert_eq!(
            stored,
            json!([{"url": "https://x/0.jpg", "publicId": "bags/0", "isDefault": true}])
        );
    }
}
