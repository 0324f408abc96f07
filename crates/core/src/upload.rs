//! Client-upload tracking model.
//!
//! The browser uploads images straight to the media host, one request per
//! file, and the form tracks every file independently. This module is the
//! canonical definition of that tracking state: items are an ordered
//! collection keyed by stable identifiers (never by array position), the
//! default-image pointer moves through the explicit pure function
//! [`default_after_remove`], and the submission rules
//! ([`UploadSet::submittable`], [`UploadSet::eligible_images`]) are the same
//! ones `static/upload.js` enforces in the browser.

use serde::{Deserialize, Serialize};

use crate::types::bag::UploadedImage;

/// Lifecycle of one tracked file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    /// Added to the list, upload not started.
    Pending,
    /// Upload request in flight.
    Uploading,
    /// Media host accepted the file.
    Uploaded {
        /// Delivery URL returned by the media host.
        url: String,
        /// Opaque media-host identifier.
        public_id: String,
    },
    /// Upload failed; the item stays in the list so the user sees why.
    /// Retry is re-adding the file, there is no in-place retry.
    Error {
        /// User-facing failure message.
        message: String,
    },
}

impl UploadStatus {
    /// Terminal states: the submit control only unlocks once every tracked
    /// item reaches one of these.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Uploaded { .. } | Self::Error { .. })
    }
}

/// One tracked file. Never persisted; lives for the duration of a form session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadItem {
    /// Stable identifier assigned when the file is added.
    pub id: String,
    /// Original file name, for display only.
    pub file_name: String,
    pub status: UploadStatus,
}

impl UploadItem {
    /// A freshly added item.
    #[must_use]
    pub fn pending(id: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            status: UploadStatus::Pending,
        }
    }
}

/// Ordered collection of tracked uploads plus the default-image pointer.
///
/// The default pointer is an index into the ordered list, selectable only
/// among uploaded items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadSet {
    items: Vec<UploadItem>,
    default_index: usize,
}

impl UploadSet {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The tracked items, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[UploadItem] {
        &self.items
    }

    /// Current default-image index.
    #[must_use]
    pub const fn default_index(&self) -> usize {
        self.default_index
    }

    /// Track a new file; returns its stable id's index.
    pub fn push(&mut self, item: UploadItem) -> usize {
        self.items.push(item);
        self.items.len() - 1
    }

    /// Look up an item's position by its stable id.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    /// Transition an item to a new status. Unknown ids are ignored; the
    /// upload response for a removed item has nowhere to go.
    pub fn set_status(&mut self, id: &str, status: UploadStatus) {
        if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
            item.status = status;
        }
    }

    /// Select the default image. Only uploaded items are selectable; the
    /// call is a no-op otherwise.
    pub fn select_default(&mut self, id: &str) {
        if let Some((index, item)) = self
            .items
            .iter()
            .enumerate()
            .find(|(_, item)| item.id == id)
            && matches!(item.status, UploadStatus::Uploaded { .. })
        {
            self.default_index = index;
        }
    }

    /// Remove a not-yet-submitted item and re-point the default.
    pub fn remove(&mut self, id: &str) {
        let Some(removed_index) = self.position(id) else {
            return;
        };
        self.items.remove(removed_index);
        self.default_index =
            default_after_remove(removed_index, self.default_index, self.items.len());
    }

    /// Whether the form may be submitted: every tracked item has reached a
    /// terminal state and at least one upload succeeded.
    #[must_use]
    pub fn submittable(&self) -> bool {
        self.items.iter().all(|item| item.status.is_terminal())
            && self
                .items
                .iter()
                .any(|item| matches!(item.status, UploadStatus::Uploaded { .. }))
    }

    /// The images eligible for submission: exactly the uploaded items, in order.
    #[must_use]
    pub fn eligible_images(&self) -> Vec<UploadedImage> {
        self.items
            .iter()
            .filter_map(|item| match &item.status {
                UploadStatus::Uploaded { url, public_id } => Some(UploadedImage {
                    url: url.clone(),
                    public_id: Some(public_id.clone()),
                }),
                _ => None,
            })
            .collect()
    }
}

/// Where the default pointer lands after removing the item at `removed_index`
/// from a list that now has `new_len` entries.
///
/// Removing an item before the default shifts the default left with its
/// image; removing the default itself, or shrinking the list past the stored
/// index, resets to position 0.
#[must_use]
pub const fn default_after_remove(
    removed_index: usize,
    current_default: usize,
    new_len: usize,
) -> usize {
    if removed_index == current_default {
        return 0;
    }
    let shifted = if removed_index < current_default {
        current_default - 1
    } else {
        current_default
    };
    if shifted >= new_len { 0 } else { shifted }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn uploaded(id: &str) -> UploadItem {
        UploadItem {
            id: id.to_owned(),
            file_name: format!("{id}.jpg"),
            status: UploadStatus::Uploaded {
                url: format!("https://media/{id}.jpg"),
                public_id: format!("bags/{id}"),
            },
        }
    }

    #[test]
    fn test_default_after_remove_before_default_shifts_left() {
        assert_eq!(default_after_remove(0, 2, 2), 1);
        assert_eq!(default_after_remove(1, 2, 2), 1);
    }

    #[test]
    fn test_default_after_remove_of_default_resets_to_zero() {
        assert_eq!(default_after_remove(2, 2, 2), 0);
        assert_eq!(default_after_remove(0, 0, 3), 0);
    }

    #[test]
    fn test_default_after_remove_clamps_shrunk_list() {
        // Default was past the removed item but the list is now too short.
        assert_eq!(default_after_remove(3, 4, 3), 0);
    }

    #[test]
    fn test_default_after_remove_after_default_keeps_pointer() {
        assert_eq!(default_after_remove(3, 1, 3), 1);
    }

    #[test]
    fn test_submit_blocked_while_any_upload_in_flight() {
        let mut set = UploadSet::new();
        set.push(uploaded("a"));
        set.push(UploadItem::pending("b", "b.jpg"));
        assert!(!set.submittable());

        set.set_status("b", UploadStatus::Uploading);
        assert!(!set.submittable());

        set.set_status(
            "b",
            UploadStatus::Error {
                message: "network".to_owned(),
            },
        );
        assert!(set.submittable());
    }

    #[test]
    fn test_submit_requires_at_least_one_uploaded() {
        let mut set = UploadSet::new();
        assert!(!set.submittable());

        set.push(UploadItem {
            id: "a".to_owned(),
            file_name: "a.jpg".to_owned(),
            status: UploadStatus::Error {
                message: "too large".to_owned(),
            },
        });
        assert!(!set.submittable());
    }

    #[test]
    fn test_eligible_images_are_exactly_the_uploaded_items() {
        let mut set = UploadSet::new();
        set.push(uploaded("a"));
        set.push(UploadItem::pending("b", "b.jpg"));
        set.push(uploaded("c"));

        let eligible = set.eligible_images();
        assert_eq!(eligible.len(), 2);
        assert_eq!(eligible[0].url, "https://media/a.jpg");
        assert_eq!(eligible[1].public_id.as_deref(), Some("bags/c"));
    }

    #[test]
    fn test_select_default_only_among_uploaded() {
        let mut set = UploadSet::new();
        set.push(uploaded("a"));
        set.push(UploadItem::pending("b", "b.jpg"));

        set.select_default("b");
        assert_eq!(set.default_index(), 0);

        set.set_status(
            "b",
            UploadStatus::Uploaded {
                url: "https://media/b.jpg".to_owned(),
                public_id: "bags/b".to_owned(),
            },
        );
        set.select_default("b");
        assert_eq!(set.default_index(), 1);
    }

    #[test]
    fn test_remove_repoints_default() {
        let mut set = UploadSet::new();
        set.push(uploaded("a"));
        set.push(uploaded("b"));
        set.push(uploaded("c"));
        set.select_default("c");

        set.remove("a");
        assert_eq!(set.default_index(), 1);

        set.remove("c");
        assert_eq!(set.default_index(), 0);
    }
}
