//! Data models
//!
//! `LinkRecord` is the normalized, cached form of an API entry.

use serde::{Deserialize, Serialize};

use crate::api::RawEntry;

/// A scheduling link ready for display and actions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkRecord {
    /// API identifier, used by the toggle endpoint
    pub id: String,
    /// Public display name
    pub name: String,
    /// Internal name; empty when the link has none
    pub private_name: String,
    /// Public booking URL
    pub link: String,
}

impl LinkRecord {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        private_name: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            private_name: private_name.into(),
            link: link.into(),
        }
    }

    /// Normalize an API entry
    ///
    /// The booking URL is `{base_url}/{scope slug}/{entry slug}`.
    pub fn from_raw(entry: RawEntry, base_url: &str) -> Self {
        let link = format!(
            "{}/{}/{}",
            base_url.trim_end_matches('/'),
            entry.scope.slug,
            entry.slug
        );
        Self {
            id: entry.id,
            name: entry.name,
            private_name: entry.private_name.unwrap_or_default(),
            link,
        }
    }

    /// Name with the private name in parentheses, when there is one
    pub fn display_label(&self) -> String {
        if self.private_name.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.private_name)
        }
    }
}
