//! Page metadata attached to cache entries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metadata harvested for a cached page.
///
/// A fixed set of optional named fields covers what extraction produces;
/// anything else a strategy wants to record goes through the flattened
/// `extra` map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PageMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Word count of the extracted content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_count: Option<u64>,

    /// Name of the strategy that produced the content ("rendered" / "static").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_method: Option<String>,

    /// Whether robots.txt allowed the fetch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub robots_allowed: Option<bool>,

    /// HTTP status code of the fetched page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    /// Last processing error, set on failed entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_error: Option<String>,

    /// Extraction-specific extras not covered by the named fields.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl PageMetadata {
    /// Merge another metadata record into this one.
    ///
    /// Fields set in `other` win; fields left `None` keep the existing
    /// value. `extra` keys from `other` overwrite matching keys.
    pub fn merge(&mut self, other: PageMetadata) {
        macro_rules! take {
            ($field:ident) => {
                if other.$field.is_some() {
                    self.$field = other.$field;
                }
            };
        }

        take!(description);
        take!(author);
        take!(published_date);
        take!(image_url);
        take!(site_name);
        take!(content_type);
        take!(word_count);
        take!(extraction_method);
        take!(robots_allowed);
        take!(status_code);
        take!(processing_error);

        self.extra.extend(other.extra);
    }
}
