//! The persisted shape of the settings.
//!
//! Domain lists are stored as a single string. Depending on which tool wrote
//! them they are separated by newlines or by commas, so both are accepted, as
//! is a proper list.

use serde::{Deserialize, Deserializer, Serialize};

use super::{DEFAULT_THRESHOLD_SECS, DEFAULT_VOLUME};

/// Settings exactly as they appear in a settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoredSettings {
    pub long_request_threshold: f64,
    pub domain_filter_mode: String,
    #[serde(deserialize_with = "domain_list")]
    pub whitelist_domains: Vec<String>,
    #[serde(deserialize_with = "domain_list")]
    pub blacklist_domains: Vec<String>,
    pub sound_volume: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_sound_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_sound_file_name: Option<String>,
    pub show_os_notifications: bool,
}

impl Default for StoredSettings {
    fn default() -> Self {
        Self {
            long_request_threshold: DEFAULT_THRESHOLD_SECS,
            domain_filter_mode: "all".to_string(),
            whitelist_domains: Vec::new(),
            blacklist_domains: Vec::new(),
            sound_volume: DEFAULT_VOLUME,
            custom_sound_location: None,
            custom_sound_file_name: None,
            show_os_notifications: false,
        }
    }
}

/// Split a stored domain list into individual patterns.
///
/// Accepts newline (`\n` or `\r\n`) and comma separators, trims each entry
/// and drops empty ones.
pub fn parse_domain_list(text: &str) -> Vec<String> {
    text.split(['\n', ','])
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect()
}

fn domain_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Items(Vec<String>),
        Missing(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => parse_domain_list(&text),
        Raw::Items(items) => items
            .iter()
            .flat_map(|item| parse_domain_list(item))
            .collect(),
        Raw::Missing(()) => Vec::new(),
    })
}
