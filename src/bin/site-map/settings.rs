//! Persisted user settings and configuration overrides.

use crate::constants::FEED_URL_ENV;
use crate::overlays::OverlayVisibility;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings persisted between runs through eframe storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Key of the last viewed site
    pub selected_site: Option<String>,
    pub overlays: OverlayVisibility,
    /// Live marker feed endpoint; empty disables the feed
    pub feed_url: String,
    /// Dashboard base URL used for "Open in browser"; empty hides the action
    pub detail_base_url: String,
}

impl Settings {
    /// Restores settings from storage, falling back to defaults.
    pub fn load(storage: Option<&dyn eframe::Storage>) -> Self {
        let mut settings: Settings = storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();

        if let Ok(url) = std::env::var(FEED_URL_ENV) {
            log::info!("Using feed URL from {FEED_URL_ENV}");
            settings.feed_url = url;
        }

        settings
    }

    pub fn feed_url(&self) -> Option<&str> {
        non_empty(&self.feed_url)
    }

    pub fn detail_base_url(&self) -> Option<&str> {
        non_empty(&self.detail_base_url)
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

/// Location of an optional `sites.ron` that replaces the embedded site list.
pub fn override_sites_path() -> Option<PathBuf> {
    let config = dirs::config_dir()?;
    Some(config.join("site-map").join("sites.ron"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_urls_are_disabled() {
        let settings = Settings {
            feed_url: "   ".to_string(),
            detail_base_url: " https://dashboard.example.ae/ ".to_string(),
            ..Settings::default()
        };
        assert_eq!(settings.feed_url(), None);
        assert_eq!(
            settings.detail_base_url(),
            Some("https://dashboard.example.ae/")
        );
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: Settings = ron::from_str("(feed_url: \"https://feed.example.ae\")").unwrap();
        assert_eq!(settings.feed_url(), Some("https://feed.example.ae"));
        assert!(settings.overlays.labels);
        assert!(settings.selected_site.is_none());
    }

    #[test]
    fn settings_saved_with_a_display_language_still_load() {
        let settings: Settings =
            ron::from_str("(selected_site: Some(\"al-ain\"), language: Arabic)").unwrap();
        assert_eq!(settings.selected_site.as_deref(), Some("al-ain"));
    }
}
