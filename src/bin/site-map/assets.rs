//! Asset embedding and loading utilities.

use crate::settings;
use rust_embed::RustEmbed;
use site_map::{SiteError, SiteMaps};
use std::fs;
use std::sync::mpsc;
use thiserror::Error;

/// Embeds all assets from the assets/ directory into the binary.
/// In debug mode, assets are loaded from the filesystem for faster iteration.
/// In release mode, assets are compressed and embedded in the binary.
#[derive(RustEmbed)]
#[folder = "assets/"]
pub struct Assets;

/// Errors that can occur when loading site data.
#[derive(Error, Debug)]
pub enum MapLoadError {
    #[error("sites.ron not found in embedded assets")]
    SitesNotFound,
    #[error("invalid UTF-8 in sites.ron: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("failed to parse sites.ron: {0}")]
    ParseError(#[from] ron::de::SpannedError),
    #[error("invalid site data: {0}")]
    Invalid(#[from] SiteError),
}

/// Errors that can occur when loading and decoding images.
#[derive(Error, Debug)]
pub enum ImageLoadError {
    #[error("asset not found: {0}")]
    AssetNotFound(String),
    #[error("failed to decode image '{path}': {source}")]
    DecodeError {
        path: String,
        source: image::ImageError,
    },
}

/// Decoded image data ready for texture creation.
pub struct DecodedImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// State of an asset being loaded asynchronously.
pub enum AssetLoadState {
    /// Asset is being loaded in a background thread.
    Loading(mpsc::Receiver<Result<DecodedImage, ImageLoadError>>),
    /// Asset has been decoded and is ready for texture creation.
    Ready(DecodedImage),
    /// Loading failed; stores the error message (already displayed via toast).
    Error(String),
}

/// Loads and decodes an image from embedded assets.
pub fn load_and_decode_image(path: &str) -> Result<DecodedImage, ImageLoadError> {
    let file = Assets::get(path).ok_or_else(|| ImageLoadError::AssetNotFound(path.to_string()))?;

    let img =
        image::load_from_memory(&file.data).map_err(|source| ImageLoadError::DecodeError {
            path: path.to_string(),
            source,
        })?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(DecodedImage {
        pixels: rgba.into_raw(),
        width,
        height,
    })
}

/// Parses and validates a RON site list.
pub fn parse_sites(ron_string: &str) -> Result<SiteMaps, MapLoadError> {
    let sites: SiteMaps = ron::from_str(ron_string)?;
    for site in &sites {
        site.validate()?;
    }
    Ok(sites)
}

/// Loads the embedded demo site data.
pub fn load_embedded_sites() -> Result<SiteMaps, MapLoadError> {
    let file = Assets::get("sites.ron").ok_or(MapLoadError::SitesNotFound)?;
    let ron_string = std::str::from_utf8(&file.data)?;
    parse_sites(ron_string)
}

/// Loads site data, preferring a valid local override file when present.
pub fn load_sites() -> Result<SiteMaps, MapLoadError> {
    if let Some(path) = settings::override_sites_path().filter(|path| path.exists()) {
        match fs::read_to_string(&path)
            .map_err(|err| err.to_string())
            .and_then(|contents| parse_sites(&contents).map_err(|err| err.to_string()))
        {
            Ok(sites) => {
                log::info!("Loaded {} sites from {}", sites.len(), path.display());
                return Ok(sites);
            }
            Err(err) => log::warn!("Ignoring site override {}: {err}", path.display()),
        }
    }

    load_embedded_sites()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_sites_parse_and_validate() {
        let sites = load_embedded_sites().unwrap();
        assert!(sites.iter().any(|site| site.key == "abu-dhabi"));
        for site in &sites {
            assert!(
                Assets::get(&site.image_path).is_some(),
                "missing image {}",
                site.image_path
            );
        }
    }

    #[test]
    fn invalid_site_data_is_rejected() {
        let ron = r#"[SiteMap(
            key: "broken",
            name: LocalizedName(en: "Broken", ar: "معطل"),
            imagePath: "maps/broken.png",
            referenceSize: (100, 100),
            zoom: ZoomSettings(min: 1.0, max: 0.5, default: 0.7, step: 0.1, wheelStep: 0.1),
        )]"#;
        assert!(matches!(parse_sites(ron), Err(MapLoadError::Invalid(_))));
    }
}
