use clap::Parser;
use color_eyre::eyre::{WrapErr, eyre};
use image::GenericImageView;
use image::imageops::FilterType;
use indicatif::{ProgressBar, ProgressStyle};
use ron::ser::PrettyConfig;
use serde::Deserialize;
use site_map::{
    Facility, FacilityCategory, FacilityStatus, LocalizedName, MarkerPosition, SiteMap, SiteMaps,
    ZoomSettings,
};
use std::fs;
use std::path::{Path, PathBuf};

const USER_AGENT: &str = "site-map-import";

const SITES_RON_PATH: &str = "assets/sites.ron";
const MAP_ASSETS_DIR: &str = "assets/maps";

/// Converts a JSON marker export into the embedded site data.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON export to read: a file path or an http(s) URL
    input: String,

    /// Where to write the RON site list (defaults to the embedded asset)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Longest edge of the rasters copied into the assets
    #[arg(long, default_value_t = 2048)]
    max_dimension: u32,

    /// Keep pixel coordinates instead of converting them to percentages
    #[arg(long)]
    keep_pixels: bool,
}

// ============================================================================
// Export types - match the JSON structure exactly
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportedSite {
    key: String,
    name_en: String,
    name_ar: String,
    /// Source raster, relative to the export file
    #[serde(default)]
    image: Option<PathBuf>,
    /// Required when no raster is given
    #[serde(default)]
    reference_size: Option<[u32; 2]>,
    #[serde(default)]
    zoom: Option<ZoomSettings>,
    #[serde(default)]
    markers: Vec<ExportedMarker>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportedMarker {
    id: String,
    name_en: String,
    name_ar: String,
    x: f32,
    y: f32,
    #[serde(default)]
    unit: CoordinateUnit,
    category: FacilityCategory,
    #[serde(default = "default_status")]
    status: FacilityStatus,
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum CoordinateUnit {
    #[default]
    Percent,
    Pixels,
}

fn default_status() -> FacilityStatus {
    FacilityStatus::Operational
}

fn repo_path(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(path)
}

// ============================================================================
// Conversion
// ============================================================================

async fn read_export(input: &str) -> color_eyre::Result<(String, PathBuf)> {
    if input.starts_with("http://") || input.starts_with("https://") {
        let client = reqwest::Client::new();
        let response = client
            .get(input)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(eyre!("Failed to fetch export: {}", response.status()));
        }

        let text = response.text().await?;
        let base = std::env::current_dir()?;
        Ok((text, base))
    } else {
        let path = PathBuf::from(input);
        let text = fs::read_to_string(&path)
            .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
        let base = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok((text, base))
    }
}

/// Copies the site raster into the assets, downscaled to `max_dimension`.
///
/// Returns the asset path and the source raster's size, which becomes the
/// reference size when the export does not declare one.
fn import_raster(
    key: &str,
    source: &Path,
    max_dimension: u32,
) -> color_eyre::Result<(String, [u32; 2])> {
    let image = image::open(source)
        .wrap_err_with(|| format!("Failed to open raster {}", source.display()))?;
    let (width, height) = image.dimensions();

    let image = if width.max(height) > max_dimension {
        image.resize(max_dimension, max_dimension, FilterType::Lanczos3)
    } else {
        image
    };

    let relative_path = format!("maps/{key}.png");
    let output_path = repo_path(&format!("assets/{relative_path}"));
    image
        .save(&output_path)
        .wrap_err_with(|| format!("Failed to write {}", output_path.display()))?;
    log::debug!(
        "Wrote {} ({}x{})",
        output_path.display(),
        image.width(),
        image.height()
    );

    Ok((relative_path, [width, height]))
}

fn convert_marker(marker: ExportedMarker, reference_size: [u32; 2], keep_pixels: bool) -> Facility {
    let raw = match marker.unit {
        CoordinateUnit::Percent => MarkerPosition::Percent {
            x: marker.x,
            y: marker.y,
        },
        CoordinateUnit::Pixels => MarkerPosition::ReferencePixels {
            x: marker.x,
            y: marker.y,
        },
    };

    let position = match raw {
        MarkerPosition::ReferencePixels { .. } if keep_pixels => raw,
        _ => {
            let normalized = raw.normalize(reference_size);
            MarkerPosition::Percent {
                x: round_to_hundredths(normalized.x),
                y: round_to_hundredths(normalized.y),
            }
        }
    };

    Facility {
        id: marker.id,
        name: LocalizedName::new(marker.name_en, marker.name_ar),
        position,
        category: marker.category,
        status: marker.status,
    }
}

fn round_to_hundredths(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

fn convert_site(
    site: ExportedSite,
    base: &Path,
    args: &Args,
) -> color_eyre::Result<SiteMap> {
    let (image_path, raster_size) = match &site.image {
        Some(image) => {
            let (path, size) = import_raster(&site.key, &base.join(image), args.max_dimension)?;
            (path, Some(size))
        }
        None => (format!("maps/{}.png", site.key), None),
    };

    let reference_size = site
        .reference_size
        .or(raster_size)
        .ok_or_else(|| eyre!("Site '{}' has neither a raster nor a referenceSize", site.key))?;

    let markers = site
        .markers
        .into_iter()
        .map(|marker| convert_marker(marker, reference_size, args.keep_pixels))
        .collect();

    let converted = SiteMap {
        key: site.key,
        name: LocalizedName::new(site.name_en, site.name_ar),
        image_path,
        reference_size,
        zoom: site.zoom.unwrap_or_default(),
        markers,
    };
    converted.validate()?;

    Ok(converted)
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let args = Args::parse();

    println!("Reading export from {}...", args.input);
    let (json_text, base) = read_export(&args.input).await?;
    println!("Read {} bytes of JSON", json_text.len());

    let exported: Vec<ExportedSite> = serde_json::from_str(&json_text)?;
    println!("Parsed {} sites", exported.len());

    fs::create_dir_all(repo_path(MAP_ASSETS_DIR))?;

    let progress = ProgressBar::new(exported.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let mut sites: SiteMaps = Vec::new();
    for site in exported {
        progress.set_message(site.key.clone());
        sites.push(convert_site(site, &base, &args)?);
        progress.inc(1);
    }
    progress.finish_with_message("done");

    // Serialize to RON with pretty formatting
    let pretty_config = PrettyConfig::new()
        .depth_limit(10)
        .indentor("  ".to_string())
        .struct_names(true)
        .enumerate_arrays(false);

    let ron_string = ron::ser::to_string_pretty(&sites, pretty_config)?;
    println!("Serialized to {} bytes of RON", ron_string.len());

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| repo_path(SITES_RON_PATH));
    fs::write(&output_path, &ron_string)?;
    println!("Wrote sites to {}", output_path.display());

    println!("\nSites:");
    for site in &sites {
        println!("  - {} ({}, {} markers)", site.name.en, site.key, site.markers.len());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(x: f32, y: f32, unit: CoordinateUnit) -> ExportedMarker {
        ExportedMarker {
            id: "ad-ghq".to_string(),
            name_en: "General HQ".to_string(),
            name_ar: "القيادة العامة".to_string(),
            x,
            y,
            unit,
            category: FacilityCategory::Headquarters,
            status: FacilityStatus::Operational,
        }
    }

    #[test]
    fn pixel_markers_become_percentages() {
        let facility = convert_marker(marker(1185.0, 592.5, CoordinateUnit::Pixels), [2370, 2370], false);
        assert_eq!(facility.position, MarkerPosition::Percent { x: 50.0, y: 25.0 });
    }

    #[test]
    fn keep_pixels_preserves_reference_coordinates() {
        let facility = convert_marker(marker(100.0, 200.0, CoordinateUnit::Pixels), [2370, 2370], true);
        assert_eq!(
            facility.position,
            MarkerPosition::ReferencePixels { x: 100.0, y: 200.0 }
        );
    }

    #[test]
    fn export_defaults_unit_and_status() {
        let json = r#"[{
            "key": "al-ain",
            "nameEn": "Al Ain",
            "nameAr": "العين",
            "referenceSize": [1600, 1200],
            "markers": [{
                "id": "zakher",
                "nameEn": "Zakher",
                "nameAr": "زاخر",
                "x": 40.5,
                "y": 60.25,
                "category": "PoliceStation"
            }]
        }]"#;
        let sites: Vec<ExportedSite> = serde_json::from_str(json).unwrap();
        let marker = &sites[0].markers[0];
        assert!(matches!(marker.unit, CoordinateUnit::Percent));
        assert_eq!(marker.status, FacilityStatus::Operational);
    }

    #[test]
    fn site_without_raster_or_size_is_rejected() {
        let site = ExportedSite {
            key: "al-ain".to_string(),
            name_en: "Al Ain".to_string(),
            name_ar: "العين".to_string(),
            image: None,
            reference_size: None,
            zoom: None,
            markers: Vec::new(),
        };
        let args = Args::parse_from(["import_sites", "export.json"]);
        assert!(convert_site(site, Path::new("."), &args).is_err());
    }
}
