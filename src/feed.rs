//! Live marker feed payload and its merge into the embedded site data.
//!
//! The feed only ever replaces marker lists. Site imagery, reference sizes and
//! zoom limits always come from the embedded assets.

use crate::{Facility, SiteMaps};
use serde::{Deserialize, Serialize};

/// Marker list for one site as served by the feed endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteMarkers {
    /// Key of the site these markers belong to
    pub site: String,
    pub markers: Vec<Facility>,
}

pub type FeedPayload = Vec<SiteMarkers>;

/// Where the markers currently on screen came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DataSource {
    /// Embedded demo data (no feed configured, or the feed is unreachable)
    #[default]
    Demo,
    Live,
}

/// Outcome of merging a feed payload.
#[derive(Debug, Default, PartialEq)]
pub struct MergeReport {
    /// Site keys whose markers were replaced
    pub updated: Vec<String>,
    /// Site keys that were rejected, with the reason
    pub skipped: Vec<(String, String)>,
}

pub fn parse_payload(bytes: &[u8]) -> Result<FeedPayload, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// Applies `payload` on top of `sites`, validating each marker set first.
pub fn merge_feed(sites: &SiteMaps, payload: FeedPayload) -> (SiteMaps, MergeReport) {
    let mut merged = sites.clone();
    let mut report = MergeReport::default();

    for SiteMarkers { site, markers } in payload {
        let Some(target) = merged.iter_mut().find(|candidate| candidate.key == site) else {
            report.skipped.push((site, "unknown site".to_string()));
            continue;
        };

        if let Err(err) = target.validate_markers(&markers) {
            log::warn!("Rejecting feed markers for '{site}': {err}");
            report.skipped.push((site, err.to_string()));
            continue;
        }

        target.markers = markers;
        report.updated.push(site);
    }

    (merged, report)
}
