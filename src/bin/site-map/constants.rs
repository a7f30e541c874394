use std::time::Duration;

/// Width of the sidebar panel in pixels.
pub const SIDEBAR_WIDTH: f32 = 260.0;

/// Base radius of a facility marker at scale 1.0.
pub const MARKER_RADIUS: f32 = 9.0;

/// Pointer distance (in screen pixels) that still counts as hitting a marker.
pub const HIT_RADIUS: f32 = 14.0;

/// Scale multiplier applied when zooming to a marker from the directory.
pub const FOCUS_ZOOM_FACTOR: f32 = 2.5;

/// How often the live marker feed is polled.
pub const FEED_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Request timeout for a single feed fetch.
pub const FEED_TIMEOUT: Duration = Duration::from_secs(10);

/// Environment variable that overrides the configured feed URL.
pub const FEED_URL_ENV: &str = "SITE_MAP_FEED_URL";

pub const USER_AGENT: &str = "site-map";
