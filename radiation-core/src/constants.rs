//! Application-wide numeric constants.
//! Dose rates are expressed in µSv/h and coordinates in degrees unless noted otherwise.

/// CPM per µSv/h for the LND 7317 pancake tube fitted to bGeigie units.
pub const CPM_PER_MICRO_SV_H: f64 = 334.0;

/// Edge length of a heatmap aggregation cell in degrees (~30-35 m at mid-latitudes).
pub const HEAT_CELL_SIZE_DEG: f64 = 0.0003;
/// Multiplier applied to every heat weight before it reaches the heat layer.
pub const HEAT_INTENSITY_SCALE: f64 = 0.8;

/// Heat layer point radius (px).
pub const HEAT_RADIUS_PX: f64 = 18.0;
/// Heat layer blur (px).
pub const HEAT_BLUR_PX: f64 = 10.0;
/// Zoom level at which heat points reach full intensity.
pub const HEAT_MAX_ZOOM: u8 = 17;
/// Weight that saturates the heat palette.
pub const HEAT_MAX_WEIGHT: f64 = 1.0;
pub const HEAT_MIN_OPACITY: f64 = 0.5;

/// Circle marker outline.
pub const MARKER_STROKE_COLOR: &str = "#000";
pub const MARKER_STROKE_WEIGHT: f64 = 1.0;
pub const MARKER_OPACITY: f64 = 0.8;
pub const MARKER_FILL_OPACITY: f64 = 0.7;

/// Fraction of the data extent added on each side when fitting the viewport.
pub const FIT_PADDING_RATIO: f64 = 0.1;

/// Initial map view before any data arrives (Tokyo).
pub const DEFAULT_CENTER: (f64, f64) = (35.6762, 139.6503);
pub const DEFAULT_ZOOM: u8 = 10;

/// Endpoint template for the per-import measurement listing.
pub const MEASUREMENTS_PATH: &str = "bgeigie-imports/{id}/measurements";

/// Element id of the map container on the import detail page.
pub const MAP_CONTAINER_ID: &str = "import-map";
pub const TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const TILE_ATTRIBUTION: &str = "© OpenStreetMap contributors";
