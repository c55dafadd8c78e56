//! Offline rendering of an import map: the same marker and heatmap layers the
//! browser shows, drawn onto an SVG canvas and optionally rasterised to PNG.

pub mod bgeigie;
pub mod raster;
pub mod svg_surface;

use radiation_core::{
    MapViewSession, Measurement, RenderOutcome, ViewConfig, ViewMode, parse_measurements,
};
use thiserror::Error;

pub use bgeigie::{LogParseError, LogRecord, parse_log};
pub use svg_surface::{Projection, SvgSurface};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error(transparent)]
    Decode(#[from] radiation_core::Error),
    #[error("SVG parse error: {0}")]
    Svg(#[from] usvg::Error),
    #[error("cannot allocate a {0}x{1} pixmap")]
    Pixmap(u32, u32),
    #[error("PNG encoding failed: {0}")]
    Png(#[from] png::EncodingError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Input formats understood by [`read_measurements`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputFormat {
    /// Measurement listing as served by the API.
    Json,
    /// Raw bGeigie drive log.
    Log,
}

impl InputFormat {
    /// JSON when the text opens with `{` or `[`, a drive log otherwise.
    pub fn sniff(text: &str) -> Self {
        match text.trim_start().chars().next() {
            Some('{' | '[') => InputFormat::Json,
            _ => InputFormat::Log,
        }
    }
}

pub fn read_measurements(text: &str) -> Result<Vec<Measurement>, SnapshotError> {
    match InputFormat::sniff(text) {
        InputFormat::Json => Ok(parse_measurements(text)?),
        InputFormat::Log => Ok(parse_log(text).iter().map(LogRecord::to_measurement).collect()),
    }
}

/// Draw `measurements` in `mode` and return the SVG document together with
/// what ended up on the canvas.
pub fn render_svg(
    measurements: Vec<Measurement>,
    mode: ViewMode,
    width: u32,
    height: u32,
    config: ViewConfig,
) -> (String, RenderOutcome) {
    let mut session = MapViewSession::new(SvgSurface::new(width, height), config);
    let loaded = session.load(measurements);
    let outcome = match session.set_mode(mode) {
        RenderOutcome::Unchanged => loaded,
        other => other,
    };
    (session.surface().to_svg(), outcome)
}
