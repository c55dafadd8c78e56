//! Radiation-level classification and map layer planning for bGeigie imports.
//!
//! Raw counts are converted to µSv/h ([`dose`]), classified into severity bands
//! ([`bands`]) and turned into either circle markers ([`markers`]) or an
//! aggregated heat layer ([`heat`]). [`session::MapViewSession`] switches between
//! the two on any [`session::MapSurface`].

pub mod bands;
pub mod color;
pub mod config;
pub mod constants;
pub mod dose;
pub mod error;
pub mod events;
pub mod heat;
pub mod legend;
pub mod markers;
pub mod measurement;
pub mod overlay;
pub mod session;
pub mod stats;

pub use bands::{HeatBand, SeverityBand, classify, heat_band, heat_weight};
pub use config::ViewConfig;
pub use dose::to_dose_rate;
pub use error::Error;
pub use events::{Subscription, Subscriptions};
pub use heat::{HeatLayer, HeatPoint, HeatStyle, plan_heat};
pub use legend::{Legend, LegendEntry, legend};
pub use markers::{Bounds, MarkerLayer, MarkerSpec, MarkerStyle, plan_markers};
pub use measurement::{Measurement, MeasurementsResponse, parse_measurements, parse_response};
pub use overlay::MarkerOverlay;
pub use session::{LoadTicket, MapSurface, MapViewSession, RenderOutcome, ViewMode};
pub use stats::{MeasurementStats, STAT_FIELDS};
