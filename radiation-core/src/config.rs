use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CENTER, DEFAULT_ZOOM, FIT_PADDING_RATIO, MAP_CONTAINER_ID, MEASUREMENTS_PATH,
    TILE_ATTRIBUTION, TILE_URL,
};
use crate::error::Error;
use crate::heat::HeatStyle;
use crate::markers::MarkerStyle;

/// Tunables a host page may override. Missing keys keep their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Initial `[lat, lng]` before data arrives.
    pub center: [f64; 2],
    pub zoom: u8,
    pub fit_padding: f64,
    pub marker: MarkerStyle,
    pub heat: HeatStyle,
    /// Path template of the measurement listing; `{id}` is replaced by the import id.
    pub measurements_path: String,
    pub container_id: String,
    pub tile_url: String,
    pub tile_attribution: String,
    /// `error`, `warn`, `info`, `debug` or `trace`.
    pub log_level: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        ViewConfig {
            center: [DEFAULT_CENTER.0, DEFAULT_CENTER.1],
            zoom: DEFAULT_ZOOM,
            fit_padding: FIT_PADDING_RATIO,
            marker: MarkerStyle::default(),
            heat: HeatStyle::default(),
            measurements_path: MEASUREMENTS_PATH.to_string(),
            container_id: MAP_CONTAINER_ID.to_string(),
            tile_url: TILE_URL.to_string(),
            tile_attribution: TILE_ATTRIBUTION.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl ViewConfig {
    pub fn from_json(text: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn measurements_url(&self, import_id: &str) -> String {
        self.measurements_path.replace("{id}", import_id)
    }

    pub fn log_level(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_overrides_keep_defaults() {
        let cfg = ViewConfig::from_json(r#"{"zoom": 12, "heat": {"radius": 25}}"#).unwrap();
        assert_eq!(cfg.zoom, 12);
        assert_eq!(cfg.heat.radius, 25.0);
        assert_eq!(cfg.heat.blur, 10.0);
        assert_eq!(cfg.marker, MarkerStyle::default());
        assert_eq!(cfg.center, [35.6762, 139.6503]);
        assert_eq!(cfg.container_id, "import-map");
    }

    #[test]
    fn builds_measurement_url() {
        let cfg = ViewConfig::default();
        assert_eq!(cfg.measurements_url("42"), "bgeigie-imports/42/measurements");
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let cfg = ViewConfig {
            log_level: "loud".into(),
            ..Default::default()
        };
        assert_eq!(cfg.log_level(), log::LevelFilter::Info);
        let cfg = ViewConfig {
            log_level: "debug".into(),
            ..Default::default()
        };
        assert_eq!(cfg.log_level(), log::LevelFilter::Debug);
    }
}
