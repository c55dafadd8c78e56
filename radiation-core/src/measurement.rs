use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use serde_json::value::RawValue;

use crate::dose::to_dose_rate;
use crate::error::Error;

/// A single geolocated reading as served by the import measurement listing.
///
/// Every field is decoded leniently: a malformed record still yields a
/// `Measurement`, it just may lack coordinates or carry a zero count.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_cpm")]
    pub cpm: f64,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub altitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub heading: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub captured_at: Option<String>,
}

impl Measurement {
    /// Reading at `(lat, lng)` with only a count rate.
    pub fn at(latitude: f64, longitude: f64, cpm: f64) -> Self {
        Measurement {
            latitude: Some(latitude),
            longitude: Some(longitude),
            cpm,
            ..Default::default()
        }
    }

    /// `(lat, lng)` when both are usable.
    ///
    /// Non-finite values and an exact `0.0` count as missing: the log importer
    /// writes `0.0` for fields it could not parse.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let usable = |v: Option<f64>| v.filter(|x| x.is_finite() && *x != 0.0);
        Some((usable(self.latitude)?, usable(self.longitude)?))
    }

    pub fn dose_rate(&self) -> f64 {
        to_dose_rate(self.cpm)
    }

    pub fn captured_at_utc(&self) -> Option<DateTime<Utc>> {
        self.captured_at.as_deref().and_then(parse_timestamp)
    }
}

/// Iterate over the readings that can be placed on a map, paired with their coordinates.
pub fn located(measurements: &[Measurement]) -> impl Iterator<Item = (f64, f64, &Measurement)> {
    measurements
        .iter()
        .filter_map(|m| m.coordinates().map(|(lat, lng)| (lat, lng, m)))
}

/// Parse an ISO timestamp. Values without an offset are taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Body of `GET /bgeigie-imports/{id}/measurements`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MeasurementsResponse {
    #[serde(default)]
    pub measurements: Vec<Measurement>,
    pub total_count: Option<u64>,
    pub import_id: Option<i64>,
}

/// Listing with its records kept undecoded so that each can fail on its own.
#[derive(Deserialize)]
struct RawListing<'a> {
    #[serde(default, borrow)]
    measurements: Option<Vec<&'a RawValue>>,
    total_count: Option<u64>,
    import_id: Option<i64>,
}

/// Decode a listing, wrapped in `{"measurements": [...]}` or bare.
///
/// Records that are not objects or hold values JSON numbers cannot represent
/// are dropped; the rest of the listing survives.
pub fn parse_response(text: &str) -> Result<MeasurementsResponse, Error> {
    let listing = if text.trim_start().starts_with('[') {
        RawListing {
            measurements: Some(serde_json::from_str(text)?),
            total_count: None,
            import_id: None,
        }
    } else {
        serde_json::from_str::<RawListing>(text)?
    };
    let raw = listing.measurements.unwrap_or_default();
    let measurements: Vec<Measurement> = raw
        .iter()
        .enumerate()
        .filter_map(|(i, record)| match serde_json::from_str(record.get()) {
            Ok(m) => Some(m),
            Err(e) => {
                log::debug!("record {i}: {e}");
                None
            }
        })
        .collect();
    if measurements.len() < raw.len() {
        log::warn!(
            "skipped {} malformed measurement record(s)",
            raw.len() - measurements.len()
        );
    }
    Ok(MeasurementsResponse {
        measurements,
        total_count: listing.total_count,
        import_id: listing.import_id,
    })
}

/// Decode the records of a listing; see [`parse_response`].
pub fn parse_measurements(text: &str) -> Result<Vec<Measurement>, Error> {
    Ok(parse_response(text)?.measurements)
}

fn number_from_value(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn lenient_opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(number_from_value))
}

fn lenient_opt_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.and_then(|v| match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

fn lenient_cpm<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref()
        .and_then(number_from_value)
        .filter(|c| c.is_finite())
        .unwrap_or(0.0))
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(match v {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn decodes_wrapped_listing() {
        let text = r#"{
            "measurements": [
                {"id": 1, "cpm": 35, "latitude": 35.1, "longitude": 139.2, "captured_at": "2024-03-01T10:20:30"}
            ],
            "total_count": 1,
            "import_id": 7
        }"#;
        let ms = parse_measurements(text).unwrap();
        assert_eq!(ms.len(), 1);
        assert_eq!(ms[0].cpm, 35.0);
        assert_eq!(ms[0].coordinates(), Some((35.1, 139.2)));
    }

    #[test]
    fn decodes_bare_array() {
        let ms = parse_measurements(r#"[{"cpm": 1, "latitude": 1, "longitude": 2}]"#).unwrap();
        assert_eq!(ms.len(), 1);
    }

    #[test]
    fn malformed_cpm_becomes_zero() {
        let text = r#"[
            {"cpm": "abc", "latitude": 35, "longitude": 139},
            {"cpm": null, "latitude": 35, "longitude": 139},
            {"cpm": [1, 2], "latitude": 35, "longitude": 139},
            {"cpm": "42", "latitude": 35, "longitude": 139},
            {"latitude": 35, "longitude": 139}
        ]"#;
        let cpms: Vec<f64> = parse_measurements(text).unwrap().iter().map(|m| m.cpm).collect();
        assert_eq!(cpms, vec![0.0, 0.0, 0.0, 42.0, 0.0]);
    }

    #[test]
    fn missing_or_zero_coordinates_are_excluded() {
        let ms = vec![
            Measurement::at(35.0, 139.0, 10.0),
            Measurement {
                latitude: None,
                longitude: Some(139.0),
                ..Default::default()
            },
            Measurement::at(0.0, 139.0, 10.0),
            Measurement::at(f64::NAN, 139.0, 10.0),
        ];
        assert_eq!(located(&ms).count(), 1);
    }

    #[test]
    fn bad_records_do_not_sink_the_listing() {
        let text = r#"{
            "measurements": [
                null,
                {"cpm": 10, "latitude": 35.1, "longitude": 139.2},
                {"cpm": 1e400, "latitude": 35.1, "longitude": 139.2},
                "oops",
                {"cpm": 20, "latitude": 35.2, "longitude": 139.3}
            ],
            "total_count": 5
        }"#;
        let r = parse_response(text).unwrap();
        let cpms: Vec<f64> = r.measurements.iter().map(|m| m.cpm).collect();
        assert_eq!(cpms, vec![10.0, 20.0]);
        assert_eq!(r.total_count, Some(5));

        let ms = parse_measurements(r#"[null, {"cpm": 3, "latitude": 1, "longitude": 2}]"#).unwrap();
        assert_eq!(ms.len(), 1);
    }

    #[test]
    fn null_or_missing_listing_is_empty() {
        assert!(parse_measurements(r#"{"measurements": null}"#).unwrap().is_empty());
        assert!(parse_measurements(r#"{"import_id": 3}"#).unwrap().is_empty());
    }

    #[test]
    fn non_json_is_an_error() {
        assert!(parse_measurements("<html>").is_err());
    }

    #[test]
    fn timestamps_are_normalised_to_utc() {
        let t = parse_timestamp("2024-03-01T10:20:30+09:00").unwrap();
        assert_eq!((t.hour(), t.minute(), t.second()), (1, 20, 30));
        let t = parse_timestamp("2024-03-01T10:20:30.123456").unwrap();
        assert_eq!((t.day(), t.hour()), (1, 10));
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
