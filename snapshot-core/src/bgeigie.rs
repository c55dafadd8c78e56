//! Reader for raw bGeigie drive logs.
//!
//! A log is a text file of NMEA-style sentences:
//!
//! ```text
//! $BNXRDD,300,2012-12-16T14:51:21Z,28,1,4,A,3526.3497,N,13938.0612,E,37.30,A,8,1*5E
//! ```
//!
//! Fields after the sentence id are device id, timestamp, CPM, counts in the
//! last five seconds, total count, CPM validity, latitude (DDMM.MMMM) and
//! hemisphere, longitude (DDDMM.MMMM) and hemisphere, altitude, GPS validity,
//! HDOP and fix quality. The checksum is the XOR of every byte between `$` and `*`.

use chrono::{DateTime, Utc};
use radiation_core::Measurement;
use radiation_core::measurement::parse_timestamp;
use thiserror::Error;

/// Sentence ids accepted as radiation readings.
pub const SENTENCE_IDS: [&str; 2] = ["$BNXRDD", "$BNRDD"];

#[derive(Debug, Error, PartialEq)]
pub enum LogParseError {
    #[error("not a radiation sentence")]
    NotASentence,
    #[error("sentence has no checksum")]
    MissingChecksum,
    #[error("checksum mismatch: computed {computed:02X}, sentence says {found}")]
    ChecksumMismatch { computed: u8, found: String },
    #[error("missing field {0}")]
    MissingField(&'static str),
    #[error("invalid {field}: '{value}'")]
    BadField { field: &'static str, value: String },
}

/// One decoded sentence.
#[derive(Clone, Debug, PartialEq)]
pub struct LogRecord {
    pub device_id: u32,
    pub captured_at: DateTime<Utc>,
    pub cpm: u32,
    pub cp5s: u32,
    pub total_count: u64,
    pub cpm_valid: bool,
    /// Decimal degrees; 0.0 when the receiver had no usable fix.
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub gps_valid: bool,
    pub hdop: f64,
    pub fix_quality: u8,
}

impl LogRecord {
    pub fn to_measurement(&self) -> Measurement {
        Measurement {
            latitude: Some(self.latitude),
            longitude: Some(self.longitude),
            cpm: f64::from(self.cpm),
            altitude: Some(self.altitude),
            captured_at: Some(self.captured_at.to_rfc3339()),
            ..Default::default()
        }
    }
}

/// XOR of the bytes between `$` and `*`.
pub fn checksum(payload: &str) -> u8 {
    payload.bytes().fold(0, |acc, b| acc ^ b)
}

/// Convert `DDMM.MMMM` (or `DDDMM.MMMM`) plus hemisphere to decimal degrees.
/// Anything unparsable yields 0.0, which downstream code treats as "no fix".
pub fn ddm_to_dd(ddm: &str, hemisphere: &str) -> f64 {
    let Some((whole, frac)) = ddm.trim().split_once('.') else {
        return 0.0;
    };
    if whole.len() < 3 || !whole.is_ascii() {
        return 0.0;
    }
    let (deg, min) = whole.split_at(whole.len() - 2);
    let (Ok(deg), Ok(min)) = (deg.parse::<u32>(), format!("{min}.{frac}").parse::<f64>()) else {
        return 0.0;
    };
    let dd = f64::from(deg) + min / 60.0;
    if matches!(hemisphere.trim(), "S" | "W") {
        -dd
    } else {
        dd
    }
}

fn field<'a>(fields: &[&'a str], idx: usize, name: &'static str) -> Result<&'a str, LogParseError> {
    fields
        .get(idx)
        .map(|f| f.trim())
        .ok_or(LogParseError::MissingField(name))
}

fn number<T: std::str::FromStr>(
    fields: &[&str],
    idx: usize,
    name: &'static str,
) -> Result<T, LogParseError> {
    let raw = field(fields, idx, name)?;
    raw.parse().map_err(|_| LogParseError::BadField {
        field: name,
        value: raw.to_string(),
    })
}

/// Optional numeric field: empty means zero.
fn number_or_zero<T: std::str::FromStr + Default>(
    fields: &[&str],
    idx: usize,
    name: &'static str,
) -> Result<T, LogParseError> {
    if field(fields, idx, name)?.is_empty() {
        Ok(T::default())
    } else {
        number(fields, idx, name)
    }
}

pub fn parse_line(line: &str) -> Result<LogRecord, LogParseError> {
    let line = line.trim();
    if !SENTENCE_IDS
        .iter()
        .any(|id| line.starts_with(&format!("{id},")))
    {
        return Err(LogParseError::NotASentence);
    }
    let (sentence, sum) = line.split_once('*').ok_or(LogParseError::MissingChecksum)?;
    let computed = checksum(&sentence[1..]);
    let sum = sum.trim();
    if u8::from_str_radix(sum, 16).ok() != Some(computed) {
        return Err(LogParseError::ChecksumMismatch {
            computed,
            found: sum.to_string(),
        });
    }

    let fields: Vec<&str> = sentence.split(',').collect();
    let ts = field(&fields, 2, "timestamp")?;
    let captured_at = parse_timestamp(ts).ok_or_else(|| LogParseError::BadField {
        field: "timestamp",
        value: ts.to_string(),
    })?;
    Ok(LogRecord {
        device_id: number(&fields, 1, "device id")?,
        captured_at,
        cpm: number(&fields, 3, "cpm")?,
        cp5s: number(&fields, 4, "cp5s")?,
        total_count: number(&fields, 5, "total count")?,
        cpm_valid: field(&fields, 6, "cpm validity")? == "A",
        latitude: ddm_to_dd(field(&fields, 7, "latitude")?, field(&fields, 8, "latitude hemisphere")?),
        longitude: ddm_to_dd(field(&fields, 9, "longitude")?, field(&fields, 10, "longitude hemisphere")?),
        altitude: number_or_zero(&fields, 11, "altitude")?,
        gps_valid: field(&fields, 12, "gps validity")? == "A",
        hdop: number_or_zero(&fields, 13, "hdop")?,
        fix_quality: number_or_zero(&fields, 14, "fix quality")?,
    })
}

/// Decode every valid sentence of a log. Other lines are skipped.
pub fn parse_log(text: &str) -> Vec<LogRecord> {
    let mut skipped = 0usize;
    let records: Vec<LogRecord> = text
        .lines()
        .enumerate()
        .filter_map(|(n, line)| match parse_line(line) {
            Ok(r) => Some(r),
            Err(LogParseError::NotASentence) => None,
            Err(e) => {
                log::debug!("line {}: {e}", n + 1);
                skipped += 1;
                None
            }
        })
        .collect();
    if skipped > 0 {
        log::warn!("skipped {skipped} malformed sentence(s)");
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sentence(body: &str) -> String {
        format!("${body}*{:02X}", checksum(body))
    }

    const BODY: &str = "BNXRDD,300,2012-12-16T14:51:21Z,28,1,4,A,3526.3497,N,13938.0612,E,37.30,A,8,1";

    #[test]
    fn parses_a_full_sentence() {
        let r = parse_line(&sentence(BODY)).unwrap();
        assert_eq!(r.device_id, 300);
        assert_eq!(r.cpm, 28);
        assert_eq!(r.cp5s, 1);
        assert_eq!(r.total_count, 4);
        assert!(r.cpm_valid && r.gps_valid);
        assert_relative_eq!(r.latitude, 35.0 + 26.3497 / 60.0, epsilon = 1e-9);
        assert_relative_eq!(r.longitude, 139.0 + 38.0612 / 60.0, epsilon = 1e-9);
        assert_relative_eq!(r.altitude, 37.3);
        assert_eq!(r.fix_quality, 1);
        assert_eq!(r.captured_at.to_rfc3339(), "2012-12-16T14:51:21+00:00");
    }

    #[test]
    fn rejects_bad_checksum() {
        let line = format!("${BODY}*00");
        assert!(matches!(
            parse_line(&line),
            Err(LogParseError::ChecksumMismatch { .. })
        ));
        assert_eq!(parse_line(&format!("${BODY}")), Err(LogParseError::MissingChecksum));
    }

    #[test]
    fn southern_and_western_hemispheres_are_negative() {
        assert_relative_eq!(ddm_to_dd("3330.0000", "S"), -33.5);
        assert_relative_eq!(ddm_to_dd("07000.6000", "W"), -70.01);
    }

    #[test]
    fn unparsable_coordinates_become_zero() {
        assert_eq!(ddm_to_dd("", "N"), 0.0);
        assert_eq!(ddm_to_dd("3526", "N"), 0.0);
        assert_eq!(ddm_to_dd("26.5", "N"), 0.0);
        assert_eq!(ddm_to_dd("ab26.5", "N"), 0.0);
    }

    #[test]
    fn missing_fix_yields_unlocated_measurement() {
        let body = "BNXRDD,300,2012-12-16T14:51:21Z,28,1,4,A,,N,,E,,V,,";
        let r = parse_line(&sentence(body)).unwrap();
        assert!(!r.gps_valid);
        assert_eq!((r.altitude, r.hdop, r.fix_quality), (0.0, 0.0, 0));
        assert!(r.to_measurement().coordinates().is_none());
    }

    #[test]
    fn log_keeps_valid_sentences_only() {
        let text = format!(
            "# header\n{}\n$BNXRDD,garbage*00\n\n{}\n",
            sentence(BODY),
            sentence(&BODY.replace(",28,", ",334,"))
        );
        let records = parse_log(&text);
        assert_eq!(records.len(), 2);
        let m = records[1].to_measurement();
        assert_relative_eq!(m.dose_rate(), 1.0);
    }
}
