use serde::Serialize;

use crate::measurement::Measurement;

/// Text shown when hovering or clicking a marker.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MarkerOverlay {
    pub dose_rate: f64,
    pub cpm: f64,
    pub altitude_m: f64,
    pub heading_deg: f64,
    /// `YYYY-MM-DD HH:MM:SS` in UTC, absent when the reading has no usable timestamp.
    pub captured_at: Option<String>,
}

impl MarkerOverlay {
    pub fn from_measurement(m: &Measurement) -> Self {
        MarkerOverlay {
            dose_rate: m.dose_rate(),
            cpm: m.cpm,
            altitude_m: m.altitude.unwrap_or(0.0),
            heading_deg: m.heading.unwrap_or(0.0),
            captured_at: m
                .captured_at_utc()
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }

    /// Plain-text lines in display order.
    pub fn lines(&self) -> Vec<String> {
        let mut out = vec![
            format!("{:.2} µSv/h", self.dose_rate),
            format!("{} CPM", fmt_number(self.cpm)),
            format!("{} m alt", fmt_number(self.altitude_m)),
            format!("{}° heading", fmt_number(self.heading_deg)),
        ];
        if let Some(ts) = &self.captured_at {
            out.push(format!("{ts} UTC"));
        }
        out
    }

    /// Markup for the map tooltip and popup. The first two lines are emphasised.
    pub fn to_html(&self) -> String {
        let body = self
            .lines()
            .into_iter()
            .enumerate()
            .map(|(i, line)| {
                let line = escape_html(&line);
                if i < 2 {
                    format!("<strong>{line}</strong>")
                } else {
                    line
                }
            })
            .collect::<Vec<_>>()
            .join("<br>");
        format!("<div class=\"measurement-tooltip\">{body}</div>")
    }
}

/// Integers print without a fractional part, everything else as-is.
pub(crate) fn fmt_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_lists_every_field() {
        let m = Measurement {
            altitude: Some(12.5),
            heading: Some(90.0),
            captured_at: Some("2024-03-01T10:20:30+09:00".into()),
            ..Measurement::at(35.0, 139.0, 334.0)
        };
        let o = MarkerOverlay::from_measurement(&m);
        assert_eq!(
            o.lines(),
            vec![
                "1.00 µSv/h",
                "334 CPM",
                "12.5 m alt",
                "90° heading",
                "2024-03-01 01:20:30 UTC",
            ]
        );
    }

    #[test]
    fn missing_descriptive_fields_default() {
        let o = MarkerOverlay::from_measurement(&Measurement::at(35.0, 139.0, 0.0));
        assert_eq!(o.altitude_m, 0.0);
        assert_eq!(o.heading_deg, 0.0);
        assert!(o.captured_at.is_none());
        assert_eq!(o.lines().len(), 4);
    }

    #[test]
    fn html_emphasises_dose_and_count() {
        let html = MarkerOverlay::from_measurement(&Measurement::at(35.0, 139.0, 33_400.0)).to_html();
        assert!(html.starts_with("<div class=\"measurement-tooltip\"><strong>100.00 µSv/h</strong><br><strong>33400 CPM</strong>"));
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html("<b>&\"'"), "&lt;b&gt;&amp;&quot;&#39;");
    }
}
