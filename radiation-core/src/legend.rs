use serde::Serialize;

use crate::bands::SEVERITY_BANDS;
use crate::overlay::escape_html;

pub const LEGEND_TITLE: &str = "Radiation Levels (µSv/h)";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LegendEntry {
    pub color: &'static str,
    /// Range text such as `≥ 100`, `1.65-5` or `< 0.03`.
    pub range: String,
    pub label: &'static str,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Legend {
    pub title: &'static str,
    pub entries: Vec<LegendEntry>,
}

impl Legend {
    /// Markup placed inside the legend control.
    pub fn to_html(&self) -> String {
        let mut html = format!("<h4>{}</h4>", escape_html(self.title));
        for e in &self.entries {
            // black swatch needs light text
            let text = if e.color == "#000000" { "; color: white;" } else { "" };
            html.push_str(&format!(
                "<div class=\"legend-item\"><span style=\"background: {}{text}\"></span> {} ({})</div>",
                e.color,
                escape_html(&e.range),
                escape_html(e.label),
            ));
        }
        html
    }
}

/// Legend rows for every marker band, highest first.
pub fn legend() -> Legend {
    let entries = SEVERITY_BANDS
        .iter()
        .enumerate()
        .map(|(i, band)| {
            let lo = band.lower_bound.map(|_| band.threshold_text);
            let hi = i
                .checked_sub(1)
                .map(|j| &SEVERITY_BANDS[j])
                .and_then(|above| above.lower_bound.map(|_| above.threshold_text));
            let range = match (lo, hi) {
                (Some(lo), Some(hi)) => format!("{lo}-{hi}"),
                (Some(lo), None) => format!("≥ {lo}"),
                (None, Some(hi)) => format!("< {hi}"),
                (None, None) => String::new(),
            };
            LegendEntry {
                color: band.color,
                range,
                label: band.label,
            }
        })
        .collect();
    Legend {
        title: LEGEND_TITLE,
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legend_covers_every_band_in_order() {
        let l = legend();
        assert_eq!(l.entries.len(), SEVERITY_BANDS.len());
        assert_eq!(l.entries[0].range, "≥ 100");
        assert_eq!(l.entries[1].range, "65.54-100");
        assert_eq!(l.entries[4].range, "1.65-5");
        assert_eq!(l.entries[5].range, "1.0-1.65");
        assert_eq!(l.entries[6].range, "0.43-1.0");
        assert_eq!(l.entries[2].range, "10-65.54");
        assert_eq!(l.entries[11].range, "< 0.03");
        assert_eq!(l.entries[11].label, "Very Low");
        for (e, b) in l.entries.iter().zip(SEVERITY_BANDS.iter()) {
            assert_eq!(e.color, b.color);
        }
    }

    #[test]
    fn html_lists_rows_under_title() {
        let html = legend().to_html();
        assert!(html.starts_with("<h4>Radiation Levels (µSv/h)</h4>"));
        assert_eq!(html.matches("class=\"legend-item\"").count(), 12);
        assert!(html.contains("<span style=\"background: #ffff00\"></span> ≥ 100 (Extreme)"));
        assert!(html.contains("&lt; 0.03 (Very Low)"));
        assert!(html.contains("<span style=\"background: #ff0080\"></span> 1.0-1.65 (Moderate High)"));
    }
}
