use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::Error;

/// 8-bit RGB triple parsed from `#rgb` / `#rrggbb` notation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Linear blend; `t` is clamped to `[0, 1]`.
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }
}

impl FromStr for Rgb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| Error::InvalidColor(s.to_string()))?;
        let digit = |c: u8| -> Result<u8, Error> {
            (c as char)
                .to_digit(16)
                .map(|d| d as u8)
                .ok_or_else(|| Error::InvalidColor(s.to_string()))
        };
        let bytes = hex.as_bytes();
        match bytes.len() {
            3 => {
                let r = digit(bytes[0])?;
                let g = digit(bytes[1])?;
                let b = digit(bytes[2])?;
                Ok(Rgb::new(r * 17, g * 17, b * 17))
            }
            6 => {
                let pair = |i: usize| -> Result<u8, Error> {
                    Ok(digit(bytes[i])? * 16 + digit(bytes[i + 1])?)
                };
                Ok(Rgb::new(pair(0)?, pair(2)?, pair(4)?))
            }
            _ => Err(Error::InvalidColor(s.to_string())),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bands::SEVERITY_BANDS;

    #[test]
    fn parses_long_and_short_forms() {
        assert_eq!("#ff8000".parse::<Rgb>().ok(), Some(Rgb::new(255, 128, 0)));
        assert_eq!("#000".parse::<Rgb>().ok(), Some(Rgb::new(0, 0, 0)));
        assert_eq!("#fff".parse::<Rgb>().ok(), Some(Rgb::new(255, 255, 255)));
    }

    #[test]
    fn rejects_garbage() {
        assert!("ff8000".parse::<Rgb>().is_err());
        assert!("#ff80".parse::<Rgb>().is_err());
        assert!("#gg0000".parse::<Rgb>().is_err());
    }

    #[test]
    fn band_colors_round_trip_through_display() {
        for b in &SEVERITY_BANDS {
            let rgb: Rgb = b.color.parse().unwrap();
            assert_eq!(rgb.to_string(), b.color);
        }
    }

    #[test]
    fn lerp_hits_endpoints_and_midpoint() {
        let a = Rgb::new(0, 0, 255);
        let b = Rgb::new(0, 255, 255);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Rgb::new(0, 128, 255));
        assert_eq!(a.lerp(b, 7.0), b);
    }
}
