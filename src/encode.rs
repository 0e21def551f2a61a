//! Result encoding: ranked palette entries to the `{red, green, blue, weight}`
//! records handed to callers.

use palette::Srgb;
use serde::{Deserialize, Serialize};

use crate::color;
use crate::error::{ExtractError, Result};
use crate::rank::PaletteEntry;

/// Output record for one palette color, in rank order.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaletteRecord {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub weight: f64,
}

impl PaletteRecord {
    pub fn color(&self) -> Srgb<u8> {
        Srgb::new(self.red, self.green, self.blue)
    }

    pub fn render(&self, notation: ColorNotation) -> String {
        notation.render(self.color())
    }
}

/// Text form used when a palette is rendered as strings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorNotation {
    /// `rgb(r,g,b)`
    #[default]
    Css,
    /// `RRGGBB`
    Hex,
}

impl ColorNotation {
    pub fn render(self, c: Srgb<u8>) -> String {
        match self {
            ColorNotation::Css => color::css(c),
            ColorNotation::Hex => color::hex(c),
        }
    }
}

/// Map entries to records, preserving order.
///
/// A weight outside `[0, 1]` (or NaN) means an upstream bug and is reported as
/// [`ExtractError::InternalInvariantViolation`].
pub fn encode(entries: &[PaletteEntry]) -> Result<Vec<PaletteRecord>> {
    entries
        .iter()
        .map(|entry| {
            if !(0.0..=1.0).contains(&entry.weight) {
                return Err(ExtractError::invariant(format!(
                    "palette entry {} has weight {} outside [0, 1]",
                    entry.rank, entry.weight
                )));
            }
            Ok(PaletteRecord {
                red: entry.color.red,
                green: entry.color.green,
                blue: entry.color.blue,
                weight: entry.weight,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(rgb: (u8, u8, u8), weight: f64, rank: usize) -> PaletteEntry {
        PaletteEntry {
            color: Srgb::new(rgb.0, rgb.1, rgb.2),
            weight,
            rank,
            pixels: 1,
        }
    }

    #[test]
    fn keeps_rank_order() {
        let records = encode(&[entry((255, 0, 0), 0.75, 0), entry((0, 0, 255), 0.25, 1)]).unwrap();
        assert_eq!(
            records,
            vec![
                PaletteRecord {
                    red: 255,
                    green: 0,
                    blue: 0,
                    weight: 0.75
                },
                PaletteRecord {
                    red: 0,
                    green: 0,
                    blue: 255,
                    weight: 0.25
                },
            ]
        );
    }

    #[test]
    fn rejects_out_of_range_weight() {
        for weight in [1.5, -0.1, f64::NAN] {
            let err = encode(&[entry((1, 2, 3), weight, 0)]).unwrap_err();
            assert!(matches!(err, ExtractError::InternalInvariantViolation(_)));
        }
    }

    #[test]
    fn serializes_as_flat_object() {
        let records = encode(&[entry((16, 32, 48), 1.0, 0)]).unwrap();
        let json = serde_json::to_string(&records).unwrap();
        assert_eq!(json, r#"[{"red":16,"green":32,"blue":48,"weight":1.0}]"#);
    }

    #[test]
    fn renders_notations() {
        let record = PaletteRecord {
            red: 16,
            green: 32,
            blue: 255,
            weight: 1.0,
        };
        assert_eq!(record.render(ColorNotation::Css), "rgb(16,32,255)");
        assert_eq!(record.render(ColorNotation::Hex), "1020FF");
    }
}
