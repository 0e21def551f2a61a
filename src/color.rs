use palette::{IntoColor, Lab, Srgb};
use serde::{Deserialize, Serialize};

/// Distance function used when comparing palette colors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistanceMetric {
    /// Straight-line distance in the RGB cube (0 ..= ~441.7).
    #[default]
    Euclidean,
    /// CIE76 delta-E in CIELAB (D65). Roughly 2.3 is a just-noticeable difference.
    Perceptual,
}

impl DistanceMetric {
    pub fn distance(self, a: Srgb<u8>, b: Srgb<u8>) -> f64 {
        match self {
            DistanceMetric::Euclidean => euclidean_rgb(a, b),
            DistanceMetric::Perceptual => delta_e76(to_lab(a), to_lab(b)),
        }
    }
}

#[inline(always)]
fn euclidean_rgb(a: Srgb<u8>, b: Srgb<u8>) -> f64 {
    let dr = a.red as i32 - b.red as i32;
    let dg = a.green as i32 - b.green as i32;
    let db = a.blue as i32 - b.blue as i32;
    ((dr * dr + dg * dg + db * db) as f64).sqrt()
}

#[inline(always)]
fn delta_e76(a: Lab, b: Lab) -> f64 {
    let dl = (a.l - b.l) as f64;
    let da = (a.a - b.a) as f64;
    let db = (a.b - b.b) as f64;
    (dl * dl + da * da + db * db).sqrt()
}

/// sRGB (8 bit) to CIELAB, D65 white point.
pub fn to_lab(color: Srgb<u8>) -> Lab {
    color.into_linear::<f32>().into_color()
}

/// Pack a color into `0x00RRGGBB`. Used as a sortable, hashable key.
#[inline(always)]
pub(crate) fn pack(color: Srgb<u8>) -> u32 {
    ((color.red as u32) << 16) | ((color.green as u32) << 8) | color.blue as u32
}

/// `rgb(r,g,b)` notation, as consumed by CSS and the JS host.
pub fn css(color: Srgb<u8>) -> String {
    format!("rgb({},{},{})", color.red, color.green, color.blue)
}

/// Upper-case `RRGGBB` without a leading `#`.
pub fn hex(color: Srgb<u8>) -> String {
    format!("{:02X}{:02X}{:02X}", color.red, color.green, color.blue)
}
