use std::fmt;

use image::Rgb;

use crate::error::{Error, Result};

/// CIELAB coordinates under the D65 white point.
///
/// `l` is lightness in [0, 100]; `a` (green-red) and `b` (blue-yellow) are
/// unbounded but practically stay within [-128, 127].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

pub trait ConvertToLab {
    fn to_lab(&self) -> Lab;
}

// --- Constants for XYZ/Lab Conversion ---
const WHITE_X: f64 = 0.95047;
const WHITE_Y: f64 = 1.00000;
const WHITE_Z: f64 = 1.08883;
const EPSILON: f64 = 216.0 / 24389.0;
const KAPPA: f64 = 24389.0 / 27.0;

impl Lab {
    #[inline]
    pub const fn new(l: f64, a: f64, b: f64) -> Self {
        Self { l, a, b }
    }

    #[inline]
    pub const fn from_array(arr: [f64; 3]) -> Self {
        Self {
            l: arr[0],
            a: arr[1],
            b: arr[2],
        }
    }

    #[inline]
    pub const fn to_array(&self) -> [f64; 3] {
        [self.l, self.a, self.b]
    }

    #[inline]
    pub fn chroma(&self) -> f64 {
        self.a.hypot(self.b)
    }

    /// Hue angle in degrees, in [0, 360)
    #[inline]
    pub fn hue_degrees(&self) -> f64 {
        let h = self.b.atan2(self.a).to_degrees();
        if h < 0.0 {
            h + 360.0
        } else {
            h
        }
    }

    /// Rounds every component to two decimals, the precision used in logs and reports.
    pub fn rounded(&self) -> Self {
        Self {
            l: round2(self.l),
            a: round2(self.a),
            b: round2(self.b),
        }
    }

    /// Inverse transform: LAB -> XYZ -> linear sRGB -> companded sRGB.
    ///
    /// Out-of-gamut colors are clamped per channel rather than rejected.
    pub fn to_rgb(self) -> Rgb<u8> {
        let fy = (self.l + 16.0) / 116.0;
        let fx = self.a / 500.0 + fy;
        let fz = fy - self.b / 200.0;

        let fx3 = fx * fx * fx;
        let fz3 = fz * fz * fz;

        let xr = if fx3 > EPSILON {
            fx3
        } else {
            (116.0 * fx - 16.0) / KAPPA
        };
        let yr = if self.l > KAPPA * EPSILON {
            fy * fy * fy
        } else {
            self.l / KAPPA
        };
        let zr = if fz3 > EPSILON {
            fz3
        } else {
            (116.0 * fz - 16.0) / KAPPA
        };

        let x = xr * WHITE_X;
        let y = yr * WHITE_Y;
        let z = zr * WHITE_Z;

        let r = x * 3.2404542 - y * 1.5371385 - z * 0.4985314;
        let g = x * -0.9692660 + y * 1.8760108 + z * 0.0415560;
        let b = x * 0.0556434 - y * 0.2040259 + z * 1.0572252;

        Rgb([to_channel(r), to_channel(g), to_channel(b)])
    }
}

impl fmt::Display for Lab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.l, self.a, self.b)
    }
}

impl From<[f64; 3]> for Lab {
    fn from(arr: [f64; 3]) -> Self {
        Self::from_array(arr)
    }
}

#[inline]
pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[inline]
fn expand_gamma(c: f64) -> f64 {
    if c > 0.04045 {
        ((c + 0.055) / 1.055).powf(2.4)
    } else {
        c / 12.92
    }
}

#[inline]
fn compress_gamma(c: f64) -> f64 {
    if c > 0.0031308 {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    } else {
        12.92 * c
    }
}

#[inline]
fn to_channel(linear: f64) -> u8 {
    (compress_gamma(linear).clamp(0.0, 1.0) * 255.0).round() as u8
}

#[inline]
fn pivot_xyz(n: f64) -> f64 {
    if n > EPSILON {
        n.cbrt()
    } else {
        (KAPPA * n + 16.0) / 116.0
    }
}

impl ConvertToLab for Rgb<u8> {
    fn to_lab(&self) -> Lab {
        let [r_u8, g_u8, b_u8] = self.0;

        let r_lin = expand_gamma(r_u8 as f64 / 255.0);
        let g_lin = expand_gamma(g_u8 as f64 / 255.0);
        let b_lin = expand_gamma(b_u8 as f64 / 255.0);

        // Linear RGB to XYZ (D65 illuminant)
        let x = r_lin * 0.4124564 + g_lin * 0.3575761 + b_lin * 0.1804375;
        let y = r_lin * 0.2126729 + g_lin * 0.7151522 + b_lin * 0.0721750;
        let z = r_lin * 0.0193339 + g_lin * 0.1191920 + b_lin * 0.9503041;

        let fx = pivot_xyz(x / WHITE_X);
        let fy = pivot_xyz(y / WHITE_Y);
        let fz = pivot_xyz(z / WHITE_Z);

        Lab {
            l: (116.0 * fy - 16.0).max(0.0),
            a: 500.0 * (fx - fy),
            b: 200.0 * (fy - fz),
        }
    }
}

/// Converts 8-bit sRGB channels to CIELAB (D65).
pub fn rgb_to_lab(r: u8, g: u8, b: u8) -> Lab {
    Rgb([r, g, b]).to_lab()
}

/// Converts CIELAB (D65) to 8-bit sRGB, clamping out-of-gamut channels.
pub fn lab_to_rgb(l: f64, a: f64, b: f64) -> Rgb<u8> {
    Lab::new(l, a, b).to_rgb()
}

/// Builds an RGB triple from wide integers, rejecting any channel outside [0, 255].
pub fn rgb_from_channels(r: i64, g: i64, b: i64) -> Result<Rgb<u8>> {
    let check = |channel: &'static str, value: i64| {
        u8::try_from(value).map_err(|_| Error::InvalidRgbChannel { channel, value })
    };
    Ok(Rgb([check("red", r)?, check("green", g)?, check("blue", b)?]))
}

pub fn format_rgb(rgb: &Rgb<u8>) -> String {
    let [r, g, b] = rgb.0;
    format!("[{r}, {g}, {b}]")
}
