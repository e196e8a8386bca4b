use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::color::Lab;
use crate::error::{Error, Result};

#[cfg(feature = "cli")]
use clap::ValueEnum;

// --- CIEDE2000 Constants ---
const KL: f64 = 1.0;
const KC: f64 = 1.0;
const KH: f64 = 1.0;
const POW25_7: f64 = 6103515625.0; // 25^7

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(ValueEnum))]
pub enum DeltaEMethod {
    #[strum(serialize = "CIE76")]
    #[serde(rename = "CIE76")]
    #[cfg_attr(feature = "cli", value(name = "cie76"))]
    Cie76,
    #[default]
    #[strum(serialize = "CIE2000")]
    #[serde(rename = "CIE2000")]
    #[cfg_attr(feature = "cli", value(name = "cie2000", alias = "ciede2000"))]
    Ciede2000,
}

impl FromStr for DeltaEMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_uppercase();
        match normalized.as_str() {
            "CIE76" => Ok(DeltaEMethod::Cie76),
            "CIE2000" | "CIEDE2000" => Ok(DeltaEMethod::Ciede2000),
            _ => Err(Error::InvalidDeltaEMethod(s.to_string())),
        }
    }
}

/// Accept/reject outcome of comparing a distance with a tolerance.
///
/// Logs record `PASS`/`FAIL`; reports print the
/// range wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum Verdict {
    #[strum(serialize = "IN RANGE")]
    #[serde(rename = "PASS")]
    InRange,
    #[strum(serialize = "OUT OF RANGE")]
    #[serde(rename = "FAIL")]
    OutOfRange,
}

impl Verdict {
    pub fn is_in_range(self) -> bool {
        self == Verdict::InRange
    }

    pub fn log_label(self) -> &'static str {
        match self {
            Verdict::InRange => "PASS",
            Verdict::OutOfRange => "FAIL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonResult {
    pub distance: f64,
    pub tolerance: f64,
    pub method: DeltaEMethod,
    pub verdict: Verdict,
}

impl ComparisonResult {
    pub fn is_in_range(&self) -> bool {
        self.verdict.is_in_range()
    }
}

/// Perceptual distance between two LAB colors. Never negative.
///
/// CIE76 is symmetric; CIEDE2000 is evaluated in the order given and is not
/// assumed to be symmetric.
pub fn delta_e(lab1: &Lab, lab2: &Lab, method: DeltaEMethod) -> f64 {
    match method {
        DeltaEMethod::Cie76 => calculate_cie76(lab1, lab2),
        DeltaEMethod::Ciede2000 => calculate_ciede2000(lab1, lab2),
    }
}

/// Inclusive on the boundary: a distance equal to the tolerance is in range.
pub fn evaluate(distance: f64, tolerance: f64) -> Verdict {
    if distance <= tolerance {
        Verdict::InRange
    } else {
        Verdict::OutOfRange
    }
}

pub fn compare(
    candidate: &Lab,
    reference: &Lab,
    tolerance: f64,
    method: DeltaEMethod,
) -> ComparisonResult {
    let distance = delta_e(candidate, reference, method);
    let verdict = evaluate(distance, tolerance);
    log::debug!(
        "{method} distance {candidate} -> {reference} = {distance:.4} (tolerance {tolerance}): {verdict}"
    );
    ComparisonResult {
        distance,
        tolerance,
        method,
        verdict,
    }
}

fn calculate_cie76(color1: &Lab, color2: &Lab) -> f64 {
    let dl = color1.l - color2.l;
    let da = color1.a - color2.a;
    let db = color1.b - color2.b;
    (dl * dl + da * da + db * db).sqrt()
}

#[inline]
fn hue_prime(b: f64, a_prime: f64) -> f64 {
    if a_prime == 0.0 && b == 0.0 {
        return 0.0;
    }
    let h = b.atan2(a_prime).to_degrees();
    if h < 0.0 {
        h + 360.0
    } else {
        h
    }
}

fn calculate_ciede2000(color1: &Lab, color2: &Lab) -> f64 {
    let Lab {
        l: l1,
        a: a1,
        b: b1,
    } = *color1;
    let Lab {
        l: l2,
        a: a2,
        b: b2,
    } = *color2;

    let c1 = a1.hypot(b1);
    let c2 = a2.hypot(b2);

    let c_bar = (c1 + c2) * 0.5;
    let c_bar7 = c_bar.powi(7);

    let g = 0.5 * (1.0 - (c_bar7 / (c_bar7 + POW25_7)).sqrt());

    let a1_prime = a1 * (1.0 + g);
    let a2_prime = a2 * (1.0 + g);

    let c1_prime = a1_prime.hypot(b1);
    let c2_prime = a2_prime.hypot(b2);

    let h1_prime = hue_prime(b1, a1_prime);
    let h2_prime = hue_prime(b2, a2_prime);

    let delta_l_prime = l2 - l1;
    let delta_c_prime = c2_prime - c1_prime;

    // Neutral colors have no defined hue, so they contribute no hue difference.
    let neutral = c1_prime * c2_prime == 0.0;

    let delta_h_prime_lower = if neutral {
        0.0
    } else {
        let diff = h2_prime - h1_prime;
        if diff.abs() <= 180.0 {
            diff
        } else if diff > 180.0 {
            diff - 360.0
        } else {
            diff + 360.0
        }
    };

    let delta_h_prime_upper =
        2.0 * (c1_prime * c2_prime).sqrt() * (delta_h_prime_lower.to_radians() * 0.5).sin();

    let l_bar_prime = (l1 + l2) * 0.5;
    let c_bar_prime = (c1_prime + c2_prime) * 0.5;

    let h_bar_prime = if neutral {
        h1_prime + h2_prime
    } else {
        let diff = (h1_prime - h2_prime).abs();
        let sum = h1_prime + h2_prime;
        if diff <= 180.0 {
            sum * 0.5
        } else if sum < 360.0 {
            (sum + 360.0) * 0.5
        } else {
            (sum - 360.0) * 0.5
        }
    };

    let t = 1.0 - 0.17 * (h_bar_prime - 30.0).to_radians().cos()
        + 0.24 * (2.0 * h_bar_prime).to_radians().cos()
        + 0.32 * (3.0 * h_bar_prime + 6.0).to_radians().cos()
        - 0.20 * (4.0 * h_bar_prime - 63.0).to_radians().cos();

    let delta_theta = 30.0 * (-((h_bar_prime - 275.0) / 25.0).powi(2)).exp();
    let c_bar_prime7 = c_bar_prime.powi(7);

    let rc = 2.0 * (c_bar_prime7 / (c_bar_prime7 + POW25_7)).sqrt();
    let rt = -rc * (2.0 * delta_theta).to_radians().sin();

    let l_bar_prime_minus_50_sq = (l_bar_prime - 50.0).powi(2);
    let sl = 1.0 + (0.015 * l_bar_prime_minus_50_sq) / (20.0 + l_bar_prime_minus_50_sq).sqrt();
    let sc = 1.0 + 0.045 * c_bar_prime;
    let sh = 1.0 + 0.015 * c_bar_prime * t;

    let term1 = delta_l_prime / (KL * sl);
    let term2 = delta_c_prime / (KC * sc);
    let term3 = delta_h_prime_upper / (KH * sh);

    (term1.powi(2) + term2.powi(2) + term3.powi(2) + rt * term2 * term3)
        .max(0.0)
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Sharma, Wu & Dalal (2005) CIEDE2000 test data, all 34 pairs.
    const SHARMA: &[([f64; 3], [f64; 3], f64)] = &[
        ([50.0, 2.6772, -79.7751], [50.0, 0.0, -82.7485], 2.0425),
        ([50.0, 3.1571, -77.2803], [50.0, 0.0, -82.7485], 2.8615),
        ([50.0, 2.8361, -74.0200], [50.0, 0.0, -82.7485], 3.4412),
        ([50.0, -1.3802, -84.2814], [50.0, 0.0, -82.7485], 1.0000),
        ([50.0, -1.1848, -84.8006], [50.0, 0.0, -82.7485], 1.0000),
        ([50.0, -0.9009, -85.5211], [50.0, 0.0, -82.7485], 1.0000),
        ([50.0, 0.0, 0.0], [50.0, -1.0, 2.0], 2.3669),
        ([50.0, -1.0, 2.0], [50.0, 0.0, 0.0], 2.3669),
        ([50.0, 2.4900, -0.0010], [50.0, -2.4900, 0.0009], 7.1792),
        ([50.0, 2.4900, -0.0010], [50.0, -2.4900, 0.0010], 7.1792),
        ([50.0, 2.4900, -0.0010], [50.0, -2.4900, 0.0011], 7.2195),
        ([50.0, 2.4900, -0.0010], [50.0, -2.4900, 0.0012], 7.2195),
        ([50.0, -0.0010, 2.4900], [50.0, 0.0009, -2.4900], 4.8045),
        ([50.0, -0.0010, 2.4900], [50.0, 0.0010, -2.4900], 4.8045),
        ([50.0, -0.0010, 2.4900], [50.0, 0.0011, -2.4900], 4.7461),
        ([50.0, 2.5, 0.0], [50.0, 0.0, -2.5], 4.3065),
        ([50.0, 2.5, 0.0], [73.0, 25.0, -18.0], 27.1492),
        ([50.0, 2.5, 0.0], [61.0, -5.0, 29.0], 22.8977),
        ([50.0, 2.5, 0.0], [56.0, -27.0, -3.0], 31.9030),
        ([50.0, 2.5, 0.0], [58.0, 24.0, 15.0], 19.4535),
        ([50.0, 2.5, 0.0], [50.0, 3.1736, 0.5854], 1.0000),
        ([50.0, 2.5, 0.0], [50.0, 3.2972, 0.0], 1.0000),
        ([50.0, 2.5, 0.0], [50.0, 1.8634, 0.5757], 1.0000),
        ([50.0, 2.5, 0.0], [50.0, 3.2592, 0.3350], 1.0000),
        ([60.2574, -34.0099, 36.2677], [60.4626, -34.1751, 39.4387], 1.2644),
        ([63.0109, -31.0961, -5.8663], [62.8187, -29.7946, -4.0864], 1.2630),
        ([61.2901, 3.7196, -5.3901], [61.4292, 2.2480, -4.9620], 1.8731),
        ([35.0831, -44.1164, 3.7933], [35.0232, -40.0716, 1.5901], 1.8645),
        ([22.7233, 20.0904, -46.6940], [23.0331, 14.9730, -42.5619], 2.0373),
        ([36.4612, 47.8580, 18.3852], [36.2715, 50.5065, 21.2231], 1.4146),
        ([90.8027, -2.0831, 1.4410], [91.1528, -1.6435, 0.0447], 1.4441),
        ([90.9257, -0.5406, -0.9208], [88.6381, -0.8985, -0.7239], 1.5381),
        ([6.7747, -0.2908, -2.4247], [5.8714, -0.0985, -2.2286], 0.6377),
        ([2.0776, 0.0795, -1.1350], [0.9033, -0.0636, -0.5514], 0.9082),
    ];

    #[test]
    fn ciede2000_matches_published_pairs() {
        assert_eq!(SHARMA.len(), 34);
        for (lab1, lab2, expected) in SHARMA {
            let (lab1, lab2) = (Lab::from(*lab1), Lab::from(*lab2));
            for (x, y) in [(lab1, lab2), (lab2, lab1)] {
                let got = delta_e(&x, &y, DeltaEMethod::Ciede2000);
                assert!(
                    (got - expected).abs() < 1e-4,
                    "{x:?} vs {y:?}: expected {expected}, got {got}"
                );
            }
        }
    }

    #[test]
    fn identical_colors_have_zero_distance() {
        let samples = [
            Lab::new(55.2, 9.3, 18.7),
            Lab::new(0.0, 0.0, 0.0),
            Lab::new(100.0, 0.0, 0.0),
            Lab::new(32.3, 79.19, -107.86),
        ];
        for lab in samples {
            assert_eq!(delta_e(&lab, &lab, DeltaEMethod::Cie76), 0.0);
            assert_eq!(delta_e(&lab, &lab, DeltaEMethod::Ciede2000), 0.0);
        }
    }

    #[test]
    fn cie76_is_euclidean() {
        let d = delta_e(
            &Lab::new(50.0, 0.0, 0.0),
            &Lab::new(53.0, 4.0, 0.0),
            DeltaEMethod::Cie76,
        );
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn cie76_grows_with_lightness_separation() {
        let base = Lab::new(40.0, 12.0, -7.0);
        let mut previous = 0.0;
        for step in 1..20 {
            let other = Lab::new(base.l + step as f64 * 2.5, base.a, base.b);
            let d = delta_e(&base, &other, DeltaEMethod::Cie76);
            assert!(d > previous);
            previous = d;
        }
    }

    #[test]
    fn small_shift_from_master_is_in_range() {
        let master = Lab::new(50.0, 10.0, 20.0);
        let measured = Lab::new(51.0, 10.0, 21.0);
        let result = compare(&measured, &master, 2.0, DeltaEMethod::Ciede2000);
        assert!(result.distance < 2.0);
        assert_eq!(result.verdict, Verdict::InRange);
    }

    #[test]
    fn tolerance_boundary_is_inclusive() {
        assert_eq!(evaluate(2.0, 2.0), Verdict::InRange);
        assert_eq!(evaluate(0.0, 0.0), Verdict::InRange);
        assert_eq!(evaluate(2.0000001, 2.0), Verdict::OutOfRange);
    }

    #[test]
    fn method_names_parse_and_unknown_fails() {
        assert_eq!("CIE76".parse::<DeltaEMethod>().unwrap(), DeltaEMethod::Cie76);
        assert_eq!(
            "cie2000".parse::<DeltaEMethod>().unwrap(),
            DeltaEMethod::Ciede2000
        );
        assert_eq!(
            "CIE-DE-2000".parse::<DeltaEMethod>().unwrap(),
            DeltaEMethod::Ciede2000
        );
        assert!(matches!(
            "CIE94".parse::<DeltaEMethod>(),
            Err(Error::InvalidDeltaEMethod(name)) if name == "CIE94"
        ));
    }

    #[test]
    fn verdict_wording() {
        assert_eq!(Verdict::InRange.to_string(), "IN RANGE");
        assert_eq!(Verdict::OutOfRange.to_string(), "OUT OF RANGE");
        assert_eq!(Verdict::OutOfRange.log_label(), "FAIL");
        assert_eq!(DeltaEMethod::Ciede2000.to_string(), "CIE2000");
    }
}
