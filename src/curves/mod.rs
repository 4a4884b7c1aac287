//! Bonding curves (§4.1, component C2). A single pure contract,
//! `curve(u, min, max) -> f64`, dispatched over a closed enum — no open-class
//! polymorphism is required (§9 "Polymorphism").

use serde::{Deserialize, Serialize};
use std::f64::consts::E;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurveKind {
    Flat,
    Linear,
    Logarithmic,
    Sigmoidal,
    Quadratic,
    Exponential,
}

/// Clamps `u` into `[0,1]`, mapping NaN to 0 (§4.1 failure model), then
/// evaluates the named curve between `min` and `max`.
pub fn curve(kind: CurveKind, u: f64, min: f64, max: f64) -> f64 {
    let u = clamp_unit(u);
    match kind {
        CurveKind::Flat => min,
        CurveKind::Linear => min + (max - min) * u,
        CurveKind::Logarithmic => min + (max - min) * (1.0 + u).ln() / 2f64.ln(),
        CurveKind::Sigmoidal => min + (max - min) / (1.0 + (-10.0 * (u - 0.5)).exp()),
        CurveKind::Quadratic => min + (max - min) * u * u,
        CurveKind::Exponential => min + (max - min) * ((2.0 * u).exp() - 1.0) / (E * E - 1.0),
    }
}

fn clamp_unit(u: f64) -> f64 {
    if u.is_nan() {
        0.0
    } else {
        u.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn flat_is_constant() {
        assert_eq!(curve(CurveKind::Flat, 0.0, 3.0, 9.0), 3.0);
        assert_eq!(curve(CurveKind::Flat, 1.0, 3.0, 9.0), 3.0);
    }

    #[test]
    fn nan_clamps_to_zero() {
        let at_zero = curve(CurveKind::Linear, 0.0, 1.0, 5.0);
        let at_nan = curve(CurveKind::Linear, f64::NAN, 1.0, 5.0);
        assert_eq!(at_zero, at_nan);
    }

    #[test]
    fn out_of_range_clamps() {
        assert_eq!(curve(CurveKind::Linear, -1.0, 1.0, 5.0), curve(CurveKind::Linear, 0.0, 1.0, 5.0));
        assert_eq!(curve(CurveKind::Linear, 2.0, 1.0, 5.0), curve(CurveKind::Linear, 1.0, 1.0, 5.0));
    }

    const ALL_KINDS: [CurveKind; 6] = [
        CurveKind::Flat,
        CurveKind::Linear,
        CurveKind::Logarithmic,
        CurveKind::Sigmoidal,
        CurveKind::Quadratic,
        CurveKind::Exponential,
    ];

    proptest! {
        #[test]
        fn all_curves_stay_in_bounds(u in 0.0f64..=1.0, min in 0.0f64..20.0, spread in 0.0f64..30.0) {
            let max = min + spread;
            for kind in ALL_KINDS {
                let v = curve(kind, u, min, max);
                prop_assert!(v >= min - 1e-9 && v <= max + 1e-9, "{:?} at u={} gave {} outside [{},{}]", kind, u, v, min, max);
            }
        }

        #[test]
        fn non_flat_curves_are_monotone_nondecreasing(min in 0.0f64..20.0, spread in 0.0f64..30.0, a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
            let max = min + spread;
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            for kind in ALL_KINDS {
                if matches!(kind, CurveKind::Flat) {
                    continue;
                }
                prop_assert!(curve(kind, lo, min, max) <= curve(kind, hi, min, max) + 1e-9);
            }
        }
    }
}
