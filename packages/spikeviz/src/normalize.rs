//! Midpoint normalization for diverging colormaps
//!
//! Maps `[min, midpoint]` onto `[0, 0.5]` and `[midpoint, max]` onto `[0.5, 1]`,
//! so the midpoint value always lands on the centre colour of the map. Values
//! outside `[min, max]` saturate at 0 or 1.

use ndarray::{Array, ArrayView, Dimension};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VizError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MidpointScaler {
    vmin: f64,
    midpoint: f64,
    vmax: f64,
}

impl MidpointScaler {
    /// Create a scaler for `vmin <= vmax`.
    ///
    /// A midpoint outside `[vmin, vmax]` is pinned to the nearer bound, so data
    /// that does not straddle it still renders (one half of the map goes unused).
    pub fn new(vmin: f64, midpoint: f64, vmax: f64) -> Result<Self> {
        if !vmin.is_finite() || !vmax.is_finite() || vmin > vmax {
            return Err(VizError::InvalidRange {
                min: vmin,
                max: vmax,
            });
        }

        let pinned = if midpoint.is_nan() {
            0.5 * (vmin + vmax)
        } else {
            midpoint.clamp(vmin, vmax)
        };
        if pinned != midpoint {
            log::debug!(
                "Midpoint {} outside [{}, {}], pinned to {}",
                midpoint,
                vmin,
                vmax,
                pinned
            );
        }

        Ok(Self {
            vmin,
            midpoint: pinned,
            vmax,
        })
    }

    pub fn vmin(&self) -> f64 {
        self.vmin
    }

    pub fn vmax(&self) -> f64 {
        self.vmax
    }

    pub fn midpoint(&self) -> f64 {
        self.midpoint
    }

    /// Normalize one value into `[0, 1]`. NaN is a masked value and stays NaN.
    /// A zero-width segment maps everything on its side to 0.5.
    pub fn scale(&self, value: f64) -> f64 {
        if value.is_nan() {
            return f64::NAN;
        }

        let scaled = if value < self.midpoint {
            let span = self.midpoint - self.vmin;
            if span > 0.0 {
                0.5 * (value - self.vmin) / span
            } else {
                0.5
            }
        } else if value > self.midpoint {
            let span = self.vmax - self.midpoint;
            if span > 0.0 {
                0.5 + 0.5 * (value - self.midpoint) / span
            } else {
                0.5
            }
        } else {
            0.5
        };

        scaled.clamp(0.0, 1.0)
    }

    pub fn scale_slice(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.scale(v)).collect()
    }

    pub fn scale_array<D: Dimension>(&self, values: ArrayView<'_, f64, D>) -> Array<f64, D> {
        values.mapv(|v| self.scale(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_symmetric_range() {
        let scaler = MidpointScaler::new(-1.0, 0.0, 1.0).unwrap();
        assert_eq!(scaler.scale(0.0), 0.5);
        assert_eq!(scaler.scale(-1.0), 0.0);
        assert_eq!(scaler.scale(1.0), 1.0);
        assert_eq!(scaler.scale(-0.5), 0.25);
        assert_eq!(scaler.scale(0.5), 0.75);
    }

    #[test]
    fn test_asymmetric_segments() {
        let scaler = MidpointScaler::new(-4.0, 0.0, 1.0).unwrap();
        assert_eq!(scaler.scale(-2.0), 0.25);
        assert_eq!(scaler.scale(0.5), 0.75);
    }

    #[test]
    fn test_monotonic_on_range() {
        for &(lo, mid, hi) in &[(-1.0, 0.0, 1.0), (-3.0, -2.5, 10.0), (0.0, 0.0, 2.0), (2.0, 2.0, 2.0)] {
            let scaler = MidpointScaler::new(lo, mid, hi).unwrap();
            let mut previous = f64::NEG_INFINITY;
            for i in 0..=200 {
                let value = lo + (hi - lo) * i as f64 / 200.0;
                let scaled = scaler.scale(value);
                assert!(scaled >= previous, "not monotonic at {} for {:?}", value, (lo, mid, hi));
                previous = scaled;
            }
        }
    }

    #[test]
    fn test_out_of_range_saturates() {
        let scaler = MidpointScaler::new(-1.0, 0.0, 1.0).unwrap();
        assert_eq!(scaler.scale(-2.0), 0.0);
        assert_eq!(scaler.scale(3.0), 1.0);
        assert_eq!(scaler.scale(f64::NEG_INFINITY), 0.0);
        assert_eq!(scaler.scale_slice(&[-5.0, 0.5, 5.0]), vec![0.0, 0.75, 1.0]);

        let skewed = MidpointScaler::new(-4.0, 0.0, 1.0).unwrap();
        assert_eq!(skewed.scale(2.0), 1.0);
        assert_eq!(skewed.scale(-8.0), 0.0);
    }

    #[test]
    fn test_invalid_range() {
        let err = MidpointScaler::new(2.0, 0.0, 1.0).unwrap_err();
        assert!(matches!(err, VizError::InvalidRange { .. }));
        assert!(MidpointScaler::new(f64::NAN, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_midpoint_pinned_into_range() {
        // Positive-only data with the midpoint at zero
        let scaler = MidpointScaler::new(1.0, 0.0, 5.0).unwrap();
        assert_eq!(scaler.midpoint(), 1.0);
        assert_eq!(scaler.scale(1.0), 0.5);
        assert_eq!(scaler.scale(5.0), 1.0);
        assert_eq!(scaler.scale(3.0), 0.75);
    }

    #[test]
    fn test_degenerate_segments() {
        let flat = MidpointScaler::new(2.0, 2.0, 2.0).unwrap();
        assert_eq!(flat.scale(2.0), 0.5);
        assert_eq!(flat.scale(7.0), 0.5);
        assert_eq!(flat.scale(-7.0), 0.5);

        let half = MidpointScaler::new(0.0, 0.0, 2.0).unwrap();
        assert_eq!(half.scale(-1.0), 0.5);
        assert_eq!(half.scale(1.0), 0.75);
    }

    #[test]
    fn test_masked_values() {
        let scaler = MidpointScaler::new(-1.0, 0.0, 1.0).unwrap();
        assert!(scaler.scale(f64::NAN).is_nan());

        let scaled = scaler.scale_array(array![[-1.0, f64::NAN], [0.0, 1.0]].view());
        assert_eq!(scaled[[0, 0]], 0.0);
        assert!(scaled[[0, 1]].is_nan());
        assert_eq!(scaled[[1, 1]], 1.0);
    }
}
