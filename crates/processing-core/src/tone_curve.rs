//! Gamma tone curve for difference frames.
//!
//! The curve is evaluated once into a 256-entry table; applying it to a
//! frame is a plain table lookup per sample.

use motionx_frame_model::Frame;

use crate::error::{ProcessingError, ProcessingResult};

pub use motionx_common::config::DEFAULT_GAMMA;

/// A precomputed brightness remapping.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneCurve {
    gamma: f64,
    table: [u8; 256],
}

impl ToneCurve {
    /// Build the lookup table for `gamma`.
    ///
    /// Each level `i` maps to `round(clamp((i / 255)^gamma * 255, 0, 255))`.
    pub fn new(gamma: f64) -> ProcessingResult<Self> {
        if !gamma.is_finite() || gamma <= 0.0 {
            return Err(ProcessingError::InvalidGamma { gamma });
        }

        let mut table = [0u8; 256];
        for (level, entry) in table.iter_mut().enumerate() {
            let value = (level as f64 / 255.0).powf(gamma) * 255.0;
            *entry = value.clamp(0.0, 255.0).round() as u8;
        }

        tracing::debug!(gamma, "Built tone curve");
        Ok(Self { gamma, table })
    }

    /// The curve used when no gamma is configured.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_GAMMA).unwrap_or_else(|_| Self::identity())
    }

    /// A curve that leaves every level unchanged.
    pub fn identity() -> Self {
        let mut table = [0u8; 256];
        for (level, entry) in table.iter_mut().enumerate() {
            *entry = level as u8;
        }
        Self { gamma: 1.0, table }
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn table(&self) -> &[u8; 256] {
        &self.table
    }

    /// Remap a single level.
    pub fn map(&self, level: u8) -> u8 {
        self.table[level as usize]
    }

    /// Remap every channel of every pixel of an owned frame.
    pub fn apply(&self, frame: Frame) -> Frame {
        frame.map_samples(|sample| self.table[sample as usize])
    }
}

impl Default for ToneCurve {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motionx_frame_model::PixelFormat;
    use proptest::prelude::*;

    #[test]
    fn test_unit_gamma_is_identity() {
        let curve = ToneCurve::new(1.0).unwrap();
        assert_eq!(curve.table(), ToneCurve::identity().table());
    }

    #[test]
    fn test_default_gamma_brightens_midtones() {
        let curve = ToneCurve::with_defaults();
        // (128/255)^(1/1.1) * 255 = 136.28
        assert_eq!(curve.map(128), 136);
        assert!(curve.table().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_rejects_non_positive_gamma() {
        assert!(matches!(
            ToneCurve::new(0.0),
            Err(ProcessingError::InvalidGamma { .. })
        ));
        assert!(ToneCurve::new(-2.0).is_err());
        assert!(ToneCurve::new(f64::NAN).is_err());
        assert!(ToneCurve::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_apply_maps_each_channel() {
        let curve = ToneCurve::new(2.0).unwrap();
        let frame = Frame::new(1, 1, PixelFormat::Bgr24, vec![0, 128, 255]).unwrap();
        let toned = curve.apply(frame);
        // (128/255)^2 * 255 = 64.25
        assert_eq!(toned.data(), &[0, 64, 255]);
    }

    proptest! {
        #[test]
        fn endpoints_are_fixed_for_any_positive_gamma(gamma in 0.01f64..20.0) {
            let curve = ToneCurve::new(gamma).unwrap();
            prop_assert_eq!(curve.map(0), 0);
            prop_assert_eq!(curve.map(255), 255);
        }

        #[test]
        fn curve_is_monotonic(gamma in 0.05f64..10.0) {
            let curve = ToneCurve::new(gamma).unwrap();
            prop_assert!(curve.table().windows(2).all(|w| w[0] <= w[1]));
        }
    }
}
