//! Configuration for percentile threshold estimation.

use serde::{Deserialize, Serialize};

use crate::error::PercentileError;

/// Sample quantile estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Linear interpolation between order statistics at rank `p(n-1)`
    /// (Hyndman & Fan type 7).
    Linear,
    /// Median-unbiased estimator at rank `(n + 1/3)p + 1/3`
    /// (Hyndman & Fan type 8).
    #[default]
    HyndmanFan,
}

/// Configuration for percentile thresholds.
///
/// # Example
///
/// ```
/// use boreas_percentile::{Interpolation, PercentileConfig};
///
/// let config = PercentileConfig::new(90.0)
///     .with_window(5)
///     .with_interpolation(Interpolation::Linear);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileConfig {
    percentile: f64,
    window: usize,
    interpolation: Interpolation,
    leap_years_only: bool,
    wet_day_floor: Option<f64>,
}

impl PercentileConfig {
    /// Creates a configuration for `percentile` with defaults.
    ///
    /// Defaults: `window = 5`, `interpolation = HyndmanFan`,
    /// `leap_years_only = false`, no wet-day floor.
    pub fn new(percentile: f64) -> Self {
        Self {
            percentile,
            window: 5,
            interpolation: Interpolation::HyndmanFan,
            leap_years_only: false,
            wet_day_floor: None,
        }
    }

    /// Sets the percentile in (0, 100).
    pub fn with_percentile(mut self, p: f64) -> Self {
        self.percentile = p;
        self
    }

    /// Sets the odd day-of-year window width.
    pub fn with_window(mut self, w: usize) -> Self {
        self.window = w;
        self
    }

    /// Sets the interpolation method.
    pub fn with_interpolation(mut self, m: Interpolation) -> Self {
        self.interpolation = m;
        self
    }

    /// Restricts the February 29 threshold to leap years of the base.
    pub fn with_leap_years_only(mut self, b: bool) -> Self {
        self.leap_years_only = b;
        self
    }

    /// Excludes values below `floor` from every pool.
    pub fn with_wet_day_floor(mut self, floor: Option<f64>) -> Self {
        self.wet_day_floor = floor;
        self
    }

    /// Returns the percentile.
    pub fn percentile(&self) -> f64 {
        self.percentile
    }

    /// Returns the window width.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Returns half the window width, rounded down.
    pub fn half_window(&self) -> i64 {
        (self.window / 2) as i64
    }

    /// Returns the interpolation method.
    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Returns whether February 29 pools use leap years only.
    pub fn leap_years_only(&self) -> bool {
        self.leap_years_only
    }

    /// Returns the wet-day floor, if any.
    pub fn wet_day_floor(&self) -> Option<f64> {
        self.wet_day_floor
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PercentileError::InvalidConfig`] if the percentile is not
    /// in (0, 100), the window is even or outside 1..=365, or the wet-day
    /// floor is not finite.
    pub fn validate(&self) -> Result<(), PercentileError> {
        if !(self.percentile > 0.0 && self.percentile < 100.0) {
            return Err(PercentileError::InvalidConfig {
                reason: format!("percentile must be in (0, 100), got {}", self.percentile),
            });
        }
        if self.window == 0 || self.window > 365 || self.window % 2 == 0 {
            return Err(PercentileError::InvalidConfig {
                reason: format!("window must be odd and in 1..=365, got {}", self.window),
            });
        }
        if let Some(floor) = self.wet_day_floor
            && !floor.is_finite()
        {
            return Err(PercentileError::InvalidConfig {
                reason: format!("wet-day floor must be finite, got {floor}"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = PercentileConfig::new(10.0);
        assert_eq!(c.window(), 5);
        assert_eq!(c.half_window(), 2);
        assert_eq!(c.interpolation(), Interpolation::HyndmanFan);
        assert!(!c.leap_years_only());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn rejects_bounds_of_percentile() {
        assert!(PercentileConfig::new(0.0).validate().is_err());
        assert!(PercentileConfig::new(100.0).validate().is_err());
        assert!(PercentileConfig::new(f64::NAN).validate().is_err());
    }

    #[test]
    fn rejects_even_or_oversized_window() {
        assert!(PercentileConfig::new(50.0).with_window(4).validate().is_err());
        assert!(PercentileConfig::new(50.0).with_window(367).validate().is_err());
        assert!(PercentileConfig::new(50.0).with_window(0).validate().is_err());
        assert!(PercentileConfig::new(50.0).with_window(365).validate().is_ok());
    }

    #[test]
    fn rejects_non_finite_floor() {
        let c = PercentileConfig::new(50.0).with_wet_day_floor(Some(f64::INFINITY));
        assert!(c.validate().is_err());
    }
}
