//! Power-law price model
//!
//! `price = A * days_since_reference^alpha`, where `A` is recalibrated from the
//! latest observed market price and held constant in between.

use chrono::NaiveDate;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::GrowthModel;

/// Exponent of the empirical fit
pub const DEFAULT_POWER_LAW_EXPONENT: f64 = 5.8;

/// Calibration constant used before any market price has been observed.
/// Puts the model near 100,000 on the default as-of date.
pub const DEFAULT_POWER_LAW_COEFFICIENT: f64 = 1.42e-17;

/// Days per year when converting projection years to calendar days
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Fixed historical anchor of the fit (the asset's first day of existence)
pub fn default_reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2009, 1, 3).expect("valid calendar date")
}

/// Projection start used until a calibration supplies a newer date
pub fn default_as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid calendar date")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerLawModel {
    /// Calibration constant `A`
    pub coefficient: f64,

    /// Exponent `alpha`
    #[serde(default = "default_exponent")]
    pub exponent: f64,

    /// Date the day count starts from
    #[serde(default = "default_reference_date")]
    pub reference_date: NaiveDate,

    /// Date corresponding to year 0 of the projection
    #[serde(default = "default_as_of")]
    pub as_of: NaiveDate,

    /// Whether `coefficient` came from an observed price
    #[serde(default)]
    pub calibrated: bool,
}

fn default_exponent() -> f64 {
    DEFAULT_POWER_LAW_EXPONENT
}

impl Default for PowerLawModel {
    fn default() -> Self {
        Self::with_coefficient(DEFAULT_POWER_LAW_COEFFICIENT, default_as_of())
    }
}

impl PowerLawModel {
    /// Uncalibrated model with a caller-supplied default coefficient
    pub fn with_coefficient(coefficient: f64, as_of: NaiveDate) -> Self {
        Self {
            coefficient,
            exponent: DEFAULT_POWER_LAW_EXPONENT,
            reference_date: default_reference_date(),
            as_of,
            calibrated: false,
        }
    }

    /// Model calibrated to `observed_price` on `on`
    pub fn calibrated_to(observed_price: f64, on: NaiveDate) -> Self {
        let mut model = Self::with_coefficient(DEFAULT_POWER_LAW_COEFFICIENT, on);
        model.calibrate(observed_price, on);
        model
    }

    pub fn days_since_reference(&self, date: NaiveDate) -> f64 {
        (date - self.reference_date).num_days() as f64
    }

    /// Recalibrate `A` from a fresh market observation.
    ///
    /// Returns false and keeps the previous coefficient when the observation
    /// cannot be used.
    pub fn calibrate(&mut self, observed_price: f64, on: NaiveDate) -> bool {
        let days = self.days_since_reference(on);
        if !observed_price.is_finite() || observed_price <= 0.0 {
            warn!("Ignoring power-law calibration with invalid price {}", observed_price);
            return false;
        }
        if days <= 0.0 {
            warn!("Ignoring power-law calibration dated {} before reference {}", on, self.reference_date);
            return false;
        }

        let coefficient = observed_price / days.powf(self.exponent);
        if !coefficient.is_finite() || coefficient <= 0.0 {
            warn!("Power-law calibration produced unusable coefficient {}", coefficient);
            return false;
        }

        debug!("Power-law calibrated: A={:e} at {} (price {})", coefficient, on, observed_price);
        self.coefficient = coefficient;
        self.as_of = on;
        self.calibrated = true;
        true
    }

    /// Price on a calendar date
    pub fn price_on(&self, date: NaiveDate) -> f64 {
        self.price_at_days(self.days_since_reference(date))
    }

    fn price_at_days(&self, days: f64) -> f64 {
        // Day counts below one only arise for dates before the anchor; clamp
        // rather than produce zero or NaN.
        self.coefficient * days.max(1.0).powf(self.exponent)
    }
}

impl GrowthModel for PowerLawModel {
    fn price_at(&self, years_from_now: f64) -> f64 {
        let days = self.days_since_reference(self.as_of) + years_from_now * DAYS_PER_YEAR;
        self.price_at_days(days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_calibration_reproduces_observed_price() {
        let on = date(2025, 6, 1);
        let model = PowerLawModel::calibrated_to(105_000.0, on);

        assert!(model.calibrated);
        assert_eq!(model.as_of, on);
        assert_relative_eq!(model.price_on(on), 105_000.0, max_relative = 1e-9);
        assert_relative_eq!(model.price_at(0.0), 105_000.0, max_relative = 1e-9);
    }

    #[test]
    fn test_price_grows_with_time() {
        let model = PowerLawModel::calibrated_to(100_000.0, date(2025, 1, 1));
        let p1 = model.price_at(1.0);
        let p4 = model.price_at(4.0);
        assert!(p1 > 100_000.0);
        assert!(p4 > p1);

        // Ratio depends only on the day counts, not on A
        let d0 = model.days_since_reference(date(2025, 1, 1));
        let expected = ((d0 + DAYS_PER_YEAR) / d0).powf(DEFAULT_POWER_LAW_EXPONENT);
        assert_relative_eq!(p1 / 100_000.0, expected, max_relative = 1e-9);
    }

    #[test]
    fn test_invalid_calibration_keeps_coefficient() {
        let mut model = PowerLawModel::default();
        let before = model.clone();

        assert!(!model.calibrate(0.0, date(2025, 3, 1)));
        assert!(!model.calibrate(f64::NAN, date(2025, 3, 1)));
        assert!(!model.calibrate(90_000.0, date(2008, 12, 1)));
        assert_eq!(model, before);
        assert!(!model.calibrated);
    }

    #[test]
    fn test_uncalibrated_model_still_prices() {
        let model = PowerLawModel::default();
        let price = model.price_at(0.0);
        assert!(price.is_finite() && price > 0.0);
        // Default coefficient lands in the right order of magnitude
        assert!(price > 50_000.0 && price < 200_000.0);
    }

    #[test]
    fn test_recalibration_replaces_coefficient() {
        let mut model = PowerLawModel::calibrated_to(100_000.0, date(2025, 1, 1));
        let old = model.coefficient;
        assert!(model.calibrate(120_000.0, date(2025, 2, 1)));
        assert!(model.coefficient > old);
        assert_relative_eq!(model.price_on(date(2025, 2, 1)), 120_000.0, max_relative = 1e-9);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let model: PowerLawModel = serde_json::from_str(r#"{"coefficient":1e-17}"#).unwrap();
        assert_eq!(model.exponent, DEFAULT_POWER_LAW_EXPONENT);
        assert_eq!(model.reference_date, default_reference_date());
        assert_eq!(model.as_of, default_as_of());
        assert!(!model.calibrated);
    }
}
