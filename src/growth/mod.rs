//! Forward price models for the asset
//!
//! The projector only ever asks a model for `price_at(years_from_now)`; the
//! concrete policy is chosen once when the projection starts.

mod fixed;
mod power_law;

pub use fixed::FixedPercentGrowth;
pub use power_law::{
    default_as_of, default_reference_date, PowerLawModel, DAYS_PER_YEAR,
    DEFAULT_POWER_LAW_COEFFICIENT, DEFAULT_POWER_LAW_EXPONENT,
};

use serde::{Deserialize, Serialize};

use crate::error::{ProjectionError, ProjectionOutcome};

/// Relative gap allowed between a calibrated power law and the starting price
const ANCHOR_TOLERANCE: f64 = 1e-9;

/// Capability interface for forward asset prices
pub trait GrowthModel: Send + Sync {
    /// Price of one unit of the asset `years_from_now` years after projection start
    fn price_at(&self, years_from_now: f64) -> f64;
}

/// Growth assumption selected by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum GrowthPolicy {
    /// Fixed annual percentage growth, compounded per elapsed cycle
    FixedPercent { annual_percent: f64 },
    /// Power-law fit anchored to a reference date
    PowerLaw(PowerLawModel),
}

impl GrowthPolicy {
    pub fn fixed(annual_percent: f64) -> Self {
        GrowthPolicy::FixedPercent { annual_percent }
    }

    /// Build the price model for a projection starting at `initial_price`.
    ///
    /// An uncalibrated power law is calibrated to `initial_price` on its
    /// `as_of` date, so year 0 of the model is the starting price.
    pub fn build(&self, initial_price: f64) -> Box<dyn GrowthModel> {
        match self {
            GrowthPolicy::FixedPercent { annual_percent } => {
                Box::new(FixedPercentGrowth::new(initial_price, *annual_percent))
            }
            GrowthPolicy::PowerLaw(model) => {
                let mut anchored = model.clone();
                if !anchored.calibrated {
                    let as_of = anchored.as_of;
                    anchored.calibrate(initial_price, as_of);
                }
                Box::new(anchored)
            }
        }
    }

    /// A calibrated power law must agree with the starting price at year 0
    pub fn check_anchor(&self, initial_price: f64) -> ProjectionOutcome<()> {
        if let GrowthPolicy::PowerLaw(model) = self {
            if model.calibrated {
                let anchored = model.price_at(0.0);
                if ((anchored - initial_price) / initial_price).abs() > ANCHOR_TOLERANCE {
                    return Err(ProjectionError::invalid(
                        "initial_asset_price",
                        format!("differs from calibrated power-law price {:.2}", anchored),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Reject parameters that cannot produce a positive finite price
    pub fn validate(&self) -> ProjectionOutcome<()> {
        match self {
            GrowthPolicy::FixedPercent { annual_percent } => {
                if !annual_percent.is_finite() || *annual_percent <= -100.0 {
                    return Err(ProjectionError::invalid(
                        "growth_policy",
                        "fixed growth percent must be finite and greater than -100",
                    ));
                }
            }
            GrowthPolicy::PowerLaw(model) => {
                if !model.coefficient.is_finite() || model.coefficient <= 0.0 {
                    return Err(ProjectionError::invalid(
                        "growth_policy",
                        "power-law coefficient must be positive",
                    ));
                }
                if !model.exponent.is_finite() {
                    return Err(ProjectionError::invalid(
                        "growth_policy",
                        "power-law exponent must be finite",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Short label for reports
    pub fn label(&self) -> String {
        match self {
            GrowthPolicy::FixedPercent { annual_percent } => format!("fixed {}%/yr", annual_percent),
            GrowthPolicy::PowerLaw(model) => format!("power law ^{}", model.exponent),
        }
    }
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        GrowthPolicy::fixed(crate::inputs::DEFAULT_PRICE_GROWTH_PERCENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_build_fixed() {
        let model = GrowthPolicy::fixed(30.0).build(100_000.0);
        assert_relative_eq!(model.price_at(0.0), 100_000.0);
        assert_relative_eq!(model.price_at(1.0), 130_000.0, max_relative = 1e-12);
    }

    #[test]
    fn test_build_power_law_anchors_uncalibrated_model() {
        let pl = PowerLawModel::default();
        let model = GrowthPolicy::PowerLaw(pl.clone()).build(60_000.0);

        assert_relative_eq!(model.price_at(0.0), 60_000.0, max_relative = 1e-12);
        // Only A moves; the curve keeps its shape
        assert_relative_eq!(
            model.price_at(2.0) / model.price_at(0.0),
            pl.price_at(2.0) / pl.price_at(0.0),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_build_power_law_keeps_calibrated_model() {
        let pl = PowerLawModel::calibrated_to(80_000.0, default_as_of());
        let model = GrowthPolicy::PowerLaw(pl.clone()).build(80_000.0);
        assert_relative_eq!(model.price_at(3.0), pl.price_at(3.0));
    }

    #[test]
    fn test_check_anchor() {
        let pl = PowerLawModel::calibrated_to(80_000.0, default_as_of());
        let policy = GrowthPolicy::PowerLaw(pl);
        assert!(policy.check_anchor(80_000.0).is_ok());
        assert!(matches!(
            policy.check_anchor(60_000.0),
            Err(ProjectionError::InvalidInput { ref field, .. }) if field == "initial_asset_price"
        ));

        // Uncalibrated and fixed policies follow the starting price
        assert!(GrowthPolicy::PowerLaw(PowerLawModel::default()).check_anchor(60_000.0).is_ok());
        assert!(GrowthPolicy::fixed(30.0).check_anchor(1.0).is_ok());
    }

    #[test]
    fn test_validate() {
        assert!(GrowthPolicy::fixed(0.0).validate().is_ok());
        assert!(GrowthPolicy::fixed(-50.0).validate().is_ok());
        assert!(GrowthPolicy::fixed(-100.0).validate().is_err());
        assert!(GrowthPolicy::fixed(f64::NAN).validate().is_err());

        let mut pl = PowerLawModel::default();
        assert!(GrowthPolicy::PowerLaw(pl.clone()).validate().is_ok());
        pl.coefficient = 0.0;
        assert!(GrowthPolicy::PowerLaw(pl).validate().is_err());
    }

    #[test]
    fn test_serde_tagging() {
        let json = serde_json::to_value(GrowthPolicy::fixed(12.5)).unwrap();
        assert_eq!(json["policy"], "fixed_percent");
        assert_eq!(json["annual_percent"], 12.5);

        let parsed: GrowthPolicy =
            serde_json::from_str(r#"{"policy":"fixed_percent","annual_percent":40.0}"#).unwrap();
        assert_eq!(parsed, GrowthPolicy::fixed(40.0));
    }
}
