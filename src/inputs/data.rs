//! Projection input record and its validation

use serde::{Deserialize, Serialize};

use crate::error::{ProjectionError, ProjectionOutcome};
use crate::growth::GrowthPolicy;
use crate::output::Currency;

pub const DEFAULT_INITIAL_HOLDINGS: f64 = 0.2;
pub const DEFAULT_LOAN_AMOUNT: f64 = 5_000.0;
pub const DEFAULT_INITIAL_ASSET_PRICE: f64 = 100_000.0;
pub const DEFAULT_CYCLE_DURATION_MONTHS: f64 = 12.0;
pub const DEFAULT_ANNUAL_INTEREST_RATE_PERCENT: f64 = 10.0;
pub const DEFAULT_PRICE_GROWTH_PERCENT: f64 = 30.0;
pub const DEFAULT_CYCLE_COUNT: u32 = 5;
pub const DEFAULT_BUY_PERCENT: f64 = 50.0;

/// Upper bound on cycles per projection
pub const MAX_CYCLE_COUNT: u32 = 30;

/// Upper bound on the share of each new loan spent on the asset
pub const MAX_BUY_PERCENT: f64 = 50.0;

/// Immutable parameters of one projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionInput {
    /// Asset units held before the first cycle
    pub initial_holdings: f64,

    /// Cycle 0 loan, fully spent on the asset
    pub loan_amount: f64,

    /// Length of each loan cycle in months (fractional allowed)
    pub cycle_duration_months: f64,

    /// Simple annual interest rate on the loan, in percent
    pub annual_interest_rate_percent: f64,

    /// Asset price at projection start
    pub initial_asset_price: f64,

    #[serde(default)]
    pub growth_policy: GrowthPolicy,

    /// Number of loan cycles (1-30)
    pub cycle_count: u32,

    /// Share of each rolled loan spent on the asset after repaying prior debt (0-50)
    pub buy_percent: f64,
}

impl Default for ProjectionInput {
    fn default() -> Self {
        Self {
            initial_holdings: DEFAULT_INITIAL_HOLDINGS,
            loan_amount: DEFAULT_LOAN_AMOUNT,
            cycle_duration_months: DEFAULT_CYCLE_DURATION_MONTHS,
            annual_interest_rate_percent: DEFAULT_ANNUAL_INTEREST_RATE_PERCENT,
            initial_asset_price: DEFAULT_INITIAL_ASSET_PRICE,
            growth_policy: GrowthPolicy::fixed(DEFAULT_PRICE_GROWTH_PERCENT),
            cycle_count: DEFAULT_CYCLE_COUNT,
            buy_percent: DEFAULT_BUY_PERCENT,
        }
    }
}

impl ProjectionInput {
    pub fn cycle_duration_years(&self) -> f64 {
        self.cycle_duration_months / 12.0
    }

    pub fn cycle_duration_days(&self) -> f64 {
        self.cycle_duration_years() * 365.0
    }

    /// Check every field; the first violated rule is reported
    pub fn validate(&self) -> ProjectionOutcome<()> {
        positive("initial_holdings", self.initial_holdings)?;
        positive("loan_amount", self.loan_amount)?;
        positive("initial_asset_price", self.initial_asset_price)?;
        positive("cycle_duration_months", self.cycle_duration_months)?;

        if !self.annual_interest_rate_percent.is_finite() || self.annual_interest_rate_percent < 0.0 {
            return Err(ProjectionError::invalid(
                "annual_interest_rate_percent",
                "must not be negative",
            ));
        }

        if self.cycle_count < 1 || self.cycle_count > MAX_CYCLE_COUNT {
            return Err(ProjectionError::invalid(
                "cycle_count",
                format!("must be between 1 and {}", MAX_CYCLE_COUNT),
            ));
        }

        if !self.buy_percent.is_finite() || self.buy_percent < 0.0 || self.buy_percent > MAX_BUY_PERCENT {
            return Err(ProjectionError::invalid(
                "buy_percent",
                format!("must be between 0 and {}", MAX_BUY_PERCENT),
            ));
        }

        self.growth_policy.validate()?;
        self.growth_policy.check_anchor(self.initial_asset_price)
    }
}

fn positive(field: &str, value: f64) -> ProjectionOutcome<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ProjectionError::invalid(field, "must be positive"))
    }
}

/// Projection input tagged with a caller-chosen identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioInput {
    pub scenario_id: String,
    pub input: ProjectionInput,

    /// Label for rendered amounts; never read by the projection
    #[serde(default)]
    pub currency: Currency,
}

impl ScenarioInput {
    pub fn new(scenario_id: impl Into<String>, input: ProjectionInput) -> Self {
        Self {
            scenario_id: scenario_id.into(),
            input,
            currency: Currency::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: ProjectionError) -> String {
        match err {
            ProjectionError::InvalidInput { field, .. } => field,
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        let input = ProjectionInput::default();
        assert!(input.validate().is_ok());
        assert_eq!(input.cycle_duration_years(), 1.0);
        assert_eq!(input.cycle_duration_days(), 365.0);
    }

    #[test]
    fn test_each_rule() {
        let base = ProjectionInput::default();

        let cases: Vec<(ProjectionInput, &str)> = vec![
            (ProjectionInput { initial_holdings: 0.0, ..base.clone() }, "initial_holdings"),
            (ProjectionInput { loan_amount: -1.0, ..base.clone() }, "loan_amount"),
            (ProjectionInput { initial_asset_price: f64::NAN, ..base.clone() }, "initial_asset_price"),
            (ProjectionInput { cycle_duration_months: 0.0, ..base.clone() }, "cycle_duration_months"),
            (ProjectionInput { annual_interest_rate_percent: -0.1, ..base.clone() }, "annual_interest_rate_percent"),
            (ProjectionInput { cycle_count: 0, ..base.clone() }, "cycle_count"),
            (ProjectionInput { cycle_count: 31, ..base.clone() }, "cycle_count"),
            (ProjectionInput { buy_percent: 51.0, ..base.clone() }, "buy_percent"),
            (ProjectionInput { buy_percent: -1.0, ..base.clone() }, "buy_percent"),
            (ProjectionInput { growth_policy: GrowthPolicy::fixed(-100.0), ..base.clone() }, "growth_policy"),
        ];

        for (input, expected) in cases {
            let err = input.validate().unwrap_err();
            assert_eq!(field_of(err), expected);
        }
    }

    #[test]
    fn test_first_violation_wins() {
        let input = ProjectionInput {
            loan_amount: 0.0,
            cycle_count: 99,
            buy_percent: 80.0,
            ..Default::default()
        };
        assert_eq!(field_of(input.validate().unwrap_err()), "loan_amount");
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let input = ProjectionInput {
            cycle_count: MAX_CYCLE_COUNT,
            buy_percent: MAX_BUY_PERCENT,
            annual_interest_rate_percent: 0.0,
            ..Default::default()
        };
        assert!(input.validate().is_ok());

        let input = ProjectionInput { cycle_count: 1, buy_percent: 0.0, ..Default::default() };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_json_defaults() {
        let input: ProjectionInput = serde_json::from_str(
            r#"{
                "initial_holdings": 1.0,
                "loan_amount": 10000.0,
                "cycle_duration_months": 6.0,
                "annual_interest_rate_percent": 8.0,
                "initial_asset_price": 90000.0,
                "cycle_count": 4,
                "buy_percent": 25.0
            }"#,
        )
        .unwrap();
        assert_eq!(input.growth_policy, GrowthPolicy::fixed(DEFAULT_PRICE_GROWTH_PERCENT));
        assert_eq!(input.cycle_duration_years(), 0.5);
    }
}
