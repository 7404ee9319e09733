//! Core cycle projection engine

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::env;

use super::fees;
use super::records::{CycleRecord, HoldingsSample, ProjectionResult};
use super::state::ProjectionState;
use crate::error::{ensure_finite, LedgerStage, ProjectionError, ProjectionOutcome};
use crate::growth::GrowthModel;
use crate::inputs::ProjectionInput;

/// Lending fee, percent of the loan per year
pub const DEFAULT_FEE_RATE_PERCENT: f64 = 1.5;

/// Collateral value required per unit of loan
pub const DEFAULT_COLLATERAL_RATIO: f64 = 2.0;

/// Relative slack when comparing collateral to holdings. A loan sized from the
/// holdings themselves pledges exactly those holdings; rounding in
/// `loan * ratio / price` must not turn that into a shortfall.
const COLLATERAL_TOLERANCE: f64 = 1e-12;

/// Lender terms applied to every cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// Lending fee in percent
    pub fee_rate_percent: f64,

    /// Multiple of the loan that must be pledged in the asset
    pub collateral_ratio: f64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            fee_rate_percent: DEFAULT_FEE_RATE_PERCENT,
            collateral_ratio: DEFAULT_COLLATERAL_RATIO,
        }
    }
}

impl ProjectionConfig {
    /// Read overrides from `FEE_RATE_PERCENT` and `COLLATERAL_RATIO`, falling
    /// back to the defaults for unset or unparsable values
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let fee_rate_percent = env::var("FEE_RATE_PERCENT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.fee_rate_percent);

        let collateral_ratio = env::var("COLLATERAL_RATIO")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.collateral_ratio);

        Self { fee_rate_percent, collateral_ratio }
    }

    pub fn validate(&self) -> ProjectionOutcome<()> {
        if !self.fee_rate_percent.is_finite() || self.fee_rate_percent < 0.0 {
            return Err(ProjectionError::invalid("fee_rate_percent", "must not be negative"));
        }
        if !self.collateral_ratio.is_finite() || self.collateral_ratio <= 0.0 {
            return Err(ProjectionError::invalid("collateral_ratio", "must be positive"));
        }
        Ok(())
    }
}

/// Loan terms decided at the start of a cycle
#[derive(Debug, Clone, Copy)]
struct LoanSizing {
    loan: f64,
    buy_amount: f64,
    max_loan_available: f64,
    desired_loan: f64,
    collateral_shortfall: Option<f64>,
}

/// Main projection engine
#[derive(Debug, Clone, Default)]
pub struct CycleProjector {
    config: ProjectionConfig,
}

impl CycleProjector {
    pub fn new(config: ProjectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Project using the growth policy carried by the input
    pub fn project(&self, input: &ProjectionInput) -> ProjectionOutcome<ProjectionResult> {
        input.validate()?;
        let growth = input.growth_policy.build(input.initial_asset_price);
        self.run(input, growth.as_ref())
    }

    /// Project against an arbitrary growth model; the input's policy is ignored
    pub fn project_with(
        &self,
        input: &ProjectionInput,
        growth: &dyn GrowthModel,
    ) -> ProjectionOutcome<ProjectionResult> {
        input.validate()?;
        self.run(input, growth)
    }

    fn run(&self, input: &ProjectionInput, growth: &dyn GrowthModel) -> ProjectionOutcome<ProjectionResult> {
        self.config.validate()?;

        let mut state = ProjectionState::from_input(input);
        let mut result = ProjectionResult::new(input.initial_holdings);

        for cycle in 0..input.cycle_count {
            state.cycle = cycle;

            let (record, sample) = self.calculate_cycle(input, &mut state)?;
            result.add_cycle(record, sample);

            if cycle + 1 < input.cycle_count {
                self.roll_forward(input, growth, &mut state)?;
            }
        }

        self.final_repayment(input, growth, &mut state, &mut result)?;

        info!(
            "Projected {} cycles: holdings {:.6} -> {:.6} (gained {:.6}), total cost {:.2}",
            input.cycle_count,
            input.initial_holdings,
            result.holdings_after_repayment,
            result.gained_asset,
            result.total_cost,
        );

        Ok(result)
    }

    /// Size the loan, pay the fee, pledge and release collateral, buy the asset
    fn calculate_cycle(
        &self,
        input: &ProjectionInput,
        state: &mut ProjectionState,
    ) -> ProjectionOutcome<(CycleRecord, HoldingsSample)> {
        let cycle = state.cycle;
        let price = state.asset_price;
        let holdings_before = state.holdings;

        let sizing = self.size_loan(input, state)?;
        let loan = sizing.loan;

        // Fee
        let fee_in_currency = fees::fee_in_currency(loan, self.config.fee_rate_percent);
        let fee_in_asset = ensure_finite(
            fees::fee_in_asset(loan, self.config.fee_rate_percent, input.cycle_duration_days(), price),
            cycle,
            LedgerStage::Fee,
        )?;

        // Collateral
        let mut collateral = ensure_finite(
            fees::collateral_required(loan, self.config.collateral_ratio, price),
            cycle,
            LedgerStage::Collateral,
        )?;
        if collateral > holdings_before && collateral <= holdings_before * (1.0 + COLLATERAL_TOLERANCE) {
            debug!(
                "Cycle {}: collateral {:e} clamped to holdings {:e}",
                cycle, collateral, holdings_before,
            );
            collateral = holdings_before;
        }
        if collateral > holdings_before {
            return Err(ProjectionError::InsufficientCollateral {
                cycle,
                required: collateral,
                available: holdings_before,
            });
        }

        // Pledge, buy, pay fee, release
        let asset_bought = sizing.buy_amount / price;
        let after_purchase = ensure_finite(
            holdings_before - collateral + asset_bought,
            cycle,
            LedgerStage::Purchase,
        )?;
        let after_fee = ensure_finite(after_purchase - fee_in_asset, cycle, LedgerStage::FeeDeduction)?;
        if after_fee < 0.0 {
            return Err(ProjectionError::InsufficientAssetForFee {
                cycle,
                required: fee_in_asset,
                available: after_purchase,
            });
        }
        let holdings_after = ensure_finite(after_fee + collateral, cycle, LedgerStage::CollateralReturn)?;

        let purchase_price = if asset_bought > 0.0 && sizing.buy_amount > 0.0 {
            Some(price)
        } else {
            None
        };

        state.holdings = holdings_after;
        state.current_loan = loan;

        debug!(
            "Cycle {} (year {:.2}): loan {:.2}, bought {:.6} at {:.2}, fee {:.6}, collateral {:.6}, holdings {:.6}",
            cycle, state.years_elapsed, loan, asset_bought, price, fee_in_asset, collateral, holdings_after,
        );

        let record = CycleRecord {
            cycle_index: cycle,
            year_offset: state.years_elapsed,
            asset_price: price,
            previous_debt: if cycle == 0 { 0.0 } else { state.previous_debt },
            max_loan_available: sizing.max_loan_available,
            desired_loan: sizing.desired_loan,
            total_loan: loan,
            buy_amount: sizing.buy_amount,
            asset_bought,
            purchase_price,
            fee_in_currency,
            fee_in_asset,
            collateral_required: collateral,
            collateral_shortfall: sizing.collateral_shortfall,
            holdings_before,
            holdings_after,
        };

        let sample = HoldingsSample {
            year_offset: state.years_elapsed,
            holdings: holdings_after,
            asset_price: price,
            asset_bought,
            is_repayment_event: false,
        };

        Ok((record, sample))
    }

    /// Decide this cycle's loan.
    ///
    /// Cycle 0 draws the requested amount and spends all of it. Later cycles
    /// refinance the previous debt, grossed up so `buy_percent` of the new loan
    /// is left over for buying, capped by what the holdings can secure.
    fn size_loan(&self, input: &ProjectionInput, state: &mut ProjectionState) -> ProjectionOutcome<LoanSizing> {
        let cycle = state.cycle;

        if cycle == 0 {
            return Ok(LoanSizing {
                loan: input.loan_amount,
                buy_amount: input.loan_amount,
                max_loan_available: input.loan_amount,
                desired_loan: input.loan_amount,
                collateral_shortfall: None,
            });
        }

        let previous_debt = state.previous_debt;
        state.total_cost += previous_debt;

        let max_loan_available = ensure_finite(
            fees::max_loan_available(state.holdings, state.asset_price, self.config.collateral_ratio),
            cycle,
            LedgerStage::LoanSizing,
        )?;
        let desired_loan = ensure_finite(
            fees::desired_loan(previous_debt, input.buy_percent),
            cycle,
            LedgerStage::LoanSizing,
        )?;

        let loan = max_loan_available.min(desired_loan);
        let buy_amount = loan - previous_debt;
        if buy_amount < 0.0 {
            return Err(ProjectionError::InsufficientLoanForRepayment {
                cycle,
                required: previous_debt,
                available: loan,
            });
        }

        let collateral_shortfall = if max_loan_available < desired_loan {
            let needed = desired_loan * self.config.collateral_ratio / state.asset_price;
            warn!(
                "Cycle {}: loan capped at {:.2} (desired {:.2}); {:.6} collateral would be required",
                cycle, max_loan_available, desired_loan, needed,
            );
            Some(needed)
        } else {
            None
        };

        Ok(LoanSizing {
            loan,
            buy_amount,
            max_loan_available,
            desired_loan,
            collateral_shortfall,
        })
    }

    /// Carry principal plus interest into the next cycle and advance the price
    fn roll_forward(
        &self,
        input: &ProjectionInput,
        growth: &dyn GrowthModel,
        state: &mut ProjectionState,
    ) -> ProjectionOutcome<()> {
        let cycle = state.cycle;
        let debt = ensure_finite(state.debt_to_carry(input), cycle, LedgerStage::RollForward)?;

        state.advance_time(input);
        state.asset_price = next_price(growth, state.years_elapsed, cycle, LedgerStage::RollForward)?;
        state.previous_debt = debt;

        Ok(())
    }

    /// Close the position: repay the last loan in asset at the price one cycle on
    fn final_repayment(
        &self,
        input: &ProjectionInput,
        growth: &dyn GrowthModel,
        state: &mut ProjectionState,
        result: &mut ProjectionResult,
    ) -> ProjectionOutcome<()> {
        let cycle = input.cycle_count;
        let stage = LedgerStage::FinalRepayment;

        let final_debt = ensure_finite(state.debt_to_carry(input), cycle, stage)?;
        state.total_cost += final_debt;

        state.advance_time(input);
        let final_price = next_price(growth, state.years_elapsed, cycle, stage)?;

        let holdings_before = state.holdings;
        let asset_needed = ensure_finite(final_debt / final_price, cycle, stage)?;
        let holdings_after = ensure_finite(holdings_before - asset_needed, cycle, stage)?;
        let liquidation_price = ensure_finite(
            state.total_cost / (holdings_before * self.config.collateral_ratio),
            cycle,
            stage,
        )?;

        if holdings_after < 0.0 {
            warn!(
                "Final repayment needs {:.6} asset but only {:.6} is held",
                asset_needed, holdings_before,
            );
        }

        result.samples.push(HoldingsSample {
            year_offset: state.years_elapsed,
            holdings: holdings_after,
            asset_price: final_price,
            asset_bought: 0.0,
            is_repayment_event: true,
        });

        result.holdings_before_repayment = holdings_before;
        result.holdings_after_repayment = holdings_after;
        result.gained_asset = holdings_after - input.initial_holdings;
        result.total_cost = state.total_cost;
        result.final_debt = final_debt;
        result.asset_needed_for_repayment = asset_needed;
        result.final_asset_value = holdings_after * final_price;
        result.final_asset_price = final_price;
        result.liquidation_price = liquidation_price;
        result.years_elapsed = state.years_elapsed;

        state.holdings = holdings_after;
        Ok(())
    }
}

/// Price from the growth model, rejected unless positive and finite
fn next_price(growth: &dyn GrowthModel, years: f64, cycle: u32, stage: LedgerStage) -> ProjectionOutcome<f64> {
    let price = growth.price_at(years);
    if price.is_finite() && price > 0.0 {
        Ok(price)
    } else {
        Err(ProjectionError::NumericInvalid { cycle, stage })
    }
}

/// Project with the default lender terms
pub fn project(input: &ProjectionInput) -> ProjectionOutcome<ProjectionResult> {
    CycleProjector::default().project(input)
}
