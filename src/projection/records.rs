//! Output structures for cycle projections

use serde::{Deserialize, Serialize};

/// Ledger of one loan cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleRecord {
    // Timing
    pub cycle_index: u32,
    /// Elapsed years at cycle start
    pub year_offset: f64,
    pub asset_price: f64,

    // Loan sizing
    pub previous_debt: f64,
    pub max_loan_available: f64,
    pub desired_loan: f64,
    pub total_loan: f64,

    // Purchase
    pub buy_amount: f64,
    pub asset_bought: f64,
    /// Set only when asset was actually bought this cycle
    pub purchase_price: Option<f64>,

    // Fees
    pub fee_in_currency: f64,
    pub fee_in_asset: f64,

    // Collateral
    pub collateral_required: f64,
    /// Collateral the uncapped desired loan would have needed, when the loan was capped
    pub collateral_shortfall: Option<f64>,

    // Holdings
    pub holdings_before: f64,
    pub holdings_after: f64,
}

impl CycleRecord {
    /// Whether the loan was reduced to what the collateral could secure
    pub fn was_capped(&self) -> bool {
        self.collateral_shortfall.is_some()
    }
}

/// One point of the holdings time series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoldingsSample {
    pub year_offset: f64,
    pub holdings: f64,
    pub asset_price: f64,
    pub asset_bought: f64,
    pub is_repayment_event: bool,
}

/// Complete projection result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionResult {
    pub initial_holdings: f64,

    /// Holdings after the last cycle, before closing the loan
    pub holdings_before_repayment: f64,

    /// Holdings after selling enough asset to repay the final debt
    pub holdings_after_repayment: f64,

    /// `holdings_after_repayment - initial_holdings`
    pub gained_asset: f64,

    /// Currency repaid across all cycles, fees excluded
    pub total_cost: f64,

    /// Principal plus interest of the last loan
    pub final_debt: f64,

    pub asset_needed_for_repayment: f64,

    /// Value of the holdings left after repayment, at the final price
    pub final_asset_value: f64,

    pub final_asset_price: f64,

    /// Price at which the pledged holdings would no longer cover the total cost
    pub liquidation_price: f64,

    /// Years from projection start to final repayment
    pub years_elapsed: f64,

    /// Per-cycle ledgers
    pub cycles: Vec<CycleRecord>,

    /// Holdings time series, one per cycle plus the repayment event
    pub samples: Vec<HoldingsSample>,
}

impl ProjectionResult {
    pub fn new(initial_holdings: f64) -> Self {
        Self {
            initial_holdings,
            holdings_before_repayment: initial_holdings,
            holdings_after_repayment: initial_holdings,
            gained_asset: 0.0,
            total_cost: 0.0,
            final_debt: 0.0,
            asset_needed_for_repayment: 0.0,
            final_asset_value: 0.0,
            final_asset_price: 0.0,
            liquidation_price: 0.0,
            years_elapsed: 0.0,
            cycles: Vec::new(),
            samples: Vec::new(),
        }
    }

    /// Append a completed cycle and its sample
    pub fn add_cycle(&mut self, record: CycleRecord, sample: HoldingsSample) {
        self.cycles.push(record);
        self.samples.push(sample);
    }

    pub fn repayment_sample(&self) -> Option<&HoldingsSample> {
        self.samples.iter().find(|s| s.is_repayment_event)
    }

    /// Get summary statistics
    pub fn summary(&self) -> ProjectionSummary {
        let total_asset_bought: f64 = self.cycles.iter().map(|r| r.asset_bought).sum();
        let total_buy_amount: f64 = self.cycles.iter().map(|r| r.buy_amount).sum();
        let total_fees_in_asset: f64 = self.cycles.iter().map(|r| r.fee_in_asset).sum();
        let total_fees_in_currency: f64 = self.cycles.iter().map(|r| r.fee_in_currency).sum();
        let capped_cycles = self.cycles.iter().filter(|r| r.was_capped()).count() as u32;
        let peak_loan = self.cycles.iter().map(|r| r.total_loan).fold(0.0, f64::max);

        ProjectionSummary {
            cycle_count: self.cycles.len() as u32,
            total_asset_bought,
            total_buy_amount,
            total_fees_in_asset,
            total_fees_in_currency,
            capped_cycles,
            peak_loan,
            gained_asset: self.gained_asset,
            final_asset_value: self.final_asset_value,
        }
    }
}

/// Summary statistics for a projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSummary {
    pub cycle_count: u32,
    pub total_asset_bought: f64,
    pub total_buy_amount: f64,
    pub total_fees_in_asset: f64,
    pub total_fees_in_currency: f64,
    pub capped_cycles: u32,
    pub peak_loan: f64,
    pub gained_asset: f64,
    pub final_asset_value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(index: u32, loan: f64, bought: f64, shortfall: Option<f64>) -> CycleRecord {
        CycleRecord {
            cycle_index: index,
            year_offset: index as f64,
            asset_price: 100_000.0,
            previous_debt: 0.0,
            max_loan_available: loan,
            desired_loan: loan,
            total_loan: loan,
            buy_amount: bought * 100_000.0,
            asset_bought: bought,
            purchase_price: Some(100_000.0),
            fee_in_currency: loan * 0.015,
            fee_in_asset: 0.001,
            collateral_required: 0.1,
            collateral_shortfall: shortfall,
            holdings_before: 0.2,
            holdings_after: 0.2 + bought - 0.001,
        }
    }

    fn sample(year: f64, repayment: bool) -> HoldingsSample {
        HoldingsSample {
            year_offset: year,
            holdings: 0.2,
            asset_price: 100_000.0,
            asset_bought: 0.0,
            is_repayment_event: repayment,
        }
    }

    #[test]
    fn test_summary() {
        let mut result = ProjectionResult::new(0.2);
        result.add_cycle(record(0, 5_000.0, 0.05, None), sample(0.0, false));
        result.add_cycle(record(1, 8_000.0, 0.02, Some(0.3)), sample(1.0, false));

        let summary = result.summary();
        assert_eq!(summary.cycle_count, 2);
        assert_eq!(summary.capped_cycles, 1);
        assert_eq!(summary.peak_loan, 8_000.0);
        assert!((summary.total_asset_bought - 0.07).abs() < 1e-12);
        assert!((summary.total_fees_in_currency - 195.0).abs() < 1e-9);
    }

    #[test]
    fn test_repayment_sample_lookup() {
        let mut result = ProjectionResult::new(0.2);
        assert!(result.repayment_sample().is_none());

        result.add_cycle(record(0, 5_000.0, 0.05, None), sample(0.0, false));
        result.samples.push(sample(1.0, true));
        assert_eq!(result.repayment_sample().map(|s| s.year_offset), Some(1.0));
    }
}
