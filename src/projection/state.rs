//! Running state of a projection between cycles

use crate::inputs::ProjectionInput;

/// Accumulator owned by a single projection call
#[derive(Debug, Clone)]
pub struct ProjectionState {
    /// Current cycle (0-indexed)
    pub cycle: u32,

    /// Asset units currently owned
    pub holdings: f64,

    /// Asset price for the current cycle
    pub asset_price: f64,

    /// Years elapsed at the start of the current cycle
    pub years_elapsed: f64,

    /// Loan drawn in the most recent cycle
    pub current_loan: f64,

    /// Principal plus interest due at the start of the current cycle (excludes fees)
    pub previous_debt: f64,

    /// Currency repaid so far, including the final repayment once it has run
    pub total_cost: f64,
}

impl ProjectionState {
    /// Initialize state at projection start
    pub fn from_input(input: &ProjectionInput) -> Self {
        Self {
            cycle: 0,
            holdings: input.initial_holdings,
            asset_price: input.initial_asset_price,
            years_elapsed: 0.0,
            current_loan: input.loan_amount,
            previous_debt: 0.0,
            total_cost: 0.0,
        }
    }

    /// Principal plus simple interest on the current loan over one cycle
    pub fn debt_to_carry(&self, input: &ProjectionInput) -> f64 {
        let interest = self.current_loan
            * (input.annual_interest_rate_percent / 100.0)
            * input.cycle_duration_years();
        self.current_loan + interest
    }

    /// Move the clock forward one cycle
    pub fn advance_time(&mut self, input: &ProjectionInput) {
        self.years_elapsed += input.cycle_duration_years();
    }
}
