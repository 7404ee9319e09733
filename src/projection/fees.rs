//! Fee and collateral arithmetic for a single loan

/// Flat origination fee quoted in currency
pub fn fee_in_currency(loan: f64, fee_rate_percent: f64) -> f64 {
    loan * (fee_rate_percent / 100.0)
}

/// Time-prorated fee paid in the asset; this is the fee that reduces holdings
pub fn fee_in_asset(loan: f64, fee_rate_percent: f64, duration_days: f64, asset_price: f64) -> f64 {
    (fee_rate_percent / 100.0) * loan * (duration_days / 365.0) / asset_price
}

/// Asset units that must be pledged to draw `loan`
pub fn collateral_required(loan: f64, collateral_ratio: f64, asset_price: f64) -> f64 {
    loan * collateral_ratio / asset_price
}

/// Largest loan the given holdings can secure
pub fn max_loan_available(holdings: f64, asset_price: f64, collateral_ratio: f64) -> f64 {
    holdings * asset_price / collateral_ratio
}

/// Loan needed so that, after repaying `previous_debt`, `buy_percent` of it is left to buy with
pub fn desired_loan(previous_debt: f64, buy_percent: f64) -> f64 {
    if buy_percent == 0.0 {
        previous_debt
    } else {
        previous_debt / (1.0 - buy_percent / 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fees() {
        assert_relative_eq!(fee_in_currency(5_000.0, 1.5), 75.0);
        // Full year at 100k: 75 / 100000
        assert_relative_eq!(fee_in_asset(5_000.0, 1.5, 365.0, 100_000.0), 0.00075);
        // Half year is half the asset fee, currency fee unchanged
        assert_relative_eq!(fee_in_asset(5_000.0, 1.5, 182.5, 100_000.0), 0.000375);
    }

    #[test]
    fn test_collateral_and_capacity_are_inverse() {
        let collateral = collateral_required(5_000.0, 2.0, 100_000.0);
        assert_relative_eq!(collateral, 0.1);
        assert_relative_eq!(max_loan_available(collateral, 100_000.0, 2.0), 5_000.0);
    }

    #[test]
    fn test_desired_loan() {
        assert_eq!(desired_loan(5_500.0, 0.0), 5_500.0);
        assert_relative_eq!(desired_loan(5_500.0, 50.0), 11_000.0);
        assert_relative_eq!(desired_loan(7_500.0, 25.0), 10_000.0);
    }
}
