//! Fixed percentage growth

use super::GrowthModel;

/// Price grows by a fixed annual percentage
///
/// Compounding uses the elapsed time as the exponent, so advancing one cycle
/// multiplies the price by `(1 + p/100)^(cycle_duration_years)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedPercentGrowth {
    pub initial_price: f64,
    pub annual_percent: f64,
}

impl FixedPercentGrowth {
    pub fn new(initial_price: f64, annual_percent: f64) -> Self {
        Self { initial_price, annual_percent }
    }

    /// Growth factor applied over one step of `years`
    pub fn step_factor(&self, years: f64) -> f64 {
        (1.0 + self.annual_percent / 100.0).powf(years)
    }
}

impl GrowthModel for FixedPercentGrowth {
    fn price_at(&self, years_from_now: f64) -> f64 {
        self.initial_price * self.step_factor(years_from_now)
    }
}
