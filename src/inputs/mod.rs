//! Projection inputs and scenario loading

mod data;
pub mod loader;

pub use data::{
    ProjectionInput, ScenarioInput, DEFAULT_ANNUAL_INTEREST_RATE_PERCENT,
    DEFAULT_BUY_PERCENT, DEFAULT_CYCLE_COUNT, DEFAULT_CYCLE_DURATION_MONTHS,
    DEFAULT_INITIAL_ASSET_PRICE, DEFAULT_INITIAL_HOLDINGS, DEFAULT_LOAN_AMOUNT,
    DEFAULT_PRICE_GROWTH_PERCENT, MAX_BUY_PERCENT, MAX_CYCLE_COUNT,
};
pub use loader::{load_input_json, load_scenarios, load_scenarios_from_reader};
