//! Collateral Cycle - Projection engine for collateralized-loan accumulation cycles
//!
//! A holder pledges part of an asset position as collateral, borrows currency,
//! buys more of the asset and rolls the debt into a fresh loan each cycle.
//! This library provides:
//! - Per-cycle ledgers (loan sizing, fee, collateral, purchase, roll-forward)
//! - Fixed-percent and power-law forward price models
//! - Final repayment and liquidation-price analytics
//! - Batch and sweep projections over many scenarios

pub mod error;
pub mod growth;
pub mod inputs;
pub mod output;
pub mod projection;
pub mod scenario;

// Re-export commonly used types
pub use error::{LedgerStage, ProjectionError, ProjectionOutcome};
pub use growth::{GrowthModel, GrowthPolicy, PowerLawModel};
pub use inputs::{ProjectionInput, ScenarioInput};
pub use output::Currency;
pub use projection::{project, CycleProjector, CycleRecord, HoldingsSample, ProjectionConfig, ProjectionResult};
pub use scenario::{ScenarioOutcome, ScenarioRunner};
