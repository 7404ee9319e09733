//! Cycle projector: validation, the bounded cycle loop and final repayment

mod state;
mod engine;
mod records;
pub mod fees;

pub use state::ProjectionState;
pub use engine::{project, CycleProjector, ProjectionConfig, DEFAULT_COLLATERAL_RATIO, DEFAULT_FEE_RATE_PERCENT};
pub use records::{CycleRecord, HoldingsSample, ProjectionResult, ProjectionSummary};
