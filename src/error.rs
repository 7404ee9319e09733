//! Error taxonomy for cycle projections
//!
//! Every failure aborts the projection; no partial result is returned.

use serde::Serialize;
use thiserror::Error;

/// Step of the per-cycle ledger at which a quantity was computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerStage {
    LoanSizing,
    Fee,
    Collateral,
    Purchase,
    FeeDeduction,
    CollateralReturn,
    RollForward,
    FinalRepayment,
}

impl LedgerStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerStage::LoanSizing => "loan_sizing",
            LedgerStage::Fee => "fee",
            LedgerStage::Collateral => "collateral",
            LedgerStage::Purchase => "purchase",
            LedgerStage::FeeDeduction => "fee_deduction",
            LedgerStage::CollateralReturn => "collateral_return",
            LedgerStage::RollForward => "roll_forward",
            LedgerStage::FinalRepayment => "final_repayment",
        }
    }
}

impl std::fmt::Display for LedgerStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tagged projection failure
///
/// Amounts are carried at full precision. Currency amounts are in the
/// input's currency, asset amounts in units of the asset.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProjectionError {
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Loan in cycle {cycle} cannot cover prior debt: required {required:.2}, available {available:.2}")]
    InsufficientLoanForRepayment { cycle: u32, required: f64, available: f64 },

    #[error("Insufficient collateral in cycle {cycle}: required {required:.4}, available {available:.4}")]
    InsufficientCollateral { cycle: u32, required: f64, available: f64 },

    #[error("Insufficient asset for fee in cycle {cycle}: required {required:.4}, available {available:.4}")]
    InsufficientAssetForFee { cycle: u32, required: f64, available: f64 },

    /// `cycle` equals the cycle count when raised by the final repayment
    #[error("Non-finite value in cycle {cycle} at stage {stage}")]
    NumericInvalid { cycle: u32, stage: LedgerStage },
}

impl ProjectionError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ProjectionError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ProjectionError::InvalidInput { .. } => "invalid_input",
            ProjectionError::InsufficientLoanForRepayment { .. } => "insufficient_loan_for_repayment",
            ProjectionError::InsufficientCollateral { .. } => "insufficient_collateral",
            ProjectionError::InsufficientAssetForFee { .. } => "insufficient_asset_for_fee",
            ProjectionError::NumericInvalid { .. } => "numeric_invalid",
        }
    }

    /// Offending cycle index, if the error was raised inside the cycle loop
    pub fn cycle(&self) -> Option<u32> {
        match self {
            ProjectionError::InvalidInput { .. } => None,
            ProjectionError::InsufficientLoanForRepayment { cycle, .. }
            | ProjectionError::InsufficientCollateral { cycle, .. }
            | ProjectionError::InsufficientAssetForFee { cycle, .. }
            | ProjectionError::NumericInvalid { cycle, .. } => Some(*cycle),
        }
    }
}

/// Result alias for projection operations
pub type ProjectionOutcome<T> = Result<T, ProjectionError>;

/// Fail with `NumericInvalid` unless `value` is finite
pub(crate) fn ensure_finite(value: f64, cycle: u32, stage: LedgerStage) -> ProjectionOutcome<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ProjectionError::NumericInvalid { cycle, stage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_cycle() {
        let err = ProjectionError::InsufficientCollateral {
            cycle: 3,
            required: 0.5,
            available: 0.2,
        };
        assert_eq!(err.kind(), "insufficient_collateral");
        assert_eq!(err.cycle(), Some(3));

        let err = ProjectionError::invalid("buy_percent", "must be between 0 and 50");
        assert_eq!(err.kind(), "invalid_input");
        assert_eq!(err.cycle(), None);
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let err = ProjectionError::NumericInvalid {
            cycle: 2,
            stage: LedgerStage::FeeDeduction,
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "numeric_invalid");
        assert_eq!(json["cycle"], 2);
        assert_eq!(json["stage"], "fee_deduction");
    }

    #[test]
    fn test_ensure_finite() {
        assert_eq!(ensure_finite(1.5, 0, LedgerStage::Fee), Ok(1.5));
        assert_eq!(
            ensure_finite(f64::NAN, 4, LedgerStage::Purchase),
            Err(ProjectionError::NumericInvalid { cycle: 4, stage: LedgerStage::Purchase })
        );
        assert!(ensure_finite(f64::INFINITY, 0, LedgerStage::Fee).is_err());
    }

    #[test]
    fn test_display_message() {
        let err = ProjectionError::InsufficientLoanForRepayment {
            cycle: 1,
            required: 5500.0,
            available: 4000.123,
        };
        assert_eq!(
            err.to_string(),
            "Loan in cycle 1 cannot cover prior debt: required 5500.00, available 4000.12"
        );
    }
}
