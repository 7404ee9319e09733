//! Rendering of projection results
//!
//! The engine carries full precision; rounding happens here and only here.
//! Asset amounts are shown to 4 decimals, currency amounts to 2.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::Write as _;
use std::io::Write;

use crate::error::ProjectionError;
use crate::projection::ProjectionResult;
use crate::scenario::ScenarioOutcome;

pub const ASSET_DECIMALS: u32 = 4;
pub const CURRENCY_DECIMALS: u32 = 2;

/// Currency label for rendered amounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Eur,
    Usd,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Eur => "€",
            Currency::Usd => "$",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "EUR" => Some(Currency::Eur),
            "USD" => Some(Currency::Usd),
            _ => None,
        }
    }
}

/// Round half away from zero to `places` decimals
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

fn asset(value: f64) -> f64 {
    round_to(value, ASSET_DECIMALS)
}

fn money(value: f64) -> f64 {
    round_to(value, CURRENCY_DECIMALS)
}

#[derive(Serialize)]
struct CycleCsvRow {
    cycle: u32,
    year: f64,
    asset_price: f64,
    previous_debt: f64,
    max_loan_available: f64,
    desired_loan: f64,
    total_loan: f64,
    buy_amount: f64,
    asset_bought: f64,
    purchase_price: Option<f64>,
    fee_in_currency: f64,
    fee_in_asset: f64,
    collateral_required: f64,
    collateral_shortfall: Option<f64>,
    holdings_before: f64,
    holdings_after: f64,
}

#[derive(Serialize)]
struct SampleCsvRow {
    year: f64,
    holdings: f64,
    asset_price: f64,
    asset_bought: f64,
    repayment: bool,
}

#[derive(Serialize)]
struct SummaryCsvRow<'a> {
    scenario_id: &'a str,
    status: &'static str,
    cycles: u32,
    buy_percent: f64,
    holdings_before_repayment: Option<f64>,
    holdings_after_repayment: Option<f64>,
    gained_asset: Option<f64>,
    total_cost: Option<f64>,
    final_asset_price: Option<f64>,
    final_asset_value: Option<f64>,
    liquidation_price: Option<f64>,
    failed_cycle: Option<u32>,
    error: Option<String>,
}

/// Write one CSV row per cycle
pub fn write_cycles_csv<W: Write>(writer: W, result: &ProjectionResult) -> Result<(), Box<dyn Error>> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for record in &result.cycles {
        csv_writer.serialize(CycleCsvRow {
            cycle: record.cycle_index,
            year: round_to(record.year_offset, 2),
            asset_price: money(record.asset_price),
            previous_debt: money(record.previous_debt),
            max_loan_available: money(record.max_loan_available),
            desired_loan: money(record.desired_loan),
            total_loan: money(record.total_loan),
            buy_amount: money(record.buy_amount),
            asset_bought: asset(record.asset_bought),
            purchase_price: record.purchase_price.map(money),
            fee_in_currency: money(record.fee_in_currency),
            fee_in_asset: asset(record.fee_in_asset),
            collateral_required: asset(record.collateral_required),
            collateral_shortfall: record.collateral_shortfall.map(asset),
            holdings_before: asset(record.holdings_before),
            holdings_after: asset(record.holdings_after),
        })?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write the holdings time series, repayment event last
pub fn write_samples_csv<W: Write>(writer: W, result: &ProjectionResult) -> Result<(), Box<dyn Error>> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for sample in &result.samples {
        csv_writer.serialize(SampleCsvRow {
            year: round_to(sample.year_offset, 2),
            holdings: asset(sample.holdings),
            asset_price: money(sample.asset_price),
            asset_bought: asset(sample.asset_bought),
            repayment: sample.is_repayment_event,
        })?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write one summary row per scenario, failures included
pub fn write_summary_csv<W: Write>(writer: W, outcomes: &[ScenarioOutcome]) -> Result<(), Box<dyn Error>> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for o in outcomes {
        let row = match &o.outcome {
            Ok(result) => SummaryCsvRow {
                scenario_id: &o.scenario_id,
                status: "ok",
                cycles: o.input.cycle_count,
                buy_percent: o.input.buy_percent,
                holdings_before_repayment: Some(asset(result.holdings_before_repayment)),
                holdings_after_repayment: Some(asset(result.holdings_after_repayment)),
                gained_asset: Some(asset(result.gained_asset)),
                total_cost: Some(money(result.total_cost)),
                final_asset_price: Some(money(result.final_asset_price)),
                final_asset_value: Some(money(result.final_asset_value)),
                liquidation_price: Some(money(result.liquidation_price)),
                failed_cycle: None,
                error: None,
            },
            Err(err) => SummaryCsvRow {
                scenario_id: &o.scenario_id,
                status: err.kind(),
                cycles: o.input.cycle_count,
                buy_percent: o.input.buy_percent,
                holdings_before_repayment: None,
                holdings_after_repayment: None,
                gained_asset: None,
                total_cost: None,
                final_asset_price: None,
                final_asset_value: None,
                liquidation_price: None,
                failed_cycle: err.cycle(),
                error: Some(err.to_string()),
            },
        };
        csv_writer.serialize(row)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// JSON document for a projection outcome
///
/// Full precision: JSON consumers do their own formatting.
pub fn outcome_json(outcome: &Result<ProjectionResult, ProjectionError>) -> serde_json::Value {
    match outcome {
        Ok(result) => serde_json::json!({
            "status": "ok",
            "result": result,
            "summary": result.summary(),
        }),
        Err(err) => serde_json::json!({
            "status": "error",
            "error": err,
            "message": err.to_string(),
        }),
    }
}

/// Plain-text report of a projection
pub fn render_table(result: &ProjectionResult, currency: Currency) -> String {
    let sym = currency.symbol();
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{:>5} {:>6} {:>12} {:>12} {:>12} {:>10} {:>10} {:>10} {:>10}",
        "Cycle", "Year", "Price", "Debt", "Loan", "Bought", "Fee", "Collat", "Holdings"
    );
    let _ = writeln!(out, "{}", "-".repeat(96));

    for r in &result.cycles {
        let _ = writeln!(
            out,
            "{:>5} {:>6.2} {:>12.2} {:>12.2} {:>12.2} {:>10.4} {:>10.4} {:>10.4} {:>10.4}{}",
            r.cycle_index,
            r.year_offset,
            r.asset_price,
            r.previous_debt,
            r.total_loan,
            r.asset_bought,
            r.fee_in_asset,
            r.collateral_required,
            r.holdings_after,
            match r.collateral_shortfall {
                Some(needed) => format!("  (capped, {:.4} needed)", needed),
                None => String::new(),
            },
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Final repayment (year {:.2}):", result.years_elapsed);
    let _ = writeln!(out, "  Debt repaid:        {:.2} {}", result.final_debt, sym);
    let _ = writeln!(out, "  Asset sold:         {:.4}", result.asset_needed_for_repayment);
    let _ = writeln!(out, "  Holdings:           {:.4} -> {:.4}", result.holdings_before_repayment, result.holdings_after_repayment);
    let _ = writeln!(out, "  Gained asset:       {:.4}", result.gained_asset);
    let _ = writeln!(out, "  Total cost:         {:.2} {}", result.total_cost, sym);
    let _ = writeln!(out, "  Final asset price:  {:.2} {}", result.final_asset_price, sym);
    let _ = writeln!(out, "  Final asset value:  {:.2} {}", result.final_asset_value, sym);
    let _ = writeln!(out, "  Liquidation price:  {:.2} {}", result.liquidation_price, sym);

    out
}
