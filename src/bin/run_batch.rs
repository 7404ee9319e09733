//! Run projections for every scenario in a CSV file
//!
//! Usage: run_batch <scenarios.csv> [output.csv] [--json]
//!
//! Scenarios run in parallel; the summary keeps file order and reports
//! failed scenarios alongside successful ones.
//! Accepts config via environment variables:
//!   FEE_RATE_PERCENT, COLLATERAL_RATIO
//!   POWER_LAW_COEFFICIENT (default coefficient for power-law rows)

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::env;
use std::fs::File;
use std::time::Instant;

use collateral_cycle::growth::{default_as_of, PowerLawModel, DEFAULT_POWER_LAW_COEFFICIENT};
use collateral_cycle::inputs::load_scenarios;
use collateral_cycle::output::{outcome_json, write_summary_csv};
use collateral_cycle::{ProjectionConfig, ScenarioRunner};

#[derive(Serialize)]
struct BatchResponse {
    scenario_count: usize,
    succeeded: usize,
    failed: usize,
    fee_rate_percent: f64,
    collateral_ratio: f64,
    scenarios: Vec<serde_json::Value>,
    execution_time_ms: u64,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let json_output = args.iter().any(|a| a == "--json");
    let positional: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();

    let input_path = positional
        .first()
        .ok_or_else(|| anyhow!("usage: run_batch <scenarios.csv> [output.csv] [--json]"))?;
    let output_path = positional
        .get(1)
        .map(|s| s.as_str())
        .unwrap_or("batch_summary.csv");

    let coefficient = env::var("POWER_LAW_COEFFICIENT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_POWER_LAW_COEFFICIENT);
    let power_law_default = PowerLawModel::with_coefficient(coefficient, default_as_of());

    let start = Instant::now();
    let scenarios = load_scenarios(input_path, &power_law_default)
        .map_err(|e| anyhow!("{}", e))
        .with_context(|| format!("Failed to load scenarios from {}", input_path))?;
    if !json_output {
        println!("Loaded {} scenarios in {:?}", scenarios.len(), start.elapsed());
    }

    let config = ProjectionConfig::from_env();
    config.validate().context("Invalid lender terms")?;
    let runner = ScenarioRunner::with_config(config);

    let proj_start = Instant::now();
    let outcomes = runner.run_batch(&scenarios);
    let failed = outcomes.iter().filter(|o| o.outcome.is_err()).count();

    if json_output {
        let response = BatchResponse {
            scenario_count: outcomes.len(),
            succeeded: outcomes.len() - failed,
            failed,
            fee_rate_percent: runner.config().fee_rate_percent,
            collateral_ratio: runner.config().collateral_ratio,
            scenarios: outcomes
                .iter()
                .map(|o| {
                    serde_json::json!({
                        "scenario_id": o.scenario_id,
                        "outcome": outcome_json(&o.outcome),
                    })
                })
                .collect(),
            execution_time_ms: start.elapsed().as_millis() as u64,
        };
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("Projections complete in {:?}", proj_start.elapsed());

    let file = File::create(output_path)
        .with_context(|| format!("Failed to create output file {}", output_path))?;
    write_summary_csv(file, &outcomes).map_err(|e| anyhow!("{}", e))?;

    println!("\nSummary:");
    println!("  Scenarios: {}", outcomes.len());
    println!("  Succeeded: {}", outcomes.len() - failed);
    println!("  Failed:    {}", failed);
    for o in outcomes.iter().filter(|o| o.outcome.is_err()) {
        if let Err(e) = &o.outcome {
            println!("    {}: {}", o.scenario_id, e);
        }
    }
    println!("\nResults written to: {}", output_path);

    Ok(())
}
