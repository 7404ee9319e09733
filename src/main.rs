//! Collateral Cycle CLI
//!
//! Command-line interface for running cycle projections.
//! Lender terms can be overridden with FEE_RATE_PERCENT and COLLATERAL_RATIO.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::path::PathBuf;

use collateral_cycle::growth::{default_as_of, PowerLawModel};
use collateral_cycle::inputs::{
    load_input_json, DEFAULT_ANNUAL_INTEREST_RATE_PERCENT, DEFAULT_BUY_PERCENT,
    DEFAULT_CYCLE_COUNT, DEFAULT_CYCLE_DURATION_MONTHS, DEFAULT_INITIAL_ASSET_PRICE,
    DEFAULT_INITIAL_HOLDINGS, DEFAULT_LOAN_AMOUNT, DEFAULT_PRICE_GROWTH_PERCENT,
};
use collateral_cycle::output::{outcome_json, render_table, write_cycles_csv, write_samples_csv, Currency};
use collateral_cycle::{GrowthPolicy, ProjectionConfig, ProjectionInput, ScenarioRunner};

#[derive(Parser)]
#[command(name = "collateral-cycle", version, about = "Project collateralized-loan accumulation cycles")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one projection and print the cycle ledger
    Project {
        #[command(flatten)]
        input: InputArgs,

        /// Print the result (or error) as JSON
        #[arg(long)]
        json: bool,

        /// Write the cycle ledger to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write the holdings time series to this CSV file
        #[arg(long)]
        samples_csv: Option<PathBuf>,
    },
    /// Compare projections across buy percentages
    Sweep {
        #[command(flatten)]
        input: InputArgs,

        /// Buy percentages to compare
        #[arg(long, value_delimiter = ',', default_values_t = vec![0.0, 10.0, 20.0, 30.0, 40.0, 50.0])]
        buy: Vec<f64>,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Read the projection input from a JSON file instead of flags
    #[arg(long)]
    input: Option<PathBuf>,

    /// Asset units held before the first cycle
    #[arg(long, default_value_t = DEFAULT_INITIAL_HOLDINGS)]
    holdings: f64,

    /// Cycle 0 loan amount
    #[arg(long, default_value_t = DEFAULT_LOAN_AMOUNT)]
    loan: f64,

    /// Asset price at projection start
    #[arg(long, default_value_t = DEFAULT_INITIAL_ASSET_PRICE)]
    price: f64,

    /// Cycle length in months
    #[arg(long, default_value_t = DEFAULT_CYCLE_DURATION_MONTHS)]
    months: f64,

    /// Annual interest rate in percent
    #[arg(long, default_value_t = DEFAULT_ANNUAL_INTEREST_RATE_PERCENT)]
    interest: f64,

    /// Fixed annual price growth in percent
    #[arg(long, default_value_t = DEFAULT_PRICE_GROWTH_PERCENT)]
    growth: f64,

    /// Number of loan cycles
    #[arg(long, default_value_t = DEFAULT_CYCLE_COUNT)]
    cycles: u32,

    /// Share of each rolled loan spent on the asset, in percent
    #[arg(long, default_value_t = DEFAULT_BUY_PERCENT)]
    buy_percent: f64,

    /// Display currency (EUR or USD)
    #[arg(long, default_value = "EUR")]
    currency: String,

    /// Use the power-law price model instead of fixed growth
    #[arg(long)]
    power_law: bool,

    /// Observed market price used to calibrate the power law
    #[arg(long, requires = "power_law")]
    market_price: Option<f64>,

    /// Date of the market observation (YYYY-MM-DD)
    #[arg(long, requires = "power_law")]
    as_of: Option<NaiveDate>,
}

impl InputArgs {
    fn currency(&self) -> Result<Currency> {
        match Currency::parse(&self.currency) {
            Some(c) => Ok(c),
            None => bail!("Unknown currency '{}' (expected EUR or USD)", self.currency),
        }
    }

    fn build(&self) -> Result<ProjectionInput> {
        if let Some(path) = &self.input {
            return load_input_json(path)
                .map_err(|e| anyhow::anyhow!("{}", e))
                .with_context(|| format!("Failed to load input from {}", path.display()));
        }

        let mut initial_asset_price = self.price;
        let growth_policy = if self.power_law {
            let as_of = self.as_of.unwrap_or_else(default_as_of);
            let model = match self.market_price {
                Some(observed) => {
                    let mut model = PowerLawModel::default();
                    model.as_of = as_of;
                    if model.calibrate(observed, as_of) {
                        initial_asset_price = observed;
                    }
                    model
                }
                None => PowerLawModel { as_of, ..PowerLawModel::default() },
            };
            GrowthPolicy::PowerLaw(model)
        } else {
            GrowthPolicy::fixed(self.growth)
        };

        Ok(ProjectionInput {
            initial_holdings: self.holdings,
            loan_amount: self.loan,
            cycle_duration_months: self.months,
            annual_interest_rate_percent: self.interest,
            initial_asset_price,
            growth_policy,
            cycle_count: self.cycles,
            buy_percent: self.buy_percent,
        })
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = ProjectionConfig::from_env();
    let runner = ScenarioRunner::with_config(config);

    match cli.command {
        Commands::Project { input, json, csv, samples_csv } => {
            let currency = input.currency()?;
            let input = input.build()?;
            let outcome = runner.run(&input);

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome_json(&outcome))?);
                return Ok(());
            }

            let result = outcome.context("Projection failed")?;

            println!("Collateral Cycle v{}", env!("CARGO_PKG_VERSION"));
            println!("========================\n");
            println!("Initial holdings: {:.4}", input.initial_holdings);
            println!("Initial loan:     {:.2} {}", input.loan_amount, currency.symbol());
            println!("Growth:           {}", input.growth_policy.label());
            println!(
                "Lender terms:     fee {}%, collateral ratio {}",
                runner.config().fee_rate_percent,
                runner.config().collateral_ratio
            );
            println!();
            print!("{}", render_table(&result, currency));

            if let Some(path) = csv {
                let file = File::create(&path)
                    .with_context(|| format!("Unable to create {}", path.display()))?;
                write_cycles_csv(file, &result).map_err(|e| anyhow::anyhow!("{}", e))?;
                println!("\nCycle ledger written to: {}", path.display());
            }

            if let Some(path) = samples_csv {
                let file = File::create(&path)
                    .with_context(|| format!("Unable to create {}", path.display()))?;
                write_samples_csv(file, &result).map_err(|e| anyhow::anyhow!("{}", e))?;
                println!("Holdings series written to: {}", path.display());
            }
        }
        Commands::Sweep { input, buy, json } => {
            let currency = input.currency()?;
            let base = input.build()?;
            let outcomes = runner.sweep_buy_percent(&base, &buy);

            if json {
                let docs: Vec<serde_json::Value> = outcomes
                    .iter()
                    .map(|o| {
                        serde_json::json!({
                            "scenario_id": o.scenario_id,
                            "buy_percent": o.input.buy_percent,
                            "outcome": outcome_json(&o.outcome),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&docs)?);
                return Ok(());
            }

            let sym = currency.symbol();
            println!(
                "{:>6} {:>12} {:>12} {:>14} {:>14}",
                "Buy%", "Gained", "Holdings", "Total cost", "Liquidation"
            );
            println!("{}", "-".repeat(62));
            for o in &outcomes {
                match &o.outcome {
                    Ok(r) => println!(
                        "{:>6.1} {:>12.4} {:>12.4} {:>12.2} {} {:>12.2} {}",
                        o.input.buy_percent,
                        r.gained_asset,
                        r.holdings_after_repayment,
                        r.total_cost,
                        sym,
                        r.liquidation_price,
                        sym,
                    ),
                    Err(e) => println!("{:>6.1} failed: {}", o.input.buy_percent, e),
                }
            }
        }
    }

    Ok(())
}
