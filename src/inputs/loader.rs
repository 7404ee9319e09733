//! Load projection scenarios from CSV and single inputs from JSON

use super::{ProjectionInput, ScenarioInput, DEFAULT_PRICE_GROWTH_PERCENT};
use crate::growth::{GrowthPolicy, PowerLawModel};
use crate::output::Currency;
use csv::Reader;
use std::error::Error;
use std::fs::File;
use std::path::Path;

/// Raw CSV row of a scenario file
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    scenario_id: String,
    initial_holdings: f64,
    loan_amount: f64,
    cycle_duration_months: f64,
    annual_interest_rate_percent: f64,
    initial_asset_price: f64,
    #[serde(default)]
    growth_model: Option<String>,
    #[serde(default)]
    price_growth_percent: Option<f64>,
    cycle_count: u32,
    buy_percent: f64,
    #[serde(default)]
    currency: Option<String>,
}

impl CsvRow {
    fn to_scenario(self, power_law: &PowerLawModel) -> Result<ScenarioInput, Box<dyn Error>> {
        let growth_policy = match self.growth_model.as_deref().map(str::trim) {
            None | Some("") | Some("fixed") => GrowthPolicy::fixed(
                self.price_growth_percent.unwrap_or(DEFAULT_PRICE_GROWTH_PERCENT),
            ),
            Some("power_law") => GrowthPolicy::PowerLaw(power_law.clone()),
            Some(other) => return Err(format!("Unknown growth_model: {}", other).into()),
        };

        let currency = match self.currency.as_deref() {
            None | Some("") => Currency::default(),
            Some(code) => Currency::parse(code)
                .ok_or_else(|| format!("Unknown currency: {}", code))?,
        };

        Ok(ScenarioInput {
            scenario_id: self.scenario_id,
            input: ProjectionInput {
                initial_holdings: self.initial_holdings,
                loan_amount: self.loan_amount,
                cycle_duration_months: self.cycle_duration_months,
                annual_interest_rate_percent: self.annual_interest_rate_percent,
                initial_asset_price: self.initial_asset_price,
                growth_policy,
                cycle_count: self.cycle_count,
                buy_percent: self.buy_percent,
            },
            currency,
        })
    }
}

/// Load all scenarios from a CSV file.
///
/// Rows with `growth_model = power_law` share `power_law` as their model.
pub fn load_scenarios<P: AsRef<Path>>(
    path: P,
    power_law: &PowerLawModel,
) -> Result<Vec<ScenarioInput>, Box<dyn Error>> {
    let file = File::open(path)?;
    load_scenarios_from_reader(file, power_law)
}

/// Load scenarios from any reader (e.g., string buffer, stdin)
pub fn load_scenarios_from_reader<R: std::io::Read>(
    reader: R,
    power_law: &PowerLawModel,
) -> Result<Vec<ScenarioInput>, Box<dyn Error>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut scenarios = Vec::new();

    for result in csv_reader.deserialize() {
        let row: CsvRow = result?;
        scenarios.push(row.to_scenario(power_law)?);
    }

    Ok(scenarios)
}

/// Load a single projection input from a JSON file
pub fn load_input_json<P: AsRef<Path>>(path: P) -> Result<ProjectionInput, Box<dyn Error>> {
    let file = File::open(path)?;
    let input = serde_json::from_reader(std::io::BufReader::new(file))?;
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIOS: &str = "\
scenario_id,initial_holdings,loan_amount,cycle_duration_months,annual_interest_rate_percent,initial_asset_price,growth_model,price_growth_percent,cycle_count,buy_percent,currency
base,0.2,5000,12,10,100000,fixed,30,5,50,EUR
flat,1.0,10000,6,8,90000,fixed,0,10,25,usd
pl,0.5,2000,12,9,100000,power_law,,3,50,
implicit,0.3,3000,12,10,100000,,,2,0,
";

    #[test]
    fn test_load_scenarios() {
        let pl = PowerLawModel::default();
        let scenarios = load_scenarios_from_reader(SCENARIOS.as_bytes(), &pl).unwrap();
        assert_eq!(scenarios.len(), 4);

        assert_eq!(scenarios[0].scenario_id, "base");
        assert_eq!(scenarios[0].input, ProjectionInput::default());

        let flat = &scenarios[1].input;
        assert_eq!(flat.growth_policy, GrowthPolicy::fixed(0.0));
        assert_eq!(scenarios[1].currency, Currency::Usd);
        assert_eq!(scenarios[3].currency, Currency::Eur);
        assert_eq!(flat.cycle_count, 10);

        assert_eq!(scenarios[2].input.growth_policy, GrowthPolicy::PowerLaw(pl));

        let implicit = &scenarios[3].input;
        assert_eq!(implicit.growth_policy, GrowthPolicy::fixed(DEFAULT_PRICE_GROWTH_PERCENT));
        assert_eq!(implicit.buy_percent, 0.0);
    }

    #[test]
    fn test_unknown_growth_model_rejected() {
        let csv = "\
scenario_id,initial_holdings,loan_amount,cycle_duration_months,annual_interest_rate_percent,initial_asset_price,growth_model,price_growth_percent,cycle_count,buy_percent,currency
x,0.2,5000,12,10,100000,logistic,30,5,50,EUR
";
        let err = load_scenarios_from_reader(csv.as_bytes(), &PowerLawModel::default()).unwrap_err();
        assert!(err.to_string().contains("logistic"));
    }

    #[test]
    fn test_malformed_number_rejected() {
        let csv = "\
scenario_id,initial_holdings,loan_amount,cycle_duration_months,annual_interest_rate_percent,initial_asset_price,growth_model,price_growth_percent,cycle_count,buy_percent,currency
x,abc,5000,12,10,100000,fixed,30,5,50,EUR
";
        assert!(load_scenarios_from_reader(csv.as_bytes(), &PowerLawModel::default()).is_err());
    }
}
