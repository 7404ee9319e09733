//! Scenario runner for batch projections
//!
//! Holds one set of lender terms and runs many independent projections
//! against it, fanning out over rayon's thread pool.

use rayon::prelude::*;

use crate::error::ProjectionOutcome;
use crate::inputs::{ProjectionInput, ScenarioInput};
use crate::projection::{CycleProjector, ProjectionConfig, ProjectionResult};

/// Outcome of one scenario in a batch
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub scenario_id: String,
    pub input: ProjectionInput,
    pub outcome: ProjectionOutcome<ProjectionResult>,
}

/// Runs projections with shared lender terms
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::new();
/// let base = ProjectionInput::default();
///
/// for outcome in runner.sweep_buy_percent(&base, &[0.0, 25.0, 50.0]) {
///     println!("{}: {:?}", outcome.scenario_id, outcome.outcome.map(|r| r.gained_asset));
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScenarioRunner {
    projector: CycleProjector,
}

impl ScenarioRunner {
    /// Create runner with default lender terms
    pub fn new() -> Self {
        Self::default()
    }

    /// Create runner with lender terms read from the environment
    pub fn from_env() -> Self {
        Self::with_config(ProjectionConfig::from_env())
    }

    pub fn with_config(config: ProjectionConfig) -> Self {
        Self {
            projector: CycleProjector::new(config),
        }
    }

    /// Run a single projection
    pub fn run(&self, input: &ProjectionInput) -> ProjectionOutcome<ProjectionResult> {
        self.projector.project(input)
    }

    /// Run every scenario in parallel; outcomes keep input order
    pub fn run_batch(&self, scenarios: &[ScenarioInput]) -> Vec<ScenarioOutcome> {
        scenarios
            .par_iter()
            .map(|scenario| ScenarioOutcome {
                scenario_id: scenario.scenario_id.clone(),
                input: scenario.input.clone(),
                outcome: self.projector.project(&scenario.input),
            })
            .collect()
    }

    /// Vary the buy percentage of `base`
    pub fn sweep_buy_percent(&self, base: &ProjectionInput, buy_percents: &[f64]) -> Vec<ScenarioOutcome> {
        let scenarios: Vec<ScenarioInput> = buy_percents
            .iter()
            .map(|&buy_percent| {
                ScenarioInput::new(format!("buy_{}", buy_percent), ProjectionInput { buy_percent, ..base.clone() })
            })
            .collect();
        self.run_batch(&scenarios)
    }

    /// Vary the number of cycles of `base`
    pub fn sweep_cycle_count(&self, base: &ProjectionInput, cycle_counts: &[u32]) -> Vec<ScenarioOutcome> {
        let scenarios: Vec<ScenarioInput> = cycle_counts
            .iter()
            .map(|&cycle_count| {
                ScenarioInput::new(format!("cycles_{}", cycle_count), ProjectionInput { cycle_count, ..base.clone() })
            })
            .collect();
        self.run_batch(&scenarios)
    }

    pub fn config(&self) -> &ProjectionConfig {
        self.projector.config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProjectionError;

    fn base() -> ProjectionInput {
        ProjectionInput {
            initial_holdings: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_batch_keeps_order_and_matches_single_runs() {
        let runner = ScenarioRunner::new();
        let scenarios: Vec<ScenarioInput> = (1..=12)
            .map(|n| ScenarioInput::new(format!("s{}", n), ProjectionInput { cycle_count: n, ..base() }))
            .collect();

        let outcomes = runner.run_batch(&scenarios);
        assert_eq!(outcomes.len(), 12);

        for (scenario, outcome) in scenarios.iter().zip(&outcomes) {
            assert_eq!(outcome.scenario_id, scenario.scenario_id);
            assert_eq!(outcome.outcome, runner.run(&scenario.input));
        }
    }

    #[test]
    fn test_failures_stay_per_scenario() {
        let runner = ScenarioRunner::new();
        let outcomes = runner.sweep_cycle_count(&base(), &[3, 31]);

        assert!(outcomes[0].outcome.is_ok());
        assert!(matches!(
            outcomes[1].outcome,
            Err(ProjectionError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_buy_percent_sweep() {
        let runner = ScenarioRunner::new();
        let outcomes = runner.sweep_buy_percent(&ProjectionInput { cycle_count: 3, ..base() }, &[0.0, 25.0, 50.0]);

        let bought: Vec<f64> = outcomes
            .iter()
            .map(|o| o.outcome.as_ref().unwrap().summary().total_asset_bought)
            .collect();

        // Buying a larger share of each rolled loan buys more asset
        assert!(bought[0] < bought[1]);
        assert!(bought[1] < bought[2]);
        assert_eq!(outcomes[2].scenario_id, "buy_50");
    }
}
