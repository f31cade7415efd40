use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::presets::preset_for;
use super::{ScenarioKind, ScenarioSelection};
use crate::amortization::params::CalculationParameters;
use crate::amortization::schedule::{compute_schedule, ScheduleSummary};
use crate::error::ProjectionError;
use crate::strategies::{evaluate_with_schedule, StrategyKind, StrategyParameters, StrategyResult};
use crate::types::*;
use crate::ProjectionResult;

/// Label carried by every cross-strategy summary.
pub const AGGREGATION_POLICY: &str = "most_favorable_metric_wins";

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Explicit strategy parameters for one scenario; replaces the preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOverride {
    pub scenario: ScenarioKind,
    pub parameters: StrategyParameters,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionInput {
    pub parameters: CalculationParameters,
    pub strategies: Vec<StrategyKind>,
    #[serde(default)]
    pub selection: ScenarioSelection,
    #[serde(default)]
    pub overrides: Vec<ScenarioOverride>,
}

impl ProjectionInput {
    fn parameters_for(&self, strategy: StrategyKind, scenario: ScenarioKind) -> (StrategyParameters, bool) {
        match self
            .overrides
            .iter()
            .find(|o| o.scenario == scenario && o.parameters.kind() == strategy)
        {
            Some(o) => (o.parameters.clone(), false),
            None => (preset_for(strategy, scenario, &self.parameters), true),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Result of one (strategy, scenario) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StrategyOutcome {
    Computed(StrategyResult),
    Failed { reason: String },
}

impl StrategyOutcome {
    pub fn computed(&self) -> Option<&StrategyResult> {
        match self {
            StrategyOutcome::Computed(r) => Some(r),
            StrategyOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionEntry {
    pub strategy: StrategyKind,
    pub scenario: ScenarioKind,
    /// True when the parameters came from the scenario presets
    pub from_preset: bool,
    pub parameters: StrategyParameters,
    pub outcome: StrategyOutcome,
}

/// A metric value and the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPick<T> {
    pub value: T,
    pub strategy: StrategyKind,
}

/// Best value of each metric across strategies for one scenario. A display
/// view only: each metric may come from a different strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MostFavorableSummary {
    pub scenario: ScenarioKind,
    pub policy: String,
    pub roi: Option<MetricPick<Percent>>,
    /// Only converged IRRs compete
    pub irr: Option<MetricPick<Percent>>,
    /// Only recovered paybacks compete
    pub payback_months: Option<MetricPick<Month>>,
    pub net_profit: Option<MetricPick<Money>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionOutput {
    /// One entry per (scenario, strategy), scenarios outermost
    pub entries: Vec<ProjectionEntry>,
    /// One summary per scenario
    pub summaries: Vec<MostFavorableSummary>,
    pub schedule_summary: ScheduleSummary,
    pub schedule_incomplete: bool,
}

impl ProjectionOutput {
    pub fn entry(&self, strategy: StrategyKind, scenario: ScenarioKind) -> Option<&ProjectionEntry> {
        self.entries
            .iter()
            .find(|e| e.strategy == strategy && e.scenario == scenario)
    }

    pub fn summary(&self, scenario: ScenarioKind) -> Option<&MostFavorableSummary> {
        self.summaries.iter().find(|s| s.scenario == scenario)
    }
}

// ---------------------------------------------------------------------------
// Orchestration
// ---------------------------------------------------------------------------

/// Run every requested strategy under every selected scenario against one
/// shared schedule. A failing pair is recorded in its entry and never aborts
/// the batch.
pub fn run_projection(input: &ProjectionInput) -> ProjectionResult<ComputationOutput<ProjectionOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.strategies.is_empty() {
        return Err(ProjectionError::InsufficientData(
            "At least one strategy is required".into(),
        ));
    }
    let mut strategies: Vec<StrategyKind> = Vec::with_capacity(input.strategies.len());
    for s in &input.strategies {
        if !strategies.contains(s) {
            strategies.push(*s);
        }
    }

    let scenarios = input.selection.resolve(&mut warnings);
    let schedule = compute_schedule(&input.parameters, &mut warnings)?;

    tracing::debug!(
        strategies = strategies.len(),
        scenarios = scenarios.len(),
        "running projection"
    );

    let mut entries = Vec::with_capacity(strategies.len() * scenarios.len());
    for &scenario in &scenarios {
        for &strategy in &strategies {
            let (parameters, from_preset) = input.parameters_for(strategy, scenario);
            let mut pair_warnings = Vec::new();
            let outcome = match evaluate_with_schedule(
                &input.parameters,
                &schedule,
                &parameters,
                &mut pair_warnings,
            ) {
                Ok(result) => StrategyOutcome::Computed(result),
                Err(e) => {
                    push_warning(
                        &mut pair_warnings,
                        format!("Strategy could not be computed: {e}"),
                    );
                    StrategyOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            warnings.extend(
                pair_warnings
                    .into_iter()
                    .map(|w| format!("[{} / {}] {w}", strategy.label(), scenario.label())),
            );
            entries.push(ProjectionEntry {
                strategy,
                scenario,
                from_preset,
                parameters,
                outcome,
            });
        }
    }

    let summaries = scenarios
        .iter()
        .map(|&scenario| most_favorable(scenario, &entries))
        .collect();

    let output = ProjectionOutput {
        entries,
        summaries,
        schedule_summary: schedule.summary,
        schedule_incomplete: schedule.incomplete,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Strategy x scenario projection over a shared amortization schedule; \
         cross-strategy summary uses the most-favorable-metric-wins policy",
        &serde_json::json!({
            "strategies": strategies,
            "scenarios": scenarios,
            "aggregation_policy": AGGREGATION_POLICY,
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Best roi, irr and net profit (max) and payback (min) across the computed
/// strategies of one scenario. Ties keep the earlier strategy.
pub fn most_favorable(scenario: ScenarioKind, entries: &[ProjectionEntry]) -> MostFavorableSummary {
    let mut summary = MostFavorableSummary {
        scenario,
        policy: AGGREGATION_POLICY.to_string(),
        roi: None,
        irr: None,
        payback_months: None,
        net_profit: None,
    };

    let computed = entries
        .iter()
        .filter(|e| e.scenario == scenario)
        .filter_map(|e| e.outcome.computed().map(|r| (e.strategy, r)));

    for (strategy, r) in computed {
        let m = &r.metrics;
        keep_if(&mut summary.roi, m.roi, strategy, |new, old| new > old);
        if m.irr_converged {
            keep_if(&mut summary.irr, m.irr, strategy, |new, old| new > old);
        }
        if let Some(p) = m.payback_months {
            keep_if(&mut summary.payback_months, p, strategy, |new, old| new < old);
        }
        keep_if(&mut summary.net_profit, m.net_profit, strategy, |new, old| new > old);
    }

    summary
}

fn keep_if<T: Copy>(
    slot: &mut Option<MetricPick<T>>,
    value: T,
    strategy: StrategyKind,
    better: impl Fn(T, T) -> bool,
) {
    let replace = match slot {
        Some(current) => better(value, current.value),
        None => true,
    };
    if replace {
        *slot = Some(MetricPick { value, strategy });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::params::{DownPayment, PartitioningMode};
    use crate::correction::accumulator::CorrectionRates;
    use crate::returns::metrics::ReturnMetrics;
    use crate::strategies::future_sale::FutureSaleDetails;
    use crate::strategies::StrategyDetails;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn calc() -> CalculationParameters {
        CalculationParameters {
            property_price: dec!(500000),
            discount: Decimal::ZERO,
            down_payment: DownPayment::Value(dec!(100000)),
            delivery_months: 36,
            payment_months: 120,
            correction: CorrectionRates::flat(dec!(0.5)),
            partitioning: PartitioningMode::default(),
        }
    }

    fn entry(strategy: StrategyKind, roi: Percent, payback: Option<Month>) -> ProjectionEntry {
        ProjectionEntry {
            strategy,
            scenario: ScenarioKind::Baseline,
            from_preset: true,
            parameters: preset_for(strategy, ScenarioKind::Baseline, &calc()),
            outcome: StrategyOutcome::Computed(StrategyResult {
                strategy,
                metrics: ReturnMetrics {
                    roi,
                    irr: roi / dec!(10),
                    irr_converged: true,
                    annualized_irr: None,
                    payback_months: payback,
                    net_profit: roi * dec!(1000),
                    total_invested: dec!(100000),
                    total_returned: dec!(100000) + roi * dec!(1000),
                },
                cash_flow: vec![],
                events: vec![],
                details: StrategyDetails::FutureSale(FutureSaleDetails::default()),
            }),
        }
    }

    #[test]
    fn test_most_favorable_takes_max_roi() {
        let entries = vec![
            entry(StrategyKind::FutureSale, dec!(22), Some(60)),
            entry(StrategyKind::RentalYield, dec!(18), Some(40)),
        ];
        let s = most_favorable(ScenarioKind::Baseline, &entries);
        let roi = s.roi.unwrap();
        assert_eq!(roi.value, dec!(22));
        assert_eq!(roi.strategy, StrategyKind::FutureSale);
        // Payback comes from a different strategy
        let payback = s.payback_months.unwrap();
        assert_eq!(payback.value, 40);
        assert_eq!(payback.strategy, StrategyKind::RentalYield);
        assert_eq!(s.policy, AGGREGATION_POLICY);
    }

    #[test]
    fn test_failed_entries_do_not_compete() {
        let mut failed = entry(StrategyKind::AssetAppreciation, dec!(90), None);
        failed.outcome = StrategyOutcome::Failed {
            reason: "bad input".into(),
        };
        let entries = vec![failed, entry(StrategyKind::RentalYield, dec!(18), None)];
        let s = most_favorable(ScenarioKind::Baseline, &entries);
        assert_eq!(s.roi.unwrap().value, dec!(18));
        assert!(s.payback_months.is_none());
    }

    #[test]
    fn test_summary_leaves_entries_untouched() {
        let entries = vec![
            entry(StrategyKind::FutureSale, dec!(22), Some(60)),
            entry(StrategyKind::RentalYield, dec!(18), Some(40)),
        ];
        let before = entries.clone();
        let _ = most_favorable(ScenarioKind::Baseline, &entries);
        assert_eq!(entries, before);
    }

    #[test]
    fn test_run_projection_all_scenarios() {
        let input = ProjectionInput {
            parameters: calc(),
            strategies: StrategyKind::ALL.to_vec(),
            selection: ScenarioSelection::AllScenarios,
            overrides: vec![],
        };
        let out = run_projection(&input).unwrap().result;
        assert_eq!(out.entries.len(), 9);
        assert_eq!(out.summaries.len(), 3);
        assert!(out.entries.iter().all(|e| e.from_preset));
        assert!(out.entries.iter().all(|e| e.outcome.computed().is_some()));
    }

    #[test]
    fn test_failed_pair_does_not_abort_batch() {
        let input = ProjectionInput {
            parameters: calc(),
            strategies: vec![StrategyKind::AssetAppreciation, StrategyKind::RentalYield],
            selection: ScenarioSelection::default(),
            overrides: vec![ScenarioOverride {
                scenario: ScenarioKind::Baseline,
                parameters: StrategyParameters::AssetAppreciation(
                    crate::strategies::asset_appreciation::AssetAppreciationParams {
                        years: 0,
                        annual_rate: dec!(10),
                        maintenance_costs: Decimal::ZERO,
                    },
                ),
            }],
        };
        let out = run_projection(&input).unwrap();
        let failed = out
            .result
            .entry(StrategyKind::AssetAppreciation, ScenarioKind::Baseline)
            .unwrap();
        assert!(!failed.from_preset);
        assert!(matches!(failed.outcome, StrategyOutcome::Failed { .. }));
        let rental = out
            .result
            .entry(StrategyKind::RentalYield, ScenarioKind::Baseline)
            .unwrap();
        assert!(rental.outcome.computed().is_some());
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn test_empty_strategies_rejected() {
        let input = ProjectionInput {
            parameters: calc(),
            strategies: vec![],
            selection: ScenarioSelection::default(),
            overrides: vec![],
        };
        assert!(run_projection(&input).is_err());
    }
}
