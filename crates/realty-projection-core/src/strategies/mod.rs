pub mod asset_appreciation;
pub mod future_sale;
pub mod rental_yield;

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::params::CalculationParameters;
use crate::amortization::schedule::{compute_schedule, AmortizationSchedule};
use crate::error::ProjectionError;
use crate::returns::metrics::{compute_return_metrics_with_totals, GrossTotals, ReturnMetrics};
use crate::types::*;
use crate::ProjectionResult;

use asset_appreciation::{AssetAppreciationDetails, AssetAppreciationParams};
use future_sale::{FutureSaleDetails, FutureSaleParams};
use rental_yield::{RentalYieldDetails, RentalYieldParams};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The three ways an investor can realise a return on the unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    FutureSale,
    AssetAppreciation,
    RentalYield,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::FutureSale,
        StrategyKind::AssetAppreciation,
        StrategyKind::RentalYield,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StrategyKind::FutureSale => "Future sale",
            StrategyKind::AssetAppreciation => "Asset appreciation",
            StrategyKind::RentalYield => "Rental yield",
        }
    }
}

/// Strategy-specific inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum StrategyParameters {
    FutureSale(FutureSaleParams),
    AssetAppreciation(AssetAppreciationParams),
    RentalYield(RentalYieldParams),
}

impl StrategyParameters {
    pub fn kind(&self) -> StrategyKind {
        match self {
            StrategyParameters::FutureSale(_) => StrategyKind::FutureSale,
            StrategyParameters::AssetAppreciation(_) => StrategyKind::AssetAppreciation,
            StrategyParameters::RentalYield(_) => StrategyKind::RentalYield,
        }
    }
}

/// Strategy-specific breakdown behind the cash flows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum StrategyDetails {
    FutureSale(FutureSaleDetails),
    AssetAppreciation(AssetAppreciationDetails),
    RentalYield(RentalYieldDetails),
}

/// Signed monthly cash flows assembled for one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyCashFlows {
    /// Dense vector indexed by month; outflows negative
    pub flows: Vec<Money>,
    /// The same flows as labelled, non-zero events
    pub events: Vec<CashFlowEvent>,
    pub details: StrategyDetails,
}

/// Computed result for one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyResult {
    pub strategy: StrategyKind,
    #[serde(flatten)]
    pub metrics: ReturnMetrics,
    pub cash_flow: Vec<Money>,
    pub events: Vec<CashFlowEvent>,
    pub details: StrategyDetails,
}

/// Input for a single-strategy evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyInput {
    pub parameters: CalculationParameters,
    pub strategy: StrategyParameters,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the schedule, assemble the strategy's cash flows and derive its
/// return metrics.
pub fn evaluate_strategy(input: &StrategyInput) -> ProjectionResult<ComputationOutput<StrategyResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let schedule = compute_schedule(&input.parameters, &mut warnings)?;
    let result = evaluate_with_schedule(&input.parameters, &schedule, &input.strategy, &mut warnings)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        &format!("{} strategy: signed monthly cash flows and return metrics", result.strategy.label()),
        &input.strategy,
        warnings,
        elapsed,
        result,
    ))
}

/// Evaluate a strategy against an already-built schedule.
pub fn evaluate_with_schedule(
    calc: &CalculationParameters,
    schedule: &AmortizationSchedule,
    strategy: &StrategyParameters,
    warnings: &mut Vec<String>,
) -> ProjectionResult<StrategyResult> {
    let assembled = assemble_cash_flows(calc, schedule, strategy, warnings)?;
    let totals = GrossTotals::from_amounts(assembled.events.iter().map(|e| &e.amount))?;
    let metrics = compute_return_metrics_with_totals(&assembled.flows, totals, warnings)?;

    Ok(StrategyResult {
        strategy: strategy.kind(),
        metrics,
        cash_flow: assembled.flows,
        events: assembled.events,
        details: assembled.details,
    })
}

/// Dispatch to the strategy's cash-flow assembler.
pub fn assemble_cash_flows(
    calc: &CalculationParameters,
    schedule: &AmortizationSchedule,
    strategy: &StrategyParameters,
    warnings: &mut Vec<String>,
) -> ProjectionResult<StrategyCashFlows> {
    match strategy {
        StrategyParameters::FutureSale(p) => future_sale::assemble(calc, schedule, p, warnings),
        StrategyParameters::AssetAppreciation(p) => asset_appreciation::assemble(calc, p),
        StrategyParameters::RentalYield(p) => rental_yield::assemble(calc, p),
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Accumulates signed flows into a dense month vector plus labelled events.
#[derive(Debug, Clone)]
pub(crate) struct CashFlowLedger {
    flows: Vec<Money>,
    events: Vec<CashFlowEvent>,
}

impl CashFlowLedger {
    pub(crate) fn new(horizon: Month) -> Self {
        CashFlowLedger {
            flows: vec![Decimal::ZERO; horizon as usize + 1],
            events: Vec::new(),
        }
    }

    /// Post an amount at `month`. Months past the horizon are ignored by
    /// construction: callers size the ledger to their horizon.
    pub(crate) fn post(&mut self, month: Month, label: &str, amount: Money) -> ProjectionResult<()> {
        if amount.is_zero() {
            return Ok(());
        }
        if let Some(slot) = self.flows.get_mut(month as usize) {
            *slot = slot
                .checked_add(amount)
                .ok_or_else(|| ProjectionError::overflow(format!("Cash flow at month {month}")))?;
            self.events.push(CashFlowEvent {
                month,
                label: label.to_string(),
                amount,
            });
        }
        Ok(())
    }

    pub(crate) fn finish(self, details: StrategyDetails) -> StrategyCashFlows {
        StrategyCashFlows {
            flows: self.flows,
            events: self.events,
            details,
        }
    }
}

/// Longest horizon a strategy may project over (100 years).
pub const MAX_HORIZON_MONTHS: Month = 1200;

/// `years * 12`, bounded by [`MAX_HORIZON_MONTHS`].
pub(crate) fn horizon_months(field: &str, years: u32) -> ProjectionResult<Month> {
    match years.checked_mul(12) {
        Some(months) if months <= MAX_HORIZON_MONTHS => Ok(months),
        _ => Err(ProjectionError::invalid(
            field,
            format!("Horizon cannot exceed {} years", MAX_HORIZON_MONTHS / 12),
        )),
    }
}

/// `value * factor`, failing instead of panicking when out of range.
pub(crate) fn grow(value: Money, factor: Decimal, context: &str) -> ProjectionResult<Money> {
    value
        .checked_mul(factor)
        .ok_or_else(|| ProjectionError::overflow(context))
}

/// `value * (1 + pct/100)^(months/12)`, exact when `months` is whole years.
pub(crate) fn compound_annual(value: Money, pct: Percent, months: Month) -> ProjectionResult<Money> {
    let growth = Decimal::ONE + pct_to_rate(pct);
    let factor = if months % 12 == 0 {
        growth.checked_powi((months / 12) as i64)
    } else {
        growth.checked_powd(Decimal::from(months) / Decimal::from(12))
    };
    factor
        .and_then(|f| value.checked_mul(f))
        .ok_or_else(|| ProjectionError::overflow("Compounded value"))
}

pub(crate) fn require_non_negative(field: &str, value: Decimal) -> ProjectionResult<()> {
    if value < Decimal::ZERO {
        return Err(ProjectionError::invalid(
            field,
            "Value cannot be negative",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_compound_whole_years() {
        assert_eq!(compound_annual(dec!(100), dec!(10), 24).unwrap(), dec!(121));
    }

    #[test]
    fn test_compound_fractional_years() {
        let v = compound_annual(dec!(100), dec!(21), 6).unwrap();
        assert!((v - dec!(110)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_ledger_skips_zero_and_out_of_range() {
        let mut ledger = CashFlowLedger::new(2);
        ledger.post(0, "a", dec!(-10)).unwrap();
        ledger.post(1, "zero", Decimal::ZERO).unwrap();
        ledger.post(5, "late", dec!(99)).unwrap();
        ledger.post(2, "b", dec!(15)).unwrap();
        ledger.post(2, "c", dec!(-5)).unwrap();
        let cf = ledger.finish(StrategyDetails::AssetAppreciation(
            AssetAppreciationDetails::default(),
        ));
        assert_eq!(cf.flows, vec![dec!(-10), Decimal::ZERO, dec!(10)]);
        assert_eq!(cf.events.len(), 3);
    }

    #[test]
    fn test_compound_overflow_is_an_error() {
        let result = compound_annual(dec!(1_000_000), dec!(400), 600);
        assert!(matches!(result, Err(ProjectionError::FinancialImpossibility(_))));
    }

    #[test]
    fn test_ledger_overflow_is_an_error() {
        let mut ledger = CashFlowLedger::new(1);
        ledger.post(1, "a", Decimal::MAX).unwrap();
        assert!(ledger.post(1, "b", Decimal::MAX).is_err());
    }

    #[test]
    fn test_horizon_is_bounded() {
        assert_eq!(horizon_months("years", 5).unwrap(), 60);
        assert!(horizon_months("years", 101).is_err());
        assert!(horizon_months("years", u32::MAX).is_err());
    }

    #[test]
    fn test_strategy_parameters_tagging() {
        let json = r#"{"strategy":"asset_appreciation","years":5,"annual_rate":"10"}"#;
        let p: StrategyParameters = serde_json::from_str(json).unwrap();
        assert_eq!(p.kind(), StrategyKind::AssetAppreciation);
    }
}
