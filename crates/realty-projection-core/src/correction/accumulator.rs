use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::index::CorrectionIndex;
use crate::error::ProjectionError;
use crate::types::{pct_to_rate, with_metadata, ComputationOutput, Month, Percent};
use crate::ProjectionResult;

/// Monthly correction rates either side of the delivery boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionRates {
    /// Monthly rate (%) applied up to and including the delivery month
    pub rate_before_delivery: Percent,
    /// Monthly rate (%) applied after the delivery month
    pub rate_after_delivery: Percent,
    /// Index the rates were resolved from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<CorrectionIndex>,
}

impl CorrectionRates {
    /// Same rate on both sides of delivery.
    pub fn flat(rate: Percent) -> Self {
        CorrectionRates {
            rate_before_delivery: rate,
            rate_after_delivery: rate,
            index: None,
        }
    }

    pub fn validate(&self) -> ProjectionResult<()> {
        if self.rate_before_delivery < Decimal::ZERO {
            return Err(ProjectionError::invalid(
                "rate_before_delivery",
                "Correction rate cannot be negative",
            ));
        }
        if self.rate_after_delivery < Decimal::ZERO {
            return Err(ProjectionError::invalid(
                "rate_after_delivery",
                "Correction rate cannot be negative",
            ));
        }
        Ok(())
    }

    /// Instantaneous rate for a month. The regime switches once, after the
    /// delivery month.
    pub fn rate_for_month(&self, month: Month, delivery_month: Month) -> Percent {
        if month <= delivery_month {
            self.rate_before_delivery
        } else {
            self.rate_after_delivery
        }
    }
}

/// Correction state at the end of one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionStep {
    pub month: Month,
    /// Rate applied in this month (%)
    pub rate: Percent,
    /// Running sum of monthly rates through this month (%)
    pub accumulated: Percent,
    /// 1 + accumulated / 100
    pub factor: Decimal,
}

impl CorrectionStep {
    /// Month 0 carries no correction.
    pub fn origin() -> Self {
        CorrectionStep {
            month: 0,
            rate: Decimal::ZERO,
            accumulated: Decimal::ZERO,
            factor: Decimal::ONE,
        }
    }
}

/// Walks months 1, 2, ... summing monthly rates (additive, not compounded).
#[derive(Debug, Clone)]
pub struct CorrectionAccumulator<'a> {
    rates: &'a CorrectionRates,
    delivery_month: Month,
    month: Month,
    accumulated: Percent,
}

impl<'a> CorrectionAccumulator<'a> {
    pub fn new(rates: &'a CorrectionRates, delivery_month: Month) -> Self {
        CorrectionAccumulator {
            rates,
            delivery_month,
            month: 0,
            accumulated: Decimal::ZERO,
        }
    }
}

impl Iterator for CorrectionAccumulator<'_> {
    type Item = CorrectionStep;

    fn next(&mut self) -> Option<Self::Item> {
        self.month = self.month.checked_add(1)?;
        let rate = self.rates.rate_for_month(self.month, self.delivery_month);
        self.accumulated += rate;
        Some(CorrectionStep {
            month: self.month,
            rate,
            accumulated: self.accumulated,
            factor: Decimal::ONE + pct_to_rate(self.accumulated),
        })
    }
}

/// Correction steps for months `0..=horizon`, month 0 first.
pub fn correction_steps(
    rates: &CorrectionRates,
    delivery_month: Month,
    horizon: Month,
) -> Vec<CorrectionStep> {
    std::iter::once(CorrectionStep::origin())
        .chain(CorrectionAccumulator::new(rates, delivery_month).take(horizon as usize))
        .collect()
}

/// Input for a standalone correction table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionTableInput {
    pub rates: CorrectionRates,
    pub delivery_month: Month,
    pub horizon_months: Month,
}

/// Month-by-month correction table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionTableOutput {
    pub steps: Vec<CorrectionStep>,
    pub final_accumulated: Percent,
    pub final_factor: Decimal,
}

/// Build the correction table for display, validating rates first.
pub fn correction_table(
    input: &CorrectionTableInput,
) -> ProjectionResult<ComputationOutput<CorrectionTableOutput>> {
    let start = Instant::now();
    input.rates.validate()?;

    let steps = correction_steps(&input.rates, input.delivery_month, input.horizon_months);
    let last = steps.last().cloned().unwrap_or_else(CorrectionStep::origin);

    let output = CorrectionTableOutput {
        final_accumulated: last.accumulated,
        final_factor: last.factor,
        steps,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Additive monetary correction (sum of monthly rates, regime switch after delivery)",
        &serde_json::json!({
            "rate_before_delivery": input.rates.rate_before_delivery.to_string(),
            "rate_after_delivery": input.rates.rate_after_delivery.to_string(),
            "delivery_month": input.delivery_month,
            "index": input.rates.index.map(|i| i.label()),
        }),
        Vec::new(),
        elapsed,
        output,
    ))
}
