use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ProjectionError;
use crate::time_value;
use crate::types::*;
use crate::ProjectionResult;

/// Input for return metrics on a monthly cash-flow vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnMetricsInput {
    /// Signed monthly cash flows (index 0 = month 0, outflows negative)
    pub cash_flows: Vec<Money>,
}

/// Return metrics derived from a cash-flow vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnMetrics {
    /// net_profit / total_invested * 100
    pub roi: Percent,
    /// Monthly IRR (%); 0 when the search did not converge
    pub irr: Percent,
    pub irr_converged: bool,
    /// Effective annual equivalent of the monthly IRR (%)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annualized_irr: Option<Percent>,
    /// First month cumulative cash flow is back at or above zero;
    /// `None` means not recovered within the horizon
    pub payback_months: Option<Month>,
    /// total_returned - total_invested
    pub net_profit: Money,
    /// Sum of outflows before same-month netting (as a positive amount)
    pub total_invested: Money,
    /// Sum of inflows before same-month netting
    pub total_returned: Money,
}

/// Calculate ROI, IRR, payback and net profit for a monthly cash-flow vector.
pub fn calculate_return_metrics(
    input: &ReturnMetricsInput,
) -> ProjectionResult<ComputationOutput<ReturnMetrics>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let metrics = compute_return_metrics(&input.cash_flows, &mut warnings)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Return metrics: ROI, monthly IRR (bisection), payback, net profit",
        &serde_json::json!({
            "periods": input.cash_flows.len(),
            "irr_bracket_pct": [
                rate_to_pct(time_value::IRR_LOWER_BOUND).to_string(),
                rate_to_pct(time_value::IRR_UPPER_BOUND).to_string(),
            ],
        }),
        warnings,
        elapsed,
        metrics,
    ))
}

/// Gross amounts paid in and received, before flows falling in the same
/// month are netted together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrossTotals {
    pub invested: Money,
    pub returned: Money,
}

impl GrossTotals {
    /// Negative amounts count as invested, positive ones as returned.
    pub fn from_amounts<'a, I>(amounts: I) -> ProjectionResult<Self>
    where
        I: IntoIterator<Item = &'a Money>,
    {
        let mut totals = GrossTotals {
            invested: Decimal::ZERO,
            returned: Decimal::ZERO,
        };
        for amount in amounts {
            let slot = if amount.is_sign_negative() {
                &mut totals.invested
            } else {
                &mut totals.returned
            };
            *slot = slot
                .checked_add(amount.abs())
                .ok_or_else(|| ProjectionError::overflow("Cash-flow total"))?;
        }
        Ok(totals)
    }
}

/// Metrics without the output envelope. IRR non-convergence is reported in
/// the result and as a warning, never as an error.
pub fn compute_return_metrics(
    cash_flows: &[Money],
    warnings: &mut Vec<String>,
) -> ProjectionResult<ReturnMetrics> {
    let totals = GrossTotals::from_amounts(cash_flows)?;
    compute_return_metrics_with_totals(cash_flows, totals, warnings)
}

/// Metrics where ROI and net profit come from `totals` and IRR and payback
/// from the netted monthly vector.
pub fn compute_return_metrics_with_totals(
    cash_flows: &[Money],
    totals: GrossTotals,
    warnings: &mut Vec<String>,
) -> ProjectionResult<ReturnMetrics> {
    if cash_flows.is_empty() {
        return Err(ProjectionError::InsufficientData(
            "At least one cash flow is required".into(),
        ));
    }
    // Partial sums of the vector stay within the totals of its own flows.
    GrossTotals::from_amounts(cash_flows)?;

    let GrossTotals {
        invested: total_invested,
        returned: total_returned,
    } = totals;

    if total_invested.is_zero() {
        return Err(ProjectionError::DivisionByZero {
            context: "total_invested is zero; ROI is undefined".into(),
        });
    }

    let net_profit = total_returned - total_invested;
    let roi = net_profit
        .checked_div(total_invested)
        .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or_else(|| ProjectionError::overflow("ROI"))?;

    let (irr, irr_converged) = match time_value::irr(cash_flows) {
        Ok(r) => (r, true),
        Err(e) => {
            push_warning(warnings, format!("IRR not available: {e}"));
            (Decimal::ZERO, false)
        }
    };

    let annualized_irr = irr_converged.then(|| rate_to_pct(time_value::annualize_monthly(irr)));
    let payback_months = time_value::payback_period(cash_flows);

    tracing::debug!(
        periods = cash_flows.len(),
        roi = %roi,
        irr_converged,
        "return metrics computed"
    );

    Ok(ReturnMetrics {
        roi,
        irr: rate_to_pct(irr),
        irr_converged,
        annualized_irr,
        payback_months,
        net_profit,
        total_invested,
        total_returned,
    })
}
