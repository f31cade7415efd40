use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{grow, horizon_months, require_non_negative, CashFlowLedger, StrategyCashFlows, StrategyDetails};
use crate::amortization::params::CalculationParameters;
use crate::error::ProjectionError;
use crate::types::*;
use crate::ProjectionResult;

/// Buy outright and hold; the unit is valued at the end of the horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetAppreciationParams {
    pub years: u32,
    /// Annual appreciation (%), compounded once per year
    pub annual_rate: Percent,
    /// Annual upkeep charged at the end of each holding year
    #[serde(default)]
    pub maintenance_costs: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyValue {
    pub year: u32,
    pub property_value: Money,
    /// Appreciation gained during this year
    pub appreciation: Money,
    pub cumulative_maintenance: Money,
    /// property_value - cumulative_maintenance
    pub net_value: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetAppreciationDetails {
    pub acquisition_cost: Money,
    pub initial_value: Money,
    pub final_value: Money,
    /// final_value / initial_value - 1 (%)
    pub total_appreciation_pct: Percent,
    pub total_maintenance: Money,
    pub yearly: Vec<YearlyValue>,
}

/// Acquisition at month 0, maintenance at each anniversary, terminal value at
/// the last month.
pub fn assemble(
    calc: &CalculationParameters,
    params: &AssetAppreciationParams,
) -> ProjectionResult<StrategyCashFlows> {
    if params.years == 0 {
        return Err(ProjectionError::invalid(
            "years",
            "Holding period must be at least one year",
        ));
    }
    require_non_negative("maintenance_costs", params.maintenance_costs)?;

    let horizon = horizon_months("years", params.years)?;
    let acquisition_cost = calc.acquisition_price();
    let initial_value = calc.property_price;
    let growth = Decimal::ONE + pct_to_rate(params.annual_rate);

    let mut ledger = CashFlowLedger::new(horizon);
    ledger.post(0, "Acquisition", -acquisition_cost)?;

    let mut value = initial_value;
    let mut cumulative_maintenance = Decimal::ZERO;
    let mut yearly = Vec::with_capacity(params.years as usize);
    for year in 1..=params.years {
        let previous = value;
        value = grow(value, growth, "Property value")?;
        cumulative_maintenance = cumulative_maintenance
            .checked_add(params.maintenance_costs)
            .ok_or_else(|| ProjectionError::overflow("Cumulative maintenance"))?;
        ledger.post(year * 12, "Maintenance", -params.maintenance_costs)?;
        yearly.push(YearlyValue {
            year,
            property_value: value,
            appreciation: value - previous,
            cumulative_maintenance,
            net_value: value - cumulative_maintenance,
        });
    }

    ledger.post(horizon, "Terminal property value", value)?;

    let total_appreciation_pct = if initial_value.is_zero() {
        Decimal::ZERO
    } else {
        value
            .checked_div(initial_value)
            .and_then(|ratio| (ratio - Decimal::ONE).checked_mul(Decimal::ONE_HUNDRED))
            .ok_or_else(|| ProjectionError::overflow("Total appreciation"))?
    };

    tracing::debug!(
        years = params.years,
        final_value = %value,
        "asset appreciation assembled"
    );

    Ok(ledger.finish(StrategyDetails::AssetAppreciation(AssetAppreciationDetails {
        acquisition_cost,
        initial_value,
        final_value: value,
        total_appreciation_pct,
        total_maintenance: cumulative_maintenance,
        yearly,
    })))
}
