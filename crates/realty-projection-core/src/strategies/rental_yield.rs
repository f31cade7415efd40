use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
    compound_annual, grow, horizon_months, require_non_negative, CashFlowLedger, StrategyCashFlows,
    StrategyDetails,
};
use crate::amortization::params::CalculationParameters;
use crate::error::ProjectionError;
use crate::types::*;
use crate::ProjectionResult;

fn default_occupancy() -> Percent {
    Decimal::ONE_HUNDRED
}

/// Buy outright and let the unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalYieldParams {
    pub monthly_rent: Money,
    /// One-off furnishing spend at acquisition
    #[serde(default)]
    pub furnishing_costs: Money,
    /// Monthly condominium fees
    #[serde(default)]
    pub condo_fees: Money,
    /// Annual property tax, spread evenly across months
    #[serde(default)]
    pub property_tax: Money,
    /// Rent increase (%) applied at each anniversary
    #[serde(default)]
    pub annual_increase: Percent,
    pub projection_years: u32,
    /// When set, the unit is valued at this annual appreciation and the
    /// value is received at the last month
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_annual_appreciation: Option<Percent>,
    /// Share of months the unit is let (%)
    #[serde(default = "default_occupancy")]
    pub occupancy_pct: Percent,
    /// Letting agent fee on collected rent (%)
    #[serde(default)]
    pub management_fee_pct: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyRental {
    pub year: u32,
    /// Contract rent for each month of this year
    pub monthly_rent: Money,
    /// Rent collected after occupancy
    pub rent_income: Money,
    /// Management fee, condo fees and property tax
    pub expenses: Money,
    pub net_income: Money,
    /// net_income / initial_investment (%)
    pub yield_pct: Percent,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RentalYieldDetails {
    /// Acquisition price plus furnishing
    pub initial_investment: Money,
    pub monthly_net_income_year1: Money,
    pub annual_net_income_year1: Money,
    pub total_net_income: Money,
    pub average_monthly_net_income: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal_value: Option<Money>,
    pub yearly: Vec<YearlyRental>,
}

impl RentalYieldParams {
    fn validate(&self) -> ProjectionResult<()> {
        if self.projection_years == 0 {
            return Err(ProjectionError::invalid(
                "projection_years",
                "Projection must cover at least one year",
            ));
        }
        require_non_negative("monthly_rent", self.monthly_rent)?;
        require_non_negative("furnishing_costs", self.furnishing_costs)?;
        require_non_negative("condo_fees", self.condo_fees)?;
        require_non_negative("property_tax", self.property_tax)?;
        for (field, pct) in [
            ("occupancy_pct", self.occupancy_pct),
            ("management_fee_pct", self.management_fee_pct),
        ] {
            if pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
                return Err(ProjectionError::invalid(field, "Must be between 0 and 100"));
            }
        }
        Ok(())
    }
}

/// Acquisition plus furnishing at month 0, net rent for every month of the
/// projection, and an optional terminal value at the last month.
pub fn assemble(
    calc: &CalculationParameters,
    params: &RentalYieldParams,
) -> ProjectionResult<StrategyCashFlows> {
    params.validate()?;

    let horizon = horizon_months("projection_years", params.projection_years)?;
    let twelve = Decimal::from(12);
    let initial_investment = calc
        .acquisition_price()
        .checked_add(params.furnishing_costs)
        .ok_or_else(|| ProjectionError::overflow("Initial investment"))?;
    let monthly_tax = params.property_tax / twelve;
    let occupancy = pct_to_rate(params.occupancy_pct);
    let fee = pct_to_rate(params.management_fee_pct);
    let escalation = Decimal::ONE + pct_to_rate(params.annual_increase);

    let mut ledger = CashFlowLedger::new(horizon);
    ledger.post(0, "Acquisition", -calc.acquisition_price())?;
    ledger.post(0, "Furnishing", -params.furnishing_costs)?;

    let mut rent = params.monthly_rent;
    let mut total_net_income = Decimal::ZERO;
    let mut yearly = Vec::with_capacity(params.projection_years as usize);
    for year in 1..=params.projection_years {
        if year > 1 {
            rent = grow(rent, escalation, "Monthly rent")?;
        }
        let collected = rent * occupancy;
        let expenses = (collected * fee)
            .checked_add(params.condo_fees)
            .and_then(|e| e.checked_add(monthly_tax))
            .ok_or_else(|| ProjectionError::overflow("Monthly expenses"))?;
        let net = collected - expenses;

        let first_month = (year - 1) * 12 + 1;
        for month in first_month..first_month + 12 {
            ledger.post(month, "Net rent", net)?;
        }

        let net_income = grow(net, twelve, "Annual net income")?;
        total_net_income = total_net_income
            .checked_add(net_income)
            .ok_or_else(|| ProjectionError::overflow("Total net income"))?;
        yearly.push(YearlyRental {
            year,
            monthly_rent: rent,
            rent_income: grow(collected, twelve, "Annual rent income")?,
            expenses: grow(expenses, twelve, "Annual expenses")?,
            net_income,
            yield_pct: if initial_investment.is_zero() {
                Decimal::ZERO
            } else {
                net_income
                    .checked_div(initial_investment)
                    .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
                    .ok_or_else(|| ProjectionError::overflow("Rental yield"))?
            },
        });
    }

    let terminal_value = params
        .default_annual_appreciation
        .map(|pct| compound_annual(calc.property_price, pct, horizon))
        .transpose()?;
    if let Some(value) = terminal_value {
        ledger.post(horizon, "Terminal property value", value)?;
    }

    let annual_net_income_year1 = yearly.first().map(|y| y.net_income).unwrap_or_default();

    tracing::debug!(
        years = params.projection_years,
        total_net_income = %total_net_income,
        "rental yield assembled"
    );

    Ok(ledger.finish(StrategyDetails::RentalYield(RentalYieldDetails {
        initial_investment,
        monthly_net_income_year1: annual_net_income_year1 / twelve,
        annual_net_income_year1,
        total_net_income,
        average_monthly_net_income: total_net_income / Decimal::from(horizon),
        terminal_value,
        yearly,
    })))
}
