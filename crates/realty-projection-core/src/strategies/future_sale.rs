use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
    compound_annual, grow, require_non_negative, CashFlowLedger, StrategyCashFlows, StrategyDetails,
    MAX_HORIZON_MONTHS,
};
use crate::amortization::params::CalculationParameters;
use crate::amortization::schedule::AmortizationSchedule;
use crate::error::ProjectionError;
use crate::types::*;
use crate::ProjectionResult;

/// How the resale price is derived from the list price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleValuation {
    /// Total appreciation over the holding period (%)
    TotalAppreciation(Percent),
    /// Annual appreciation (%) compounded over sale_month / 12 years
    AnnualAppreciation(Percent),
    /// Known resale price
    FixedValue(Money),
}

fn default_settle() -> bool {
    true
}

/// Sell the unit (or the purchase rights) before or after delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FutureSaleParams {
    pub sale_month: Month,
    pub valuation: SaleValuation,
    /// Broker commission on the sale price (%)
    #[serde(default)]
    pub commission_pct: Percent,
    /// Transfer / sales tax on the sale price (%)
    #[serde(default)]
    pub sales_tax_pct: Percent,
    /// Capital gains tax on a positive gain (%)
    #[serde(default)]
    pub income_tax_pct: Percent,
    /// Other closing costs on the sale price (%)
    #[serde(default)]
    pub extra_costs_pct: Percent,
    /// Annual upkeep while the unit is held, charged at each anniversary
    /// up to the sale month
    #[serde(default)]
    pub maintenance_costs: Money,
    /// Whether the buyer's payment of the remaining balance is deducted
    #[serde(default = "default_settle")]
    pub settle_outstanding_balance: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FutureSaleDetails {
    pub sale_month: Month,
    pub sale_value: Money,
    pub commission: Money,
    pub sales_tax: Money,
    pub extra_costs: Money,
    /// Corrected balance still owed to the developer at the sale month
    pub outstanding_balance: Money,
    /// Down payment plus corrected payments through the sale month
    pub total_paid: Money,
    pub total_maintenance: Money,
    pub gross_gain: Money,
    pub income_tax: Money,
    pub net_sale_proceeds: Money,
}

impl FutureSaleParams {
    fn validate(&self) -> ProjectionResult<()> {
        if self.sale_month == 0 {
            return Err(ProjectionError::invalid(
                "sale_month",
                "Sale month must be at least 1",
            ));
        }
        if self.sale_month > MAX_HORIZON_MONTHS {
            return Err(ProjectionError::invalid(
                "sale_month",
                format!("Sale month cannot exceed {MAX_HORIZON_MONTHS}"),
            ));
        }
        require_non_negative("commission_pct", self.commission_pct)?;
        require_non_negative("sales_tax_pct", self.sales_tax_pct)?;
        require_non_negative("income_tax_pct", self.income_tax_pct)?;
        require_non_negative("extra_costs_pct", self.extra_costs_pct)?;
        require_non_negative("maintenance_costs", self.maintenance_costs)?;
        if let SaleValuation::FixedValue(v) = self.valuation {
            require_non_negative("valuation.fixed_value", v)?;
        }
        Ok(())
    }

    /// Resale price at the sale month.
    pub fn sale_value(&self, list_price: Money) -> ProjectionResult<Money> {
        match self.valuation {
            SaleValuation::TotalAppreciation(pct) => {
                grow(list_price, Decimal::ONE + pct_to_rate(pct), "Sale value")
            }
            SaleValuation::AnnualAppreciation(pct) => {
                compound_annual(list_price, pct, self.sale_month)
            }
            SaleValuation::FixedValue(v) => Ok(v),
        }
    }
}

/// Payments and yearly maintenance through the sale month as outflows, net
/// sale proceeds as a single inflow at the sale month.
pub fn assemble(
    calc: &CalculationParameters,
    schedule: &AmortizationSchedule,
    params: &FutureSaleParams,
    warnings: &mut Vec<String>,
) -> ProjectionResult<StrategyCashFlows> {
    params.validate()?;

    let sale_month = params.sale_month;
    if sale_month > schedule.last_month() {
        push_warning(
            warnings,
            format!(
                "Sale month {sale_month} is after the last scheduled payment (month {})",
                schedule.last_month()
            ),
        );
    }

    let mut ledger = CashFlowLedger::new(sale_month);
    let payments = schedule.corrected_payments(sale_month);
    let mut total_paid = Decimal::ZERO;
    for (month, amount) in payments.iter().enumerate() {
        let label = if month == 0 { "Down payment" } else { "Scheduled payment" };
        ledger.post(month as Month, label, -*amount)?;
        total_paid = total_paid
            .checked_add(*amount)
            .ok_or_else(|| ProjectionError::overflow("Total paid"))?;
    }

    let mut total_maintenance = Decimal::ZERO;
    for month in (12..=sale_month).step_by(12) {
        ledger.post(month, "Maintenance", -params.maintenance_costs)?;
        total_maintenance = total_maintenance
            .checked_add(params.maintenance_costs)
            .ok_or_else(|| ProjectionError::overflow("Total maintenance"))?;
    }

    let sale_value = params.sale_value(calc.property_price)?;
    let commission = grow(sale_value, pct_to_rate(params.commission_pct), "Commission")?;
    let sales_tax = grow(sale_value, pct_to_rate(params.sales_tax_pct), "Sales tax")?;
    let extra_costs = grow(sale_value, pct_to_rate(params.extra_costs_pct), "Extra costs")?;
    let outstanding_balance = if params.settle_outstanding_balance {
        schedule.outstanding_after(sale_month)
    } else {
        Decimal::ZERO
    };

    let proceeds_before_tax = [commission, sales_tax, extra_costs, outstanding_balance]
        .into_iter()
        .try_fold(sale_value, |acc, cost| acc.checked_sub(cost))
        .ok_or_else(|| ProjectionError::overflow("Sale proceeds"))?;
    let gross_gain = proceeds_before_tax
        .checked_sub(total_paid)
        .and_then(|g| g.checked_sub(total_maintenance))
        .ok_or_else(|| ProjectionError::overflow("Gross gain"))?;
    let income_tax = gross_gain.max(Decimal::ZERO) * pct_to_rate(params.income_tax_pct);
    let net_sale_proceeds = proceeds_before_tax
        .checked_sub(income_tax)
        .ok_or_else(|| ProjectionError::overflow("Net sale proceeds"))?;

    if net_sale_proceeds < Decimal::ZERO {
        push_warning(
            warnings,
            format!("Sale at month {sale_month} does not cover the outstanding balance and costs"),
        );
    }
    ledger.post(sale_month, "Sale proceeds (net)", net_sale_proceeds)?;

    tracing::debug!(
        sale_month,
        sale_value = %sale_value,
        gross_gain = %gross_gain,
        "future sale assembled"
    );

    Ok(ledger.finish(StrategyDetails::FutureSale(FutureSaleDetails {
        sale_month,
        sale_value,
        commission,
        sales_tax,
        extra_costs,
        outstanding_balance,
        total_paid,
        total_maintenance,
        gross_gain,
        income_tax,
        net_sale_proceeds,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::params::{DownPayment, PartitioningMode};
    use crate::amortization::schedule::compute_schedule;
    use crate::correction::accumulator::CorrectionRates;
    use rust_decimal_macros::dec;

    fn calc() -> CalculationParameters {
        CalculationParameters {
            property_price: dec!(500000),
            discount: Decimal::ZERO,
            down_payment: DownPayment::Value(dec!(100000)),
            delivery_months: 36,
            payment_months: 120,
            correction: CorrectionRates::flat(Decimal::ZERO),
            partitioning: PartitioningMode::default(),
        }
    }

    fn sale(valuation: SaleValuation) -> FutureSaleParams {
        FutureSaleParams {
            sale_month: 60,
            valuation,
            commission_pct: Decimal::ZERO,
            sales_tax_pct: Decimal::ZERO,
            income_tax_pct: Decimal::ZERO,
            extra_costs_pct: Decimal::ZERO,
            maintenance_costs: Decimal::ZERO,
            settle_outstanding_balance: true,
        }
    }

    fn details(cf: &StrategyCashFlows) -> &FutureSaleDetails {
        match &cf.details {
            StrategyDetails::FutureSale(d) => d,
            _ => panic!("expected future sale details"),
        }
    }

    #[test]
    fn test_flows_span_down_payment_to_sale() {
        let c = calc();
        let s = compute_schedule(&c, &mut Vec::new()).unwrap();
        let cf = assemble(&c, &s, &sale(SaleValuation::TotalAppreciation(dec!(20))), &mut Vec::new())
            .unwrap();
        assert_eq!(cf.flows.len(), 61);
        assert_eq!(cf.flows[0], dec!(-100000));
        assert!(cf.flows[1] < Decimal::ZERO);
        assert!(cf.flows[60] > Decimal::ZERO);
    }

    #[test]
    fn test_sale_deducts_outstanding_balance() {
        let c = calc();
        let s = compute_schedule(&c, &mut Vec::new()).unwrap();
        let cf = assemble(&c, &s, &sale(SaleValuation::FixedValue(dec!(600000))), &mut Vec::new())
            .unwrap();
        let d = details(&cf);
        // No correction: 60 of 120 level installments paid, half the balance remains
        assert!((d.outstanding_balance - dec!(200000)).abs() < dec!(0.01));
        assert!((d.total_paid - dec!(300000)).abs() < dec!(0.01));
        assert!((d.gross_gain - dec!(100000)).abs() < dec!(0.01));
    }

    #[test]
    fn test_income_tax_only_on_positive_gain() {
        let c = calc();
        let s = compute_schedule(&c, &mut Vec::new()).unwrap();
        let mut p = sale(SaleValuation::FixedValue(dec!(400000)));
        p.income_tax_pct = dec!(15);
        let cf = assemble(&c, &s, &p, &mut Vec::new()).unwrap();
        let d = details(&cf);
        assert!(d.gross_gain < Decimal::ZERO);
        assert_eq!(d.income_tax, Decimal::ZERO);
    }

    #[test]
    fn test_costs_and_tax_reduce_proceeds() {
        let c = calc();
        let s = compute_schedule(&c, &mut Vec::new()).unwrap();
        let mut p = sale(SaleValuation::FixedValue(dec!(600000)));
        p.commission_pct = dec!(5);
        p.income_tax_pct = dec!(15);
        let cf = assemble(&c, &s, &p, &mut Vec::new()).unwrap();
        let d = details(&cf);
        assert_eq!(d.commission, dec!(30000));
        // gain = 600000 - 30000 - 200000 - 300000 = 70000
        assert!((d.income_tax - dec!(10500)).abs() < dec!(0.01));
        assert!((d.net_sale_proceeds - dec!(359500)).abs() < dec!(0.01));
    }

    #[test]
    fn test_annual_appreciation_compounds() {
        let p = sale(SaleValuation::AnnualAppreciation(dec!(10)));
        assert_eq!(p.sale_value(dec!(100000)).unwrap(), dec!(161051));
    }

    #[test]
    fn test_maintenance_charged_each_year_held() {
        let c = calc();
        let s = compute_schedule(&c, &mut Vec::new()).unwrap();
        let mut p = sale(SaleValuation::FixedValue(dec!(600000)));
        p.maintenance_costs = dec!(1000);
        let cf = assemble(&c, &s, &p, &mut Vec::new()).unwrap();
        let d = details(&cf);
        assert_eq!(d.total_maintenance, dec!(5000));
        assert!((d.gross_gain - dec!(95000)).abs() < dec!(0.01));
        let charges = cf.events.iter().filter(|e| e.label == "Maintenance").count();
        assert_eq!(charges, 5);
    }

    #[test]
    fn test_sale_month_zero_rejected() {
        let c = calc();
        let s = compute_schedule(&c, &mut Vec::new()).unwrap();
        let mut p = sale(SaleValuation::FixedValue(dec!(1)));
        p.sale_month = 0;
        assert!(assemble(&c, &s, &p, &mut Vec::new()).is_err());
    }
}
