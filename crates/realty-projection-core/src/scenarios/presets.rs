use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::ScenarioKind;
use crate::amortization::params::CalculationParameters;
use crate::strategies::asset_appreciation::AssetAppreciationParams;
use crate::strategies::future_sale::{FutureSaleParams, SaleValuation};
use crate::strategies::rental_yield::RentalYieldParams;
use crate::strategies::{StrategyKind, StrategyParameters};
use crate::types::{pct_to_rate, Month, Percent};

const PRESET_SALE_MONTH: Month = 60;
const PRESET_HOLDING_YEARS: u32 = 5;

struct FutureSalePreset {
    annual_appreciation: Percent,
    commission: Percent,
    income_tax: Percent,
}

struct RentalPreset {
    /// Monthly rent as a share of the list price
    rent_pct_of_price: Percent,
    occupancy: Percent,
    management_fee: Percent,
    annual_increase: Percent,
}

fn future_sale_preset(scenario: ScenarioKind) -> FutureSalePreset {
    match scenario {
        ScenarioKind::Baseline => FutureSalePreset {
            annual_appreciation: dec!(10),
            commission: dec!(5),
            income_tax: dec!(15),
        },
        ScenarioKind::Conservative => FutureSalePreset {
            annual_appreciation: dec!(7),
            commission: dec!(6),
            income_tax: dec!(15),
        },
        ScenarioKind::Optimistic => FutureSalePreset {
            annual_appreciation: dec!(15),
            commission: dec!(4),
            income_tax: dec!(15),
        },
    }
}

fn appreciation_rate(scenario: ScenarioKind) -> Percent {
    match scenario {
        ScenarioKind::Baseline => dec!(20),
        ScenarioKind::Conservative => dec!(15),
        ScenarioKind::Optimistic => dec!(25),
    }
}

fn rental_preset(scenario: ScenarioKind) -> RentalPreset {
    match scenario {
        ScenarioKind::Baseline => RentalPreset {
            rent_pct_of_price: dec!(0.5),
            occupancy: dec!(95),
            management_fee: dec!(8),
            annual_increase: dec!(5),
        },
        ScenarioKind::Conservative => RentalPreset {
            rent_pct_of_price: dec!(0.4),
            occupancy: dec!(90),
            management_fee: dec!(8),
            annual_increase: dec!(4),
        },
        ScenarioKind::Optimistic => RentalPreset {
            rent_pct_of_price: dec!(0.6),
            occupancy: dec!(98),
            management_fee: dec!(7),
            annual_increase: dec!(6),
        },
    }
}

/// Default strategy parameters for a scenario. Rent is derived from the list
/// price; every field without a preset is zero or absent.
pub fn preset_for(
    strategy: StrategyKind,
    scenario: ScenarioKind,
    calc: &CalculationParameters,
) -> StrategyParameters {
    match strategy {
        StrategyKind::FutureSale => {
            let p = future_sale_preset(scenario);
            StrategyParameters::FutureSale(FutureSaleParams {
                sale_month: PRESET_SALE_MONTH,
                valuation: SaleValuation::AnnualAppreciation(p.annual_appreciation),
                commission_pct: p.commission,
                sales_tax_pct: Decimal::ZERO,
                income_tax_pct: p.income_tax,
                extra_costs_pct: Decimal::ZERO,
                maintenance_costs: Decimal::ZERO,
                settle_outstanding_balance: true,
            })
        }
        StrategyKind::AssetAppreciation => {
            StrategyParameters::AssetAppreciation(AssetAppreciationParams {
                years: PRESET_HOLDING_YEARS,
                annual_rate: appreciation_rate(scenario),
                maintenance_costs: Decimal::ZERO,
            })
        }
        StrategyKind::RentalYield => {
            let p = rental_preset(scenario);
            StrategyParameters::RentalYield(RentalYieldParams {
                monthly_rent: (calc.property_price * pct_to_rate(p.rent_pct_of_price)).round_dp(2),
                furnishing_costs: Decimal::ZERO,
                condo_fees: Decimal::ZERO,
                property_tax: Decimal::ZERO,
                annual_increase: p.annual_increase,
                projection_years: PRESET_HOLDING_YEARS,
                default_annual_appreciation: None,
                occupancy_pct: p.occupancy,
                management_fee_pct: p.management_fee,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::params::{DownPayment, PartitioningMode};
    use crate::correction::accumulator::CorrectionRates;

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

    #[test]
    fn test_preset_matches_requested_strategy() {
        for strategy in StrategyKind::ALL {
            for scenario in ScenarioKind::ALL {
                assert_eq!(preset_for(strategy, scenario, &calc()).kind(), strategy);
            }
        }
    }

    #[test]
    fn test_rent_derived_from_list_price() {
        match preset_for(StrategyKind::RentalYield, ScenarioKind::Conservative, &calc()) {
            StrategyParameters::RentalYield(p) => {
                assert_eq!(p.monthly_rent, dec!(2000));
                assert_eq!(p.occupancy_pct, dec!(90));
            }
            _ => panic!("expected rental preset"),
        }
    }

    #[test]
    fn test_optimistic_appreciates_faster() {
        let rate = |s| match preset_for(StrategyKind::AssetAppreciation, s, &calc()) {
            StrategyParameters::AssetAppreciation(p) => p.annual_rate,
            _ => panic!("expected appreciation preset"),
        };
        assert!(rate(ScenarioKind::Optimistic) > rate(ScenarioKind::Baseline));
        assert!(rate(ScenarioKind::Baseline) > rate(ScenarioKind::Conservative));
    }
}
