use realty_projection_core::amortization::params::{
    CalculationParameters, DownPayment, PartitioningMode,
};
use realty_projection_core::correction::accumulator::CorrectionRates;
use realty_projection_core::scenarios::orchestrator::{
    run_projection, ProjectionInput, ScenarioOverride, StrategyOutcome, AGGREGATION_POLICY,
};
use realty_projection_core::scenarios::{ScenarioKind, ScenarioSelection};
use realty_projection_core::strategies::asset_appreciation::AssetAppreciationParams;
use realty_projection_core::strategies::future_sale::{FutureSaleParams, SaleValuation};
use realty_projection_core::strategies::{
    evaluate_strategy, StrategyDetails, StrategyInput, StrategyKind, StrategyParameters,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn params() -> CalculationParameters {
    CalculationParameters {
        property_price: dec!(500_000),
        discount: dec!(10_000),
        down_payment: DownPayment::Value(dec!(100_000)),
        delivery_months: 36,
        payment_months: 120,
        correction: CorrectionRates::flat(dec!(0.5)),
        partitioning: PartitioningMode::default(),
    }
}

fn all_strategies(selection: ScenarioSelection) -> ProjectionInput {
    ProjectionInput {
        parameters: params(),
        strategies: StrategyKind::ALL.to_vec(),
        selection,
        overrides: vec![],
    }
}

// ===========================================================================
// Single strategy
// ===========================================================================

#[test]
fn test_future_sale_cash_flow_shape() {
    let input = StrategyInput {
        parameters: params(),
        strategy: StrategyParameters::FutureSale(FutureSaleParams {
            sale_month: 48,
            valuation: SaleValuation::TotalAppreciation(dec!(30)),
            commission_pct: dec!(5),
            sales_tax_pct: Decimal::ZERO,
            income_tax_pct: dec!(15),
            extra_costs_pct: Decimal::ZERO,
            maintenance_costs: Decimal::ZERO,
            settle_outstanding_balance: true,
        }),
    };
    let r = evaluate_strategy(&input).unwrap().result;
    assert_eq!(r.strategy, StrategyKind::FutureSale);
    assert_eq!(r.cash_flow.len(), 49);
    assert_eq!(r.cash_flow[0], dec!(-100_000));
    assert!(r.cash_flow[1..48].iter().all(|cf| *cf < Decimal::ZERO));
    assert!(r.cash_flow[48] > Decimal::ZERO);

    match &r.details {
        StrategyDetails::FutureSale(d) => {
            assert_eq!(d.sale_value, dec!(650_000));
            assert_eq!(d.commission, dec!(32_500));
        }
        other => panic!("expected future sale details, got {other:?}"),
    }
}

#[test]
fn test_future_sale_invested_is_everything_paid() {
    // The sale month's installment shares a month with the proceeds; it must
    // still count in full towards the amount invested.
    let input = StrategyInput {
        parameters: params(),
        strategy: StrategyParameters::FutureSale(FutureSaleParams {
            sale_month: 60,
            valuation: SaleValuation::FixedValue(dec!(700_000)),
            commission_pct: dec!(5),
            sales_tax_pct: Decimal::ZERO,
            income_tax_pct: dec!(15),
            extra_costs_pct: Decimal::ZERO,
            maintenance_costs: dec!(1_200),
            settle_outstanding_balance: true,
        }),
    };
    let r = evaluate_strategy(&input).unwrap().result;
    let d = match &r.details {
        StrategyDetails::FutureSale(d) => d.clone(),
        other => panic!("expected future sale details, got {other:?}"),
    };
    assert_eq!(r.metrics.total_invested, d.total_paid + d.total_maintenance);
    assert_eq!(r.metrics.total_returned, d.net_sale_proceeds);
    assert_eq!(
        r.metrics.roi,
        r.metrics.net_profit / r.metrics.total_invested * dec!(100)
    );
    let netted: Decimal = r.cash_flow.iter().filter(|c| **c < Decimal::ZERO).map(|c| -*c).sum();
    assert!(r.metrics.total_invested > netted);
}

#[test]
fn test_strategy_request_from_json() {
    let json = r#"{
        "parameters": {
            "property_price": "400000",
            "down_payment": {"percentage": "20"},
            "delivery_months": 24,
            "payment_months": 60,
            "correction": {"rate_before_delivery": "0.5", "rate_after_delivery": "0.4"}
        },
        "strategy": {
            "strategy": "rental_yield",
            "monthly_rent": "2000",
            "condo_fees": "250",
            "projection_years": 3
        }
    }"#;
    let input: StrategyInput = serde_json::from_str(json).unwrap();
    let r = evaluate_strategy(&input).unwrap().result;
    assert_eq!(r.strategy, StrategyKind::RentalYield);
    assert_eq!(r.cash_flow.len(), 37);
    assert_eq!(r.cash_flow[0], dec!(-400_000));
    assert_eq!(r.cash_flow[1], dec!(1750));
}

// ===========================================================================
// Orchestration
// ===========================================================================

#[test]
fn test_projection_covers_every_pair() {
    let out = run_projection(&all_strategies(ScenarioSelection::AllScenarios)).unwrap();
    let result = &out.result;
    assert_eq!(result.entries.len(), 9);
    for scenario in ScenarioKind::ALL {
        for strategy in StrategyKind::ALL {
            let e = result.entry(strategy, scenario).unwrap();
            assert!(matches!(e.outcome, StrategyOutcome::Computed(_)));
        }
    }
}

#[test]
fn test_aggregate_is_max_of_roi_never_average() {
    let out = run_projection(&all_strategies(ScenarioSelection::Single(ScenarioKind::Baseline)))
        .unwrap()
        .result;
    let rois: Vec<Decimal> = out
        .entries
        .iter()
        .filter_map(|e| e.outcome.computed().map(|r| r.metrics.roi))
        .collect();
    let best = rois.iter().copied().max().unwrap();

    let summary = out.summary(ScenarioKind::Baseline).unwrap();
    assert_eq!(summary.policy, AGGREGATION_POLICY);
    assert_eq!(summary.roi.as_ref().unwrap().value, best);
    let mean = rois.iter().copied().sum::<Decimal>() / Decimal::from(rois.len() as u64);
    assert!(best >= mean);
}

#[test]
fn test_optimistic_beats_conservative_for_appreciation() {
    let out = run_projection(&all_strategies(ScenarioSelection::Selected(vec![
        ScenarioKind::Conservative,
        ScenarioKind::Optimistic,
    ])))
    .unwrap()
    .result;
    let roi = |s| {
        out.entry(StrategyKind::AssetAppreciation, s)
            .and_then(|e| e.outcome.computed())
            .map(|r| r.metrics.roi)
            .unwrap()
    };
    assert!(roi(ScenarioKind::Optimistic) > roi(ScenarioKind::Conservative));
    assert!(out.entry(StrategyKind::AssetAppreciation, ScenarioKind::Baseline).is_none());
}

#[test]
fn test_override_replaces_preset() {
    let mut input = all_strategies(ScenarioSelection::default());
    input.strategies = vec![StrategyKind::FutureSale];
    input.overrides = vec![ScenarioOverride {
        scenario: ScenarioKind::Baseline,
        parameters: StrategyParameters::FutureSale(FutureSaleParams {
            sale_month: 24,
            valuation: SaleValuation::FixedValue(dec!(560_000)),
            commission_pct: Decimal::ZERO,
            sales_tax_pct: Decimal::ZERO,
            income_tax_pct: Decimal::ZERO,
            extra_costs_pct: Decimal::ZERO,
            maintenance_costs: Decimal::ZERO,
            settle_outstanding_balance: true,
        }),
    }];
    let out = run_projection(&input).unwrap().result;
    let e = out.entry(StrategyKind::FutureSale, ScenarioKind::Baseline).unwrap();
    assert!(!e.from_preset);
    assert_eq!(e.outcome.computed().unwrap().cash_flow.len(), 25);
}

#[test]
fn test_runaway_override_fails_alone() {
    let mut input = all_strategies(ScenarioSelection::default());
    input.strategies = vec![StrategyKind::AssetAppreciation, StrategyKind::RentalYield];
    input.overrides = vec![ScenarioOverride {
        scenario: ScenarioKind::Baseline,
        parameters: StrategyParameters::AssetAppreciation(AssetAppreciationParams {
            years: 50,
            annual_rate: dec!(400),
            maintenance_costs: Decimal::ZERO,
        }),
    }];
    let out = run_projection(&input).unwrap();
    let failed = out
        .result
        .entry(StrategyKind::AssetAppreciation, ScenarioKind::Baseline)
        .unwrap();
    match &failed.outcome {
        StrategyOutcome::Failed { reason } => assert!(reason.contains("representable range")),
        other => panic!("expected a failed entry, got {other:?}"),
    }
    let rental = out
        .result
        .entry(StrategyKind::RentalYield, ScenarioKind::Baseline)
        .unwrap();
    assert!(matches!(rental.outcome, StrategyOutcome::Computed(_)));
    let summary = out.result.summary(ScenarioKind::Baseline).unwrap();
    assert_eq!(summary.roi.as_ref().unwrap().strategy, StrategyKind::RentalYield);
}

#[test]
fn test_projection_determinism() {
    let input = all_strategies(ScenarioSelection::AllScenarios);
    let a = run_projection(&input).unwrap().result;
    let b = run_projection(&input).unwrap().result;
    assert_eq!(a.entries, b.entries);
    assert_eq!(a.summaries, b.summaries);
}

#[test]
fn test_invalid_base_parameters_abort() {
    let mut input = all_strategies(ScenarioSelection::AllScenarios);
    input.parameters.payment_months = 0;
    assert!(run_projection(&input).is_err());
}

#[test]
fn test_projection_output_serializes() {
    let out = run_projection(&all_strategies(ScenarioSelection::Single(ScenarioKind::Optimistic)))
        .unwrap();
    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(json["result"]["summaries"][0]["policy"], AGGREGATION_POLICY);
    assert_eq!(json["result"]["entries"][0]["outcome"]["status"], "computed");
}
