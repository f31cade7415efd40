use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Instant;

use super::params::{reinforcement_months, CalculationParameters, PartitioningMode, PaymentKind};
use crate::correction::accumulator::{correction_steps, CorrectionStep};
use crate::error::ProjectionError;
use crate::types::{push_warning, with_metadata, ComputationOutput, Money, Month, Percent};
use crate::ProjectionResult;

/// Tolerance used when reconciling payments against the financed balance.
pub const RECONCILIATION_TOLERANCE: Money = dec!(0.01);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A nominal amount and its corrected value at the month it falls due.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentAmount {
    pub base: Money,
    pub corrected: Money,
}

/// One row of the amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleLineItem {
    pub month: Month,
    /// Correction rate applied in this month (%)
    pub correction_rate: Percent,
    /// Sum of monthly rates through this month (%)
    pub accumulated_correction: Percent,
    pub base_installment: Money,
    pub corrected_installment: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub down_payment: Option<PaymentAmount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reinforcement: Option<PaymentAmount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_payment: Option<PaymentAmount>,
    /// Uncorrected total paid this month
    pub total_payment: Money,
    /// Corrected total paid this month
    pub total_corrected_payment: Money,
    /// Uncorrected running balance before this month's payment
    pub net_balance: Money,
    /// net_balance * correction factor; absent at month 0
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrected_balance: Option<Money>,
}

/// Totals over the payment months (the down payment is reported apart).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub total_base_paid: Money,
    pub total_corrected_paid: Money,
    /// total_corrected_paid - total_base_paid
    pub total_correction: Money,
    /// total_correction as a percentage of total_base_paid
    pub correction_pct: Percent,
    pub total_installments: Money,
    pub total_reinforcements: Money,
    pub total_key_payments: Money,
    pub reinforcement_months: Vec<Month>,
    /// down payment + total_corrected_paid
    pub grand_total_paid: Money,
}

/// Complete schedule for months 0..=payment_months.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub items: Vec<ScheduleLineItem>,
    pub down_payment: Money,
    pub financed_balance: Money,
    /// Level installment (automatic mode only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_installment: Option<Money>,
    /// Custom mode whose entries are missing or do not cover the financed balance
    pub incomplete: bool,
    /// financed_balance - sum of nominal payments
    pub unallocated: Money,
    pub summary: ScheduleSummary,
}

/// Nominal amounts due in a single month before correction.
#[derive(Debug, Clone, Default)]
struct MonthAllocation {
    installment: Money,
    reinforcement: Option<Money>,
    keys: Option<Money>,
}

impl MonthAllocation {
    fn total(&self) -> Money {
        self.installment + self.reinforcement.unwrap_or_default() + self.keys.unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

impl AmortizationSchedule {
    /// Last payment month covered by the schedule.
    pub fn last_month(&self) -> Month {
        self.items.last().map(|i| i.month).unwrap_or(0)
    }

    pub fn item(&self, month: Month) -> Option<&ScheduleLineItem> {
        self.items.get(month as usize)
    }

    /// Corrected balance still owed once the payment of `month` is made.
    /// Months past the end of the schedule report the final position.
    pub fn outstanding_after(&self, month: Month) -> Money {
        let month = month.min(self.last_month());
        if month == 0 {
            return self.financed_balance;
        }
        match self.item(month) {
            Some(item) => {
                let factor = Decimal::ONE + item.accumulated_correction / Decimal::ONE_HUNDRED;
                ((item.net_balance - item.total_payment) * factor).max(Decimal::ZERO)
            }
            None => self.financed_balance,
        }
    }

    /// Corrected amount paid in each month 0..=horizon, zero past the end.
    pub fn corrected_payments(&self, horizon: Month) -> Vec<Money> {
        (0..=horizon)
            .map(|m| {
                self.item(m)
                    .map(|i| i.total_corrected_payment)
                    .unwrap_or(Decimal::ZERO)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the month-by-month amortization schedule under monetary correction.
///
/// Month 0 holds the down payment. Automatic mode spreads the financed
/// balance (net of reinforcements and key payment) into level installments;
/// custom mode replays the supplied entries. Each nominal amount is corrected
/// by the factor of the month it falls due. The uncorrected running balance
/// is never fed by correction.
pub fn build_schedule(
    params: &CalculationParameters,
) -> ProjectionResult<ComputationOutput<AmortizationSchedule>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let schedule = compute_schedule(params, &mut warnings)?;

    let methodology = match params.partitioning {
        PartitioningMode::Automatic { .. } => {
            "Automatic partitioning: level installments with additive monetary correction"
        }
        PartitioningMode::Custom { .. } => {
            "Custom partitioning: user entries with additive monetary correction"
        }
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        methodology,
        &serde_json::json!({
            "property_price": params.property_price.to_string(),
            "discount": params.discount.to_string(),
            "down_payment": schedule.down_payment.to_string(),
            "delivery_months": params.delivery_months,
            "payment_months": params.payment_months,
            "rate_before_delivery": params.correction.rate_before_delivery.to_string(),
            "rate_after_delivery": params.correction.rate_after_delivery.to_string(),
        }),
        warnings,
        elapsed,
        schedule,
    ))
}

/// Schedule without the output envelope; warnings go to the caller's list.
pub fn compute_schedule(
    params: &CalculationParameters,
    warnings: &mut Vec<String>,
) -> ProjectionResult<AmortizationSchedule> {
    params.validate()?;

    let down_payment = params.down_payment_amount();
    let financed = params.financed_balance();
    let n = params.payment_months;

    tracing::debug!(
        payment_months = n,
        financed = %financed,
        "building amortization schedule"
    );

    let (allocations, base_installment, r_months) = match &params.partitioning {
        PartitioningMode::Automatic {
            reinforcement,
            key_payment,
        } => {
            let mut allocations = vec![MonthAllocation::default(); n as usize + 1];

            let mut r_months = Vec::new();
            let mut total_reinforcements = Decimal::ZERO;
            if let Some(policy) = reinforcement.as_ref().filter(|r| !r.amount.is_zero()) {
                r_months = reinforcement_months(policy, n);
                for m in &r_months {
                    allocations[*m as usize].reinforcement = Some(policy.amount);
                }
                total_reinforcements = policy.amount * Decimal::from(r_months.len() as u64);
            }

            let mut total_keys = Decimal::ZERO;
            if let Some(key) = key_payment.as_ref().filter(|k| !k.amount.is_zero()) {
                let m = params.key_month(key);
                allocations[m as usize].keys = Some(key.amount);
                total_keys = key.amount;
            }

            let remaining = financed - total_reinforcements - total_keys;
            if remaining < Decimal::ZERO {
                return Err(ProjectionError::FinancialImpossibility(format!(
                    "Reinforcements ({total_reinforcements}) plus key payment ({total_keys}) \
                     exceed the financed balance ({financed})"
                )));
            }

            let base = remaining / Decimal::from(n);
            for alloc in allocations.iter_mut().skip(1) {
                alloc.installment = base;
            }
            (allocations, Some(base), r_months)
        }
        PartitioningMode::Custom { entries } => {
            if entries.is_empty() {
                push_warning(
                    warnings,
                    "Custom schedule has no entries; only the down payment is scheduled".into(),
                );
                (vec![MonthAllocation::default()], None, Vec::new())
            } else {
                let mut allocations = vec![MonthAllocation::default(); n as usize + 1];
                let mut r_months = BTreeSet::new();
                for entry in entries {
                    if entry.month == 0 || entry.month > n {
                        push_warning(
                            warnings,
                            format!(
                                "Custom entry at month {} ignored: outside payment months 1..={n}",
                                entry.month
                            ),
                        );
                        continue;
                    }
                    let alloc = &mut allocations[entry.month as usize];
                    match entry.kind {
                        PaymentKind::Installment => alloc.installment += entry.amount,
                        PaymentKind::Reinforcement => {
                            *alloc.reinforcement.get_or_insert(Decimal::ZERO) += entry.amount;
                            r_months.insert(entry.month);
                        }
                        PaymentKind::Keys => {
                            *alloc.keys.get_or_insert(Decimal::ZERO) += entry.amount
                        }
                    }
                }
                (allocations, None, r_months.into_iter().collect())
            }
        }
    };

    let horizon = (allocations.len() - 1) as Month;
    let steps = correction_steps(&params.correction, params.delivery_months, horizon);

    let mut items = Vec::with_capacity(allocations.len());
    items.push(ScheduleLineItem {
        month: 0,
        correction_rate: Decimal::ZERO,
        accumulated_correction: Decimal::ZERO,
        base_installment: Decimal::ZERO,
        corrected_installment: Decimal::ZERO,
        down_payment: Some(PaymentAmount {
            base: down_payment,
            corrected: down_payment,
        }),
        reinforcement: None,
        key_payment: None,
        total_payment: down_payment,
        total_corrected_payment: down_payment,
        net_balance: financed,
        corrected_balance: None,
    });

    let mut balance = financed;
    let mut previous_payment = Decimal::ZERO;
    for (alloc, step) in allocations.iter().zip(steps.iter()).skip(1) {
        if step.month > 1 {
            balance -= previous_payment;
        }
        items.push(line_item(alloc, step, balance));
        previous_payment = alloc.total();
    }

    let summary = summarize(&items, down_payment, r_months);
    let allocated: Money = allocations.iter().map(MonthAllocation::total).sum();
    let unallocated = financed - allocated;

    let incomplete = match params.partitioning {
        PartitioningMode::Automatic { .. } => false,
        PartitioningMode::Custom { .. } => {
            horizon == 0 || unallocated.abs() > RECONCILIATION_TOLERANCE
        }
    };
    if incomplete && horizon > 0 {
        push_warning(
            warnings,
            format!("Custom entries leave {unallocated} of the financed balance unallocated"),
        );
    }

    tracing::debug!(
        items = items.len(),
        incomplete,
        total_corrected = %summary.total_corrected_paid,
        "amortization schedule built"
    );

    Ok(AmortizationSchedule {
        items,
        down_payment,
        financed_balance: financed,
        base_installment,
        incomplete,
        unallocated,
        summary,
    })
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

fn corrected(base: Money, step: &CorrectionStep) -> PaymentAmount {
    PaymentAmount {
        base,
        corrected: base * step.factor,
    }
}

fn line_item(alloc: &MonthAllocation, step: &CorrectionStep, balance: Money) -> ScheduleLineItem {
    let installment = corrected(alloc.installment, step);
    let reinforcement = alloc.reinforcement.map(|r| corrected(r, step));
    let key_payment = alloc.keys.map(|k| corrected(k, step));

    let total_corrected = installment.corrected
        + reinforcement.as_ref().map(|r| r.corrected).unwrap_or_default()
        + key_payment.as_ref().map(|k| k.corrected).unwrap_or_default();

    ScheduleLineItem {
        month: step.month,
        correction_rate: step.rate,
        accumulated_correction: step.accumulated,
        base_installment: installment.base,
        corrected_installment: installment.corrected,
        down_payment: None,
        reinforcement,
        key_payment,
        total_payment: alloc.total(),
        total_corrected_payment: total_corrected,
        net_balance: balance,
        corrected_balance: Some(balance * step.factor),
    }
}

fn summarize(items: &[ScheduleLineItem], down_payment: Money, r_months: Vec<Month>) -> ScheduleSummary {
    let payments = items.iter().skip(1);

    let total_base_paid: Money = payments.clone().map(|i| i.total_payment).sum();
    let total_corrected_paid: Money = payments.clone().map(|i| i.total_corrected_payment).sum();
    let total_installments: Money = payments.clone().map(|i| i.base_installment).sum();
    let total_reinforcements: Money = payments
        .clone()
        .filter_map(|i| i.reinforcement.as_ref().map(|r| r.base))
        .sum();
    let total_key_payments: Money = payments
        .filter_map(|i| i.key_payment.as_ref().map(|k| k.base))
        .sum();

    let total_correction = total_corrected_paid - total_base_paid;
    let correction_pct = if total_base_paid.is_zero() {
        Decimal::ZERO
    } else {
        total_correction / total_base_paid * Decimal::ONE_HUNDRED
    };

    ScheduleSummary {
        total_base_paid,
        total_corrected_paid,
        total_correction,
        correction_pct,
        total_installments,
        total_reinforcements,
        total_key_payments,
        reinforcement_months: r_months,
        grand_total_paid: down_payment + total_corrected_paid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::params::{
        CustomEntry, DownPayment, KeyPayment, Periodicity, ReinforcementPolicy,
    };
    use crate::correction::accumulator::CorrectionRates;

    fn base_params() -> CalculationParameters {
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
    fn test_schedule_length() {
        let out = build_schedule(&base_params()).unwrap();
        assert_eq!(out.result.items.len(), 121);
        assert!(!out.result.incomplete);
    }

    #[test]
    fn test_month_zero_holds_down_payment() {
        let s = build_schedule(&base_params()).unwrap().result;
        let m0 = &s.items[0];
        assert_eq!(m0.down_payment.as_ref().unwrap().base, dec!(100000));
        assert_eq!(m0.net_balance, dec!(400000));
        assert!(m0.corrected_balance.is_none());
        assert_eq!(m0.accumulated_correction, Decimal::ZERO);
    }

    #[test]
    fn test_level_installment_and_month_one_correction() {
        let s = build_schedule(&base_params()).unwrap().result;
        let base = s.base_installment.unwrap();
        assert!((base - dec!(3333.33)).abs() < dec!(0.01));
        assert!((s.items[1].corrected_installment - dec!(3350.00)).abs() < dec!(0.01));
    }

    #[test]
    fn test_balance_not_reduced_until_month_two() {
        let s = build_schedule(&base_params()).unwrap().result;
        assert_eq!(s.items[1].net_balance, dec!(400000));
        let expected = dec!(400000) - s.base_installment.unwrap();
        assert_eq!(s.items[2].net_balance, expected);
        assert_eq!(
            s.items[2].corrected_balance.unwrap(),
            expected * dec!(1.01)
        );
    }

    #[test]
    fn test_reinforcement_and_keys_reconcile() {
        let mut p = base_params();
        p.partitioning = PartitioningMode::Automatic {
            reinforcement: Some(ReinforcementPolicy {
                periodicity: Periodicity::Annual,
                amount: dec!(10000),
            }),
            key_payment: Some(KeyPayment {
                amount: dec!(50000),
                month: None,
            }),
        };
        let s = build_schedule(&p).unwrap().result;
        assert_eq!(s.summary.reinforcement_months.len(), 10);
        assert_eq!(s.summary.total_reinforcements, dec!(100000));
        assert_eq!(s.summary.total_key_payments, dec!(50000));
        assert!(s.items[36].key_payment.is_some());
        let total = s.summary.total_installments
            + s.summary.total_reinforcements
            + s.summary.total_key_payments;
        assert!((total - s.financed_balance).abs() <= RECONCILIATION_TOLERANCE);
    }

    #[test]
    fn test_extraordinary_payments_exceeding_balance() {
        let mut p = base_params();
        p.partitioning = PartitioningMode::Automatic {
            reinforcement: None,
            key_payment: Some(KeyPayment {
                amount: dec!(500000),
                month: Some(12),
            }),
        };
        assert!(matches!(
            build_schedule(&p),
            Err(ProjectionError::FinancialImpossibility(_))
        ));
    }

    #[test]
    fn test_custom_empty_is_incomplete() {
        let mut p = base_params();
        p.partitioning = PartitioningMode::Custom { entries: vec![] };
        let out = build_schedule(&p).unwrap();
        assert_eq!(out.result.items.len(), 1);
        assert!(out.result.incomplete);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_custom_entries_replayed() {
        let mut p = base_params();
        p.payment_months = 4;
        p.partitioning = PartitioningMode::Custom {
            entries: vec![
                CustomEntry {
                    month: 2,
                    amount: dec!(150000),
                    kind: PaymentKind::Installment,
                },
                CustomEntry {
                    month: 4,
                    amount: dec!(250000),
                    kind: PaymentKind::Keys,
                },
            ],
        };
        let s = build_schedule(&p).unwrap().result;
        assert_eq!(s.items.len(), 5);
        assert!(!s.incomplete);
        assert_eq!(s.items[1].total_payment, Decimal::ZERO);
        // accumulated at month 2 = 1.0%
        assert_eq!(s.items[2].corrected_installment, dec!(151500));
        assert_eq!(s.items[4].key_payment.as_ref().unwrap().corrected, dec!(255000));
        assert_eq!(s.items[3].net_balance, dec!(250000));
        assert!(s.base_installment.is_none());
    }

    #[test]
    fn test_custom_partial_flags_incomplete() {
        let mut p = base_params();
        p.partitioning = PartitioningMode::Custom {
            entries: vec![CustomEntry {
                month: 1,
                amount: dec!(1000),
                kind: PaymentKind::Installment,
            }],
        };
        let s = build_schedule(&p).unwrap().result;
        assert!(s.incomplete);
        assert_eq!(s.unallocated, dec!(399000));
    }

    #[test]
    fn test_outstanding_after_full_term_is_zero() {
        let s = build_schedule(&base_params()).unwrap().result;
        assert!(s.outstanding_after(120) < dec!(0.01));
        assert!(s.outstanding_after(500) < dec!(0.01));
        assert_eq!(s.outstanding_after(0), dec!(400000));
    }
}
