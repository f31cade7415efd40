use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::correction::accumulator::CorrectionRates;
use crate::error::ProjectionError;
use crate::types::{pct_to_rate, Money, Month, Percent};
use crate::ProjectionResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Down payment given either as an amount or as a share of the list price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownPayment {
    Value(Money),
    /// Percentage of the list price, rounded to cents
    Percentage(Percent),
}

/// How often a reinforcement (extraordinary payment) falls due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Periodicity {
    Bimonthly,
    Quarterly,
    Semiannual,
    Annual,
}

impl Periodicity {
    pub fn months(&self) -> Month {
        match self {
            Periodicity::Bimonthly => 2,
            Periodicity::Quarterly => 3,
            Periodicity::Semiannual => 6,
            Periodicity::Annual => 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReinforcementPolicy {
    pub periodicity: Periodicity,
    /// Nominal amount of each reinforcement
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPayment {
    /// Nominal lump sum due on key delivery
    pub amount: Money,
    /// Month the lump sum falls due; defaults to the delivery month
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<Month>,
}

/// What a custom entry pays for; decides which line-item field it fills.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    #[default]
    Installment,
    Reinforcement,
    Keys,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomEntry {
    pub month: Month,
    pub amount: Money,
    #[serde(default)]
    pub kind: PaymentKind,
}

/// How the financed balance is split into payments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PartitioningMode {
    /// Level installments over the payment term, net of any reinforcements
    /// and key payment
    Automatic {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reinforcement: Option<ReinforcementPolicy>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key_payment: Option<KeyPayment>,
    },
    /// User-supplied payments replayed verbatim
    Custom {
        #[serde(default)]
        entries: Vec<CustomEntry>,
    },
}

impl Default for PartitioningMode {
    fn default() -> Self {
        PartitioningMode::Automatic {
            reinforcement: None,
            key_payment: None,
        }
    }
}

/// Everything the schedule builder needs for one computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationParameters {
    /// List price of the unit
    pub property_price: Money,
    /// Discount off the list price
    #[serde(default)]
    pub discount: Money,
    pub down_payment: DownPayment,
    /// Months until key delivery; the correction regime switches after it
    pub delivery_months: Month,
    /// Number of monthly payments after the down payment
    pub payment_months: Month,
    pub correction: CorrectionRates,
    #[serde(default)]
    pub partitioning: PartitioningMode,
}

// ---------------------------------------------------------------------------
// Derived values
// ---------------------------------------------------------------------------

impl CalculationParameters {
    /// Down payment amount in currency.
    pub fn down_payment_amount(&self) -> Money {
        match &self.down_payment {
            DownPayment::Value(v) => *v,
            DownPayment::Percentage(p) => (self.property_price * pct_to_rate(*p)).round_dp(2),
        }
    }

    /// List price net of discount.
    pub fn acquisition_price(&self) -> Money {
        self.property_price - self.discount
    }

    /// price - discount - down payment
    pub fn financed_balance(&self) -> Money {
        self.acquisition_price() - self.down_payment_amount()
    }

    /// Reject parameters that cannot describe a real purchase.
    pub fn validate(&self) -> ProjectionResult<()> {
        if self.payment_months == 0 {
            return Err(ProjectionError::invalid(
                "payment_months",
                "Payment term must be at least one month",
            ));
        }
        if self.property_price < Decimal::ZERO {
            return Err(ProjectionError::invalid(
                "property_price",
                "Property price cannot be negative",
            ));
        }
        if self.discount < Decimal::ZERO {
            return Err(ProjectionError::invalid(
                "discount",
                "Discount cannot be negative",
            ));
        }
        match &self.down_payment {
            DownPayment::Value(v) if *v < Decimal::ZERO => {
                return Err(ProjectionError::invalid(
                    "down_payment",
                    "Down payment cannot be negative",
                ));
            }
            DownPayment::Percentage(p) if *p < Decimal::ZERO || *p > Decimal::ONE_HUNDRED => {
                return Err(ProjectionError::invalid(
                    "down_payment",
                    "Down payment percentage must be between 0 and 100",
                ));
            }
            _ => {}
        }
        if self.financed_balance() < Decimal::ZERO {
            return Err(ProjectionError::invalid(
                "down_payment",
                "Down payment plus discount exceeds the property price",
            ));
        }
        self.correction.validate()?;

        match &self.partitioning {
            PartitioningMode::Automatic {
                reinforcement,
                key_payment,
            } => {
                if let Some(r) = reinforcement {
                    if r.amount < Decimal::ZERO {
                        return Err(ProjectionError::invalid(
                            "reinforcement.amount",
                            "Reinforcement amount cannot be negative",
                        ));
                    }
                }
                if let Some(k) = key_payment {
                    if k.amount < Decimal::ZERO {
                        return Err(ProjectionError::invalid(
                            "key_payment.amount",
                            "Key payment cannot be negative",
                        ));
                    }
                    let month = self.key_month(k);
                    if month == 0 || month > self.payment_months {
                        return Err(ProjectionError::invalid(
                            "key_payment.month",
                            format!(
                                "Key payment month {month} must fall within 1..={}",
                                self.payment_months
                            ),
                        ));
                    }
                }
            }
            PartitioningMode::Custom { entries } => {
                if let Some(e) = entries.iter().find(|e| e.amount < Decimal::ZERO) {
                    return Err(ProjectionError::invalid(
                        "entries",
                        format!("Custom payment at month {} cannot be negative", e.month),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Month the key payment falls due.
    pub fn key_month(&self, key: &KeyPayment) -> Month {
        key.month.unwrap_or(self.delivery_months)
    }
}

/// Months carrying a reinforcement: every multiple of the periodicity up to
/// and including the last payment month.
pub fn reinforcement_months(policy: &ReinforcementPolicy, payment_months: Month) -> Vec<Month> {
    let step = policy.periodicity.months();
    (1..=payment_months / step).map(|k| k * step).collect()
}
