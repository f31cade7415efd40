use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Percentage points (0.8 = 0.8%). Correction rates, fees, taxes, ROI and
/// IRR are always carried this way, never pre-divided.
pub type Percent = Decimal;

/// Plain fractions (0.05 = 5%). Only the time-value primitives use these.
pub type Rate = Decimal;

/// Month index within a projection. Month 0 is the down-payment month.
pub type Month = u32;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Convert percentage points to a plain fraction.
pub fn pct_to_rate(pct: Percent) -> Rate {
    pct / HUNDRED
}

/// Convert a plain fraction to percentage points.
pub fn rate_to_pct(rate: Rate) -> Percent {
    rate * HUNDRED
}

/// A single signed cash flow at a month offset, labelled for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowEvent {
    pub month: Month,
    pub label: String,
    /// Negative for investor payments, positive for receipts
    pub amount: Money,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

/// Record a non-fatal condition both in the envelope and in the log.
pub(crate) fn push_warning(warnings: &mut Vec<String>, message: String) {
    tracing::warn!("{message}");
    warnings.push(message);
}
