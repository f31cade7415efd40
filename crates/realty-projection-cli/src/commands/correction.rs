use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use realty_projection_core::correction::accumulator::{
    self, CorrectionRates, CorrectionTableInput,
};

use crate::input;

/// Arguments for the correction table
#[derive(Args)]
pub struct CorrectionArgs {
    /// Path to a JSON or YAML request file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Monthly rate (%) up to and including the delivery month
    #[arg(long)]
    pub before: Option<Decimal>,

    /// Monthly rate (%) after the delivery month
    #[arg(long)]
    pub after: Option<Decimal>,

    /// Delivery month
    #[arg(long, default_value = "0")]
    pub delivery_month: u32,

    /// Number of months to tabulate
    #[arg(long, default_value = "12")]
    pub months: u32,
}

pub fn run_correction(args: CorrectionArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let table_input: CorrectionTableInput = match input::read_request(args.input.as_deref())? {
        Some(request) => request,
        None => {
            let before = args
                .before
                .ok_or("--before is required (or provide --input)")?;
            CorrectionTableInput {
                rates: CorrectionRates {
                    rate_before_delivery: before,
                    rate_after_delivery: args.after.unwrap_or(before),
                    index: None,
                },
                delivery_month: args.delivery_month,
                horizon_months: args.months,
            }
        }
    };

    let result = accumulator::correction_table(&table_input)?;
    Ok(serde_json::to_value(result)?)
}
