use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use realty_projection_core::returns::metrics::{self, ReturnMetricsInput};

use crate::input;

/// Arguments for return metrics
#[derive(Args)]
pub struct ReturnsArgs {
    /// Path to a JSON or YAML request file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Monthly cash flows starting at month 0 (comma-separated, e.g. "-1000,0,1100")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,
}

pub fn run_returns(args: ReturnsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let returns_input: ReturnMetricsInput = match input::read_request(args.input.as_deref())? {
        Some(request) => request,
        None => {
            let cash_flows = args
                .cash_flows
                .ok_or("--cash-flows is required (or provide --input)")?;
            ReturnMetricsInput { cash_flows }
        }
    };

    let result = metrics::calculate_return_metrics(&returns_input)?;
    Ok(serde_json::to_value(result)?)
}
