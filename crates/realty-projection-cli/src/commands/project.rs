use clap::Args;
use serde_json::Value;

use realty_projection_core::scenarios::orchestrator::{self, ProjectionInput};
use realty_projection_core::strategies::{self, StrategyInput};

use crate::input;

/// Arguments for a single strategy evaluation
#[derive(Args)]
pub struct StrategyArgs {
    /// Path to a JSON or YAML request file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_strategy(args: StrategyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let strategy_input: StrategyInput = match input::read_request(args.input.as_deref())? {
        Some(request) => request,
        None => return Err("--input <file> or piped JSON required for strategy".into()),
    };
    let result = strategies::evaluate_strategy(&strategy_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for a strategy x scenario projection
#[derive(Args)]
pub struct ProjectArgs {
    /// Path to a JSON or YAML request file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_project(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let projection_input: ProjectionInput = match input::read_request(args.input.as_deref())? {
        Some(request) => request,
        None => return Err("--input <file> or piped JSON required for projection".into()),
    };
    let result = orchestrator::run_projection(&projection_input)?;
    Ok(serde_json::to_value(result)?)
}
