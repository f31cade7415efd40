use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use realty_projection_core::amortization::params::CalculationParameters;
use realty_projection_core::amortization::schedule;
use realty_projection_core::correction::accumulator::{self, CorrectionTableInput};
use realty_projection_core::correction::index;
use realty_projection_core::returns::metrics::{self, ReturnMetricsInput};
use realty_projection_core::scenarios::orchestrator::{self, ProjectionInput};
use realty_projection_core::strategies::{self, StrategyInput};
use realty_projection_core::ProjectionResult;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// JSON request in, JSON envelope out.
fn run_json<I, O, F>(input_json: &str, compute: F) -> NapiResult<String>
where
    I: DeserializeOwned,
    O: Serialize,
    F: FnOnce(&I) -> ProjectionResult<O>,
{
    let input: I = serde_json::from_str(input_json).map_err(to_napi_error)?;
    let output = compute(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Schedule and correction
// ---------------------------------------------------------------------------

#[napi]
pub fn build_schedule(input_json: String) -> NapiResult<String> {
    run_json(&input_json, |p: &CalculationParameters| schedule::build_schedule(p))
}

#[napi]
pub fn correction_table(input_json: String) -> NapiResult<String> {
    run_json(&input_json, |i: &CorrectionTableInput| accumulator::correction_table(i))
}

#[derive(Deserialize)]
struct IndexAverageInput {
    /// Monthly readings (%), oldest first
    history: Vec<Decimal>,
    window: usize,
}

/// Resolve a monthly index history to the plain rate the schedule expects.
#[napi]
pub fn average_index_rate(input_json: String) -> NapiResult<String> {
    run_json(&input_json, |i: &IndexAverageInput| {
        index::average_monthly_rate(&i.history, i.window)
    })
}

// ---------------------------------------------------------------------------
// Returns and projections
// ---------------------------------------------------------------------------

#[napi]
pub fn return_metrics(input_json: String) -> NapiResult<String> {
    run_json(&input_json, |i: &ReturnMetricsInput| metrics::calculate_return_metrics(i))
}

#[napi]
pub fn evaluate_strategy(input_json: String) -> NapiResult<String> {
    run_json(&input_json, |i: &StrategyInput| strategies::evaluate_strategy(i))
}

#[napi]
pub fn run_projection(input_json: String) -> NapiResult<String> {
    run_json(&input_json, |i: &ProjectionInput| orchestrator::run_projection(i))
}
