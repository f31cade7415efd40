use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ProjectionError;
use crate::types::Percent;
use crate::ProjectionResult;

/// Market indices a contract may use for monetary correction.
///
/// Only a tag: the surrounding application resolves the index to a plain
/// monthly rate and passes the number in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionIndex {
    /// National construction cost index
    Incc,
    /// Broad consumer price index
    Ipca,
    /// General market price index
    IgpM,
    /// Basic unit construction cost (state-level)
    CubSc,
}

impl CorrectionIndex {
    pub fn label(&self) -> &'static str {
        match self {
            CorrectionIndex::Incc => "INCC",
            CorrectionIndex::Ipca => "IPCA",
            CorrectionIndex::IgpM => "IGP-M",
            CorrectionIndex::CubSc => "CUB/SC",
        }
    }
}

/// Mean of the most recent `window` monthly readings of an index history
/// (oldest first). Uses the whole history when it is shorter than the window.
pub fn average_monthly_rate(history: &[Percent], window: usize) -> ProjectionResult<Percent> {
    if history.is_empty() {
        return Err(ProjectionError::InsufficientData(
            "Index history is empty".into(),
        ));
    }
    if window == 0 {
        return Err(ProjectionError::invalid(
            "window",
            "Averaging window must be at least one month",
        ));
    }

    let take = window.min(history.len());
    let recent = &history[history.len() - take..];
    let sum: Decimal = recent.iter().sum();
    Ok(sum / Decimal::from(take as u64))
}
