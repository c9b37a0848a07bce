use log::warn;
use serde::Serialize;

use super::stats::{mean, median, sample_std};
use crate::data::model::NumericSubset;
use crate::error::{AnalysisError, AnalysisResult};

/// Descriptive statistics for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStatistics {
    pub feature: String,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation; 0 with a single value.
    #[serde(rename = "stdDev")]
    pub std_dev: f64,
}

/// Describe every numeric column, in column order.
pub fn describe_columns(numeric: &NumericSubset) -> Vec<ColumnStatistics> {
    numeric
        .columns()
        .filter_map(|(name, values)| {
            let present: Vec<f64> = values.iter().flatten().copied().collect();
            match describe(name, &present) {
                Ok(stats) => Some(stats),
                Err(AnalysisError::Empty) => None,
                Err(e) => {
                    warn!("statistics skipped column {name}: {e}");
                    None
                }
            }
        })
        .collect()
}

fn describe(name: &str, values: &[f64]) -> AnalysisResult<ColumnStatistics> {
    let mean = mean(values).ok_or(AnalysisError::Empty)?;
    let median = median(values).ok_or(AnalysisError::Empty)?;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let std_dev = sample_std(values).unwrap_or(0.0);

    if !mean.is_finite() || !std_dev.is_finite() {
        return Err(AnalysisError::NonFinite("statistics"));
    }

    Ok(ColumnStatistics {
        feature: name.to_string(),
        mean,
        median,
        min,
        max,
        std_dev,
    })
}
