use log::warn;
use serde::Serialize;

use super::stats::{self, EPSILON};
use crate::data::model::NumericSubset;
use crate::error::{AnalysisError, AnalysisResult};

/// Fewer rows than this and z-scores are not meaningful.
pub const MIN_ROWS: usize = 10;
const Z_THRESHOLD: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    fn from_z(z: f64) -> Self {
        if z > 5.0 {
            Severity::High
        } else if z > 4.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    /// Ordinal used for sorting: high=3, medium=2, low=1.
    pub fn rank(self) -> u8 {
        match self {
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    pub feature: String,
    pub value: f64,
    /// Column mean.
    pub expected: f64,
    pub severity: Severity,
    /// Row index of the value.
    pub index: usize,
    /// Absolute z-score against the column.
    #[serde(rename = "zScore")]
    pub z_score: f64,
    pub description: String,
}

/// Flag values more than three standard deviations from their column mean.
///
/// z-scores use the mean and population standard deviation of the whole
/// column. Missing values are left out of both.
pub fn detect_anomalies(numeric: &NumericSubset) -> Vec<Anomaly> {
    if numeric.n_columns() < 1 || numeric.n_rows() < MIN_ROWS {
        return Vec::new();
    }

    let mut anomalies = Vec::new();
    for (name, values) in numeric.columns() {
        match column_anomalies(name, values) {
            Ok(found) => anomalies.extend(found),
            Err(e) => warn!("anomaly detection skipped column {name}: {e}"),
        }
    }

    // Stable: discovery order is kept within a severity.
    anomalies.sort_by(|a, b| b.severity.rank().cmp(&a.severity.rank()));
    anomalies
}

fn column_anomalies(name: &str, values: &[Option<f64>]) -> AnalysisResult<Vec<Anomaly>> {
    let present: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .collect();
    let column: Vec<f64> = present.iter().map(|&(_, v)| v).collect();

    let mean = stats::mean(&column).ok_or(AnalysisError::Empty)?;
    let std = stats::population_std(&column).ok_or(AnalysisError::Empty)?;
    // Constant column: every z-score is undefined, nothing stands out.
    if std <= EPSILON {
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for &(index, value) in &present {
        let z = ((value - mean) / std).abs();
        if !z.is_finite() {
            return Err(AnalysisError::NonFinite("z-score"));
        }
        if z <= Z_THRESHOLD {
            continue;
        }

        found.push(Anomaly {
            feature: name.to_string(),
            value,
            expected: mean,
            severity: Severity::from_z(z),
            index,
            z_score: z,
            description: format!(
                "Anomalous value of {value:.2} detected in {name} (z-score: {z:.2}), \
                 expected around {mean:.2} ± {std:.2}."
            ),
        });
    }
    Ok(found)
}
