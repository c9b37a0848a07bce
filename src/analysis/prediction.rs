use log::warn;
use serde::Serialize;

use super::stats::LinearFit;
use crate::data::model::NumericSubset;
use crate::error::{AnalysisError, AnalysisResult};

pub const MIN_ROWS: usize = 10;
const HISTORY_POINTS: usize = 10;
const FORECAST_POINTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelinePoint {
    /// Row label, `t{index}`.
    pub time: String,
    pub value: f64,
}

impl TimelinePoint {
    fn at(index: usize, value: f64) -> Self {
        TimelinePoint {
            time: format!("t{index}"),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub feature: String,
    /// Last observed value.
    pub current: f64,
    /// Fitted value at the next row index.
    pub predicted: f64,
    /// R² of the fit, clamped to `[0, 1]`.
    pub confidence: f64,
    /// Recent history followed by the forecast.
    pub timeline: Vec<TimelinePoint>,
    pub description: String,
}

/// Extrapolate each numeric column one step past the last row.
pub fn make_predictions(numeric: &NumericSubset) -> Vec<Prediction> {
    if numeric.n_columns() < 1 || numeric.n_rows() < MIN_ROWS {
        return Vec::new();
    }

    let mut predictions: Vec<Prediction> = numeric
        .names
        .iter()
        .enumerate()
        .filter_map(|(index, name)| match column_prediction(numeric, index) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!("prediction skipped column {name}: {e}");
                None
            }
        })
        .collect();

    predictions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    predictions
}

fn column_prediction(numeric: &NumericSubset, index: usize) -> AnalysisResult<Prediction> {
    let name = numeric.names[index].as_str();
    let values = numeric.complete_column(index)?;
    let fit = LinearFit::fit(&values)?;

    let n = values.len();
    let predicted = fit.predict(n as f64);
    let confidence = fit.r_squared(&values).clamp(0.0, 1.0);
    if !predicted.is_finite() || confidence.is_nan() {
        return Err(AnalysisError::NonFinite("prediction"));
    }

    let history_start = n.saturating_sub(HISTORY_POINTS);
    let mut timeline: Vec<TimelinePoint> = (history_start..n)
        .map(|i| TimelinePoint::at(i, values[i]))
        .collect();
    timeline.extend((n..n + FORECAST_POINTS).map(|i| TimelinePoint::at(i, fit.predict(i as f64))));

    let current = values[n - 1];
    Ok(Prediction {
        feature: name.to_string(),
        current,
        predicted,
        confidence,
        timeline,
        description: format!(
            "Based on current trends, {name} is predicted to be {predicted:.2} (current: {current:.2})."
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subset(columns: &[(&str, Vec<f64>)]) -> NumericSubset {
        NumericSubset {
            names: columns.iter().map(|(n, _)| n.to_string()).collect(),
            values: columns
                .iter()
                .map(|(_, v)| v.iter().copied().map(Some).collect())
                .collect(),
            n_rows: columns.first().map_or(0, |(_, v)| v.len()),
        }
    }

    #[test]
    fn perfect_line_predicts_next_value() {
        let line: Vec<f64> = (0..12).map(|i| 10.0 + 3.0 * i as f64).collect();
        let preds = make_predictions(&subset(&[("line", line)]));
        assert_eq!(preds.len(), 1);
        let p = &preds[0];
        assert!((p.predicted - 46.0).abs() < 1e-9);
        assert_eq!(p.current, 43.0);
        assert!((p.confidence - 1.0).abs() < 1e-12);

        assert_eq!(p.timeline.len(), 15);
        assert_eq!(p.timeline[0].time, "t2");
        assert_eq!(p.timeline[9].time, "t11");
        assert_eq!(p.timeline[10].time, "t12");
        assert_eq!(p.timeline[14].time, "t16");
    }

    #[test]
    fn constant_column_has_zero_confidence() {
        let preds = make_predictions(&subset(&[("flat", vec![7.0; 10])]));
        assert_eq!(preds.len(), 1);
        assert_eq!(preds[0].confidence, 0.0);
        assert_eq!(preds[0].predicted, 7.0);
    }

    #[test]
    fn sorted_by_confidence_and_bounded() {
        let noisy: Vec<f64> = (0..20).map(|i| if i % 2 == 0 { 1.0 } else { 9.0 }).collect();
        let line: Vec<f64> = (0..20).map(f64::from).collect();
        let preds = make_predictions(&subset(&[("noisy", noisy), ("line", line)]));
        assert_eq!(preds[0].feature, "line");
        for p in &preds {
            assert!((0.0..=1.0).contains(&p.confidence));
        }
    }

    #[test]
    fn fewer_than_ten_rows_yields_nothing() {
        let preds = make_predictions(&subset(&[("short", vec![1.0, 2.0, 3.0])]));
        assert!(preds.is_empty());
    }
}
