use log::warn;
use serde::Serialize;

use super::stats::{EPSILON, LinearFit, linspace_indices};
use crate::data::model::NumericSubset;
use crate::error::{AnalysisError, AnalysisResult};

/// Slopes within ±this band count as flat.
const SLOPE_THRESHOLD: f64 = 0.01;
/// Maximum number of points in the charting curve.
const CURVE_POINTS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Stable,
}

impl Direction {
    fn from_slope(slope: f64) -> Self {
        if slope > SLOPE_THRESHOLD {
            Direction::Up
        } else if slope < -SLOPE_THRESHOLD {
            Direction::Down
        } else {
            Direction::Stable
        }
    }
}

/// One point of the fitted line, in row-index space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurvePoint {
    pub x: usize,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trend {
    pub feature: String,
    pub direction: Direction,
    /// Absolute percent change of the fitted line from first to last row.
    pub magnitude: f64,
    pub description: String,
    /// Down-sampled fitted line for charting.
    pub data: Vec<CurvePoint>,
}

/// Fit a line per numeric column against the row index; largest change first.
pub fn analyze_trends(numeric: &NumericSubset) -> Vec<Trend> {
    if numeric.n_columns() < 1 {
        return Vec::new();
    }

    let mut trends: Vec<Trend> = numeric
        .names
        .iter()
        .enumerate()
        .filter_map(|(index, name)| match column_trend(numeric, index) {
            Ok(trend) => Some(trend),
            Err(e) => {
                warn!("trend analysis skipped column {name}: {e}");
                None
            }
        })
        .collect();

    trends.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));
    trends
}

fn column_trend(numeric: &NumericSubset, index: usize) -> AnalysisResult<Trend> {
    let name = numeric.names[index].as_str();
    let values = numeric.complete_column(index)?;
    let fit = LinearFit::fit(&values)?;

    let last = values.len() - 1;
    let start = fit.predict(0.0);
    let end = fit.predict(last as f64);
    let percent_change = if start.abs() > EPSILON {
        100.0 * (end - start) / start.abs()
    } else {
        0.0
    };
    let magnitude = percent_change.abs();
    if !magnitude.is_finite() {
        return Err(AnalysisError::NonFinite("percent change"));
    }

    let direction = Direction::from_slope(fit.slope);
    let data = linspace_indices(last, values.len().min(CURVE_POINTS))
        .into_iter()
        .map(|x| CurvePoint {
            x,
            y: fit.predict(x as f64),
        })
        .collect();

    let description = match direction {
        Direction::Up => format!(
            "The {name} shows an upward trend with a {magnitude:.1}% change over the period."
        ),
        Direction::Down => format!(
            "The {name} shows a downward trend with a {magnitude:.1}% change over the period."
        ),
        Direction::Stable => format!(
            "The {name} remains stable with a {magnitude:.1}% change over the period."
        ),
    };

    Ok(Trend {
        feature: name.to_string(),
        direction,
        magnitude,
        description,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subset(columns: &[(&str, Vec<Option<f64>>)]) -> NumericSubset {
        NumericSubset {
            names: columns.iter().map(|(n, _)| n.to_string()).collect(),
            values: columns.iter().map(|(_, v)| v.clone()).collect(),
            n_rows: columns.first().map_or(0, |(_, v)| v.len()),
        }
    }

    fn full(values: impl IntoIterator<Item = f64>) -> Vec<Option<f64>> {
        values.into_iter().map(Some).collect()
    }

    #[test]
    fn rising_series_trends_up() {
        let numeric = subset(&[("x", full((1..=12).map(f64::from)))]);
        let trends = analyze_trends(&numeric);
        assert_eq!(trends.len(), 1);
        let t = &trends[0];
        assert_eq!(t.direction, Direction::Up);
        assert!(t.magnitude > 0.0);
        assert!((t.magnitude - 1100.0).abs() < 1e-6);
        assert_eq!(t.data.len(), 12);
        assert_eq!(t.data[0].x, 0);
        assert_eq!(t.data[11].x, 11);
        assert!(t.description.contains("upward"));
    }

    #[test]
    fn falling_and_flat_series() {
        let numeric = subset(&[
            ("down", full((0..30).map(|i| 100.0 - i as f64))),
            ("flat", full(std::iter::repeat(4.0).take(30))),
        ]);
        let trends = analyze_trends(&numeric);
        assert_eq!(trends.len(), 2);
        assert_eq!(trends[0].feature, "down");
        assert_eq!(trends[0].direction, Direction::Down);
        assert_eq!(trends[0].data.len(), 20);
        assert_eq!(trends[1].direction, Direction::Stable);
        assert_eq!(trends[1].magnitude, 0.0);
    }

    #[test]
    fn zero_start_reports_zero_magnitude() {
        let numeric = subset(&[("from_zero", full((0..10).map(f64::from)))]);
        let trends = analyze_trends(&numeric);
        assert_eq!(trends[0].direction, Direction::Up);
        assert_eq!(trends[0].magnitude, 0.0);
    }

    #[test]
    fn column_with_gaps_is_skipped() {
        let numeric = subset(&[
            ("gappy", vec![Some(1.0), None, Some(3.0)]),
            ("ok", full([1.0, 2.0, 3.0])),
        ]);
        let trends = analyze_trends(&numeric);
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].feature, "ok");
    }

    #[test]
    fn no_columns_no_trends() {
        assert!(analyze_trends(&NumericSubset::default()).is_empty());
    }

    #[test]
    fn near_zero_start_is_treated_as_zero() {
        // Fitted start is ~1e-12: nonzero, but inside the guard.
        let numeric = subset(&[("tiny_start", full((0..10).map(|i| 1e-12 + i as f64)))]);
        let trends = analyze_trends(&numeric);

        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].direction, Direction::Up);
        assert_eq!(trends[0].magnitude, 0.0);
        assert!(trends[0].data[0].y.abs() <= EPSILON);
    }

    #[test]
    fn start_above_guard_reports_percent_change() {
        let numeric = subset(&[("small_start", full((0..11).map(|i| 1e-6 + 1e-7 * i as f64)))]);
        let trends = analyze_trends(&numeric);

        assert!((trends[0].magnitude - 100.0).abs() < 1e-6);
    }
}
