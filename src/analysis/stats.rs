//! Numeric kernels shared by the analyzers.
//!
//! Every function here short-circuits on empty input instead of dividing by
//! zero: either an `Option`/`Result` signals "no answer", or the caller has
//! already checked the length.

use crate::error::{AnalysisError, AnalysisResult};

/// Guard below which a value is treated as zero.
pub const EPSILON: f64 = 1e-10;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    Some(if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    })
}

/// Standard deviation with `ddof` delta degrees of freedom.
fn std_dev(values: &[f64], ddof: usize) -> Option<f64> {
    if values.len() <= ddof {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - ddof) as f64).sqrt())
}

/// Population standard deviation (divides by n).
pub fn population_std(values: &[f64]) -> Option<f64> {
    std_dev(values, 0)
}

/// Sample standard deviation (divides by n - 1).
pub fn sample_std(values: &[f64]) -> Option<f64> {
    std_dev(values, 1)
}

/// Pearson correlation over the rows where both columns have a value.
///
/// Returns `None` with fewer than two complete pairs or when either side has
/// zero variance.
pub fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .unzip();
    if xs.len() < 2 {
        return None;
    }
    let mx = mean(&xs)?;
    let my = mean(&ys)?;

    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (x, y) in xs.iter().zip(&ys) {
        let dx = x - mx;
        let dy = y - my;
        cov += dx * dy;
        vx += dx * dx;
        vy += dy * dy;
    }
    if vx <= 0.0 || vy <= 0.0 {
        return None;
    }
    let r = cov / (vx.sqrt() * vy.sqrt());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Round to `decimals` places, ties to even (numpy/pandas `round`).
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// `count` evenly spaced positions over `0..=last`, truncated to integers.
pub fn linspace_indices(last: usize, count: usize) -> Vec<usize> {
    match count {
        0 => Vec::new(),
        1 => vec![0],
        _ => {
            let step = last as f64 / (count - 1) as f64;
            (0..count)
                .map(|i| ((i as f64 * step) as usize).min(last))
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// Linear model of value vs. row index
// ---------------------------------------------------------------------------

/// Ordinary least squares fit of `y = intercept + slope * index`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    /// Fit against the row index `0..values.len()`.
    pub fn fit(values: &[f64]) -> AnalysisResult<Self> {
        let n = values.len();
        if n == 0 {
            return Err(AnalysisError::Empty);
        }
        let mean_y = values.iter().sum::<f64>() / n as f64;
        if n == 1 {
            return Ok(LinearFit {
                slope: 0.0,
                intercept: mean_y,
            });
        }

        let mean_x = (n - 1) as f64 / 2.0;
        let mut sxy = 0.0;
        let mut sxx = 0.0;
        for (i, y) in values.iter().enumerate() {
            let dx = i as f64 - mean_x;
            sxy += dx * (y - mean_y);
            sxx += dx * dx;
        }
        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;

        if !slope.is_finite() || !intercept.is_finite() {
            return Err(AnalysisError::NonFinite("linear fit"));
        }
        Ok(LinearFit { slope, intercept })
    }

    pub fn predict(&self, index: f64) -> f64 {
        self.intercept + self.slope * index
    }

    /// Coefficient of determination on the training values. Zero when the
    /// values have no variance.
    pub fn r_squared(&self, values: &[f64]) -> f64 {
        let Some(m) = mean(values) else {
            return 0.0;
        };
        let ss_total: f64 = values.iter().map(|y| (y - m).powi(2)).sum();
        if ss_total <= 0.0 {
            return 0.0;
        }
        let ss_residual: f64 = values
            .iter()
            .enumerate()
            .map(|(i, y)| (y - self.predict(i as f64)).powi(2))
            .sum();
        1.0 - ss_residual / ss_total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_moments() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(mean(&v), Some(2.5));
        assert_eq!(median(&v), Some(2.5));
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert!((population_std(&v).unwrap() - 1.118_033_988_7).abs() < 1e-9);
        assert!((sample_std(&v).unwrap() - 1.290_994_448_7).abs() < 1e-9);
        assert_eq!(mean(&[]), None);
        assert_eq!(sample_std(&[1.0]), None);
    }

    #[test]
    fn pearson_uses_complete_pairs() {
        let a = [Some(1.0), Some(2.0), None, Some(4.0)];
        let b = [Some(2.0), Some(4.0), Some(100.0), Some(8.0)];
        let r = pearson(&a, &b).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_of_constant_column_is_none() {
        let a = [Some(1.0), Some(1.0), Some(1.0)];
        let b = [Some(1.0), Some(2.0), Some(3.0)];
        assert_eq!(pearson(&a, &b), None);
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(0.456, 2), 0.46);
        assert_eq!(round_to(-0.714, 2), -0.71);
        // Exact binary halves go to the even neighbour.
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(-0.125, 2), -0.12);
        assert_eq!(round_to(0.375, 2), 0.38);
    }

    #[test]
    fn linspace_matches_truncated_numpy_positions() {
        assert_eq!(linspace_indices(11, 12), (0..12).collect::<Vec<_>>());
        assert_eq!(linspace_indices(0, 1), vec![0]);
        let picks = linspace_indices(99, 20);
        assert_eq!(picks.len(), 20);
        assert_eq!(picks[0], 0);
        assert_eq!(picks[19], 99);
        assert_eq!(picks[1], 5);
    }

    #[test]
    fn linear_fit_recovers_line() {
        let values: Vec<f64> = (0..10).map(|i| 3.0 + 2.0 * i as f64).collect();
        let fit = LinearFit::fit(&values).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 3.0).abs() < 1e-12);
        assert!((fit.r_squared(&values) - 1.0).abs() < 1e-12);
        assert!((fit.predict(10.0) - 23.0).abs() < 1e-9);
    }

    #[test]
    fn constant_series_has_zero_r_squared() {
        let values = [5.0; 12];
        let fit = LinearFit::fit(&values).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.r_squared(&values), 0.0);
    }

    #[test]
    fn empty_fit_is_an_error() {
        assert_eq!(LinearFit::fit(&[]), Err(AnalysisError::Empty));
    }
}
