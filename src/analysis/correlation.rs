use serde::Serialize;

use super::stats::{pearson, round_to};
use crate::data::model::NumericSubset;

/// Only pairs stronger than this are reported.
const MIN_ABS_CORRELATION: f64 = 0.3;
const STRONG_CORRELATION: f64 = 0.7;

/// A pair of numeric features whose Pearson correlation is notable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correlation {
    pub feature1: String,
    pub feature2: String,
    /// Pearson r rounded to two decimals.
    pub score: f64,
    pub description: String,
}

fn strength_label(r: f64) -> &'static str {
    if r > STRONG_CORRELATION {
        "strong positive"
    } else if r > MIN_ABS_CORRELATION {
        "moderate positive"
    } else if r < -STRONG_CORRELATION {
        "strong negative"
    } else {
        "moderate negative"
    }
}

/// Report every column pair with |r| > 0.3, strongest first.
pub fn find_correlations(numeric: &NumericSubset) -> Vec<Correlation> {
    if numeric.n_columns() < 2 {
        return Vec::new();
    }

    let mut correlations = Vec::new();
    for i in 0..numeric.n_columns() {
        for j in (i + 1)..numeric.n_columns() {
            let Some(r) = pearson(&numeric.values[i], &numeric.values[j]) else {
                continue;
            };
            let score = round_to(r, 2);
            if score.abs() <= MIN_ABS_CORRELATION {
                continue;
            }

            let (col1, col2) = (&numeric.names[i], &numeric.names[j]);
            correlations.push(Correlation {
                feature1: col1.clone(),
                feature2: col2.clone(),
                score,
                description: format!(
                    "There is a {} correlation between {col1} and {col2}.",
                    strength_label(score)
                ),
            });
        }
    }

    correlations.sort_by(|a, b| b.score.abs().total_cmp(&a.score.abs()));
    correlations
}
