/// Analysis layer: six independent analyzers over one parsed dataset.
///
/// ```text
///               Dataset
///                  │ numeric_subset()
///                  ▼
///            NumericSubset
///   ┌──────┬──────┼──────┬──────┬──────┐
///   ▼      ▼      ▼      ▼      ▼      ▼
/// corr   trend  anomaly predict cluster stats
///   └──────┴──────┴──────┴──────┴──────┘
///                  │
///                  ▼
///            InsightsReport  (+ summary text)
/// ```
///
/// No analyzer reads another's output; they only share the input table.

pub mod anomaly;
pub mod cluster;
pub mod correlation;
pub mod legacy;
pub mod prediction;
pub mod statistics;
pub mod stats;
pub mod trend;

use log::{debug, info};
use serde::Serialize;

use crate::data::model::Dataset;

pub use anomaly::{Anomaly, Severity};
pub use cluster::{Cluster, FeatureImportance};
pub use correlation::Correlation;
pub use prediction::{Prediction, TimelinePoint};
pub use statistics::ColumnStatistics;
pub use trend::{CurvePoint, Direction, Trend};

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Everything the insights endpoint returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightsReport {
    pub summary: String,
    pub correlations: Vec<Correlation>,
    pub trends: Vec<Trend>,
    pub anomalies: Vec<Anomaly>,
    pub predictions: Vec<Prediction>,
    pub clusters: Vec<Cluster>,
    pub statistics: Vec<ColumnStatistics>,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Stateless composition of the six analyzers.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsightsPipeline;

impl InsightsPipeline {
    pub fn new() -> Self {
        InsightsPipeline
    }

    /// Run every analyzer against `dataset` and assemble the report.
    pub fn analyze(&self, dataset: &Dataset) -> InsightsReport {
        debug!(
            "analysing {} rows x {} columns",
            dataset.len(),
            dataset.n_columns()
        );
        if dataset.is_empty() {
            return InsightsReport {
                summary: summarize(dataset, &[], &[], &[]),
                correlations: Vec::new(),
                trends: Vec::new(),
                anomalies: Vec::new(),
                predictions: Vec::new(),
                clusters: Vec::new(),
                statistics: Vec::new(),
            };
        }
        let numeric = dataset.numeric_subset();

        let correlations = correlation::find_correlations(&numeric);
        let trends = trend::analyze_trends(&numeric);
        let anomalies = anomaly::detect_anomalies(&numeric);
        let predictions = prediction::make_predictions(&numeric);
        let clusters = cluster::cluster_rows(&numeric);
        let statistics = statistics::describe_columns(&numeric);

        info!(
            "insights: {} correlations, {} trends, {} anomalies, {} predictions, {} clusters, {} statistics",
            correlations.len(),
            trends.len(),
            anomalies.len(),
            predictions.len(),
            clusters.len(),
            statistics.len()
        );

        let summary = summarize(dataset, &correlations, &trends, &anomalies);
        InsightsReport {
            summary,
            correlations,
            trends,
            anomalies,
            predictions,
            clusters,
            statistics,
        }
    }
}

/// Short free-text overview of the dataset and what was found.
fn summarize(
    dataset: &Dataset,
    correlations: &[Correlation],
    trends: &[Trend],
    anomalies: &[Anomaly],
) -> String {
    let mut summary = format!(
        "Dataset has {} rows and {} columns. \
         Analysis includes correlations, trends, anomalies, and predictions.",
        dataset.len(),
        dataset.n_columns()
    );
    if !correlations.is_empty() {
        summary.push_str(&format!(
            " Found {} significant correlations.",
            correlations.len()
        ));
    }
    if !anomalies.is_empty() {
        summary.push_str(&format!(
            " Detected {} potential anomalies.",
            anomalies.len()
        ));
    }
    if !trends.is_empty() {
        summary.push_str(&format!(" Identified {} trends in the data.", trends.len()));
    }
    summary
}
