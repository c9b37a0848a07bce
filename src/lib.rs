//! Tabular data insights: correlations, trends, anomalies, forecasts,
//! clusters and descriptive statistics over a JSON table, served over HTTP.

pub mod analysis;
pub mod api;
pub mod config;
pub mod data;
pub mod error;

pub use analysis::{InsightsPipeline, InsightsReport};
pub use config::ServiceConfig;
pub use data::model::{CellValue, Dataset, NumericSubset};
