//! Flattened `{type, description, details}` insights for older clients.

use serde::Serialize;
use serde_json::{Map, Value};

use super::InsightsReport;
use crate::data::model::Dataset;

/// One generic insight record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Flatten a report: one `summary` insight, then every structured record in
/// analyzer order (correlations, trends, anomalies, predictions, clusters,
/// statistics).
pub fn legacy_insights(dataset: &Dataset, report: &InsightsReport) -> Vec<Insight> {
    let mut insights = vec![Insight {
        kind: "summary".to_string(),
        description: report.summary.clone(),
        details: summary_details(dataset, report),
    }];

    for c in &report.correlations {
        insights.push(record("correlation", &c.description, c));
    }
    for t in &report.trends {
        insights.push(record("trend", &t.description, t));
    }
    for a in &report.anomalies {
        insights.push(record("anomaly", &a.description, a));
    }
    for p in &report.predictions {
        insights.push(record("prediction", &p.description, p));
    }
    for c in &report.clusters {
        insights.push(record("cluster", &c.description, c));
    }
    for s in &report.statistics {
        let description = format!(
            "{} ranges from {:.2} to {:.2} with mean {:.2} and standard deviation {:.2}.",
            s.feature, s.min, s.max, s.mean, s.std_dev
        );
        insights.push(record("statistics", &description, s));
    }
    insights
}

/// Dataset shape and typing, plus per-column statistics keyed by column.
fn summary_details(dataset: &Dataset, report: &InsightsReport) -> Option<Value> {
    let Ok(Value::Object(mut details)) = serde_json::to_value(dataset.summary()) else {
        return None;
    };
    let statistics: Map<String, Value> = report
        .statistics
        .iter()
        .filter_map(|s| match serde_json::to_value(s) {
            Ok(Value::Object(mut map)) => {
                map.remove("feature");
                Some((s.feature.clone(), Value::Object(map)))
            }
            _ => None,
        })
        .collect();
    details.insert("statistics".to_string(), Value::Object(statistics));
    Some(Value::Object(details))
}

/// The record itself becomes `details`, minus its description.
fn record<T: Serialize>(kind: &str, description: &str, item: &T) -> Insight {
    let details = match serde_json::to_value(item) {
        Ok(Value::Object(mut map)) => {
            map.remove("description");
            Some(Value::Object(map))
        }
        Ok(other) => Some(other),
        Err(_) => None,
    };
    Insight {
        kind: kind.to_string(),
        description: description.to_string(),
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::InsightsPipeline;
    use crate::data::loader::from_json_rows;
    use serde_json::json;

    #[test]
    fn empty_dataset_still_has_summary() {
        let ds = from_json_rows(Vec::new(), &[]).unwrap();
        let report = InsightsPipeline::new().analyze(&ds);
        let insights = legacy_insights(&ds, &report);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, "summary");
        let details = insights[0].details.as_ref().unwrap();
        assert_eq!(details["rows"], 0);
        assert_eq!(details["statistics"], json!({}));
    }

    #[test]
    fn records_are_flattened_without_descriptions() {
        let records = (0..12).map(|i| json!({"a": i, "b": 3 * i})).collect();
        let ds = from_json_rows(records, &[]).unwrap();
        let report = InsightsPipeline::new().analyze(&ds);
        let insights = legacy_insights(&ds, &report);

        let correlation = insights.iter().find(|i| i.kind == "correlation").unwrap();
        let details = correlation.details.as_ref().unwrap();
        assert_eq!(details["feature1"], "a");
        assert_eq!(details["score"], 1.0);
        assert!(details.get("description").is_none());

        let n_structured = report.correlations.len()
            + report.trends.len()
            + report.anomalies.len()
            + report.predictions.len()
            + report.clusters.len()
            + report.statistics.len();
        assert_eq!(insights.len(), n_structured + 1);

        let summary = insights[0].details.as_ref().unwrap();
        assert_eq!(summary["statistics"]["b"]["max"], 33.0);
        assert_eq!(summary["statistics"]["a"]["mean"], 5.5);
        assert!(summary["statistics"]["a"].get("feature").is_none());

        let value = serde_json::to_value(&insights[0]).unwrap();
        assert_eq!(value["type"], "summary");
    }
}
