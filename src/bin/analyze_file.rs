//! Offline analysis: load a `.csv`, `.json` or `.parquet` table and print the
//! insights report as JSON.
//!
//! ```text
//! analyze_file <path> [--legacy]
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use data_insights::analysis::legacy::legacy_insights;
use data_insights::data::loader::load_file;
use data_insights::InsightsPipeline;
use log::info;
use serde_json::json;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut path: Option<PathBuf> = None;
    let mut legacy = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--legacy" => legacy = true,
            flag if flag.starts_with("--") => bail!("unknown flag {flag}"),
            _ => path = Some(PathBuf::from(&arg)),
        }
    }
    let Some(path) = path else {
        bail!("usage: analyze_file <path> [--legacy]");
    };

    let dataset = load_file(&path).with_context(|| format!("loading {}", path.display()))?;
    info!(
        "loaded {} rows x {} columns from {}",
        dataset.len(),
        dataset.n_columns(),
        path.display()
    );

    let report = InsightsPipeline::new().analyze(&dataset);
    let output = if legacy {
        let insights = serde_json::to_value(legacy_insights(&dataset, &report))
            .context("serializing insights")?;
        json!({ "insights": insights })
    } else {
        serde_json::to_value(&report).context("serializing report")?
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("formatting report")?
    );
    Ok(())
}
