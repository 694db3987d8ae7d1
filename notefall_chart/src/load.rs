use std::{fs, path::Path};

use anyhow::Context;

use crate::Chart;

pub fn load_chart_json_from_path(path: impl AsRef<Path>) -> anyhow::Result<Chart> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("failed to read chart: {}", path.display()))?;
    let chart: Chart = serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse chart json: {}", path.display()))?;
    chart
        .validate()
        .with_context(|| format!("invalid chart: {}", path.display()))?;
    Ok(chart)
}

pub fn load_chart_json_from_str(json: &str) -> anyhow::Result<Chart> {
    let chart: Chart = serde_json::from_str(json).context("failed to parse chart json")?;
    chart.validate().context("invalid chart")?;
    Ok(chart)
}
