use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Exported time series of a run: `"{object}_{field}"` -> one value per recorded time point.
///
/// Serializes as a flat JSON object, e.g. `{"Vesicle_pH": [7.4, ...], "simulation_time": [0.0, ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoriesSnapshot {
    series: BTreeMap<String, Vec<f64>>,
}

impl HistoriesSnapshot {
    pub fn new(series: BTreeMap<String, Vec<f64>>) -> Self {
        HistoriesSnapshot { series }
    }

    /// The sequence stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&[f64]> {
        self.series.get(key).map(Vec::as_slice)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.series.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.series.iter().map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    /// Number of recorded time points (length of the longest sequence).
    pub fn point_count(&self) -> usize {
        self.series.values().map(Vec::len).max().unwrap_or(0)
    }

    /// Number of sequences.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn insert(&mut self, key: String, values: Vec<f64>) {
        self.series.insert(key, values);
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<f64>> {
        self.series
    }

    /// Writes the snapshot as JSON to `path`.
    pub fn write_json<P: AsRef<Path>>(&self, path: P, pretty: bool) -> std::io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        if pretty {
            serde_json::to_writer_pretty(&mut writer, self)?;
        } else {
            serde_json::to_writer(&mut writer, self)?;
        }
        writer.flush()
    }
}
