use anyhow::Result;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::binsize::{BinSizeEstimate, SampleBins};
use crate::interval::IntervalStore;

/// What one step read and produced. Fields a step has no notion of are
/// left out of the JSON.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct StepSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records_in: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regions_out: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bases_out: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub samples: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bin_sizes: Option<BinSizeEstimate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl StepSummary {
    /// Region count and covered bases of a step's output regions.
    pub fn regions(regions: &IntervalStore) -> Self {
        Self {
            regions_out: Some(regions.len()),
            bases_out: Some(regions.lengths().iter().sum()),
            ..Self::default()
        }
    }

    pub fn bins(estimate: &BinSizeEstimate, samples: &[SampleBins]) -> Self {
        Self {
            samples: samples.iter().map(|s| s.sample.clone()).collect(),
            bin_sizes: Some(*estimate),
            ..Self::default()
        }
    }

    pub fn with_input(mut self, records: usize) -> Self {
        self.records_in = Some(records);
        self
    }

    pub fn with_output<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output = Some(path.as_ref().to_path_buf());
        self
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Metrics {
    #[serde(rename = "svbins_version")]
    pub version: String,
    pub date: String,
    pub elapsed: String,
    pub prefix: String,
    pub command: String,
    pub step: String,
    #[serde(flatten)]
    pub summary: StepSummary,
}

impl Metrics {
    pub fn new(
        version: &str,
        prefix: &str,
        command: &str,
        step: &str,
        summary: StepSummary,
        elapsed: Duration,
    ) -> Self {
        Self {
            version: version.to_string(),
            date: Local::now().format("%Y-%m-%d %I:%M:%S %p").to_string(),
            elapsed: format!("{:?}", elapsed),
            prefix: prefix.to_string(),
            command: command.to_string(),
            step: step.to_string(),
            summary,
        }
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        file.write_all(b"\n")?;
        Ok(())
    }
}
