use anyhow::{Context, Result};
use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, OrderStatistics};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::ConsistencyError;
use crate::interval::IntervalStore;

/// Sequenced bases aimed for in each bin, same target as CNVkit's autobin.
pub const BP_PER_BIN: f64 = 100_000.0;

/// Rounding unit and closed bounds for one kind of bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinRange {
    pub unit: u64,
    pub min: u64,
    pub max: u64,
}

pub const TARGET_RANGE: BinRange = BinRange {
    unit: 50,
    min: 100,
    max: 250,
};

pub const ANTITARGET_RANGE: BinRange = BinRange {
    unit: 10_000,
    min: 10_000,
    max: 1_000_000,
};

// Observations at or below these lengths are degenerate intersections.
pub const TARGET_MIN_LENGTH: f64 = 100.0;
pub const ANTITARGET_MIN_LENGTH: f64 = 250.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinSizeEstimate {
    pub target: u64,
    pub antitarget: u64,
}

/// One depth region: its length and the depth reported for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthSample {
    pub length: u64,
    pub depth: f64,
}

/// Round `raw` up to a multiple of `range.unit`, then clamp into the range.
pub fn scale_in_boundary(raw: f64, range: BinRange) -> u64 {
    let unit = range.unit as f64;
    let rounded = (raw / unit).ceil() * unit;
    if !rounded.is_finite() || rounded > range.max as f64 {
        range.max
    } else if rounded < range.min as f64 {
        range.min
    } else {
        rounded as u64
    }
}

pub fn median(values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut data = Data::new(values);
    Some(data.median())
}

/// Bin size for one stream from its informative values; the range maximum
/// when there are none.
fn bin_size(values: Vec<f64>, range: BinRange, kind: &str) -> u64 {
    match median(values) {
        Some(mid) => {
            let size = scale_in_boundary(BP_PER_BIN / mid, range);
            info!("{} bin size {} from median {:.2}", kind, size, mid);
            size
        }
        None => {
            warn!(
                "No informative {} observations, using maximum bin size {}",
                kind, range.max
            );
            range.max
        }
    }
}

/// Estimate bin sizes where each observation is filtered and summarized by
/// its own value.
pub fn estimate(target_values: &[f64], antitarget_values: &[f64]) -> BinSizeEstimate {
    let target: Vec<f64> = target_values
        .iter()
        .copied()
        .filter(|&v| v > TARGET_MIN_LENGTH)
        .collect();
    let antitarget: Vec<f64> = antitarget_values
        .iter()
        .copied()
        .filter(|&v| v > ANTITARGET_MIN_LENGTH)
        .collect();

    BinSizeEstimate {
        target: bin_size(target, TARGET_RANGE, "target"),
        antitarget: bin_size(antitarget, ANTITARGET_RANGE, "antitarget"),
    }
}

/// Estimate bin sizes from depth regions: regions are kept by length and the
/// median of their depth sets the bin width.
pub fn estimate_from_samples(target: &[DepthSample], antitarget: &[DepthSample]) -> BinSizeEstimate {
    let informative = |samples: &[DepthSample], min_length: f64| -> Vec<f64> {
        samples
            .iter()
            .filter(|s| s.length as f64 > min_length)
            .map(|s| s.depth)
            .collect()
    };

    BinSizeEstimate {
        target: bin_size(informative(target, TARGET_MIN_LENGTH), TARGET_RANGE, "target"),
        antitarget: bin_size(
            informative(antitarget, ANTITARGET_MIN_LENGTH),
            ANTITARGET_RANGE,
            "antitarget",
        ),
    }
}

/// Split depth regions into target observations (the parts overlapping
/// `cnv_regions`) and antitarget observations (regions overlapping none).
/// Depth is read from the fourth column.
pub fn depth_samples(
    depth_regions: &IntervalStore,
    cnv_regions: &IntervalStore,
) -> Result<(Vec<DepthSample>, Vec<DepthSample>)> {
    let to_samples = |store: IntervalStore| -> Result<Vec<DepthSample>> {
        store
            .intervals
            .iter()
            .map(|iv| {
                let field = iv.label.as_deref().unwrap_or("");
                let depth = field.parse::<f64>().context(format!(
                    "Failed to parse depth '{}' for {}:{}-{}",
                    field, iv.chrom, iv.start, iv.end
                ))?;
                Ok(DepthSample {
                    length: iv.len(),
                    depth,
                })
            })
            .collect()
    };

    let target = to_samples(depth_regions.intersect(cnv_regions))?;
    let antitarget = to_samples(depth_regions.disjoint(cnv_regions))?;
    Ok((target, antitarget))
}

/// A sample in a batch and, optionally, its depth-region file.
#[derive(Debug, Clone)]
pub struct SampleDepth {
    pub sample: String,
    pub regions: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleBins {
    pub sample: String,
    pub target: u64,
    pub antitarget: u64,
}

/// One bin-size estimate shared by every sample in a batch, so coverage
/// is binned consistently across the batch.
pub fn estimate_batch<P: AsRef<Path>>(
    samples: &[SampleDepth],
    cnv_file: P,
) -> Result<(BinSizeEstimate, Vec<SampleBins>)> {
    let cnv_regions = IntervalStore::read_bed(cnv_file.as_ref())?;
    info!(
        "Estimating bin sizes for {} samples against {} CNV regions",
        samples.len(),
        cnv_regions.len()
    );

    let per_sample: Vec<(Vec<DepthSample>, Vec<DepthSample>)> = samples
        .par_iter()
        .map(|s| match &s.regions {
            Some(path) => {
                let depth_regions = IntervalStore::read_bed(path)
                    .context(format!("Failed to read depth regions for {}", s.sample))?;
                depth_samples(&depth_regions, &cnv_regions)
            }
            None => Ok((Vec::new(), Vec::new())),
        })
        .collect::<Result<_>>()?;

    let (target, antitarget): (Vec<DepthSample>, Vec<DepthSample>) = per_sample.into_iter().fold(
        (Vec::new(), Vec::new()),
        |(mut t, mut a), (st, sa)| {
            t.extend(st);
            a.extend(sa);
            (t, a)
        },
    );

    let estimate = estimate_from_samples(&target, &antitarget);
    let assigned: Vec<SampleBins> = samples
        .iter()
        .map(|s| SampleBins {
            sample: s.sample.clone(),
            target: estimate.target,
            antitarget: estimate.antitarget,
        })
        .collect();

    verify_samples(
        samples.iter().map(|s| s.sample.as_str()),
        assigned.iter().map(|s| s.sample.as_str()),
    )?;

    Ok((estimate, assigned))
}

/// Fail unless a batch step returned exactly the samples it was given.
pub fn verify_samples<'a, I, O>(expected: I, actual: O) -> Result<(), ConsistencyError>
where
    I: IntoIterator<Item = &'a str>,
    O: IntoIterator<Item = &'a str>,
{
    let expected: Vec<&str> = expected.into_iter().collect();
    let actual: Vec<&str> = actual.into_iter().collect();

    let expected_set: BTreeSet<&str> = expected.iter().copied().collect();
    let actual_set: BTreeSet<&str> = actual.iter().copied().collect();

    if expected.len() != actual.len() || expected_set != actual_set {
        let mut expected: Vec<String> = expected.into_iter().map(String::from).collect();
        let mut actual: Vec<String> = actual.into_iter().map(String::from).collect();
        expected.sort();
        actual.sort();
        return Err(ConsistencyError { expected, actual });
    }
    Ok(())
}
