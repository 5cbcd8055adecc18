//! Choice of base regions for CNV coverage.

use anyhow::Result;
use clap::ValueEnum;
use log::info;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::cache::OutputCache;
use crate::collapse::collapse_file;
use crate::error::ConfigError;
use crate::exclude::remove_excluded;
use crate::genome::ChromSizes;

/// Whole-genome runs subset to gene neighbourhoods to keep runtimes bounded.
pub const GENOME_DEFAULT_METHOD: &str = "transcripts1e4";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CoverageMode {
    Genome,
    Regional,
    Amplicon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionMethod {
    /// The gene annotation as is.
    Exons,
    /// Collapsed transcripts extended by `window` on both sides.
    Transcripts { window: u64 },
}

impl FromStr for RegionMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "exons" {
            return Ok(RegionMethod::Exons);
        }
        let window = s
            .strip_prefix("transcripts")
            .ok_or_else(|| ConfigError::UnknownMethod(s.to_string()))?;
        if window.is_empty() {
            return Ok(RegionMethod::Transcripts { window: 0 });
        }
        // Accepts float notation such as `transcripts1e4`.
        match window.parse::<f64>() {
            Ok(w) if w.is_finite() && w >= 0.0 => Ok(RegionMethod::Transcripts {
                window: w.trunc() as u64,
            }),
            _ => Err(ConfigError::InvalidWindow(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegionConfig {
    /// A region method name or a BED file path.
    pub sv_regions: Option<String>,
    pub gene_bed: Option<PathBuf>,
    pub variant_regions: Option<PathBuf>,
    pub exclude_bed: Option<PathBuf>,
    pub include_labels: bool,
    pub whole_feature: bool,
}

fn gene_annotation<'a>(config: &'a RegionConfig, method: &str) -> Result<&'a Path, ConfigError> {
    let gene_bed = config
        .gene_bed
        .as_deref()
        .ok_or_else(|| ConfigError::Unconfigured {
            what: "Gene annotation",
            method: method.to_string(),
        })?;
    if !gene_bed.is_file() {
        return Err(ConfigError::MissingFile {
            what: "gene annotation",
            path: gene_bed.to_path_buf(),
        });
    }
    Ok(gene_bed)
}

/// Resolve a region method, or a custom BED path, to a region file.
pub fn sv_bed(
    method: &str,
    config: &RegionConfig,
    chrom_sizes: &ChromSizes,
    cache: &OutputCache,
) -> Result<PathBuf> {
    if Path::new(method).is_file() {
        info!("Using custom regions {}", method);
        return Ok(PathBuf::from(method));
    }

    match method.parse::<RegionMethod>()? {
        RegionMethod::Exons => {
            let gene_bed = gene_annotation(config, method)?;
            info!("Using exon regions {:?}", gene_bed);
            Ok(gene_bed.to_path_buf())
        }
        RegionMethod::Transcripts { window } => {
            let gene_bed = gene_annotation(config, method)?;
            info!("Collapsing transcripts from {:?} with window {}", gene_bed, window);
            collapse_file(gene_bed, window, chrom_sizes, config.include_labels, cache)
        }
    }
}

/// Pick the base CNV regions. First match wins:
/// a configured method or BED file, then (whole genome only) windowed
/// transcripts minus exclusion regions, then the variant regions.
pub fn select_base_regions(
    mode: CoverageMode,
    config: &RegionConfig,
    chrom_sizes: &ChromSizes,
    cache: &OutputCache,
) -> Result<Option<PathBuf>> {
    let configured = config
        .sv_regions
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty());
    if let Some(method) = configured {
        return sv_bed(method, config, chrom_sizes, cache).map(Some);
    }

    if mode == CoverageMode::Genome {
        match config.gene_bed.as_deref() {
            Some(gene_bed) if gene_bed.is_file() => {
                let regions = sv_bed(GENOME_DEFAULT_METHOD, config, chrom_sizes, cache)?;
                let regions = match config.exclude_bed.as_deref() {
                    Some(exclude) => remove_excluded(&regions, exclude, config.whole_feature, cache)?,
                    None => regions,
                };
                info!("Using whole genome transcript regions {:?}", regions);
                return Ok(Some(regions));
            }
            _ => info!("No gene annotation available for whole genome regions"),
        }
    }

    match &config.variant_regions {
        Some(variant_regions) => info!("Using variant regions {:?}", variant_regions),
        None => info!("No base CNV regions available"),
    }
    Ok(config.variant_regions.clone())
}
