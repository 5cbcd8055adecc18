//! Collapse per-exon annotation records into transcript-level regions.
//!
//! Exons sharing a `(name, chromosome)` key are reduced to the span of their
//! coordinates, except that a gap of [`MAX_INTRON_SIZE`] or more between
//! consecutive breakpoints starts a new region. This keeps megabase introns
//! and multi-locus gene annotations from swallowing unrelated sequence.

use anyhow::{Context, Result};
use itertools::Itertools;
use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::cache::{CacheKey, OutputCache};
use crate::genome::ChromSizes;
use crate::interval::{GenomicInterval, IntervalStore};
use crate::utils::file_stem;

pub const MAX_INTRON_SIZE: u64 = 100_000;

/// Split sorted breakpoints wherever the distance to the previous one
/// reaches `max_gap`.
pub fn group_coords(mut coords: Vec<u64>, max_gap: u64) -> Vec<Vec<u64>> {
    coords.sort_unstable();

    let mut groups: Vec<Vec<u64>> = Vec::new();
    let mut current: Vec<u64> = Vec::new();

    for coord in coords {
        match current.last() {
            Some(&prev) if coord - prev >= max_gap => {
                groups.push(std::mem::take(&mut current));
                current.push(coord);
            }
            _ => current.push(coord),
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }

    groups
}

/// Grouping key of an exon record: `(name, chromosome)`. Unnamed records
/// share the empty name.
fn transcript_key(interval: &GenomicInterval) -> (&str, &str) {
    (interval.label.as_deref().unwrap_or(""), interval.chrom.as_str())
}

/// Collapse exon intervals into one or more windowed regions per
/// transcript, returned sorted and merged.
pub fn collapse(
    intervals: &[GenomicInterval],
    window: u64,
    chrom_sizes: &ChromSizes,
    include_labels: bool,
) -> Result<IntervalStore> {
    let mut sorted: Vec<&GenomicInterval> = intervals.iter().collect();
    sorted.sort_by(|a, b| transcript_key(a).cmp(&transcript_key(b)));

    let mut collapsed = Vec::new();
    let mut transcripts = 0usize;

    let groups = sorted
        .into_iter()
        .group_by(|&iv| transcript_key(iv));

    for ((label, chrom), group) in &groups {
        transcripts += 1;
        let chrom_size = chrom_sizes.size_of(chrom)?;

        let coords: Vec<u64> = group.flat_map(|iv| [iv.start, iv.end]).collect();
        let clusters = group_coords(coords, MAX_INTRON_SIZE);
        if clusters.len() > 1 {
            debug!("Transcript {} on {} split into {} regions", label, chrom, clusters.len());
        }

        for cluster in clusters {
            // Clusters are sorted and never empty.
            let min_pos = cluster[0].saturating_sub(window);
            let max_pos = cluster[cluster.len() - 1]
                .saturating_add(window)
                .min(chrom_size);
            let name = (include_labels && !label.is_empty()).then_some(label);
            let region = GenomicInterval::new(chrom, min_pos, max_pos, name)
                .context(format!("Collapsed region for {} is empty", label))?;
            collapsed.push(region);
        }
    }

    let merged = IntervalStore::from(collapsed).sort_merge(include_labels);
    info!(
        "Collapsed {} records from {} transcripts into {} regions (window={})",
        intervals.len(),
        transcripts,
        merged.len(),
        window
    );
    Ok(merged)
}

/// Collapse an annotation BED file through the output cache, returning the
/// path of `<stem>-transcripts_w<window>` in the cache directory.
pub fn collapse_file<P: AsRef<Path>>(
    in_file: P,
    window: u64,
    chrom_sizes: &ChromSizes,
    include_labels: bool,
    cache: &OutputCache,
) -> Result<PathBuf> {
    let in_file = in_file.as_ref();
    let key = CacheKey::builder("collapse_transcripts")
        .file(in_file)?
        .param("window", window)
        .param("include_labels", include_labels)
        .param(
            "chrom_sizes",
            chrom_sizes
                .seqnames
                .iter()
                .zip(&chrom_sizes.lengths)
                .map(|(name, len)| format!("{}:{}", name, len))
                .join(","),
        )
        .finish();
    let name = format!(
        "{}-transcripts_w{}",
        file_stem(in_file).unwrap_or_else(|| "regions".to_string()),
        window
    );

    cache.get_or_create(&key, &name, |out| {
        let records = IntervalStore::read_bed(in_file)?;
        collapse(&records.intervals, window, chrom_sizes, include_labels)?.write_bed(out)
    })
}
