use anyhow::{Context, Result};
use bio::io::bed;
use log::debug;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::utils::open_reader;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenomicInterval {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub label: Option<String>,
}

impl GenomicInterval {
    pub fn new(chrom: &str, start: u64, end: u64, label: Option<&str>) -> Result<Self> {
        if end <= start {
            anyhow::bail!("Invalid interval {}:{}-{}: end must be greater than start", chrom, start, end);
        }
        Ok(Self {
            chrom: chrom.to_string(),
            start,
            end,
            label: label.map(String::from),
        })
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Ordered collection of intervals with the set operations region
/// preparation needs. Coordinates are 0-based half-open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalStore {
    pub intervals: Vec<GenomicInterval>,
}

impl From<Vec<GenomicInterval>> for IntervalStore {
    fn from(intervals: Vec<GenomicInterval>) -> Self {
        Self { intervals }
    }
}

impl IntervalStore {
    pub fn read_bed<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Reading intervals from {:?}", path);

        let mut reader = bed::Reader::new(open_reader(path)?);
        let mut intervals = Vec::new();
        for record in reader.records() {
            let record = record.context(format!("Failed to parse BED record in {:?}", path))?;
            let interval =
                GenomicInterval::new(record.chrom(), record.start(), record.end(), record.name())
                    .context(format!("Invalid BED record in {:?}", path))?;
            intervals.push(interval);
        }

        debug!("Read {} intervals from {:?}", intervals.len(), path);
        Ok(Self { intervals })
    }

    pub fn write_bed<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())
            .context(format!("Failed to create BED file: {:?}", path.as_ref()))?;
        let mut handle = BufWriter::new(file);
        self.write_bed_to(&mut handle)?;
        handle.flush()?;
        Ok(())
    }

    pub fn write_bed_to<W: Write>(&self, handle: &mut W) -> Result<()> {
        for interval in &self.intervals {
            match &interval.label {
                Some(label) => writeln!(
                    handle,
                    "{}\t{}\t{}\t{}",
                    interval.chrom, interval.start, interval.end, label
                )?,
                None => writeln!(handle, "{}\t{}\t{}", interval.chrom, interval.start, interval.end)?,
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn lengths(&self) -> Vec<u64> {
        self.intervals.iter().map(GenomicInterval::len).collect()
    }

    /// Canonical BED order: chromosome name, then start, then end.
    pub fn sort(&mut self) {
        self.intervals.sort_by(|a, b| {
            a.chrom
                .cmp(&b.chrom)
                .then(a.start.cmp(&b.start))
                .then(a.end.cmp(&b.end))
        });
    }

    /// Sort, then merge overlapping and book-ended intervals. Labels of
    /// merged records are kept as a comma-separated list of distinct values
    /// when `keep_labels` is set.
    pub fn sort_merge(&self, keep_labels: bool) -> IntervalStore {
        let mut sorted = self.clone();
        sorted.sort();

        let mut merged: Vec<GenomicInterval> = Vec::new();
        let mut labels: Vec<String> = Vec::new();

        for interval in sorted.intervals {
            if let Some(current) = merged.last_mut() {
                if current.chrom == interval.chrom && interval.start <= current.end {
                    current.end = current.end.max(interval.end);
                    if let Some(label) = interval.label {
                        if !labels.contains(&label) {
                            labels.push(label);
                        }
                    }
                    continue;
                }
                current.label = join_labels(&mut labels, keep_labels);
            }
            labels.extend(interval.label.iter().cloned());
            merged.push(GenomicInterval {
                label: None,
                ..interval
            });
        }
        if let Some(current) = merged.last_mut() {
            current.label = join_labels(&mut labels, keep_labels);
        }

        debug!("Merged {} intervals into {}", self.len(), merged.len());
        IntervalStore { intervals: merged }
    }

    /// Portions of each interval that overlap `other`, keeping this store's
    /// labels. One piece per overlapping record of `other`, so overlapping
    /// or book-ended records in `other` yield separate pieces
    /// (`bedtools intersect` behaviour).
    pub fn intersect(&self, other: &IntervalStore) -> IntervalStore {
        let index = ChromIndex::raw(other);
        let mut result = Vec::new();
        for interval in &self.intervals {
            for (start, end) in index.overlapping(&interval.chrom, interval.start, interval.end) {
                result.push(GenomicInterval {
                    start: interval.start.max(start),
                    end: interval.end.min(end),
                    ..interval.clone()
                });
            }
        }
        IntervalStore { intervals: result }
    }

    /// Intervals that overlap nothing in `other` (`bedtools intersect -v`).
    pub fn disjoint(&self, other: &IntervalStore) -> IntervalStore {
        let index = ChromIndex::merged(other);
        let intervals = self
            .intervals
            .iter()
            .filter(|iv| index.overlapping(&iv.chrom, iv.start, iv.end).next().is_none())
            .cloned()
            .collect();
        IntervalStore { intervals }
    }

    /// Set difference. With `whole_feature`, any interval touching `other`
    /// is dropped entirely; otherwise only the overlapping portion is
    /// removed and the remaining pieces keep their label.
    pub fn subtract(&self, other: &IntervalStore, whole_feature: bool) -> IntervalStore {
        if whole_feature {
            return self.disjoint(other);
        }

        let index = ChromIndex::merged(other);
        let mut result = Vec::new();
        for interval in &self.intervals {
            let mut pos = interval.start;
            for (start, end) in index.overlapping(&interval.chrom, interval.start, interval.end) {
                if start > pos {
                    result.push(GenomicInterval {
                        start: pos,
                        end: start,
                        ..interval.clone()
                    });
                }
                pos = pos.max(end);
            }
            if pos < interval.end {
                result.push(GenomicInterval {
                    start: pos,
                    ..interval.clone()
                });
            }
        }

        debug!("Subtraction split {} intervals into {} pieces", self.len(), result.len());
        IntervalStore { intervals: result }
    }
}

fn join_labels(labels: &mut Vec<String>, keep_labels: bool) -> Option<String> {
    let joined = if keep_labels && !labels.is_empty() {
        Some(labels.join(","))
    } else {
        None
    };
    labels.clear();
    joined
}

/// Per-chromosome coordinates sorted by start, for overlap lookups.
struct ChromIndex {
    by_chrom: HashMap<String, ChromRanges>,
}

#[derive(Default)]
struct ChromRanges {
    ranges: Vec<(u64, u64)>,
    max_len: u64,
}

impl ChromIndex {
    /// Index `store` as is. Overlapping and book-ended records stay separate.
    fn raw(store: &IntervalStore) -> Self {
        Self::build(&store.intervals)
    }

    /// Index the merged footprint of `store`.
    fn merged(store: &IntervalStore) -> Self {
        Self::build(&store.sort_merge(false).intervals)
    }

    fn build(intervals: &[GenomicInterval]) -> Self {
        let mut by_chrom: HashMap<String, ChromRanges> = HashMap::new();
        for interval in intervals {
            let entry = by_chrom.entry(interval.chrom.clone()).or_default();
            entry.ranges.push((interval.start, interval.end));
            entry.max_len = entry.max_len.max(interval.len());
        }
        for entry in by_chrom.values_mut() {
            entry.ranges.sort_unstable();
        }
        Self { by_chrom }
    }

    fn overlapping<'a>(
        &'a self,
        chrom: &str,
        start: u64,
        end: u64,
    ) -> impl Iterator<Item = (u64, u64)> + 'a {
        let (ranges, max_len) = match self.by_chrom.get(chrom) {
            Some(entry) => (entry.ranges.as_slice(), entry.max_len),
            None => (&[][..], 0),
        };
        // No range starting at or before `start - max_len` can reach `start`.
        let first = ranges.partition_point(|&(s, _)| s.saturating_add(max_len) <= start);
        ranges[first..]
            .iter()
            .copied()
            .take_while(move |&(s, _)| s < end)
            .filter(move |&(_, e)| e > start)
    }
}
