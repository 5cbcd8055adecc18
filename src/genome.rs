use anyhow::{Context, Result};
use log::info;
use rust_htslib::bam::{self, Read};
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use crate::error::ConfigError;
use crate::utils::open_reader;

/// Chromosome name to length, in reference order.
#[derive(Debug, Clone, Default)]
pub struct ChromSizes {
    pub seqnames: Vec<String>,
    pub lengths: Vec<u64>,
    index: HashMap<String, usize>,
}

impl ChromSizes {
    pub fn new(seqnames: Vec<String>, lengths: Vec<u64>) -> Self {
        let index = seqnames
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self {
            seqnames,
            lengths,
            index,
        }
    }

    /// Reads a `chrom<TAB>size` table; extra columns are ignored so a
    /// samtools `.fai` index works as well.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        info!("Loading chromosome sizes from file: {:?}", path.as_ref());

        let reader = open_reader(path).context("Failed to open chromosome sizes file")?;

        let mut seqnames = Vec::new();
        let mut lengths = Vec::new();

        for line in reader.lines() {
            let line = line?;
            let parts: Vec<&str> = line.split_whitespace().collect();

            if parts.len() >= 2 {
                let chrom = parts[0].to_string();
                let length = parts[1]
                    .parse::<u64>()
                    .context(format!("Failed to parse chromosome length: {}", parts[1]))?;

                seqnames.push(chrom);
                lengths.push(length);
            }
        }

        if seqnames.is_empty() {
            anyhow::bail!("No chromosomes found in the file");
        }

        Ok(Self::new(seqnames, lengths))
    }

    pub fn from_bam<P: AsRef<Path>>(path: P) -> Result<Self> {
        info!("Loading chromosome sizes from BAM header: {:?}", path.as_ref());

        let bam = bam::Reader::from_path(path).context("Failed to open BAM file")?;

        let header = bam.header();
        let target_names = header.target_names();

        let mut seqnames = Vec::new();
        let mut lengths = Vec::new();

        for (i, name) in target_names.iter().enumerate() {
            let chrom = std::str::from_utf8(name)
                .context("Failed to parse chromosome name")?
                .to_string();

            let length = header
                .target_len(i as u32)
                .context(format!("Failed to get length for chromosome {}", chrom))?;

            seqnames.push(chrom);
            lengths.push(length);
        }

        if seqnames.is_empty() {
            anyhow::bail!("No chromosomes found in the BAM header");
        }

        Ok(Self::new(seqnames, lengths))
    }

    pub fn get(&self, chrom: &str) -> Option<u64> {
        self.index.get(chrom).map(|&i| self.lengths[i])
    }

    pub fn size_of(&self, chrom: &str) -> Result<u64, ConfigError> {
        self.get(chrom)
            .ok_or_else(|| ConfigError::UnknownChromosome(chrom.to_string()))
    }

    pub fn len(&self) -> usize {
        self.seqnames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seqnames.is_empty()
    }
}
