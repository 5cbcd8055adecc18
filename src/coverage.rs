use anyhow::{Context, Result};
use log::info;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::cache::Staged;
use crate::utils::{file_exists, open_reader};

/// log2 value written for bins without coverage.
pub const NO_COVERAGE_LOG2: f64 = -20.0;

pub const CNN_HEADER: &str = "chromosome\tstart\tend\tgene\tlog2\tdepth";

pub fn log2_depth(depth: f64) -> f64 {
    if depth > 0.0 {
        depth.log2()
    } else {
        NO_COVERAGE_LOG2
    }
}

/// Format one `chrom start end orig_name depth gene` record as a `.cnn`
/// row. Records with four or fewer fields carry no depth and yield `None`.
pub fn cnn_row(line: &str) -> Result<Option<String>> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() <= 4 {
        return Ok(None);
    }
    if parts.len() != 6 {
        anyhow::bail!(
            "Expected 6 fields (chrom, start, end, name, depth, gene), found {}",
            parts.len()
        );
    }

    let (chrom, start, end, gene) = (parts[0], parts[1], parts[2], parts[5]);
    let depth = parts[4]
        .parse::<f64>()
        .context(format!("Failed to parse depth: {}", parts[4]))?;

    Ok(Some(format!(
        "{}\t{}\t{}\t{}\t{:.3}\t{:.2}",
        chrom,
        start,
        end,
        gene,
        log2_depth(depth),
        depth
    )))
}

/// Write a CNVkit `.cnn` coverage table from gene-annotated depth regions.
/// An existing `out_file` is kept as is.
pub fn add_log2_depth<P, Q>(in_file: P, out_file: Q) -> Result<PathBuf>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let in_file = in_file.as_ref();
    let out_file = out_file.as_ref();
    if file_exists(out_file) {
        info!("Coverage table {:?} already exists", out_file);
        return Ok(out_file.to_path_buf());
    }

    let staged = Staged::new(out_file)?;
    let reader = open_reader(in_file)?;
    let mut handle = BufWriter::new(File::create(staged.path())?);
    writeln!(handle, "{}", CNN_HEADER)?;

    let mut rows = 0usize;
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if let Some(row) =
            cnn_row(&line).context(format!("Invalid depth record at {:?}:{}", in_file, i + 1))?
        {
            writeln!(handle, "{}", row)?;
            rows += 1;
        }
    }
    handle.flush()?;
    drop(handle);

    info!("Wrote {} bins to {:?}", rows, out_file);
    staged.commit()
}
