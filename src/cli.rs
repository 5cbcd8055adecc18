use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::binsize::SampleDepth;
use crate::genome::ChromSizes;
use crate::regions::CoverageMode;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short = 'p', long, default_value = "sample", global = true)]
    pub prefix: String,

    #[arg(long, global = true)]
    pub metrics_file: bool,

    #[arg(long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Collapse exon records into windowed transcript regions
    Collapse(CollapseArgs),
    /// Choose the base CNV regions for a sample
    Regions(RegionsArgs),
    /// Estimate target and antitarget bin sizes for a batch
    Autobin(AutobinArgs),
    /// Convert annotated depth regions into a log2 coverage table
    Log2(Log2Args),
}

/// Where chromosome sizes come from: a sizes/.fai table or a BAM header.
#[derive(Args, Debug, Clone)]
pub struct SizesArgs {
    #[arg(short = 's', long)]
    pub chromsize: Option<PathBuf>,

    #[arg(short = 'b', long)]
    pub bam: Option<PathBuf>,
}

impl SizesArgs {
    pub fn load(&self) -> Result<ChromSizes> {
        match (&self.chromsize, &self.bam) {
            (Some(path), _) => ChromSizes::from_file(path),
            (None, Some(bam)) => ChromSizes::from_bam(bam),
            (None, None) => anyhow::bail!("Chromosome sizes required: pass --chromsize or --bam"),
        }
    }
}

#[derive(Args, Debug)]
pub struct CollapseArgs {
    #[arg(short = 'i', long)]
    pub input: PathBuf,

    #[command(flatten)]
    pub sizes: SizesArgs,

    #[arg(short = 'w', long, default_value_t = 0)]
    pub window: u64,

    #[arg(long)]
    pub no_names: bool,

    /// Output BED; stdout when omitted
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RegionsArgs {
    #[arg(short = 'm', long, value_enum, default_value_t = CoverageMode::Regional)]
    pub mode: CoverageMode,

    /// Region method (exons, transcripts, transcripts<N>) or a BED file
    #[arg(long)]
    pub sv_regions: Option<String>,

    #[arg(short = 'g', long)]
    pub gene_bed: Option<PathBuf>,

    #[arg(long)]
    pub variant_regions: Option<PathBuf>,

    #[arg(short = 'x', long)]
    pub exclude: Option<PathBuf>,

    #[arg(long)]
    pub whole_feature: bool,

    #[arg(long)]
    pub no_names: bool,

    #[command(flatten)]
    pub sizes: SizesArgs,

    #[arg(short = 'd', long, default_value = "svbins_work")]
    pub work_dir: PathBuf,
}

#[derive(Args, Debug)]
pub struct AutobinArgs {
    #[arg(short = 'c', long)]
    pub cnv_regions: PathBuf,

    /// NAME=PATH to a depth regions BED, or NAME alone for a sample without one
    #[arg(long = "sample", required = true, value_parser = parse_sample)]
    pub samples: Vec<SampleDepth>,
}

#[derive(Args, Debug)]
pub struct Log2Args {
    #[arg(short = 'i', long)]
    pub input: PathBuf,

    #[arg(short = 'o', long)]
    pub output: PathBuf,
}

fn parse_sample(raw: &str) -> Result<SampleDepth> {
    let (sample, regions) = match raw.split_once('=') {
        Some((sample, path)) => (sample, Some(PathBuf::from(path))),
        None => (raw, None),
    };
    if sample.is_empty() {
        anyhow::bail!("Empty sample name in {}", raw);
    }
    Ok(SampleDepth {
        sample: sample.to_string(),
        regions,
    })
}

impl Cli {
    pub fn step_name(&self) -> &'static str {
        match self.command {
            Command::Collapse(_) => "collapse",
            Command::Regions(_) => "regions",
            Command::Autobin(_) => "autobin",
            Command::Log2(_) => "log2",
        }
    }

    pub fn metrics_path(&self) -> PathBuf {
        PathBuf::from(format!("{}_svbins.json", self.prefix))
    }
}
