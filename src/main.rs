use clap::Parser;
use log::info;
use std::io::{self, Write};
use std::time::Instant;

use svbins::binsize::{estimate_batch, SampleBins};
use svbins::cache::OutputCache;
use svbins::cli::{Cli, Command};
use svbins::collapse::collapse;
use svbins::coverage::add_log2_depth;
use svbins::interval::IntervalStore;
use svbins::metrics::{Metrics, StepSummary};
use svbins::regions::{select_base_regions, RegionConfig};

#[derive(serde::Serialize)]
struct AutobinReport<'a> {
    target: u64,
    antitarget: u64,
    samples: &'a [SampleBins],
}

fn run(cli: &Cli) -> anyhow::Result<StepSummary> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match &cli.command {
        Command::Collapse(args) => {
            let chrom_sizes = args.sizes.load()?;
            let records = IntervalStore::read_bed(&args.input)?;
            let regions = collapse(&records.intervals, args.window, &chrom_sizes, !args.no_names)?;
            match &args.output {
                Some(path) => regions.write_bed(path)?,
                None => regions.write_bed_to(&mut handle)?,
            }
            Ok(StepSummary::regions(&regions).with_input(records.len()))
        }
        Command::Regions(args) => {
            let chrom_sizes = args.sizes.load()?;
            let cache = OutputCache::new(&args.work_dir)?;
            let config = RegionConfig {
                sv_regions: args.sv_regions.clone(),
                gene_bed: args.gene_bed.clone(),
                variant_regions: args.variant_regions.clone(),
                exclude_bed: args.exclude.clone(),
                include_labels: !args.no_names,
                whole_feature: args.whole_feature,
            };
            match select_base_regions(args.mode, &config, &chrom_sizes, &cache)? {
                Some(path) => {
                    writeln!(handle, "{}", path.display())?;
                    let regions = IntervalStore::read_bed(&path)?;
                    Ok(StepSummary::regions(&regions).with_output(&path))
                }
                None => Ok(StepSummary::default()),
            }
        }
        Command::Autobin(args) => {
            let (estimate, samples) = estimate_batch(&args.samples, &args.cnv_regions)?;
            let report = AutobinReport {
                target: estimate.target,
                antitarget: estimate.antitarget,
                samples: &samples,
            };
            writeln!(handle, "{}", serde_json::to_string_pretty(&report)?)?;
            let with_depth = args.samples.iter().filter(|s| s.regions.is_some()).count();
            Ok(StepSummary::bins(&estimate, &samples).with_input(with_depth))
        }
        Command::Log2(args) => {
            let out = add_log2_depth(&args.input, &args.output)?;
            writeln!(handle, "{}", out.display())?;
            Ok(StepSummary::default().with_output(out))
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Set RUST_LOG if --verbose is passed, before env_logger::init()
    let cli = Cli::parse();
    if cli.verbose {
        // Only set if not already set by user
        if std::env::var("RUST_LOG").is_err() {
            std::env::set_var("RUST_LOG", "info");
        }
    }
    env_logger::init();

    let start_time = Instant::now();

    let summary = run(&cli)?;

    let metrics = Metrics::new(
        env!("CARGO_PKG_VERSION"),
        &cli.prefix,
        &std::env::args().collect::<Vec<String>>().join(" "),
        cli.step_name(),
        summary,
        start_time.elapsed(),
    );

    info!("{}", serde_json::to_string_pretty(&metrics)?);
    if cli.metrics_file {
        metrics.write_to_file(cli.metrics_path())?;
    }

    match metrics.summary.regions_out {
        Some(regions) => info!("{} completed with {} output regions", cli.step_name(), regions),
        None => info!("{} completed", cli.step_name()),
    }

    Ok(())
}
