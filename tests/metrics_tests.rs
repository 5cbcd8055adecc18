use anyhow::Result;
use std::fs;
use std::time::Duration;
use svbins::binsize::{BinSizeEstimate, SampleBins};
use svbins::interval::{GenomicInterval, IntervalStore};
use svbins::metrics::{Metrics, StepSummary};
use tempfile::tempdir;

#[test]
fn test_metrics_creation() -> Result<()> {
    let version = "0.1.0";
    let prefix = "test_sample";
    let command = "svbins collapse -i genes.bed -s hg38.sizes";
    let elapsed = Duration::from_secs(60);

    let regions = IntervalStore::from(vec![
        GenomicInterval::new("chr1", 0, 1000, Some("T1"))?,
        GenomicInterval::new("chr2", 500, 750, Some("T2"))?,
    ]);
    let summary = StepSummary::regions(&regions).with_input(12);

    let metrics = Metrics::new(version, prefix, command, "collapse", summary, elapsed);

    assert_eq!(metrics.version, version);
    assert_eq!(metrics.prefix, prefix);
    assert_eq!(metrics.command, command);
    assert_eq!(metrics.step, "collapse");
    assert_eq!(metrics.summary.records_in, Some(12));
    assert_eq!(metrics.summary.regions_out, Some(2));
    assert_eq!(metrics.summary.bases_out, Some(1250));
    assert!(metrics.summary.samples.is_empty());

    assert!(metrics.elapsed.contains("60s"));
    Ok(())
}

#[test]
fn test_write_to_file() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("test_metrics.json");

    let estimate = BinSizeEstimate { target: 200, antitarget: 30_000 };
    let samples = vec![
        SampleBins { sample: "S1".to_string(), target: 200, antitarget: 30_000 },
        SampleBins { sample: "S2".to_string(), target: 200, antitarget: 30_000 },
    ];
    let metrics = Metrics::new(
        "0.1.0",
        "test_sample",
        "svbins autobin -c cnv.bed --sample S1=s1.bed --sample S2",
        "autobin",
        StepSummary::bins(&estimate, &samples).with_input(1),
        Duration::from_millis(1500),
    );

    metrics.write_to_file(&file_path)?;

    assert!(file_path.exists());

    let contents = fs::read_to_string(&file_path)?;

    assert!(contents.contains("\"svbins_version\": \"0.1.0\""));
    assert!(contents.contains("\"date\""));
    assert!(contents.contains("\"elapsed\""));
    assert!(contents.contains("\"prefix\": \"test_sample\""));
    assert!(contents.contains("\"step\": \"autobin\""));
    assert!(contents.contains("\"records_in\": 1"));
    assert!(contents.contains("\"target\": 200"));
    assert!(contents.contains("\"antitarget\": 30000"));
    // Region counts do not apply to bin sizing.
    assert!(!contents.contains("regions_out"));

    let parsed: Metrics = serde_json::from_str(&contents)?;
    assert_eq!(parsed.summary.samples, vec!["S1", "S2"]);
    assert_eq!(parsed.summary.bin_sizes, Some(estimate));

    Ok(())
}

#[test]
fn test_summary_records_output_path() {
    let summary = StepSummary::default().with_output("sample.cnn");
    assert_eq!(summary.output.as_deref(), Some(std::path::Path::new("sample.cnn")));
    assert_eq!(summary.regions_out, None);
}
