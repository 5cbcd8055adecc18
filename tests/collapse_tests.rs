use anyhow::Result;
use std::fs;
use svbins::cache::OutputCache;
use svbins::collapse::{collapse, collapse_file, MAX_INTRON_SIZE};
use svbins::genome::ChromSizes;
use svbins::interval::{GenomicInterval, IntervalStore};
use tempfile::tempdir;

fn exon(chrom: &str, start: u64, end: u64, name: &str) -> GenomicInterval {
    GenomicInterval::new(chrom, start, end, Some(name)).unwrap()
}

fn sizes() -> ChromSizes {
    ChromSizes::new(
        vec!["chr1".to_string(), "chr2".to_string()],
        vec![1_000_000, 50_000],
    )
}

fn rows(store: &IntervalStore) -> Vec<String> {
    let mut buf = Vec::new();
    store.write_bed_to(&mut buf).unwrap();
    String::from_utf8(buf)
        .unwrap()
        .lines()
        .map(String::from)
        .collect()
}

#[test]
fn test_close_exons_collapse_to_one_region() -> Result<()> {
    let exons = vec![exon("chr1", 1000, 1200, "T1"), exon("chr1", 1300, 1500, "T1")];
    let regions = collapse(&exons, 0, &sizes(), true)?;
    assert_eq!(rows(&regions), vec!["chr1\t1000\t1500\tT1"]);
    Ok(())
}

#[test]
fn test_large_intron_splits_transcript() -> Result<()> {
    let exons = vec![exon("chr1", 1000, 1200, "T2"), exon("chr1", 200_000, 200_300, "T2")];
    let regions = collapse(&exons, 0, &sizes(), true)?;
    assert_eq!(
        rows(&regions),
        vec!["chr1\t1000\t1200\tT2", "chr1\t200000\t200300\tT2"]
    );
    Ok(())
}

#[test]
fn test_gap_exactly_at_threshold_splits() -> Result<()> {
    let exons = vec![
        exon("chr1", 1000, 1200, "T3"),
        exon("chr1", 1200 + MAX_INTRON_SIZE, 1300 + MAX_INTRON_SIZE, "T3"),
    ];
    assert_eq!(collapse(&exons, 0, &sizes(), true)?.len(), 2);

    let exons = vec![
        exon("chr1", 1000, 1200, "T3"),
        exon("chr1", 1199 + MAX_INTRON_SIZE, 1300 + MAX_INTRON_SIZE, "T3"),
    ];
    assert_eq!(collapse(&exons, 0, &sizes(), true)?.len(), 1);
    Ok(())
}

#[test]
fn test_unsorted_input_and_chromosome_grouping() -> Result<()> {
    // Same name on two chromosomes forms two groups.
    let exons = vec![
        exon("chr2", 500, 600, "G"),
        exon("chr1", 3000, 3100, "G"),
        exon("chr1", 1000, 1100, "G"),
    ];
    let regions = collapse(&exons, 0, &sizes(), true)?;
    assert_eq!(
        rows(&regions),
        vec!["chr1\t1000\t3100\tG", "chr2\t500\t600\tG"]
    );
    Ok(())
}

#[test]
fn test_window_is_clamped_to_chromosome() -> Result<()> {
    let exons = vec![exon("chr2", 100, 200, "T"), exon("chr2", 49_500, 49_900, "T")];
    let regions = collapse(&exons, 1000, &sizes(), false)?;
    assert_eq!(rows(&regions), vec!["chr2\t0\t50000"]);

    let size = sizes().get("chr2").unwrap();
    for r in &regions.intervals {
        assert!(r.start < r.end && r.end <= size);
    }
    Ok(())
}

#[test]
fn test_huge_window_covers_whole_chromosome() -> Result<()> {
    let exons = vec![exon("chr1", 1000, 1200, "T1")];
    let regions = collapse(&exons, u64::MAX, &sizes(), true)?;
    assert_eq!(rows(&regions), vec!["chr1\t0\t1000000\tT1"]);
    Ok(())
}

#[test]
fn test_overlapping_transcripts_are_merged() -> Result<()> {
    let exons = vec![
        exon("chr1", 1000, 2000, "A"),
        exon("chr1", 1500, 3000, "B"),
        exon("chr1", 10_000, 11_000, "C"),
    ];
    let regions = collapse(&exons, 0, &sizes(), true)?;
    assert_eq!(
        rows(&regions),
        vec!["chr1\t1000\t3000\tA,B", "chr1\t10000\t11000\tC"]
    );

    let unnamed = collapse(&exons, 0, &sizes(), false)?;
    assert_eq!(rows(&unnamed), vec!["chr1\t1000\t3000", "chr1\t10000\t11000"]);
    Ok(())
}

#[test]
fn test_collapse_is_fixed_point_without_window() -> Result<()> {
    let exons = vec![
        exon("chr1", 1000, 1200, "T1"),
        exon("chr1", 1300, 1500, "T1"),
        exon("chr1", 5000, 5100, "T2"),
        exon("chr1", 300_000, 300_500, "T2"),
        exon("chr2", 10, 20, "T3"),
    ];
    let once = collapse(&exons, 0, &sizes(), true)?;
    let twice = collapse(&once.intervals, 0, &sizes(), true)?;
    assert_eq!(once, twice);
    Ok(())
}

#[test]
fn test_recollapse_joins_regions_sharing_a_merged_label() -> Result<()> {
    // Each transcript splits at a 100kb gap, then the pieces merge across
    // transcripts into two T1,T2 regions only 50kb apart.
    let exons = vec![
        exon("chr1", 0, 10, "T1"),
        exon("chr1", 100_010, 150_000, "T1"),
        exon("chr1", 5, 50_000, "T2"),
        exon("chr1", 150_000, 150_010, "T2"),
    ];
    let once = collapse(&exons, 0, &sizes(), true)?;
    assert_eq!(
        rows(&once),
        vec!["chr1\t0\t50000\tT1,T2", "chr1\t100010\t150010\tT1,T2"]
    );

    // A second pass sees one transcript named T1,T2 and closes the gap.
    let twice = collapse(&once.intervals, 0, &sizes(), true)?;
    assert_eq!(rows(&twice), vec!["chr1\t0\t150010\tT1,T2"]);

    // Unlabelled output groups everything on a chromosome together.
    let once = collapse(&exons, 0, &sizes(), false)?;
    assert_eq!(rows(&once), vec!["chr1\t0\t50000", "chr1\t100010\t150010"]);
    let twice = collapse(&once.intervals, 0, &sizes(), false)?;
    assert_eq!(rows(&twice), vec!["chr1\t0\t150010"]);
    Ok(())
}

#[test]
fn test_unknown_chromosome_fails() {
    let exons = vec![exon("chrZ", 0, 10, "T")];
    let err = collapse(&exons, 0, &sizes(), true).unwrap_err();
    assert!(err.to_string().contains("chrZ"));
}

#[test]
fn test_collapse_file_uses_cache() -> Result<()> {
    let dir = tempdir()?;
    let genes = dir.path().join("genes.bed");
    fs::write(
        &genes,
        "chr1\t1000\t1200\tT1\nchr1\t1300\t1500\tT1\nchr1\t200000\t200300\tT1\n",
    )?;
    let cache = OutputCache::new(dir.path().join("work"))?;

    let out = collapse_file(&genes, 100, &sizes(), true, &cache)?;
    let name = out.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("genes-transcripts_w100-"));
    assert_eq!(
        fs::read_to_string(&out)?,
        "chr1\t900\t1600\tT1\nchr1\t199900\t200400\tT1\n"
    );

    let again = collapse_file(&genes, 100, &sizes(), true, &cache)?;
    assert_eq!(out, again);

    let wider = collapse_file(&genes, 200, &sizes(), true, &cache)?;
    assert_ne!(out, wider);
    Ok(())
}
