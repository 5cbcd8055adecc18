use anyhow::Result;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::Write;
use svbins::error::ConfigError;
use svbins::genome::ChromSizes;
use tempfile::tempdir;

#[test]
fn test_from_file() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("test_chromsizes.txt");

    let mut file = File::create(&file_path)?;
    writeln!(file, "chr1\t1000")?;
    writeln!(file, "chr2\t500")?;
    writeln!(file, "chr3\t2000")?;

    let sizes = ChromSizes::from_file(&file_path)?;

    assert_eq!(sizes.len(), 3);
    assert_eq!(sizes.seqnames, vec!["chr1", "chr2", "chr3"]);
    assert_eq!(sizes.lengths, vec![1000, 500, 2000]);

    assert_eq!(sizes.get("chr2"), Some(500));
    assert_eq!(sizes.get("chrX"), None);

    Ok(())
}

#[test]
fn test_from_fai() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("ref.fa.fai");

    let mut file = File::create(&file_path)?;
    writeln!(file, "chr1\t248956422\t112\t70\t71")?;
    writeln!(file, "chrM\t16569\t252513167\t70\t71")?;

    let sizes = ChromSizes::from_file(&file_path)?;
    assert_eq!(sizes.size_of("chr1")?, 248_956_422);
    assert_eq!(sizes.size_of("chrM")?, 16_569);

    Ok(())
}

#[test]
fn test_from_gzipped_file() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("chrom.sizes.gz");

    let mut encoder = GzEncoder::new(File::create(&file_path)?, Compression::default());
    writeln!(encoder, "chr1\t1000")?;
    encoder.finish()?;

    let sizes = ChromSizes::from_file(&file_path)?;
    assert_eq!(sizes.get("chr1"), Some(1000));

    Ok(())
}

#[test]
fn test_empty_file_fails() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("empty.sizes");
    File::create(&file_path)?;

    assert!(ChromSizes::from_file(&file_path).is_err());
    Ok(())
}

#[test]
fn test_unknown_chromosome_is_named() {
    let sizes = ChromSizes::new(vec!["chr1".to_string()], vec![1000]);
    match sizes.size_of("chrUn_KI270302v1") {
        Err(ConfigError::UnknownChromosome(name)) => assert_eq!(name, "chrUn_KI270302v1"),
        other => panic!("unexpected result {:?}", other),
    }
}
