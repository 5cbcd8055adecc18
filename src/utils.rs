use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().is_file()
}

pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        std::fs::create_dir_all(path)
            .context(format!("Failed to create directory: {:?}", path))?;
    }
    Ok(())
}

/// File name without directory and without a trailing `.gz` and BED-like
/// extension, e.g. `genes.bed.gz` -> `genes`.
pub fn file_stem<P: AsRef<Path>>(path: P) -> Option<String> {
    let path = path.as_ref();
    let name = if path.extension().map(|ext| ext == "gz").unwrap_or(false) {
        Path::new(path.file_stem()?).file_stem()?
    } else {
        path.file_stem()?
    };
    name.to_str().map(String::from)
}

/// Open a plain or gzip-compressed text file. Compression is detected by
/// the gzip magic bytes, so misnamed files still read correctly.
pub fn open_reader<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let file = File::open(path).context(format!("Failed to open file: {:?}", path))?;
    let mut reader = BufReader::new(file);

    let is_gz = {
        let header = reader.fill_buf()?;
        header.len() >= 2 && header[0] == 0x1f && header[1] == 0x8b
    };

    if is_gz {
        debug!("Reading {:?} as gzip", path);
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(reader))))
    } else {
        Ok(Box::new(reader))
    }
}
