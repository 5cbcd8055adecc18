use anyhow::Result;
use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::cache::{CacheKey, OutputCache};
use crate::interval::IntervalStore;
use crate::utils::file_stem;

/// Remove exclusion regions (centromeres, short contig ends) from `base`.
///
/// With `whole_feature`, base regions overlapping any exclusion are dropped
/// instead of trimmed. The result is memoized in `cache`. When the
/// subtraction cannot be produced, the unfiltered `base` path is returned.
pub fn remove_excluded<P, Q>(
    base: P,
    exclusion: Q,
    whole_feature: bool,
    cache: &OutputCache,
) -> Result<PathBuf>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let base = base.as_ref();
    let exclusion = exclusion.as_ref();

    match filter_file(base, exclusion, whole_feature, cache) {
        Ok(out) => Ok(out),
        Err(e) => {
            warn!(
                "Could not remove exclusion regions {:?} from {:?}, using unfiltered regions: {:#}",
                exclusion, base, e
            );
            Ok(base.to_path_buf())
        }
    }
}

fn filter_file(
    base: &Path,
    exclusion: &Path,
    whole_feature: bool,
    cache: &OutputCache,
) -> Result<PathBuf> {
    let key = CacheKey::builder("remove_excluded")
        .file(base)?
        .file(exclusion)?
        .param("whole_feature", whole_feature)
        .finish();
    let name = format!(
        "{}-noexclude",
        file_stem(base).unwrap_or_else(|| "regions".to_string())
    );

    cache.get_or_create(&key, &name, |out| {
        let regions = IntervalStore::read_bed(base)?;
        let excluded = IntervalStore::read_bed(exclusion)?;
        let kept = regions.subtract(&excluded, whole_feature);
        info!(
            "Removed exclusion regions: {} regions in, {} out ({} bp -> {} bp)",
            regions.len(),
            kept.len(),
            regions.lengths().iter().sum::<u64>(),
            kept.lengths().iter().sum::<u64>()
        );
        kept.write_bed(out)
    })
}
