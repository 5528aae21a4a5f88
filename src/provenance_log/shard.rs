//! On-disk sharding scheme for the provenance log (§4.E, §6).

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Utc};

/// First two characters of a FIPS code, used as the shard key. 50 shards
/// per month allows independent writers per US state; non-US deployments
/// get whatever shard spread their FIPS-equivalent codes produce.
pub fn shard_key(fips: &str) -> String {
    fips.chars().take(2).collect()
}

fn month_dir(base: &Path, at: DateTime<Utc>) -> PathBuf {
    base.join(format!("{:04}-{:02}", at.year(), at.month()))
}

/// `{base}/{YYYY-MM}/discovery-log-{SS}.ndjson.gz`.
pub fn discovery_shard_path(base: &Path, at: DateTime<Utc>, fips: &str) -> PathBuf {
    month_dir(base, at).join(format!("discovery-log-{}.ndjson.gz", shard_key(fips)))
}

/// `{base}/{YYYY-MM}/tessellation-log-{SS}.ndjson.gz`.
pub fn tessellation_shard_path(base: &Path, at: DateTime<Utc>, fips: &str) -> PathBuf {
    month_dir(base, at).join(format!("tessellation-log-{}.ndjson.gz", shard_key(fips)))
}

/// `{base}/../discovery-staging/`, a sibling of the shard root.
pub fn staging_dir(base: &Path) -> PathBuf {
    base.parent()
        .map(|parent| parent.join("discovery-staging"))
        .unwrap_or_else(|| base.join("discovery-staging"))
}

/// `{base}/../tessellation-staging/`, the parallel staging tree for
/// tessellation proofs (§4.E "a similar parallel tree exists").
pub fn tessellation_staging_dir(base: &Path) -> PathBuf {
    base.parent()
        .map(|parent| parent.join("tessellation-staging"))
        .unwrap_or_else(|| base.join("tessellation-staging"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn discovery_path_matches_spec_shape() {
        let base = Path::new("/data/provenance");
        let at = Utc.with_ymd_and_hms(2022, 3, 15, 0, 0, 0).unwrap();
        let path = discovery_shard_path(base, at, "06037");
        assert_eq!(
            path,
            PathBuf::from("/data/provenance/2022-03/discovery-log-06.ndjson.gz")
        );
    }

    #[test]
    fn staging_dir_is_sibling_of_base() {
        let base = Path::new("/data/provenance");
        assert_eq!(staging_dir(base), PathBuf::from("/data/discovery-staging"));
    }

    #[test]
    fn tessellation_staging_dir_is_sibling_of_base() {
        let base = Path::new("/data/provenance");
        assert_eq!(
            tessellation_staging_dir(base),
            PathBuf::from("/data/tessellation-staging")
        );
    }
}
