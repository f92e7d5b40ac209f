use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

/// An RFC-3339-ish basename with fractional seconds, filesystem-safe
/// (colons replaced) — used as the seed for both export and analysis
/// artifact file names.
pub fn timestamp_basename(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%S%.9fZ").to_string().replace(':', "")
}

/// Returns a path under `dir` for `<basename><suffix>.json` that does not
/// already exist, appending a monotonic counter (`-1`, `-2`, ...) on
/// collision (Property 14: writing twice never overwrites).
pub fn collision_safe_path(dir: &Path, basename: &str, suffix: Option<&str>) -> PathBuf {
    let suffix = suffix.unwrap_or("");
    let mut candidate = dir.join(format!("{basename}{suffix}.json"));
    let mut counter = 1u64;
    while candidate.exists() {
        candidate = dir.join(format!("{basename}{suffix}-{counter}.json"));
        counter += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn first_write_has_no_suffix() {
        let dir = std::env::temp_dir().join(format!("archivist-naming-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = collision_safe_path(&dir, "20240115T100000Z", None);
        assert_eq!(path, dir.join("20240115T100000Z.json"));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn collision_appends_counter() {
        let dir = std::env::temp_dir().join(format!("archivist-naming-test2-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("base.json"), "{}").unwrap();
        let path = collision_safe_path(&dir, "base", None);
        assert_eq!(path, dir.join("base-1.json"));
        fs::write(&path, "{}").unwrap();
        let path2 = collision_safe_path(&dir, "base", None);
        assert_eq!(path2, dir.join("base-2.json"));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn partial_suffix_is_inserted_before_extension() {
        let dir = std::env::temp_dir().join(format!("archivist-naming-test3-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = collision_safe_path(&dir, "base", Some("_partial"));
        assert_eq!(path, dir.join("base_partial.json"));
        fs::remove_dir_all(&dir).ok();
    }
}
