use crate::error::{Error, Result};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Regular files directly inside `dir`, sorted by name
fn regular_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let path = entry.map_err(|e| Error::io(dir, e))?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Delete files in `dir` last modified at or before `now - max_age`
///
/// Returns the removed paths. Subdirectories are not descended into.
pub fn sweep_dir(dir: &Path, max_age: TimeDelta, now: DateTime<Utc>) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    let Some(cutoff) = now.checked_sub_signed(max_age) else {
        return Ok(removed);
    };

    for path in regular_files(dir)? {
        let modified = std::fs::metadata(&path)
            .and_then(|m| m.modified())
            .map_err(|e| Error::io(&path, e))?;

        if DateTime::<Utc>::from(modified) <= cutoff {
            std::fs::remove_file(&path).map_err(|e| Error::io(&path, e))?;
            log::debug!("Removed {}", path.display());
            removed.push(path);
        }
    }

    Ok(removed)
}

/// Apply a whole retention policy (directory -> max age in seconds)
///
/// `now` is shared by all directories. The first failure aborts the sweep.
pub fn sweep(policy: &BTreeMap<PathBuf, u64>, now: DateTime<Utc>) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for (dir, max_age_secs) in policy {
        let max_age = i64::try_from(*max_age_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);
        let swept = sweep_dir(dir, max_age, now)?;
        log::info!(
            "{}: removed {} file(s) older than {max_age_secs}s",
            dir.display(),
            swept.len()
        );
        removed.extend(swept);
    }
    Ok(removed)
}
