// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::error::FileSetError;

/// Expands `pattern` and returns at most `max_files` matching paths, in the order the
/// filesystem walk yields them.
///
/// An empty result is not an error. Entries that cannot be read during the walk are
/// logged and left out.
pub fn resolve(pattern: &str, max_files: usize) -> Result<Vec<PathBuf>, FileSetError> {
    let entries = glob::glob(pattern).map_err(|source| FileSetError::Pattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => files.push(path),
            Err(e) => warn!("Error reading path {}: {}", e.path().display(), e.error()),
        }
    }

    if files.len() > max_files {
        debug!(
            "Found {} files matching {}, limiting batch to {}",
            files.len(),
            pattern,
            max_files
        );
        files.truncate(max_files);
    }

    Ok(files)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn pattern_in(dir: &TempDir, glob: &str) -> String {
        dir.path().join(glob).to_string_lossy().into_owned()
    }

    fn touch(dir: &TempDir, name: &str) {
        fs::write(dir.path().join(name), b"{}").unwrap();
    }

    #[test]
    fn test_no_matches_is_empty() {
        let dir = TempDir::new().unwrap();
        let files = resolve(&pattern_in(&dir, "*.json"), 5).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_fewer_than_max() {
        let dir = TempDir::new().unwrap();
        for name in ["a.json", "b.json", "c.json", "ignored.txt"] {
            touch(&dir, name);
        }

        let files = resolve(&pattern_in(&dir, "*.json"), 5).unwrap();
        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|p| p.extension().unwrap() == "json"));
    }

    #[test]
    fn test_truncates_to_max_in_discovery_order() {
        let dir = TempDir::new().unwrap();
        for i in 0..10 {
            touch(&dir, &format!("file{i:02}.json"));
        }
        let pattern = pattern_in(&dir, "*.json");

        let all = resolve(&pattern, 100).unwrap();
        let limited = resolve(&pattern, 5).unwrap();

        assert_eq!(all.len(), 10);
        assert_eq!(limited.len(), 5);
        assert_eq!(limited[..], all[..5]);
    }

    #[test]
    fn test_exactly_max() {
        let dir = TempDir::new().unwrap();
        for i in 0..4 {
            touch(&dir, &format!("file{i}.json"));
        }

        let files = resolve(&pattern_in(&dir, "*.json"), 4).unwrap();
        assert_eq!(files.len(), 4);
    }

    #[test]
    fn test_invalid_pattern() {
        let dir = TempDir::new().unwrap();
        let err = resolve(&pattern_in(&dir, "["), 5).unwrap_err();
        assert!(matches!(err, FileSetError::Pattern { .. }));
    }
}
