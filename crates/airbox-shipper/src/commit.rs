// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::io;
use std::path::PathBuf;

use tracing::{error, info};

/// Result of deleting a shipped batch.
#[derive(Debug, Default)]
pub struct CommitReport {
    pub deleted: Vec<PathBuf>,
    /// Files that are still on disk. They will be picked up, and shipped again, next cycle.
    pub failed: Vec<(PathBuf, io::Error)>,
}

impl CommitReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Deletes every path of an acknowledged batch.
///
/// Must only be called once the endpoint has accepted the payload built from `paths`. A
/// failed deletion is logged and does not stop the remaining ones.
pub async fn commit(paths: &[PathBuf]) -> CommitReport {
    let mut report = CommitReport::default();

    for path in paths {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                info!("Deleted file {}", path.display());
                report.deleted.push(path.clone());
            }
            Err(e) => {
                error!("Error deleting file {}: {}", path.display(), e);
                report.failed.push((path.clone(), e));
            }
        }
    }

    report
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn test_commit_deletes_all() {
        let dir = TempDir::new().unwrap();
        let paths: Vec<PathBuf> = (0..3)
            .map(|i| {
                let path = dir.path().join(format!("{i}.json"));
                fs::write(&path, "{}").unwrap();
                path
            })
            .collect();

        let report = commit(&paths).await;

        assert!(report.is_complete());
        assert_eq!(report.deleted, paths);
        assert!(paths.iter().all(|p| !p.exists()));
        for path in &paths {
            assert!(logs_contain(&format!("Deleted file {}", path.display())));
        }
        assert!(!logs_contain("Error deleting file"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_commit_continues_after_a_failure() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first.json");
        let stuck = dir.path().join("stuck.json");
        let last = dir.path().join("last.json");
        fs::write(&first, "{}").unwrap();
        // a directory can't be removed as a file
        fs::create_dir(&stuck).unwrap();
        fs::write(&last, "{}").unwrap();

        let report = commit(&[first.clone(), stuck.clone(), last.clone()]).await;

        assert_eq!(report.deleted, vec![first.clone(), last.clone()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, stuck);
        assert!(!first.exists());
        assert!(stuck.exists());
        assert!(!last.exists());
        assert!(logs_contain("Error deleting file"));
    }
}
