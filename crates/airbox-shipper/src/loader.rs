// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::error::LoadError;

/// A file's content, parsed as a JSON object. The shipper never looks inside it.
pub type Document = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    pub path: PathBuf,
    pub document: Document,
}

/// Outcome of loading one batch of candidate files.
#[derive(Debug, Default)]
pub struct LoadedBatch {
    /// Successfully parsed files, in candidate order.
    pub documents: Vec<LoadedDocument>,
    /// Files that could not be read or parsed. They are left on disk.
    pub skipped: Vec<PathBuf>,
}

impl LoadedBatch {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.documents.iter().map(|d| d.path.clone()).collect()
    }
}

/// Reads `path` and parses it as a single JSON object.
pub async fn load_document(path: &Path) -> Result<Document, LoadError> {
    let content = tokio::fs::read(path).await.map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_slice::<Document>(&content).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads every candidate. A file that fails is logged and skipped, the rest of the batch
/// carries on.
pub async fn load_batch(paths: &[PathBuf]) -> LoadedBatch {
    let mut batch = LoadedBatch::default();

    for path in paths {
        match load_document(path).await {
            Ok(document) => batch.documents.push(LoadedDocument {
                path: path.clone(),
                document,
            }),
            Err(e) => {
                error!("{e}");
                batch.skipped.push(path.clone());
            }
        }
    }

    debug!(
        "Loaded {} documents, skipped {} files",
        batch.documents.len(),
        batch.skipped.len()
    );
    batch
}
