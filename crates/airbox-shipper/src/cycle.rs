// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! One pass of the pipeline.
//!
//! ```text
//!   Discovering ──> Loading ──> Building ──> Sending ──┬─> Committing
//!        │             │                              │
//!        └─ no files   └─ nothing loaded              └─ failed: nothing deleted
//! ```
//!
//! A file is deleted if and only if it was parsed into a document and the payload
//! carrying that document was answered with `200 OK`. Nothing is carried from one cycle
//! to the next except the files left on disk.

use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::commit::{self, CommitReport};
use crate::config::Config;
use crate::delivery::Deliver;
use crate::error::{CycleError, DeliveryError};
use crate::{fileset, loader, payload};

#[derive(Debug)]
pub enum CycleOutcome {
    /// The pattern matched nothing.
    NoFiles,
    /// Files matched but none of them loaded.
    NothingToSend { skipped: usize },
    /// The endpoint did not acknowledge the payload. Every file is still on disk.
    DeliveryFailed {
        batch: Vec<PathBuf>,
        skipped: usize,
        error: DeliveryError,
    },
    /// The payload was acknowledged and the batch committed.
    Shipped { skipped: usize, report: CommitReport },
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleOutcome::NoFiles => write!(f, "no files to process"),
            CycleOutcome::NothingToSend { skipped } => {
                write!(f, "no valid data to send ({skipped} files skipped)")
            }
            CycleOutcome::DeliveryFailed {
                batch,
                skipped,
                error,
            } => write!(
                f,
                "delivery of {} documents failed ({skipped} files skipped): {error}",
                batch.len()
            ),
            CycleOutcome::Shipped { skipped, report } => write!(
                f,
                "shipped {} documents ({skipped} files skipped), {} deleted, {} not deleted",
                report.deleted.len() + report.failed.len(),
                report.deleted.len(),
                report.failed.len()
            ),
        }
    }
}

/// Runs discovery, loading, payload assembly, delivery and, on success, commit.
///
/// Errors returned here end the cycle before anything was sent or deleted.
pub async fn run_cycle<D>(config: &Config, delivery: &D) -> Result<CycleOutcome, CycleError>
where
    D: Deliver + ?Sized,
{
    let candidates = fileset::resolve(&config.path_pattern, config.max_files)?;
    if candidates.is_empty() {
        info!("No files to process.");
        return Ok(CycleOutcome::NoFiles);
    }
    debug!("Processing {} files", candidates.len());

    let batch = loader::load_batch(&candidates).await;
    let skipped = batch.skipped.len();
    if batch.is_empty() {
        info!("No valid data to send.");
        return Ok(CycleOutcome::NothingToSend { skipped });
    }

    let body = payload::build_payload(batch.documents.iter().map(|d| &d.document))?;
    let shipped = batch.paths();

    match delivery.deliver(body).await {
        Ok(()) => {}
        Err(DeliveryError::Request(e)) => return Err(CycleError::Request(e)),
        Err(error) => {
            warn!(
                "Delivery failed, keeping {} files for the next cycle: {}",
                shipped.len(),
                error
            );
            return Ok(CycleOutcome::DeliveryFailed {
                batch: shipped,
                skipped,
                error,
            });
        }
    }

    let report = commit::commit(&shipped).await;
    Ok(CycleOutcome::Shipped { skipped, report })
}
