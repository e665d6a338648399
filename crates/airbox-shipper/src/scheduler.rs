// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::cycle::{run_cycle, CycleOutcome};
use crate::delivery::Deliver;

/// Drives one cycle per `check_interval`, never two at once.
///
/// A cycle that overruns the interval delays the next tick; missed ticks are not
/// replayed.
pub struct Scheduler<D> {
    config: Arc<Config>,
    delivery: D,
    cancel: CancellationToken,
}

impl<D: Deliver> Scheduler<D> {
    pub fn new(config: Arc<Config>, delivery: D, cancel: CancellationToken) -> Self {
        Scheduler {
            config,
            delivery,
            cancel,
        }
    }

    /// Runs until the cancellation token fires. A cycle in progress is always allowed to
    /// finish so a commit is never cut short.
    pub async fn run(self) {
        let mut ticker = interval(self.config.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // discard first tick, which is instantaneous

        info!(
            "Shipping files matching {} every {:?}",
            self.config.path_pattern, self.config.check_interval
        );

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    info!("Shutdown requested, stopping shipper");
                    break;
                }
                _ = ticker.tick() => {}
            }

            self.tick().await;
        }
    }

    /// Runs a single cycle and logs how it ended.
    pub async fn tick(&self) -> Option<CycleOutcome> {
        match run_cycle(&self.config, &self.delivery).await {
            Ok(outcome) => {
                debug!("Cycle finished: {outcome}");
                Some(outcome)
            }
            Err(e) => {
                error!("Cycle aborted: {e}");
                None
            }
        }
    }
}
