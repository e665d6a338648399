// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

mod signal;

use std::{env, ffi::OsString, path::PathBuf, process, sync::Arc};

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use airbox_shipper::{
    config::{Config, DEFAULT_CONFIG_PATH, DEFAULT_LOG_LEVEL},
    delivery::DeliveryClient,
    scheduler::Scheduler,
};

#[derive(Debug, Parser)]
#[command(
    name = "airbox-shipper",
    version,
    about = "Ships JSON files from a local directory to the airbox API"
)]
struct Args {
    /// Path to the configuration file
    #[arg(long, env = "AIRBOX_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

/// Accepts the single-dash `-config <path>` and `-config=<path>` forms older deployments
/// were started with.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            let rewritten = match arg.to_str() {
                Some("-config") => Some(OsString::from("--config")),
                Some(s) if s.starts_with("-config=") => Some(OsString::from(format!("-{s}"))),
                _ => None,
            };
            rewritten.unwrap_or(arg)
        })
        .collect()
}

#[tokio::main]
pub async fn main() {
    let args = Args::parse_from(normalize_args(env::args_os()));

    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            let bootstrap_level = env::var("AIRBOX_LOG_LEVEL")
                .map(|val| val.to_lowercase())
                .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());
            init_logging(&bootstrap_level);
            error!("{e}");
            process::exit(1);
        }
    };

    init_logging(&config.log_level);
    debug!("Loaded configuration: {config:?}");

    let delivery = match DeliveryClient::new(&config) {
        Ok(delivery) => delivery,
        Err(e) => {
            error!("Error creating delivery client: {e}");
            process::exit(1);
        }
    };
    info!("Starting airbox shipper, delivering to {}", delivery.endpoint());

    let cancel = CancellationToken::new();
    let scheduler = Scheduler::new(Arc::new(config), delivery, cancel.clone());
    let mut shipper = tokio::spawn(scheduler.run());

    tokio::select! {
        () = signal::shutdown_signal() => {
            cancel.cancel();
            if let Err(e) = shipper.await {
                error!("Shipper task failed: {e}");
                process::exit(1);
            }
        }
        res = &mut shipper => {
            if let Err(e) = res {
                error!("Shipper task failed: {e}");
                process::exit(1);
            }
        }
    }

    info!("Airbox shipper stopped");
}

fn init_logging(log_level: &str) {
    let env_filter = format!("h2=off,hyper=off,rustls=off,reqwest=off,{log_level}");
    let filter = EnvFilter::try_new(env_filter).unwrap_or_else(|e| {
        eprintln!("Invalid log level '{log_level}' ({e}), using '{DEFAULT_LOG_LEVEL}'");
        EnvFilter::new(DEFAULT_LOG_LEVEL)
    });

    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Setting default subscriber failed: {e}");
    }

    debug!("Logging subsystem enabled");
}
