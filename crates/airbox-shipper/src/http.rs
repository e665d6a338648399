// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! HTTP client construction for the delivery client.
//!
//! The client is built once per process with:
//! - rustls TLS
//! - the configured request timeout, covering connect and response
//! - an optional HTTPS proxy (the standard `HTTPS_PROXY` variable is honored otherwise)
//! - connection pooling with TCP keep-alive, since the same endpoint is hit every cycle

use core::time::Duration;

use reqwest::ClientBuilder;
use tracing::error;

use crate::config::Config;

/// Returns a client configured from `config`.
///
/// An unusable proxy setting is logged and the client falls back to a direct connection.
#[must_use]
pub fn get_client(config: &Config) -> reqwest::Client {
    match build_client(config) {
        Ok(client) => client,
        Err(e) => {
            error!(
                "Unable to parse proxy configuration: {}, falling back to direct connection",
                e
            );
            match base_builder(config).build() {
                Ok(client) => client,
                Err(inner) => {
                    error!(
                        "Failed to build HTTP client without proxy: {}, using reqwest defaults",
                        inner
                    );
                    reqwest::Client::new()
                }
            }
        }
    }
}

fn build_client(config: &Config) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = base_builder(config);
    if let Some(proxy) = &config.https_proxy {
        builder = builder.proxy(reqwest::Proxy::https(proxy)?);
    }
    builder.build()
}

fn base_builder(config: &Config) -> ClientBuilder {
    reqwest::Client::builder()
        .use_rustls_tls()
        .timeout(config.request_timeout)
        .connect_timeout(config.request_timeout)
        .pool_idle_timeout(Duration::from_secs(270))
        .tcp_keepalive(Duration::from_secs(120))
}
