// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Authenticated delivery of a serialized payload.
//!
//! A delivery is a single `POST` of the payload bytes to the configured endpoint. It
//! succeeds only when the transport succeeds and the endpoint answers exactly `200 OK`;
//! any other status, a timeout, a refused connection or a TLS failure is a failed
//! delivery. There is no retry here: the next cycle rebuilds and resends the batch.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::DeliveryError;
use crate::http::get_client;

pub const ACCEPT_VALUE: &str = "application/vnd.airbox.v1+json";
pub const CONTENT_TYPE_VALUE: &str = "application/json";
pub const SERVER_KEY_HEADER: &str = "X-Server-Key";

const MAX_LOGGED_BODY: usize = 512;

/// Sends one payload to the remote end. `Ok(())` means the payload was acknowledged and
/// its source files may be deleted.
#[async_trait]
pub trait Deliver: Send + Sync {
    async fn deliver(&self, payload: Vec<u8>) -> Result<(), DeliveryError>;
}

#[derive(Debug, Clone)]
pub struct DeliveryClient {
    client: reqwest::Client,
    endpoint: String,
    headers: HeaderMap,
}

impl DeliveryClient {
    /// Builds the client and its request headers. Fails if the token or server key can't
    /// be carried in a header.
    pub fn new(config: &Config) -> Result<Self, DeliveryError> {
        Ok(DeliveryClient {
            client: get_client(config),
            endpoint: config.api_endpoint.clone(),
            headers: build_headers(&config.api_token, &config.server_key)?,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn build_headers(api_token: &str, server_key: &str) -> Result<HeaderMap, DeliveryError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_VALUE));

    let mut authorization = HeaderValue::from_str(&format!("Bearer {api_token}")).map_err(
        |source| DeliveryError::InvalidHeader {
            name: "Authorization",
            source,
        },
    )?;
    authorization.set_sensitive(true);
    headers.insert(AUTHORIZATION, authorization);

    let mut server_key =
        HeaderValue::from_str(server_key).map_err(|source| DeliveryError::InvalidHeader {
            name: SERVER_KEY_HEADER,
            source,
        })?;
    server_key.set_sensitive(true);
    headers.insert(SERVER_KEY_HEADER, server_key);

    Ok(headers)
}

#[async_trait]
impl Deliver for DeliveryClient {
    async fn deliver(&self, payload: Vec<u8>) -> Result<(), DeliveryError> {
        debug!("Sending {} bytes to {}", payload.len(), self.endpoint);

        let resp = self
            .client
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .body(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    DeliveryError::Request(e)
                } else {
                    DeliveryError::Transport(e)
                }
            })?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            error!("Received non-OK response: {}", status.as_u16());
            if !body.is_empty() {
                debug!("Response body: {}", truncate(&body, MAX_LOGGED_BODY));
            }
            return Err(DeliveryError::Status(status));
        }

        info!("Payload successfully sent.");
        Ok(())
    }
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
