// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use reqwest::header::InvalidHeaderValue;
use reqwest::StatusCode;

/// Errors raised while loading the shipper configuration. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Error reading config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Error parsing config file: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, thiserror::Error)]
pub enum FileSetError {
    #[error("Invalid path pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },
}

/// A single file that could not be turned into a document. Never fatal to the batch.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Error reading file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Error unmarshalling file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("Error marshalling payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Invalid value for header {name}: {source}")]
    InvalidHeader {
        name: &'static str,
        source: InvalidHeaderValue,
    },

    #[error("Error creating HTTP client: {0}")]
    Client(reqwest::Error),

    #[error("Error creating request: {0}")]
    Request(reqwest::Error),

    #[error("Error sending request: {0}")]
    Transport(reqwest::Error),

    #[error("Received non-OK response: {}", .0.as_u16())]
    Status(StatusCode),
}

/// Conditions that end a cycle before anything is sent or deleted.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error(transparent)]
    Pattern(#[from] FileSetError),

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error("Error creating request: {0}")]
    Request(reqwest::Error),
}
