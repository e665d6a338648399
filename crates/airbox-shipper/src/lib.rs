// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Periodic batch-and-ship pipeline for JSON documents on local disk.
//!
//! Each cycle discovers files matching a glob pattern, loads them as JSON
//! objects, wraps them in a `{"data": [...]}` envelope, posts the envelope to
//! a remote endpoint and, only once the endpoint answers `200 OK`, deletes the
//! files that made it into the payload.
//!
//! ```text
//!   fileset ──> loader ──> payload ──> delivery ──> commit
//!   (glob)      (parse)    (envelope)  (POST)       (delete)
//! ```

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod commit;
pub mod config;
pub mod cycle;
pub mod delivery;
pub mod error;
pub mod fileset;
pub mod http;
pub mod loader;
pub mod payload;
pub mod scheduler;
