// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::error::PayloadError;
use crate::loader::Document;

/// The wire envelope: `{"data": [doc, ...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub data: Vec<Document>,
}

#[derive(Serialize)]
struct PayloadRef<'a> {
    data: Vec<&'a Document>,
}

/// Serializes `documents`, in order, into a transport-ready envelope.
pub fn build_payload<'a, I>(documents: I) -> Result<Vec<u8>, PayloadError>
where
    I: IntoIterator<Item = &'a Document>,
{
    let envelope = PayloadRef {
        data: documents.into_iter().collect(),
    };
    Ok(serde_json::to_vec(&envelope)?)
}
