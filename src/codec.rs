//! Wire format for request and response bodies.
//!
//! KoboldCpp speaks JSON on every route, so this is the one place the crate
//! turns typed values into bytes and back. Errors are mapped into
//! [`KoboldError`](crate::KoboldError) with the offending body logged.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{map_deserialization_error, map_serialization_error, Result};

pub const CONTENT_TYPE_JSON: &str = "application/json";

pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(map_serialization_error)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| map_deserialization_error(e, bytes))
}

/// Wraps a request so the wire body asks for a stream without touching the
/// caller's value.
#[derive(Debug, Serialize)]
pub(crate) struct WithStream<'a, T: Serialize + ?Sized> {
    #[serde(flatten)]
    pub request: &'a T,
    pub stream: bool,
}

impl<'a, T: Serialize + ?Sized> WithStream<'a, T> {
    pub(crate) fn new(request: &'a T, stream: bool) -> Self {
        Self { request, stream }
    }
}
