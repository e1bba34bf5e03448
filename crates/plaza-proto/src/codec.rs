//! Codec trait and implementations for framing wire messages.
//!
//! A codec converts between Rust message types and the text frames the
//! transport carries. The gateway only depends on the [`Codec`] trait, so
//! the format can be swapped without touching connection handling.
//! [`JsonCodec`] is the default (and currently only) implementation.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtoError;

/// Encodes messages to text frames and decodes frames back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection handler task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into one frame.
    ///
    /// # Errors
    /// Returns [`ProtoError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtoError>;

    /// Deserializes one frame back into a value.
    ///
    /// # Errors
    /// Returns [`ProtoError::Decode`] if the frame is malformed or does
    /// not match the expected type.
    fn decode<T: DeserializeOwned>(&self, frame: &str)
        -> Result<T, ProtoError>;
}

/// A [`Codec`] that frames messages as JSON text via `serde_json`.
///
/// Behind the `json` feature flag (enabled by default).
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtoError> {
        serde_json::to_string(value).map_err(ProtoError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        frame: &str,
    ) -> Result<T, ProtoError> {
        serde_json::from_str(frame).map_err(ProtoError::Decode)
    }
}
