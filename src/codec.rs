//! Wire codecs for RPC payloads.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

/// Header carrying the codec name on every request.
pub const CODEC_HEADER: &str = "x-rpc-codec";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    Json,
    Protobuf,
}

impl Codec {
    pub fn name(self) -> &'static str {
        match self {
            Codec::Json => "json",
            Codec::Protobuf => "protobuf",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Codec::Json => "application/json",
            Codec::Protobuf => "application/x-protobuf",
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Codec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Codec::Json),
            "protobuf" | "pb" => Ok(Codec::Protobuf),
            other => Err(format!("unknown codec {other:?}")),
        }
    }
}

/// A message that can travel over either codec.
pub trait Payload: Serialize + DeserializeOwned + prost::Message + Default {}

impl<T> Payload for T where T: Serialize + DeserializeOwned + prost::Message + Default {}

pub fn encode<T: Payload>(codec: Codec, msg: &T) -> Result<Vec<u8>> {
    match codec {
        Codec::Json => serde_json::to_vec(msg).map_err(|e| ClientError::Encode {
            codec: codec.name(),
            message: e.to_string(),
        }),
        Codec::Protobuf => Ok(msg.encode_to_vec()),
    }
}

pub fn decode<T: Payload>(codec: Codec, data: &[u8]) -> Result<T> {
    match codec {
        Codec::Json => serde_json::from_slice(data).map_err(|e| ClientError::Decode {
            codec: codec.name(),
            message: e.to_string(),
        }),
        Codec::Protobuf => T::decode(data).map_err(|e| ClientError::Decode {
            codec: codec.name(),
            message: e.to_string(),
        }),
    }
}
