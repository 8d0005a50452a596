//! Encodes and decodes access resources as JSON, YAML or Kubernetes protobuf.
//!
//! Decoding is lenient in the way the API machinery is: unknown fields are
//! ignored and missing fields take their empty defaults. Only values of the
//! wrong type (or malformed payloads) fail, and failures name the offending
//! field.

mod protobuf;

pub(crate) use self::protobuf::decode_envelope;
pub use self::protobuf::{from_protobuf, to_protobuf, ListItem, ToProtobuf};
use crate::header::HasTypeMeta;
use serde::{de::DeserializeOwned, Serialize};
use std::{fmt, str::FromStr};

/// A wire encoding for access resources.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Encoding {
    Json,
    Yaml,
    Protobuf,
}

/// Any value that every [`Encoding`] can carry.
pub trait Encodable: Serialize + DeserializeOwned + ToProtobuf + HasTypeMeta {}

impl<T> Encodable for T where T: Serialize + DeserializeOwned + ToProtobuf + HasTypeMeta {}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid JSON at {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML at {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid protobuf message: {0}")]
    Protobuf(#[from] prost::DecodeError),

    #[error("payload is not prefixed with the Kubernetes protobuf magic")]
    MissingMagic,

    #[error("unsupported content encoding: {0}")]
    ContentEncoding(String),

    #[error("invalid value at {path}: {reason}")]
    InvalidField { path: String, reason: String },

    #[error("unknown kind: {0:?}")]
    UnknownKind(String),
}

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to encode YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, thiserror::Error)]
#[error("unknown encoding {0:?}; expected one of 'json', 'yaml', or 'protobuf'")]
pub struct InvalidEncoding(String);

/// Encodes `obj` in the given encoding.
pub fn encode<T: Encodable>(obj: &T, encoding: Encoding) -> Result<Vec<u8>, EncodeError> {
    match encoding {
        Encoding::Json => to_json(obj),
        Encoding::Yaml => to_yaml(obj),
        Encoding::Protobuf => Ok(to_protobuf(obj)),
    }
}

/// Decodes a `T` from a payload in the given encoding.
pub fn decode<T: Encodable>(bytes: &[u8], encoding: Encoding) -> Result<T, DecodeError> {
    match encoding {
        Encoding::Json => from_json(bytes),
        Encoding::Yaml => from_yaml(bytes),
        Encoding::Protobuf => from_protobuf(bytes),
    }
}

pub fn to_json<T: Serialize>(obj: &T) -> Result<Vec<u8>, EncodeError> {
    serde_json::to_vec(obj).map_err(Into::into)
}

pub fn from_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DecodeError> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    let obj = serde_path_to_error::deserialize(&mut de).map_err(|error| DecodeError::Json {
        path: error.path().to_string(),
        source: error.into_inner(),
    })?;
    // Trailing data is as malformed as a truncated document.
    de.end().map_err(|source| DecodeError::Json {
        path: ".".to_string(),
        source,
    })?;
    Ok(obj)
}

pub fn to_yaml<T: Serialize>(obj: &T) -> Result<Vec<u8>, EncodeError> {
    let yaml = serde_yaml::to_string(obj)?;
    Ok(yaml.into_bytes())
}

pub fn from_yaml<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DecodeError> {
    let de = serde_yaml::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(de).map_err(|error| DecodeError::Yaml {
        path: error.path().to_string(),
        source: error.into_inner(),
    })
}

// === impl DecodeError ===

impl DecodeError {
    /// Returns the path of the field that failed to decode, if known.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Json { path, .. } | Self::Yaml { path, .. } | Self::InvalidField { path, .. } => {
                Some(path.as_str())
            }
            _ => None,
        }
    }
}

// === impl Encoding ===

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Protobuf => "protobuf",
        }
    }

    /// Indicates whether payloads in this encoding are human-readable text.
    pub fn is_text(&self) -> bool {
        !matches!(self, Self::Protobuf)
    }
}

impl FromStr for Encoding {
    type Err = InvalidEncoding;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "protobuf" | "proto" | "pb" => Ok(Self::Protobuf),
            _ => Err(InvalidEncoding(s.to_string())),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
