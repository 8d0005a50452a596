//! Protobuf messages for the Kubernetes binary encoding.
//!
//! These mirror the `generated.proto` definitions field-for-field, so payloads
//! interoperate with other clients of the API group.

pub mod access;
pub mod meta;

/// Prefixes every protobuf-encoded Kubernetes object.
pub const MAGIC: [u8; 4] = [b'k', b'8', b's', 0];

/// The content type under which protobuf payloads are exchanged.
pub const CONTENT_TYPE: &str = "application/vnd.kubernetes.protobuf";
