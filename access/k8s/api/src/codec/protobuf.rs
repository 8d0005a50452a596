use super::DecodeError;
use crate::{
    header::{HasTypeMeta, TypeMeta},
    proto::{self, access, meta},
    ClusterTargetSelector, ClusterTrafficTarget, List, Status, TrafficTarget,
    TrafficTargetSelector, TrafficTargetSpec,
};
use k8s_openapi::{apimachinery::pkg::apis::meta::v1 as metav1, chrono::DateTime};
use prost::Message;
use std::collections::BTreeMap;

/// A value with a protobuf message representation.
pub trait ToProtobuf: Sized {
    type Message: Message + Default;

    fn to_message(&self) -> Self::Message;

    /// Converts a decoded message back into a value. `path` locates the
    /// message within the payload and prefixes the path of any error.
    fn from_message(msg: Self::Message, path: &str) -> Result<Self, DecodeError>;
}

/// A resource that may be listed, and so has a list message.
pub trait ListItem: ToProtobuf {
    type ListMessage: Message + Default;

    fn list_message(
        metadata: Option<meta::ListMeta>,
        items: Vec<Self::Message>,
    ) -> Self::ListMessage;

    fn list_parts(msg: Self::ListMessage) -> (Option<meta::ListMeta>, Vec<Self::Message>);
}

/// Encodes an object as a Kubernetes protobuf payload: the magic prefix
/// followed by an envelope holding the type discriminator and the object
/// message.
pub fn to_protobuf<T: ToProtobuf + HasTypeMeta>(obj: &T) -> Vec<u8> {
    let types = obj.type_meta();
    let envelope = meta::Unknown {
        type_meta: Some(meta::TypeMeta {
            api_version: Some(types.api_version.clone()),
            kind: Some(types.kind.clone()),
        }),
        raw: Some(obj.to_message().encode_to_vec()),
        content_encoding: None,
        content_type: None,
    };

    let mut buf = Vec::with_capacity(proto::MAGIC.len() + envelope.encoded_len());
    buf.extend_from_slice(&proto::MAGIC);
    buf.extend(envelope.encode_to_vec());
    buf
}

/// Decodes an object from a Kubernetes protobuf payload.
///
/// The envelope's type discriminator is carried into the object as-is.
pub fn from_protobuf<T: ToProtobuf + HasTypeMeta>(bytes: &[u8]) -> Result<T, DecodeError> {
    let (types, raw) = decode_envelope(bytes)?;
    let msg = <T::Message as Message>::decode(raw.as_slice())?;
    let mut obj = T::from_message(msg, "")?;
    *obj.type_meta_mut() = types;
    Ok(obj)
}

/// Strips the magic prefix and returns the envelope's type discriminator and
/// raw object message.
pub(crate) fn decode_envelope(bytes: &[u8]) -> Result<(TypeMeta, Vec<u8>), DecodeError> {
    let body = bytes
        .strip_prefix(proto::MAGIC.as_slice())
        .ok_or(DecodeError::MissingMagic)?;
    let envelope = meta::Unknown::decode(body)?;

    if let Some(encoding) = envelope.content_encoding.filter(|e| !e.is_empty()) {
        return Err(DecodeError::ContentEncoding(encoding));
    }

    let types = envelope
        .type_meta
        .map(|t| TypeMeta {
            api_version: t.api_version.unwrap_or_default(),
            kind: t.kind.unwrap_or_default(),
        })
        .unwrap_or_default();
    tracing::trace!(kind = %types.kind, apiVersion = %types.api_version, "Decoded envelope");

    Ok((types, envelope.raw.unwrap_or_default()))
}

// === Access resources ===

impl ToProtobuf for TrafficTarget {
    type Message = access::TrafficTarget;

    fn to_message(&self) -> Self::Message {
        access::TrafficTarget {
            metadata: object_meta_to_proto(&self.header.metadata),
            status: non_empty_str(self.status.as_str()),
            selector: (!self.selector.is_empty()).then(|| access::TrafficTargetSelector {
                match_labels: self.selector.match_labels.clone(),
            }),
            specs: self.specs.iter().map(ToProtobuf::to_message).collect(),
        }
    }

    fn from_message(msg: Self::Message, path: &str) -> Result<Self, DecodeError> {
        let metadata = msg
            .metadata
            .map(|m| object_meta_from_proto(m, &field(path, "metadata")))
            .transpose()?
            .unwrap_or_default();
        let mut target = TrafficTarget {
            status: Status(msg.status.unwrap_or_default()),
            selector: TrafficTargetSelector {
                match_labels: msg.selector.map(|s| s.match_labels).unwrap_or_default(),
            },
            specs: specs_from_proto(msg.specs, path)?,
            ..Default::default()
        };
        target.header.metadata = metadata;
        Ok(target)
    }
}

impl ListItem for TrafficTarget {
    type ListMessage = access::TrafficTargetList;

    fn list_message(
        metadata: Option<meta::ListMeta>,
        items: Vec<Self::Message>,
    ) -> Self::ListMessage {
        access::TrafficTargetList { metadata, items }
    }

    fn list_parts(msg: Self::ListMessage) -> (Option<meta::ListMeta>, Vec<Self::Message>) {
        (msg.metadata, msg.items)
    }
}

impl ToProtobuf for ClusterTrafficTarget {
    type Message = access::ClusterTrafficTarget;

    fn to_message(&self) -> Self::Message {
        access::ClusterTrafficTarget {
            metadata: object_meta_to_proto(&self.header.metadata),
            status: non_empty_str(self.status.as_str()),
            selector: self.selector.iter().map(|s| s.0.clone()).collect(),
            specs: self.specs.iter().map(ToProtobuf::to_message).collect(),
        }
    }

    fn from_message(msg: Self::Message, path: &str) -> Result<Self, DecodeError> {
        let metadata = msg
            .metadata
            .map(|m| object_meta_from_proto(m, &field(path, "metadata")))
            .transpose()?
            .unwrap_or_default();
        let mut target = ClusterTrafficTarget {
            status: Status(msg.status.unwrap_or_default()),
            selector: msg.selector.into_iter().map(ClusterTargetSelector).collect(),
            specs: specs_from_proto(msg.specs, path)?,
            ..Default::default()
        };
        target.header.metadata = metadata;
        Ok(target)
    }
}

impl ListItem for ClusterTrafficTarget {
    type ListMessage = access::ClusterTrafficTargetList;

    fn list_message(
        metadata: Option<meta::ListMeta>,
        items: Vec<Self::Message>,
    ) -> Self::ListMessage {
        access::ClusterTrafficTargetList { metadata, items }
    }

    fn list_parts(msg: Self::ListMessage) -> (Option<meta::ListMeta>, Vec<Self::Message>) {
        (msg.metadata, msg.items)
    }
}

impl ToProtobuf for TrafficTargetSpec {
    type Message = access::TrafficTargetSpec;

    fn to_message(&self) -> Self::Message {
        access::TrafficTargetSpec {
            kind: non_empty_str(&self.kind),
            name: non_empty_str(&self.name),
            namespace: non_empty_str(&self.namespace),
            matches: self.matches.clone(),
        }
    }

    fn from_message(msg: Self::Message, _: &str) -> Result<Self, DecodeError> {
        Ok(TrafficTargetSpec {
            kind: msg.kind.unwrap_or_default(),
            name: msg.name.unwrap_or_default(),
            namespace: msg.namespace.unwrap_or_default(),
            matches: msg.matches,
        })
    }
}

/// List items are encoded without a type discriminator of their own, so
/// decoded items have an empty one.
impl<T: ListItem> ToProtobuf for List<T> {
    type Message = T::ListMessage;

    fn to_message(&self) -> Self::Message {
        let metadata = &self.metadata;
        let metadata = (*metadata != metav1::ListMeta::default()).then(|| meta::ListMeta {
            self_link: metadata.self_link.clone(),
            resource_version: metadata.resource_version.clone(),
            r#continue: metadata.continue_.clone(),
            remaining_item_count: metadata.remaining_item_count,
        });
        T::list_message(metadata, self.items.iter().map(ToProtobuf::to_message).collect())
    }

    fn from_message(msg: Self::Message, path: &str) -> Result<Self, DecodeError> {
        let (metadata, items) = T::list_parts(msg);
        let metadata = metadata
            .map(|m| metav1::ListMeta {
                self_link: m.self_link,
                resource_version: m.resource_version,
                continue_: m.r#continue,
                remaining_item_count: m.remaining_item_count,
            })
            .unwrap_or_default();
        let items_path = field(path, "items");
        let items = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| T::from_message(item, &format!("{items_path}[{i}]")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(List {
            types: TypeMeta::default(),
            metadata,
            items,
        })
    }
}

fn specs_from_proto(
    specs: Vec<access::TrafficTargetSpec>,
    path: &str,
) -> Result<Vec<TrafficTargetSpec>, DecodeError> {
    let specs_path = field(path, "specs");
    specs
        .into_iter()
        .enumerate()
        .map(|(i, spec)| TrafficTargetSpec::from_message(spec, &format!("{specs_path}[{i}]")))
        .collect()
}

// === Object metadata ===

fn object_meta_to_proto(m: &metav1::ObjectMeta) -> Option<meta::ObjectMeta> {
    if *m == metav1::ObjectMeta::default() {
        return None;
    }

    Some(meta::ObjectMeta {
        name: m.name.clone(),
        generate_name: m.generate_name.clone(),
        namespace: m.namespace.clone(),
        self_link: m.self_link.clone(),
        uid: m.uid.clone(),
        resource_version: m.resource_version.clone(),
        generation: m.generation,
        creation_timestamp: m.creation_timestamp.as_ref().map(time_to_proto),
        deletion_timestamp: m.deletion_timestamp.as_ref().map(time_to_proto),
        deletion_grace_period_seconds: m.deletion_grace_period_seconds,
        labels: m.labels.clone().unwrap_or_default(),
        annotations: m.annotations.clone().unwrap_or_default(),
        owner_references: m
            .owner_references
            .iter()
            .flatten()
            .map(|r| meta::OwnerReference {
                kind: Some(r.kind.clone()),
                name: Some(r.name.clone()),
                uid: Some(r.uid.clone()),
                api_version: Some(r.api_version.clone()),
                controller: r.controller,
                block_owner_deletion: r.block_owner_deletion,
            })
            .collect(),
        finalizers: m.finalizers.clone().unwrap_or_default(),
        managed_fields: m
            .managed_fields
            .iter()
            .flatten()
            .map(|e| meta::ManagedFieldsEntry {
                manager: e.manager.clone(),
                operation: e.operation.clone(),
                api_version: e.api_version.clone(),
                time: e.time.as_ref().map(time_to_proto),
                fields_type: e.fields_type.clone(),
                fields_v1: e.fields_v1.as_ref().map(|f| meta::FieldsV1 {
                    raw: Some(f.0.to_string().into_bytes()),
                }),
                subresource: e.subresource.clone(),
            })
            .collect(),
    })
}

/// Empty collections decode as absent, since the wire cannot distinguish them.
fn object_meta_from_proto(
    m: meta::ObjectMeta,
    path: &str,
) -> Result<metav1::ObjectMeta, DecodeError> {
    let creation_timestamp = m
        .creation_timestamp
        .map(|t| time_from_proto(t, &field(path, "creationTimestamp")))
        .transpose()?;
    let deletion_timestamp = m
        .deletion_timestamp
        .map(|t| time_from_proto(t, &field(path, "deletionTimestamp")))
        .transpose()?;

    let managed_path = field(path, "managedFields");
    let managed_fields = m
        .managed_fields
        .into_iter()
        .enumerate()
        .map(|(i, e)| managed_fields_from_proto(e, &format!("{managed_path}[{i}]")))
        .collect::<Result<Vec<_>, _>>()?;

    let owner_references = m
        .owner_references
        .into_iter()
        .map(|r| metav1::OwnerReference {
            api_version: r.api_version.unwrap_or_default(),
            block_owner_deletion: r.block_owner_deletion,
            controller: r.controller,
            kind: r.kind.unwrap_or_default(),
            name: r.name.unwrap_or_default(),
            uid: r.uid.unwrap_or_default(),
        })
        .collect();

    Ok(metav1::ObjectMeta {
        annotations: non_empty_map(m.annotations),
        creation_timestamp,
        deletion_grace_period_seconds: m.deletion_grace_period_seconds,
        deletion_timestamp,
        finalizers: non_empty_vec(m.finalizers),
        generate_name: m.generate_name,
        generation: m.generation,
        labels: non_empty_map(m.labels),
        managed_fields: non_empty_vec(managed_fields),
        name: m.name,
        namespace: m.namespace,
        owner_references: non_empty_vec(owner_references),
        resource_version: m.resource_version,
        self_link: m.self_link,
        uid: m.uid,
    })
}

fn managed_fields_from_proto(
    e: meta::ManagedFieldsEntry,
    path: &str,
) -> Result<metav1::ManagedFieldsEntry, DecodeError> {
    let time = e
        .time
        .map(|t| time_from_proto(t, &field(path, "time")))
        .transpose()?;
    let fields_v1 = match e.fields_v1.and_then(|f| f.raw) {
        Some(raw) => {
            let value = serde_json::from_slice(&raw).map_err(|error| DecodeError::InvalidField {
                path: field(path, "fieldsV1"),
                reason: error.to_string(),
            })?;
            Some(metav1::FieldsV1(value))
        }
        None => None,
    };

    Ok(metav1::ManagedFieldsEntry {
        api_version: e.api_version,
        fields_type: e.fields_type,
        fields_v1,
        manager: e.manager,
        operation: e.operation,
        subresource: e.subresource,
        time,
    })
}

fn time_to_proto(t: &metav1::Time) -> meta::Time {
    meta::Time {
        seconds: Some(t.0.timestamp()),
        // Sub-second nanos are below 2e9 even for leap seconds.
        nanos: Some(t.0.timestamp_subsec_nanos() as i32),
    }
}

fn time_from_proto(t: meta::Time, path: &str) -> Result<metav1::Time, DecodeError> {
    let seconds = t.seconds.unwrap_or(0);
    let nanos = t.nanos.unwrap_or(0);
    u32::try_from(nanos)
        .ok()
        .and_then(|nanos| DateTime::from_timestamp(seconds, nanos))
        .map(metav1::Time)
        .ok_or_else(|| DecodeError::InvalidField {
            path: path.to_string(),
            reason: format!("timestamp out of range: {seconds}s {nanos}ns"),
        })
}

// === helpers ===

fn field(path: &str, name: &str) -> String {
    if path.is_empty() {
        return name.to_string();
    }
    format!("{path}.{name}")
}

fn non_empty_str(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn non_empty_vec<T>(v: Vec<T>) -> Option<Vec<T>> {
    (!v.is_empty()).then_some(v)
}

fn non_empty_map(m: BTreeMap<String, String>) -> Option<BTreeMap<String, String>> {
    (!m.is_empty()).then_some(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TrafficTargetList;
    use maplit::btreemap;

    fn envelope(kind: &str, raw: Vec<u8>) -> Vec<u8> {
        let unknown = meta::Unknown {
            type_meta: Some(meta::TypeMeta {
                api_version: Some("access.smi-spec.io/v1alpha1".to_string()),
                kind: Some(kind.to_string()),
            }),
            raw: Some(raw),
            ..Default::default()
        };
        let mut buf = proto::MAGIC.to_vec();
        buf.extend(unknown.encode_to_vec());
        buf
    }

    #[test]
    fn carries_discriminator_in_envelope() {
        let target = TrafficTarget::new("t", "ns");
        let bytes = to_protobuf(&target);
        assert!(bytes.starts_with(&proto::MAGIC));

        let (types, raw) = decode_envelope(&bytes).unwrap();
        assert_eq!(types.kind, "TrafficTarget");
        assert_eq!(types.api_version, "access.smi-spec.io/v1alpha1");

        let msg = access::TrafficTarget::decode(raw.as_slice()).unwrap();
        let meta = msg.metadata.expect("metadata must be encoded");
        assert_eq!(meta.name.as_deref(), Some("t"));
        assert_eq!(meta.namespace.as_deref(), Some("ns"));
    }

    #[test]
    fn ignores_unknown_fields() {
        let spec = access::TrafficTargetSpec {
            kind: Some("TCPRoute".to_string()),
            name: Some("db".to_string()),
            ..Default::default()
        };
        let msg = access::TrafficTarget {
            specs: vec![spec],
            ..Default::default()
        };
        let plain = msg.encode_to_vec();
        let mut extended = plain.clone();
        prost::encoding::string::encode(99, &"future".to_string(), &mut extended);

        let a = from_protobuf::<TrafficTarget>(&envelope("TrafficTarget", plain)).unwrap();
        let b = from_protobuf::<TrafficTarget>(&envelope("TrafficTarget", extended)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.specs[0].name, "db");
    }

    #[test]
    fn empty_message_decodes_to_defaults() {
        let target = from_protobuf::<TrafficTarget>(&envelope("TrafficTarget", vec![])).unwrap();
        assert_eq!(target.header.types.kind, "TrafficTarget");
        assert_eq!(target.header.metadata, metav1::ObjectMeta::default());
        assert!(target.status.is_empty());
        assert!(target.selector.is_empty());
        assert!(target.specs.is_empty());
    }

    #[test]
    fn rejects_missing_magic() {
        let bytes = access::TrafficTarget::default().encode_to_vec();
        assert!(matches!(
            from_protobuf::<TrafficTarget>(&bytes),
            Err(DecodeError::MissingMagic)
        ));
    }

    #[test]
    fn rejects_compressed_payloads() {
        let unknown = meta::Unknown {
            raw: Some(vec![]),
            content_encoding: Some("gzip".to_string()),
            ..Default::default()
        };
        let mut bytes = proto::MAGIC.to_vec();
        bytes.extend(unknown.encode_to_vec());
        assert!(matches!(
            from_protobuf::<TrafficTarget>(&bytes),
            Err(DecodeError::ContentEncoding(e)) if e == "gzip"
        ));
    }

    #[test]
    fn rejects_wrong_wire_type() {
        // Field 4 (specs) encoded as a varint rather than a message.
        let raw = vec![0x20, 0x01];
        assert!(matches!(
            from_protobuf::<TrafficTarget>(&envelope("TrafficTarget", raw)),
            Err(DecodeError::Protobuf(_))
        ));
    }

    #[test]
    fn invalid_timestamp_names_the_field() {
        for (seconds, nanos) in [(i64::MAX, 0), (1_700_000_000, -1)] {
            let msg = access::TrafficTarget {
                metadata: Some(meta::ObjectMeta {
                    creation_timestamp: Some(meta::Time {
                        seconds: Some(seconds),
                        nanos: Some(nanos),
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            };
            let err =
                from_protobuf::<TrafficTarget>(&envelope("TrafficTarget", msg.encode_to_vec()))
                    .unwrap_err();
            assert_eq!(err.path(), Some("metadata.creationTimestamp"), "{err}");
        }
    }

    #[test]
    fn timestamps_keep_nanoseconds() {
        let created = DateTime::from_timestamp(1_700_000_000, 123_456_789)
            .expect("timestamp must be valid");
        let mut target = TrafficTarget::new("t", "ns");
        target.header.metadata.creation_timestamp = Some(metav1::Time(created));

        let msg = target.to_message();
        let time = msg
            .metadata
            .as_ref()
            .and_then(|m| m.creation_timestamp.clone())
            .expect("timestamp must be encoded");
        assert_eq!(time.seconds, Some(1_700_000_000));
        assert_eq!(time.nanos, Some(123_456_789));

        let decoded = from_protobuf::<TrafficTarget>(&to_protobuf(&target)).unwrap();
        assert_eq!(decoded, target);
    }

    #[test]
    fn invalid_managed_fields_name_the_item() {
        let list = access::TrafficTargetList {
            metadata: None,
            items: vec![
                access::TrafficTarget::default(),
                access::TrafficTarget {
                    metadata: Some(meta::ObjectMeta {
                        managed_fields: vec![meta::ManagedFieldsEntry {
                            fields_v1: Some(meta::FieldsV1 {
                                raw: Some(b"{not json".to_vec()),
                            }),
                            ..Default::default()
                        }],
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            ],
        };
        let err =
            from_protobuf::<TrafficTargetList>(&envelope("TrafficTargetList", list.encode_to_vec()))
                .unwrap_err();
        assert_eq!(
            err.path(),
            Some("items[1].metadata.managedFields[0].fieldsV1")
        );
    }

    #[test]
    fn encodes_selector_labels_as_map() {
        let target = TrafficTarget::default().with_selector(TrafficTargetSelector {
            match_labels: btreemap! { "app".to_string() => "api".to_string() },
        });
        let msg = target.to_message();
        assert_eq!(
            msg.selector.map(|s| s.match_labels),
            Some(btreemap! { "app".to_string() => "api".to_string() })
        );
        assert_eq!(msg.metadata, None);
        assert_eq!(msg.status, None);
    }
}
