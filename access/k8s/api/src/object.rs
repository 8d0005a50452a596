use crate::{
    codec::{self, decode_envelope, DecodeError, EncodeError, Encoding},
    header::{HasTypeMeta, TypeMeta},
    ClusterTrafficTarget, ClusterTrafficTargetList, TrafficTarget, TrafficTargetList,
};
use k8s_openapi::{ListableResource, Resource};

/// Any object of the access API group, as identified by its `kind`.
#[derive(Clone, Debug, PartialEq)]
pub enum AccessObject {
    TrafficTarget(TrafficTarget),
    ClusterTrafficTarget(ClusterTrafficTarget),
    TrafficTargetList(TrafficTargetList),
    ClusterTrafficTargetList(ClusterTrafficTargetList),
}

impl AccessObject {
    /// Decodes a payload into the variant named by its `kind` discriminator.
    pub fn decode(bytes: &[u8], encoding: Encoding) -> Result<Self, DecodeError> {
        let types = match encoding {
            Encoding::Json => codec::from_json::<TypeMeta>(bytes)?,
            Encoding::Yaml => codec::from_yaml::<TypeMeta>(bytes)?,
            Encoding::Protobuf => decode_envelope(bytes)?.0,
        };
        tracing::debug!(kind = %types.kind, %encoding, "Decoding");

        match types.kind.as_str() {
            TrafficTarget::KIND => codec::decode(bytes, encoding).map(Self::TrafficTarget),
            ClusterTrafficTarget::KIND => {
                codec::decode(bytes, encoding).map(Self::ClusterTrafficTarget)
            }
            TrafficTarget::LIST_KIND => codec::decode(bytes, encoding).map(Self::TrafficTargetList),
            ClusterTrafficTarget::LIST_KIND => {
                codec::decode(bytes, encoding).map(Self::ClusterTrafficTargetList)
            }
            _ => Err(DecodeError::UnknownKind(types.kind)),
        }
    }

    pub fn encode(&self, encoding: Encoding) -> Result<Vec<u8>, EncodeError> {
        match self {
            Self::TrafficTarget(t) => codec::encode(t, encoding),
            Self::ClusterTrafficTarget(t) => codec::encode(t, encoding),
            Self::TrafficTargetList(l) => codec::encode(l, encoding),
            Self::ClusterTrafficTargetList(l) => codec::encode(l, encoding),
        }
    }

    pub fn type_meta(&self) -> &TypeMeta {
        match self {
            Self::TrafficTarget(t) => t.type_meta(),
            Self::ClusterTrafficTarget(t) => t.type_meta(),
            Self::TrafficTargetList(l) => l.type_meta(),
            Self::ClusterTrafficTargetList(l) => l.type_meta(),
        }
    }
}

impl From<TrafficTarget> for AccessObject {
    fn from(t: TrafficTarget) -> Self {
        Self::TrafficTarget(t)
    }
}

impl From<ClusterTrafficTarget> for AccessObject {
    fn from(t: ClusterTrafficTarget) -> Self {
        Self::ClusterTrafficTarget(t)
    }
}

impl From<TrafficTargetList> for AccessObject {
    fn from(l: TrafficTargetList) -> Self {
        Self::TrafficTargetList(l)
    }
}

impl From<ClusterTrafficTargetList> for AccessObject {
    fn from(l: ClusterTrafficTargetList) -> Self {
        Self::ClusterTrafficTargetList(l)
    }
}
