use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Identifies the schema of an encoded object.
///
/// Both fields are carried verbatim: decoding never checks them against the
/// Rust type being decoded, and an object without them encodes without them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TypeMeta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
}

/// The fields shared by every top-level resource: the type discriminator and
/// the platform-owned object metadata.
///
/// Resources hold a `Header` and flatten it, so `apiVersion`, `kind` and
/// `metadata` are encoded at the top level of the object.
///
/// Decoding goes through a layout with these fields inline, never through a
/// flatten, so errors keep the path of the malformed value.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(from = "HeaderFields")]
pub struct Header {
    #[serde(flatten)]
    pub types: TypeMeta,

    #[serde(default, skip_serializing_if = "is_default_meta")]
    pub metadata: ObjectMeta,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HeaderFields {
    #[serde(default)]
    api_version: String,

    #[serde(default)]
    kind: String,

    #[serde(default)]
    metadata: ObjectMeta,
}

/// Gives codecs access to an object's type discriminator.
pub trait HasTypeMeta {
    fn type_meta(&self) -> &TypeMeta;

    fn type_meta_mut(&mut self) -> &mut TypeMeta;
}

fn is_default_meta(meta: &ObjectMeta) -> bool {
    *meta == ObjectMeta::default()
}

// === impl TypeMeta ===

impl TypeMeta {
    /// Returns the discriminator of the resource type `K`.
    pub fn resource<K: k8s_openapi::Resource>() -> Self {
        Self {
            api_version: K::API_VERSION.to_string(),
            kind: K::KIND.to_string(),
        }
    }

    /// Returns the discriminator of lists of the resource type `K`.
    pub fn list<K: k8s_openapi::ListableResource>() -> Self {
        Self {
            api_version: K::API_VERSION.to_string(),
            kind: K::LIST_KIND.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.api_version.is_empty() && self.kind.is_empty()
    }
}

// === impl Header ===

impl Header {
    /// Builds a header typed as `K` around the given metadata.
    pub fn for_resource<K: k8s_openapi::Resource>(metadata: ObjectMeta) -> Self {
        Self {
            types: TypeMeta::resource::<K>(),
            metadata,
        }
    }

    /// Reassembles a header from its inline wire fields.
    pub(crate) fn from_fields(api_version: String, kind: String, metadata: ObjectMeta) -> Self {
        Self {
            types: TypeMeta { api_version, kind },
            metadata,
        }
    }
}

impl From<HeaderFields> for Header {
    fn from(
        HeaderFields {
            api_version,
            kind,
            metadata,
        }: HeaderFields,
    ) -> Self {
        Self::from_fields(api_version, kind, metadata)
    }
}

/// Implements the `k8s_openapi` resource traits for a type holding a
/// `header: Header` field, which in turn makes `kube::Resource` and
/// `kube::ResourceExt` available for it.
macro_rules! impl_resource {
    (
        $ty:ty,
        kind = $kind:literal,
        list_kind = $list_kind:literal,
        plural = $plural:literal,
        scope = $scope:ty $(,)?
    ) => {
        impl k8s_openapi::Resource for $ty {
            const API_VERSION: &'static str = "access.smi-spec.io/v1alpha1";
            const GROUP: &'static str = "access.smi-spec.io";
            const KIND: &'static str = $kind;
            const VERSION: &'static str = "v1alpha1";
            const URL_PATH_SEGMENT: &'static str = $plural;
            type Scope = $scope;
        }

        impl k8s_openapi::ListableResource for $ty {
            const LIST_KIND: &'static str = $list_kind;
        }

        impl k8s_openapi::Metadata for $ty {
            type Ty = k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

            fn metadata(&self) -> &Self::Ty {
                &self.header.metadata
            }

            fn metadata_mut(&mut self) -> &mut Self::Ty {
                &mut self.header.metadata
            }
        }

        impl $crate::header::HasTypeMeta for $ty {
            fn type_meta(&self) -> &$crate::header::TypeMeta {
                &self.header.types
            }

            fn type_meta_mut(&mut self) -> &mut $crate::header::TypeMeta {
                &mut self.header.types
            }
        }
    };
}

pub(crate) use impl_resource;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_discriminator_beside_metadata() {
        let header = Header {
            types: TypeMeta {
                api_version: "access.smi-spec.io/v1alpha1".to_string(),
                kind: "TrafficTarget".to_string(),
            },
            metadata: ObjectMeta {
                name: Some("api".to_string()),
                ..Default::default()
            },
        };
        assert_eq!(
            serde_json::to_value(&header).unwrap(),
            json!({
                "apiVersion": "access.smi-spec.io/v1alpha1",
                "kind": "TrafficTarget",
                "metadata": { "name": "api" },
            })
        );
    }

    #[test]
    fn empty_header_encodes_nothing() {
        assert_eq!(
            serde_json::to_value(Header::default()).unwrap(),
            json!({})
        );
        let header: Header = serde_json::from_value(json!({})).unwrap();
        assert_eq!(header, Header::default());
    }

    #[test]
    fn decodes_inline_fields() {
        let header: Header = serde_json::from_value(json!({
            "apiVersion": "access.smi-spec.io/v1alpha1",
            "kind": "TrafficTarget",
            "metadata": { "name": "api" },
            "specs": [],
        }))
        .unwrap();
        assert_eq!(header.types.kind, "TrafficTarget");
        assert_eq!(header.metadata.name.as_deref(), Some("api"));
    }
}
