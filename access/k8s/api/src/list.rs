use crate::{
    header::{HasTypeMeta, TypeMeta},
    ClusterTrafficTarget, TrafficTarget,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ListMeta;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub type TrafficTargetList = List<TrafficTarget>;
pub type ClusterTrafficTargetList = List<ClusterTrafficTarget>;

/// A page of resources as returned by a list call.
///
/// Unlike the resources themselves, `metadata` and `items` are always
/// encoded, even when empty.
///
/// Items keep whatever discriminator they were built or decoded with. The
/// protobuf encoding has no place for it, so items decoded from protobuf
/// carry an empty [`TypeMeta`]; [`List::new`] clears the items'
/// discriminators so that a list compares equal across every encoding.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(
    from = "ListFields<T>",
    bound(deserialize = "T: Deserialize<'de>")
)]
pub struct List<T> {
    #[serde(flatten)]
    pub types: TypeMeta,

    #[serde(default)]
    pub metadata: ListMeta,

    #[serde(default)]
    pub items: Vec<T>,
}

/// The decoded layout of a [`List`], with the discriminator inline.
#[derive(Deserialize)]
#[serde(
    rename_all = "camelCase",
    bound(deserialize = "T: Deserialize<'de>")
)]
struct ListFields<T> {
    #[serde(default)]
    api_version: String,

    #[serde(default)]
    kind: String,

    #[serde(default)]
    metadata: ListMeta,

    #[serde(default)]
    items: Vec<T>,
}

impl<T> From<ListFields<T>> for List<T> {
    fn from(fields: ListFields<T>) -> Self {
        Self {
            types: TypeMeta {
                api_version: fields.api_version,
                kind: fields.kind,
            },
            metadata: fields.metadata,
            items: fields.items,
        }
    }
}

impl<T> List<T> {
    /// Builds a list typed after the item resource. Items are stored without
    /// their own discriminators, as the API server returns them.
    pub fn new(mut items: Vec<T>) -> Self
    where
        T: k8s_openapi::ListableResource + HasTypeMeta,
    {
        for item in &mut items {
            *item.type_meta_mut() = TypeMeta::default();
        }
        Self {
            types: TypeMeta::list::<T>(),
            metadata: ListMeta::default(),
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self {
            types: TypeMeta::default(),
            metadata: ListMeta::default(),
            items: Vec::new(),
        }
    }
}

impl<T> HasTypeMeta for List<T> {
    fn type_meta(&self) -> &TypeMeta {
        &self.types
    }

    fn type_meta_mut(&mut self) -> &mut TypeMeta {
        &mut self.types
    }
}

impl<T> IntoIterator for List<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a List<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
