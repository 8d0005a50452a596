use crate::{
    header::{impl_resource, Header},
    Status,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Associates a set of traffic specs with a set of pods in one namespace.
///
/// Access is granted to traffic that matches any of `specs`; an empty list of
/// specs allows no traffic.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(from = "TrafficTargetFields")]
pub struct TrafficTarget {
    #[serde(flatten)]
    pub header: Header,

    #[serde(default, skip_serializing_if = "Status::is_empty")]
    pub status: Status,

    /// The pods this target admits traffic to.
    #[serde(default, skip_serializing_if = "TrafficTargetSelector::is_empty")]
    pub selector: TrafficTargetSelector,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub specs: Vec<TrafficTargetSpec>,
}

/// The decoded layout of a [`TrafficTarget`], with the header fields inline.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrafficTargetFields {
    #[serde(default)]
    api_version: String,

    #[serde(default)]
    kind: String,

    #[serde(default)]
    metadata: ObjectMeta,

    #[serde(default)]
    status: Status,

    #[serde(default)]
    selector: TrafficTargetSelector,

    #[serde(default)]
    specs: Vec<TrafficTargetSpec>,
}

impl_resource!(
    TrafficTarget,
    kind = "TrafficTarget",
    list_kind = "TrafficTargetList",
    plural = "traffictargets",
    scope = k8s_openapi::NamespaceResourceScope,
);

/// Selects target pods by label.
///
/// An empty selector is valid; whether it selects every pod or none is up to
/// the consumer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrafficTargetSelector {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub match_labels: BTreeMap<String, String>,
}

/// References a traffic spec stored elsewhere, by kind, name and namespace.
///
/// `kind` is conventionally [`TrafficTargetSpec::HTTP_ROUTE_GROUP`] or
/// [`TrafficTargetSpec::TCP_ROUTE`], but any value is carried as-is. The
/// referenced spec may live in a different namespace than the target.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
pub struct TrafficTargetSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    /// Names of routes within the referenced spec. Empty selects every route.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<String>,
}

// === impl TrafficTarget ===

impl TrafficTarget {
    pub fn new(name: impl ToString, namespace: impl ToString) -> Self {
        let metadata = ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        };
        Self {
            header: Header::for_resource::<Self>(metadata),
            ..Default::default()
        }
    }

    pub fn with_selector(mut self, selector: TrafficTargetSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_spec(mut self, spec: TrafficTargetSpec) -> Self {
        self.specs.push(spec);
        self
    }
}

impl From<TrafficTargetFields> for TrafficTarget {
    fn from(fields: TrafficTargetFields) -> Self {
        Self {
            header: Header::from_fields(fields.api_version, fields.kind, fields.metadata),
            status: fields.status,
            selector: fields.selector,
            specs: fields.specs,
        }
    }
}

// === impl TrafficTargetSelector ===

impl TrafficTargetSelector {
    pub fn is_empty(&self) -> bool {
        self.match_labels.is_empty()
    }
}

impl std::iter::FromIterator<(String, String)> for TrafficTargetSelector {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            match_labels: iter.into_iter().collect(),
        }
    }
}

impl std::iter::FromIterator<(&'static str, &'static str)> for TrafficTargetSelector {
    fn from_iter<T: IntoIterator<Item = (&'static str, &'static str)>>(iter: T) -> Self {
        iter.into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

// === impl TrafficTargetSpec ===

impl TrafficTargetSpec {
    pub const HTTP_ROUTE_GROUP: &'static str = "HTTPRouteGroup";
    pub const TCP_ROUTE: &'static str = "TCPRoute";

    pub fn http_route_group(name: impl ToString, namespace: impl ToString) -> Self {
        Self {
            kind: Self::HTTP_ROUTE_GROUP.to_string(),
            name: name.to_string(),
            namespace: namespace.to_string(),
            matches: Vec::new(),
        }
    }

    pub fn tcp_route(name: impl ToString, namespace: impl ToString) -> Self {
        Self {
            kind: Self::TCP_ROUTE.to_string(),
            name: name.to_string(),
            namespace: namespace.to_string(),
            matches: Vec::new(),
        }
    }

    pub fn with_matches<I, S>(mut self, matches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.matches = matches.into_iter().map(|m| m.to_string()).collect();
        self
    }

    /// Indicates whether the reference admits every route of the spec.
    pub fn matches_all_routes(&self) -> bool {
        self.matches.is_empty()
    }
}
