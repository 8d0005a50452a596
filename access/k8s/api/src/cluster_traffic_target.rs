use crate::{
    header::{impl_resource, Header},
    traffic_target::TrafficTargetSpec,
    Status,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Applies traffic specs to targets across all namespaces, typically
/// system-wide endpoints such as metrics or health checks.
///
/// Unlike [`TrafficTarget`](crate::TrafficTarget), targets are chosen with
/// symbolic selector tokens rather than label matches.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(from = "ClusterTrafficTargetFields")]
pub struct ClusterTrafficTarget {
    #[serde(flatten)]
    pub header: Header,

    #[serde(default, skip_serializing_if = "Status::is_empty")]
    pub status: Status,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selector: Vec<ClusterTargetSelector>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub specs: Vec<TrafficTargetSpec>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClusterTrafficTargetFields {
    #[serde(default)]
    api_version: String,

    #[serde(default)]
    kind: String,

    #[serde(default)]
    metadata: ObjectMeta,

    #[serde(default)]
    status: Status,

    #[serde(default)]
    selector: Vec<ClusterTargetSelector>,

    #[serde(default)]
    specs: Vec<TrafficTargetSpec>,
}

impl_resource!(
    ClusterTrafficTarget,
    kind = "ClusterTrafficTarget",
    list_kind = "ClusterTrafficTargetList",
    plural = "clustertraffictargets",
    scope = k8s_openapi::ClusterResourceScope,
);

/// A symbolic token naming a set of pods cluster-wide.
///
/// Only [`ClusterTargetSelector::NOT_PROTECTED`] is defined; other values are
/// carried without interpretation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct ClusterTargetSelector(pub String);

// === impl ClusterTrafficTarget ===

impl ClusterTrafficTarget {
    pub fn new(name: impl ToString) -> Self {
        let metadata = ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        };
        Self {
            header: Header::for_resource::<Self>(metadata),
            ..Default::default()
        }
    }

    pub fn with_selector(mut self, selector: ClusterTargetSelector) -> Self {
        self.selector.push(selector);
        self
    }

    pub fn with_spec(mut self, spec: TrafficTargetSpec) -> Self {
        self.specs.push(spec);
        self
    }
}

impl From<ClusterTrafficTargetFields> for ClusterTrafficTarget {
    fn from(fields: ClusterTrafficTargetFields) -> Self {
        Self {
            header: Header::from_fields(fields.api_version, fields.kind, fields.metadata),
            status: fields.status,
            selector: fields.selector,
            specs: fields.specs,
        }
    }
}

// === impl ClusterTargetSelector ===

impl ClusterTargetSelector {
    /// Selects all pods that do not carry the `protected` label.
    pub const NOT_PROTECTED: &'static str = "!protected";

    pub fn not_protected() -> Self {
        Self(Self::NOT_PROTECTED.to_string())
    }

    pub fn is_not_protected(&self) -> bool {
        self.0 == Self::NOT_PROTECTED
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClusterTargetSelector {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ClusterTargetSelector {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ClusterTargetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn not_protected_is_a_plain_string() {
        let selector = ClusterTargetSelector::not_protected();
        assert_eq!(serde_json::to_string(&selector).unwrap(), r#""!protected""#);

        let decoded: ClusterTargetSelector = serde_json::from_str(r#""!protected""#).unwrap();
        assert_eq!(decoded, selector);
        assert!(decoded.is_not_protected());
    }

    #[test]
    fn carries_unrecognized_selectors() {
        let target: ClusterTrafficTarget = serde_json::from_value(json!({
            "selector": ["!protected", "system"],
        }))
        .unwrap();
        assert_eq!(
            target.selector,
            vec![
                ClusterTargetSelector::not_protected(),
                ClusterTargetSelector::from("system"),
            ]
        );
        assert!(!target.selector[1].is_not_protected());
    }

    #[test]
    fn encodes_cluster_target() {
        let target = ClusterTrafficTarget::new("metrics")
            .with_selector(ClusterTargetSelector::not_protected())
            .with_spec(
                TrafficTargetSpec::http_route_group("metrics", "linkerd-viz").with_matches(["scrape"]),
            );
        assert_eq!(
            serde_json::to_value(&target).unwrap(),
            json!({
                "apiVersion": "access.smi-spec.io/v1alpha1",
                "kind": "ClusterTrafficTarget",
                "metadata": { "name": "metrics" },
                "selector": ["!protected"],
                "specs": [{
                    "kind": "HTTPRouteGroup",
                    "name": "metrics",
                    "namespace": "linkerd-viz",
                    "matches": ["scrape"],
                }],
            })
        );
    }

    #[test]
    fn rejects_non_string_selector() {
        let res = serde_json::from_value::<ClusterTrafficTarget>(json!({ "selector": [1] }));
        assert!(res.is_err());
    }
}
