//! Messages of the `access.smi-spec.io.v1alpha1` protobuf package.

use super::meta::{ListMeta, ObjectMeta};
use std::collections::BTreeMap;

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TrafficTarget {
    #[prost(message, optional, tag = "1")]
    pub metadata: Option<ObjectMeta>,
    #[prost(string, optional, tag = "2")]
    pub status: Option<String>,
    #[prost(message, optional, tag = "3")]
    pub selector: Option<TrafficTargetSelector>,
    #[prost(message, repeated, tag = "4")]
    pub specs: Vec<TrafficTargetSpec>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TrafficTargetSelector {
    #[prost(btree_map = "string, string", tag = "1")]
    pub match_labels: BTreeMap<String, String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ClusterTrafficTarget {
    #[prost(message, optional, tag = "1")]
    pub metadata: Option<ObjectMeta>,
    #[prost(string, optional, tag = "2")]
    pub status: Option<String>,
    #[prost(string, repeated, tag = "3")]
    pub selector: Vec<String>,
    #[prost(message, repeated, tag = "4")]
    pub specs: Vec<TrafficTargetSpec>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TrafficTargetSpec {
    #[prost(string, optional, tag = "1")]
    pub kind: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub name: Option<String>,
    #[prost(string, optional, tag = "3")]
    pub namespace: Option<String>,
    #[prost(string, repeated, tag = "4")]
    pub matches: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TrafficTargetList {
    #[prost(message, optional, tag = "1")]
    pub metadata: Option<ListMeta>,
    #[prost(message, repeated, tag = "2")]
    pub items: Vec<TrafficTarget>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ClusterTrafficTargetList {
    #[prost(message, optional, tag = "1")]
    pub metadata: Option<ListMeta>,
    #[prost(message, repeated, tag = "2")]
    pub items: Vec<ClusterTrafficTarget>,
}
