#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Resource types of the SMI access API group, `access.smi-spec.io/v1alpha1`.

pub mod cluster_traffic_target;
pub mod codec;
pub mod header;
pub mod list;
pub mod object;
pub mod proto;
pub mod status;
pub mod traffic_target;


pub use self::{
    cluster_traffic_target::{ClusterTargetSelector, ClusterTrafficTarget},
    codec::{decode, encode, DecodeError, EncodeError, Encoding},
    header::{HasTypeMeta, Header, TypeMeta},
    list::{ClusterTrafficTargetList, List, TrafficTargetList},
    object::AccessObject,
    status::Status,
    traffic_target::{TrafficTarget, TrafficTargetSelector, TrafficTargetSpec},
};
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ListMeta, ObjectMeta};
pub use k8s_openapi::{ListableResource, Resource};
pub use kube::ResourceExt;
