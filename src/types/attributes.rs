//! Attributes of an admission request, as seen by the excluder.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Identifies a resource type, e.g. `apps/v1 deployments`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupVersionResource {
    pub group: String,
    pub version: String,
    pub resource: String,
}

impl GroupVersionResource {
    pub fn new(group: &str, version: &str, resource: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            resource: resource.to_string(),
        }
    }

    /// The core `v1 namespaces` resource. Namespace objects are cluster-scoped
    /// even though their requests carry a namespace.
    pub fn namespaces() -> Self {
        Self::new("", "v1", "namespaces")
    }

    pub fn is_namespaces(&self) -> bool {
        self.group.is_empty() && self.version == "v1" && self.resource == "namespaces"
    }
}

/// Identifies a kind, e.g. `coordination.k8s.io/v1 Lease`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupVersionKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GroupVersionKind {
    pub fn new(group: &str, version: &str, kind: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            kind: kind.to_string(),
        }
    }
}

/// Admission operation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Create,
    Update,
    Delete,
    Connect,
}

/// Read-only view of an admission request.
pub trait Attributes {
    /// Name of the object as presented in the request.
    fn get_name(&self) -> &str;

    /// Namespace of the request. For namespace objects this is the
    /// namespace's own name.
    fn get_namespace(&self) -> &str;

    fn get_resource(&self) -> &GroupVersionResource;

    fn get_subresource(&self) -> &str;

    fn get_kind(&self) -> &GroupVersionKind;

    fn get_operation(&self) -> Operation;
}

/// Plain-data [`Attributes`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestAttributes {
    pub name: String,
    pub namespace: String,
    pub resource: GroupVersionResource,
    #[serde(default)]
    pub subresource: String,
    pub kind: GroupVersionKind,
    pub operation: Operation,
}

impl RequestAttributes {
    pub fn new(
        kind: GroupVersionKind,
        resource: GroupVersionResource,
        namespace: &str,
        name: &str,
        operation: Operation,
    ) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            resource,
            subresource: String::new(),
            kind,
            operation,
        }
    }

    /// Attributes for a namespaced object whose kind shares the resource's
    /// group and version.
    pub fn namespaced(
        group: &str,
        version: &str,
        kind: &str,
        resource: &str,
        namespace: &str,
        name: &str,
        operation: Operation,
    ) -> Self {
        Self::new(
            GroupVersionKind::new(group, version, kind),
            GroupVersionResource::new(group, version, resource),
            namespace,
            name,
            operation,
        )
    }

    /// Attributes for a cluster-scoped object.
    pub fn cluster_scoped(
        group: &str,
        version: &str,
        kind: &str,
        resource: &str,
        name: &str,
        operation: Operation,
    ) -> Self {
        Self::namespaced(group, version, kind, resource, "", name, operation)
    }

    pub fn with_subresource(mut self, subresource: &str) -> Self {
        self.subresource = subresource.to_string();
        self
    }
}

impl Attributes for RequestAttributes {
    fn get_name(&self) -> &str {
        &self.name
    }

    fn get_namespace(&self) -> &str {
        &self.namespace
    }

    fn get_resource(&self) -> &GroupVersionResource {
        &self.resource
    }

    fn get_subresource(&self) -> &str {
        &self.subresource
    }

    fn get_kind(&self) -> &GroupVersionKind {
        &self.kind
    }

    fn get_operation(&self) -> Operation {
        self.operation
    }
}
