//! Identifiers and node payloads for the PKI graph.

use std::fmt;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::errors::Error;
use crate::resources::{
    object_name,
    Certificate,
    ClusterIssuer,
    Issuer,
    ResourceKind,
    Secret,
};

/// Stable, collision-resistant address of a node: `(kind, namespace, name)`.
///
/// Two resources are the same node iff their identifiers are equal. Cluster-scoped kinds carry no
/// namespace, even if the manifest erroneously set one.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Identifier {
    pub kind: ResourceKind,
    pub namespace: Option<String>,
    pub name: String,
}

impl Identifier {
    pub fn new(kind: ResourceKind, namespace: Option<String>, name: impl Into<String>) -> Self {
        let namespace = if kind.is_cluster_scoped() {
            None
        } else {
            namespace.filter(|ns| !ns.is_empty())
        };

        Self { kind, namespace, name: name.into() }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}:{}:{}", self.kind.token(), ns, self.name),
            None => write!(f, "{}:{}", self.kind.token(), self.name),
        }
    }
}

/// Compute the identifier for a resource.
///
/// Total and deterministic, except for resources without any usable name: those cannot be
/// addressed in a diagram, so the call fails with [`Error::MissingIdentity`]. `index` is the
/// resource's position within its kind list and is only used for that error.
pub fn identify(kind: ResourceKind, meta: &ObjectMeta, index: usize) -> Result<Identifier, Error> {
    let name = object_name(meta).ok_or(Error::MissingIdentity { kind, index })?;
    Ok(Identifier::new(kind, meta.namespace.clone(), name))
}

/// Concrete resource payload of a node. Call sites switch exhaustively on the variant.
#[derive(Clone, Debug)]
pub enum Resource {
    Certificate(Certificate),
    ClusterIssuer(ClusterIssuer),
    Issuer(Issuer),
    Secret(Secret),
}

/// A vertex in the PKI graph: either a resource from the input collection, or a synthetic
/// placeholder for a resource that was only referenced.
///
/// Synthetic nodes exist purely as edge endpoints; they carry no payload and no relationships of
/// their own.
#[derive(Clone, Debug)]
pub struct Node {
    id: Identifier,
    resource: Option<Resource>,
}

impl Node {
    pub fn new(id: Identifier, resource: Resource) -> Self {
        Self { id, resource: Some(resource) }
    }

    pub fn synthetic(id: Identifier) -> Self {
        Self { id, resource: None }
    }

    pub fn id(&self) -> &Identifier {
        &self.id
    }

    pub fn kind(&self) -> ResourceKind {
        self.id.kind
    }

    pub fn resource(&self) -> Option<&Resource> {
        self.resource.as_ref()
    }

    pub fn is_synthetic(&self) -> bool {
        self.resource.is_none()
    }

    /// Human-readable label: the resource name (`generateName` fallback included).
    pub fn label(&self) -> &str {
        &self.id.name
    }
}
