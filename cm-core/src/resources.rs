//! Typed model of the PKI resources certmap understands.
//!
//! Certificates, Issuers, and ClusterIssuers mirror the cert-manager v1 API, reduced to the
//! metadata and spec fields that shape the PKI structure. Secrets come straight from k8s-openapi.

use std::cmp::Ordering;
use std::fmt;

pub use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{
    Deserialize,
    Serialize,
};

/// Secret type holding a TLS keypair. Secrets of any other type (ACME account keys and such) do
/// not influence the PKI structure and are skipped at load time.
pub const TLS_SECRET_TYPE: &str = "kubernetes.io/tls";

/// The four resource kinds that can appear as graph nodes.
///
/// The variant order matches the lexicographic order of the lowercase kind tokens, so the derived
/// `Ord` sorts identifiers the same way their rendered form does.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ResourceKind {
    Certificate,
    ClusterIssuer,
    Issuer,
    Secret,
}

impl ResourceKind {
    /// Cluster-scoped kinds have no namespace of their own.
    pub fn is_cluster_scoped(self) -> bool {
        matches!(self, Self::ClusterIssuer)
    }

    /// Lowercase token used in identifiers and diagram class names.
    pub fn token(self) -> &'static str {
        match self {
            Self::Certificate => "certificate",
            Self::ClusterIssuer => "clusterissuer",
            Self::Issuer => "issuer",
            Self::Secret => "secret",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Certificate => "Certificate",
            Self::ClusterIssuer => "ClusterIssuer",
            Self::Issuer => "Issuer",
            Self::Secret => "Secret",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cert-manager Certificate: a desired TLS certificate, the issuer signing it, and the Secret
/// it populates.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Certificate {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: CertificateSpec,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateSpec {
    /// Name of the Secret the issued keypair is written to.
    #[serde(default)]
    pub secret_name: String,

    /// The (Cluster)Issuer that signs this certificate.
    #[serde(default)]
    pub issuer_ref: IssuerRef,

    /// Whether the issued certificate may itself sign other certificates.
    #[serde(default, rename = "isCA")]
    pub is_ca: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns_names: Vec<String>,
}

/// Reference from a Certificate to its signing issuer. An unset kind means `Issuer`.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct IssuerRef {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

/// A namespace-scoped certificate-signing authority.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Issuer {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: IssuerSpec,
}

/// A cluster-scoped certificate-signing authority. Its namespace is cleared at load time even if
/// the manifest erroneously set one.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ClusterIssuer {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: IssuerSpec,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuerSpec {
    /// CA backend configuration. The only issuer backend that links further into the PKI; all
    /// other backends (ACME, self-signed, ...) make the issuer a sink in the graph.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca: Option<CaIssuer>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaIssuer {
    /// Name of the Secret holding the signing CA keypair.
    #[serde(default)]
    pub secret_name: String,
}

/// A loaded, deduplicated, stably sorted collection of PKI resources.
#[derive(Clone, Debug, Default)]
pub struct Pki {
    pub secrets: Vec<Secret>,
    pub certificates: Vec<Certificate>,
    pub issuers: Vec<Issuer>,
    pub cluster_issuers: Vec<ClusterIssuer>,
}

impl Pki {
    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
            && self.certificates.is_empty()
            && self.issuers.is_empty()
            && self.cluster_issuers.is_empty()
    }
}

/// Display name of a resource: `metadata.name`, falling back to `metadata.generateName`.
pub fn object_name(meta: &ObjectMeta) -> Option<&str> {
    meta.name
        .as_deref()
        .filter(|name| !name.is_empty())
        .or_else(|| meta.generate_name.as_deref().filter(|name| !name.is_empty()))
}

/// Sort order for resources of one kind: cluster-scoped before namespaced, then by namespace,
/// then by name.
pub(crate) fn compare_metadata(a: &ObjectMeta, b: &ObjectMeta) -> Ordering {
    let ns_a = a.namespace.as_deref().unwrap_or("");
    let ns_b = b.namespace.as_deref().unwrap_or("");

    if ns_a.is_empty() != ns_b.is_empty() {
        return if ns_a.is_empty() { Ordering::Less } else { Ordering::Greater };
    }

    ns_a.cmp(ns_b)
        .then_with(|| object_name(a).unwrap_or("").cmp(object_name(b).unwrap_or("")))
}
