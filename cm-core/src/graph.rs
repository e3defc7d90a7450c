//! Derivation of the PKI graph from a loaded resource collection.
//!
//! The builder runs two phases over the collection. The vertex phase adds one node per resource:
//! Certificates, Issuers, and ClusterIssuers always, Secrets only when [`Options::show_secrets`]
//! is set. The edge phase then walks the relationship fields of every resource and connects the
//! dependent object to the object it depends on:
//!
//! * Certificate → Secret it provisions (`spec.secretName`)
//! * Certificate → (Cluster)Issuer that signs it (`spec.issuerRef`, kind defaults to Issuer)
//! * (Cluster)Issuer → CA Secret it reads (`spec.ca.secretName`); a ClusterIssuer's secret
//!   resolves in [`Options::cluster_resource_namespace`], since cluster-scoped resources have no
//!   namespace of their own
//!
//! Reference resolution is always find-or-synthesize: an already-present node is reused, a
//! missing one is either materialized as a synthetic placeholder ([`Options::show_synthetics`])
//! or the edge is dropped. Unresolvable references are never an error.
//!
//! When secrets are hidden, the implied "Issuer reads the Secret written by a Certificate"
//! two-hop path is bridged into a single Issuer → Certificate edge so the diagram stays legible
//! without exposing Secret objects.
//!
//! Cycles in the input (an issuer whose CA secret is produced by a certificate it signs) are
//! neither detected nor rejected; the resulting edges are rendered as-is.

mod node;

use std::collections::hash_map::Entry;
use std::collections::{
    BTreeMap,
    BTreeSet,
    HashMap,
};

use petgraph::graph::{
    DiGraph,
    NodeIndex,
};
use tracing::{
    debug,
    instrument,
    warn,
};

pub use self::node::{
    identify,
    Identifier,
    Node,
    Resource,
};
use crate::errors::Error;
use crate::resources::{
    Certificate,
    Pki,
    ResourceKind,
};

/// Conventional namespace cert-manager resolves cluster-scoped secrets in.
pub const DEFAULT_CLUSTER_RESOURCE_NAMESPACE: &str = "cert-manager";

/// Options controlling which resources become nodes and how unresolvable references are handled.
#[derive(Clone, Debug)]
pub struct Options {
    /// Include Secrets as first-class nodes instead of bridging over them.
    pub show_secrets: bool,

    /// Materialize placeholder nodes for referenced-but-absent resources instead of dropping the
    /// edge.
    pub show_synthetics: bool,

    /// Namespace used to resolve a ClusterIssuer's CA secret.
    pub cluster_resource_namespace: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            show_secrets: false,
            show_synthetics: false,
            cluster_resource_namespace: DEFAULT_CLUSTER_RESOURCE_NAMESPACE.to_owned(),
        }
    }
}

/// Directed graph over PKI resources.
///
/// Edges point from the dependent object to the object it depends on or is produced by; renderers
/// reverse them for top-down display. Built once per render invocation and read-only afterwards.
#[derive(Debug)]
pub struct PkiGraph {
    graph: DiGraph<Node, ()>,
    indices: HashMap<Identifier, NodeIndex>,
}

impl PkiGraph {
    fn new() -> Self {
        Self { graph: DiGraph::new(), indices: HashMap::new() }
    }

    /// Build the graph for `pki`.
    ///
    /// The only failure mode is a resource without any usable name; in that case no partial graph
    /// is returned. The collection's stable sort order carries over to node insertion order, which
    /// keeps synthetic-node ordering reproducible.
    #[instrument(skip(pki, options), fields(
        certificates = pki.certificates.len(),
        issuers = pki.issuers.len(),
        cluster_issuers = pki.cluster_issuers.len(),
        secrets = pki.secrets.len()
    ))]
    pub fn from_pki(pki: &Pki, options: &Options) -> Result<Self, Error> {
        let mut graph = Self::new();

        // Vertex phase. Identifiers are computed once here and reused by the edge phase.
        let mut certificates = Vec::with_capacity(pki.certificates.len());
        for (index, cert) in pki.certificates.iter().enumerate() {
            let id = identify(ResourceKind::Certificate, &cert.metadata, index)?;
            graph.insert(Node::new(id.clone(), Resource::Certificate(cert.clone())));
            certificates.push((cert, id));
        }

        let mut issuers = Vec::with_capacity(pki.issuers.len());
        for (index, issuer) in pki.issuers.iter().enumerate() {
            let id = identify(ResourceKind::Issuer, &issuer.metadata, index)?;
            graph.insert(Node::new(id.clone(), Resource::Issuer(issuer.clone())));
            issuers.push((issuer, id));
        }

        let mut cluster_issuers = Vec::with_capacity(pki.cluster_issuers.len());
        for (index, issuer) in pki.cluster_issuers.iter().enumerate() {
            let id = identify(ResourceKind::ClusterIssuer, &issuer.metadata, index)?;
            graph.insert(Node::new(id.clone(), Resource::ClusterIssuer(issuer.clone())));
            cluster_issuers.push((issuer, id));
        }

        if options.show_secrets {
            for (index, secret) in pki.secrets.iter().enumerate() {
                let id = identify(ResourceKind::Secret, &secret.metadata, index)?;
                graph.insert(Node::new(id, Resource::Secret(secret.clone())));
            }
        }

        // Edge phase, per certificate: the secret it provisions and the issuer that signs it.
        for (cert, cert_id) in &certificates {
            if options.show_secrets && !cert.spec.secret_name.is_empty() {
                let secret = Identifier::new(
                    ResourceKind::Secret,
                    cert_id.namespace.clone(),
                    cert.spec.secret_name.clone(),
                );
                graph.link(cert_id, secret, options);
            }

            if let Some(issuer_id) = issuer_ref_identifier(cert, cert_id) {
                graph.link(cert_id, issuer_id, options);
            }
        }

        // Edge phase, per (cluster) issuer: the CA secret it consumes, or the bridged
        // certificates when secrets are hidden.
        for (issuer, id) in &issuers {
            if let Some(ca) = &issuer.spec.ca {
                graph.link_ca_secret(id, id.namespace.clone(), &ca.secret_name, &certificates, options);
            }
        }
        for (issuer, id) in &cluster_issuers {
            if let Some(ca) = &issuer.spec.ca {
                let namespace = Some(options.cluster_resource_namespace.clone());
                graph.link_ca_secret(id, namespace, &ca.secret_name, &certificates, options);
            }
        }

        debug!(nodes = graph.node_count(), edges = graph.edge_count(), "built PKI graph");
        Ok(graph)
    }

    /// Number of nodes, synthetic ones included.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Look up a node by identifier.
    pub fn node(&self, id: &Identifier) -> Option<&Node> {
        self.indices.get(id).map(|idx| &self.graph[*idx])
    }

    /// Read-only adjacency view: every node mapped to its direct successors, in ascending
    /// identifier order. Renderers walk this view instead of the underlying storage so their
    /// output never depends on hash-map iteration order.
    pub fn adjacency(&self) -> BTreeMap<&Identifier, BTreeSet<&Identifier>> {
        self.graph
            .node_indices()
            .map(|idx| {
                let successors = self.graph.neighbors(idx).map(|succ| self.graph[succ].id()).collect();
                (self.graph[idx].id(), successors)
            })
            .collect()
    }

    /// The underlying petgraph structure, for renderers that delegate to generic graph tooling.
    pub fn raw(&self) -> &DiGraph<Node, ()> {
        &self.graph
    }

    /// Add `node` unless its identifier is already present; returns the node's index either way.
    fn insert(&mut self, node: Node) -> NodeIndex {
        match self.indices.entry(node.id().clone()) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let idx = self.graph.add_node(node);
                entry.insert(idx);
                idx
            },
        }
    }

    /// Find-or-synthesize resolution for an edge target. Reuses a present node, materializes a
    /// placeholder when synthetics are enabled, and otherwise reports the target as unresolvable.
    fn resolve(&mut self, id: Identifier, options: &Options) -> Option<NodeIndex> {
        if let Some(idx) = self.indices.get(&id) {
            return Some(*idx);
        }

        if !options.show_synthetics {
            debug!(target = %id, "dropping edge to resource missing from the input");
            return None;
        }

        Some(self.insert(Node::synthetic(id)))
    }

    /// Add an edge from an existing node to `to`, resolving `to` per [`Self::resolve`]. Repeated
    /// links between the same ordered pair collapse into one edge.
    fn link(&mut self, from: &Identifier, to: Identifier, options: &Options) {
        let from_idx = self
            .indices
            .get(from)
            .copied()
            .expect("edge source was added during the vertex phase");

        if let Some(to_idx) = self.resolve(to, options) {
            self.graph.update_edge(from_idx, to_idx, ());
        }
    }

    /// Connect an issuer to the CA secret it reads. With secrets hidden, bridge directly to every
    /// certificate that writes a secret of that name in the namespace the secret would live in.
    fn link_ca_secret(
        &mut self,
        issuer: &Identifier,
        namespace: Option<String>,
        secret_name: &str,
        certificates: &[(&Certificate, Identifier)],
        options: &Options,
    ) {
        if secret_name.is_empty() {
            return;
        }

        if options.show_secrets {
            let secret = Identifier::new(ResourceKind::Secret, namespace, secret_name);
            self.link(issuer, secret, options);
            return;
        }

        for (cert, cert_id) in certificates {
            if cert.spec.secret_name == secret_name && cert_id.namespace == namespace {
                self.link(issuer, cert_id.clone(), options);
            }
        }
    }
}

/// Resolve a certificate's `issuerRef` to an identifier. The kind defaults to `Issuer`, which
/// lives in the certificate's own namespace; unrecognized kinds (external issuers) drop the
/// reference.
fn issuer_ref_identifier(cert: &Certificate, cert_id: &Identifier) -> Option<Identifier> {
    let issuer_ref = &cert.spec.issuer_ref;
    if issuer_ref.name.is_empty() {
        return None;
    }

    match issuer_ref.kind.as_deref() {
        None | Some("") | Some("Issuer") => Some(Identifier::new(
            ResourceKind::Issuer,
            cert_id.namespace.clone(),
            issuer_ref.name.clone(),
        )),
        Some("ClusterIssuer") => Some(Identifier::new(ResourceKind::ClusterIssuer, None, issuer_ref.name.clone())),
        Some(other) => {
            warn!(certificate = %cert_id, kind = other, "ignoring issuerRef with unsupported kind");
            None
        },
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::testutils::{
        ca_cluster_issuer,
        ca_issuer,
        certificate,
        cluster_issuer,
        ident,
        tls_secret,
    };

    fn edge(graph: &PkiGraph, from: &Identifier, to: &Identifier) -> bool {
        graph
            .adjacency()
            .get(from)
            .is_some_and(|successors| successors.contains(to))
    }

    #[test]
    fn resources_referencing_the_same_issuer_share_one_node() {
        let pki = Pki {
            certificates: vec![
                certificate("default", "web", "web-tls", Some("Issuer"), "signer"),
                certificate("default", "api", "api-tls", None, "signer"),
            ],
            issuers: vec![ca_issuer("default", "signer", "root-ca")],
            ..Default::default()
        };

        let graph = PkiGraph::from_pki(&pki, &Options::default()).unwrap();

        let issuer = ident(ResourceKind::Issuer, Some("default"), "signer");
        assert_eq!(graph.node_count(), 3);
        assert!(edge(&graph, &ident(ResourceKind::Certificate, Some("default"), "web"), &issuer));
        assert!(edge(&graph, &ident(ResourceKind::Certificate, Some("default"), "api"), &issuer));
    }

    #[rstest]
    #[case::dropped(false)]
    #[case::synthesized(true)]
    fn synthesis_toggle_governs_unresolved_references(#[case] show_synthetics: bool) {
        let pki = Pki {
            certificates: vec![certificate("default", "web", "web-tls", Some("Issuer"), "ghost")],
            ..Default::default()
        };
        let options = Options { show_synthetics, ..Default::default() };

        let graph = PkiGraph::from_pki(&pki, &options).unwrap();

        let issuer = ident(ResourceKind::Issuer, Some("default"), "ghost");
        if show_synthetics {
            assert_eq!(graph.node_count(), 2);
            assert!(graph.node(&issuer).is_some_and(Node::is_synthetic));
            assert!(edge(&graph, &ident(ResourceKind::Certificate, Some("default"), "web"), &issuer));
        } else {
            assert_eq!(graph.node_count(), 1);
            assert_eq!(graph.edge_count(), 0);
            assert!(graph.node(&issuer).is_none());
        }
    }

    #[test]
    fn hidden_secrets_are_bridged_into_a_direct_edge() {
        let pki = Pki {
            certificates: vec![certificate("pki", "root", "root-ca", Some("ClusterIssuer"), "bootstrap")],
            issuers: vec![ca_issuer("pki", "intermediate", "root-ca")],
            ..Default::default()
        };

        let graph = PkiGraph::from_pki(&pki, &Options::default()).unwrap();

        let issuer = ident(ResourceKind::Issuer, Some("pki"), "intermediate");
        let cert = ident(ResourceKind::Certificate, Some("pki"), "root");
        assert!(edge(&graph, &issuer, &cert));
        assert!(graph.node(&ident(ResourceKind::Secret, Some("pki"), "root-ca")).is_none());
    }

    #[test]
    fn shown_secrets_replace_the_bridge_with_a_two_hop_path() {
        let pki = Pki {
            certificates: vec![certificate("pki", "root", "root-ca", Some("ClusterIssuer"), "bootstrap")],
            issuers: vec![ca_issuer("pki", "intermediate", "root-ca")],
            secrets: vec![tls_secret("pki", "root-ca")],
            ..Default::default()
        };
        let options = Options { show_secrets: true, ..Default::default() };

        let graph = PkiGraph::from_pki(&pki, &options).unwrap();

        let issuer = ident(ResourceKind::Issuer, Some("pki"), "intermediate");
        let cert = ident(ResourceKind::Certificate, Some("pki"), "root");
        let secret = ident(ResourceKind::Secret, Some("pki"), "root-ca");
        assert!(edge(&graph, &cert, &secret));
        assert!(edge(&graph, &issuer, &secret));
        assert!(!edge(&graph, &issuer, &cert));
    }

    #[test]
    fn bridging_only_matches_the_namespace_the_secret_lives_in() {
        let pki = Pki {
            certificates: vec![certificate("other", "root", "root-ca", Some("Issuer"), "unrelated")],
            issuers: vec![ca_issuer("pki", "intermediate", "root-ca")],
            ..Default::default()
        };

        let graph = PkiGraph::from_pki(&pki, &Options::default()).unwrap();

        let issuer = ident(ResourceKind::Issuer, Some("pki"), "intermediate");
        let cert = ident(ResourceKind::Certificate, Some("other"), "root");
        assert!(!edge(&graph, &issuer, &cert));
    }

    #[test]
    fn cluster_issuer_secrets_resolve_in_the_cluster_resource_namespace() {
        let pki = Pki {
            cluster_issuers: vec![ca_cluster_issuer("root", "ca-secret")],
            ..Default::default()
        };
        let options = Options {
            show_secrets: true,
            show_synthetics: true,
            cluster_resource_namespace: "cert-manager".to_owned(),
        };

        let graph = PkiGraph::from_pki(&pki, &options).unwrap();

        let secret = ident(ResourceKind::Secret, Some("cert-manager"), "ca-secret");
        assert!(graph.node(&secret).is_some_and(Node::is_synthetic));
        assert!(edge(&graph, &ident(ResourceKind::ClusterIssuer, None, "root"), &secret));
        assert!(graph.node(&ident(ResourceKind::Secret, None, "ca-secret")).is_none());
    }

    #[test]
    fn nameless_resources_abort_the_build() {
        let mut cert = certificate("default", "web", "web-tls", None, "signer");
        cert.metadata.name = None;

        let pki = Pki { certificates: vec![cert], ..Default::default() };
        let err = PkiGraph::from_pki(&pki, &Options::default()).unwrap_err();

        assert!(matches!(err, Error::MissingIdentity { kind: ResourceKind::Certificate, index: 0 }));
    }

    #[test]
    fn unsupported_issuer_ref_kinds_drop_the_edge() {
        let pki = Pki {
            certificates: vec![certificate("default", "web", "web-tls", Some("AWSPCAIssuer"), "external")],
            ..Default::default()
        };
        let options = Options { show_synthetics: true, ..Default::default() };

        let graph = PkiGraph::from_pki(&pki, &options).unwrap();

        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn cyclic_references_build_without_complaint() {
        // The certificate produces the secret its own issuer signs with. Nonsensical, but the
        // builder renders whatever edges result.
        let pki = Pki {
            certificates: vec![certificate("pki", "root", "ca-secret", Some("Issuer"), "signer")],
            issuers: vec![ca_issuer("pki", "signer", "ca-secret")],
            ..Default::default()
        };

        let graph = PkiGraph::from_pki(&pki, &Options::default()).unwrap();

        let cert = ident(ResourceKind::Certificate, Some("pki"), "root");
        let issuer = ident(ResourceKind::Issuer, Some("pki"), "signer");
        assert!(edge(&graph, &cert, &issuer));
        assert!(edge(&graph, &issuer, &cert));
    }

    #[test]
    fn cluster_issuers_are_sinks_without_a_ca_backend() {
        let pki = Pki {
            certificates: vec![certificate("default", "c1", "c1-tls", Some("ClusterIssuer"), "ci")],
            cluster_issuers: vec![cluster_issuer("ci")],
            ..Default::default()
        };

        let graph = PkiGraph::from_pki(&pki, &Options::default()).unwrap();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert!(edge(
            &graph,
            &ident(ResourceKind::Certificate, Some("default"), "c1"),
            &ident(ResourceKind::ClusterIssuer, None, "ci"),
        ));
    }
}
