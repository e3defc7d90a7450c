//! Graphviz DOT renderer.
//!
//! Delegates the already-built graph to petgraph's DOT writer; relationship logic lives entirely
//! in the builder. Node labels are the full identifiers, so the output stays unambiguous across
//! namespaces.

use petgraph::dot::{
    Config,
    Dot,
};

use crate::graph::PkiGraph;

pub(super) fn render(graph: &PkiGraph) -> String {
    let labeled = graph.raw().map(|_, node| node.id().to_string(), |_, _| String::new());
    format!("{}", Dot::with_config(&labeled, &[Config::EdgeNoLabel]))
}

#[cfg(test)]
mod tests {
    use assertables::assert_contains;

    use super::*;
    use crate::graph::Options as GraphOptions;
    use crate::resources::Pki;
    use crate::testutils::{
        certificate,
        cluster_issuer,
    };

    #[test]
    fn emits_a_digraph_with_identifier_labels() {
        let pki = Pki {
            certificates: vec![certificate("default", "c1", "c1-tls", Some("ClusterIssuer"), "ci")],
            cluster_issuers: vec![cluster_issuer("ci")],
            ..Default::default()
        };
        let graph = PkiGraph::from_pki(&pki, &GraphOptions::default()).unwrap();

        let out = render(&graph);

        assert_contains!(out, "digraph");
        assert_contains!(out, "certificate:default:c1");
        assert_contains!(out, "clusterissuer:ci");
        assert_contains!(out, "->");
    }
}
