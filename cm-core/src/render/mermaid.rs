//! Mermaid flowchart renderer.
//!
//! Output is fully deterministic: node statements are emitted in ascending identifier order and
//! edge statements follow the same order with sorted successors. Logical edges point
//! dependent → dependency; the emitted arrows are reversed so the chart reads top-down from
//! signer to signed artifact. That reversal is a presentation transform, the graph itself is
//! untouched.

use crate::errors::Error;
use crate::graph::{
    Identifier,
    Node,
    PkiGraph,
    Resource,
};
use crate::resources::ResourceKind;

/// Fixed styling directives, one per resource kind plus the CA variant.
const CLASS_DEFS: &str = concat!(
    "\tclassDef clusterissuer color:#7F7\n",
    "\tclassDef issuer color:#77F\n",
    "\tclassDef ca color:#F77\n",
    "\tclassDef cert color:orange\n",
    "\tclassDef secret color:red",
);

/// Mermaid-specific configuration.
#[derive(Clone, Debug)]
pub struct MermaidOptions {
    /// Emit the fixed `classDef` styling block after the edges.
    pub styles: bool,
}

impl Default for MermaidOptions {
    fn default() -> Self {
        Self { styles: true }
    }
}

pub(super) fn render(graph: &PkiGraph, options: &MermaidOptions) -> Result<String, Error> {
    let mut out = String::from("graph TB\n");
    let adjacency = graph.adjacency();

    // All node statements first, so the edge section reads as pure wiring.
    for id in adjacency.keys() {
        let node = lookup(graph, id)?;
        out.push_str(&format!("\t{}([{}]):::{}\n", node_id(node), node.label(), node_class(node)));
    }

    out.push('\n');

    for (id, successors) in &adjacency {
        let source = lookup(graph, id)?;
        for successor in successors {
            let target = lookup(graph, successor)?;
            out.push_str(&format!("\t{} --> {}\n", node_id(target), node_id(source)));
        }
    }

    if options.styles {
        out.push('\n');
        out.push_str(CLASS_DEFS);
    }

    Ok(out)
}

fn lookup<'a>(graph: &'a PkiGraph, id: &Identifier) -> Result<&'a Node, Error> {
    graph.node(id).ok_or_else(|| Error::InconsistentGraph(id.to_string()))
}

/// Mermaid-safe node id: `{kind}_{namespace}/{name}` with `-` mapped to `_`.
fn node_id(node: &Node) -> String {
    let id = node.id();
    let ident = match &id.namespace {
        Some(ns) => format!("{}/{}", ns, id.name),
        None => id.name.clone(),
    };

    format!("{}_{}", id.kind.token(), ident.replace('-', "_"))
}

/// CSS class token: the resource kind, with CA certificates distinguished and a `_synthetic`
/// suffix for placeholder nodes.
fn node_class(node: &Node) -> String {
    let is_ca = matches!(node.resource(), Some(Resource::Certificate(cert)) if cert.spec.is_ca);

    let base = match node.kind() {
        ResourceKind::Certificate if is_ca => "ca",
        ResourceKind::Certificate => "cert",
        ResourceKind::ClusterIssuer => "clusterissuer",
        ResourceKind::Issuer => "issuer",
        ResourceKind::Secret => "secret",
    };

    if node.is_synthetic() {
        format!("{base}_synthetic")
    } else {
        base.to_owned()
    }
}
