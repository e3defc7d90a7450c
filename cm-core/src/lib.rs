//! # cm-core – certmap core libraries
//!
//! Everything needed to turn declarative cert-manager manifests into a rendered PKI diagram:
//!
//! 1. Loading ([`loader::load_pki`]) – read YAML manifests from files, directories, or stdin and
//!    decode them into a typed, deduplicated, stably sorted [`resources::Pki`] collection.
//! 2. Graph derivation ([`graph::PkiGraph::from_pki`]) – turn the collection into a directed graph
//!    of trust and provisioning relationships. References to resources missing from the input are
//!    either dropped or materialized as placeholder nodes, depending on configuration.
//! 3. Rendering ([`render::render`]) – serialize the graph into Mermaid or Graphviz DOT text. For
//!    a fixed collection and configuration the output is byte-identical across runs.
//!
//! Data flows strictly forward: collection → graph → text. The graph builder never sees raw YAML,
//! and the renderers never derive relationships of their own.

pub mod errors;
pub mod graph;
pub mod loader;
pub mod logging;
pub mod render;
pub mod resources;

#[cfg(test)]
pub(crate) mod testutils;

pub use errors::Error;
pub use graph::{
    Identifier,
    Node,
    PkiGraph,
};
pub use render::OutputFormat;
pub use resources::{
    Pki,
    ResourceKind,
};
