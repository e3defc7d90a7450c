//! Error types shared across the certmap pipeline.

use std::path::PathBuf;

use thiserror::Error;

use crate::resources::ResourceKind;

#[derive(Debug, Error)]
pub enum Error {
    /// A resource has no usable name and therefore cannot be addressed in a diagram. Aborts graph
    /// construction; no partial graph is produced.
    #[error("{kind} #{index} has neither metadata.name nor metadata.generateName")]
    MissingIdentity { kind: ResourceKind, index: usize },

    #[error("found multiple definitions for {kind} {id}")]
    DuplicateResource { kind: ResourceKind, id: String },

    #[error("failed to load from {path}: {source}")]
    InvalidSource {
        path: String,
        #[source]
        source: Box<Error>,
    },

    #[error("document #{index} is not valid YAML: {source}")]
    InvalidYaml {
        index: usize,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("document #{index} is not a Kubernetes object")]
    InvalidObject { index: usize },

    #[error("document #{index} is not a valid {kind}: {source}")]
    InvalidDocument {
        kind: &'static str,
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("document #{index} has no metadata.namespace set and no fallback namespace is configured")]
    MissingNamespace { index: usize },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown output format {0:?}, must be one of: mermaid, dot")]
    UnknownFormat(String),

    /// An edge references a node absent from the vertex set. Unreachable with a correctly built
    /// graph; surfaced instead of recovered.
    #[error("inconsistent graph: no node for identifier {0}")]
    InconsistentGraph(String),
}
