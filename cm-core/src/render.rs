//! Serialization of the PKI graph into diagram text.
//!
//! Two interchangeable renderers consume the same graph: Mermaid (the primary, human-diffable
//! format) and Graphviz DOT (delegated to petgraph). Renderers are pure functions over the
//! prepared adjacency view and never derive relationships of their own.
//!
//! There is no global renderer registry; callers pick a format and pass the per-renderer options
//! they constructed at startup.

mod dot;
mod mermaid;

use std::fmt;
use std::str::FromStr;

pub use self::mermaid::MermaidOptions;
use crate::errors::Error;
use crate::graph::PkiGraph;

/// Diagram language to emit.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum OutputFormat {
    /// Mermaid flowchart with explicit node and edge statements.
    #[default]
    Mermaid,
    /// Graphviz DOT, emitted by petgraph.
    Dot,
}

impl OutputFormat {
    /// All supported formats, for help and error texts.
    pub const ALL: [OutputFormat; 2] = [Self::Mermaid, Self::Dot];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mermaid => "mermaid",
            Self::Dot => "dot",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mermaid" => Ok(Self::Mermaid),
            "dot" | "graphviz" => Ok(Self::Dot),
            other => Err(Error::UnknownFormat(other.to_owned())),
        }
    }
}

/// Per-renderer configuration, constructed once by the caller and passed down.
#[derive(Clone, Debug, Default)]
pub struct RenderOptions {
    pub mermaid: MermaidOptions,
}

/// Render `graph` in the requested format.
///
/// Deterministic for a given graph: repeated calls produce byte-identical output.
pub fn render(format: OutputFormat, graph: &PkiGraph, options: &RenderOptions) -> Result<String, Error> {
    match format {
        OutputFormat::Mermaid => mermaid::render(graph, &options.mermaid),
        OutputFormat::Dot => Ok(dot::render(graph)),
    }
}
