//! certmap – render cert-manager PKI manifests as diagrams.
//!
//! Reads Certificates, Issuers, ClusterIssuers, and (optionally) Secrets from YAML manifests and
//! prints a Mermaid or Graphviz DOT description of the trust and provisioning relationships
//! between them to stdout. Diagnostics go to stderr; a non-zero exit status means loading,
//! building, or rendering failed.

use anyhow::{
    Context,
    Result,
};
use clap::{
    Parser,
    ValueEnum,
};
use cm_core::graph::{
    self,
    PkiGraph,
};
use cm_core::loader;
use cm_core::render::{
    self,
    MermaidOptions,
    OutputFormat,
    RenderOptions,
};
use tracing::debug;

/// Render cert-manager PKI manifests as Mermaid or Graphviz diagrams.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// YAML manifest files or directories; use `-` to read from stdin.
    #[arg(required = true)]
    sources: Vec<String>,

    /// Only include namespace-scoped resources in this namespace (also the default namespace for
    /// resources without namespace set).
    #[arg(short, long)]
    namespace: Option<String>,

    /// Output format.
    #[arg(short, long, value_enum, default_value = "mermaid")]
    format: Format,

    /// cert-manager's cluster resource namespace, used to find secrets referenced by
    /// cluster-scoped objects.
    #[arg(long, default_value = graph::DEFAULT_CLUSTER_RESOURCE_NAMESPACE)]
    cluster_resource_namespace: String,

    /// Include Kubernetes Secrets in the graph.
    #[arg(long)]
    show_secrets: bool,

    /// Include objects that are only referenced, but not included in the YAML files (e.g. missing
    /// Secrets or Issuers).
    #[arg(long)]
    show_synthetics: bool,

    /// Leave out the fixed styling block (Mermaid only).
    #[arg(long)]
    no_styles: bool,

    /// Logging verbosity level (`trace`, `debug`, `info`, `warn`, `error`).
    #[arg(short, long, default_value = "info")]
    verbosity: String,
}

/// Supported output formats.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Mermaid,
    Dot,
}

impl From<Format> for OutputFormat {
    fn from(value: Format) -> Self {
        match value {
            Format::Mermaid => OutputFormat::Mermaid,
            Format::Dot => OutputFormat::Dot,
        }
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    cm_core::logging::setup(&args.verbosity);

    let loader_options = loader::Options { namespace: args.namespace.clone() };
    let pki = loader::load_pki(&args.sources, &loader_options).context("failed to load all sources")?;

    let graph_options = graph::Options {
        show_secrets: args.show_secrets,
        show_synthetics: args.show_synthetics,
        cluster_resource_namespace: args.cluster_resource_namespace.clone(),
    };
    let pki_graph = PkiGraph::from_pki(&pki, &graph_options).context("failed to build the PKI graph")?;
    debug!(nodes = pki_graph.node_count(), edges = pki_graph.edge_count(), "derived PKI graph");

    let render_options = RenderOptions {
        mermaid: MermaidOptions { styles: !args.no_styles },
    };
    let rendered =
        render::render(args.format.into(), &pki_graph, &render_options).context("failed to render the PKI graph")?;

    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
