//! Loading of PKI resources from YAML manifests.
//!
//! Sources may be files, directories (searched recursively for manifest files), or `-` for stdin.
//! Multi-document streams and `List` objects are split into individual resources; documents that
//! are not cert-manager objects or TLS Secrets are ignored. The returned collection is validated
//! to contain no duplicate identifiers and sorted into a stable order, so everything downstream
//! is reproducible regardless of how the input was arranged on disk.

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::fs;
use std::io::Read;
use std::path::Path;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::core::TypeMeta;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{
    debug,
    instrument,
};

use crate::errors::Error;
use crate::graph::identify;
use crate::resources::{
    compare_metadata,
    Certificate,
    ClusterIssuer,
    Issuer,
    Pki,
    ResourceKind,
    Secret,
    TLS_SECRET_TYPE,
};

/// File extensions considered when expanding directory sources.
const MANIFEST_EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Loader configuration.
#[derive(Clone, Debug, Default)]
pub struct Options {
    /// Only include namespaced resources from this namespace; also the fallback namespace for
    /// resources without `metadata.namespace` set.
    pub namespace: Option<String>,
}

/// Load, validate, and sort all PKI resources from `sources`.
#[instrument(skip_all, fields(sources = sources.len()))]
pub fn load_pki(sources: &[String], options: &Options) -> Result<Pki, Error> {
    let mut pki = Pki::default();

    for source in sources {
        load_source(&mut pki, options, source).map_err(|err| Error::InvalidSource {
            path: source.clone(),
            source: Box::new(err),
        })?;
    }

    forbid_duplicates(&pki)?;
    sort_resources(&mut pki);

    debug!(
        certificates = pki.certificates.len(),
        issuers = pki.issuers.len(),
        cluster_issuers = pki.cluster_issuers.len(),
        secrets = pki.secrets.len(),
        "loaded PKI resources"
    );

    Ok(pki)
}

fn load_source(pki: &mut Pki, options: &Options, source: &str) -> Result<(), Error> {
    if source == "-" {
        let mut contents = String::new();
        std::io::stdin()
            .read_to_string(&mut contents)
            .map_err(|source| Error::Io { path: "-".into(), source })?;
        return parse_documents(pki, options, &contents);
    }

    let path = Path::new(source);
    let metadata = fs::metadata(path).map_err(|source| Error::Io { path: path.to_path_buf(), source })?;

    if metadata.is_dir() {
        load_directory(pki, options, path)
    } else {
        load_file(pki, options, path)
    }
}

fn load_directory(pki: &mut Pki, options: &Options, dir: &Path) -> Result<(), Error> {
    let mut entries = fs::read_dir(dir)
        .and_then(|iter| iter.collect::<Result<Vec<_>, _>>())
        .map_err(|source| Error::Io { path: dir.to_path_buf(), source })?;

    // read_dir order is platform-dependent; sort for a reproducible load order.
    entries.sort_by_key(fs::DirEntry::file_name);

    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            load_directory(pki, options, &path)?;
        } else if has_manifest_extension(&path) {
            load_file(pki, options, &path)?;
        }
    }

    Ok(())
}

fn load_file(pki: &mut Pki, options: &Options, path: &Path) -> Result<(), Error> {
    debug!(path = %path.display(), "loading manifest file");
    let contents = fs::read_to_string(path).map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
    parse_documents(pki, options, &contents)
}

fn has_manifest_extension(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| MANIFEST_EXTENSIONS.contains(&ext))
}

/// Split a (possibly multi-document) YAML stream and collect every PKI resource from it.
/// Document indices in errors are 1-based.
fn parse_documents(pki: &mut Pki, options: &Options, contents: &str) -> Result<(), Error> {
    for (index, document) in serde_yaml::Deserializer::from_str(contents).enumerate() {
        let index = index + 1;
        let value = serde::Deserialize::deserialize(document).map_err(|source| Error::InvalidYaml { index, source })?;
        collect_resource(pki, options, index, value)?;
    }

    Ok(())
}

fn collect_resource(pki: &mut Pki, options: &Options, index: usize, value: Value) -> Result<(), Error> {
    if value.is_null() {
        return Ok(()); // empty document
    }

    if !value.is_object() {
        return Err(Error::InvalidObject { index });
    }

    let Ok(types) = serde_json::from_value::<TypeMeta>(value.clone()) else {
        debug!(index, "ignoring document without apiVersion/kind");
        return Ok(());
    };

    // `kind: List` wraps other objects; recurse into its items.
    if types.kind == "List" {
        if let Some(items) = value.get("items").and_then(Value::as_array) {
            for item in items.clone() {
                collect_resource(pki, options, index, item)?;
            }
        }
        return Ok(());
    }

    match (api_group(&types.api_version), types.kind.as_str()) {
        ("", "Secret") => {
            let mut secret: Secret = decode("Secret", index, value)?;

            // Non-TLS secrets (ACME account keys and such) do not shape the PKI.
            if secret.type_.as_deref() != Some(TLS_SECRET_TYPE) {
                debug!(index, "skipping non-TLS Secret");
                return Ok(());
            }

            if scope_namespaced(&mut secret.metadata, options, index)? {
                pki.secrets.push(secret);
            }
        },
        ("cert-manager.io", "Certificate") => {
            let mut cert: Certificate = decode("Certificate", index, value)?;
            if scope_namespaced(&mut cert.metadata, options, index)? {
                pki.certificates.push(cert);
            }
        },
        ("cert-manager.io", "Issuer") => {
            let mut issuer: Issuer = decode("Issuer", index, value)?;
            if scope_namespaced(&mut issuer.metadata, options, index)? {
                pki.issuers.push(issuer);
            }
        },
        ("cert-manager.io", "ClusterIssuer") => {
            let mut issuer: ClusterIssuer = decode("ClusterIssuer", index, value)?;
            // strip misleading metadata
            issuer.metadata.namespace = None;
            pki.cluster_issuers.push(issuer);
        },
        (group, kind) => {
            debug!(index, group, kind, "ignoring non-PKI document");
        },
    }

    Ok(())
}

fn api_group(api_version: &str) -> &str {
    match api_version.split_once('/') {
        Some((group, _version)) => group,
        None => "",
    }
}

fn decode<T: DeserializeOwned>(kind: &'static str, index: usize, value: Value) -> Result<T, Error> {
    serde_json::from_value(value).map_err(|source| Error::InvalidDocument { kind, index, source })
}

/// Apply the namespace fallback and filter. Returns false when the resource lives outside the
/// requested namespace and should be dropped.
fn scope_namespaced(meta: &mut ObjectMeta, options: &Options, index: usize) -> Result<bool, Error> {
    if meta.namespace.as_deref().unwrap_or("").is_empty() {
        match &options.namespace {
            Some(ns) => meta.namespace = Some(ns.clone()),
            None => return Err(Error::MissingNamespace { index }),
        }
    }

    Ok(options.namespace.is_none() || meta.namespace == options.namespace)
}

/// Reject collections that define the same identifier twice within a kind.
fn forbid_duplicates(pki: &Pki) -> Result<(), Error> {
    check_duplicates(ResourceKind::Certificate, pki.certificates.iter().map(|c| &c.metadata))?;
    check_duplicates(ResourceKind::Secret, pki.secrets.iter().map(|s| &s.metadata))?;
    check_duplicates(ResourceKind::Issuer, pki.issuers.iter().map(|i| &i.metadata))?;
    check_duplicates(ResourceKind::ClusterIssuer, pki.cluster_issuers.iter().map(|i| &i.metadata))?;
    Ok(())
}

fn check_duplicates<'a>(kind: ResourceKind, metas: impl Iterator<Item = &'a ObjectMeta>) -> Result<(), Error> {
    let mut seen = BTreeSet::new();

    for (index, meta) in metas.enumerate() {
        let id = identify(kind, meta, index)?;
        if !seen.insert(id.clone()) {
            let mut ident = id.name;
            if let Some(ns) = id.namespace {
                ident = format!("{ns}/{ident}");
            }
            return Err(Error::DuplicateResource { kind, id: ident });
        }
    }

    Ok(())
}

/// Sort each list: cluster-scoped first, then by namespace, then by name. The builder relies on
/// this order for reproducible node insertion.
fn sort_resources(pki: &mut Pki) {
    pki.secrets.sort_by(|a, b| compare_metadata(&a.metadata, &b.metadata));
    pki.certificates.sort_by(|a, b| compare_metadata(&a.metadata, &b.metadata));
    pki.issuers.sort_by(|a, b| compare_metadata(&a.metadata, &b.metadata));
    pki.cluster_issuers.sort_by(|a, b| compare_metadata(&a.metadata, &b.metadata));
}
