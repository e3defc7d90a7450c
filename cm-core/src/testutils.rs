//! Shared fixtures for unit tests.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::graph::Identifier;
use crate::resources::{
    CaIssuer,
    Certificate,
    CertificateSpec,
    ClusterIssuer,
    Issuer,
    IssuerRef,
    IssuerSpec,
    ResourceKind,
    Secret,
    TLS_SECRET_TYPE,
};

pub(crate) fn metadata(namespace: Option<&str>, name: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_owned()),
        namespace: namespace.map(str::to_owned),
        ..Default::default()
    }
}

pub(crate) fn ident(kind: ResourceKind, namespace: Option<&str>, name: &str) -> Identifier {
    Identifier::new(kind, namespace.map(str::to_owned), name)
}

pub(crate) fn certificate(
    namespace: &str,
    name: &str,
    secret_name: &str,
    issuer_kind: Option<&str>,
    issuer_name: &str,
) -> Certificate {
    Certificate {
        metadata: metadata(Some(namespace), name),
        spec: CertificateSpec {
            secret_name: secret_name.to_owned(),
            issuer_ref: IssuerRef {
                name: issuer_name.to_owned(),
                kind: issuer_kind.map(str::to_owned),
                group: None,
            },
            ..Default::default()
        },
    }
}

pub(crate) fn ca_certificate(namespace: &str, name: &str, secret_name: &str, issuer_name: &str) -> Certificate {
    let mut cert = certificate(namespace, name, secret_name, Some("Issuer"), issuer_name);
    cert.spec.is_ca = true;
    cert
}

pub(crate) fn ca_issuer(namespace: &str, name: &str, ca_secret: &str) -> Issuer {
    Issuer {
        metadata: metadata(Some(namespace), name),
        spec: IssuerSpec {
            ca: Some(CaIssuer { secret_name: ca_secret.to_owned() }),
        },
    }
}

pub(crate) fn cluster_issuer(name: &str) -> ClusterIssuer {
    ClusterIssuer {
        metadata: metadata(None, name),
        spec: IssuerSpec::default(),
    }
}

pub(crate) fn ca_cluster_issuer(name: &str, ca_secret: &str) -> ClusterIssuer {
    ClusterIssuer {
        metadata: metadata(None, name),
        spec: IssuerSpec {
            ca: Some(CaIssuer { secret_name: ca_secret.to_owned() }),
        },
    }
}

pub(crate) fn tls_secret(namespace: &str, name: &str) -> Secret {
    Secret {
        metadata: metadata(Some(namespace), name),
        type_: Some(TLS_SECRET_TYPE.to_owned()),
        ..Default::default()
    }
}
