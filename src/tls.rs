// src/tls.rs

//! TLS configuration loading.
//!
//! The transport runs plaintext in debug mode and TLS otherwise; these
//! helpers turn PEM files on disk into rustls configurations for the
//! acceptor and connector sides.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::rustls::{ClientConfig, RootCertStore, ServerConfig};
use tokio_rustls::{TlsAcceptor, TlsConnector};

use crate::error::{AppError, Result};

/// Build a TLS acceptor from a PEM certificate chain and private key.
pub fn acceptor(cert_file: impl AsRef<Path>, key_file: impl AsRef<Path>) -> Result<TlsAcceptor> {
    let certs = load_certs(cert_file.as_ref())?;
    let key = load_key(key_file.as_ref())?;
    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| AppError::config(format!("invalid server certificate/key: {e}")))?;
    Ok(TlsAcceptor::from(Arc::new(config)))
}

/// Build a TLS connector trusting the given PEM CA certificate.
pub fn connector(ca_file: impl AsRef<Path>) -> Result<TlsConnector> {
    let mut roots = RootCertStore::empty();
    for cert in load_certs(ca_file.as_ref())? {
        roots
            .add(cert)
            .map_err(|e| AppError::config(format!("invalid CA certificate: {e}")))?;
    }
    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(TlsConnector::from(Arc::new(config)))
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let file = File::open(path)
        .map_err(|e| AppError::config(format!("cannot open certificate {path:?}: {e}")))?;
    let mut reader = BufReader::new(file);
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| AppError::config(format!("cannot parse certificate {path:?}: {e}")))?;
    if certs.is_empty() {
        return Err(AppError::config(format!(
            "no certificates found in {path:?}"
        )));
    }
    Ok(certs)
}

fn load_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    let file = File::open(path)
        .map_err(|e| AppError::config(format!("cannot open private key {path:?}: {e}")))?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| AppError::config(format!("cannot parse private key {path:?}: {e}")))?
        .ok_or_else(|| AppError::config(format!("no private key found in {path:?}")))
}
