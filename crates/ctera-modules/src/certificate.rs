//! X.509 helpers for the certificate modules

use std::path::Path;

use ctera_core::{CteraError, Result};
use sha1::{Digest, Sha1};
use x509_parser::pem::parse_x509_pem;

/// Parsed certificate details used for comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateInfo {
    pub pem: String,
    pub subject: String,
    pub issuer: String,
    /// Lowercase hex SHA-1 over the DER encoding
    pub thumbprint: String,
}

/// Accept either PEM text or a path to a PEM file.
pub fn read_pem(input: &str) -> Result<String> {
    if input.contains("-----BEGIN") {
        return Ok(input.to_string());
    }
    let path = Path::new(input);
    if path.is_file() {
        return std::fs::read_to_string(path).map_err(|err| CteraError::Certificate {
            message: format!("cannot read {}: {}", input, err),
        });
    }
    Err(CteraError::Certificate {
        message: format!("not a PEM certificate or file: {}", input),
    })
}

pub fn load_certificate(input: &str) -> Result<CertificateInfo> {
    let pem = read_pem(input)?;
    let (_, block) = parse_x509_pem(pem.as_bytes()).map_err(|err| CteraError::Certificate {
        message: format!("invalid PEM: {}", err),
    })?;
    let certificate = block.parse_x509().map_err(|err| CteraError::Certificate {
        message: format!("invalid certificate: {}", err),
    })?;
    Ok(CertificateInfo {
        subject: certificate.subject().to_string(),
        issuer: certificate.issuer().to_string(),
        thumbprint: hex::encode(Sha1::digest(&block.contents)),
        pem,
    })
}

/// Normalise a thumbprint for comparison (`AB:CD:..` and `abcd..` are equal).
pub fn normalize_thumbprint(thumbprint: &str) -> String {
    thumbprint
        .chars()
        .filter(|c| c.is_ascii_hexdigit())
        .collect::<String>()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_certificate_from_text_and_file() {
        let cert = rcgen::generate_simple_self_signed(vec!["portal.example.com".to_string()])
            .unwrap();
        let pem = cert.serialize_pem().unwrap();

        let info = load_certificate(&pem).unwrap();
        assert_eq!(info.subject, info.issuer);
        assert_eq!(info.thumbprint.len(), 40);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(pem.as_bytes()).unwrap();
        let from_file = load_certificate(file.path().to_str().unwrap()).unwrap();
        assert_eq!(from_file.thumbprint, info.thumbprint);
    }

    #[test]
    fn test_load_certificate_rejects_garbage() {
        assert!(load_certificate("not a certificate").is_err());
    }

    #[test]
    fn test_normalize_thumbprint() {
        assert_eq!(normalize_thumbprint("AB:cd:01"), "abcd01");
    }
}
