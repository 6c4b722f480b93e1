//! Portal SSL certificate

use async_trait::async_trait;
use ctera_core::{ArgumentError, Parameters, ResourceKind, ReturnValue};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::args::parse;
use crate::certificate::{load_certificate, normalize_thumbprint, read_pem};
use crate::runner::{Module, ModuleContext};

const SSL: &str = "/settings/ssl";

#[derive(Debug, Deserialize)]
pub struct CertificateArgs {
    pub private_key: String,
    pub server_certificate: String,
    pub certificate_chain: Vec<String>,
    #[serde(default)]
    pub force_update: bool,
}

pub struct CertificateModule;

#[async_trait]
impl Module for CertificateModule {
    fn kind(&self) -> ResourceKind {
        ResourceKind::PortalCertificate
    }

    fn failure_message(&self, _params: &Parameters) -> String {
        "SSL certificate management failed".to_string()
    }

    fn validate(&self, params: &Parameters) -> Result<(), ArgumentError> {
        parse::<CertificateArgs>(params).map(|_| ())
    }

    async fn execute(
        &self,
        ctx: &ModuleContext<'_>,
        params: Parameters,
        rv: &mut ReturnValue,
    ) -> ctera_core::Result<()> {
        let args: CertificateArgs = parse(&params)?;
        let current = ctx
            .session
            .fetch(SSL)
            .await?
            .and_then(|ssl| ssl.get("thumbprint").and_then(Value::as_str).map(str::to_string));
        let server = load_certificate(&args.server_certificate)?;

        let unchanged = current
            .as_deref()
            .map(normalize_thumbprint)
            .is_some_and(|thumbprint| thumbprint == server.thumbprint);
        if unchanged && !args.force_update {
            rv.skipped()
                .msg("No update required. SSL certificate did not change")
                .put("thumbprint", current.unwrap_or_default());
            return Ok(());
        }

        let mut certificates = vec![Value::from(server.pem)];
        for certificate in &args.certificate_chain {
            certificates.push(Value::from(read_pem(certificate)?));
        }
        let private_key = read_pem(&args.private_key)?;
        log::info!("importing SSL certificate {}", server.subject);
        ctx.session
            .execute(
                SSL,
                "importCertificate",
                json!({"privateKey": private_key, "certificates": certificates}),
            )
            .await?;
        rv.changed().msg("SSL certificate was updated");
        Ok(())
    }
}
