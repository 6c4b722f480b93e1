//! Trusted CA for the storage backend

use async_trait::async_trait;
use ctera_core::{ArgumentError, Parameters, ResourceKind, ReturnValue};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::args::parse;
use crate::certificate::load_certificate;
use crate::runner::{Module, ModuleContext};

const STORAGE_CA_STATUS: &str = "/status/extStorageTrustedCA";
const STORAGE_CA: &str = "/config/extStorageTrustedCA";

#[derive(Debug, Deserialize)]
pub struct StorageCaArgs {
    pub certificate: String,
    #[serde(default)]
    pub force_update: bool,
}

pub struct StorageCaModule;

/// Subject and issuer of the configured CA, if both are set
async fn current_storage_ca(
    ctx: &ModuleContext<'_>,
) -> ctera_core::Result<Option<(String, String)>> {
    let Some(status) = ctx.session.fetch(STORAGE_CA_STATUS).await? else {
        return Ok(None);
    };
    let subject = status.get("subjectName").and_then(Value::as_str);
    let issuer = status.get("issuerName").and_then(Value::as_str);
    Ok(subject
        .zip(issuer)
        .map(|(subject, issuer)| (subject.to_string(), issuer.to_string())))
}

#[async_trait]
impl Module for StorageCaModule {
    fn kind(&self) -> ResourceKind {
        ResourceKind::FilerStorageCa
    }

    fn failure_message(&self, _params: &Parameters) -> String {
        "Storage CA certificate Management Failed".to_string()
    }

    fn validate(&self, params: &Parameters) -> Result<(), ArgumentError> {
        parse::<StorageCaArgs>(params).map(|_| ())
    }

    async fn execute(
        &self,
        ctx: &ModuleContext<'_>,
        params: Parameters,
        rv: &mut ReturnValue,
    ) -> ctera_core::Result<()> {
        let args: StorageCaArgs = parse(&params)?;
        let new_ca = load_certificate(&args.certificate)?;
        let current = current_storage_ca(ctx).await?;

        let update = match &current {
            None => true,
            Some((subject, issuer)) => {
                args.force_update
                    || !subject.contains(&new_ca.subject)
                    || !issuer.contains(&new_ca.issuer)
            }
        };
        if !update {
            rv.skipped()
                .msg("No update required. Storage CA certificate did not change");
            return Ok(());
        }

        log::info!("importing storage CA {}", new_ca.subject);
        ctx.session
            .put(STORAGE_CA, json!({"certificate": new_ca.pem}))
            .await?;
        rv.changed().msg("Storage CA certificate was updated");
        Ok(())
    }
}
