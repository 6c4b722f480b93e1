//! Portal modules

pub mod access_control;
pub mod certificate;
pub mod cloud_folder;
pub mod directory_services;
pub mod folder_group;
pub mod init_application_server;
pub mod init_master;
pub mod init_replication_server;
pub mod local_user;
pub mod plan;
pub mod server;
pub mod storage_node;
pub mod syslog;
pub mod tenant;
pub mod timezone;

pub use access_control::AccessControlModule;
pub use certificate::CertificateModule;
pub use cloud_folder::CloudFolderModule;
pub use directory_services::DirectoryServicesModule;
pub use folder_group::FolderGroupModule;
pub use init_application_server::InitApplicationServerModule;
pub use init_master::InitMasterModule;
pub use init_replication_server::InitReplicationServerModule;
pub use local_user::LocalUserModule;
pub use plan::PlanModule;
pub use server::ServerModule;
pub use storage_node::StorageNodeModule;
pub use syslog::SyslogModule;
pub use tenant::TenantModule;
pub use timezone::TimezoneModule;

use ctera_client::{segment, Session};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::account_name;

const SETUP: &str = "/setup";
const SETUP_STATUS: &str = "/setup/status";
const WIZARD_FINISHED: &str = "finish";

/// A local or directory user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub name: String,
    #[serde(default)]
    pub directory: Option<String>,
}

impl UserAccount {
    pub fn account(&self) -> String {
        account_name(&self.name, self.directory.as_deref())
    }

    /// Object reference of the user
    pub fn reference(&self) -> String {
        format!("/users/{}", segment(&self.account()))
    }
}

/// Whether the setup wizard already ran to completion.
pub(crate) async fn setup_finished(session: &Session) -> ctera_core::Result<bool> {
    let status = session.fetch(SETUP_STATUS).await?;
    Ok(status
        .as_ref()
        .and_then(|status| status.get("wizard"))
        .and_then(Value::as_str)
        == Some(WIZARD_FINISHED))
}

/// Run one setup wizard step.
pub(crate) async fn run_setup(session: &Session, step: &str, param: Value) -> ctera_core::Result<()> {
    log::info!("running portal setup step {}", step);
    session.execute(SETUP, step, param).await?;
    Ok(())
}
