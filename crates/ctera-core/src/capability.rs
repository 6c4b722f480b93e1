//! Per-resource capability declarations
//!
//! Which parameters a resource accepts on creation, which diffed parameters it
//! can modify, and whether it can be modified at all.

use ctera_shared_types::HostKind;

use crate::params::Parameters;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Parameters passed to the create call
    pub creatable: &'static [&'static str],
    /// Parameters eligible for a diff-driven modify; `None` allows any
    pub modifiable: Option<&'static [&'static str]>,
    pub modification_supported: bool,
}

impl Capabilities {
    const fn new(
        creatable: &'static [&'static str],
        modifiable: Option<&'static [&'static str]>,
        modification_supported: bool,
    ) -> Self {
        Self {
            creatable,
            modifiable,
            modification_supported,
        }
    }

    /// Parameters that go into a create call.
    pub fn create_params(&self, params: &Parameters) -> Parameters {
        params.filter(self.creatable)
    }

    /// Split a diff into the modifiable part and the part the resource rejects.
    pub fn split_modifications(&self, diff: &Parameters) -> (Parameters, Parameters) {
        if !self.modification_supported {
            return (Parameters::new(), diff.clone());
        }
        match self.modifiable {
            None => (diff.clone(), Parameters::new()),
            Some(allowed) => {
                let keys: Vec<&str> = diff
                    .keys()
                    .map(String::as_str)
                    .filter(|k| !allowed.contains(k))
                    .collect();
                (diff.filter(allowed), diff.filter(&keys))
            }
        }
    }
}

const NONE: &[&str] = &[];

/// Every resource kind managed by a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    FilerArray,
    FilerShare,
    FilerNtp,
    FilerSnmp,
    FilerStorageCa,
    FilerDomainControllers,
    PortalCertificate,
    PortalCloudFolder,
    PortalDirectoryServices,
    PortalDirectoryServicesAccessControl,
    PortalFolderGroup,
    PortalInitApplicationServer,
    PortalInitMaster,
    PortalInitReplicationServer,
    PortalLocalUser,
    PortalPlan,
    PortalServer,
    PortalStorageNode,
    PortalSyslog,
    PortalTenant,
    PortalTimezone,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 21] = [
        ResourceKind::FilerArray,
        ResourceKind::FilerShare,
        ResourceKind::FilerNtp,
        ResourceKind::FilerSnmp,
        ResourceKind::FilerStorageCa,
        ResourceKind::FilerDomainControllers,
        ResourceKind::PortalCertificate,
        ResourceKind::PortalCloudFolder,
        ResourceKind::PortalDirectoryServices,
        ResourceKind::PortalDirectoryServicesAccessControl,
        ResourceKind::PortalFolderGroup,
        ResourceKind::PortalInitApplicationServer,
        ResourceKind::PortalInitMaster,
        ResourceKind::PortalInitReplicationServer,
        ResourceKind::PortalLocalUser,
        ResourceKind::PortalPlan,
        ResourceKind::PortalServer,
        ResourceKind::PortalStorageNode,
        ResourceKind::PortalSyslog,
        ResourceKind::PortalTenant,
        ResourceKind::PortalTimezone,
    ];

    pub fn module_name(&self) -> &'static str {
        match self {
            ResourceKind::FilerArray => "ctera_filer_array",
            ResourceKind::FilerShare => "ctera_filer_share",
            ResourceKind::FilerNtp => "ctera_filer_ntp",
            ResourceKind::FilerSnmp => "ctera_filer_snmp",
            ResourceKind::FilerStorageCa => "ctera_filer_storage_ca",
            ResourceKind::FilerDomainControllers => "ctera_filer_domain_controllers",
            ResourceKind::PortalCertificate => "ctera_portal_certificate",
            ResourceKind::PortalCloudFolder => "ctera_portal_cloud_folder",
            ResourceKind::PortalDirectoryServices => "ctera_portal_directory_services",
            ResourceKind::PortalDirectoryServicesAccessControl => {
                "ctera_portal_directory_services_access_control"
            }
            ResourceKind::PortalFolderGroup => "ctera_portal_folder_group",
            ResourceKind::PortalInitApplicationServer => "ctera_portal_init_application_server",
            ResourceKind::PortalInitMaster => "ctera_portal_init_master",
            ResourceKind::PortalInitReplicationServer => "ctera_portal_init_replication_server",
            ResourceKind::PortalLocalUser => "ctera_portal_local_user",
            ResourceKind::PortalPlan => "ctera_portal_plan",
            ResourceKind::PortalServer => "ctera_portal_server",
            ResourceKind::PortalStorageNode => "ctera_portal_storage_node",
            ResourceKind::PortalSyslog => "ctera_portal_syslog",
            ResourceKind::PortalTenant => "ctera_portal_tenant",
            ResourceKind::PortalTimezone => "ctera_portal_timezone",
        }
    }

    pub fn from_module_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.module_name() == name)
    }

    pub fn host_kind(&self) -> HostKind {
        match self {
            ResourceKind::FilerArray
            | ResourceKind::FilerShare
            | ResourceKind::FilerNtp
            | ResourceKind::FilerSnmp
            | ResourceKind::FilerStorageCa
            | ResourceKind::FilerDomainControllers => HostKind::Gateway,
            _ => HostKind::Portal,
        }
    }

    /// Initialization modules run against an unconfigured portal.
    pub fn requires_login(&self) -> bool {
        !matches!(
            self,
            ResourceKind::PortalInitApplicationServer
                | ResourceKind::PortalInitMaster
                | ResourceKind::PortalInitReplicationServer
        )
    }

    pub fn capabilities(&self) -> Capabilities {
        match self {
            ResourceKind::FilerArray => {
                Capabilities::new(&["array_name", "level", "members"], None, false)
            }
            ResourceKind::FilerShare => Capabilities::new(
                &[
                    "name",
                    "directory",
                    "acl",
                    "access",
                    "csc",
                    "dir_permissions",
                    "comment",
                    "export_to_afp",
                    "export_to_ftp",
                    "export_to_nfs",
                    "export_to_pc_agent",
                    "export_to_rsync",
                    "indexed",
                    "trusted_nfs_clients",
                ],
                None,
                true,
            ),
            ResourceKind::FilerSnmp => Capabilities::new(
                &["port", "community_str", "username", "password"],
                None,
                true,
            ),
            ResourceKind::PortalLocalUser => Capabilities::new(
                &[
                    "name",
                    "email",
                    "first_name",
                    "last_name",
                    "password",
                    "role",
                    "company",
                    "comment",
                    "password_change",
                ],
                None,
                true,
            ),
            ResourceKind::PortalTenant => Capabilities::new(
                &["name", "display_name", "billing_id", "company", "plan", "comment"],
                Some(&["plan"]),
                true,
            ),
            ResourceKind::PortalStorageNode => Capabilities::new(
                &["name", "read_only", "dedicated_to"],
                Some(&["read_only", "dedicated_to"]),
                true,
            ),
            ResourceKind::PortalPlan => Capabilities::new(
                &["name", "retention", "quotas"],
                Some(&["retention", "quotas"]),
                true,
            ),
            ResourceKind::PortalCloudFolder => {
                Capabilities::new(&["name", "group", "owner", "winacls"], None, false)
            }
            ResourceKind::PortalFolderGroup => Capabilities::new(&["name", "owner"], None, false),
            ResourceKind::PortalDirectoryServices => Capabilities::new(
                &[
                    "domain",
                    "username",
                    "password",
                    "ou",
                    "ssl",
                    "krb",
                    "domain_controllers",
                ],
                None,
                true,
            ),
            ResourceKind::PortalServer => Capabilities::new(
                NONE,
                Some(&[
                    "server_name",
                    "app",
                    "preview",
                    "enable_public_ip",
                    "public_ip",
                    "allow_user_login",
                    "enable_replication",
                    "replica_of",
                ]),
                true,
            ),
            ResourceKind::PortalInitApplicationServer => {
                Capabilities::new(&["ipaddr", "secret"], None, false)
            }
            ResourceKind::PortalInitMaster => Capabilities::new(
                &["email", "first_name", "last_name", "domain"],
                None,
                false,
            ),
            ResourceKind::PortalInitReplicationServer => {
                Capabilities::new(&["ipaddr", "secret", "replicate_from"], None, false)
            }
            ResourceKind::FilerStorageCa | ResourceKind::PortalCertificate => {
                Capabilities::new(NONE, None, false)
            }
            ResourceKind::FilerNtp
            | ResourceKind::FilerDomainControllers
            | ResourceKind::PortalDirectoryServicesAccessControl
            | ResourceKind::PortalSyslog
            | ResourceKind::PortalTimezone => Capabilities::new(NONE, None, true),
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.module_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_module_names_round_trip() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::from_module_name(kind.module_name()), Some(kind));
        }
        assert_eq!(ResourceKind::from_module_name("ctera_unknown"), None);
    }

    #[test]
    fn test_array_is_not_modifiable() {
        let caps = ResourceKind::FilerArray.capabilities();
        let diff: Parameters = serde_json::from_value(json!({"level": "1"})).unwrap();
        let (allowed, rejected) = caps.split_modifications(&diff);
        assert!(allowed.is_empty());
        assert_eq!(rejected, diff);
    }

    #[test]
    fn test_tenant_only_modifies_plan() {
        let caps = ResourceKind::PortalTenant.capabilities();
        let diff: Parameters =
            serde_json::from_value(json!({"plan": "gold", "company": "Acme"})).unwrap();
        let (allowed, rejected) = caps.split_modifications(&diff);
        assert_eq!(allowed.keys().collect::<Vec<_>>(), vec!["plan"]);
        assert_eq!(rejected.keys().collect::<Vec<_>>(), vec!["company"]);
    }

    #[test]
    fn test_create_params() {
        let caps = ResourceKind::FilerArray.capabilities();
        let params: Parameters = serde_json::from_value(
            json!({"array_name": "a", "level": "0", "members": ["VIRT1"], "state": "present"}),
        )
        .unwrap();
        assert_eq!(caps.create_params(&params).len(), 3);
    }

    #[test]
    fn test_init_modules_skip_login() {
        assert!(!ResourceKind::PortalInitMaster.requires_login());
        assert!(ResourceKind::PortalTenant.requires_login());
        assert_eq!(ResourceKind::FilerShare.host_kind(), HostKind::Gateway);
    }
}
