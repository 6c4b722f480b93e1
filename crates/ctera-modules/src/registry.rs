//! Module registry
//!
//! Maps module names to their handlers.

use std::collections::HashMap;
use std::sync::Arc;

use ctera_core::ResourceKind;

use crate::filer::{
    ArrayModule, DomainControllersModule, NtpModule, ShareModule, SnmpModule, StorageCaModule,
};
use crate::portal::{
    AccessControlModule, CertificateModule, CloudFolderModule, DirectoryServicesModule,
    FolderGroupModule, InitApplicationServerModule, InitMasterModule,
    InitReplicationServerModule, LocalUserModule, PlanModule, ServerModule, StorageNodeModule,
    SyslogModule, TenantModule, TimezoneModule,
};
use crate::runner::Module;

pub struct ModuleRegistry {
    modules: HashMap<ResourceKind, Arc<dyn Module>>,
}

impl ModuleRegistry {
    /// Registry with every built-in module
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_default_modules();
        registry
    }

    pub fn empty() -> Self {
        Self {
            modules: HashMap::new(),
        }
    }

    fn register_default_modules(&mut self) {
        // Filer modules
        self.register(Arc::new(ArrayModule));
        self.register(Arc::new(ShareModule));
        self.register(Arc::new(NtpModule));
        self.register(Arc::new(SnmpModule));
        self.register(Arc::new(StorageCaModule));
        self.register(Arc::new(DomainControllersModule));

        // Portal modules
        self.register(Arc::new(CertificateModule));
        self.register(Arc::new(CloudFolderModule));
        self.register(Arc::new(DirectoryServicesModule));
        self.register(Arc::new(AccessControlModule));
        self.register(Arc::new(FolderGroupModule));
        self.register(Arc::new(InitApplicationServerModule));
        self.register(Arc::new(InitMasterModule));
        self.register(Arc::new(InitReplicationServerModule));
        self.register(Arc::new(LocalUserModule));
        self.register(Arc::new(PlanModule));
        self.register(Arc::new(ServerModule));
        self.register(Arc::new(StorageNodeModule));
        self.register(Arc::new(SyslogModule));
        self.register(Arc::new(TenantModule));
        self.register(Arc::new(TimezoneModule));
    }

    pub fn register(&mut self, module: Arc<dyn Module>) {
        log::debug!("registering module {}", module.kind());
        self.modules.insert(module.kind(), module);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Module>> {
        let kind = ResourceKind::from_module_name(name)?;
        self.modules.get(&kind).cloned()
    }

    /// Registered module names in a stable order
    pub fn names(&self) -> Vec<&'static str> {
        ResourceKind::ALL
            .into_iter()
            .filter(|kind| self.modules.contains_key(kind))
            .map(|kind| kind.module_name())
            .collect()
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
