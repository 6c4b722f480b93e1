//! Edge filer (gateway) modules

pub mod array;
pub mod domain_controllers;
pub mod ntp;
pub mod share;
pub mod snmp;
pub mod storage_ca;

pub use array::ArrayModule;
pub use domain_controllers::DomainControllersModule;
pub use ntp::NtpModule;
pub use share::ShareModule;
pub use snmp::SnmpModule;
pub use storage_ca::StorageCaModule;
