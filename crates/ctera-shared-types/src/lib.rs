pub mod connection;
pub mod error;
pub mod state;

pub use connection::{ConnectionArgs, HostKind, TenantScope, GLOBAL_ADMIN_TENANT};
pub use error::{SharedResult, SharedTypeError};
pub use state::{ConnectState, PresentState, ToggleState};
