//! CTERA ensure modules core
//!
//! Parameter handling, the attribute differ that drives idempotence,
//! per-resource capability declarations and result reporting.

pub mod capability;
pub mod diff;
pub mod error;
pub mod outcome;
pub mod params;

pub use capability::{Capabilities, ResourceKind};
pub use diff::{list_difference, lists_differ, modified_attributes, values_equal};
pub use error::{ArgumentError, ClientError, CteraError};
pub use outcome::{ReturnValue, Status};
pub use params::Parameters;

/// Result type for module operations
pub type Result<T> = std::result::Result<T, CteraError>;
