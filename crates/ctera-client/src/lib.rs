//! CTERA client
//!
//! Transport abstraction over the CTERA object API, an HTTP implementation,
//! an in-memory implementation for tests (feature `testing`), and the
//! session that modules run in.

pub mod config;
pub mod fetch;
pub mod http;
#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod session;
pub mod transport;


pub use config::{ClientConfig, ConfigError};
pub use fetch::{last_segment, public_fields, segment};
pub use http::HttpTransport;
#[cfg(any(test, feature = "testing"))]
pub use memory::{Call, MemoryTransport, Method};
pub use session::Session;
pub use transport::Transport;

/// Result type for transport operations
pub type ClientResult<T> = std::result::Result<T, ctera_core::ClientError>;
