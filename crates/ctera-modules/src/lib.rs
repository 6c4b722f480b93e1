//! CTERA ensure modules
//!
//! One stateless handler per managed resource. The [`runner`] composes a
//! handler with a [`ctera_client::Session`]: it validates arguments, logs in,
//! browses the tenant, runs the handler, converts errors into a failed
//! outcome and always logs out.

pub mod args;
pub mod certificate;
pub mod common;
pub mod filer;
pub mod portal;
pub mod registry;
pub mod runner;

#[cfg(test)]
mod tests;

pub use registry::ModuleRegistry;
pub use runner::{Connector, HttpConnector, Module, ModuleContext, ModuleRunner, SharedConnector};
