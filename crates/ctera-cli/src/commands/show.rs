//! Show command

use anyhow::{anyhow, Result};
use ctera_core::Parameters;
use ctera_modules::ModuleRegistry;
use serde_json::{json, Value};

pub struct ShowCommand {
    registry: ModuleRegistry,
}

impl ShowCommand {
    pub fn new() -> Self {
        Self {
            registry: ModuleRegistry::new(),
        }
    }

    /// Host kind, login requirement and generic failure message of a module
    pub fn describe(&self, module: &str) -> Result<Value> {
        let handler = self
            .registry
            .get(module)
            .ok_or_else(|| anyhow!("Unknown module: {}", module))?;
        let kind = handler.kind();
        Ok(json!({
            "module": kind.module_name(),
            "host_kind": kind.host_kind().to_string(),
            "requires_login": kind.requires_login(),
            "failure_message": handler.failure_message(&Parameters::new()),
        }))
    }

    pub fn execute(&self, module: &str) -> Result<()> {
        let description = self.describe(module)?;
        println!("{}", serde_json::to_string_pretty(&description)?);
        Ok(())
    }
}

impl Default for ShowCommand {
    fn default() -> Self {
        Self::new()
    }
}
