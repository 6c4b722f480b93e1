//! Run command

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use ctera_client::ClientConfig;
use ctera_core::ReturnValue;
use ctera_modules::{ModuleRegistry, ModuleRunner};
use serde_json::{Map, Value};

pub struct RunCommand {
    registry: ModuleRegistry,
    runner: ModuleRunner,
}

impl RunCommand {
    /// Run modules over HTTP with `config` supplying connection defaults.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_runner(ModuleRunner::http(config))
    }

    pub fn with_runner(runner: ModuleRunner) -> Self {
        Self {
            registry: ModuleRegistry::new(),
            runner,
        }
    }

    /// Run `module` with the arguments in `args_file`.
    ///
    /// Only unknown modules and unreadable argument files are errors; module
    /// failures come back as a failed [`ReturnValue`].
    pub async fn execute(&self, module: &str, args_file: &Path) -> Result<ReturnValue> {
        let handler = self
            .registry
            .get(module)
            .ok_or_else(|| anyhow!("Unknown module: {}", module))?;
        let args = read_arguments(args_file)?;
        log::debug!("running {} with arguments from {}", module, args_file.display());
        Ok(self.runner.run(handler.as_ref(), args).await)
    }
}

fn read_arguments(path: &Path) -> Result<Map<String, Value>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read arguments from {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;
    match value {
        Value::Object(args) => Ok(args),
        _ => Err(anyhow!("{} must contain a JSON object", path.display())),
    }
}
