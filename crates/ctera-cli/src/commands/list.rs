//! List command

use ctera_modules::ModuleRegistry;

pub struct ListCommand {
    registry: ModuleRegistry,
}

impl ListCommand {
    pub fn new() -> Self {
        Self {
            registry: ModuleRegistry::new(),
        }
    }

    pub fn module_names(&self) -> Vec<&'static str> {
        self.registry.names()
    }

    pub fn execute(&self) {
        for name in self.module_names() {
            println!("{}", name);
        }
    }
}

impl Default for ListCommand {
    fn default() -> Self {
        Self::new()
    }
}
