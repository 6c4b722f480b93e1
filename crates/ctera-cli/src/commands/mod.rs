//! CLI commands

pub mod list;
pub mod run;
pub mod show;

pub use list::ListCommand;
pub use run::RunCommand;
pub use show::ShowCommand;
