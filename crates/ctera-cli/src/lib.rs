//! CTERA module CLI
//!
//! Runs a single ensure module from a JSON argument file and prints the
//! outcome, the way an automation runtime would invoke it.

pub mod commands;
