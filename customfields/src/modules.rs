//! Entity types that may host dynamic fields.
//!
//! The list is compiled in. Definitions still carry their module as a plain
//! string so stored rows for a module that is later dropped remain readable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Module {
    Student,
    Application,
    University,
    Program,
    Campus,
    Agent,
    Document,
    Task,
}

const AVAILABLE: [Module; 8] = [
    Module::Student,
    Module::Application,
    Module::University,
    Module::Program,
    Module::Campus,
    Module::Agent,
    Module::Document,
    Module::Task,
];

/// Every module eligible to host dynamic fields, in display order.
pub fn available_modules() -> &'static [Module] {
    &AVAILABLE
}

/// True if `name` is one of [`available_modules`].
pub fn is_available_module(name: &str) -> bool {
    name.parse::<Module>().is_ok()
}

impl Module {
    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Student => "Student",
            Module::Application => "Application",
            Module::University => "University",
            Module::Program => "Program",
            Module::Campus => "Campus",
            Module::Agent => "Agent",
            Module::Document => "Document",
            Module::Task => "Task",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Module {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AVAILABLE
            .iter()
            .find(|m| m.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown module: {s}"))
    }
}
