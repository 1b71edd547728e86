//! Command line definition

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::OutputFormat;

/// Administer custom field definitions and check submissions against them
#[derive(Debug, Parser)]
#[command(name = "customfields", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (toml, yaml or json); defaults to ./customfields.*
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the field definitions
    #[arg(long, global = true)]
    pub fields_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "debug")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the modules that can host custom fields
    Modules,

    /// List a module's definitions in display order
    List {
        module: String,
        /// Include inactive definitions
        #[arg(long)]
        all: bool,
    },

    /// Show one definition
    Get { id: String },

    /// Create a definition from a JSON or YAML file ("-" for stdin)
    Create { file: PathBuf },

    /// Apply a partial update from a JSON or YAML file ("-" for stdin)
    Update { id: String, file: PathBuf },

    /// Permanently delete a definition
    Delete { id: String },

    /// Set display order to the given id order
    Reorder {
        module: String,
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
    },

    /// Split a submission and validate its custom part
    Validate {
        module: String,
        file: PathBuf,
        /// Names of the module's fixed columns
        #[arg(long, value_delimiter = ',')]
        fixed: Vec<String>,
    },

    /// Flatten a stored entity row (fixed columns plus metadata)
    Merge { module: String, file: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_fixed_column_list() {
        let cli = Cli::parse_from([
            "customfields",
            "validate",
            "Student",
            "form.json",
            "--fixed",
            "first_name,last_name",
        ]);
        match cli.command {
            Commands::Validate { module, fixed, .. } => {
                assert_eq!(module, "Student");
                assert_eq!(fixed, ["first_name", "last_name"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn reorder_needs_ids() {
        assert!(Cli::try_parse_from(["customfields", "reorder", "Student"]).is_err());
    }
}
