//! Command handlers

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use customfields::{
    available_modules, is_available_module, merge, separate, validate, FieldDefinitionPatch,
    FieldRegistry, NewFieldDefinition, SeparatedData, YamlStore,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use ulid::Ulid;

use crate::cli::Commands;
use crate::config::{OutputFormat, Settings};
use crate::exit_codes::{EXIT_INVALID, EXIT_SUCCESS};

/// Run one command and return the process exit code.
pub async fn run(command: Commands, settings: &Settings) -> Result<i32> {
    match command {
        Commands::Modules => {
            emit(&module_names(), settings.output)?;
            Ok(EXIT_SUCCESS)
        }
        command => {
            let store = YamlStore::open(settings.fields_dir.clone())
                .await
                .with_context(|| format!("failed to open {}", settings.fields_dir.display()))?;
            run_with_registry(command, &FieldRegistry::new(store), settings.output).await
        }
    }
}

fn module_names() -> Vec<&'static str> {
    available_modules().iter().map(|m| m.as_str()).collect()
}

async fn run_with_registry(
    command: Commands,
    registry: &FieldRegistry<YamlStore>,
    output: OutputFormat,
) -> Result<i32> {
    match command {
        Commands::Modules => emit(&module_names(), output)?,
        Commands::List { module, all } => {
            let defs = if all {
                registry.list_all_definitions(&module).await?
            } else {
                registry.list_definitions(&module).await?
            };
            emit(&defs, output)?;
        }
        Commands::Get { id } => {
            let def = registry.get_definition(&parse_id(&id)?).await?;
            emit(&def, output)?;
        }
        Commands::Create { file } => {
            let data: NewFieldDefinition = read_document(&file)?;
            if !is_available_module(&data.module) {
                bail!(
                    "unknown module '{}'; available: {}",
                    data.module,
                    module_names().join(", ")
                );
            }
            let def = registry.create_definition(data).await?;
            emit(&def, output)?;
        }
        Commands::Update { id, file } => {
            let patch: FieldDefinitionPatch = read_document(&file)?;
            let def = registry.update_definition(&parse_id(&id)?, patch).await?;
            emit(&def, output)?;
        }
        Commands::Delete { id } => {
            let id = parse_id(&id)?;
            registry.delete_definition(&id).await?;
            info!(%id, "deleted");
            emit(&json!({ "deleted": id.to_string() }), output)?;
        }
        Commands::Reorder { module, ids } => {
            let ids = ids
                .iter()
                .map(|id| parse_id(id))
                .collect::<Result<Vec<_>>>()?;
            registry.reorder_definitions(&module, &ids).await?;
            let defs = registry.list_all_definitions(&module).await?;
            emit(&defs, output)?;
        }
        Commands::Validate {
            module,
            file,
            fixed: fixed_columns,
        } => {
            let submission: Map<String, Value> = read_document(&file)?;
            let defs = registry.list_definitions(&module).await?;
            let SeparatedData { fixed, metadata } = separate(&submission, &fixed_columns);
            let result = validate(&metadata, &defs);
            debug!(%module, valid = result.valid, errors = result.errors.len(), "validated");

            emit(
                &json!({
                    "valid": result.valid,
                    "errors": result.errors,
                    "fixed": fixed,
                    "metadata": metadata,
                }),
                output,
            )?;
            if !result.valid {
                return Ok(EXIT_INVALID);
            }
        }
        Commands::Merge { module, file } => {
            let row: Map<String, Value> = read_document(&file)?;
            let defs = registry.list_definitions(&module).await?;
            emit(&merge(&row, &defs), output)?;
        }
    }
    Ok(EXIT_SUCCESS)
}

fn parse_id(id: &str) -> Result<Ulid> {
    Ulid::from_string(id).with_context(|| format!("invalid id '{id}'"))
}

/// Read a JSON or YAML document from a file, or stdin when the path is `-`.
fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
    };

    match serde_json::from_str(&text) {
        Ok(value) => Ok(value),
        Err(_) => serde_yaml_ng::from_str(&text)
            .with_context(|| format!("failed to parse {}", path.display())),
    }
}

fn emit<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<()> {
    let text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml_ng::to_string(value)?,
    };
    println!("{}", text.trim_end());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn documents_parse_as_json_or_yaml() {
        let temp = TempDir::new().unwrap();
        let json_path = temp.path().join("def.json");
        fs::write(
            &json_path,
            r#"{"module":"Student","api_name":"gpa","label":"GPA","type":{"kind":"number"}}"#,
        )
        .unwrap();
        let yaml_path = temp.path().join("def.yaml");
        fs::write(
            &yaml_path,
            "module: Student\napi_name: gpa\nlabel: GPA\ntype:\n  kind: number\n",
        )
        .unwrap();

        let a: NewFieldDefinition = read_document(&json_path).unwrap();
        let b: NewFieldDefinition = read_document(&yaml_path).unwrap();
        assert_eq!(a.api_name, b.api_name);
        assert_eq!(a.field_type, b.field_type);
    }

    #[test]
    fn bad_ids_are_reported() {
        let err = parse_id("not-a-ulid").unwrap_err();
        assert!(err.to_string().contains("not-a-ulid"));
    }
}
