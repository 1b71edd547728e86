//! Admin-defined custom fields for fixed business entities
//!
//! `customfields` lets operators extend entity types such as `Student` or
//! `Application` with extra fields at runtime, and validates submitted values
//! against those definitions before they are persisted.
//!
//! # Architecture
//!
//! - **Registry**: [`FieldRegistry`] lists, creates, updates, hard-deletes and
//!   reorders [`FieldDefinition`]s through a [`DefinitionStore`]
//! - **Stores**: [`MemoryStore`] in process, [`YamlStore`] as one YAML file per
//!   definition on disk
//! - **Validation**: [`validate`] is a pure function yielding zero or one
//!   message per field
//! - **Separation**: [`separate`] / [`merge`] move values between fixed
//!   columns and the JSON `metadata` bag by name alone
//! - **Form binding**: [`form`] holds the contract a UI implements
//!
//! ```rust,no_run
//! use customfields::{FieldRegistry, FieldType, NewFieldDefinition, YamlStore, validate};
//!
//! # async fn example() -> customfields::Result<()> {
//! let registry = FieldRegistry::new(YamlStore::open(".customfields/fields").await?);
//! registry
//!     .create_definition(
//!         NewFieldDefinition::new("Student", "passport_no", "Passport number", FieldType::Text)
//!             .required(true),
//!     )
//!     .await?;
//!
//! let defs = registry.list_definitions("Student").await?;
//! let submitted = serde_json::json!({ "passport_no": "" });
//! let result = validate(submitted.as_object().unwrap(), &defs);
//! assert!(!result.valid);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod form;
pub mod modules;
pub mod registry;
pub mod separator;
pub mod store;
pub mod types;
pub mod validation;

pub use error::{FieldsError, Result};
pub use form::{
    apply_change, field_views, render_form, Editor, FieldView, FormChange, FormRenderer,
    MultiSelectState,
};
pub use modules::{available_modules, is_available_module, Module};
pub use registry::FieldRegistry;
pub use separator::{merge, separate, SeparatedData, METADATA_COLUMN};
pub use store::{DefinitionStore, MemoryStore, YamlStore};
pub use types::{
    FieldDefinition, FieldDefinitionPatch, FieldType, NewFieldDefinition, RegexRule,
    ValidationRules,
};
pub use validation::{validate, ValidationResult};
