//! Error types for the generator.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop a generation run.
///
/// Degraded input (unknown type/format pairs, dangling references, DELETE
/// bodies) never ends up here; those are logged and generation continues.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The input document could not be read
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input document is not valid JSON/YAML of the expected shape
    #[error("Failed to parse '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    /// The generator configuration is invalid
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Schemas reference each other so no emission order exists
    #[error("Dependency cycle in tag '{tag}' between schemas: {}", schemas.join(", "))]
    DependencyCycle { tag: String, schemas: Vec<String> },

    /// Distinct schemas normalize to the same Rust type name, or a schema's type name
    /// is already used by the module
    #[error(
        "Type name collision in tag '{tag}': schemas {} map to '{type_name}'",
        schemas.join(", ")
    )]
    TypeNameCollision {
        tag: String,
        type_name: String,
        schemas: Vec<String>,
    },

    /// Two tags would be written to the same module file
    #[error("Tags {} all map to module '{module}'", tags.join(", "))]
    ModuleNameCollision { module: String, tags: Vec<String> },

    /// The generated tokens do not form a valid Rust file
    #[error("Generated code for tag '{tag}' is invalid: {message}")]
    InvalidCode { tag: String, message: String },

    /// Failed to write an output file
    #[error("Failed to write output file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, GeneratorError>;
