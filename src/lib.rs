//! Generates Rust client code from an OpenAPI document: one module per tag, holding
//! the models the tag's operations use and a handler with one async method per operation.

use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};

pub mod config;
pub mod deserializer;
pub mod error;
mod generator;
pub mod naming;
pub mod output;
pub mod parser;
pub mod resolver;
pub mod routes;

pub use config::GeneratorConfig;
pub use deserializer::Document;
pub use error::{GeneratorError, Result};
pub use generator::{generate_module, generate_modules, Module};
pub use output::{write_modules, GeneratedFile};

/// Generates and renders the module of every declared tag
pub fn generate_rust(document: &Document, config: &GeneratorConfig) -> Result<Vec<GeneratedFile>> {
    config.validate()?;
    let modules = generate_modules(document, config)?;
    modules
        .par_iter()
        .map(|module| {
            Ok(GeneratedFile {
                file_name: module.file_name(),
                content: module.render(config)?,
            })
        })
        .collect()
}
