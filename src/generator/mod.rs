mod rust_gen;

use std::collections::{BTreeMap, BTreeSet, HashSet};

use log::{debug, info, warn};
use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};

use crate::{
    config::GeneratorConfig,
    deserializer::{Document, Tag},
    error::{GeneratorError, Result},
    naming,
    parser::{self, Entity, EntityDef},
    resolver::{self, Cycle},
    routes::{self, Route},
};

/// Everything generated for one tag: its models in dependency order and the methods of
/// its handler in (path, verb) order.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub tag: String,
    pub description: Option<String>,
    /// Module and file stem
    pub name: String,
    pub handler: String,
    pub entities: Vec<Entity>,
    pub routes: Vec<Route>,
}

impl Module {
    pub fn file_name(&self) -> String {
        format!("{}.rs", self.name)
    }

    /// Every name that ends up as an identifier in the rendered module
    fn identifiers(&self) -> Vec<&str> {
        let mut names = vec![self.handler.as_str()];
        for entity in &self.entities {
            names.push(&entity.name);
            match &entity.def {
                EntityDef::Struct(def) => {
                    names.push(&def.extension_field);
                    for field in &def.fields {
                        names.push(&field.name);
                        names.extend(field.field_type.named_types());
                    }
                }
                EntityDef::Enum(def) => names.extend(def.variants.iter().map(|v| v.name.as_str())),
                EntityDef::OneOf { variants, .. } => {
                    for variant in variants {
                        names.push(&variant.name);
                        names.extend(variant.variant_type.named_types());
                    }
                }
                EntityDef::Alias(field_type) => names.extend(field_type.named_types()),
            }
        }
        for route in &self.routes {
            names.push(&route.name);
            for argument in route.path_params.iter().chain(&route.query_params) {
                names.push(&argument.name);
                names.extend(argument.arg_type.named_types());
            }
            if let Some((body_name, body_type)) = &route.body {
                names.push(body_name);
                names.extend(body_type.named_types());
            }
            names.extend(route.return_type.named_types());
        }
        names
    }

    /// Renders the module source: header, imports, models and handler
    pub fn render(&self, config: &GeneratorConfig) -> Result<String> {
        for name in self.identifiers() {
            rust_gen::check_ident(&self.tag, name)?;
        }
        let client = config.client_ident()?;
        let result = config.result_ident()?;
        let header = rust_gen::generate_header(
            &self.tag,
            self.description.as_deref(),
            &config.crate_path()?,
            &client,
            &result,
        );

        let mut code = rust_gen::unparse(&self.tag, header)?;
        if !self.entities.is_empty() {
            let models = self.entities.iter().map(rust_gen::generate_entity);
            code.push('\n');
            code.push_str(&banner("Models"));
            code.push('\n');
            code.push_str(&rust_gen::unparse(&self.tag, quote::quote!(#(#models)*))?);
        }
        let handler =
            rust_gen::generate_handler(&self.tag, &self.handler, &client, &result, &self.routes);
        code.push('\n');
        code.push_str(&banner("Handler"));
        code.push('\n');
        code.push_str(&rust_gen::unparse(&self.tag, handler)?);
        Ok(code)
    }
}

/// Names the generated code imports or relies on from the prelude
const USED_NAMES: [&str; 14] = [
    "Value",
    "HashMap",
    "Serialize",
    "Deserialize",
    "Option",
    "Some",
    "None",
    "Ok",
    "Err",
    "String",
    "Vec",
    "Box",
    "ToString",
    "Into",
];

fn banner(title: &str) -> String {
    let rule = "=".repeat(76);
    format!("// {rule}\n// {title}\n// {rule}\n")
}

/// Builds the module for one declared tag
pub fn generate_module(
    document: &Document,
    tag: &Tag,
    config: &GeneratorConfig,
) -> Result<Module> {
    let name = naming::module_name(&tag.name, &config.tag_aliases);
    let handler = naming::handler_name(&name);
    let schemas = document.schemas();

    let mut seeds = BTreeSet::new();
    let mut operations = Vec::new();
    for (path, item) in &document.paths {
        for (method, operation) in item.operations() {
            if operation.has_tag(&tag.name) {
                seeds.extend(Route::schema_references(document, item, operation));
                operations.push((path, item, method, operation));
            }
        }
    }

    let closure = resolver::collect_closure(seeds, schemas);
    for dangling in &closure.dangling {
        warn!(
            "Tag '{}': schema '{dangling}' is referenced but not declared",
            tag.name
        );
    }

    let mut by_type_name = BTreeMap::<String, Vec<String>>::new();
    for schema_name in &closure.names {
        by_type_name
            .entry(naming::type_name(schema_name))
            .or_default()
            .push(schema_name.clone());
    }
    let used = USED_NAMES
        .iter()
        .copied()
        .chain([
            config.client_type.as_str(),
            config.result_type.as_str(),
            handler.as_str(),
        ])
        .collect::<HashSet<_>>();
    if let Some((type_name, schemas)) = by_type_name
        .into_iter()
        .find(|(type_name, s)| s.len() > 1 || used.contains(type_name.as_str()))
    {
        return Err(GeneratorError::TypeNameCollision {
            tag: tag.name.clone(),
            type_name,
            schemas,
        });
    }

    let order = resolver::order_for_emission(&closure.names, schemas).map_err(
        |Cycle(schemas)| GeneratorError::DependencyCycle {
            tag: tag.name.clone(),
            schemas,
        },
    )?;
    debug!("Tag '{}': emission order {}", tag.name, order.join(", "));
    let mut entities = order
        .iter()
        .filter_map(|schema_name| {
            schemas
                .get(schema_name)
                .map(|schema| parser::parse_entity(schema_name, schema))
        })
        .collect::<Vec<_>>();
    parser::strip_discriminator_fields(&mut entities);

    // `new` is the handler constructor
    let mut taken = HashSet::from(["new".to_string()]);
    let routes = operations
        .into_iter()
        .map(|(path, item, method, operation)| {
            let mut route = routes::parse_route(document, config, path, item, method, operation);
            let unique = naming::dedupe(&mut taken, route.name.clone(), "_");
            if unique != route.name {
                warn!(
                    "Tag '{}': method name '{}' for {method} {path} is taken, using '{unique}'",
                    tag.name, route.name
                );
                route.name = unique;
            }
            route
        })
        .collect::<Vec<_>>();

    info!(
        "Tag '{}': module {name} with {} types and {} methods",
        tag.name,
        entities.len(),
        routes.len()
    );
    Ok(Module {
        tag: tag.name.clone(),
        description: tag.description.clone(),
        handler,
        name,
        entities,
        routes,
    })
}

/// Builds one module per declared tag. Tags are processed in parallel, the result keeps
/// the declaration order.
pub fn generate_modules(document: &Document, config: &GeneratorConfig) -> Result<Vec<Module>> {
    let declared = document.tag_names().collect::<HashSet<_>>();
    let mut undeclared = BTreeSet::new();
    for (path, item) in &document.paths {
        for (method, operation) in item.operations() {
            if operation.tags.is_empty() {
                warn!("{method} {path} has no tag and is not generated");
            }
            undeclared.extend(
                operation
                    .tags
                    .iter()
                    .filter(|t| !declared.contains(t.as_str())),
            );
        }
    }
    for tag in undeclared {
        warn!("Tag '{tag}' is used by operations but not declared, skipping it");
    }

    let modules = document
        .tags
        .par_iter()
        .map(|tag| generate_module(document, tag, config))
        .collect::<Result<Vec<_>>>()?;

    let mut by_name = BTreeMap::<&str, Vec<String>>::new();
    for module in &modules {
        by_name
            .entry(module.name.as_str())
            .or_default()
            .push(module.tag.clone());
    }
    if let Some((module, tags)) = by_name.into_iter().find(|(_, tags)| tags.len() > 1) {
        return Err(GeneratorError::ModuleNameCollision {
            module: module.to_string(),
            tags,
        });
    }
    Ok(modules)
}
