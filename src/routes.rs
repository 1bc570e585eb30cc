//! Handler method model: one [`Route`] per (path, verb) operation.

use std::collections::{BTreeSet, HashSet};

use log::warn;

use crate::{
    config::GeneratorConfig,
    deserializer::{
        Document, Method, Operation, Parameter, ParameterLocation, PathItem, Schema, JSON_CONTENT,
    },
    naming,
    parser::{map_type, FieldType, Primitive},
    resolver::field_references,
};

/// A method argument built from a path or query parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: String,
    pub wire_name: String,
    pub arg_type: FieldType,
}

/// The path formatted for `format!`: placeholders become `{}` in order of appearance
#[derive(Debug, Clone, PartialEq)]
pub struct PathTemplate {
    pub format: String,
    /// Argument names filling the `{}` slots
    pub args: Vec<String>,
}

/// How the client is called
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallShape {
    /// `get(url)` or `delete(url)`
    Plain,
    /// `post/put/patch(url, request)`
    WithBody,
    /// `post/put/patch(url, &json!({}))`
    EmptyBody,
    /// `delete_raw(url)` decoded into the return type
    DecodeRaw,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub name: String,
    pub method: Method,
    pub path: String,
    pub docs: Vec<String>,
    pub path_params: Vec<Argument>,
    pub query_params: Vec<Argument>,
    /// Name and type of the JSON body argument, passed by reference
    pub body: Option<(String, FieldType)>,
    pub return_type: FieldType,
    pub template: PathTemplate,
    pub call: CallShape,
    /// DELETE with a declared body: the body is accepted but cannot be sent
    pub unsupported_body: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

/// Splits `/v1/widgets/{id}` into literals and placeholders. An unclosed `{` is literal.
fn split_path(path: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        if start > 0 {
            segments.push(Segment::Literal(&rest[..start]));
        }
        segments.push(Segment::Placeholder(&rest[start + 1..start + len]));
        rest = &rest[start + len + 1..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Literal(rest));
    }
    segments
}

pub(crate) fn escape_format(literal: &str) -> String {
    literal.replace('{', "{{").replace('}', "}}")
}

/// Builds the format string for `path`. Placeholders without a matching path parameter
/// are kept literally.
pub fn path_template(path: &str, path_params: &[Argument]) -> PathTemplate {
    let mut format = String::new();
    let mut args = Vec::new();
    for segment in split_path(path) {
        match segment {
            Segment::Literal(literal) => format.push_str(&escape_format(literal)),
            Segment::Placeholder(name) => {
                match path_params.iter().find(|p| p.wire_name == name) {
                    Some(param) => {
                        format.push_str("{}");
                        args.push(param.name.clone());
                    }
                    None => {
                        warn!("No path parameter declared for '{{{name}}}' in {path}");
                        format.push_str(&escape_format(&format!("{{{name}}}")));
                    }
                }
            }
        }
    }
    PathTemplate { format, args }
}

/// A type whose values format into a URL. Named string enums become `String`, named
/// primitives their primitive, other named or free-form types `Value`, and array items
/// follow the same rules.
fn url_type(document: &Document, schema: &Schema, in_array: bool) -> FieldType {
    if let Some(name) = schema.ref_name() {
        return match document.schemas().get(name) {
            Some(target) if target.string_enum_values().is_some() => {
                FieldType::Simple(Primitive::String)
            }
            Some(target) if target.reference.is_none() => match map_type(target, true) {
                simple @ FieldType::Simple(_) => url_type_of(simple),
                _ => FieldType::Dynamic,
            },
            _ => FieldType::Dynamic,
        };
    }
    match (map_type(schema, true), &schema.items) {
        (FieldType::Array(_), Some(items)) if !in_array => url_type(document, items, true).array(),
        (FieldType::Array(_), _) => FieldType::Dynamic,
        (other, _) => url_type_of(other),
    }
}

fn url_type_of(field_type: FieldType) -> FieldType {
    match field_type {
        FieldType::Simple(Primitive::Bytes) => FieldType::Simple(Primitive::String),
        FieldType::Map => FieldType::Dynamic,
        other => other,
    }
}

/// Arguments are formatted into the URL, see [`url_type`]. Arrays are joined with commas.
fn argument_type(document: &Document, schema: &Schema, required: bool) -> FieldType {
    let arg_type = url_type(document, schema, false);
    if required {
        arg_type
    } else {
        arg_type.optional()
    }
}

fn docs_for(operation: &Operation, method: Method, path: &str) -> Vec<String> {
    let mut docs = Vec::new();
    if let Some(summary) = &operation.summary {
        docs.extend(summary.lines().map(str::to_string));
    }
    if let Some(description) = &operation.description {
        if operation.summary.as_deref().map(str::trim) != Some(description.trim()) {
            docs.extend(description.trim_end().lines().map(str::to_string));
        }
    }
    if !docs.is_empty() {
        docs.push(String::new());
    }
    docs.push(format!("{method} {path}"));
    docs
}

/// Builds the handler method for one operation
pub fn parse_route(
    document: &Document,
    config: &GeneratorConfig,
    path: &str,
    item: &PathItem,
    method: Method,
    operation: &Operation,
) -> Route {
    let name = match &operation.operation_id {
        Some(id) => naming::normalize_method_name(id, method),
        None => naming::fallback_method_name(method, path),
    };
    // locals of the generated method body
    let mut taken: HashSet<String> = ["query", "query_string", "response"]
        .map(String::from)
        .into();
    let mut argument = |param: &Parameter, required: bool| Argument {
        name: naming::dedupe(&mut taken, naming::normalize_field_name(&param.name), "_"),
        wire_name: param.name.clone(),
        arg_type: argument_type(document, &param.schema, required),
    };
    let parameters = document.parameters_for(item, operation);
    let path_params = parameters
        .iter()
        .filter(|p| p.location == ParameterLocation::Path)
        .map(|p| argument(p, true))
        .collect::<Vec<_>>();
    let query_params = parameters
        .iter()
        .filter(|p| p.location == ParameterLocation::Query)
        .map(|p| argument(p, p.required))
        .collect::<Vec<_>>();

    let body = operation.request_body.as_ref().and_then(|body| {
        let schema = body.json_schema();
        if schema.is_none() {
            warn!("{method} {path}: request body has no {JSON_CONTENT} content, ignoring it");
        }
        schema.map(|s| {
            let arg_name = naming::dedupe(&mut taken, "request".to_string(), "_");
            (arg_name, map_type(s, true))
        })
    });

    let return_type = config
        .success_statuses()
        .find_map(|status| operation.response(status))
        .and_then(|response| response.json_schema())
        .map_or(FieldType::Unit, |s| map_type(s, true));

    let unsupported_body = method == Method::Delete && operation.request_body.is_some();
    if unsupported_body {
        warn!("{method} {path}: the client cannot send a DELETE body, it will be dropped");
    }
    let call = match method {
        Method::Get => CallShape::Plain,
        Method::Delete if return_type == FieldType::Unit => CallShape::Plain,
        Method::Delete => CallShape::DecodeRaw,
        Method::Post | Method::Put | Method::Patch if body.is_some() => CallShape::WithBody,
        Method::Post | Method::Put | Method::Patch => CallShape::EmptyBody,
    };

    let mut docs = docs_for(operation, method, path);
    if unsupported_body {
        docs.push(String::new());
        docs.push(
            "NOTE: the request body is not sent, the client has no DELETE-with-body call"
                .to_string(),
        );
    }

    Route {
        name,
        method,
        path: path.to_string(),
        docs,
        template: path_template(path, &path_params),
        path_params,
        query_params,
        body,
        return_type,
        call,
        unsupported_body,
    }
}

impl Route {
    /// Schema names referenced by the operation's parameters, body and responses
    pub fn schema_references(
        document: &Document,
        item: &PathItem,
        operation: &Operation,
    ) -> BTreeSet<String> {
        let mut refs = BTreeSet::new();
        for param in document.parameters_for(item, operation) {
            field_references(&param.schema, &mut refs);
        }
        if let Some(schema) = operation.request_body.as_ref().and_then(|b| b.json_schema()) {
            field_references(schema, &mut refs);
        }
        for response in operation.responses.values() {
            if let Some(schema) = response.json_schema() {
                field_references(schema, &mut refs);
            }
        }
        refs
    }

    /// Whether the URL needs `format!` rather than a literal
    pub fn needs_format(&self) -> bool {
        !self.template.args.is_empty() || !self.query_params.is_empty()
    }
}
