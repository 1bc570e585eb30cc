//! Identifier normalization: word-delimited (`snake_case`) and capitalized-compound
//! (`PascalCase`) conversions, keyword escaping and operation-id cleanup.

use std::collections::{BTreeMap, HashSet};

use lazy_static::lazy_static;

use crate::deserializer::Method;

lazy_static! {
    static ref RESERVED: HashSet<&'static str> = [
        "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
        "extern", "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod",
        "move", "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super",
        "trait", "true", "type", "unsafe", "use", "where", "while", "abstract", "become", "box",
        "do", "final", "macro", "override", "priv", "try", "typeof", "unsized", "virtual",
        "yield",
    ]
    .into_iter()
    .collect();
    /// Keywords that `r#` cannot escape
    static ref NOT_RAW: [&'static str; 5] = ["self", "Self", "super", "crate", "_"];
}

pub fn is_reserved(name: &str) -> bool {
    RESERVED.contains(name)
}

/// Escapes a keyword with `r#`, or with a trailing `_` where a raw identifier is not allowed
pub fn escape_reserved(name: String) -> String {
    if NOT_RAW.contains(&name.as_str()) {
        format!("{name}_")
    } else if is_reserved(&name) {
        format!("r#{name}")
    } else {
        name
    }
}

/// `createdAt` -> `created_at`, `HTTPServer` -> `http_server`.
/// Anything but an ASCII letter or digit acts as a word boundary.
pub fn to_word_delimited(name: &str) -> String {
    let chars = name.chars().collect::<Vec<_>>();
    let mut out = String::with_capacity(name.len() + 4);
    let boundary = |out: &mut String| {
        if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    };
    for (i, &c) in chars.iter().enumerate() {
        if !c.is_ascii_alphanumeric() {
            boundary(&mut out);
            continue;
        }
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(char::is_ascii_lowercase);
            if prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_is_lower)
            {
                boundary(&mut out);
            }
        }
        out.extend(c.to_lowercase());
    }
    out.trim_end_matches('_').to_string()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// `created_at` -> `CreatedAt`
pub fn to_capitalized_compound(name: &str) -> String {
    name.split('_').map(capitalize).collect()
}

/// Rust field identifier for a wire property name
pub fn normalize_field_name(wire_name: &str) -> String {
    let name = to_word_delimited(wire_name);
    let name = if name.is_empty() {
        "field".to_string()
    } else if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{name}")
    } else {
        name
    };
    escape_reserved(name)
}

/// Strips one leading verb (`get`, `post`, ...) when it forms a whole word
fn strip_verb_prefix(operation_id: &str) -> &str {
    for verb in ["get", "post", "put", "delete", "patch"] {
        let Some(head) = operation_id.get(..verb.len()) else {
            continue;
        };
        if !head.eq_ignore_ascii_case(verb) {
            continue;
        }
        let rest = &operation_id[verb.len()..];
        let at_boundary = rest
            .chars()
            .next()
            .map_or(true, |c| c.is_uppercase() || !c.is_alphanumeric() || c.is_ascii_digit());
        if at_boundary {
            return rest;
        }
    }
    operation_id
}

/// Handler method name for an operation.
///
/// `getWidget` -> `get_widget`, `getWidgets` on `GET /widgets` stays `get_widgets`,
/// `listWidgets` -> `list_widgets`, `deleteWidget` -> `delete_widget`,
/// `postCreateWidget` -> `create_widget`. Not guaranteed unique.
pub fn normalize_method_name(operation_id: &str, method: Method) -> String {
    let name = to_word_delimited(strip_verb_prefix(operation_id));
    let name = match method {
        Method::Get if name.is_empty() => "get".to_string(),
        Method::Get if !(name.starts_with("list") || name.starts_with("get")) => {
            format!("get_{name}")
        }
        Method::Post
            if !name.starts_with("create")
                && operation_id.to_lowercase().contains("create") =>
        {
            if name.is_empty() {
                "create".to_string()
            } else {
                format!("create_{name}")
            }
        }
        Method::Delete if name.is_empty() => "delete".to_string(),
        Method::Delete if !name.starts_with("delete") => format!("delete_{name}"),
        _ if name.is_empty() => method.as_str().to_string(),
        _ => name,
    };
    let name = if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{name}")
    } else {
        name
    };
    escape_reserved(name)
}

/// Method name for an operation that has no operation id: `get /v1/items` -> `get_v1_items`
pub fn fallback_method_name(method: Method, path: &str) -> String {
    escape_reserved(to_word_delimited(&format!("{}_{}", method.as_str(), path)))
}

/// Rust type name for a schema name. Names are capitalized when they start lowercase,
/// the rest of the name is kept as written.
pub fn type_name(schema_name: &str) -> String {
    let cleaned = schema_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect::<String>();
    let mut chars = cleaned.chars();
    let name = match chars.next() {
        _ if !cleaned.chars().any(|c| c.is_ascii_alphanumeric()) => "Anonymous".to_string(),
        Some(first) if first.is_ascii_digit() => format!("V{cleaned}"),
        Some(first) if first.is_ascii_lowercase() => {
            first.to_ascii_uppercase().to_string() + chars.as_str()
        }
        _ => cleaned,
    };
    escape_reserved(name)
}

/// Enum variant name for a literal: `in-progress` -> `InProgress`, `v1.2` -> `V12`
pub fn variant_name(value: &str) -> String {
    let words = value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>();
    let name = to_capitalized_compound(&words);
    if name.is_empty() {
        "Empty".to_string()
    } else if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("V{name}")
    } else {
        escape_reserved(name)
    }
}

/// Output module (and file stem) for a tag; a configured alias wins
pub fn module_name(tag: &str, aliases: &BTreeMap<String, String>) -> String {
    if let Some(alias) = aliases.get(tag) {
        return alias.clone();
    }
    let name = to_word_delimited(tag);
    if name.is_empty() {
        "default".to_string()
    } else if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{name}")
    } else if is_reserved(&name) {
        format!("{name}_")
    } else {
        name
    }
}

/// Appends a counter to `name` until it is not in `taken`, then records it
pub fn dedupe(taken: &mut HashSet<String>, name: String, separator: &str) -> String {
    let mut candidate = name.clone();
    let mut counter = 2;
    while taken.contains(&candidate) {
        candidate = format!("{name}{separator}{counter}");
        counter += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

/// `cloud_accounts` -> `CloudAccountsHandler`, `_2_fa` -> `V2FaHandler`
pub fn handler_name(module_name: &str) -> String {
    let name = to_capitalized_compound(&to_word_delimited(module_name));
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("V{name}Handler")
    } else {
        format!("{name}Handler")
    }
}
