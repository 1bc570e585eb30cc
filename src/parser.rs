use std::{
    collections::{BTreeMap, HashSet},
    fmt,
};

use crate::{
    deserializer::{ref_name, Format, Schema, SchemaKind, SchemaType},
    naming,
};

/// A Rust type expression for a field, parameter or return value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// A type declared elsewhere in the module, e.g. `Widget`.
    /// Named types that have no declaration are dangling references.
    Named(String),
    /// `Vec<T>`
    Array(Box<FieldType>),
    /// A free-form object: `HashMap<String, Value>`
    Map,
    /// A primitive of the target language
    Simple(Primitive),
    /// `Option<T>` for anything not required
    Optional(Box<FieldType>),
    /// `Box<T>`, used for direct self-references
    Boxed(Box<FieldType>),
    /// `serde_json::Value`, the fallback for any shape that is not understood
    Dynamic,
    /// `()`, the return type of operations without a JSON response
    Unit,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Primitive {
    Int,
    Long,
    Float,
    Double,
    String,
    Bool,
    Bytes,
}

impl FieldType {
    pub fn array(self) -> FieldType {
        FieldType::Array(Box::new(self))
    }

    pub fn optional(self) -> FieldType {
        FieldType::Optional(Box::new(self))
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, FieldType::Optional(_))
    }

    /// The type without its `Option` wrapper
    pub fn required(&self) -> &FieldType {
        match self {
            FieldType::Optional(inner) => inner,
            other => other,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self.required(), FieldType::Array(_))
    }

    /// Names of all declared types this expression mentions
    pub fn named_types(&self) -> Vec<&str> {
        match self {
            FieldType::Named(name) => vec![name.as_str()],
            FieldType::Array(inner) | FieldType::Optional(inner) | FieldType::Boxed(inner) => {
                inner.named_types()
            }
            _ => vec![],
        }
    }

    /// Boxes `self_name` where it appears directly (not behind a `Vec`)
    fn box_self_reference(self, self_name: &str) -> FieldType {
        match self {
            FieldType::Named(name) if name == self_name => {
                FieldType::Boxed(Box::new(FieldType::Named(name)))
            }
            FieldType::Optional(inner) => inner.box_self_reference(self_name).optional(),
            other => other,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Named(name) => f.write_str(name),
            FieldType::Array(inner) => write!(f, "Vec<{inner}>"),
            FieldType::Map => f.write_str("HashMap<String, Value>"),
            FieldType::Simple(primitive) => f.write_str(match primitive {
                Primitive::Int => "i32",
                Primitive::Long => "i64",
                Primitive::Float => "f32",
                Primitive::Double => "f64",
                Primitive::String => "String",
                Primitive::Bool => "bool",
                Primitive::Bytes => "Vec<u8>",
            }),
            FieldType::Optional(inner) => write!(f, "Option<{inner}>"),
            FieldType::Boxed(inner) => write!(f, "Box<{inner}>"),
            FieldType::Dynamic => f.write_str("Value"),
            FieldType::Unit => f.write_str("()"),
        }
    }
}

/// Maps a schema node to a type expression. Never fails: shapes that are not
/// understood become `Value`.
pub fn map_type(schema: &Schema, required: bool) -> FieldType {
    let field_type = map_required_type(schema);
    if required {
        field_type
    } else {
        field_type.optional()
    }
}

fn map_required_type(schema: &Schema) -> FieldType {
    if schema.is_empty() {
        return FieldType::Dynamic;
    }
    if let Some(name) = schema.ref_name() {
        return FieldType::Named(naming::type_name(name));
    }
    // inline enums degrade to strings, only named enums get their own type
    if schema.string_enum_values().is_some() {
        return FieldType::Simple(Primitive::String);
    }
    let schema_type = schema.primary_type();
    if schema_type == SchemaType::Array {
        return match &schema.items {
            Some(items) => FieldType::Array(Box::new(map_type(items, true))),
            None => FieldType::Dynamic,
        };
    }
    match (schema_type, schema.format) {
        (SchemaType::String, None | Some(Format::Date | Format::DateTime | Format::Uuid)) => {
            FieldType::Simple(Primitive::String)
        }
        (SchemaType::String, Some(Format::Binary)) => FieldType::Simple(Primitive::Bytes),
        (SchemaType::Integer, None | Some(Format::Int32)) => FieldType::Simple(Primitive::Int),
        (SchemaType::Integer, Some(Format::Int64)) => FieldType::Simple(Primitive::Long),
        (SchemaType::Number, None | Some(Format::Double)) => FieldType::Simple(Primitive::Double),
        (SchemaType::Number, Some(Format::Float)) => FieldType::Simple(Primitive::Float),
        (SchemaType::Boolean, None) => FieldType::Simple(Primitive::Bool),
        (SchemaType::Object, None) => FieldType::Map,
        _ => FieldType::Dynamic,
    }
}

/// A field in a generated struct
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// The Rust identifier, possibly `r#` escaped
    pub name: String,
    /// The property name in the document
    pub wire_name: String,
    pub field_type: FieldType,
    pub optional: bool,
    /// `#[serde(rename = "...")]` value when the identifier does not serialize to the wire name
    pub rename: Option<String>,
    /// `#[serde(flatten)]`, used for `allOf` members
    pub flatten: bool,
    pub description: Option<String>,
}

/// The definition for a struct
#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    /// `#[serde(rename_all = "camelCase")]` on the whole struct
    pub camel_case: bool,
    pub fields: Vec<Field>,
    /// Name of the flattened catch-all for undeclared properties
    pub extension_field: String,
}

/// Blanket `rename_all` conventions for enums
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CaseConvention {
    Kebab,
    Upper,
    Lower,
}

impl CaseConvention {
    pub fn serde_name(&self) -> &'static str {
        match self {
            CaseConvention::Kebab => "kebab-case",
            CaseConvention::Upper => "UPPERCASE",
            CaseConvention::Lower => "lowercase",
        }
    }

    /// What serde serializes `variant` as under this convention
    pub fn apply_to_variant(&self, variant: &str) -> String {
        match self {
            CaseConvention::Upper => variant.to_ascii_uppercase(),
            CaseConvention::Lower => variant.to_ascii_lowercase(),
            CaseConvention::Kebab => {
                let mut out = String::new();
                for (i, ch) in variant.char_indices() {
                    if i > 0 && ch.is_uppercase() {
                        out.push('-');
                    }
                    out.push(ch.to_ascii_lowercase());
                }
                out
            }
        }
    }

    /// Picks a convention from the literal values: any hyphen -> kebab, all upper -> upper,
    /// all lower -> lower, anything else -> none (every variant renamed)
    pub fn detect(values: &[&str]) -> Option<CaseConvention> {
        let has_cased = |v: &str| v.chars().any(char::is_alphabetic);
        if values.iter().any(|v| v.contains('-')) {
            Some(CaseConvention::Kebab)
        } else if values
            .iter()
            .all(|v| has_cased(v) && !v.chars().any(char::is_lowercase))
        {
            Some(CaseConvention::Upper)
        } else if values
            .iter()
            .all(|v| has_cased(v) && !v.chars().any(char::is_uppercase))
        {
            Some(CaseConvention::Lower)
        } else {
            None
        }
    }
}

/// What serde serializes a field as under `rename_all = "camelCase"`
pub fn camel_case_field(field: &str) -> String {
    let mut pascal = String::new();
    let mut capitalize = true;
    for ch in field.chars() {
        if ch == '_' {
            capitalize = true;
        } else if capitalize {
            pascal.push(ch.to_ascii_uppercase());
            capitalize = false;
        } else {
            pascal.push(ch);
        }
    }
    match pascal.chars().next() {
        Some(first) => first.to_lowercase().chain(pascal.chars().skip(1)).collect(),
        None => pascal,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub name: String,
    pub value: String,
    pub rename: Option<String>,
}

/// Definition for an enumeration of string literals
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    pub case: Option<CaseConvention>,
    pub variants: Vec<Variant>,
}

/// A variant of a `oneOf`/`anyOf` union, wrapping one type
#[derive(Debug, Clone, PartialEq)]
pub struct UnionVariant {
    pub name: String,
    pub variant_type: FieldType,
    /// Tag value when it differs from the variant name
    pub rename: Option<String>,
}

/// A definition for the types that need to be generated
#[derive(Debug, Clone, PartialEq)]
pub enum EntityDef {
    /// A record with an extension field for undeclared properties
    Struct(StructDef),
    /// A string enumeration
    Enum(EnumDef),
    /// `oneOf`/`anyOf`: `#[serde(tag = "<discriminant>")]` when a discriminator is declared,
    /// `#[serde(untagged)]` otherwise
    OneOf {
        discriminant: Option<String>,
        variants: Vec<UnionVariant>,
    },
    /// `pub type Name = T;` for named primitives and arrays
    Alias(FieldType),
}

/// An entity is any kind of type that needs to be generated in the result code.
/// It always has a unique name and a definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub name: String,
    /// The key in `components/schemas`
    pub schema_name: String,
    pub description: Option<String>,
    pub def: EntityDef,
}

impl Entity {
    /// Names of declared types the definition refers to
    pub fn dependencies(&self) -> Vec<&str> {
        match &self.def {
            EntityDef::Struct(def) => def
                .fields
                .iter()
                .flat_map(|f| f.field_type.named_types())
                .filter(|name| *name != self.name)
                .collect(),
            EntityDef::Enum(_) => vec![],
            EntityDef::OneOf { variants, .. } => variants
                .iter()
                .flat_map(|v| v.variant_type.named_types())
                .collect(),
            EntityDef::Alias(field_type) => field_type.named_types(),
        }
    }
}

fn is_camel_mixed(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_lowercase) && name.chars().any(char::is_uppercase)
}

fn collect_properties<'a>(owner: &'a Schema, out: &mut Vec<(&'a str, &'a Schema, bool)>) {
    for (name, property) in owner.properties.iter() {
        out.push((name, property, owner.is_required(name)));
    }
}

/// Builds a struct from an object schema; `allOf` members are flattened (references) or
/// merged (inline objects)
fn parse_struct(type_name: &str, schema: &Schema) -> StructDef {
    let mut properties = Vec::new();
    let mut flattened = Vec::new();
    collect_properties(schema, &mut properties);
    for member in &schema.all_of {
        match member.ref_name() {
            Some(name) => flattened.push(name),
            None => collect_properties(member, &mut properties),
        }
    }

    let camel_case = properties.iter().any(|(name, _, _)| is_camel_mixed(name));
    let mut taken = HashSet::new();
    let mut fields = flattened
        .into_iter()
        .map(|schema_name| {
            let member_type = naming::type_name(schema_name);
            let name = naming::dedupe(
                &mut taken,
                naming::normalize_field_name(&member_type),
                "_",
            );
            Field {
                name,
                wire_name: schema_name.to_string(),
                field_type: FieldType::Named(member_type),
                optional: false,
                rename: None,
                flatten: true,
                description: None,
            }
        })
        .collect::<Vec<_>>();

    for (wire_name, property, required) in properties {
        let name = naming::dedupe(&mut taken, naming::normalize_field_name(wire_name), "_");
        let bare = name.strip_prefix("r#").unwrap_or(&name);
        let serialized = if camel_case {
            camel_case_field(bare)
        } else {
            bare.to_string()
        };
        let rename = (serialized != wire_name).then(|| wire_name.to_string());
        fields.push(Field {
            field_type: map_type(property, required).box_self_reference(type_name),
            name,
            wire_name: wire_name.to_string(),
            optional: !required,
            rename,
            flatten: false,
            description: property.description.clone(),
        });
    }

    let extension_field = ["extra", "extra_fields", "additional_properties"]
        .into_iter()
        .find(|candidate| !taken.contains(*candidate))
        .unwrap_or("extension")
        .to_string();
    StructDef {
        camel_case,
        fields,
        extension_field,
    }
}

/// Builds an enumeration from its literal values
pub fn parse_enum(values: &[&str]) -> EnumDef {
    let case = CaseConvention::detect(values);
    let mut taken = HashSet::new();
    let variants = values
        .iter()
        .map(|value| {
            let name = naming::dedupe(&mut taken, naming::variant_name(value), "");
            let rename = match case {
                Some(case) if case.apply_to_variant(&name) == *value => None,
                _ => Some(value.to_string()),
            };
            Variant {
                name,
                value: value.to_string(),
                rename,
            }
        })
        .collect();
    EnumDef { case, variants }
}

fn parse_union(schema: &Schema) -> EntityDef {
    let members = if schema.one_of.is_empty() {
        &schema.any_of
    } else {
        &schema.one_of
    };
    let discriminator = schema.discriminator.as_ref();
    let mut taken = HashSet::new();
    let variants = members
        .iter()
        .enumerate()
        .map(|(i, member)| {
            let variant_type = map_type(member, true);
            let (name, tag_value) = match member.ref_name() {
                Some(schema_name) => {
                    // an explicit mapping wins, otherwise the tag value is the schema name
                    let mapped = discriminator.and_then(|d| {
                        d.mapping
                            .iter()
                            .find(|(_, target)| {
                                ref_name(target) == schema_name
                            })
                            .map(|(value, _)| value.clone())
                    });
                    (
                        naming::type_name(schema_name),
                        mapped.unwrap_or_else(|| schema_name.to_string()),
                    )
                }
                None => {
                    let name = format!("Variant{}", i + 1);
                    (name.clone(), name)
                }
            };
            let name = naming::dedupe(&mut taken, name, "");
            let rename = (discriminator.is_some() && tag_value != name).then_some(tag_value);
            UnionVariant {
                name,
                variant_type,
                rename,
            }
        })
        .collect();
    EntityDef::OneOf {
        discriminant: discriminator.map(|d| d.property_name.clone()),
        variants,
    }
}

/// Parses a named schema into the entity that declares it
pub fn parse_entity(schema_name: &str, schema: &Schema) -> Entity {
    let name = naming::type_name(schema_name);
    let def = match schema.kind() {
        SchemaKind::Enumeration => match schema.string_enum_values() {
            Some(values) => EntityDef::Enum(parse_enum(&values)),
            None => EntityDef::Alias(map_type(schema, true)),
        },
        SchemaKind::Composition if schema.all_of.is_empty() => parse_union(schema),
        SchemaKind::Composition | SchemaKind::Object => {
            EntityDef::Struct(parse_struct(&name, schema))
        }
        SchemaKind::Reference | SchemaKind::Array | SchemaKind::Primitive => {
            EntityDef::Alias(map_type(schema, true))
        }
    };
    Entity {
        name,
        schema_name: schema_name.to_string(),
        description: schema.description.clone(),
        def,
    }
}

/// Removes the discriminator property from structs that are variants of an internally
/// tagged union: serde consumes the tag before the variant struct sees it.
pub fn strip_discriminator_fields(entities: &mut [Entity]) {
    let tagged = entities
        .iter()
        .filter_map(|entity| match &entity.def {
            EntityDef::OneOf {
                discriminant: Some(tag),
                variants,
            } => Some((tag.clone(), variants.clone())),
            _ => None,
        })
        .flat_map(|(tag, variants)| {
            variants.into_iter().filter_map(move |v| match v.variant_type {
                FieldType::Named(name) => Some((name, tag.clone())),
                _ => None,
            })
        })
        .collect::<BTreeMap<String, String>>();
    for entity in entities.iter_mut() {
        let Some(tag) = tagged.get(&entity.name) else {
            continue;
        };
        if let EntityDef::Struct(def) = &mut entity.def {
            def.fields.retain(|f| f.flatten || f.wire_name != *tag);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn schema(json: &str) -> Schema {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_map_type_table() {
        let cases = [
            (r#"{"type": "string"}"#, "String"),
            (r#"{"type": "string", "format": "uuid"}"#, "String"),
            (r#"{"type": "string", "format": "date-time"}"#, "String"),
            (r#"{"type": "string", "format": "binary"}"#, "Vec<u8>"),
            (r#"{"type": "string", "format": "byte"}"#, "Value"),
            (r#"{"type": "integer"}"#, "i32"),
            (r#"{"type": "integer", "format": "int64"}"#, "i64"),
            (r#"{"type": "number"}"#, "f64"),
            (r#"{"type": "number", "format": "float"}"#, "f32"),
            (r#"{"type": "boolean"}"#, "bool"),
            (r#"{"type": "object"}"#, "HashMap<String, Value>"),
            (r#"{"type": "file"}"#, "Value"),
            (r#"{}"#, "Value"),
            (r#"{"type": "array"}"#, "Value"),
            (r#"{"type": "array", "items": {"type": "integer"}}"#, "Vec<i32>"),
            (
                r##"{"type": "array", "items": {"$ref": "#/components/schemas/widget"}}"##,
                "Vec<Widget>",
            ),
            (r#"{"type": "string", "enum": ["a", "b"]}"#, "String"),
            (r#"{"type": "integer", "enum": [1, 2]}"#, "i32"),
        ];
        for (json, expected) in cases {
            assert_eq!(map_type(&schema(json), true).to_string(), expected, "{json}");
        }
    }

    #[test]
    fn test_map_type_optional_wraps_whole_expression() {
        let s = schema(r##"{"type": "array", "items": {"$ref": "#/components/schemas/Tag"}}"##);
        assert_eq!(map_type(&s, false).to_string(), "Option<Vec<Tag>>");
        assert_eq!(map_type(&Schema::default(), false).to_string(), "Option<Value>");
    }

    #[test]
    fn test_widget_scenario() {
        let s = schema(
            r#"{
                "type": "object",
                "required": ["id"],
                "properties": {
                    "id": {"type": "string"},
                    "createdAt": {"type": "string", "format": "date-time"}
                }
            }"#,
        );
        let entity = parse_entity("widget", &s);
        assert_eq!(entity.name, "Widget");
        let EntityDef::Struct(def) = entity.def else {
            panic!("expected a struct");
        };
        assert!(def.camel_case);
        assert_eq!(def.extension_field, "extra");
        assert_eq!(def.fields.len(), 2);
        assert_eq!(def.fields[0].name, "id");
        assert_eq!(def.fields[0].field_type.to_string(), "String");
        assert!(!def.fields[0].optional);
        assert_eq!(def.fields[1].name, "created_at");
        assert_eq!(def.fields[1].field_type.to_string(), "Option<String>");
        // camelCase on the struct already produces `createdAt`
        assert_eq!(def.fields[1].rename, None);
    }

    #[test]
    fn test_required_field_law() {
        let s = schema(
            r#"{
                "type": "object",
                "required": ["a", "c"],
                "properties": {
                    "a": {"type": "integer"},
                    "b": {"type": "integer"},
                    "c": {},
                    "d": {"type": "array", "items": {"type": "string"}}
                }
            }"#,
        );
        let EntityDef::Struct(def) = parse_entity("Thing", &s).def else {
            panic!("expected a struct");
        };
        for field in def.fields {
            let required = s.is_required(&field.wire_name);
            assert_eq!(field.field_type.is_optional(), !required, "{}", field.wire_name);
        }
    }

    #[test]
    fn test_renames_without_camel_case() {
        let s = schema(
            r#"{
                "type": "object",
                "properties": {
                    "type": {"type": "string"},
                    "Name": {"type": "string"},
                    "memory_size": {"type": "integer"},
                    "self": {"type": "string"}
                }
            }"#,
        );
        let EntityDef::Struct(def) = parse_entity("Thing", &s).def else {
            panic!("expected a struct");
        };
        assert!(!def.camel_case);
        let renames = def
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.rename.as_deref()))
            .collect::<Vec<_>>();
        assert_eq!(
            renames,
            vec![
                ("r#type", None),
                ("name", Some("Name")),
                ("memory_size", None),
                ("self_", Some("self")),
            ]
        );
    }

    #[test]
    fn test_renames_with_camel_case_only_where_needed() {
        let s = schema(
            r#"{
                "type": "object",
                "properties": {
                    "shardCount": {"type": "integer"},
                    "HTTPPort": {"type": "integer"},
                    "snake_name": {"type": "string"}
                }
            }"#,
        );
        let EntityDef::Struct(def) = parse_entity("Thing", &s).def else {
            panic!("expected a struct");
        };
        assert!(def.camel_case);
        assert_eq!(def.fields[0].rename, None);
        assert_eq!(def.fields[1].name, "http_port");
        assert_eq!(def.fields[1].rename.as_deref(), Some("HTTPPort"));
        assert_eq!(def.fields[2].rename.as_deref(), Some("snake_name"));
    }

    #[test]
    fn test_extension_field_avoids_property_names() {
        let s = schema(r#"{"type": "object", "properties": {"extra": {"type": "string"}}}"#);
        let EntityDef::Struct(def) = parse_entity("Thing", &s).def else {
            panic!("expected a struct");
        };
        assert_eq!(def.extension_field, "extra_fields");
    }

    #[test]
    fn test_self_reference_is_boxed() {
        let s = schema(
            r##"{
                "type": "object",
                "properties": {
                    "parent": {"$ref": "#/components/schemas/node"},
                    "children": {"type": "array", "items": {"$ref": "#/components/schemas/node"}}
                }
            }"##,
        );
        let entity = parse_entity("node", &s);
        let EntityDef::Struct(def) = &entity.def else {
            panic!("expected a struct");
        };
        assert_eq!(def.fields[0].field_type.to_string(), "Option<Box<Node>>");
        assert_eq!(def.fields[1].field_type.to_string(), "Option<Vec<Node>>");
        assert!(entity.dependencies().is_empty());
    }

    #[test]
    fn test_enum_conventions() {
        assert_eq!(
            parse_enum(&["a-b", "c-d"]).case,
            Some(CaseConvention::Kebab)
        );
        assert_eq!(
            parse_enum(&["ACTIVE", "PAUSED"]).case,
            Some(CaseConvention::Upper)
        );
        assert_eq!(
            parse_enum(&["active", "paused"]).case,
            Some(CaseConvention::Lower)
        );
        let mixed = parse_enum(&["Mixed", "case"]);
        assert_eq!(mixed.case, None);
        assert!(mixed.variants.iter().all(|v| v.rename.as_deref() == Some(v.value.as_str())));
    }

    #[test]
    fn test_enum_variants_and_exact_renames() {
        let def = parse_enum(&["in-progress", "done"]);
        assert_eq!(def.variants[0].name, "InProgress");
        assert_eq!(def.variants[0].rename, None);
        assert_eq!(def.variants[1].name, "Done");

        // lowercase with underscores does not survive `rename_all = "lowercase"`
        let def = parse_enum(&["in_progress", "done"]);
        assert_eq!(def.case, Some(CaseConvention::Lower));
        assert_eq!(def.variants[0].name, "InProgress");
        assert_eq!(def.variants[0].rename.as_deref(), Some("in_progress"));
        assert_eq!(def.variants[1].rename, None);

        let def = parse_enum(&["redis.v6", "redis.v7"]);
        assert_eq!(def.variants[0].name, "RedisV6");
        assert_eq!(def.variants[0].rename.as_deref(), Some("redis.v6"));
    }

    #[test]
    fn test_enum_duplicate_variant_names() {
        let def = parse_enum(&["a-b", "a_b"]);
        assert_eq!(def.variants[0].name, "AB");
        assert_eq!(def.variants[1].name, "AB2");
        assert_eq!(def.variants[1].rename.as_deref(), Some("a_b"));
    }

    #[test]
    fn test_camel_case_field() {
        assert_eq!(camel_case_field("created_at"), "createdAt");
        assert_eq!(camel_case_field("id"), "id");
        assert_eq!(camel_case_field("shard1_id"), "shard1Id");
    }

    #[test]
    fn test_all_of_flattens_refs_and_merges_inline_members() {
        let s = schema(
            r##"{
                "allOf": [
                    {"$ref": "#/components/schemas/BaseEntity"},
                    {"type": "object", "required": ["name"], "properties": {"name": {"type": "string"}}}
                ]
            }"##,
        );
        let entity = parse_entity("NamedEntity", &s);
        let EntityDef::Struct(def) = &entity.def else {
            panic!("expected a struct");
        };
        assert_eq!(def.fields[0].name, "base_entity");
        assert!(def.fields[0].flatten);
        assert_eq!(def.fields[1].name, "name");
        assert!(!def.fields[1].optional);
        assert_eq!(entity.dependencies(), vec!["BaseEntity"]);
    }

    #[test]
    fn test_one_of_with_discriminator() {
        let s = schema(
            r##"{
                "oneOf": [
                    {"$ref": "#/components/schemas/Cat"},
                    {"$ref": "#/components/schemas/dog"}
                ],
                "discriminator": {
                    "propertyName": "petType",
                    "mapping": {"canine": "#/components/schemas/dog"}
                }
            }"##,
        );
        let EntityDef::OneOf {
            discriminant,
            variants,
        } = parse_entity("Pet", &s).def
        else {
            panic!("expected a union");
        };
        assert_eq!(discriminant.as_deref(), Some("petType"));
        assert_eq!(variants[0].name, "Cat");
        assert_eq!(variants[0].rename, None);
        assert_eq!(variants[1].name, "Dog");
        assert_eq!(variants[1].rename.as_deref(), Some("canine"));
    }

    #[test]
    fn test_any_of_without_discriminator_is_untagged() {
        let s = schema(r#"{"anyOf": [{"type": "string"}, {"type": "integer"}]}"#);
        let EntityDef::OneOf {
            discriminant,
            variants,
        } = parse_entity("Flexible", &s).def
        else {
            panic!("expected a union");
        };
        assert_eq!(discriminant, None);
        assert_eq!(variants[0].name, "Variant1");
        assert_eq!(variants[0].variant_type.to_string(), "String");
        assert_eq!(variants[1].variant_type.to_string(), "i32");
    }

    #[test]
    fn test_named_primitives_become_aliases() {
        let entity = parse_entity("WidgetId", &schema(r#"{"type": "string"}"#));
        assert_eq!(entity.def, EntityDef::Alias(FieldType::Simple(Primitive::String)));
        let entity = parse_entity(
            "WidgetList",
            &schema(r##"{"type": "array", "items": {"$ref": "#/components/schemas/Widget"}}"##),
        );
        assert_eq!(
            entity.def,
            EntityDef::Alias(FieldType::Named("Widget".into()).array())
        );
        assert_eq!(entity.dependencies(), vec!["Widget"]);
    }

    #[test]
    fn test_strip_discriminator_fields() {
        let pet = schema(
            r##"{
                "oneOf": [{"$ref": "#/components/schemas/Cat"}],
                "discriminator": {"propertyName": "petType"}
            }"##,
        );
        let cat = schema(
            r#"{
                "type": "object",
                "required": ["petType"],
                "properties": {"petType": {"type": "string"}, "lives": {"type": "integer"}}
            }"#,
        );
        let mut entities = vec![parse_entity("Cat", &cat), parse_entity("Pet", &pet)];
        strip_discriminator_fields(&mut entities);
        let EntityDef::Struct(def) = &entities[0].def else {
            panic!("expected a struct");
        };
        assert_eq!(def.fields.len(), 1);
        assert_eq!(def.fields[0].wire_name, "lives");
    }
}
