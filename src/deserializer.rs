use std::{collections::BTreeMap, fmt, fs, marker::PhantomData, path::Path};

use log::warn;
use serde::{
    de::{self, MapAccess, Visitor},
    Deserialize, Deserializer,
};

use crate::error::{GeneratorError, Result};

/// The last segment of a `$ref` path, e.g. `#/components/schemas/Widget` -> `Widget`
pub fn ref_name(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

/// A string keyed map that keeps keys in declaration order.
/// Object properties are emitted as fields in the order the document lists them.
#[derive(Debug, Clone, PartialEq)]
pub struct Ordered<T>(pub Vec<(String, T)>);

impl<T> Default for Ordered<T> {
    fn default() -> Self {
        Ordered(Vec::new())
    }
}

impl<T> Ordered<T> {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.0.iter().map(|(_, v)| v)
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<T> FromIterator<(String, T)> for Ordered<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        Ordered(iter.into_iter().collect())
    }
}

struct OrderedVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for OrderedVisitor<T> {
    type Value = Ordered<T>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
        let mut entries: Vec<(String, T)> = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<Key, T>()? {
            // duplicate keys: last one wins, first position is kept
            match entries.iter_mut().find(|(k, _)| *k == key.0) {
                Some(entry) => entry.1 = value,
                None => entries.push((key.0, value)),
            }
        }
        Ok(Ordered(entries))
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Ordered<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedVisitor(PhantomData))
    }
}

/// A map key that accepts strings as well as YAML integers (`200:` in a responses map)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Key(pub String);

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct KeyVisitor;

        impl<'de> Visitor<'de> for KeyVisitor {
            type Value = Key;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a string or integer key")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Key, E> {
                Ok(Key(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Key, E> {
                Ok(Key(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Key, E> {
                Ok(Key(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Key, E> {
                Ok(Key(v.to_string()))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Key, E> {
                Ok(Key(v.to_string()))
            }
        }

        deserializer.deserialize_any(KeyVisitor)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SchemaType {
    Object,
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Null,
    #[serde(other)]
    Unknown,
}

/// OpenAPI 3.1 allows `type: [string, "null"]`
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum TypeSet {
    Single(SchemaType),
    Multiple(Vec<SchemaType>),
}

impl TypeSet {
    /// The first non-null member
    pub fn primary(&self) -> SchemaType {
        match self {
            TypeSet::Single(t) => *t,
            TypeSet::Multiple(types) => types
                .iter()
                .copied()
                .find(|t| *t != SchemaType::Null)
                .unwrap_or(SchemaType::Null),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Format {
    Int32,
    Int64,
    Float,
    Double,
    Byte,
    Binary,
    Date,
    Uuid,
    #[serde(rename = "date-time")]
    DateTime,
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Discriminator {
    pub property_name: String,
    /// Tag value -> `$ref` of the variant schema
    #[serde(default)]
    pub mapping: BTreeMap<String, String>,
}

/// `required` is a list of property names; swagger-2 style `required: true` is tolerated
/// and treated as an empty list.
fn lenient_required<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Required {
        Names(Vec<String>),
        Flag(bool),
    }
    Ok(match Required::deserialize(deserializer)? {
        Required::Names(names) => names,
        Required::Flag(_) => Vec::new(),
    })
}

/// One schema node. Every attribute is optional so partially specified documents
/// still load; interpretation happens in the type mapper.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    #[serde(rename = "type")]
    pub schema_type: Option<TypeSet>,
    pub format: Option<Format>,
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<serde_json::Value>>,
    pub items: Option<Box<Schema>>,
    #[serde(default)]
    pub properties: Ordered<Schema>,
    #[serde(default, deserialize_with = "lenient_required")]
    pub required: Vec<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub all_of: Vec<Schema>,
    #[serde(default)]
    pub one_of: Vec<Schema>,
    #[serde(default)]
    pub any_of: Vec<Schema>,
    pub discriminator: Option<Discriminator>,
}

/// Coarse classification of a schema node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Reference,
    Enumeration,
    Array,
    Object,
    Composition,
    Primitive,
}

impl Schema {
    pub fn is_empty(&self) -> bool {
        *self == Schema::default()
    }

    /// The referenced schema name if this node is a `$ref`
    pub fn ref_name(&self) -> Option<&str> {
        self.reference.as_deref().map(ref_name)
    }

    /// The declared type, `object` when absent
    pub fn primary_type(&self) -> SchemaType {
        self.schema_type
            .as_ref()
            .map(TypeSet::primary)
            .unwrap_or(SchemaType::Object)
    }

    /// The literal values if this is an enumeration made only of strings
    pub fn string_enum_values(&self) -> Option<Vec<&str>> {
        let values = self.enum_values.as_ref()?;
        values.iter().map(serde_json::Value::as_str).collect()
    }

    pub fn is_required(&self, property: &str) -> bool {
        self.required.iter().any(|r| r == property)
    }

    pub fn compositions(&self) -> impl Iterator<Item = &Schema> {
        self.all_of
            .iter()
            .chain(self.one_of.iter())
            .chain(self.any_of.iter())
    }

    pub fn kind(&self) -> SchemaKind {
        if self.reference.is_some() {
            SchemaKind::Reference
        } else if self.enum_values.is_some() {
            SchemaKind::Enumeration
        } else if !self.all_of.is_empty() || !self.one_of.is_empty() || !self.any_of.is_empty() {
            SchemaKind::Composition
        } else {
            match self.primary_type() {
                SchemaType::Array => SchemaKind::Array,
                SchemaType::Object => SchemaKind::Object,
                _ => SchemaKind::Primitive,
            }
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "in", default)]
    pub location: ParameterLocation,
    #[serde(default)]
    pub required: bool,
    pub description: Option<String>,
    #[serde(default)]
    pub schema: Schema,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MediaType {
    #[serde(default)]
    pub schema: Schema,
}

pub const JSON_CONTENT: &str = "application/json";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RequestBody {
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub content: BTreeMap<String, MediaType>,
}

impl RequestBody {
    pub fn json_schema(&self) -> Option<&Schema> {
        self.content.get(JSON_CONTENT).map(|m| &m.schema)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Response {
    pub description: Option<String>,
    #[serde(default)]
    pub content: BTreeMap<String, MediaType>,
}

impl Response {
    pub fn json_schema(&self) -> Option<&Schema> {
        self.content.get(JSON_CONTENT).map(|m| &m.schema)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    pub request_body: Option<RequestBody>,
    #[serde(default)]
    pub responses: BTreeMap<Key, Response>,
}

impl Operation {
    pub fn response(&self, status: &str) -> Option<&Response> {
        self.responses.get(&Key(status.to_string()))
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// The HTTP verbs that produce handler methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Method {
    Delete,
    Get,
    Patch,
    Post,
    Put,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Delete => "delete",
            Method::Get => "get",
            Method::Patch => "patch",
            Method::Post => "post",
            Method::Put => "put",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PathItem {
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    pub delete: Option<Operation>,
    pub get: Option<Operation>,
    pub patch: Option<Operation>,
    pub post: Option<Operation>,
    pub put: Option<Operation>,
}

impl PathItem {
    /// Operations in verb order
    pub fn operations(&self) -> impl Iterator<Item = (Method, &Operation)> {
        [
            (Method::Delete, &self.delete),
            (Method::Get, &self.get),
            (Method::Patch, &self.patch),
            (Method::Post, &self.post),
            (Method::Put, &self.put),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.as_ref().map(|op| (method, op)))
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Components {
    #[serde(default)]
    pub schemas: BTreeMap<String, Schema>,
    #[serde(default)]
    pub parameters: BTreeMap<String, Parameter>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Tag {
    pub name: String,
    pub description: Option<String>,
}

/// The whole input document. Loaded once and never mutated.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Document {
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,
    #[serde(default)]
    pub components: Components,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Document {
    /// Loads a document, as JSON when the extension says so and as YAML otherwise
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| GeneratorError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            Self::from_json_str(&content).map_err(|e| e.to_string())
        } else {
            Self::from_yaml_str(&content).map_err(|e| e.to_string())
        };
        parsed.map_err(|message| GeneratorError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_json_str(input: &str) -> serde_json::Result<Self> {
        serde_json::from_str(input)
    }

    pub fn from_yaml_str(input: &str) -> serde_yaml::Result<Self> {
        serde_yaml::from_str(input)
    }

    pub fn schemas(&self) -> &BTreeMap<String, Schema> {
        &self.components.schemas
    }

    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|t| t.name.as_str())
    }

    /// The operation's parameters with path-level ones merged in and `$ref`s resolved.
    /// An operation parameter overrides a path parameter with the same name and location.
    pub fn parameters_for(&self, item: &PathItem, operation: &Operation) -> Vec<Parameter> {
        let resolve = |param: &Parameter| -> Option<Parameter> {
            match &param.reference {
                None => Some(param.clone()),
                Some(reference) => {
                    let resolved = self.components.parameters.get(ref_name(reference)).cloned();
                    if resolved.is_none() {
                        warn!("Dangling parameter reference '{}'", reference);
                    }
                    resolved
                }
            }
        };
        let own = operation.parameters.iter().filter_map(&resolve).collect::<Vec<_>>();
        let mut merged = item
            .parameters
            .iter()
            .filter_map(&resolve)
            .filter(|p| {
                !own.iter()
                    .any(|o| o.name == p.name && o.location == p.location)
            })
            .collect::<Vec<_>>();
        merged.extend(own);
        merged
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_object_schema_keeps_property_order() {
        let yaml = r#"
            type: object
            required: [id]
            properties:
              zeta:
                type: string
              id:
                type: string
              alpha:
                type: integer
                format: int64
        "#;
        let schema = serde_yaml::from_str::<Schema>(yaml).unwrap();
        assert_eq!(schema.properties.keys().collect::<Vec<_>>(), vec!["zeta", "id", "alpha"]);
        assert!(schema.is_required("id"));
        assert!(!schema.is_required("zeta"));
        assert_eq!(schema.kind(), SchemaKind::Object);
        assert_eq!(
            schema.properties.get("alpha").unwrap().format,
            Some(Format::Int64)
        );
    }

    #[test]
    fn test_parse_unknown_type_and_format() {
        let json = r#"{"type": "file", "format": "whatever"}"#;
        let schema = serde_json::from_str::<Schema>(json).unwrap();
        assert_eq!(schema.primary_type(), SchemaType::Unknown);
        assert_eq!(schema.format, Some(Format::Other));
    }

    #[test]
    fn test_parse_nullable_type_list() {
        let json = r#"{"type": ["null", "string"]}"#;
        let schema = serde_json::from_str::<Schema>(json).unwrap();
        assert_eq!(schema.primary_type(), SchemaType::String);
    }

    #[test]
    fn test_parse_boolean_required_flag() {
        let json = r#"{"type": "object", "required": true}"#;
        let schema = serde_json::from_str::<Schema>(json).unwrap();
        assert!(schema.required.is_empty());
    }

    #[test]
    fn test_ref_and_enum() {
        let schema = serde_json::from_str::<Schema>(r##"{"$ref": "#/components/schemas/widget"}"##)
            .unwrap();
        assert_eq!(schema.ref_name(), Some("widget"));
        assert_eq!(schema.kind(), SchemaKind::Reference);

        let schema = serde_json::from_str::<Schema>(r#"{"type": "string", "enum": ["a", "b"]}"#)
            .unwrap();
        assert_eq!(schema.string_enum_values(), Some(vec!["a", "b"]));

        let schema = serde_json::from_str::<Schema>(r#"{"type": "integer", "enum": [1, 2]}"#)
            .unwrap();
        assert_eq!(schema.string_enum_values(), None);
    }

    #[test]
    fn test_empty_schema() {
        assert!(Schema::default().is_empty());
        let described = serde_json::from_str::<Schema>(r#"{"description": "x"}"#).unwrap();
        assert!(!described.is_empty());
        assert_eq!(described.primary_type(), SchemaType::Object);
    }

    #[test]
    fn test_parse_document_with_integer_status_keys() {
        let yaml = r##"
            tags:
              - name: Widgets
            paths:
              /v1/widgets/{id}:
                parameters:
                  - name: id
                    in: path
                    required: true
                    schema:
                      type: string
                get:
                  operationId: getWidget
                  tags: [Widgets]
                  responses:
                    200:
                      description: ok
                      content:
                        application/json:
                          schema:
                            $ref: '#/components/schemas/widget'
            components:
              schemas:
                widget:
                  type: object
        "##;
        let doc = Document::from_yaml_str(yaml).unwrap();
        assert_eq!(doc.tag_names().collect::<Vec<_>>(), vec!["Widgets"]);
        let item = &doc.paths["/v1/widgets/{id}"];
        let (method, op) = item.operations().next().unwrap();
        assert_eq!(method, Method::Get);
        let response = op.response("200").unwrap();
        assert_eq!(response.json_schema().unwrap().ref_name(), Some("widget"));
        let params = doc.parameters_for(item, op);
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].location, ParameterLocation::Path);
    }

    #[test]
    fn test_parameter_refs_and_overrides() {
        let json = r##"{
            "paths": {
                "/items": {
                    "parameters": [
                        {"name": "limit", "in": "query", "schema": {"type": "integer"}},
                        {"name": "offset", "in": "query", "schema": {"type": "integer"}}
                    ],
                    "get": {
                        "parameters": [
                            {"name": "limit", "in": "query", "required": true, "schema": {"type": "integer"}},
                            {"$ref": "#/components/parameters/Search"},
                            {"$ref": "#/components/parameters/Missing"}
                        ]
                    }
                }
            },
            "components": {
                "parameters": {
                    "Search": {"name": "q", "in": "query", "schema": {"type": "string"}}
                }
            }
        }"##;
        let doc = Document::from_json_str(json).unwrap();
        let item = &doc.paths["/items"];
        let op = item.get.as_ref().unwrap();
        let params = doc.parameters_for(item, op);
        let names = params.iter().map(|p| p.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["offset", "limit", "q"]);
        assert!(params[1].required);
    }

    #[test]
    fn test_from_path_reports_missing_file() {
        let err = Document::from_path(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, GeneratorError::Read { .. }));
    }
}
