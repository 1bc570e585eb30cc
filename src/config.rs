use std::{collections::BTreeMap, fs, path::Path};

use serde::Deserialize;

use crate::{
    deserializer::Key,
    error::{GeneratorError, Result},
};

/// Settings for a generation run, loaded from YAML. Every field has a default so an
/// empty file (or no file) is a valid configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Type of the `client` field in every handler
    pub client_type: String,
    /// Result alias returned by every handler method
    pub result_type: String,
    /// Path both are imported from, e.g. `crate` or `redis_cloud`
    pub crate_path: String,
    /// Tag name -> module name overrides
    pub tag_aliases: BTreeMap<String, String>,
    /// Response codes checked in order for the success body
    pub success_statuses: Vec<Key>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            client_type: "CloudClient".to_string(),
            result_type: "Result".to_string(),
            crate_path: "crate".to_string(),
            tag_aliases: BTreeMap::new(),
            success_statuses: ["200", "201", "202", "204"]
                .into_iter()
                .map(|s| Key(s.to_string()))
                .collect(),
        }
    }
}

impl GeneratorConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| GeneratorError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self =
            serde_yaml::from_str(content).map_err(|e| GeneratorError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every name ends up as valid Rust
    pub fn validate(&self) -> Result<()> {
        self.client_ident()?;
        self.result_ident()?;
        self.crate_path()?;
        for (tag, alias) in &self.tag_aliases {
            // aliases double as file stems
            if alias.starts_with("r#") || syn::parse_str::<syn::Ident>(alias).is_err() {
                return Err(GeneratorError::Config(format!(
                    "alias '{alias}' for tag '{tag}' is not a valid module name"
                )));
            }
        }
        if self.success_statuses.is_empty() {
            return Err(GeneratorError::Config(
                "success_statuses must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn success_statuses(&self) -> impl Iterator<Item = &str> {
        self.success_statuses.iter().map(|k| k.0.as_str())
    }

    pub(crate) fn client_ident(&self) -> Result<syn::Ident> {
        parse_ident("client_type", &self.client_type)
    }

    pub(crate) fn result_ident(&self) -> Result<syn::Ident> {
        parse_ident("result_type", &self.result_type)
    }

    pub(crate) fn crate_path(&self) -> Result<syn::Path> {
        parse_path("crate_path", &self.crate_path)
    }
}

fn parse_ident(field: &str, value: &str) -> Result<syn::Ident> {
    syn::parse_str(value).map_err(|e| {
        GeneratorError::Config(format!("{field} '{value}' is not a Rust identifier: {e}"))
    })
}

fn parse_path(field: &str, value: &str) -> Result<syn::Path> {
    syn::parse_str(value)
        .map_err(|e| GeneratorError::Config(format!("{field} '{value}' is not a Rust path: {e}")))
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(GeneratorConfig::from_yaml_str("").unwrap(), GeneratorConfig::default());
        assert_eq!(
            GeneratorConfig::default().success_statuses().collect::<Vec<_>>(),
            vec!["200", "201", "202", "204"]
        );
    }

    #[test]
    fn test_partial_config() {
        let config = GeneratorConfig::from_yaml_str(
            r#"
client_type: ApiClient
tag_aliases:
  "Role-based Access Control (RBAC)": acl
success_statuses: [200, "201"]
"#,
        )
        .unwrap();
        assert_eq!(config.client_type, "ApiClient");
        assert_eq!(config.result_type, "Result");
        assert_eq!(config.crate_path, "crate");
        assert_eq!(config.tag_aliases["Role-based Access Control (RBAC)"], "acl");
        assert_eq!(config.success_statuses().collect::<Vec<_>>(), vec!["200", "201"]);
    }

    #[test]
    fn test_invalid_config() {
        let err = GeneratorConfig::from_yaml_str("client_type: \"not a type\"").unwrap_err();
        assert!(matches!(err, GeneratorError::Config(_)), "{err}");

        let err = GeneratorConfig::from_yaml_str("tag_aliases: {Users: \"user-ops\"}").unwrap_err();
        assert!(matches!(err, GeneratorError::Config(_)), "{err}");

        let err = GeneratorConfig::from_yaml_str("tag_aliases: {Types: \"r#type\"}").unwrap_err();
        assert!(matches!(err, GeneratorError::Config(_)), "{err}");

        let err = GeneratorConfig::from_yaml_str("unknown_key: 1").unwrap_err();
        assert!(matches!(err, GeneratorError::Config(_)), "{err}");
    }

    #[test]
    fn test_missing_config_file() {
        let err = GeneratorConfig::from_path(Path::new("/nonexistent/openapi2code.yaml"))
            .unwrap_err();
        assert!(matches!(err, GeneratorError::Read { .. }));
    }
}
