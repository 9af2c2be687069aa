//! Generator configuration, loadable from TOML.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::GenerateError;

/// Bookkeeping tables that never become entities.
const SYSTEM_TABLES: &[&str] = &[
    "__MigrationHistory",
    "__EFMigrationsHistory",
    "EdmMetadata",
    "sysdiagrams",
];

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid settings file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// What flavour of output to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodeTarget {
    /// Plain data objects only. No mapping, no filtering, no relationship lookups.
    Poco,
    /// Data objects plus mapping descriptions. Shared-key children are modelled
    /// as table-per-type inheritance and tables without keys are skipped.
    #[default]
    CodeFirst,
}

impl CodeTarget {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "poco" => Some(Self::Poco),
            "code-first" | "codefirst" | "code_first" => Some(Self::CodeFirst),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Poco => "poco",
            Self::CodeFirst => "code-first",
        }
    }

    pub fn has_mapping(self) -> bool {
        matches!(self, Self::CodeFirst)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GeneratorSettings {
    /// Root namespace of every generated file.
    pub namespace: String,
    pub target: CodeTarget,
    pub include_views: bool,
    /// Emit object/input/payload types, resolvers and the query, mutation,
    /// subscription and data-context aggregates.
    pub api_layer: bool,
    /// Name collections by pluralizing the class name instead of appending
    /// `Collection`.
    pub pluralize: bool,
    /// Singular to plural pairs the suffix rules get wrong.
    pub irregular_nouns: IndexMap<String, String>,
    /// Extra table names to leave out, on top of the known system tables.
    pub excluded_tables: Vec<String>,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        let mut irregular_nouns = IndexMap::new();
        irregular_nouns.insert("person".to_string(), "people".to_string());
        irregular_nouns.insert("child".to_string(), "children".to_string());
        Self {
            namespace: "Domain".to_string(),
            target: CodeTarget::CodeFirst,
            include_views: false,
            api_layer: false,
            pluralize: true,
            irregular_nouns,
            excluded_tables: Vec::new(),
        }
    }
}

impl GeneratorSettings {
    pub fn from_toml(source: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(source)?)
    }

    /// Reject combinations that cannot produce a coherent output.
    pub fn check(&self) -> Result<(), GenerateError> {
        if self.namespace.trim().is_empty() {
            return Err(GenerateError::EmptyNamespace);
        }
        if self.api_layer && !self.target.has_mapping() {
            return Err(GenerateError::ApiLayerWithoutMapping(self.target.as_str()));
        }
        Ok(())
    }

    pub fn is_excluded(&self, table_name: &str) -> bool {
        SYSTEM_TABLES
            .iter()
            .copied()
            .chain(self.excluded_tables.iter().map(String::as_str))
            .any(|t| t.eq_ignore_ascii_case(table_name))
    }

    /// Whether the relationship lookups are built and consumed.
    pub fn uses_lookups(&self) -> bool {
        self.target.has_mapping()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_toml() {
        let settings = GeneratorSettings::from_toml("").unwrap();
        assert_eq!(settings, GeneratorSettings::default());
        assert_eq!(settings.irregular_nouns.get("person").unwrap(), "people");
    }

    #[test]
    fn test_parse_toml() {
        let settings = GeneratorSettings::from_toml(
            r#"
            namespace = "Shop"
            target = "code-first"
            api-layer = true
            include-views = true
            pluralize = false
            excluded-tables = ["audit_log"]

            [irregular-nouns]
            mouse = "mice"
            "#,
        )
        .unwrap();

        assert_eq!(settings.namespace, "Shop");
        assert!(settings.api_layer);
        assert!(settings.include_views);
        assert!(!settings.pluralize);
        assert_eq!(settings.irregular_nouns.len(), 1);
        assert!(settings.is_excluded("AUDIT_LOG"));
        assert!(settings.is_excluded("sysdiagrams"));
        assert!(!settings.is_excluded("orders"));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(GeneratorSettings::from_toml("target = \"hbm\"").is_err());
    }

    #[test]
    fn test_check_rejects_bad_combinations() {
        let settings = GeneratorSettings {
            namespace: "  ".to_string(),
            ..Default::default()
        };
        assert!(matches!(settings.check(), Err(GenerateError::EmptyNamespace)));

        let settings = GeneratorSettings {
            target: CodeTarget::Poco,
            api_layer: true,
            ..Default::default()
        };
        assert!(matches!(
            settings.check(),
            Err(GenerateError::ApiLayerWithoutMapping("poco"))
        ));
    }

    #[test]
    fn test_target_from_str() {
        assert_eq!(CodeTarget::from_str("POCO"), Some(CodeTarget::Poco));
        assert_eq!(CodeTarget::from_str("codefirst"), Some(CodeTarget::CodeFirst));
        assert_eq!(CodeTarget::from_str("nhibernate"), None);
    }
}
