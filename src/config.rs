//! Configuration for the schema model tooling
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (schema-model.toml)
//! - Environment variables (SCHEMA_MODEL__*)
//!
//! ## Example config file (schema-model.toml):
//! ```toml
//! [editor]
//! default_field_type = "string"
//! default_combination_kind = "anyOf"
//! definition_prefix = "name"
//!
//! [output]
//! format = "pretty"
//!
//! [validation]
//! strict_json_schema = false
//! check_invariants = true
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::node::{CombinationKind, FieldType};

const CONFIG_LOCATIONS: [&str; 3] = [
    "schema-model.toml",
    ".schema-model.toml",
    "config/schema-model.toml",
];

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ModelConfig {
    #[serde(default)]
    pub editor: EditorConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub validation: ValidationConfig,
}

/// Defaults used when editing a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Type given to fields added without an explicit type
    #[serde(default)]
    pub default_field_type: FieldType,

    /// Keyword given to new combinations
    #[serde(default)]
    pub default_combination_kind: CombinationKind,

    /// Prefix for generated definition names (`name0`, `name1`, ...)
    #[serde(default = "default_definition_prefix")]
    pub definition_prefix: String,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

/// Validation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Compile documents with the `jsonschema` crate before conversion
    #[serde(default)]
    pub strict_json_schema: bool,

    /// Run the invariant validator after every edit
    #[serde(default = "default_true")]
    pub check_invariants: bool,
}

fn default_true() -> bool {
    true
}

fn default_definition_prefix() -> String {
    "name".to_string()
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_field_type: FieldType::default(),
            default_combination_kind: CombinationKind::default(),
            definition_prefix: default_definition_prefix(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            strict_json_schema: false,
            check_invariants: true,
        }
    }
}

impl OutputFormat {
    /// Render a JSON value in this format
    pub fn render(&self, value: &Value) -> serde_json::Result<String> {
        match self {
            OutputFormat::Pretty => serde_json::to_string_pretty(value),
            OutputFormat::Compact => serde_json::to_string(value),
        }
    }
}

impl ModelConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering `config_path` over the default locations
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        for location in CONFIG_LOCATIONS {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(dirs) = directories::ProjectDirs::from("dev", "familiar", "schema-model") {
            let user_config = dirs.config_dir().join("schema-model.toml");
            if user_config.exists() {
                builder = builder.add_source(File::from(user_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("SCHEMA_MODEL")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}
