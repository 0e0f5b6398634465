//! Build configuration
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (schemas.toml, .schemas.toml, config/schemas.toml)
//! - The user config directory
//! - An explicit file
//! - Environment variables (SCHEMAS__*)
//!
//! ## Example config file (schemas.toml):
//! ```toml
//! [schema]
//! name = "blog"
//!
//! [conventions]
//! type_names = ["kebab-case"]
//! property_names = ["camel-case"]
//! enum_values = ["upper-case"]
//!
//! [discovery]
//! properties = true
//! object_types = true
//! ignore_types = ["^Internal"]
//! ignore_members = ["\\.Secret$"]
//!
//! [output]
//! format = "tree"
//! ```

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::build::NamingConvention;
use crate::error::Result;

/// Main configuration for a schema build
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default)]
    pub schema: SchemaSection,

    /// Naming convention chains
    #[serde(default)]
    pub conventions: ConventionsConfig,

    /// Member and type discovery filters
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaSection {
    /// Name of the produced schema
    #[serde(default = "default_schema_name")]
    pub name: String,
}

/// Naming conventions, applied left-to-right
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConventionsConfig {
    #[serde(default)]
    pub type_names: Vec<NamingConvention>,

    #[serde(default)]
    pub property_names: Vec<NamingConvention>,

    #[serde(default)]
    pub enum_values: Vec<NamingConvention>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Discover properties and enum values from catalog members
    #[serde(default = "default_true")]
    pub properties: bool,

    /// Register object types referenced by discovered properties
    #[serde(default = "default_true")]
    pub object_types: bool,

    /// Regexes over type names; matching types are never discovered
    #[serde(default)]
    pub ignore_types: Vec<String>,

    /// Regexes over `Owner.Member`; matching members are never discovered
    #[serde(default)]
    pub ignore_members: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Rendering of the finished schema
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Tree,
    Json,
    Dot,
}

// Default value functions
fn default_schema_name() -> String {
    "schema".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for SchemaSection {
    fn default() -> Self {
        Self {
            name: default_schema_name(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            properties: true,
            object_types: true,
            ignore_types: Vec::new(),
            ignore_members: Vec::new(),
        }
    }
}

impl BuildConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, layering an explicit file over the defaults
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_locations = ["schemas.toml", ".schemas.toml", "config/schemas.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("dev", "schema-forge", "schemas") {
            let xdg_config = config_dir.config_dir().join("schemas.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // SCHEMAS__SCHEMA__NAME=blog
        builder = builder.add_source(
            Environment::with_prefix("SCHEMAS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Parse a configuration from TOML text, without other sources
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
