//! Source Catalog
//!
//! Declarations of object and enum types with their members and attached
//! annotations. This is what member discovery reads: a type's candidate
//! members, their declared types, and any declarative metadata (name
//! overrides, required flags, identity and relationship markers).
//!
//! Catalogs are built in code or loaded from JSON/TOML files:
//!
//! ```json
//! {
//!   "objects": [
//!     { "name": "Person", "members": [
//!         { "name": "Id", "type": "int", "annotations": { "identity": true } },
//!         { "name": "Name", "type": "string" }
//!     ] }
//!   ],
//!   "enums": [ { "name": "Color", "values": ["Red", "Green"] } ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use super::TypeExpr;
use crate::error::{Result, SchemaError};

// =============================================================================
// Annotations
// =============================================================================

/// Declarative metadata attached to a type declaration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeAnnotations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Exclude the type from the schema
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ignore: bool,
}

/// Declarative metadata attached to an object member
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberAnnotations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub identity: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub relationship: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ignore: bool,
}

impl MemberAnnotations {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Declarative metadata attached to an enum value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueAnnotations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ignore: bool,
}

// =============================================================================
// Declarations
// =============================================================================

/// A member of an object declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    #[serde(default, skip_serializing_if = "MemberAnnotations::is_empty")]
    pub annotations: MemberAnnotations,
}

impl MemberDecl {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeExpr>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            annotations: MemberAnnotations::default(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.annotations.name = Some(name.into());
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.annotations.description = Some(description.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.annotations.required = Some(required);
        self
    }

    pub fn identity(mut self) -> Self {
        self.annotations.identity = true;
        self
    }

    pub fn relationship(mut self) -> Self {
        self.annotations.relationship = true;
        self
    }

    pub fn ignored(mut self) -> Self {
        self.annotations.ignore = true;
        self
    }
}

/// An object type declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDecl {
    pub name: String,
    #[serde(default)]
    pub annotations: TypeAnnotations,
    #[serde(default)]
    pub members: Vec<MemberDecl>,
}

impl ObjectDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotations: TypeAnnotations::default(),
            members: Vec::new(),
        }
    }

    pub fn member(mut self, member: MemberDecl) -> Self {
        self.members.push(member);
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.annotations.name = Some(name.into());
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.annotations.description = Some(description.into());
        self
    }

    pub fn ignored(mut self) -> Self {
        self.annotations.ignore = true;
        self
    }

    pub fn find_member(&self, name: &str) -> Option<&MemberDecl> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// A value of an enum declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EnumValueRepr")]
pub struct EnumValueDecl {
    pub name: String,
    #[serde(default)]
    pub annotations: ValueAnnotations,
}

/// Enum values may be written as a bare string or a full table
#[derive(Deserialize)]
#[serde(untagged)]
enum EnumValueRepr {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        annotations: ValueAnnotations,
    },
}

impl From<EnumValueRepr> for EnumValueDecl {
    fn from(repr: EnumValueRepr) -> Self {
        match repr {
            EnumValueRepr::Name(name) => EnumValueDecl::new(name),
            EnumValueRepr::Full { name, annotations } => EnumValueDecl { name, annotations },
        }
    }
}

impl EnumValueDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotations: ValueAnnotations::default(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.annotations.name = Some(name.into());
        self
    }

    pub fn ignored(mut self) -> Self {
        self.annotations.ignore = true;
        self
    }
}

/// An enum type declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDecl {
    pub name: String,
    #[serde(default)]
    pub annotations: TypeAnnotations,
    #[serde(default)]
    pub values: Vec<EnumValueDecl>,
}

impl EnumDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotations: TypeAnnotations::default(),
            values: Vec::new(),
        }
    }

    pub fn value(mut self, value: impl Into<EnumValueDecl>) -> Self {
        self.values.push(value.into());
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.annotations.name = Some(name.into());
        self
    }
}

impl From<&str> for EnumValueDecl {
    fn from(name: &str) -> Self {
        EnumValueDecl::new(name)
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Configuration for catalog loading
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Skip files matching these path prefixes (relative to the root)
    pub skip_prefixes: Vec<String>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            skip_prefixes: vec![
                "target/".to_string(),
                ".git/".to_string(),
                "node_modules/".to_string(),
            ],
        }
    }
}

/// All type declarations member discovery can see
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCatalog {
    #[serde(default)]
    pub objects: Vec<ObjectDecl>,
    #[serde(default)]
    pub enums: Vec<EnumDecl>,
}

impl SourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(mut self, object: ObjectDecl) -> Self {
        self.objects.push(object);
        self
    }

    pub fn with_enum(mut self, decl: EnumDecl) -> Self {
        self.enums.push(decl);
        self
    }

    pub fn object(&self, name: &str) -> Option<&ObjectDecl> {
        self.objects.iter().find(|o| o.name == name)
    }

    pub fn enumeration(&self, name: &str) -> Option<&EnumDecl> {
        self.enums.iter().find(|e| e.name == name)
    }

    /// Whether `name` carries the enumeration marker
    pub fn is_enumeration(&self, name: &str) -> bool {
        self.enumeration(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.enums.is_empty()
    }

    /// Merge another catalog into this one. A type may be declared once.
    pub fn merge(&mut self, other: SourceCatalog) -> Result<()> {
        for object in other.objects {
            if self.object(&object.name).is_some() || self.is_enumeration(&object.name) {
                return Err(SchemaError::DuplicateDeclaration { name: object.name });
            }
            self.objects.push(object);
        }
        for decl in other.enums {
            if self.object(&decl.name).is_some() || self.is_enumeration(&decl.name) {
                return Err(SchemaError::DuplicateDeclaration { name: decl.name });
            }
            self.enums.push(decl);
        }
        Ok(())
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let catalog: SourceCatalog = serde_json::from_str(content)?;
        catalog.check_unique()?;
        Ok(catalog)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let catalog: SourceCatalog = toml::from_str(content)?;
        catalog.check_unique()?;
        Ok(catalog)
    }

    /// Load a single `.json` or `.toml` catalog file
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            _ => Self::from_json_str(&content),
        }
    }

    /// Load a file, or every catalog file below a directory
    pub fn load(path: &Path) -> Result<Self> {
        if path.is_dir() {
            Self::load_from_directory(path, &LoadConfig::default())
        } else {
            Self::load_file(path)
        }
    }

    /// Walk a directory and merge every `.json`/`.toml` catalog file found.
    /// Files are visited in sorted order so merges are deterministic.
    pub fn load_from_directory(dir: &Path, config: &LoadConfig) -> Result<Self> {
        let mut catalog = SourceCatalog::new();

        for entry in WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let is_catalog = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e == "json" || e == "toml")
                .unwrap_or(false);
            if !is_catalog {
                continue;
            }

            let relative = path.strip_prefix(dir).unwrap_or(path);
            let relative_str = relative.to_string_lossy().replace('\\', "/");
            if config.skip_prefixes.iter().any(|p| relative_str.starts_with(p)) {
                continue;
            }

            tracing::debug!(file = %relative_str, "loading catalog file");
            catalog.merge(Self::load_file(path)?)?;
        }

        Ok(catalog)
    }

    fn check_unique(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        let names = self
            .objects
            .iter()
            .map(|o| &o.name)
            .chain(self.enums.iter().map(|e| &e.name));
        for name in names {
            if !seen.insert(name) {
                return Err(SchemaError::DuplicateDeclaration { name: name.clone() });
            }
        }
        Ok(())
    }
}
