//! Type Descriptors
//!
//! Language-agnostic descriptions of the types a schema is built from:
//! - `ScalarKind`: the closed set of recognized scalar types
//! - `TypeExpr`: a declared member type, possibly nullable
//! - `TypeKey`: canonical identity of a type (nullable wrappers collapsed)
//!
//! Classification into `TypeKind` happens in `classify`; member discovery
//! (the stand-in for reflection) lives in `catalog`.

pub mod catalog;
pub mod classify;

pub use catalog::{
    EnumDecl, EnumValueDecl, MemberAnnotations, MemberDecl, ObjectDecl, SourceCatalog,
    TypeAnnotations, ValueAnnotations,
};
pub use classify::classify;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SchemaError};

// =============================================================================
// Scalar Kind
// =============================================================================

/// Recognized scalar types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScalarKind {
    Bool,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Decimal,
    Char,
    String,
    Guid,
    Date,
    DateTime,
    Time,
    Duration,
    Uri,
    Bytes,
}

impl ScalarKind {
    pub const ALL: [ScalarKind; 17] = [
        ScalarKind::Bool,
        ScalarKind::Byte,
        ScalarKind::Short,
        ScalarKind::Int,
        ScalarKind::Long,
        ScalarKind::Float,
        ScalarKind::Double,
        ScalarKind::Decimal,
        ScalarKind::Char,
        ScalarKind::String,
        ScalarKind::Guid,
        ScalarKind::Date,
        ScalarKind::DateTime,
        ScalarKind::Time,
        ScalarKind::Duration,
        ScalarKind::Uri,
        ScalarKind::Bytes,
    ];

    /// The natural name, used as the default schema name
    pub fn natural_name(&self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Byte => "byte",
            ScalarKind::Short => "short",
            ScalarKind::Int => "int",
            ScalarKind::Long => "long",
            ScalarKind::Float => "float",
            ScalarKind::Double => "double",
            ScalarKind::Decimal => "decimal",
            ScalarKind::Char => "char",
            ScalarKind::String => "string",
            ScalarKind::Guid => "guid",
            ScalarKind::Date => "date",
            ScalarKind::DateTime => "date-time",
            ScalarKind::Time => "time",
            ScalarKind::Duration => "duration",
            ScalarKind::Uri => "uri",
            ScalarKind::Bytes => "bytes",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.natural_name() == name)
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.natural_name())
    }
}

// =============================================================================
// Type Key
// =============================================================================

/// Canonical identity of a type.
///
/// Two configurations for the same key always merge. A key is never nullable:
/// `TypeExpr::key` strips nullable wrappers at every depth.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeKey {
    Scalar(ScalarKind),
    Named(String),
    List(Box<TypeKey>),
}

impl TypeKey {
    pub fn named(name: impl Into<String>) -> Self {
        TypeKey::Named(name.into())
    }

    /// Natural name of the type, before any naming convention
    pub fn natural_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKey::Scalar(kind) => write!(f, "{}", kind),
            TypeKey::Named(name) => f.write_str(name),
            TypeKey::List(item) => write!(f, "[{}]", item),
        }
    }
}

impl From<ScalarKind> for TypeKey {
    fn from(kind: ScalarKind) -> Self {
        TypeKey::Scalar(kind)
    }
}

impl Serialize for TypeKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// =============================================================================
// Type Expression
// =============================================================================

/// A declared type, as written on a member.
///
/// Textual syntax: `int`, `string?`, `Person`, `[Comment]`, `[[int]]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeExpr {
    Scalar(ScalarKind),
    Named(String),
    Nullable(Box<TypeExpr>),
    List(Box<TypeExpr>),
}

impl TypeExpr {
    pub fn named(name: impl Into<String>) -> Self {
        TypeExpr::Named(name.into())
    }

    pub fn list(item: TypeExpr) -> Self {
        TypeExpr::List(Box::new(item))
    }

    /// Wrap in a nullable marker (idempotent)
    pub fn nullable(self) -> Self {
        match self {
            TypeExpr::Nullable(_) => self,
            other => TypeExpr::Nullable(Box::new(other)),
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, TypeExpr::Nullable(_))
    }

    /// Canonical key with every nullable wrapper collapsed
    pub fn key(&self) -> TypeKey {
        match self {
            TypeExpr::Scalar(kind) => TypeKey::Scalar(*kind),
            TypeExpr::Named(name) => TypeKey::Named(name.clone()),
            TypeExpr::Nullable(inner) => inner.key(),
            TypeExpr::List(item) => TypeKey::List(Box::new(item.key())),
        }
    }
}

impl From<ScalarKind> for TypeExpr {
    fn from(kind: ScalarKind) -> Self {
        TypeExpr::Scalar(kind)
    }
}

impl From<TypeKey> for TypeExpr {
    fn from(key: TypeKey) -> Self {
        match key {
            TypeKey::Scalar(kind) => TypeExpr::Scalar(kind),
            TypeKey::Named(name) => TypeExpr::Named(name),
            TypeKey::List(item) => TypeExpr::List(Box::new((*item).into())),
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Scalar(kind) => write!(f, "{}", kind),
            TypeExpr::Named(name) => f.write_str(name),
            TypeExpr::Nullable(inner) => write!(f, "{}?", inner),
            TypeExpr::List(item) => write!(f, "[{}]", item),
        }
    }
}

impl FromStr for TypeExpr {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self> {
        parse_type_expr(s.trim(), s)
    }
}

fn parse_type_expr(s: &str, original: &str) -> Result<TypeExpr> {
    let invalid = |reason: &str| SchemaError::InvalidTypeExpr {
        expr: original.to_string(),
        reason: reason.to_string(),
    };

    if s.is_empty() {
        return Err(invalid("empty type"));
    }

    if let Some(inner) = s.strip_suffix('?') {
        if inner.ends_with('?') {
            return Err(invalid("repeated nullable marker"));
        }
        return Ok(parse_type_expr(inner.trim_end(), original)?.nullable());
    }

    if let Some(rest) = s.strip_prefix('[') {
        let inner = rest
            .strip_suffix(']')
            .ok_or_else(|| invalid("unbalanced brackets"))?;
        return Ok(TypeExpr::list(parse_type_expr(inner.trim(), original)?));
    }

    if let Some(kind) = ScalarKind::from_name(s) {
        return Ok(TypeExpr::Scalar(kind));
    }

    let mut chars = s.chars();
    let valid_start = chars
        .next()
        .map(|c| c.is_alphabetic() || c == '_')
        .unwrap_or(false);
    if !valid_start || !chars.all(|c| c.is_alphanumeric() || c == '_' || c == '.') {
        return Err(invalid("not a scalar name or type identifier"));
    }

    Ok(TypeExpr::Named(s.to_string()))
}

impl TryFrom<String> for TypeExpr {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TypeExpr> for String {
    fn from(value: TypeExpr) -> Self {
        value.to_string()
    }
}

// =============================================================================
// Kinds
// =============================================================================

/// Kind of a type that can appear in the finished schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedKind {
    Enumeration,
    Object,
    Scalar,
}

impl fmt::Display for NamedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamedKind::Enumeration => f.write_str("enumeration"),
            NamedKind::Object => f.write_str("object"),
            NamedKind::Scalar => f.write_str("scalar"),
        }
    }
}

/// Result of classifying a type key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Scalar,
    Enumeration,
    Object,
    /// Ordered collection; the item key never classifies as a collection
    Collection(TypeKey),
}

impl TypeKind {
    /// Named kind for non-collection kinds
    pub fn named(&self) -> Option<NamedKind> {
        match self {
            TypeKind::Scalar => Some(NamedKind::Scalar),
            TypeKind::Enumeration => Some(NamedKind::Enumeration),
            TypeKind::Object => Some(NamedKind::Object),
            TypeKind::Collection(_) => None,
        }
    }
}
