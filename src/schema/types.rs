//! Immutable Schema Types
//!
//! Produced by realization and never mutated afterwards. References to other
//! named types are proxy tokens, dereferenced through the build's
//! `ProxyResolver` on every access.

use serde::Serialize;
use std::fmt;

use super::resolver::ProxyResolver;
use crate::error::Result;
use crate::model::{NamedKind, TypeExpr, TypeKey};

// =============================================================================
// References
// =============================================================================

/// Deferred `(kind, key)` reference to a named type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeToken {
    pub kind: NamedKind,
    pub key: TypeKey,
}

impl TypeToken {
    pub fn new(kind: NamedKind, key: TypeKey) -> Self {
        Self { kind, key }
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.key)
    }
}

/// Stable id of a realized type: its position in the schema's sorted list
/// of that kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId {
    pub kind: NamedKind,
    pub index: usize,
}

/// Target of a property or relationship. For collections the token names
/// the item type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TypeRef {
    #[serde(flatten)]
    pub token: TypeToken,
    pub collection: bool,
}

impl TypeRef {
    pub fn single(kind: NamedKind, key: TypeKey) -> Self {
        Self {
            token: TypeToken::new(kind, key),
            collection: false,
        }
    }

    pub fn collection(kind: NamedKind, item: TypeKey) -> Self {
        Self {
            token: TypeToken::new(kind, item),
            collection: true,
        }
    }
}

// =============================================================================
// Scalars & Enumerations
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ScalarType {
    pub key: TypeKey,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnumValue {
    /// Declared member name
    pub member: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnumerationType {
    pub key: TypeKey,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// In declaration order
    pub values: Vec<EnumValue>,
}

impl EnumerationType {
    pub fn find_value(&self, name: &str) -> Option<&EnumValue> {
        self.values.iter().find(|v| v.name == name)
    }
}

// =============================================================================
// Objects
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Property {
    /// Declared member name
    pub member: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Key of the object type that declares the property
    pub declaring: TypeKey,
    /// Declared type, nullable markers included
    #[serde(rename = "type")]
    pub declared: TypeExpr,
    pub required: bool,
    pub target: TypeRef,
    #[serde(skip)]
    pub(crate) resolver: ProxyResolver,
}

impl Property {
    /// Resolve the target token. Performs the lookup on every call.
    pub fn target_id(&self) -> Result<TypeId> {
        self.resolver.resolve(&self.target.token)
    }

    pub fn is_collection(&self) -> bool {
        self.target.collection
    }
}

/// The identity property of a resource type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub member: String,
    /// Final property name
    pub property: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cardinality {
    ToOne,
    ToMany,
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::ToOne => f.write_str("to-one"),
            Cardinality::ToMany => f.write_str("to-many"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Relationship {
    /// Member name of the underlying property
    pub member: String,
    /// Final name of the underlying property
    pub name: String,
    pub cardinality: Cardinality,
    pub target: TypeRef,
    #[serde(skip)]
    pub(crate) resolver: ProxyResolver,
}

impl Relationship {
    pub fn target_id(&self) -> Result<TypeId> {
        self.resolver.resolve(&self.target.token)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ObjectType {
    pub key: TypeKey,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// In registration order
    pub properties: Vec<Property>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
    pub relationships: Vec<Relationship>,
}

impl ObjectType {
    /// Resource types carry an identity and may be relationship targets
    pub fn is_resource(&self) -> bool {
        self.identity.is_some()
    }

    pub fn find_property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn find_relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.name == name)
    }

    pub fn identity_property(&self) -> Option<&Property> {
        let identity = self.identity.as_ref()?;
        self.find_property(&identity.property)
    }
}
