//! Mutable Scratch Types
//!
//! Transient records that deferred modifiers are replayed against. One
//! instance per type key per build, created by the kind's factory and
//! discarded once the immutable type is produced.

use crate::model::{NamedKind, TypeExpr, TypeKey};

/// Factory for the scratch record of one named kind
pub trait MutableNamedType: Sized {
    const KIND: NamedKind;

    /// Default instance: natural name, nothing else configured
    fn create(key: &TypeKey) -> Self;

    fn name(&self) -> &str;
}

/// Factory for the scratch record of a type member (property, enum value)
pub trait MutableMember: Sized {
    fn create(member: &str) -> Self;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutableObjectType {
    pub name: String,
    pub description: Option<String>,
    /// Member name (or final name) of the identity property
    pub identity: Option<String>,
}

impl MutableNamedType for MutableObjectType {
    const KIND: NamedKind = NamedKind::Object;

    fn create(key: &TypeKey) -> Self {
        Self {
            name: key.natural_name(),
            description: None,
            identity: None,
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutableProperty {
    pub member: String,
    pub name: String,
    pub description: Option<String>,
    /// Declared type; every property registration records one
    pub declared: Option<TypeExpr>,
    pub required: bool,
    pub relationship: bool,
    pub ignored: bool,
}

impl MutableMember for MutableProperty {
    fn create(member: &str) -> Self {
        Self {
            member: member.to_string(),
            name: member.to_string(),
            description: None,
            declared: None,
            required: false,
            relationship: false,
            ignored: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutableEnumType {
    pub name: String,
    pub description: Option<String>,
}

impl MutableNamedType for MutableEnumType {
    const KIND: NamedKind = NamedKind::Enumeration;

    fn create(key: &TypeKey) -> Self {
        Self {
            name: key.natural_name(),
            description: None,
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutableEnumValue {
    pub member: String,
    pub name: String,
    pub description: Option<String>,
    pub ignored: bool,
}

impl MutableMember for MutableEnumValue {
    fn create(member: &str) -> Self {
        Self {
            member: member.to_string(),
            name: member.to_string(),
            description: None,
            ignored: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutableScalarType {
    pub name: String,
    pub description: Option<String>,
}

impl MutableNamedType for MutableScalarType {
    const KIND: NamedKind = NamedKind::Scalar;

    fn create(key: &TypeKey) -> Self {
        Self {
            name: key.natural_name(),
            description: None,
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
