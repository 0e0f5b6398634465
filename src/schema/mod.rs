//! Immutable Schema
//!
//! The output of a build: named, sorted collections of enumeration, object
//! and scalar types plus the proxy resolver their properties and
//! relationships dereference through. A `Schema` is never mutated after the
//! finalizer hands it out, so it can be shared across threads freely.

pub mod analysis;
pub mod compare;
pub mod resolver;
pub mod types;

pub use resolver::ProxyResolver;
pub use types::{
    Cardinality, EnumValue, EnumerationType, Identity, ObjectType, Property, Relationship,
    ScalarType, TypeId, TypeRef, TypeToken,
};

use serde::Serialize;
use std::fmt;
use std::fmt::Write as _;

use crate::checksum::Checksum;
use crate::error::{Result, SchemaError};
use crate::model::{NamedKind, TypeKey};

// =============================================================================
// Named Type Reference
// =============================================================================

/// A borrowed realized type of any kind
#[derive(Debug, Clone, Copy)]
pub enum NamedTypeRef<'a> {
    Enumeration(&'a EnumerationType),
    Object(&'a ObjectType),
    Scalar(&'a ScalarType),
}

impl<'a> NamedTypeRef<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            NamedTypeRef::Enumeration(ty) => &ty.name,
            NamedTypeRef::Object(ty) => &ty.name,
            NamedTypeRef::Scalar(ty) => &ty.name,
        }
    }

    pub fn key(&self) -> &'a TypeKey {
        match self {
            NamedTypeRef::Enumeration(ty) => &ty.key,
            NamedTypeRef::Object(ty) => &ty.key,
            NamedTypeRef::Scalar(ty) => &ty.key,
        }
    }

    pub fn kind(&self) -> NamedKind {
        match self {
            NamedTypeRef::Enumeration(_) => NamedKind::Enumeration,
            NamedTypeRef::Object(_) => NamedKind::Object,
            NamedTypeRef::Scalar(_) => NamedKind::Scalar,
        }
    }

    pub fn as_object(&self) -> Option<&'a ObjectType> {
        match self {
            NamedTypeRef::Object(ty) => Some(ty),
            _ => None,
        }
    }
}

// =============================================================================
// Schema
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Schema {
    name: String,
    enumerations: Vec<EnumerationType>,
    objects: Vec<ObjectType>,
    scalars: Vec<ScalarType>,
    #[serde(skip)]
    resolver: ProxyResolver,
}

impl Schema {
    /// Assemble a schema. Each list must already be sorted; the resolver is
    /// initialized separately, once the schema exists.
    pub(crate) fn new(
        name: impl Into<String>,
        enumerations: Vec<EnumerationType>,
        objects: Vec<ObjectType>,
        scalars: Vec<ScalarType>,
        resolver: ProxyResolver,
    ) -> Self {
        Self {
            name: name.into(),
            enumerations,
            objects,
            scalars,
            resolver,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn enumerations(&self) -> &[EnumerationType] {
        &self.enumerations
    }

    pub fn objects(&self) -> &[ObjectType] {
        &self.objects
    }

    pub fn scalars(&self) -> &[ScalarType] {
        &self.scalars
    }

    pub fn resolver(&self) -> &ProxyResolver {
        &self.resolver
    }

    // ========== Lookups ==========

    pub fn find_object(&self, name: &str) -> Option<&ObjectType> {
        self.objects.iter().find(|t| t.name == name)
    }

    pub fn find_enumeration(&self, name: &str) -> Option<&EnumerationType> {
        self.enumerations.iter().find(|t| t.name == name)
    }

    pub fn find_scalar(&self, name: &str) -> Option<&ScalarType> {
        self.scalars.iter().find(|t| t.name == name)
    }

    pub fn object_by_key(&self, key: &TypeKey) -> Option<&ObjectType> {
        let id = self
            .resolver
            .resolve(&TypeToken::new(NamedKind::Object, key.clone()))
            .ok()?;
        self.objects.get(id.index)
    }

    /// Dereference a type id
    pub fn get(&self, id: TypeId) -> Option<NamedTypeRef<'_>> {
        match id.kind {
            NamedKind::Enumeration => self.enumerations.get(id.index).map(NamedTypeRef::Enumeration),
            NamedKind::Object => self.objects.get(id.index).map(NamedTypeRef::Object),
            NamedKind::Scalar => self.scalars.get(id.index).map(NamedTypeRef::Scalar),
        }
    }

    /// Resolve a property or relationship target (the item type for
    /// collections)
    pub fn resolve(&self, target: &TypeRef) -> Result<NamedTypeRef<'_>> {
        let id = self.resolver.resolve(&target.token)?;
        self.get(id).ok_or_else(|| {
            SchemaError::Internal(format!("type id {:?} out of range for {}", id, target.token))
        })
    }

    pub fn resolve_property(&self, property: &Property) -> Result<NamedTypeRef<'_>> {
        let id = property.target_id()?;
        self.get(id)
            .ok_or_else(|| SchemaError::Internal(format!("type id {:?} out of range", id)))
    }

    /// The object type a relationship points at
    pub fn resolve_relationship(&self, relationship: &Relationship) -> Result<&ObjectType> {
        let id = relationship.target_id()?;
        self.get(id)
            .and_then(|ty| ty.as_object())
            .ok_or_else(|| {
                SchemaError::Internal(format!(
                    "relationship `{}` does not target an object type",
                    relationship.name
                ))
            })
    }

    // ========== Rendering ==========

    /// Deterministic tree rendering
    pub fn render_tree(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = self.write_tree(&mut out);
        out
    }

    fn write_tree(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "schema {}", self.name)?;

        writeln!(out, "├── enumerations ({})", self.enumerations.len())?;
        for (i, ty) in self.enumerations.iter().enumerate() {
            let last = i + 1 == self.enumerations.len();
            writeln!(out, "│   {} {} [{}]", branch(last), ty.name, ty.key)?;
            let indent = format!("│   {}   ", if last { " " } else { "│" });
            write_description(out, &indent, &ty.description)?;
            for value in &ty.values {
                writeln!(out, "{}· {}", indent, value.name)?;
            }
        }

        writeln!(out, "├── objects ({})", self.objects.len())?;
        for (i, ty) in self.objects.iter().enumerate() {
            let last = i + 1 == self.objects.len();
            writeln!(out, "│   {} {} [{}]", branch(last), ty.name, ty.key)?;
            let indent = format!("│   {}   ", if last { " " } else { "│" });
            write_description(out, &indent, &ty.description)?;
            if let Some(identity) = &ty.identity {
                writeln!(out, "{}identity: {}", indent, identity.property)?;
            }
            for property in &ty.properties {
                writeln!(
                    out,
                    "{}· {}: {}{}",
                    indent,
                    property.name,
                    self.target_label(&property.target),
                    if property.required { " (required)" } else { "" }
                )?;
            }
            for relationship in &ty.relationships {
                writeln!(
                    out,
                    "{}→ {} {} {}",
                    indent,
                    relationship.name,
                    relationship.cardinality,
                    self.target_label(&relationship.target)
                )?;
            }
        }

        writeln!(out, "└── scalars ({})", self.scalars.len())?;
        for (i, ty) in self.scalars.iter().enumerate() {
            let last = i + 1 == self.scalars.len();
            writeln!(out, "    {} {} [{}]", branch(last), ty.name, ty.key)?;
        }

        Ok(())
    }

    fn target_label(&self, target: &TypeRef) -> String {
        let name = match self.resolve(target) {
            Ok(ty) => ty.name().to_string(),
            Err(_) => format!("<unresolved {}>", target.token),
        };
        if target.collection {
            format!("[{}]", name)
        } else {
            name
        }
    }

    /// Pretty JSON rendering
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checksum of the tree rendering
    pub fn fingerprint(&self) -> Checksum {
        Checksum::from_str(&self.render_tree())
    }

    /// Whether this schema's tree rendering hashes to `expected`
    pub fn matches_fingerprint(&self, expected: &Checksum) -> bool {
        expected.verify(&self.render_tree())
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_tree())
    }
}

fn branch(last: bool) -> &'static str {
    if last {
        "└──"
    } else {
        "├──"
    }
}

fn write_description(out: &mut String, indent: &str, description: &Option<String>) -> fmt::Result {
    if let Some(description) = description {
        writeln!(out, "{}\"{}\"", indent, description)?;
    }
    Ok(())
}
