//! Schema Forge
//!
//! Compiles layered, possibly conflicting type configuration into one
//! immutable schema of enumeration, object and scalar types.
//!
//! ## Features
//!
//! - **Precedence Levels**: conventions < annotations < type configurations < fluent calls
//! - **Deferred Modifiers**: configuration is recorded, then replayed once per type
//! - **Reconciliation**: unused scalars/enumerations dropped, implicit ones added
//! - **Forward References**: properties and relationships resolve through a shared table
//! - **Diagnostics**: non-fatal build events through a pluggable sink
//!
//! ## Architecture
//!
//! ```text
//! model/      type expressions, keys, classifier, source catalog
//! build/      precedence stack, modifiers, registry, conventions, finalizer
//! schema/     immutable types, proxy resolver, analysis, comparison
//! ```
//!
//! ## Example
//!
//! ```ignore
//! let mut builder = SchemaBuilder::new("blog").with_catalog(SourceCatalog::load(path)?);
//! builder.object("Article").identity("Id");
//! let schema = builder.build()?;
//! println!("{}", schema);
//! ```

pub mod build;
pub mod checksum;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod model;
pub mod schema;

pub use build::{
    DiscoverySettings, NameChain, NamingConvention, NamingConventions, PrecedenceLevel,
    SchemaBuilder, TypeConfiguration,
};
pub use checksum::Checksum;
pub use config::BuildConfig;
pub use diagnostics::{CollectingSink, DiagnosticCode, DiagnosticItem, Diagnostics, DiagnosticsSink, TracingSink};
pub use error::{Result, SchemaError};
pub use model::{
    EnumDecl, MemberDecl, NamedKind, ObjectDecl, ScalarKind, SourceCatalog, TypeExpr, TypeKey,
    TypeKind,
};
pub use schema::{
    Cardinality, EnumerationType, NamedTypeRef, ObjectType, Property, ProxyResolver, Relationship,
    ScalarType, Schema, TypeId, TypeRef,
};
