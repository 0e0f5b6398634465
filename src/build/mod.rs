//! Schema Build Pipeline
//!
//! Configuration calls record deferred modifiers against pending type
//! configurations; nothing is mutated until `SchemaBuilder::build`:
//!
//! ```text
//! fluent calls ─┐
//! type configs ─┼─► TypeRegistry (pending configs + modifier lists)
//! annotations  ─┤          │
//! conventions  ─┘          ▼
//!                  finalize: objects ─► enumerations ─► scalars ─► Schema
//!                                                                   │
//!                                            ProxyResolver::initialize
//! ```
//!
//! Every edit is tagged with the precedence level active when it was
//! recorded; realization replays each type's edits lowest level first.

pub mod configure;
pub mod conventions;
pub mod discovery;
pub mod finalize;
pub mod modifier;
pub mod mutable;
pub mod precedence;
pub mod registry;

pub use configure::{
    EnumTypeBuilder, EnumValueBuilder, ObjectTypeBuilder, PropertyBuilder, ScalarTypeBuilder,
    TypeConfiguration,
};
pub use conventions::{DiscoverySettings, NameChain, NamingConvention, NamingConventions};
pub use modifier::DeferredModifiers;
pub use precedence::{PrecedenceLevel, PrecedenceScope, PrecedenceStack};
pub use registry::{Reconciliation, TypeRegistry};

use std::rc::Rc;

use crate::config::BuildConfig;
use crate::diagnostics::{DiagnosticCode, DiagnosticItem, DiagnosticsSink, TracingSink};
use crate::error::{Result, SchemaError};
use crate::model::{classify, NamedKind, ScalarKind, SourceCatalog, TypeExpr, TypeKey, TypeKind};
use crate::schema::Schema;

// =============================================================================
// Build Context
// =============================================================================

/// Collaborators shared by the configuration surfaces and the finalizer
pub(crate) struct BuildContext {
    pub(crate) catalog: SourceCatalog,
    pub(crate) conventions: NamingConventions,
    pub(crate) discovery: DiscoverySettings,
    pub(crate) precedence: PrecedenceStack,
    pub(crate) sink: Rc<dyn DiagnosticsSink>,
}

/// What a member's declared type points at once collections are unwrapped
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MemberTarget {
    pub(crate) kind: NamedKind,
    /// The item key for collections
    pub(crate) key: TypeKey,
    pub(crate) collection: bool,
}

impl BuildContext {
    pub(crate) fn report(&self, item: DiagnosticItem) {
        self.sink.report(item);
    }

    /// Classify with both the catalog's and the registry's enumerations
    pub(crate) fn classify(&self, registry: &TypeRegistry, key: &TypeKey) -> Result<TypeKind> {
        classify(key, &|name| {
            self.catalog.is_enumeration(name) || registry.is_enumeration(name)
        })
    }

    pub(crate) fn target_of(&self, registry: &TypeRegistry, key: &TypeKey) -> Result<MemberTarget> {
        match self.classify(registry, key)? {
            TypeKind::Collection(item) => {
                let kind = self.classify(registry, &item)?.named().ok_or_else(|| {
                    SchemaError::NestedCollection { ty: key.to_string() }
                })?;
                Ok(MemberTarget {
                    kind,
                    key: item,
                    collection: true,
                })
            }
            other => {
                let kind = other.named().ok_or_else(|| {
                    SchemaError::Internal(format!("`{}` classified as an unnamed kind", key))
                })?;
                Ok(MemberTarget {
                    kind,
                    key: key.clone(),
                    collection: false,
                })
            }
        }
    }
}

/// Attach the owning type and member to a classification failure
pub(crate) fn property_error(err: SchemaError, owner: &str, property: &str) -> SchemaError {
    match err {
        SchemaError::NestedCollection { ty } => SchemaError::NestedCollectionProperty {
            owner: owner.to_string(),
            property: property.to_string(),
            ty,
        },
        other => other,
    }
}

// =============================================================================
// Schema Builder
// =============================================================================

/// Entry point: collects configuration from every surface, then builds
/// the immutable schema once.
pub struct SchemaBuilder {
    name: String,
    registry: TypeRegistry,
    ctx: BuildContext,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registry: TypeRegistry::new(),
            ctx: BuildContext {
                catalog: SourceCatalog::new(),
                conventions: NamingConventions::new(),
                discovery: DiscoverySettings::new(),
                precedence: PrecedenceStack::new(),
                sink: Rc::new(TracingSink),
            },
        }
    }

    /// Builder with name, conventions and discovery filters from a config file
    pub fn from_config(config: &BuildConfig) -> Result<Self> {
        Ok(Self::new(config.schema.name.clone())
            .with_conventions(NamingConventions::from_config(&config.conventions))
            .with_discovery(DiscoverySettings::from_config(&config.discovery)?))
    }

    pub fn with_catalog(mut self, catalog: SourceCatalog) -> Self {
        self.ctx.catalog = catalog;
        self
    }

    pub fn with_conventions(mut self, conventions: NamingConventions) -> Self {
        self.ctx.conventions = conventions;
        self
    }

    pub fn with_discovery(mut self, discovery: DiscoverySettings) -> Self {
        self.ctx.discovery = discovery;
        self
    }

    pub fn with_diagnostics(mut self, sink: impl DiagnosticsSink + 'static) -> Self {
        self.ctx.sink = Rc::new(sink);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn catalog(&self) -> &SourceCatalog {
        &self.ctx.catalog
    }

    /// Level that configuration calls are currently recorded at
    pub fn precedence_level(&self) -> PrecedenceLevel {
        self.ctx.precedence.current()
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    fn note_added(&self, kind: NamedKind, key: &TypeKey) {
        if !self.registry.contains(kind, key) {
            self.ctx.report(
                DiagnosticItem::new(key.to_string(), DiagnosticCode::TypeAdded, format!("{} type configured", kind))
                    .with_context(format!("level: {}", self.ctx.precedence.current())),
            );
        }
    }

    // ========== Configuration surfaces ==========

    /// Configure an object type
    pub fn object(&mut self, name: &str) -> ObjectTypeBuilder<'_> {
        let key = TypeKey::named(name);
        self.note_added(NamedKind::Object, &key);
        ObjectTypeBuilder::new(
            self.registry.get_or_add_object(&key),
            self.ctx.precedence.clone(),
        )
    }

    /// Configure an enumeration type
    pub fn enumeration(&mut self, name: &str) -> EnumTypeBuilder<'_> {
        let key = TypeKey::named(name);
        self.note_added(NamedKind::Enumeration, &key);
        EnumTypeBuilder::new(
            self.registry.get_or_add_enumeration(&key),
            self.ctx.precedence.clone(),
        )
    }

    /// Configure a scalar type
    pub fn scalar(&mut self, kind: ScalarKind) -> ScalarTypeBuilder<'_> {
        let key = TypeKey::from(kind);
        self.note_added(NamedKind::Scalar, &key);
        ScalarTypeBuilder::new(
            self.registry.get_or_add_scalar(&key),
            self.ctx.precedence.clone(),
        )
    }

    /// Run a type configuration with the `TypeConfiguration` level active
    pub fn apply_configuration(&mut self, configuration: &dyn TypeConfiguration) -> &mut Self {
        let _scope = self.ctx.precedence.enter(PrecedenceLevel::TypeConfiguration);
        configuration.configure(self);
        self
    }

    /// Exclude a type from the schema. Collections exclude their item type.
    /// The key is excluded from every kind, so the exclusion holds whatever
    /// the type is later configured as. Excluding an already excluded type
    /// is a no-op.
    pub fn exclude(&mut self, ty: impl Into<TypeExpr>) -> Result<&mut Self> {
        let key = ty.into().key();
        let target = self.ctx.target_of(&self.registry, &key)?;
        if self.registry.exclude(target.key.clone()) {
            self.ctx.report(
                DiagnosticItem::new(target.key.to_string(), DiagnosticCode::TypeExcluded, "type excluded")
                    .with_context(format!("level: {}", self.ctx.precedence.current())),
            );
        }
        Ok(self)
    }

    /// Register every object type the catalog declares and the discovery
    /// settings accept
    pub fn objects_from_catalog(&mut self) -> &mut Self {
        let keys: Vec<TypeKey> = self
            .ctx
            .catalog
            .objects
            .iter()
            .map(|decl| TypeKey::named(decl.name.as_str()))
            .filter(|key| self.ctx.discovery.accepts_type(key))
            .collect();
        for key in keys {
            self.note_added(NamedKind::Object, &key);
            self.registry.get_or_add_object(&key);
        }
        self
    }

    /// Merge another builder's configuration into this one. Configurations
    /// for the same type concatenate their modifiers; exclusions are unioned.
    ///
    /// Catalog declarations identical to ones already known are skipped;
    /// conflicting declarations of one name are an error.
    pub fn merge(&mut self, other: SchemaBuilder) -> Result<&mut Self> {
        let mut incoming = SourceCatalog::new();
        for decl in other.ctx.catalog.objects {
            if self.ctx.catalog.object(&decl.name) != Some(&decl) {
                incoming.objects.push(decl);
            }
        }
        for decl in other.ctx.catalog.enums {
            if self.ctx.catalog.enumeration(&decl.name) != Some(&decl) {
                incoming.enums.push(decl);
            }
        }
        self.ctx.catalog.merge(incoming)?;
        self.registry.merge(other.registry);
        Ok(self)
    }

    /// Run the finalizer and produce the immutable schema
    pub fn build(self) -> Result<Schema> {
        finalize::finalize(self.name, &self.ctx, self.registry)
    }
}
