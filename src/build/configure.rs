//! Fluent API and Type Configurations
//!
//! Every method records a deferred modifier at the level active when it is
//! called (`FluentApi` directly on a builder, `TypeConfiguration` inside
//! `SchemaBuilder::apply_configuration`). The call site is kept as the
//! modifier's origin for error messages.
//!
//! ```ignore
//! let mut builder = SchemaBuilder::new("blog");
//! let mut article = builder.object("Article");
//! article.identity("Id");
//! article.property("Id", ScalarKind::Guid);
//! article.property("Author", TypeExpr::named("Person")).required(true).relationship();
//! ```

use std::panic::Location;

use super::modifier::DeferredModifiers;
use super::mutable::{MutableEnumValue, MutableProperty};
use super::precedence::PrecedenceStack;
use super::registry::{PendingEnum, PendingObject, PendingScalar};
use super::SchemaBuilder;
use crate::model::TypeExpr;

/// A reusable unit of configuration, applied at the `TypeConfiguration` level
pub trait TypeConfiguration {
    fn configure(&self, builder: &mut SchemaBuilder);
}

impl<F> TypeConfiguration for F
where
    F: Fn(&mut SchemaBuilder),
{
    fn configure(&self, builder: &mut SchemaBuilder) {
        self(builder)
    }
}

// =============================================================================
// Objects
// =============================================================================

pub struct ObjectTypeBuilder<'a> {
    pending: &'a mut PendingObject,
    precedence: PrecedenceStack,
}

impl<'a> ObjectTypeBuilder<'a> {
    pub(crate) fn new(pending: &'a mut PendingObject, precedence: PrecedenceStack) -> Self {
        Self { pending, precedence }
    }

    #[track_caller]
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.pending
            .config
            .modifiers
            .push(self.precedence.current(), Location::caller(), move |o| {
                o.name = name;
                Ok(())
            });
        self
    }

    #[track_caller]
    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        let description = description.into();
        self.pending
            .config
            .modifiers
            .push(self.precedence.current(), Location::caller(), move |o| {
                o.description = Some(description);
                Ok(())
            });
        self
    }

    /// Declare the identity property by member name (or final name)
    #[track_caller]
    pub fn identity(&mut self, member: impl Into<String>) -> &mut Self {
        let member = member.into();
        self.pending
            .config
            .modifiers
            .push(self.precedence.current(), Location::caller(), move |o| {
                o.identity = Some(member);
                Ok(())
            });
        self
    }

    /// Declare (or re-include) a property with its declared type
    #[track_caller]
    pub fn property(&mut self, member: &str, ty: impl Into<TypeExpr>) -> PropertyBuilder<'_> {
        let ty = ty.into();
        let level = self.precedence.current();
        let origin = Location::caller();

        self.pending.references.insert(member.to_string(), ty.key());
        let modifiers = self.pending.properties.entry(member);
        modifiers.push(level, origin, move |p| {
            p.declared = Some(ty);
            p.ignored = false;
            Ok(())
        });

        PropertyBuilder {
            modifiers,
            precedence: self.precedence.clone(),
        }
    }

    #[track_caller]
    pub fn ignore_property(&mut self, member: &str) -> &mut Self {
        self.pending
            .properties
            .entry(member)
            .push(self.precedence.current(), Location::caller(), |p| {
                p.ignored = true;
                Ok(())
            });
        self
    }
}

pub struct PropertyBuilder<'a> {
    modifiers: &'a mut DeferredModifiers<MutableProperty>,
    precedence: PrecedenceStack,
}

impl<'a> PropertyBuilder<'a> {
    #[track_caller]
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.modifiers
            .push(self.precedence.current(), Location::caller(), move |p| {
                p.name = name;
                Ok(())
            });
        self
    }

    #[track_caller]
    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        let description = description.into();
        self.modifiers
            .push(self.precedence.current(), Location::caller(), move |p| {
                p.description = Some(description);
                Ok(())
            });
        self
    }

    #[track_caller]
    pub fn required(&mut self, required: bool) -> &mut Self {
        self.modifiers
            .push(self.precedence.current(), Location::caller(), move |p| {
                p.required = required;
                Ok(())
            });
        self
    }

    /// Mark the property as a relationship to its (resource) target type
    #[track_caller]
    pub fn relationship(&mut self) -> &mut Self {
        self.modifiers
            .push(self.precedence.current(), Location::caller(), |p| {
                p.relationship = true;
                Ok(())
            });
        self
    }
}

// =============================================================================
// Enumerations
// =============================================================================

pub struct EnumTypeBuilder<'a> {
    pending: &'a mut PendingEnum,
    precedence: PrecedenceStack,
}

impl<'a> EnumTypeBuilder<'a> {
    pub(crate) fn new(pending: &'a mut PendingEnum, precedence: PrecedenceStack) -> Self {
        Self { pending, precedence }
    }

    #[track_caller]
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.pending
            .config
            .modifiers
            .push(self.precedence.current(), Location::caller(), move |e| {
                e.name = name;
                Ok(())
            });
        self
    }

    #[track_caller]
    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        let description = description.into();
        self.pending
            .config
            .modifiers
            .push(self.precedence.current(), Location::caller(), move |e| {
                e.description = Some(description);
                Ok(())
            });
        self
    }

    /// Declare (or re-include) a value
    #[track_caller]
    pub fn value(&mut self, member: &str) -> EnumValueBuilder<'_> {
        let modifiers = self.pending.values.entry(member);
        modifiers.push(self.precedence.current(), Location::caller(), |v| {
            v.ignored = false;
            Ok(())
        });
        EnumValueBuilder {
            modifiers,
            precedence: self.precedence.clone(),
        }
    }

    #[track_caller]
    pub fn ignore_value(&mut self, member: &str) -> &mut Self {
        self.pending
            .values
            .entry(member)
            .push(self.precedence.current(), Location::caller(), |v| {
                v.ignored = true;
                Ok(())
            });
        self
    }
}

pub struct EnumValueBuilder<'a> {
    modifiers: &'a mut DeferredModifiers<MutableEnumValue>,
    precedence: PrecedenceStack,
}

impl<'a> EnumValueBuilder<'a> {
    #[track_caller]
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.modifiers
            .push(self.precedence.current(), Location::caller(), move |v| {
                v.name = name;
                Ok(())
            });
        self
    }

    #[track_caller]
    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        let description = description.into();
        self.modifiers
            .push(self.precedence.current(), Location::caller(), move |v| {
                v.description = Some(description);
                Ok(())
            });
        self
    }
}

// =============================================================================
// Scalars
// =============================================================================

pub struct ScalarTypeBuilder<'a> {
    pending: &'a mut PendingScalar,
    precedence: PrecedenceStack,
}

impl<'a> ScalarTypeBuilder<'a> {
    pub(crate) fn new(pending: &'a mut PendingScalar, precedence: PrecedenceStack) -> Self {
        Self { pending, precedence }
    }

    #[track_caller]
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.pending
            .modifiers
            .push(self.precedence.current(), Location::caller(), move |s| {
                s.name = name;
                Ok(())
            });
        self
    }

    #[track_caller]
    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        let description = description.into();
        self.pending
            .modifiers
            .push(self.precedence.current(), Location::caller(), move |s| {
                s.description = Some(description);
                Ok(())
            });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::precedence::PrecedenceLevel;
    use crate::build::registry::TypeRegistry;
    use crate::model::{ScalarKind, TypeKey};

    #[test]
    fn test_fluent_calls_record_without_mutating() {
        let mut builder = SchemaBuilder::new("test");
        builder
            .object("Person")
            .name("person")
            .identity("Id")
            .property("Id", ScalarKind::Int)
            .required(false);

        let registry = builder.registry();
        let person = registry.object(&TypeKey::named("Person")).unwrap();
        assert_eq!(person.config.modifiers.len(), 2);
        assert_eq!(person.properties.len(), 1);
        assert_eq!(person.references.get("Id"), Some(&TypeKey::from(ScalarKind::Int)));
    }

    #[test]
    fn test_configuration_level_is_recorded() {
        let mut builder = SchemaBuilder::new("test");
        builder.apply_configuration(&|b: &mut SchemaBuilder| {
            b.object("Person").name("person");
        });
        builder.object("Person").description("A human");

        let person = builder.registry().object(&TypeKey::named("Person")).unwrap();
        let levels: Vec<_> = person.config.modifiers.levels().collect();
        assert_eq!(
            levels,
            vec![PrecedenceLevel::TypeConfiguration, PrecedenceLevel::FluentApi]
        );
    }

    #[test]
    fn test_origin_points_at_the_call_site() {
        let mut builder = SchemaBuilder::new("test");
        builder.object("Person").name("person");
        let mut registry = TypeRegistry::default();
        std::mem::swap(&mut registry, &mut builder.registry);

        let person = registry.take_objects().pop().unwrap();
        let debug = format!("{:?}", person.config.modifiers);
        assert!(debug.contains("configure.rs"));
        assert!(debug.contains(&format!("{:?}", PrecedenceLevel::FluentApi)));
    }
}
