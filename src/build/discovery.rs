//! Convention and Annotation Application
//!
//! Runs once per pending type, before realization. Everything it records is
//! a deferred modifier at the Convention level (names, members discovered
//! from the catalog) or, in a nested scope, at the Annotation level
//! (declarative metadata attached to catalog declarations).
//!
//! Object types referenced by discovered members are registered on the way;
//! the worklist repeats until no object is left without conventions.

use std::panic::Location;

use super::precedence::PrecedenceLevel;
use super::registry::TypeRegistry;
use super::{property_error, BuildContext};
use crate::diagnostics::{DiagnosticCode, DiagnosticItem};
use crate::error::{Result, SchemaError};
use crate::model::{NamedKind, TypeKey};

pub(crate) struct ConventionPass<'a> {
    ctx: &'a BuildContext,
    registry: &'a mut TypeRegistry,
}

impl<'a> ConventionPass<'a> {
    pub(crate) fn new(ctx: &'a BuildContext, registry: &'a mut TypeRegistry) -> Self {
        Self { ctx, registry }
    }

    /// Exclude every catalog type annotated `ignore`
    pub(crate) fn exclude_ignored_types(&mut self) {
        let ignored = self
            .ctx
            .catalog
            .objects
            .iter()
            .filter(|decl| decl.annotations.ignore)
            .map(|decl| (NamedKind::Object, &decl.name))
            .chain(
                self.ctx
                    .catalog
                    .enums
                    .iter()
                    .filter(|decl| decl.annotations.ignore)
                    .map(|decl| (NamedKind::Enumeration, &decl.name)),
            );

        for (kind, name) in ignored {
            if self.registry.exclude(TypeKey::named(name.as_str())) {
                self.ctx.report(
                    DiagnosticItem::new(name.as_str(), DiagnosticCode::TypeExcluded, format!("{} type excluded", kind))
                        .with_context("level: annotation"),
                );
            }
        }
    }

    // ========== Objects ==========

    /// Apply conventions to every registered object type, including the
    /// ones discovered while doing so
    pub(crate) fn apply_objects(&mut self) -> Result<()> {
        let _schema_wide = self.ctx.precedence.enter(PrecedenceLevel::Convention);

        loop {
            let pending: Vec<TypeKey> = self
                .registry
                .keys(NamedKind::Object)
                .into_iter()
                .filter(|key| {
                    self.registry
                        .object(key)
                        .map(|o| !o.config.conventions_applied)
                        .unwrap_or(false)
                })
                .collect();
            if pending.is_empty() {
                return Ok(());
            }
            for key in pending {
                self.apply_object(&key)?;
            }
        }
    }

    fn apply_object(&mut self, key: &TypeKey) -> Result<()> {
        let ctx = self.ctx;
        let _type_scope = ctx.precedence.enter(PrecedenceLevel::Convention);
        let level = ctx.precedence.current();

        let decl = match key {
            TypeKey::Named(name) => ctx.catalog.object(name),
            _ => None,
        };
        let owner = key.to_string();
        let mut referenced: Vec<(String, TypeKey)> = Vec::new();

        let pending = self
            .registry
            .object_mut(key)
            .ok_or_else(|| SchemaError::Internal(format!("object type `{}` is not registered", key)))?;
        if pending.config.conventions_applied {
            return Ok(());
        }
        pending.config.conventions_applied = true;

        if !ctx.conventions.types.is_empty() {
            let chain = ctx.conventions.types.clone();
            let natural = key.natural_name();
            pending.config.modifiers.push(level, Location::caller(), move |o| {
                o.name = chain.apply(&natural);
                Ok(())
            });
        }

        if let Some(decl) = decl {
            if ctx.discovery.properties {
                for member in &decl.members {
                    if !ctx.discovery.accepts_member(&decl.name, &member.name) {
                        continue;
                    }
                    let name = ctx.conventions.properties.apply(&member.name);
                    let ty = member.ty.clone();
                    pending.properties.entry(&member.name).push(level, Location::caller(), move |p| {
                        p.name = name;
                        p.declared = Some(ty);
                        Ok(())
                    });
                    referenced.push((member.name.clone(), member.ty.key()));
                }
            }

            let _annotations = ctx.precedence.enter(PrecedenceLevel::Annotation);
            let level = ctx.precedence.current();

            let annotations = decl.annotations.clone();
            if annotations.name.is_some() || annotations.description.is_some() {
                pending.config.modifiers.push(level, Location::caller(), move |o| {
                    if let Some(name) = annotations.name {
                        o.name = name;
                    }
                    if annotations.description.is_some() {
                        o.description = annotations.description;
                    }
                    Ok(())
                });
            }

            for member in &decl.members {
                if member.annotations.is_empty()
                    || !ctx.discovery.accepts_member(&decl.name, &member.name)
                {
                    continue;
                }

                let annotations = member.annotations.clone();
                let ty = member.ty.clone();
                pending.properties.entry(&member.name).push(level, Location::caller(), move |p| {
                    p.declared = Some(ty);
                    if let Some(name) = annotations.name {
                        p.name = name;
                    }
                    if annotations.description.is_some() {
                        p.description = annotations.description;
                    }
                    if let Some(required) = annotations.required {
                        p.required = required;
                    }
                    if annotations.relationship {
                        p.relationship = true;
                    }
                    if annotations.ignore {
                        p.ignored = true;
                    }
                    Ok(())
                });

                if member.annotations.identity {
                    let identity = member.name.clone();
                    pending.config.modifiers.push(level, Location::caller(), move |o| {
                        o.identity = Some(identity);
                        Ok(())
                    });
                }

                if !referenced.iter().any(|(name, _)| *name == member.name) {
                    referenced.push((member.name.clone(), member.ty.key()));
                }
            }

            pending
                .properties
                .order_by(decl.members.iter().map(|m| m.name.as_str()));
        }

        referenced.extend(
            pending
                .references
                .iter()
                .map(|(member, key)| (member.clone(), key.clone())),
        );

        self.discover_objects(&owner, referenced)
    }

    /// Register object types referenced by an object's members
    fn discover_objects(&mut self, owner: &str, referenced: Vec<(String, TypeKey)>) -> Result<()> {
        for (member, key) in referenced {
            let target = self
                .ctx
                .target_of(self.registry, &key)
                .map_err(|err| property_error(err, owner, &member))?;

            if !self.ctx.discovery.object_types
                || target.kind != NamedKind::Object
                || self.registry.contains(NamedKind::Object, &target.key)
                || self.registry.is_excluded(&target.key)
                || !self.ctx.discovery.accepts_type(&target.key)
            {
                continue;
            }

            self.registry.get_or_add_object(&target.key);
            self.ctx.report(
                DiagnosticItem::new(
                    target.key.to_string(),
                    DiagnosticCode::TypeAdded,
                    "object type discovered",
                )
                .with_context(format!("referenced by {}.{}", owner, member)),
            );
        }
        Ok(())
    }

    // ========== Enumerations & scalars ==========

    pub(crate) fn apply_enumerations(&mut self) -> Result<()> {
        let _schema_wide = self.ctx.precedence.enter(PrecedenceLevel::Convention);
        for key in self.registry.keys(NamedKind::Enumeration) {
            self.apply_enumeration(&key)?;
        }
        Ok(())
    }

    fn apply_enumeration(&mut self, key: &TypeKey) -> Result<()> {
        let ctx = self.ctx;
        let _type_scope = ctx.precedence.enter(PrecedenceLevel::Convention);
        let level = ctx.precedence.current();

        let pending = self.registry.enumeration_mut(key).ok_or_else(|| {
            SchemaError::Internal(format!("enumeration type `{}` is not registered", key))
        })?;
        if pending.config.conventions_applied {
            return Ok(());
        }
        pending.config.conventions_applied = true;

        if !ctx.conventions.types.is_empty() {
            let chain = ctx.conventions.types.clone();
            let natural = key.natural_name();
            pending.config.modifiers.push(level, Location::caller(), move |e| {
                e.name = chain.apply(&natural);
                Ok(())
            });
        }

        let decl = match key {
            TypeKey::Named(name) => ctx.catalog.enumeration(name),
            _ => None,
        };
        let Some(decl) = decl else {
            return Ok(());
        };

        if ctx.discovery.properties {
            for value in &decl.values {
                if !ctx.discovery.accepts_member(&decl.name, &value.name) {
                    continue;
                }
                let name = ctx.conventions.enum_values.apply(&value.name);
                pending.values.entry(&value.name).push(level, Location::caller(), move |v| {
                    v.name = name;
                    Ok(())
                });
            }
        }

        let _annotations = ctx.precedence.enter(PrecedenceLevel::Annotation);
        let level = ctx.precedence.current();

        let annotations = decl.annotations.clone();
        if annotations.name.is_some() || annotations.description.is_some() {
            pending.config.modifiers.push(level, Location::caller(), move |e| {
                if let Some(name) = annotations.name {
                    e.name = name;
                }
                if annotations.description.is_some() {
                    e.description = annotations.description;
                }
                Ok(())
            });
        }

        for value in &decl.values {
            let annotations = value.annotations.clone();
            if annotations == Default::default()
                || !ctx.discovery.accepts_member(&decl.name, &value.name)
            {
                continue;
            }
            pending.values.entry(&value.name).push(level, Location::caller(), move |v| {
                if let Some(name) = annotations.name {
                    v.name = name;
                }
                if annotations.description.is_some() {
                    v.description = annotations.description;
                }
                if annotations.ignore {
                    v.ignored = true;
                }
                Ok(())
            });
        }

        pending
            .values
            .order_by(decl.values.iter().map(|v| v.name.as_str()));

        Ok(())
    }

    pub(crate) fn apply_scalars(&mut self) -> Result<()> {
        let ctx = self.ctx;
        if ctx.conventions.types.is_empty() {
            return Ok(());
        }
        let _schema_wide = ctx.precedence.enter(PrecedenceLevel::Convention);
        let level = ctx.precedence.current();

        for key in self.registry.keys(NamedKind::Scalar) {
            let Some(pending) = self.registry.scalar_mut(&key) else {
                continue;
            };
            if pending.conventions_applied {
                continue;
            }
            pending.conventions_applied = true;

            let chain = ctx.conventions.types.clone();
            let natural = key.natural_name();
            pending.modifiers.push(level, Location::caller(), move |s| {
                s.name = chain.apply(&natural);
                Ok(())
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::conventions::{DiscoverySettings, NameChain, NamingConvention, NamingConventions};
    use crate::build::precedence::PrecedenceStack;
    use crate::diagnostics::CollectingSink;
    use crate::model::{EnumDecl, MemberDecl, ObjectDecl, ScalarKind, SourceCatalog, TypeExpr};
    use std::rc::Rc;

    fn context(catalog: SourceCatalog, sink: CollectingSink) -> BuildContext {
        BuildContext {
            catalog,
            conventions: NamingConventions::new()
                .with_properties(NameChain::new().then(NamingConvention::KebabCase)),
            discovery: DiscoverySettings::new(),
            precedence: PrecedenceStack::new(),
            sink: Rc::new(sink),
        }
    }

    fn blog() -> SourceCatalog {
        SourceCatalog::new()
            .with_object(
                ObjectDecl::new("Article")
                    .member(MemberDecl::new("Id", ScalarKind::Guid).identity())
                    .member(MemberDecl::new("Author", TypeExpr::named("Person")).relationship())
                    .member(MemberDecl::new("Status", TypeExpr::named("Status"))),
            )
            .with_object(ObjectDecl::new("Person").member(MemberDecl::new("Id", ScalarKind::Int)))
            .with_object(ObjectDecl::new("Secret").ignored())
            .with_enum(EnumDecl::new("Status").value("Draft").value("Published"))
    }

    #[test]
    fn test_worklist_discovers_referenced_objects() {
        let sink = CollectingSink::new();
        let ctx = context(blog(), sink.clone());
        let mut registry = TypeRegistry::new();
        registry.get_or_add_object(&TypeKey::named("Article"));

        ConventionPass::new(&ctx, &mut registry).apply_objects().unwrap();

        // Person discovered, Status is an enumeration and not an object
        assert_eq!(
            registry.keys(NamedKind::Object),
            vec![TypeKey::named("Article"), TypeKey::named("Person")]
        );
        assert_eq!(sink.count(DiagnosticCode::TypeAdded), 1);
        assert_eq!(ctx.precedence.current(), PrecedenceLevel::FluentApi);
    }

    #[test]
    fn test_member_discovery_records_convention_and_annotation_levels() {
        let ctx = context(blog(), CollectingSink::new());
        let mut registry = TypeRegistry::new();
        registry.get_or_add_object(&TypeKey::named("Article"));
        ConventionPass::new(&ctx, &mut registry).apply_objects().unwrap();

        let article = registry.object_mut(&TypeKey::named("Article")).unwrap();
        assert_eq!(article.properties.len(), 3);
        let levels: Vec<_> = article.properties.entry("Id").levels().collect();
        assert_eq!(levels, vec![PrecedenceLevel::Convention, PrecedenceLevel::Annotation]);
        let identity_levels: Vec<_> = article.config.modifiers.levels().collect();
        assert_eq!(identity_levels, vec![PrecedenceLevel::Annotation]);
    }

    #[test]
    fn test_ignored_types_are_excluded() {
        let sink = CollectingSink::new();
        let ctx = context(blog(), sink.clone());
        let mut registry = TypeRegistry::new();
        ConventionPass::new(&ctx, &mut registry).exclude_ignored_types();
        assert!(registry.is_excluded(&TypeKey::named("Secret")));
        assert_eq!(sink.count(DiagnosticCode::TypeExcluded), 1);
    }

    #[test]
    fn test_nested_collection_member_names_the_property() {
        let catalog = SourceCatalog::new().with_object(
            ObjectDecl::new("Grid").member(MemberDecl::new("Cells", "[[int]]".parse::<TypeExpr>().unwrap())),
        );
        let ctx = context(catalog, CollectingSink::new());
        let mut registry = TypeRegistry::new();
        registry.get_or_add_object(&TypeKey::named("Grid"));

        let err = ConventionPass::new(&ctx, &mut registry).apply_objects().unwrap_err();
        match err {
            SchemaError::NestedCollectionProperty { owner, property, .. } => {
                assert_eq!(owner, "Grid");
                assert_eq!(property, "Cells");
            }
            other => panic!("Expected NestedCollectionProperty, got {:?}", other),
        }
    }

    #[test]
    fn test_enum_values_discovered_once() {
        let ctx = context(blog(), CollectingSink::new());
        let mut registry = TypeRegistry::new();
        registry.get_or_add_enumeration(&TypeKey::named("Status"));
        let mut pass = ConventionPass::new(&ctx, &mut registry);
        pass.apply_enumerations().unwrap();
        pass.apply_enumerations().unwrap();

        let status = registry.enumeration_mut(&TypeKey::named("Status")).unwrap();
        assert_eq!(status.values.len(), 2);
        assert_eq!(status.values.entry("Draft").len(), 1);
    }
}
