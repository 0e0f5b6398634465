//! Schema Finalizer
//!
//! Fixed build order, each step feeding the next:
//!
//! 1. Conventions for every object type (worklist), then replay every object.
//!    Replay collects the resource-type set and implicit scalar/enumeration
//!    usage; freezing needs the complete resource set (cycles mean a related
//!    type may be replayed later), so it happens in a second pass.
//! 2. Reconcile, apply conventions to and realize enumerations.
//! 3. The same for scalars.
//! 4. Sort each kind by name (ties by key) and assemble the schema.
//! 5. Initialize the proxy resolver with the finished schema.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use std::collections::{BTreeSet, HashSet};

use super::discovery::ConventionPass;
use super::mutable::{MutableObjectType, MutableProperty};
use super::registry::{Reconciliation, TypeRegistry};
use super::{property_error, BuildContext};
use crate::diagnostics::{DiagnosticCode, DiagnosticItem};
use crate::error::{Result, SchemaError};
use crate::model::{NamedKind, TypeKey};
use crate::schema::{
    Cardinality, EnumValue, EnumerationType, Identity, ObjectType, Property, ProxyResolver,
    Relationship, Schema, ScalarType, TypeRef,
};

/// An object type after its modifiers were replayed, before freezing
struct ReplayedObject {
    key: TypeKey,
    ty: MutableObjectType,
    properties: Vec<MutableProperty>,
}

pub(crate) fn finalize(name: String, ctx: &BuildContext, mut registry: TypeRegistry) -> Result<Schema> {
    {
        let mut pass = ConventionPass::new(ctx, &mut registry);
        pass.exclude_ignored_types();
        pass.apply_objects()?;
    }

    let resolver = ProxyResolver::new();

    // Step 1: objects
    let replayed = replay_objects(ctx, &mut registry)?;
    let realized: BTreeSet<TypeKey> = replayed.iter().map(|o| o.key.clone()).collect();
    let mut objects = replayed
        .into_iter()
        .map(|object| freeze_object(ctx, &registry, &realized, object, &resolver))
        .collect::<Result<Vec<_>>>()?;

    // Step 2: enumerations
    let outcome = registry.reconcile_enumerations();
    report_reconciliation(ctx, NamedKind::Enumeration, &outcome);
    ConventionPass::new(ctx, &mut registry).apply_enumerations()?;
    let mut enumerations = Vec::new();
    for pending in registry.take_enumerations() {
        let key = pending.config.key.clone();
        let ty = pending.config.realize()?;
        let values = pending
            .values
            .realize(&key.to_string())?
            .into_iter()
            .filter(|v| !v.ignored)
            .map(|v| EnumValue {
                member: v.member,
                name: v.name,
                description: v.description,
            })
            .collect();
        enumerations.push(EnumerationType {
            key,
            name: ty.name,
            description: ty.description,
            values,
        });
    }

    // Step 3: scalars
    let outcome = registry.reconcile_scalars();
    report_reconciliation(ctx, NamedKind::Scalar, &outcome);
    ConventionPass::new(ctx, &mut registry).apply_scalars()?;
    let mut scalars = Vec::new();
    for pending in registry.take_scalars() {
        let key = pending.key.clone();
        let ty = pending.realize()?;
        scalars.push(ScalarType {
            key,
            name: ty.name,
            description: ty.description,
        });
    }

    // Step 4: assemble
    enumerations.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.key.cmp(&b.key)));
    objects.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.key.cmp(&b.key)));
    scalars.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.key.cmp(&b.key)));

    report_duplicate_names(ctx, NamedKind::Enumeration, enumerations.iter().map(|t| (&t.name, &t.key)));
    report_duplicate_names(ctx, NamedKind::Object, objects.iter().map(|t| (&t.name, &t.key)));
    report_duplicate_names(ctx, NamedKind::Scalar, scalars.iter().map(|t| (&t.name, &t.key)));

    let schema = Schema::new(name, enumerations, objects, scalars, resolver.clone());

    // Step 5: forward references become live
    resolver.initialize(&schema)?;

    tracing::info!(
        schema = %schema.name(),
        enumerations = schema.enumerations().len(),
        objects = schema.objects().len(),
        scalars = schema.scalars().len(),
        "schema built"
    );

    Ok(schema)
}

// =============================================================================
// Objects
// =============================================================================

fn replay_objects(ctx: &BuildContext, registry: &mut TypeRegistry) -> Result<Vec<ReplayedObject>> {
    let mut replayed = Vec::new();

    for pending in registry.take_objects() {
        let key = pending.config.key.clone();
        let ty = pending.config.realize()?;
        let properties = pending.properties.realize(&key.to_string())?;

        if ty.identity.is_some() {
            registry.mark_resource(&key);
        }

        for property in properties.iter().filter(|p| !p.ignored) {
            let Some(declared) = &property.declared else {
                continue;
            };
            let target = ctx
                .target_of(registry, &declared.key())
                .map_err(|err| property_error(err, &ty.name, &property.name))?;
            if target.kind != NamedKind::Object {
                registry.note_implicit(target.kind, &target.key);
            }
        }

        replayed.push(ReplayedObject { key, ty, properties });
    }

    Ok(replayed)
}

fn freeze_object(
    ctx: &BuildContext,
    registry: &TypeRegistry,
    realized: &BTreeSet<TypeKey>,
    object: ReplayedObject,
    resolver: &ProxyResolver,
) -> Result<ObjectType> {
    let ReplayedObject { key, ty, properties: replayed } = object;
    let owner = ty.name.clone();

    let mut properties: Vec<Property> = Vec::new();
    let mut names: HashSet<String> = HashSet::new();
    let mut candidates: Vec<(String, String, TypeRef, NamedKind, TypeKey)> = Vec::new();
    let mut known_members: Vec<String> = Vec::new();

    for p in replayed {
        let subject = format!("{}.{}", key, p.member);
        known_members.push(p.member.clone());

        if p.ignored {
            ctx.report(DiagnosticItem::new(subject, DiagnosticCode::PropertyIgnored, "property ignored"));
            continue;
        }

        let declared = p.declared.ok_or_else(|| {
            SchemaError::Internal(format!("property `{}` has no declared type", subject))
        })?;
        let target = ctx
            .target_of(registry, &declared.key())
            .map_err(|err| property_error(err, &owner, &p.name))?;

        // The property keeps its token; only the relationship is filtered,
        // by the resource test below
        let excluded = registry.is_excluded(&target.key);
        let missing = target.kind == NamedKind::Object && !realized.contains(&target.key);
        if excluded || missing {
            let reason = if excluded { "excluded" } else { "not part of the schema" };
            ctx.report(
                DiagnosticItem::new(
                    subject,
                    DiagnosticCode::DanglingTarget,
                    format!("target {} type `{}` is {}", target.kind, target.key, reason),
                )
                .with_context(format!("declared type: {}", declared)),
            );
        }

        if !names.insert(p.name.clone()) {
            return Err(SchemaError::DuplicateProperty {
                owner,
                name: p.name,
            });
        }

        let type_ref = if target.collection {
            TypeRef::collection(target.kind, target.key.clone())
        } else {
            TypeRef::single(target.kind, target.key.clone())
        };

        if p.relationship {
            candidates.push((p.member.clone(), p.name.clone(), type_ref.clone(), target.kind, target.key));
        }

        properties.push(Property {
            member: p.member,
            name: p.name,
            description: p.description,
            declaring: key.clone(),
            declared,
            required: p.required,
            target: type_ref,
            resolver: resolver.clone(),
        });
    }

    let identity = match ty.identity {
        Some(wanted) => {
            let index = properties
                .iter()
                .position(|p| p.member == wanted)
                .or_else(|| properties.iter().position(|p| p.name == wanted))
                .ok_or_else(|| SchemaError::IdentityNotFound {
                    owner: owner.clone(),
                    suggestions: suggest(&wanted, &known_members),
                    property: wanted.clone(),
                })?;
            let property = &mut properties[index];
            property.required = true;
            Some(Identity {
                member: property.member.clone(),
                property: property.name.clone(),
            })
        }
        None => None,
    };

    let mut relationships = Vec::new();
    for (member, name, target, kind, target_key) in candidates {
        let reason = if identity.is_none() {
            Some(format!("`{}` has no identity", owner))
        } else if kind != NamedKind::Object || !registry.is_resource(&target_key) {
            Some(format!("target `{}` is not a resource type", target_key))
        } else {
            None
        };

        if let Some(reason) = reason {
            ctx.report(
                DiagnosticItem::new(
                    format!("{}.{}", key, member),
                    DiagnosticCode::RelationshipOmitted,
                    "relationship omitted",
                )
                .with_context(reason),
            );
            continue;
        }

        relationships.push(Relationship {
            member,
            name,
            cardinality: if target.collection {
                Cardinality::ToMany
            } else {
                Cardinality::ToOne
            },
            target,
            resolver: resolver.clone(),
        });
    }

    Ok(ObjectType {
        key,
        name: ty.name,
        description: ty.description,
        properties,
        identity,
        relationships,
    })
}

/// Up to three member names close to `wanted`
fn suggest(wanted: &str, members: &[String]) -> Vec<String> {
    let matcher = SkimMatcherV2::default();
    let mut scored: Vec<(i64, &String)> = members
        .iter()
        .filter_map(|member| {
            let forward = matcher.fuzzy_match(member, wanted);
            let backward = matcher.fuzzy_match(wanted, member);
            forward.max(backward).map(|score| (score, member))
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored.dedup_by(|a, b| a.1 == b.1);
    scored.into_iter().take(3).map(|(_, m)| m.clone()).collect()
}

// =============================================================================
// Reporting
// =============================================================================

fn report_reconciliation(ctx: &BuildContext, kind: NamedKind, outcome: &Reconciliation) {
    for key in &outcome.removed {
        ctx.report(DiagnosticItem::new(
            key.to_string(),
            DiagnosticCode::UnusedTypeRemoved,
            format!("{} type configured but never referenced", kind),
        ));
    }
    for key in &outcome.added {
        ctx.report(DiagnosticItem::new(
            key.to_string(),
            DiagnosticCode::ImplicitTypeAdded,
            format!("{} type referenced without configuration", kind),
        ));
    }
}

fn report_duplicate_names<'a>(
    ctx: &BuildContext,
    kind: NamedKind,
    sorted: impl Iterator<Item = (&'a String, &'a TypeKey)>,
) {
    let mut previous: Option<(&String, &TypeKey)> = None;
    for (name, key) in sorted {
        if let Some((prev_name, prev_key)) = previous {
            if prev_name == name {
                ctx.report(
                    DiagnosticItem::new(
                        name.as_str(),
                        DiagnosticCode::DuplicateTypeName,
                        format!("two {} types share a name", kind),
                    )
                    .with_context(format!("keys: {}, {}", prev_key, key)),
                );
            }
        }
        previous = Some((name, key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggest_ranks_close_members() {
        let members = vec!["Id".to_string(), "Name".to_string(), "Identifier".to_string()];
        let suggestions = suggest("Idd", &members);
        assert!(suggestions.contains(&"Id".to_string()));
        assert!(!suggestions.contains(&"Name".to_string()));
        assert!(suggest("zzz", &members).is_empty());
    }
}
