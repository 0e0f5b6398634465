//! Mutable Type Registry
//!
//! The in-progress schema: pending type configurations keyed by canonical
//! type key and partitioned by kind, plus the sets the finalizer needs:
//! - excluded keys, independent of the kind a key classifies as
//! - scalar/enumeration keys implicitly used by realized object properties
//! - object keys that qualify as resource types (carry an identity)

use std::collections::{BTreeMap, BTreeSet};

use super::modifier::DeferredModifiers;
use super::mutable::{
    MutableEnumType, MutableEnumValue, MutableMember, MutableNamedType, MutableObjectType,
    MutableProperty, MutableScalarType,
};
use crate::error::Result;
use crate::model::{NamedKind, TypeKey};

// =============================================================================
// Pending Configurations
// =============================================================================

/// Deferred configuration of one named type
#[derive(Debug)]
pub struct PendingTypeConfig<T> {
    pub(crate) key: TypeKey,
    pub(crate) modifiers: DeferredModifiers<T>,
    pub(crate) conventions_applied: bool,
}

impl<T: MutableNamedType> PendingTypeConfig<T> {
    pub fn new(key: TypeKey) -> Self {
        Self {
            key,
            modifiers: DeferredModifiers::new(),
            conventions_applied: false,
        }
    }

    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    /// Concatenate the other configuration's modifiers
    pub fn merge(&mut self, other: PendingTypeConfig<T>) {
        self.modifiers.merge(other.modifiers);
        self.conventions_applied |= other.conventions_applied;
    }

    /// Create the default instance and replay every modifier against it
    pub fn realize(self) -> Result<T> {
        let mut target = T::create(&self.key);
        self.modifiers.realize(&mut target, &self.key.to_string())?;
        Ok(target)
    }
}

/// Deferred configuration of the members (properties, values) of one type,
/// in order of first registration
#[derive(Debug)]
pub struct PendingMembers<M> {
    entries: Vec<(String, DeferredModifiers<M>)>,
}

impl<M> Default for PendingMembers<M> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<M: MutableMember> PendingMembers<M> {
    /// Modifier list of `member`, registered on first use
    pub fn entry(&mut self, member: &str) -> &mut DeferredModifiers<M> {
        let index = match self.entries.iter().position(|(name, _)| name == member) {
            Some(index) => index,
            None => {
                self.entries.push((member.to_string(), DeferredModifiers::new()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].1
    }

    pub fn contains(&self, member: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == member)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Move the members named in `declared` to the front, in that order.
    /// Members not named keep their relative registration order.
    pub fn order_by<'a>(&mut self, declared: impl IntoIterator<Item = &'a str>) {
        let rank: Vec<&str> = declared.into_iter().collect();
        self.entries.sort_by_key(|(member, _)| {
            rank.iter()
                .position(|name| *name == member.as_str())
                .unwrap_or(rank.len())
        });
    }

    pub fn merge(&mut self, other: PendingMembers<M>) {
        for (member, modifiers) in other.entries {
            self.entry(&member).merge(modifiers);
        }
    }

    /// Replay every member against a fresh default instance
    pub fn realize(self, owner: &str) -> Result<Vec<M>> {
        let mut realized = Vec::with_capacity(self.entries.len());
        for (member, modifiers) in self.entries {
            let mut target = M::create(&member);
            modifiers.realize(&mut target, &format!("{}.{}", owner, member))?;
            realized.push(target);
        }
        Ok(realized)
    }
}

#[derive(Debug)]
pub struct PendingObject {
    pub(crate) config: PendingTypeConfig<MutableObjectType>,
    pub(crate) properties: PendingMembers<MutableProperty>,
    /// Declared member types recorded by configuration calls, scanned by the
    /// convention pass for object types to discover
    pub(crate) references: BTreeMap<String, TypeKey>,
}

impl PendingObject {
    fn new(key: TypeKey) -> Self {
        Self {
            config: PendingTypeConfig::new(key),
            properties: PendingMembers::default(),
            references: BTreeMap::new(),
        }
    }

    pub fn key(&self) -> &TypeKey {
        &self.config.key
    }

    fn merge(&mut self, other: PendingObject) {
        self.config.merge(other.config);
        self.properties.merge(other.properties);
        self.references.extend(other.references);
    }
}

#[derive(Debug)]
pub struct PendingEnum {
    pub(crate) config: PendingTypeConfig<MutableEnumType>,
    pub(crate) values: PendingMembers<MutableEnumValue>,
}

impl PendingEnum {
    fn new(key: TypeKey) -> Self {
        Self {
            config: PendingTypeConfig::new(key),
            values: PendingMembers::default(),
        }
    }

    fn merge(&mut self, other: PendingEnum) {
        self.config.merge(other.config);
        self.values.merge(other.values);
    }
}

pub type PendingScalar = PendingTypeConfig<MutableScalarType>;

// =============================================================================
// Reconciliation
// =============================================================================

/// Outcome of reconciling one kind against implicit usage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Explicitly configured but never referenced
    pub removed: Vec<TypeKey>,
    /// Referenced but never explicitly configured
    pub added: Vec<TypeKey>,
}

/// Remove `explicit - used`, then add `used - explicit`. Keys in both sets
/// are left untouched.
fn reconcile_map<V>(
    map: &mut BTreeMap<TypeKey, V>,
    used: &BTreeSet<TypeKey>,
    create: impl Fn(&TypeKey) -> V,
) -> Reconciliation {
    let removed: Vec<TypeKey> = map.keys().filter(|k| !used.contains(*k)).cloned().collect();
    for key in &removed {
        map.remove(key);
    }

    let added: Vec<TypeKey> = used.iter().filter(|k| !map.contains_key(*k)).cloned().collect();
    for key in &added {
        map.insert(key.clone(), create(key));
    }

    Reconciliation { removed, added }
}

// =============================================================================
// Registry
// =============================================================================

/// The mutable type registry of one build
#[derive(Debug, Default)]
pub struct TypeRegistry {
    objects: BTreeMap<TypeKey, PendingObject>,
    enumerations: BTreeMap<TypeKey, PendingEnum>,
    scalars: BTreeMap<TypeKey, PendingScalar>,
    excluded: BTreeSet<TypeKey>,
    implicit_enumerations: BTreeSet<TypeKey>,
    implicit_scalars: BTreeSet<TypeKey>,
    resource_types: BTreeSet<TypeKey>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Get or add ==========

    pub fn get_or_add_object(&mut self, key: &TypeKey) -> &mut PendingObject {
        self.objects
            .entry(key.clone())
            .or_insert_with(|| PendingObject::new(key.clone()))
    }

    pub fn get_or_add_enumeration(&mut self, key: &TypeKey) -> &mut PendingEnum {
        self.enumerations
            .entry(key.clone())
            .or_insert_with(|| PendingEnum::new(key.clone()))
    }

    pub fn get_or_add_scalar(&mut self, key: &TypeKey) -> &mut PendingScalar {
        self.scalars
            .entry(key.clone())
            .or_insert_with(|| PendingTypeConfig::new(key.clone()))
    }

    pub fn contains(&self, kind: NamedKind, key: &TypeKey) -> bool {
        match kind {
            NamedKind::Object => self.objects.contains_key(key),
            NamedKind::Enumeration => self.enumerations.contains_key(key),
            NamedKind::Scalar => self.scalars.contains_key(key),
        }
    }

    pub fn object_mut(&mut self, key: &TypeKey) -> Option<&mut PendingObject> {
        self.objects.get_mut(key)
    }

    pub fn object(&self, key: &TypeKey) -> Option<&PendingObject> {
        self.objects.get(key)
    }

    pub fn enumeration_mut(&mut self, key: &TypeKey) -> Option<&mut PendingEnum> {
        self.enumerations.get_mut(key)
    }

    pub fn scalar_mut(&mut self, key: &TypeKey) -> Option<&mut PendingScalar> {
        self.scalars.get_mut(key)
    }

    /// Keys of the registered types of one kind, in key order
    pub fn keys(&self, kind: NamedKind) -> Vec<TypeKey> {
        match kind {
            NamedKind::Object => self.objects.keys().cloned().collect(),
            NamedKind::Enumeration => self.enumerations.keys().cloned().collect(),
            NamedKind::Scalar => self.scalars.keys().cloned().collect(),
        }
    }

    /// Whether a named type was explicitly configured as an enumeration
    pub fn is_enumeration(&self, name: &str) -> bool {
        self.enumerations.contains_key(&TypeKey::named(name))
    }

    // ========== Exclusion ==========

    /// Exclude a key from every kind. Returns false if it was already
    /// excluded.
    pub fn exclude(&mut self, key: TypeKey) -> bool {
        self.excluded.insert(key)
    }

    pub fn is_excluded(&self, key: &TypeKey) -> bool {
        self.excluded.contains(key)
    }

    pub fn excluded(&self) -> impl Iterator<Item = &TypeKey> {
        self.excluded.iter()
    }

    // ========== Usage tracking ==========

    /// Record that a realized object property uses a scalar or enumeration.
    /// Excluded keys are never recorded.
    pub fn note_implicit(&mut self, kind: NamedKind, key: &TypeKey) {
        if self.is_excluded(key) {
            return;
        }
        match kind {
            NamedKind::Enumeration => {
                self.implicit_enumerations.insert(key.clone());
            }
            NamedKind::Scalar => {
                self.implicit_scalars.insert(key.clone());
            }
            NamedKind::Object => {}
        }
    }

    pub fn implicit(&self, kind: NamedKind) -> impl Iterator<Item = &TypeKey> {
        match kind {
            NamedKind::Enumeration => Some(&self.implicit_enumerations),
            NamedKind::Scalar => Some(&self.implicit_scalars),
            NamedKind::Object => None,
        }
        .into_iter()
        .flatten()
    }

    pub fn mark_resource(&mut self, key: &TypeKey) {
        self.resource_types.insert(key.clone());
    }

    pub fn is_resource(&self, key: &TypeKey) -> bool {
        self.resource_types.contains(key)
    }

    // ========== Reconciliation ==========

    /// Drop unused explicit enumerations, add default configs for implicit ones
    pub fn reconcile_enumerations(&mut self) -> Reconciliation {
        reconcile_map(&mut self.enumerations, &self.implicit_enumerations, |key| {
            PendingEnum::new(key.clone())
        })
    }

    /// Drop unused explicit scalars, add default configs for implicit ones
    pub fn reconcile_scalars(&mut self) -> Reconciliation {
        reconcile_map(&mut self.scalars, &self.implicit_scalars, |key| {
            PendingTypeConfig::new(key.clone())
        })
    }

    // ========== Realization hand-off ==========

    /// Remove and return the non-excluded pending objects
    pub fn take_objects(&mut self) -> Vec<PendingObject> {
        let objects = std::mem::take(&mut self.objects);
        objects
            .into_values()
            .filter(|o| !self.is_excluded(&o.config.key))
            .collect()
    }

    pub fn take_enumerations(&mut self) -> Vec<PendingEnum> {
        let enumerations = std::mem::take(&mut self.enumerations);
        enumerations
            .into_values()
            .filter(|e| !self.is_excluded(&e.config.key))
            .collect()
    }

    pub fn take_scalars(&mut self) -> Vec<PendingScalar> {
        let scalars = std::mem::take(&mut self.scalars);
        scalars
            .into_values()
            .filter(|s| !self.is_excluded(&s.key))
            .collect()
    }

    // ========== Merging ==========

    /// Merge another registry: configurations sharing a key concatenate
    /// their modifiers, exclusions are unioned.
    pub fn merge(&mut self, other: TypeRegistry) {
        for (key, object) in other.objects {
            match self.objects.get_mut(&key) {
                Some(existing) => existing.merge(object),
                None => {
                    self.objects.insert(key, object);
                }
            }
        }
        for (key, enumeration) in other.enumerations {
            match self.enumerations.get_mut(&key) {
                Some(existing) => existing.merge(enumeration),
                None => {
                    self.enumerations.insert(key, enumeration);
                }
            }
        }
        for (key, scalar) in other.scalars {
            match self.scalars.get_mut(&key) {
                Some(existing) => existing.merge(scalar),
                None => {
                    self.scalars.insert(key, scalar);
                }
            }
        }
        self.excluded.extend(other.excluded);
    }
}
