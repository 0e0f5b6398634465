//! Forward-Reference Proxy Resolver
//!
//! One resolver per build, shared by every property, relationship and the
//! schema itself. It starts empty while types are realized one at a time and
//! is initialized exactly once with the finished schema; from then on a
//! token resolves to the id of the realized type.
//!
//! The table maps keys to ids, never to types, so realized types can refer
//! to each other in cycles without forming ownership cycles.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, OnceLock};

use super::types::{TypeId, TypeToken};
use super::Schema;
use crate::error::{Result, SchemaError};
use crate::model::{NamedKind, TypeKey};

#[derive(Debug, Default)]
struct ResolverTable {
    by_kind: BTreeMap<NamedKind, HashMap<TypeKey, usize>>,
}

impl ResolverTable {
    fn insert(&mut self, kind: NamedKind, key: &TypeKey, index: usize) -> Result<()> {
        let previous = self.by_kind.entry(kind).or_default().insert(key.clone(), index);
        if previous.is_some() {
            return Err(SchemaError::Internal(format!(
                "{} type `{}` realized more than once",
                kind, key
            )));
        }
        Ok(())
    }
}

/// Shared, write-once lookup table from proxy tokens to realized type ids
#[derive(Clone, Default)]
pub struct ProxyResolver {
    table: Arc<OnceLock<ResolverTable>>,
}

impl fmt::Debug for ProxyResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyResolver")
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl ProxyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.table.get().is_some()
    }

    /// Whether two handles share the same table
    pub fn same_build(&self, other: &ProxyResolver) -> bool {
        Arc::ptr_eq(&self.table, &other.table)
    }

    /// Populate the table from the finished schema. Fails if called twice or
    /// if two realized types of one kind share a key.
    pub fn initialize(&self, schema: &Schema) -> Result<()> {
        let mut table = ResolverTable::default();
        for (index, ty) in schema.enumerations().iter().enumerate() {
            table.insert(NamedKind::Enumeration, &ty.key, index)?;
        }
        for (index, ty) in schema.objects().iter().enumerate() {
            table.insert(NamedKind::Object, &ty.key, index)?;
        }
        for (index, ty) in schema.scalars().iter().enumerate() {
            table.insert(NamedKind::Scalar, &ty.key, index)?;
        }

        self.table
            .set(table)
            .map_err(|_| SchemaError::Internal("proxy resolver initialized twice".into()))
    }

    /// Resolve a token to the id of its realized type
    pub fn resolve(&self, token: &TypeToken) -> Result<TypeId> {
        let table = self.table.get().ok_or_else(|| {
            SchemaError::Internal(format!(
                "proxy resolver used before initialization (resolving {})",
                token
            ))
        })?;

        table
            .by_kind
            .get(&token.kind)
            .and_then(|keys| keys.get(&token.key))
            .map(|&index| TypeId {
                kind: token.kind,
                index,
            })
            .ok_or_else(|| SchemaError::UnresolvedType {
                kind: token.kind.to_string(),
                key: token.key.to_string(),
            })
    }
}
