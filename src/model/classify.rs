//! Type Classification
//!
//! Maps a canonical type key to its `TypeKind`. The order of checks is
//! load-bearing and must not be rearranged:
//!
//! 1. nullable wrappers are already collapsed by `TypeExpr::key`
//! 2. enumeration marker
//! 3. recognized scalar
//! 4. ordered collection (item classified recursively, no nesting)
//! 5. object, the catch-all

use super::{TypeKey, TypeKind};
use crate::error::{Result, SchemaError};

/// Classify a type key.
///
/// `is_enumeration` answers whether a named type carries the enumeration
/// marker (declared as an enum in the source catalog or explicitly configured
/// as one).
pub fn classify(key: &TypeKey, is_enumeration: &dyn Fn(&str) -> bool) -> Result<TypeKind> {
    if let TypeKey::Named(name) = key {
        if is_enumeration(name) {
            return Ok(TypeKind::Enumeration);
        }
    }

    if let TypeKey::Scalar(_) = key {
        return Ok(TypeKind::Scalar);
    }

    if let TypeKey::List(item) = key {
        return match classify(item, is_enumeration)? {
            TypeKind::Collection(_) => Err(SchemaError::NestedCollection {
                ty: key.to_string(),
            }),
            _ => Ok(TypeKind::Collection((**item).clone())),
        };
    }

    Ok(TypeKind::Object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ScalarKind, TypeExpr};

    fn no_enums(_: &str) -> bool {
        false
    }

    fn key(text: &str) -> TypeKey {
        text.parse::<TypeExpr>().unwrap().key()
    }

    #[test]
    fn test_scalars_and_nullable_scalars() {
        assert_eq!(classify(&key("int"), &no_enums).unwrap(), TypeKind::Scalar);
        assert_eq!(classify(&key("guid?"), &no_enums).unwrap(), TypeKind::Scalar);
    }

    #[test]
    fn test_enumeration_marker_wins_over_object() {
        let is_color = |name: &str| name == "Color";
        assert_eq!(classify(&key("Color"), &is_color).unwrap(), TypeKind::Enumeration);
        assert_eq!(classify(&key("Color?"), &is_color).unwrap(), TypeKind::Enumeration);
        assert_eq!(classify(&key("Paint"), &is_color).unwrap(), TypeKind::Object);
    }

    #[test]
    fn test_collection_carries_item_key() {
        assert_eq!(
            classify(&key("[Comment]"), &no_enums).unwrap(),
            TypeKind::Collection(TypeKey::named("Comment"))
        );
        assert_eq!(
            classify(&key("[int?]"), &no_enums).unwrap(),
            TypeKind::Collection(TypeKey::Scalar(ScalarKind::Int))
        );
    }

    #[test]
    fn test_nested_collection_fails() {
        let err = classify(&key("[[int]]"), &no_enums).unwrap_err();
        match err {
            SchemaError::NestedCollection { ty } => assert_eq!(ty, "[[int]]"),
            other => panic!("Expected NestedCollection, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_named_type_is_object() {
        assert_eq!(classify(&key("Anything"), &no_enums).unwrap(), TypeKind::Object);
    }
}
