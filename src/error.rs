//! Error types for the schema build pipeline

use thiserror::Error;

use crate::build::PrecedenceLevel;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema build errors
///
/// Every variant is fatal: the build aborts at the point of detection and no
/// partial schema is returned. Non-fatal conditions (omitted relationships,
/// dropped unused types) are reported through diagnostics only.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("nested collection type `{ty}` is not supported")]
    NestedCollection { ty: String },

    #[error("property `{property}` of object type `{owner}` has nested collection type `{ty}`")]
    NestedCollectionProperty {
        owner: String,
        property: String,
        ty: String,
    },

    #[error("identity property `{property}` does not exist on object type `{owner}`{}", did_you_mean(.suggestions))]
    IdentityNotFound {
        owner: String,
        property: String,
        suggestions: Vec<String>,
    },

    #[error("object type `{owner}` has more than one property named `{name}`")]
    DuplicateProperty { owner: String, name: String },

    #[error("{level} modifier for `{target}` recorded at {origin} failed: {message}")]
    Modifier {
        target: String,
        level: PrecedenceLevel,
        origin: String,
        message: String,
    },

    #[error("invalid type expression `{expr}`: {reason}")]
    InvalidTypeExpr { expr: String, reason: String },

    #[error("type `{name}` is declared more than once in the source catalog")]
    DuplicateDeclaration { name: String },

    #[error("unresolved {kind} type `{key}`")]
    UnresolvedType { kind: String, key: String },

    #[error("internal invariant violated: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl SchemaError {
    /// Shorthand for an edit function failure; the modifier queue fills in
    /// level and origin when the error surfaces during realization.
    pub fn edit(message: impl Into<String>) -> Self {
        SchemaError::Modifier {
            target: String::new(),
            level: PrecedenceLevel::Convention,
            origin: String::new(),
            message: message.into(),
        }
    }

    /// True for errors raised by configuration content rather than I/O or
    /// programming mistakes.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SchemaError::NestedCollection { .. }
                | SchemaError::NestedCollectionProperty { .. }
                | SchemaError::IdentityNotFound { .. }
                | SchemaError::DuplicateProperty { .. }
                | SchemaError::Modifier { .. }
                | SchemaError::InvalidTypeExpr { .. }
                | SchemaError::DuplicateDeclaration { .. }
        )
    }
}

fn did_you_mean(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean: {}?)", suggestions.join(", "))
    }
}
