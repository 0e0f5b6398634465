//! Naming Conventions and Discovery Settings
//!
//! Stateless helpers the convention pass calls into:
//! - `NamingConvention` / `NamingConventions`: ordered `string -> string`
//!   transforms of natural names, recorded at the Convention level only
//! - `DiscoverySettings`: predicates deciding which types and members the
//!   convention pass even looks at

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

use crate::config::{ConventionsConfig, DiscoveryConfig};
use crate::error::Result;
use crate::model::TypeKey;

// =============================================================================
// Naming
// =============================================================================

/// Built-in case transforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamingConvention {
    PascalCase,
    CamelCase,
    SnakeCase,
    KebabCase,
    LowerCase,
    UpperCase,
}

impl NamingConvention {
    pub fn apply(&self, s: &str) -> String {
        match self {
            NamingConvention::PascalCase => to_pascal_case(s),
            NamingConvention::CamelCase => to_camel_case(s),
            NamingConvention::SnakeCase => join_words(s, '_'),
            NamingConvention::KebabCase => join_words(s, '-'),
            NamingConvention::LowerCase => s.to_lowercase(),
            NamingConvention::UpperCase => s.to_uppercase(),
        }
    }
}

/// Split an identifier into words at separators, lower-to-upper transitions
/// and the end of an acronym (`HTTPServer` -> `HTTP`, `Server`).
pub fn split_words(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' || c == ' ' || c == '.' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).map(|n| n.is_lowercase()).unwrap_or(false);
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower) {
                words.push(std::mem::take(&mut current));
            }
        }

        current.push(c);
    }

    if !current.is_empty() {
        words.push(current);
    }

    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Convert string to PascalCase
pub fn to_pascal_case(s: &str) -> String {
    split_words(s).iter().map(|w| capitalize(w)).collect()
}

/// Convert string to camelCase
pub fn to_camel_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for (i, word) in split_words(s).iter().enumerate() {
        if i == 0 {
            result.push_str(&word.to_lowercase());
        } else {
            result.push_str(&capitalize(word));
        }
    }
    result
}

fn join_words(s: &str, separator: char) -> String {
    let words: Vec<String> = split_words(s).iter().map(|w| w.to_lowercase()).collect();
    words.join(&separator.to_string())
}

/// One step of a naming chain
#[derive(Clone)]
pub enum NameTransform {
    Builtin(NamingConvention),
    Custom(Rc<dyn Fn(&str) -> String>),
}

impl fmt::Debug for NameTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameTransform::Builtin(convention) => write!(f, "{:?}", convention),
            NameTransform::Custom(_) => f.write_str("Custom"),
        }
    }
}

impl NameTransform {
    fn apply(&self, s: &str) -> String {
        match self {
            NameTransform::Builtin(convention) => convention.apply(s),
            NameTransform::Custom(transform) => transform(s),
        }
    }
}

/// Ordered chain of name transforms, applied left-to-right
#[derive(Debug, Clone, Default)]
pub struct NameChain {
    steps: Vec<NameTransform>,
}

impl NameChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, convention: NamingConvention) -> Self {
        self.steps.push(NameTransform::Builtin(convention));
        self
    }

    pub fn then_with(mut self, transform: impl Fn(&str) -> String + 'static) -> Self {
        self.steps.push(NameTransform::Custom(Rc::new(transform)));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn apply(&self, name: &str) -> String {
        self.steps
            .iter()
            .fold(name.to_string(), |acc, step| step.apply(&acc))
    }
}

impl From<&[NamingConvention]> for NameChain {
    fn from(conventions: &[NamingConvention]) -> Self {
        conventions
            .iter()
            .fold(NameChain::new(), |chain, c| chain.then(*c))
    }
}

/// Naming chains for each kind of name the schema carries
#[derive(Debug, Clone, Default)]
pub struct NamingConventions {
    /// Object, enumeration and scalar type names
    pub types: NameChain,
    pub properties: NameChain,
    pub enum_values: NameChain,
}

impl NamingConventions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ConventionsConfig) -> Self {
        Self {
            types: config.type_names.as_slice().into(),
            properties: config.property_names.as_slice().into(),
            enum_values: config.enum_values.as_slice().into(),
        }
    }

    pub fn with_types(mut self, chain: NameChain) -> Self {
        self.types = chain;
        self
    }

    pub fn with_properties(mut self, chain: NameChain) -> Self {
        self.properties = chain;
        self
    }

    pub fn with_enum_values(mut self, chain: NameChain) -> Self {
        self.enum_values = chain;
        self
    }
}

// =============================================================================
// Discovery
// =============================================================================

pub type TypePredicate = Rc<dyn Fn(&TypeKey) -> bool>;

/// `(owner type name, member name) -> bool`
pub type MemberPredicate = Rc<dyn Fn(&str, &str) -> bool>;

/// Filters for what the convention pass considers
#[derive(Clone)]
pub struct DiscoverySettings {
    /// Discover properties and enum values from catalog members
    pub properties: bool,
    /// Register object types referenced by discovered properties
    pub object_types: bool,
    type_filter: Option<TypePredicate>,
    member_filter: Option<MemberPredicate>,
}

impl fmt::Debug for DiscoverySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoverySettings")
            .field("properties", &self.properties)
            .field("object_types", &self.object_types)
            .field("type_filter", &self.type_filter.is_some())
            .field("member_filter", &self.member_filter.is_some())
            .finish()
    }
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            properties: true,
            object_types: true,
            type_filter: None,
            member_filter: None,
        }
    }
}

impl DiscoverySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nothing is discovered: only explicitly configured members exist
    pub fn disabled() -> Self {
        Self {
            properties: false,
            object_types: false,
            ..Self::default()
        }
    }

    pub fn with_type_filter(mut self, filter: impl Fn(&TypeKey) -> bool + 'static) -> Self {
        self.type_filter = Some(Rc::new(filter));
        self
    }

    pub fn with_member_filter(mut self, filter: impl Fn(&str, &str) -> bool + 'static) -> Self {
        self.member_filter = Some(Rc::new(filter));
        self
    }

    /// Compile the regex filters of a `[discovery]` section
    pub fn from_config(config: &DiscoveryConfig) -> Result<Self> {
        let mut settings = Self {
            properties: config.properties,
            object_types: config.object_types,
            ..Self::default()
        };

        if !config.ignore_types.is_empty() {
            let patterns = compile(&config.ignore_types)?;
            settings = settings.with_type_filter(move |key| {
                let name = key.to_string();
                !patterns.iter().any(|p| p.is_match(&name))
            });
        }

        if !config.ignore_members.is_empty() {
            let patterns = compile(&config.ignore_members)?;
            settings = settings.with_member_filter(move |owner, member| {
                let path = format!("{}.{}", owner, member);
                !patterns.iter().any(|p| p.is_match(&path))
            });
        }

        Ok(settings)
    }

    pub fn accepts_type(&self, key: &TypeKey) -> bool {
        self.type_filter.as_ref().map(|f| f(key)).unwrap_or(true)
    }

    pub fn accepts_member(&self, owner: &str, member: &str) -> bool {
        self.member_filter
            .as_ref()
            .map(|f| f(owner, member))
            .unwrap_or(true)
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Regex::new(p).map_err(Into::into))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_words() {
        assert_eq!(split_words("MailingAddress"), vec!["Mailing", "Address"]);
        assert_eq!(split_words("phone_numbers"), vec!["phone", "numbers"]);
        assert_eq!(split_words("HTTPServer"), vec!["HTTP", "Server"]);
        assert_eq!(split_words("date-time"), vec!["date", "time"]);
    }

    #[test]
    fn test_builtin_conventions() {
        assert_eq!(NamingConvention::KebabCase.apply("FirstName"), "first-name");
        assert_eq!(NamingConvention::SnakeCase.apply("PhoneNumbers"), "phone_numbers");
        assert_eq!(NamingConvention::CamelCase.apply("MailingAddress"), "mailingAddress");
        assert_eq!(NamingConvention::PascalCase.apply("date-time"), "DateTime");
        assert_eq!(NamingConvention::UpperCase.apply("Red"), "RED");
        assert_eq!(NamingConvention::LowerCase.apply("Red"), "red");
    }

    #[test]
    fn test_chain_applies_left_to_right() {
        let chain = NameChain::new()
            .then(NamingConvention::SnakeCase)
            .then_with(|s| format!("{}_type", s));
        assert_eq!(chain.apply("PhoneNumber"), "phone_number_type");

        let reversed = NameChain::new()
            .then_with(|s| format!("{}Type", s))
            .then(NamingConvention::SnakeCase);
        assert_eq!(reversed.apply("PhoneNumber"), "phone_number_type");
        assert_eq!(NameChain::new().apply("Same"), "Same");
    }

    #[test]
    fn test_discovery_from_config() {
        let config = DiscoveryConfig {
            ignore_types: vec!["^Internal".into()],
            ignore_members: vec![r"\.Secret$".into()],
            ..DiscoveryConfig::default()
        };
        let settings = DiscoverySettings::from_config(&config).unwrap();
        assert!(!settings.accepts_type(&TypeKey::named("InternalAudit")));
        assert!(settings.accepts_type(&TypeKey::named("Person")));
        assert!(!settings.accepts_member("Person", "Secret"));
        assert!(settings.accepts_member("Person", "Name"));
    }

    #[test]
    fn test_invalid_regex_is_an_error() {
        let config = DiscoveryConfig {
            ignore_types: vec!["(".into()],
            ..DiscoveryConfig::default()
        };
        assert!(DiscoverySettings::from_config(&config).is_err());
    }
}
