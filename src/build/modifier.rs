//! Deferred Modifiers
//!
//! Edits recorded during configuration and replayed once at realization.
//! Recording never mutates anything; replay orders edits by precedence level
//! (ascending) while keeping insertion order within a level, so the result is
//! a pure function of the factory default and the recorded list.

use std::fmt;
use std::panic::Location;

use super::precedence::PrecedenceLevel;
use crate::error::{Result, SchemaError};

/// A recorded edit against a mutable instance of `T`
pub type EditFn<T> = Box<dyn FnOnce(&mut T) -> Result<()>>;

/// One recorded edit with its level and the call site that recorded it
pub struct Modifier<T> {
    pub level: PrecedenceLevel,
    pub origin: &'static Location<'static>,
    edit: EditFn<T>,
}

impl<T> fmt::Debug for Modifier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Modifier")
            .field("level", &self.level)
            .field("origin", &format_args!("{}", self.origin))
            .finish()
    }
}

/// Ordered list of (level, edit) pairs for one pending type or member
pub struct DeferredModifiers<T> {
    entries: Vec<Modifier<T>>,
}

impl<T> Default for DeferredModifiers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for DeferredModifiers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.iter()).finish()
    }
}

impl<T> DeferredModifiers<T> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Record an edit. Nothing is applied until `realize`.
    pub fn push<F>(&mut self, level: PrecedenceLevel, origin: &'static Location<'static>, edit: F)
    where
        F: FnOnce(&mut T) -> Result<()> + 'static,
    {
        self.entries.push(Modifier {
            level,
            origin,
            edit: Box::new(edit),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Levels of the recorded edits, in insertion order
    pub fn levels(&self) -> impl Iterator<Item = PrecedenceLevel> + '_ {
        self.entries.iter().map(|m| m.level)
    }

    /// Concatenate another list. Order across the merge does not matter:
    /// replay re-groups by level.
    pub fn merge(&mut self, other: DeferredModifiers<T>) {
        self.entries.extend(other.entries);
    }

    /// Apply every edit to `target`, lowest level first, stable within a level.
    ///
    /// `subject` names the edited entity in error messages.
    pub fn realize(self, target: &mut T, subject: &str) -> Result<()> {
        let mut entries = self.entries;
        // sort_by_key is stable: insertion order survives within a level
        entries.sort_by_key(|m| m.level);

        for modifier in entries {
            let Modifier { level, origin, edit } = modifier;
            edit(target).map_err(|err| attribute(err, subject, level, origin))?;
        }

        Ok(())
    }
}

/// Fill in the level and origin of a bare edit failure
fn attribute(
    err: SchemaError,
    subject: &str,
    level: PrecedenceLevel,
    origin: &'static Location<'static>,
) -> SchemaError {
    match err {
        SchemaError::Modifier { target, message, .. } if target.is_empty() => SchemaError::Modifier {
            target: subject.to_string(),
            level,
            origin: origin.to_string(),
            message,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Scratch {
        name: String,
        trail: Vec<&'static str>,
    }

    #[track_caller]
    fn here() -> &'static Location<'static> {
        Location::caller()
    }

    #[test]
    fn test_higher_level_wins_regardless_of_order() {
        let mut modifiers = DeferredModifiers::<Scratch>::new();
        modifiers.push(PrecedenceLevel::FluentApi, here(), |s| {
            s.name = "fluent".into();
            Ok(())
        });
        modifiers.push(PrecedenceLevel::Convention, here(), |s| {
            s.name = "convention".into();
            Ok(())
        });
        modifiers.push(PrecedenceLevel::Annotation, here(), |s| {
            s.name = "annotation".into();
            Ok(())
        });

        let mut scratch = Scratch::default();
        modifiers.realize(&mut scratch, "Scratch").unwrap();
        assert_eq!(scratch.name, "fluent");
    }

    #[test]
    fn test_same_level_last_write_wins() {
        let mut modifiers = DeferredModifiers::<Scratch>::new();
        for (name, tag) in [("first", "a"), ("second", "b"), ("third", "c")] {
            modifiers.push(PrecedenceLevel::TypeConfiguration, here(), move |s| {
                s.name = name.into();
                s.trail.push(tag);
                Ok(())
            });
        }

        let mut scratch = Scratch::default();
        modifiers.realize(&mut scratch, "Scratch").unwrap();
        assert_eq!(scratch.name, "third");
        assert_eq!(scratch.trail, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_merge_order_is_irrelevant() {
        let build = |first_fluent: bool| {
            let mut fluent = DeferredModifiers::<Scratch>::new();
            fluent.push(PrecedenceLevel::FluentApi, here(), |s| {
                s.name = "fluent".into();
                Ok(())
            });
            let mut annotated = DeferredModifiers::<Scratch>::new();
            annotated.push(PrecedenceLevel::Annotation, here(), |s| {
                s.name = "annotation".into();
                Ok(())
            });

            let mut merged = DeferredModifiers::new();
            if first_fluent {
                merged.merge(fluent);
                merged.merge(annotated);
            } else {
                merged.merge(annotated);
                merged.merge(fluent);
            }
            let mut scratch = Scratch::default();
            merged.realize(&mut scratch, "Scratch").unwrap();
            scratch.name
        };

        assert_eq!(build(true), "fluent");
        assert_eq!(build(false), "fluent");
    }

    #[test]
    fn test_failing_edit_reports_level_and_origin() {
        let mut modifiers = DeferredModifiers::<Scratch>::new();
        modifiers.push(PrecedenceLevel::Annotation, here(), |_| {
            Err(SchemaError::edit("no such member"))
        });

        let err = modifiers
            .realize(&mut Scratch::default(), "Person")
            .unwrap_err();
        match err {
            SchemaError::Modifier { target, level, origin, message } => {
                assert_eq!(target, "Person");
                assert_eq!(level, PrecedenceLevel::Annotation);
                assert!(origin.contains("modifier.rs"));
                assert_eq!(message, "no such member");
            }
            other => panic!("Expected Modifier, got {:?}", other),
        }
    }

    #[test]
    fn test_levels_reflect_insertion_order() {
        let mut modifiers = DeferredModifiers::<Scratch>::new();
        modifiers.push(PrecedenceLevel::FluentApi, here(), |_| Ok(()));
        modifiers.push(PrecedenceLevel::Convention, here(), |_| Ok(()));
        let levels: Vec<_> = modifiers.levels().collect();
        assert_eq!(levels, vec![PrecedenceLevel::FluentApi, PrecedenceLevel::Convention]);
        assert_eq!(modifiers.len(), 2);
    }
}
