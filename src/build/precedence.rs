//! Precedence Levels
//!
//! Which configuration source is active while modifiers are recorded.
//! A stack (not a single value) because convention application nests: a
//! schema-wide pass may apply type conventions, which apply annotations, and
//! each must restore the outer level on return.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Authorship tier of an edit. Higher levels win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrecedenceLevel {
    Convention,
    Annotation,
    TypeConfiguration,
    FluentApi,
}

impl PrecedenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrecedenceLevel::Convention => "convention",
            PrecedenceLevel::Annotation => "annotation",
            PrecedenceLevel::TypeConfiguration => "type-configuration",
            PrecedenceLevel::FluentApi => "fluent-api",
        }
    }
}

impl fmt::Display for PrecedenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared handle to the active-level stack.
///
/// The bottom of the stack is always `FluentApi`: calls made directly on a
/// builder are fluent calls. Other levels are entered with `enter`, which
/// returns a guard that pops on drop.
#[derive(Debug, Clone)]
pub struct PrecedenceStack {
    levels: Rc<RefCell<Vec<PrecedenceLevel>>>,
}

impl Default for PrecedenceStack {
    fn default() -> Self {
        Self::new()
    }
}

impl PrecedenceStack {
    pub fn new() -> Self {
        Self {
            levels: Rc::new(RefCell::new(vec![PrecedenceLevel::FluentApi])),
        }
    }

    /// The level edits are currently recorded at
    pub fn current(&self) -> PrecedenceLevel {
        self.levels
            .borrow()
            .last()
            .copied()
            .unwrap_or(PrecedenceLevel::FluentApi)
    }

    /// Number of entered scopes above the base level
    pub fn depth(&self) -> usize {
        self.levels.borrow().len().saturating_sub(1)
    }

    /// Enter `level` until the returned guard is dropped
    #[must_use = "the level is popped as soon as the scope guard is dropped"]
    pub fn enter(&self, level: PrecedenceLevel) -> PrecedenceScope {
        self.levels.borrow_mut().push(level);
        PrecedenceScope {
            levels: Rc::clone(&self.levels),
            level,
        }
    }
}

/// Guard returned by `PrecedenceStack::enter`
#[derive(Debug)]
pub struct PrecedenceScope {
    levels: Rc<RefCell<Vec<PrecedenceLevel>>>,
    level: PrecedenceLevel,
}

impl PrecedenceScope {
    pub fn level(&self) -> PrecedenceLevel {
        self.level
    }
}

impl Drop for PrecedenceScope {
    fn drop(&mut self) {
        let mut levels = self.levels.borrow_mut();
        // Guards drop in reverse order of creation, the base entry is never popped.
        if levels.len() > 1 {
            let popped = levels.pop();
            debug_assert_eq!(popped, Some(self.level), "precedence scopes dropped out of order");
        }
    }
}
