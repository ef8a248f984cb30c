//! Static scope tracking for the resolver.
//!
//! A [`ScopeStack`] mirrors, at resolution time, the frame stack the
//! interpreter will maintain at run time. Each scope maps names to a
//! [`BindingState`]: `Declared` reserves the name while its initializer
//! resolves, `Defined` marks the initializer complete. The distinction is
//! what makes `var x = x;` detectable.

use plox_util::{FxHashMap, Symbol};

/// State of a name inside one static scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingState {
    /// Name reserved; its initializer has not finished resolving.
    Declared,
    /// Name fully usable.
    Defined,
}

/// Stack of static scopes, innermost last.
///
/// The global scope is intentionally not represented here; names that
/// walk off the stack are left unresolved and looked up by name in the
/// interpreter's global frame.
#[derive(Default)]
pub struct ScopeStack {
    scopes: Vec<FxHashMap<Symbol, BindingState>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    /// Open a new innermost scope.
    pub fn push(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    /// Close the innermost scope.
    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    /// Whether any scope is open (false at the top level).
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Number of open scopes.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Reserve `name` in the innermost scope. No-op at the top level.
    pub fn declare(&mut self, name: Symbol) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, BindingState::Declared);
        }
    }

    /// Mark `name` in the innermost scope as usable. No-op at the top
    /// level.
    pub fn define(&mut self, name: Symbol) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, BindingState::Defined);
        }
    }

    /// The state of `name` in the innermost scope only.
    pub fn innermost_state(&self, name: Symbol) -> Option<BindingState> {
        self.scopes.last().and_then(|scope| scope.get(&name)).copied()
    }

    /// Walk scopes from innermost outward; the number of steps to the
    /// first scope containing `name` (0 = innermost), or `None` when the
    /// name is nowhere on the stack.
    pub fn distance_of(&self, name: Symbol) -> Option<usize> {
        for (steps, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name) {
                return Some(steps);
            }
        }
        None
    }
}
