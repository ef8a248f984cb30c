//! String interning.
//!
//! A [`Symbol`] is a compact 4-byte handle to a string stored in a global
//! table. Interning makes identifier comparison an integer comparison and
//! lets tokens, AST nodes, and environment frames share name storage.
//!
//! Strings are never removed from the table; each unique string is leaked
//! once to obtain a `'static` lifetime. The set of unique names in a
//! program is bounded, so this is acceptable for an interpreter.

use std::fmt;
use std::sync::{Mutex, OnceLock};

use rustc_hash::FxHashMap;

/// Interned string handle.
///
/// Two symbols compare equal exactly when the strings they intern are
/// equal, so `Symbol` can be used directly as a map key.
///
/// # Examples
///
/// ```
/// use plox_util::Symbol;
///
/// let a = Symbol::intern("bakery");
/// let b = Symbol::intern("bakery");
/// let c = Symbol::intern("store");
///
/// assert_eq!(a, b);
/// assert_ne!(a, c);
/// assert_eq!(a.as_str(), "bakery");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
    /// Index into the global string table.
    index: u32,
}

impl Symbol {
    /// Intern a string, returning its symbol.
    ///
    /// Repeated calls with the same string return the same symbol.
    pub fn intern(string: &str) -> Self {
        table().lock().expect("string table poisoned").intern(string)
    }

    /// Get the string this symbol was interned from.
    pub fn as_str(&self) -> &'static str {
        table()
            .lock()
            .expect("string table poisoned")
            .get(*self)
            .expect("symbol not present in string table")
    }

    /// The raw table index, for debugging.
    pub fn as_u32(&self) -> u32 {
        self.index
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Global string table.
///
/// Maps strings to indices and stores the leaked string data for `'static`
/// access. Guarded by a mutex; interning is rare enough (once per unique
/// name per program) that contention is not a concern.
struct StringTable {
    index: FxHashMap<&'static str, u32>,
    strings: Vec<&'static str>,
}

impl StringTable {
    fn new() -> Self {
        Self {
            index: FxHashMap::default(),
            strings: Vec::new(),
        }
    }

    fn intern(&mut self, string: &str) -> Symbol {
        if let Some(&index) = self.index.get(string) {
            return Symbol { index };
        }

        // Leak once per unique string to get a 'static lifetime.
        let interned: &'static str = Box::leak(string.to_owned().into_boxed_str());
        let index = self.strings.len() as u32;
        self.strings.push(interned);
        self.index.insert(interned, index);

        Symbol { index }
    }

    fn get(&self, symbol: Symbol) -> Option<&'static str> {
        self.strings.get(symbol.index as usize).copied()
    }
}

fn table() -> &'static Mutex<StringTable> {
    static TABLE: OnceLock<Mutex<StringTable>> = OnceLock::new();
    TABLE.get_or_init(|| Mutex::new(StringTable::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_same_string_same_symbol() {
        let a = Symbol::intern("foo");
        let b = Symbol::intern("foo");
        assert_eq!(a, b);
        assert_eq!(a.as_u32(), b.as_u32());
    }

    #[test]
    fn test_intern_different_strings_differ() {
        let a = Symbol::intern("alpha");
        let b = Symbol::intern("beta");
        assert_ne!(a, b);
    }

    #[test]
    fn test_as_str_round_trip() {
        let s = Symbol::intern("round_trip_name");
        assert_eq!(s.as_str(), "round_trip_name");
    }

    #[test]
    fn test_empty_string() {
        let s = Symbol::intern("");
        assert_eq!(s.as_str(), "");
    }

    #[test]
    fn test_display_uses_string() {
        let s = Symbol::intern("display_me");
        assert_eq!(format!("{}", s), "display_me");
    }

    #[test]
    fn test_symbol_is_small() {
        assert_eq!(std::mem::size_of::<Symbol>(), 4);
    }
}
