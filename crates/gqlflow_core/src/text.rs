//! String interning for schema names.

use rustc_hash::FxHashMap;
use std::cell::RefCell;

/// Scalars every GraphQL schema can reference without declaring them.
pub const BUILTIN_SCALARS: [&str; 5] = ["String", "ID", "Int", "Float", "Boolean"];

/// An interned name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Text(u32);

impl Text {
    /// Creates a text from a raw index.
    #[must_use]
    pub const fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    #[must_use]
    pub const fn as_raw(self) -> u32 {
        self.0
    }
}

/// Deduplicates the names seen while parsing one schema.
///
/// Interior mutability lets the lexer and parser share a `&Interner`.
#[derive(Debug)]
pub struct Interner {
    ids: RefCell<FxHashMap<Box<str>, Text>>,
    names: RefCell<Vec<Box<str>>>,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Interner {
    /// Creates an interner with the built-in scalars pre-registered.
    #[must_use]
    pub fn new() -> Self {
        let interner = Self {
            ids: RefCell::new(FxHashMap::default()),
            names: RefCell::new(Vec::with_capacity(64)),
        };
        for scalar in BUILTIN_SCALARS {
            interner.intern(scalar);
        }
        interner
    }

    /// Interns a name, returning its identifier.
    pub fn intern(&self, name: &str) -> Text {
        if let Some(&id) = self.ids.borrow().get(name) {
            return id;
        }

        let mut names = self.names.borrow_mut();
        let id = Text(u32::try_from(names.len()).unwrap_or(u32::MAX));
        names.push(name.into());
        self.ids.borrow_mut().insert(name.into(), id);
        id
    }

    /// Looks up a name without interning it.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Text> {
        self.ids.borrow().get(name).copied()
    }

    /// Returns the name behind an identifier.
    ///
    /// Unknown identifiers resolve to the empty string.
    #[must_use]
    pub fn get(&self, id: Text) -> String {
        self.names
            .borrow()
            .get(id.0 as usize)
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    /// Returns the number of interned names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.borrow().len()
    }

    /// Returns true if no names are interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_deduplicates() {
        let interner = Interner::new();
        let a = interner.intern("Repository");
        let b = interner.intern("Repository");
        let c = interner.intern("Issue");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(interner.get(c), "Issue");
    }

    #[test]
    fn test_builtin_scalars_preregistered() {
        let interner = Interner::new();
        assert_eq!(interner.len(), BUILTIN_SCALARS.len());
        assert_eq!(interner.lookup("ID"), Some(Text::from_raw(1)));
        assert_eq!(interner.lookup("DateTime"), None);
    }

    #[test]
    fn test_unknown_text() {
        let interner = Interner::new();
        assert_eq!(interner.get(Text::from_raw(999)), "");
    }
}
