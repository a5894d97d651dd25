//! Interned name symbols.
//!
//! Class names, member names and descriptors are referenced constantly during
//! resolution, so they are interned once and compared cheaply afterwards. A
//! [`Symbol`] is a shared, immutable string handle; the [`SymbolTable`] is the
//! interner that deduplicates contents across every pool built against it.
//!
//! # Thread Safety
//!
//! The table is lock-free: concurrent interns of the same contents race
//! benignly and all callers receive handles to the same backing allocation.

use std::fmt;
use std::sync::Arc;

use crossbeam_skiplist::SkipMap;

/// An interned, immutable name.
///
/// Symbols compare and hash by contents, clone by reference count, and stay
/// alive for as long as any pool slot, placeholder key or error record holds
/// one.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(Arc<str>);

impl Symbol {
    /// Returns the symbol contents as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the length of the symbol in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the symbol is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", &*self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lock-free interner for [`Symbol`] values.
///
/// Backed by a concurrent skip map keyed by contents. Interning the same
/// string twice returns handles sharing one allocation, so symbol equality
/// after interning is effectively pointer equality.
pub struct SymbolTable {
    names: SkipMap<Arc<str>, Symbol>,
}

impl SymbolTable {
    /// Creates an empty symbol table.
    #[must_use]
    pub fn new() -> Self {
        SymbolTable {
            names: SkipMap::new(),
        }
    }

    /// Interns `contents`, returning the canonical [`Symbol`] for it.
    ///
    /// Safe to call from any number of threads concurrently; racing interns
    /// of the same contents converge on one winner.
    pub fn intern(&self, contents: &str) -> Symbol {
        if let Some(entry) = self.names.get(contents) {
            return entry.value().clone();
        }

        let backing: Arc<str> = Arc::from(contents);
        let entry = self
            .names
            .get_or_insert(backing.clone(), Symbol(backing));
        entry.value().clone()
    }

    /// Looks up an already-interned symbol without inserting.
    #[must_use]
    pub fn probe(&self, contents: &str) -> Option<Symbol> {
        self.names.get(contents).map(|entry| entry.value().clone())
    }

    /// Number of distinct symbols interned so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if nothing has been interned yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
