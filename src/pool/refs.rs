//! Resolved-reference side table.
//!
//! Heap-reference-bearing constants (strings, method handles, method types,
//! dynamic constants and call-site products) publish their resolved values
//! here rather than into the slot array: the collector scans this table as a
//! root set, and several pool indices may deduplicate onto one entry. Cells
//! are first-writer-wins — racing resolutions of the same entry produce
//! identical values, so the loser simply adopts the winner's reference.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use crate::runtime::HeapRef;

/// Sentinel in the pool-index map for entries without a reference slot.
const NO_REFERENCE: i32 = -1;

/// Fixed-size table of resolved heap references for one constant pool.
#[derive(Debug)]
pub(crate) struct ResolvedReferences {
    /// One cell per reference index; set at most once.
    cells: Box<[OnceLock<HeapRef>]>,
    /// Pseudo-string marker per cell. Set when an arbitrary object is
    /// patched into a string entry; callers of `string_at` must check it
    /// before treating the reference as an interned string.
    pseudo: Box<[AtomicBool]>,
    /// Constant pool index → reference index, `NO_REFERENCE` when the pool
    /// entry has no reference slot.
    to_reference: Box<[i32]>,
    /// Reference index → originating constant pool index.
    to_pool: Box<[u16]>,
}

impl ResolvedReferences {
    /// Builds the table from the builder-computed index maps.
    pub(crate) fn new(to_reference: Vec<i32>, to_pool: Vec<u16>) -> Self {
        let count = to_pool.len();
        ResolvedReferences {
            cells: (0..count).map(|_| OnceLock::new()).collect(),
            pseudo: (0..count).map(|_| AtomicBool::new(false)).collect(),
            to_reference: to_reference.into_boxed_slice(),
            to_pool: to_pool.into_boxed_slice(),
        }
    }

    /// Number of reference cells.
    pub(crate) fn len(&self) -> usize {
        self.cells.len()
    }

    /// Maps a constant pool index to its reference index, if it has one.
    pub(crate) fn index_of(&self, pool_index: u16) -> Option<u32> {
        match self.to_reference.get(pool_index as usize) {
            Some(&raw) if raw != NO_REFERENCE => Some(raw as u32),
            _ => None,
        }
    }

    /// Maps a reference index back to the pool index that owns it.
    pub(crate) fn pool_index_of(&self, reference_index: u32) -> Option<u16> {
        self.to_pool.get(reference_index as usize).copied()
    }

    /// Reads a published reference; `None` while unresolved.
    pub(crate) fn get(&self, reference_index: u32) -> Option<HeapRef> {
        self.cells
            .get(reference_index as usize)
            .and_then(|cell| cell.get())
            .cloned()
    }

    /// Publishes a resolved reference, first writer wins.
    ///
    /// Returns the winning reference, which every caller must use in place of
    /// its own candidate.
    pub(crate) fn publish(&self, reference_index: u32, value: HeapRef) -> HeapRef {
        self.cells[reference_index as usize]
            .get_or_init(|| value)
            .clone()
    }

    /// Marks a cell as holding a patched pseudo-string.
    pub(crate) fn mark_pseudo(&self, reference_index: u32) {
        self.pseudo[reference_index as usize].store(true, Ordering::Release);
    }

    /// Returns `true` if the cell holds a patched pseudo-string rather than
    /// an interned string.
    pub(crate) fn is_pseudo(&self, reference_index: u32) -> bool {
        self.pseudo[reference_index as usize].load(Ordering::Acquire)
    }
}
