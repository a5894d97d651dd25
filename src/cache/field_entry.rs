//! Resolved field-access entries.

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use crate::cache::bytecode::Bytecode;
use crate::runtime::{BasicType, FieldFlags, FieldRc};

/// One rewritten field-access site.
///
/// Filled exactly once under the interpreter's first-execution guard; the
/// hot path afterwards reads only the flat copies (offset, value category,
/// flags) without touching the field identity. The opcode bytes are the
/// publication signal: they are release-stored after every other member, so
/// an acquire-load observing the opcode guarantees a fully-written entry.
#[derive(Debug)]
pub struct ResolvedFieldEntry {
    pool_index: u16,
    field: OnceLock<FieldRc>,
    offset: AtomicU32,
    tos: AtomicU8,
    is_final: AtomicU8,
    is_volatile: AtomicU8,
    get_code: AtomicU8,
    put_code: AtomicU8,
}

impl ResolvedFieldEntry {
    pub(crate) fn new(pool_index: u16) -> Self {
        ResolvedFieldEntry {
            pool_index,
            field: OnceLock::new(),
            offset: AtomicU32::new(0),
            tos: AtomicU8::new(0),
            is_final: AtomicU8::new(0),
            is_volatile: AtomicU8::new(0),
            get_code: AtomicU8::new(0),
            put_code: AtomicU8::new(0),
        }
    }

    /// Constant pool index of the member reference this entry rewrites.
    #[must_use]
    pub fn pool_index(&self) -> u16 {
        self.pool_index
    }

    /// Binds the site to its resolved field.
    ///
    /// `put_code` is absent for sites that may only read (final fields
    /// outside their initializer). Overwriting an already-bound entry must
    /// bind the same field; that is asserted, not treated as an error.
    pub fn fill(&self, field: FieldRc, get_code: Bytecode, put_code: Option<Bytecode>) {
        let bound = self.field.get_or_init(|| field.clone());
        debug_assert!(
            Arc::ptr_eq(bound, &field),
            "field entry for pool index {} rebound to a different field",
            self.pool_index
        );

        self.offset.store(bound.offset, Ordering::Relaxed);
        self.tos.store(bound.tos as u8, Ordering::Relaxed);
        self.is_final
            .store(u8::from(bound.flags.contains(FieldFlags::FINAL)), Ordering::Relaxed);
        self.is_volatile.store(
            u8::from(bound.flags.contains(FieldFlags::VOLATILE)),
            Ordering::Relaxed,
        );

        // Publication signal last.
        self.get_code.store(get_code as u8, Ordering::Release);
        if let Some(put) = put_code {
            self.put_code.store(put as u8, Ordering::Release);
        }
    }

    /// Returns `true` once the entry is resolved for `code`.
    #[must_use]
    pub fn is_resolved(&self, code: Bytecode) -> bool {
        let cell = if code == Bytecode::PutField || code == Bytecode::PutStatic {
            &self.put_code
        } else {
            &self.get_code
        };
        cell.load(Ordering::Acquire) == code as u8
    }

    /// Non-blocking peek at the bound field; never triggers resolution.
    #[must_use]
    pub fn field_if_resolved(&self) -> Option<FieldRc> {
        if self.get_code.load(Ordering::Acquire) != 0
            || self.put_code.load(Ordering::Acquire) != 0
        {
            self.field.get().cloned()
        } else {
            None
        }
    }

    /// Resolved field offset. Meaningful only after [`ResolvedFieldEntry::is_resolved`].
    #[must_use]
    pub fn offset(&self) -> u32 {
        self.offset.load(Ordering::Relaxed)
    }

    /// Resolved value category. Meaningful only after [`ResolvedFieldEntry::is_resolved`].
    #[must_use]
    pub fn tos(&self) -> Option<BasicType> {
        BasicType::from_repr(self.tos.load(Ordering::Relaxed))
    }

    /// Whether the bound field is final.
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.is_final.load(Ordering::Relaxed) != 0
    }

    /// Whether the bound field is volatile.
    #[must_use]
    pub fn is_volatile(&self) -> bool {
        self.is_volatile.load(Ordering::Relaxed) != 0
    }
}
