//! Resolved invocation entries.

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use crate::cache::bytecode::Bytecode;
use crate::runtime::MethodRc;

/// Sentinel in the table-index cell while no dispatch index is bound.
const NO_TABLE_INDEX: u32 = u32::MAX;

/// How a bound call site dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// Direct call to a known method (static, special, final virtual).
    Direct,
    /// Virtual dispatch through the receiver's vtable.
    Vtable,
    /// Interface dispatch through the receiver's itable.
    Itable,
}

/// One rewritten invocation site.
///
/// Bound once, single-threaded per entry, under the interpreter's
/// first-execution guard. Rebinding must be idempotent (same method, same
/// dispatch) and is asserted rather than handled. The opcode byte is the
/// publication signal, release-stored last.
#[derive(Debug)]
pub struct ResolvedMethodEntry {
    pool_index: u16,
    method: OnceLock<MethodRc>,
    table_index: AtomicU32,
    kind: AtomicU8,
    bytecode: AtomicU8,
}

impl ResolvedMethodEntry {
    pub(crate) fn new(pool_index: u16) -> Self {
        ResolvedMethodEntry {
            pool_index,
            method: OnceLock::new(),
            table_index: AtomicU32::new(NO_TABLE_INDEX),
            kind: AtomicU8::new(0),
            bytecode: AtomicU8::new(0),
        }
    }

    /// Constant pool index of the member reference this entry rewrites.
    #[must_use]
    pub fn pool_index(&self) -> u16 {
        self.pool_index
    }

    fn bind(&self, code: Bytecode, method: MethodRc, kind: CallKind, table_index: u32) {
        debug_assert!(code.is_invoke(), "binding a method entry to {code}");
        let bound = self.method.get_or_init(|| method.clone());
        debug_assert!(
            Arc::ptr_eq(bound, &method),
            "call site for pool index {} rebound to a different method",
            self.pool_index
        );
        debug_assert!(
            {
                let previous = self.table_index.load(Ordering::Relaxed);
                previous == NO_TABLE_INDEX || previous == table_index
            },
            "call site for pool index {} rebound to a different dispatch index",
            self.pool_index
        );

        self.table_index.store(table_index, Ordering::Relaxed);
        self.kind.store(kind as u8, Ordering::Relaxed);
        // Publication signal last.
        self.bytecode.store(code as u8, Ordering::Release);
    }

    /// Binds a direct call (static, special, or effectively-final virtual).
    pub fn set_direct_call(&self, code: Bytecode, method: MethodRc) {
        self.bind(code, method, CallKind::Direct, NO_TABLE_INDEX);
    }

    /// Binds a virtual call dispatching through vtable slot `vtable_index`.
    pub fn set_vtable_call(&self, code: Bytecode, method: MethodRc, vtable_index: u32) {
        self.bind(code, method, CallKind::Vtable, vtable_index);
    }

    /// Binds an interface call dispatching through itable slot `itable_index`.
    pub fn set_itable_call(&self, code: Bytecode, method: MethodRc, itable_index: u32) {
        self.bind(code, method, CallKind::Itable, itable_index);
    }

    /// Returns `true` once the entry is resolved for `code`.
    #[must_use]
    pub fn is_resolved(&self, code: Bytecode) -> bool {
        self.bytecode.load(Ordering::Acquire) == code as u8
    }

    /// Non-blocking peek at the bound method; never triggers resolution.
    ///
    /// Reserved for compiler speculation and deoptimization checks.
    #[must_use]
    pub fn method_if_resolved(&self) -> Option<MethodRc> {
        if self.bytecode.load(Ordering::Acquire) != 0 {
            self.method.get().cloned()
        } else {
            None
        }
    }

    /// Dispatch kind, once bound.
    #[must_use]
    pub fn call_kind(&self) -> Option<CallKind> {
        if self.bytecode.load(Ordering::Acquire) == 0 {
            return None;
        }
        match self.kind.load(Ordering::Relaxed) {
            0 => Some(CallKind::Direct),
            1 => Some(CallKind::Vtable),
            2 => Some(CallKind::Itable),
            _ => None,
        }
    }

    /// The vtable/itable slot for table-dispatched calls.
    #[must_use]
    pub fn table_index(&self) -> Option<u32> {
        match self.table_index.load(Ordering::Relaxed) {
            NO_TABLE_INDEX => None,
            index => Some(index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{Method, MethodFlags, SymbolTable};

    fn test_method(name: &str) -> MethodRc {
        let symbols = SymbolTable::new();
        Arc::new(Method {
            holder: symbols.intern("Holder"),
            name: symbols.intern(name),
            descriptor: symbols.intern("()V"),
            flags: MethodFlags::PUBLIC,
            vtable_index: None,
        })
    }

    #[test]
    fn test_direct_call_binding() {
        let entry = ResolvedMethodEntry::new(9);
        assert!(entry.method_if_resolved().is_none());
        assert_eq!(entry.call_kind(), None);

        entry.set_direct_call(Bytecode::InvokeStatic, test_method("init"));

        assert!(entry.is_resolved(Bytecode::InvokeStatic));
        assert!(!entry.is_resolved(Bytecode::InvokeVirtual));
        assert_eq!(entry.call_kind(), Some(CallKind::Direct));
        assert_eq!(entry.table_index(), None);
        assert!(entry.method_if_resolved().is_some());
    }

    #[test]
    fn test_vtable_call_binding() {
        let entry = ResolvedMethodEntry::new(9);
        entry.set_vtable_call(Bytecode::InvokeVirtual, test_method("run"), 11);

        assert_eq!(entry.call_kind(), Some(CallKind::Vtable));
        assert_eq!(entry.table_index(), Some(11));
    }

    #[test]
    fn test_itable_call_binding() {
        let entry = ResolvedMethodEntry::new(9);
        entry.set_itable_call(Bytecode::InvokeInterface, test_method("accept"), 2);

        assert_eq!(entry.call_kind(), Some(CallKind::Itable));
        assert_eq!(entry.table_index(), Some(2));
    }

    #[test]
    fn test_idempotent_rebind() {
        let method = test_method("run");
        let entry = ResolvedMethodEntry::new(9);
        entry.set_vtable_call(Bytecode::InvokeVirtual, method.clone(), 11);
        entry.set_vtable_call(Bytecode::InvokeVirtual, method, 11);
        assert_eq!(entry.table_index(), Some(11));
    }
}
