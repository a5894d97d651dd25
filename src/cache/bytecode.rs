//! The rewritten-operand bytecodes the cache binds.

use strum::{Display, FromRepr};

/// Field-access and invocation bytecodes whose operands are rewritten to
/// resolution cache indices.
///
/// The numeric values are the class-file opcodes; a cache entry stores the
/// opcode it was resolved for as its publication signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, Display)]
#[repr(u8)]
pub enum Bytecode {
    /// Read a static field.
    GetStatic = 0xb2,
    /// Write a static field.
    PutStatic = 0xb3,
    /// Read an instance field.
    GetField = 0xb4,
    /// Write an instance field.
    PutField = 0xb5,
    /// Invoke virtually through the vtable.
    InvokeVirtual = 0xb6,
    /// Invoke with special (non-virtual) semantics.
    InvokeSpecial = 0xb7,
    /// Invoke statically.
    InvokeStatic = 0xb8,
    /// Invoke through an interface itable.
    InvokeInterface = 0xb9,
    /// Invoke a dynamically computed call site.
    InvokeDynamic = 0xba,
}

impl Bytecode {
    /// Returns `true` for the field-access opcodes.
    #[must_use]
    pub fn is_field_access(&self) -> bool {
        matches!(
            self,
            Bytecode::GetStatic | Bytecode::PutStatic | Bytecode::GetField | Bytecode::PutField
        )
    }

    /// Returns `true` for the invocation opcodes.
    #[must_use]
    pub fn is_invoke(&self) -> bool {
        !self.is_field_access()
    }
}
