//! Runtime value model and collaborator seams.
//!
//! This module contains the entities the constant pool resolves to — interned
//! [`Symbol`]s, resolved [`Klass`]/[`Method`]/[`Field`] identities and
//! GC-visible [`HeapRef`]s — plus the [`RuntimeEnv`] trait through which the
//! engine reaches the out-of-scope collaborators (class loading, string
//! interning, bootstrap invocation).
//!
//! Nothing in here performs resolution itself; see [`crate::pool`] for the
//! resolution engine and [`crate::loading`] for load coordination.

mod env;
mod klass;
mod object;
mod symbol;

pub use env::{BootstrapSpecifier, RefKind, RuntimeEnv};
pub use klass::{
    BasicType, Field, FieldFlags, FieldRc, Klass, KlassFlags, KlassRc, LoaderId, Method,
    MethodFlags, MethodRc,
};
pub use object::{ConstantValue, HeapObject, HeapRef};
pub use symbol::{Symbol, SymbolTable};
