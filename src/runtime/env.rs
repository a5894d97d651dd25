//! Collaborator seam between the resolution engine and the surrounding runtime.
//!
//! Class loading, string interning and bootstrap-method invocation are
//! black-box capabilities of the class-loading orchestrator; the engine calls
//! them through [`RuntimeEnv`] and never holds an internal lock across the
//! call, because any of them may block indefinitely, recurse into further
//! resolution, or trigger a collection.
//!
//! # Idempotency contract
//!
//! `resolve_or_fail` must be idempotent: resolving the same (name, loader)
//! pair twice returns the identical [`KlassRc`]. Racing pool resolutions rely
//! on this — both racers may invoke the loader, and whichever publish wins
//! must be semantically identical to the loser's.
//!
//! Bootstrap methods carry no such guarantee from this subsystem. Whether a
//! bootstrap method tolerates being invoked more than once under a resolution
//! race is an obligation of the bootstrap method author, not enforced here.

use strum::FromRepr;

use crate::runtime::klass::{KlassRc, LoaderId};
use crate::runtime::object::HeapRef;
use crate::runtime::symbol::Symbol;
use crate::Result;

/// Dispatch behavior encoded in a method-handle constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
#[repr(u8)]
pub enum RefKind {
    /// Read an instance field.
    GetField = 1,
    /// Read a static field.
    GetStatic = 2,
    /// Write an instance field.
    PutField = 3,
    /// Write a static field.
    PutStatic = 4,
    /// Invoke virtually.
    InvokeVirtual = 5,
    /// Invoke statically.
    InvokeStatic = 6,
    /// Invoke with special (non-virtual) semantics.
    InvokeSpecial = 7,
    /// Invoke a constructor.
    NewInvokeSpecial = 8,
    /// Invoke through an interface.
    InvokeInterface = 9,
}

/// A fully resolved bootstrap specifier, ready for invocation.
///
/// Produced by `resolve_bootstrap_specifier_at`: the bootstrap method handle
/// and every static argument have already been resolved through the pool
/// before the orchestrator is asked to perform the actual invocation.
#[derive(Debug)]
pub struct BootstrapSpecifier {
    /// The resolved bootstrap method handle.
    pub method_handle: HeapRef,
    /// Name from the specifier's name-and-type, e.g. the dynamic constant or
    /// call-site name.
    pub name: Symbol,
    /// Descriptor from the specifier's name-and-type.
    pub descriptor: Symbol,
    /// Resolved static arguments, in specifier order.
    pub arguments: Vec<HeapRef>,
}

/// Runtime capabilities the resolution engine consumes.
///
/// Implementations wrap the class-loading orchestrator, the string table and
/// the method-handle machinery. All methods may be called concurrently from
/// unbounded application threads.
pub trait RuntimeEnv: Send + Sync {
    /// Loads (or finds already-loaded) the named class as seen by `loader`.
    ///
    /// Must return the identical handle for repeated calls with the same
    /// arguments; see the module documentation for why.
    ///
    /// # Errors
    /// Returns a linkage-family error when the class cannot be found, is not
    /// accessible, or violates a loader constraint.
    fn resolve_or_fail(&self, name: &Symbol, loader: LoaderId) -> Result<KlassRc>;

    /// Interns string contents, returning the canonical heap reference.
    ///
    /// Repeated calls with equal contents must return the same reference.
    fn intern_string(&self, contents: &str) -> HeapRef;

    /// Produces the method-handle object for a resolved member reference.
    ///
    /// # Errors
    /// Returns a linkage-family error when the member does not exist on the
    /// holder or is not accessible with the requested dispatch kind.
    fn link_method_handle(
        &self,
        kind: RefKind,
        holder: &KlassRc,
        name: &Symbol,
        descriptor: &Symbol,
    ) -> Result<HeapRef>;

    /// Produces the method-type object for a method descriptor.
    ///
    /// # Errors
    /// Returns a linkage-family error when the descriptor references classes
    /// that cannot be resolved.
    fn link_method_type(&self, descriptor: &Symbol) -> Result<HeapRef>;

    /// Invokes a bootstrap method and returns its product (a dynamic constant
    /// value, or a call-site object for dynamic call sites).
    ///
    /// # Errors
    /// Returns [`crate::Error::Linkage`] with
    /// [`crate::LinkageKind::BootstrapMethodFailed`] when the invocation
    /// completes abruptly.
    fn invoke_bootstrap_method(&self, specifier: &BootstrapSpecifier) -> Result<HeapRef>;
}
