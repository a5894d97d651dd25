//! Resolved runtime class, method and field identities.
//!
//! These are the entities the constant pool resolves *to*. The pool itself
//! never constructs them; the class-loading collaborator produces them and the
//! pool only stores and republishes the handles. The shapes here are the
//! minimum the resolution contracts need: a stable identity, access flags, and
//! the member lists that dispatch binding reads.

use std::sync::{Arc, OnceLock};

use bitflags::bitflags;
use strum::FromRepr;

use crate::runtime::symbol::Symbol;

/// Identity of a defining class loader.
///
/// The engine never calls into loader code directly; it only keys data
/// structures by loader identity. The bootstrap loader is id 0 by convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoaderId(pub u32);

impl LoaderId {
    /// The bootstrap (initial) class loader.
    pub const BOOTSTRAP: LoaderId = LoaderId(0);
}

bitflags! {
    /// Class access and property flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct KlassFlags: u16 {
        /// Declared public.
        const PUBLIC = 0x0001;
        /// Declared final; no subclasses allowed.
        const FINAL = 0x0010;
        /// Is an interface, not a class.
        const INTERFACE = 0x0200;
        /// Declared abstract.
        const ABSTRACT = 0x0400;
    }
}

bitflags! {
    /// Field access and property flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FieldFlags: u16 {
        /// Declared public.
        const PUBLIC = 0x0001;
        /// Declared private.
        const PRIVATE = 0x0002;
        /// Declared static.
        const STATIC = 0x0008;
        /// Declared final; writable only from initializers.
        const FINAL = 0x0010;
        /// Declared volatile; accesses carry memory ordering.
        const VOLATILE = 0x0040;
    }
}

bitflags! {
    /// Method access and property flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MethodFlags: u16 {
        /// Declared public.
        const PUBLIC = 0x0001;
        /// Declared private.
        const PRIVATE = 0x0002;
        /// Declared static.
        const STATIC = 0x0008;
        /// Declared final; not overridable.
        const FINAL = 0x0010;
        /// Declared abstract; no implementation in this class.
        const ABSTRACT = 0x0400;
    }
}

/// Value category occupying an operand-stack or field slot.
///
/// Resolution caches record this so the interpreter picks the right load/store
/// width without consulting the descriptor string again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr)]
#[repr(u8)]
pub enum BasicType {
    /// `boolean`
    Boolean = 0,
    /// `byte`
    Byte = 1,
    /// `char`
    Char = 2,
    /// `short`
    Short = 3,
    /// `int`
    Int = 4,
    /// `long` (two stack slots)
    Long = 5,
    /// `float`
    Float = 6,
    /// `double` (two stack slots)
    Double = 7,
    /// Reference type
    Object = 8,
    /// `void` (return type only)
    Void = 9,
}

impl BasicType {
    /// Returns `true` for categories occupying two stack slots.
    #[must_use]
    pub fn is_double_word(&self) -> bool {
        matches!(self, BasicType::Long | BasicType::Double)
    }
}

/// A resolved runtime class.
///
/// Identity is the `Arc` allocation: the loading collaborator guarantees that
/// resolving the same (name, loader) pair twice yields the same `Arc`, which
/// is what makes racing constant pool resolutions benign.
pub struct Klass {
    /// Binary class name, e.g. `java/lang/Object`.
    pub name: Symbol,
    /// Identity of the defining loader.
    pub loader: LoaderId,
    /// Access and property flags.
    pub flags: KlassFlags,
    /// Superclass, set once during linking. `None` only for the root class.
    pub super_klass: OnceLock<KlassRc>,
    /// Declared methods, appended during class definition and readable
    /// concurrently thereafter.
    pub methods: boxcar::Vec<MethodRc>,
    /// Declared fields, appended during class definition and readable
    /// concurrently thereafter.
    pub fields: boxcar::Vec<FieldRc>,
}

/// Shared handle to a [`Klass`].
pub type KlassRc = Arc<Klass>;

impl Klass {
    /// Creates a class shell with empty member lists.
    #[must_use]
    pub fn new(name: Symbol, loader: LoaderId, flags: KlassFlags) -> KlassRc {
        Arc::new(Klass {
            name,
            loader,
            flags,
            super_klass: OnceLock::new(),
            methods: boxcar::Vec::new(),
            fields: boxcar::Vec::new(),
        })
    }

    /// Returns `true` if this class is an interface.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.flags.contains(KlassFlags::INTERFACE)
    }

    /// Finds a declared method by name and descriptor.
    #[must_use]
    pub fn find_method(&self, name: &Symbol, descriptor: &Symbol) -> Option<MethodRc> {
        self.methods
            .iter()
            .map(|(_, m)| m)
            .find(|m| &m.name == name && &m.descriptor == descriptor)
            .cloned()
    }

    /// Finds a declared field by name and descriptor.
    #[must_use]
    pub fn find_field(&self, name: &Symbol, descriptor: &Symbol) -> Option<FieldRc> {
        self.fields
            .iter()
            .map(|(_, f)| f)
            .find(|f| &f.name == name && &f.descriptor == descriptor)
            .cloned()
    }
}

impl std::fmt::Debug for Klass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Klass")
            .field("name", &self.name)
            .field("loader", &self.loader)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// A resolved method identity.
#[derive(Debug)]
pub struct Method {
    /// Name of the class declaring this method.
    pub holder: Symbol,
    /// Method name.
    pub name: Symbol,
    /// Method descriptor, e.g. `(ILjava/lang/String;)V`.
    pub descriptor: Symbol,
    /// Access and property flags.
    pub flags: MethodFlags,
    /// Index into the holder's virtual dispatch table, when the method is
    /// virtually dispatched.
    pub vtable_index: Option<u16>,
}

/// Shared handle to a [`Method`].
pub type MethodRc = Arc<Method>;

/// A resolved field identity.
#[derive(Debug)]
pub struct Field {
    /// Name of the class declaring this field.
    pub holder: Symbol,
    /// Field name.
    pub name: Symbol,
    /// Field descriptor, e.g. `Ljava/lang/String;`.
    pub descriptor: Symbol,
    /// Access and property flags.
    pub flags: FieldFlags,
    /// Byte offset of the field within its holder's instance or static area.
    pub offset: u32,
    /// Value category of the field.
    pub tos: BasicType,
}

/// Shared handle to a [`Field`].
pub type FieldRc = Arc<Field>;
