//! # klasspool Prelude
//!
//! This module provides a convenient prelude for the most commonly used types
//! and traits of the library. Import it to get quick access to the essential
//! surface for building, resolving and coordinating constant pools.
//!
//! # Usage
//!
//! ```rust
//! use klasspool::prelude::*;
//!
//! let symbols = SymbolTable::new();
//! let builder = PoolBuilder::new(symbols.intern("Example"), LoaderId::BOOTSTRAP);
//! let pool = builder.build().unwrap();
//! assert_eq!(pool.len(), 1);
//! ```

pub use crate::{Error, LinkageKind, Result};

pub use crate::pool::{BsmAttributeTable, BsmTableBuilder, ConstantPool, PoolBuilder, Tag};

pub use crate::cache::{
    Bytecode, CallKind, ResolutionCache, ResolvedFieldEntry, ResolvedIndyEntry,
    ResolvedMethodEntry,
};

pub use crate::loading::{LoadAction, PlaceholderEntry, PlaceholderKey, PlaceholderTable};

pub use crate::runtime::{
    BasicType, BootstrapSpecifier, ConstantValue, Field, FieldFlags, FieldRc, HeapObject,
    HeapRef, Klass, KlassFlags, KlassRc, LoaderId, Method, MethodFlags, MethodRc, RefKind,
    RuntimeEnv, Symbol, SymbolTable,
};
