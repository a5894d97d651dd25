//! Constant pool storage and resolution.
//!
//! The tagged-slot model, the pool container and its resolution engine,
//! single-threaded construction, and the auxiliary tables resolution
//! publishes into: the resolved-reference side table, the bootstrap
//! specifier encoding and the sticky error table.
//!
//! # Key Components
//!
//! - [`ConstantPool`] - per-class constant table with lock-free resolved reads
//! - [`PoolBuilder`] - parser-facing construction and validation
//! - [`Tag`] - slot discriminant and resolution-state signal
//! - [`BsmAttributeTable`] / [`BsmTableBuilder`] - bootstrap specifier encoding

mod bsm;
mod builder;
mod error_table;
mod pool;
mod refs;
mod slot;
mod tag;

pub use bsm::{BsmAttributeTable, BsmTableBuilder};
pub use builder::PoolBuilder;
pub use pool::ConstantPool;
pub use tag::Tag;
