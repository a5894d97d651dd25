// Copyright 2026 The klasspool developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]

//! # klasspool
//!
//! The constant pool resolution and class-loading coordination engine for a
//! JVM-style language runtime. `klasspool` owns the structure that represents
//! a loaded class's symbolic references — to classes, strings, members and
//! dynamic call sites — and resolves them lazily and safely under unbounded
//! concurrent access.
//!
//! ## Features
//!
//! - **Lock-free resolved reads** - resolved entries are read with a tag
//!   acquire-load plus one side-table read; no lock on any read path
//! - **Monotonic resolution** - entries move unresolved → resolved or
//!   unresolved → sticky error, never backwards
//! - **Sticky error caching** - a failed resolution replays the identical
//!   error on every later attempt instead of re-invoking the loader
//! - **Bootstrap specifier support** - variable-length bootstrap argument
//!   lists with a contiguity-checked packed encoding
//! - **Load coordination** - a placeholder table deduplicating concurrent
//!   class loads and recording circularity facts
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use klasspool::prelude::*;
//! # struct Env;
//! # impl RuntimeEnv for Env {
//! #     fn resolve_or_fail(&self, _: &Symbol, _: LoaderId) -> klasspool::Result<KlassRc> { unimplemented!() }
//! #     fn intern_string(&self, _: &str) -> HeapRef { unimplemented!() }
//! #     fn link_method_handle(&self, _: RefKind, _: &KlassRc, _: &Symbol, _: &Symbol) -> klasspool::Result<HeapRef> { unimplemented!() }
//! #     fn link_method_type(&self, _: &Symbol) -> klasspool::Result<HeapRef> { unimplemented!() }
//! #     fn invoke_bootstrap_method(&self, _: &BootstrapSpecifier) -> klasspool::Result<HeapRef> { unimplemented!() }
//! # }
//!
//! let symbols = SymbolTable::new();
//! let mut builder = PoolBuilder::new(symbols.intern("com/example/Main"), LoaderId::BOOTSTRAP);
//! let name = builder.push_utf8(symbols.intern("com/example/Helper"));
//! let class_index = builder.push_class(name);
//! let pool = builder.build()?;
//!
//! let env = Env;
//! let helper = pool.klass_at(class_index, &env)?;
//! assert_eq!(helper.name.as_str(), "com/example/Helper");
//! # Ok::<(), klasspool::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`pool`] - the tagged-slot constant pool and its resolution engine
//! - [`cache`] - bytecode-operand-indexed resolved call/field/call-site results
//! - [`loading`] - the placeholder table coordinating concurrent class loads
//! - [`runtime`] - the value model and the [`runtime::RuntimeEnv`] collaborator seam
//! - [`prelude`] - convenient re-exports of the common surface
//!
//! The engine treats class loading, string interning and bootstrap-method
//! invocation as black-box collaborator capabilities reached through
//! [`runtime::RuntimeEnv`]; bytecode verification, class-file parsing, garbage
//! collection and the interpreter live outside this crate.

#[macro_use]
mod error;
#[macro_use]
mod macros;

pub mod cache;
pub mod loading;
pub mod pool;
pub mod prelude;
pub mod runtime;

pub use error::{Error, LinkageKind};

/// Convenience alias for operations that may fail with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
