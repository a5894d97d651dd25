//! Class-loading coordination.
//!
//! Home of the placeholder table, the single source of truth for "is this
//! (name, loader) pair currently being loaded, by whom, and at what stage".
//! The class-loading orchestrator consults it exactly once per loading phase
//! transition; see [`PlaceholderTable`].

mod placeholder;

pub use placeholder::{
    LoadAction, PlaceholderEntry, PlaceholderGuard, PlaceholderKey, PlaceholderTable,
};
