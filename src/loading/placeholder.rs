//! The placeholder table: class-loading coordination and circularity facts.
//!
//! One entry per (class name, defining loader) pair currently in some phase
//! of loading. The table deduplicates concurrent loads, records which threads
//! wait on which loading stage, and records the superclass being loaded so
//! the orchestrator can detect circular dependencies. The table itself only
//! records facts; policy (when to raise [`crate::Error::Circularity`], when
//! to retry a define) belongs to the orchestrator.
//!
//! # Concurrency discipline
//!
//! Unlike the constant pool, every operation — mutation *and* inspection —
//! requires the table's single coordination mutex. Class loading throughput
//! is orders of magnitude below constant resolution throughput, so a single
//! lock is the right shape; making the guard the only path to the data makes
//! the discipline a type-system invariant instead of a comment. The guard
//! also carries the condition variable used by threads waiting for another
//! thread's class definition to complete.

use std::collections::{HashMap, VecDeque};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::thread::ThreadId;

use crate::runtime::{KlassRc, LoaderId, Symbol};

/// A loading stage a thread can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadAction {
    /// Loading the class on behalf of an instance creation / direct request.
    LoadInstance,
    /// Loading the class as someone's superclass or superinterface.
    LoadSuper,
    /// Waiting to define (or defining) the class.
    DefineClass,
}

/// Key of a placeholder entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlaceholderKey {
    /// Binary class name.
    pub name: Symbol,
    /// Identity of the requesting loader.
    pub loader: LoaderId,
}

/// State of one (name, loader) pair mid-load.
///
/// The three queues are independent: the same key can simultaneously have
/// super-load waiters and instance-load waiters when loads nest. An entry is
/// removable only when all three queues are empty and no definer is set.
#[derive(Debug, Default)]
pub struct PlaceholderEntry {
    supername: Option<Symbol>,
    super_queue: VecDeque<ThreadId>,
    instance_queue: VecDeque<ThreadId>,
    define_queue: VecDeque<ThreadId>,
    definer: Option<ThreadId>,
    defined_klass: Option<KlassRc>,
}

impl PlaceholderEntry {
    fn queue(&mut self, action: LoadAction) -> &mut VecDeque<ThreadId> {
        match action {
            LoadAction::LoadInstance => &mut self.instance_queue,
            LoadAction::LoadSuper => &mut self.super_queue,
            LoadAction::DefineClass => &mut self.define_queue,
        }
    }

    fn queue_ref(&self, action: LoadAction) -> &VecDeque<ThreadId> {
        match action {
            LoadAction::LoadInstance => &self.instance_queue,
            LoadAction::LoadSuper => &self.super_queue,
            LoadAction::DefineClass => &self.define_queue,
        }
    }

    /// The superclass this entry's class is currently loading, if the load
    /// was registered as a super-load. This is the circularity fact: a
    /// lookup that finds its own name already recorded as someone's
    /// supername has found a cycle.
    #[must_use]
    pub fn supername(&self) -> Option<&Symbol> {
        self.supername.as_ref()
    }

    /// Returns `true` while any thread is registered for a super-load.
    #[must_use]
    pub fn super_load_in_progress(&self) -> bool {
        !self.super_queue.is_empty()
    }

    /// Returns `true` while any thread is registered for an instance load.
    #[must_use]
    pub fn instance_load_in_progress(&self) -> bool {
        !self.instance_queue.is_empty()
    }

    /// Returns `true` while any thread is queued on the define stage.
    #[must_use]
    pub fn define_in_progress(&self) -> bool {
        !self.define_queue.is_empty() || self.definer.is_some()
    }

    /// The single thread currently permitted to define the class.
    #[must_use]
    pub fn definer(&self) -> Option<ThreadId> {
        self.definer
    }

    /// The class published by a finished definer, for waiters to adopt.
    #[must_use]
    pub fn defined_klass(&self) -> Option<KlassRc> {
        self.defined_klass.clone()
    }

    /// Returns `true` if `thread` is registered on `action`'s queue.
    #[must_use]
    pub fn has_seen_thread(&self, thread: ThreadId, action: LoadAction) -> bool {
        self.queue_ref(action).contains(&thread)
    }

    /// Number of threads registered on `action`'s queue.
    #[must_use]
    pub fn queue_length(&self, action: LoadAction) -> usize {
        self.queue_ref(action).len()
    }

    /// Removable: all queues empty and no definer.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.super_queue.is_empty()
            && self.instance_queue.is_empty()
            && self.define_queue.is_empty()
            && self.definer.is_none()
    }
}

/// The class-loading coordination table.
///
/// All access goes through [`PlaceholderTable::lock`]; there is no way to
/// reach an entry without holding the coordination mutex.
#[derive(Debug, Default)]
pub struct PlaceholderTable {
    inner: Mutex<HashMap<PlaceholderKey, PlaceholderEntry>>,
    cond: Condvar,
}

impl PlaceholderTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        PlaceholderTable::default()
    }

    /// Acquires the coordination lock, returning the guard that exposes
    /// every table operation.
    pub fn lock(&self) -> PlaceholderGuard<'_> {
        PlaceholderGuard {
            map: lock!(self.inner),
            cond: &self.cond,
        }
    }
}

/// Exclusive view of the placeholder table while the coordination lock is
/// held. Dropping the guard releases the lock.
pub struct PlaceholderGuard<'a> {
    map: MutexGuard<'a, HashMap<PlaceholderKey, PlaceholderEntry>>,
    cond: &'a Condvar,
}

impl<'a> PlaceholderGuard<'a> {
    fn key(name: &Symbol, loader: LoaderId) -> PlaceholderKey {
        PlaceholderKey {
            name: name.clone(),
            loader,
        }
    }

    /// Looks up the entry for (`name`, `loader`).
    #[must_use]
    pub fn get_entry(&self, name: &Symbol, loader: LoaderId) -> Option<&PlaceholderEntry> {
        self.map.get(&Self::key(name, loader))
    }

    /// Registers `thread` for `action` on (`name`, `loader`), creating the
    /// entry if this is the first interest in the key.
    ///
    /// A super-load registration records `supername`; a later registration
    /// for the same key updates it. The orchestrator compares these records
    /// to detect cycles — the table never raises circularity itself.
    pub fn find_and_add(
        &mut self,
        name: &Symbol,
        loader: LoaderId,
        action: LoadAction,
        supername: Option<&Symbol>,
        thread: ThreadId,
    ) -> &PlaceholderEntry {
        let entry = self.map.entry(Self::key(name, loader)).or_default();
        if action == LoadAction::LoadSuper {
            entry.supername = supername.cloned();
        }
        entry.queue(action).push_back(thread);
        entry
    }

    /// Unregisters `thread` from `action`'s queue and deletes the entry if
    /// nothing else depends on it.
    ///
    /// A missing key or a thread not on the queue is a silent no-op: two
    /// threads may benignly race to clean up the same registration.
    pub fn find_and_remove(
        &mut self,
        name: &Symbol,
        loader: LoaderId,
        action: LoadAction,
        thread: ThreadId,
    ) {
        let key = Self::key(name, loader);
        let Some(entry) = self.map.get_mut(&key) else {
            return;
        };
        let queue = entry.queue(action);
        if let Some(position) = queue.iter().position(|&seen| seen == thread) {
            queue.remove(position);
        }
        if action == LoadAction::LoadSuper && !entry.super_load_in_progress() {
            entry.supername = None;
        }
        if entry.is_idle() {
            self.map.remove(&key);
        }
        // Waiters recheck the table state after any removal.
        self.cond.notify_all();
    }

    /// Attempts to claim the definer role for (`name`, `loader`).
    ///
    /// Exactly one thread holds the role at a time; a second claim by the
    /// same thread is reentrant and succeeds. Returns `false` when another
    /// thread is the definer — the caller should register on the define
    /// queue and [`PlaceholderGuard::wait`].
    pub fn claim_definer(&mut self, name: &Symbol, loader: LoaderId, thread: ThreadId) -> bool {
        let entry = self.map.entry(Self::key(name, loader)).or_default();
        match entry.definer {
            None => {
                entry.definer = Some(thread);
                true
            }
            Some(current) => current == thread,
        }
    }

    /// Releases the definer role, publishing the defined class (or `None`
    /// on a failed definition) for queued waiters to observe, and wakes
    /// every waiter.
    ///
    /// A release by a non-definer is a silent no-op.
    pub fn release_definer(
        &mut self,
        name: &Symbol,
        loader: LoaderId,
        thread: ThreadId,
        defined: Option<KlassRc>,
    ) {
        let key = Self::key(name, loader);
        if let Some(entry) = self.map.get_mut(&key) {
            if entry.definer == Some(thread) {
                entry.definer = None;
                entry.defined_klass = defined;
                if entry.is_idle() {
                    // Keep the published class observable through get_entry
                    // only while someone is still registered; an idle entry
                    // goes away with its result, and latecomers consult the
                    // orchestrator's dictionary instead.
                    self.map.remove(&key);
                }
                self.cond.notify_all();
            }
        }
    }

    /// Blocks on the coordination condition variable, releasing the lock
    /// while parked and reacquiring it before returning.
    ///
    /// Callers loop: wait, then recheck the entry state, because wakeups
    /// are collective.
    #[must_use]
    pub fn wait(self) -> PlaceholderGuard<'a> {
        let cond = self.cond;
        let map = cond.wait(self.map).expect("Failed to acquire lock");
        PlaceholderGuard { map, cond }
    }

    /// Number of live entries; idle entries are removed eagerly so this is
    /// also the number of (name, loader) pairs currently mid-load.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if no load is in progress.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
