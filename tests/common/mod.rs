//! Shared test fixtures: an instrumented mock of the runtime collaborators.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use klasspool::prelude::*;

/// Mock orchestrator with call-count instrumentation.
///
/// Classes resolve to canonical per-(name, loader) identities, mirroring the
/// idempotency contract real loaders provide. Individual class names can be
/// marked missing; bootstrap invocation can be made to fail.
pub struct MockEnv {
    symbols: SymbolTable,
    classes: Mutex<HashMap<(String, LoaderId), KlassRc>>,
    missing: Mutex<HashSet<String>>,
    interned: Mutex<HashMap<String, HeapRef>>,
    resolve_delay: Option<Duration>,
    pub resolve_calls: AtomicUsize,
    pub intern_calls: AtomicUsize,
    pub link_handle_calls: AtomicUsize,
    pub link_type_calls: AtomicUsize,
    pub bootstrap_calls: AtomicUsize,
    bootstrap_fails: AtomicBool,
    last_specifier: Mutex<Option<(String, String, usize)>>,
}

impl MockEnv {
    pub fn new() -> Self {
        MockEnv {
            symbols: SymbolTable::new(),
            classes: Mutex::new(HashMap::new()),
            missing: Mutex::new(HashSet::new()),
            interned: Mutex::new(HashMap::new()),
            resolve_delay: None,
            resolve_calls: AtomicUsize::new(0),
            intern_calls: AtomicUsize::new(0),
            link_handle_calls: AtomicUsize::new(0),
            link_type_calls: AtomicUsize::new(0),
            bootstrap_calls: AtomicUsize::new(0),
            bootstrap_fails: AtomicBool::new(false),
            last_specifier: Mutex::new(None),
        }
    }

    /// Makes every `resolve_or_fail` call sleep first, to widen race windows.
    pub fn with_resolve_delay(mut self, delay: Duration) -> Self {
        self.resolve_delay = Some(delay);
        self
    }

    /// Marks `name` as unloadable.
    pub fn fail_class(&self, name: &str) {
        self.missing.lock().unwrap().insert(name.to_string());
    }

    /// Makes bootstrap invocations fail from now on.
    pub fn fail_bootstrap(&self) {
        self.bootstrap_fails.store(true, Ordering::Relaxed);
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::Relaxed)
    }

    pub fn intern_calls(&self) -> usize {
        self.intern_calls.load(Ordering::Relaxed)
    }

    pub fn bootstrap_calls(&self) -> usize {
        self.bootstrap_calls.load(Ordering::Relaxed)
    }

    /// (name, descriptor, argument count) of the last bootstrap invocation.
    pub fn last_specifier(&self) -> Option<(String, String, usize)> {
        self.last_specifier.lock().unwrap().clone()
    }

    fn opaque(&self, kind: &str) -> HeapRef {
        HeapRef::new(HeapObject::Opaque(self.symbols.intern(kind)))
    }
}

impl RuntimeEnv for MockEnv {
    fn resolve_or_fail(&self, name: &Symbol, loader: LoaderId) -> klasspool::Result<KlassRc> {
        self.resolve_calls.fetch_add(1, Ordering::Relaxed);
        if let Some(delay) = self.resolve_delay {
            std::thread::sleep(delay);
        }
        if self.missing.lock().unwrap().contains(name.as_str()) {
            return Err(Error::ClassResolution {
                name: name.to_string(),
                message: "class not found".to_string(),
            });
        }
        let mut classes = self.classes.lock().unwrap();
        let klass = classes
            .entry((name.to_string(), loader))
            .or_insert_with(|| Klass::new(name.clone(), loader, KlassFlags::PUBLIC))
            .clone();
        Ok(klass)
    }

    fn intern_string(&self, contents: &str) -> HeapRef {
        self.intern_calls.fetch_add(1, Ordering::Relaxed);
        let mut interned = self.interned.lock().unwrap();
        interned
            .entry(contents.to_string())
            .or_insert_with(|| HeapRef::new(HeapObject::String(Arc::from(contents))))
            .clone()
    }

    fn link_method_handle(
        &self,
        _kind: RefKind,
        _holder: &KlassRc,
        _name: &Symbol,
        _descriptor: &Symbol,
    ) -> klasspool::Result<HeapRef> {
        self.link_handle_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.opaque("MethodHandle"))
    }

    fn link_method_type(&self, _descriptor: &Symbol) -> klasspool::Result<HeapRef> {
        self.link_type_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.opaque("MethodType"))
    }

    fn invoke_bootstrap_method(
        &self,
        specifier: &BootstrapSpecifier,
    ) -> klasspool::Result<HeapRef> {
        self.bootstrap_calls.fetch_add(1, Ordering::Relaxed);
        *self.last_specifier.lock().unwrap() = Some((
            specifier.name.to_string(),
            specifier.descriptor.to_string(),
            specifier.arguments.len(),
        ));
        if self.bootstrap_fails.load(Ordering::Relaxed) {
            return Err(Error::Linkage {
                kind: LinkageKind::BootstrapMethodFailed,
                message: "bootstrap method threw".to_string(),
            });
        }
        Ok(self.opaque("CallSite"))
    }
}
