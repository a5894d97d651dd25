//! Resolved dynamic-call-site entries.

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use crate::pool::ConstantPool;
use crate::runtime::{HeapRef, MethodRc};
use crate::{Error, LinkageKind, Result};

/// Sentinel in the appendix cell while no appendix is bound.
const NO_APPENDIX: u32 = u32::MAX;

const STATE_UNRESOLVED: u8 = 0;
const STATE_RESOLVED: u8 = 1;
const STATE_FAILED: u8 = 2;

/// One rewritten `invokedynamic` site.
///
/// Binding happens once, after a successful bootstrap invocation; the bound
/// target may carry an *appendix* — an extra trailing argument produced by
/// the bootstrap result that is not part of the static signature. The
/// appendix object itself lives in the pool's resolved-reference table; the
/// entry stores only its reference index.
///
/// Failures are sticky per entry: after a failed resolution, every repeat
/// execution raises the same linkage error class without re-running the
/// (potentially expensive, potentially side-effecting) bootstrap method.
#[derive(Debug)]
pub struct ResolvedIndyEntry {
    pool_index: u16,
    method: OnceLock<MethodRc>,
    appendix: AtomicU32,
    failure: OnceLock<(LinkageKind, String)>,
    /// Publication signal; release-stored after method/appendix/failure.
    state: AtomicU8,
}

impl ResolvedIndyEntry {
    pub(crate) fn new(pool_index: u16) -> Self {
        ResolvedIndyEntry {
            pool_index,
            method: OnceLock::new(),
            appendix: AtomicU32::new(NO_APPENDIX),
            failure: OnceLock::new(),
            state: AtomicU8::new(STATE_UNRESOLVED),
        }
    }

    /// Constant pool index of the `InvokeDynamic` entry this site rewrites.
    #[must_use]
    pub fn pool_index(&self) -> u16 {
        self.pool_index
    }

    /// Binds the call site to its target, with an optional appendix already
    /// published in the pool's reference table.
    ///
    /// Returns the entry so the bytecode rewriter can thread further
    /// per-site metadata. First writer wins; a racing duplicate bind must
    /// carry the same target and is asserted to.
    pub fn set_method_handle(
        &self,
        method: MethodRc,
        appendix_reference: Option<u32>,
    ) -> &Self {
        let bound = self.method.get_or_init(|| method.clone());
        debug_assert!(
            Arc::ptr_eq(bound, &method),
            "call site for pool index {} rebound to a different target",
            self.pool_index
        );
        if let Some(reference) = appendix_reference {
            self.appendix.store(reference, Ordering::Relaxed);
        }
        self.state.store(STATE_RESOLVED, Ordering::Release);
        self
    }

    /// Records a sticky resolution failure. First failure wins.
    pub fn set_resolution_failed(&self, kind: LinkageKind, message: String) {
        self.failure.get_or_init(|| (kind, message));
        let _ = self.state.compare_exchange(
            STATE_UNRESOLVED,
            STATE_FAILED,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Replays the sticky failure, if one is recorded.
    ///
    /// # Errors
    /// The same [`Error::Linkage`] class and message as the original failure.
    pub fn check_resolution_failed(&self) -> Result<()> {
        if self.state.load(Ordering::Acquire) == STATE_FAILED {
            if let Some((kind, message)) = self.failure.get() {
                return Err(Error::Linkage {
                    kind: *kind,
                    message: message.clone(),
                });
            }
        }
        Ok(())
    }

    /// Returns `true` once the site is bound to a target.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_RESOLVED
    }

    /// Non-blocking peek at the bound target; never triggers resolution.
    #[must_use]
    pub fn method_if_resolved(&self) -> Option<MethodRc> {
        if self.is_resolved() {
            self.method.get().cloned()
        } else {
            None
        }
    }

    /// Returns `true` if the bound target carries an appendix argument.
    #[must_use]
    pub fn has_appendix(&self) -> bool {
        self.is_resolved() && self.appendix.load(Ordering::Relaxed) != NO_APPENDIX
    }

    /// Reference-table index of the appendix, once bound.
    #[must_use]
    pub fn appendix_index(&self) -> Option<u32> {
        if !self.is_resolved() {
            return None;
        }
        match self.appendix.load(Ordering::Relaxed) {
            NO_APPENDIX => None,
            reference => Some(reference),
        }
    }

    /// The appendix object itself, read through the owning pool.
    #[must_use]
    pub fn appendix_if_resolved(&self, pool: &ConstantPool) -> Option<HeapRef> {
        self.appendix_index()
            .and_then(|reference| pool.resolved_reference_at(reference))
    }
}
