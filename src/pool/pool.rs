//! The constant pool and its resolution engine.
//!
//! A [`ConstantPool`] is created once per class by the parser (through
//! [`crate::pool::builder::PoolBuilder`]), then read and lazily resolved by
//! unbounded concurrent callers for the lifetime of the owning class.
//!
//! # Resolution protocol
//!
//! Reads of resolved entries are lock-free. The protocol for the slow path:
//!
//! 1. Acquire-load the tag. Already resolved → acquire-read the side table
//!    and return.
//! 2. Perform the resolution work (loader call, interning, bootstrap
//!    invocation) with no pool-level lock held — any of it may block,
//!    recurse into further resolution, or trigger a collection.
//! 3. On success, publish the value into its side-table cell *first*, then
//!    publish the tag transition. A reader that observes the resolved tag is
//!    therefore guaranteed to observe the fully-written value.
//! 4. Racing resolvers may both do the external work; the collaborator's
//!    idempotency contract makes the results identical, so the publish race
//!    is benign.
//! 5. On a linkage-family failure, the error is recorded sticky against the
//!    index; later callers replay the identical error without re-invoking
//!    the collaborator.
//!
//! Resolution is monotonic: a slot moves unresolved → resolved or
//! unresolved → error and never back. There is no ordering guarantee between
//! resolutions of different indices.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

use rayon::prelude::*;

use crate::pool::bsm::BsmAttributeTable;
use crate::pool::error_table::ResolutionErrorTable;
use crate::pool::refs::ResolvedReferences;
use crate::pool::slot::Slot;
use crate::pool::tag::Tag;
use crate::runtime::{
    BootstrapSpecifier, ConstantValue, HeapObject, HeapRef, KlassRc, LoaderId, RefKind,
    RuntimeEnv, Symbol,
};
use crate::{Error, Result};

/// Per-class table of symbolic and resolved constants.
///
/// Owned exclusively by its declaring class; destroyed only when the class is
/// unloaded, under the same quiescence rules as other class metadata.
pub struct ConstantPool {
    pub(crate) holder_name: Symbol,
    pub(crate) loader: LoaderId,
    /// One tag byte per slot; the publication signal, acquire/release only.
    pub(crate) tags: Box<[AtomicU8]>,
    /// Builder-written, immutable afterwards.
    pub(crate) slots: Box<[Slot]>,
    /// UTF-8 entry backing storage, indexed by slot payload.
    pub(crate) symbols: Box<[Symbol]>,
    /// One cell per class-bearing entry; published before the tag flips.
    pub(crate) resolved_klasses: Box<[OnceLock<KlassRc>]>,
    /// Heap-reference-bearing resolution results.
    pub(crate) references: ResolvedReferences,
    /// Bootstrap specifier encoding.
    pub(crate) bsm: BsmAttributeTable,
    /// Sticky linkage failures keyed by index.
    pub(crate) errors: ResolutionErrorTable,
}

impl ConstantPool {
    /// Number of slots, including reserved index 0.
    #[must_use]
    pub fn len(&self) -> u16 {
        self.slots.len() as u16
    }

    /// Returns `true` if the pool holds only the reserved slot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.len() <= 1
    }

    /// Name of the class this pool belongs to.
    #[must_use]
    pub fn holder_name(&self) -> &Symbol {
        &self.holder_name
    }

    /// Identity of the holder's defining loader.
    #[must_use]
    pub fn loader(&self) -> LoaderId {
        self.loader
    }

    fn slot_at(&self, index: u16) -> Slot {
        self.slots[index as usize]
    }

    /// Reads the tag of `index` with acquire ordering.
    ///
    /// Always safe, at any point of the pool's lifecycle.
    #[must_use]
    pub fn tag_at(&self, index: u16) -> Tag {
        let raw = self.tags[index as usize].load(Ordering::Acquire);
        debug_assert!(Tag::from_repr(raw).is_some(), "corrupt tag byte {raw}");
        Tag::from_repr(raw).unwrap_or(Tag::Invalid)
    }

    // ---- raw readers ----------------------------------------------------
    //
    // The slot encoding is fixed by the tag; reading through the wrong
    // accessor is a contract violation, checked in debug builds only.

    /// Integer payload of an `Integer` slot.
    #[must_use]
    pub fn int_at(&self, index: u16) -> i32 {
        debug_assert_eq!(self.tag_at(index), Tag::Integer, "int_at on wrong slot");
        self.slot_at(index).as_i32()
    }

    /// Long payload of a `Long` slot.
    #[must_use]
    pub fn long_at(&self, index: u16) -> i64 {
        debug_assert_eq!(self.tag_at(index), Tag::Long, "long_at on wrong slot");
        self.slot_at(index).as_i64()
    }

    /// Float payload of a `Float` slot.
    #[must_use]
    pub fn float_at(&self, index: u16) -> f32 {
        debug_assert_eq!(self.tag_at(index), Tag::Float, "float_at on wrong slot");
        self.slot_at(index).as_f32()
    }

    /// Double payload of a `Double` slot.
    #[must_use]
    pub fn double_at(&self, index: u16) -> f64 {
        debug_assert_eq!(self.tag_at(index), Tag::Double, "double_at on wrong slot");
        self.slot_at(index).as_f64()
    }

    /// Symbol of a `Utf8` slot.
    #[must_use]
    pub fn utf8_at(&self, index: u16) -> Symbol {
        debug_assert_eq!(self.tag_at(index), Tag::Utf8, "utf8_at on wrong slot");
        self.symbols[self.slot_at(index).as_index() as usize].clone()
    }

    /// Class name referenced by a class-bearing slot, whatever its state.
    #[must_use]
    pub fn klass_name_at(&self, index: u16) -> Symbol {
        debug_assert!(
            self.tag_at(index).is_klass_reference(),
            "klass_name_at on wrong slot"
        );
        self.utf8_at(self.slot_at(index).wide_lo() as u16)
    }

    /// String contents of a `String` slot, resolved or not.
    #[must_use]
    pub fn unresolved_string_at(&self, index: u16) -> Symbol {
        debug_assert_eq!(self.tag_at(index), Tag::String, "string accessor on wrong slot");
        self.utf8_at(self.slot_at(index).wide_lo() as u16)
    }

    /// Name sub-index of a `NameAndType` slot.
    #[must_use]
    pub fn name_ref_index_at(&self, index: u16) -> u16 {
        debug_assert_eq!(self.tag_at(index), Tag::NameAndType, "nat accessor on wrong slot");
        self.slot_at(index).pair_lo()
    }

    /// Descriptor sub-index of a `NameAndType` slot.
    #[must_use]
    pub fn signature_ref_index_at(&self, index: u16) -> u16 {
        debug_assert_eq!(self.tag_at(index), Tag::NameAndType, "nat accessor on wrong slot");
        self.slot_at(index).pair_hi()
    }

    /// Resolved (name, descriptor) symbols of a `NameAndType` slot.
    #[must_use]
    pub fn name_and_type_at(&self, index: u16) -> (Symbol, Symbol) {
        (
            self.utf8_at(self.name_ref_index_at(index)),
            self.utf8_at(self.signature_ref_index_at(index)),
        )
    }

    /// Class sub-index of a member reference slot.
    #[must_use]
    pub fn klass_ref_index_at(&self, index: u16) -> u16 {
        debug_assert!(self.tag_at(index).is_member_ref(), "member accessor on wrong slot");
        self.slot_at(index).pair_lo()
    }

    /// Name-and-type sub-index of a member reference slot.
    #[must_use]
    pub fn name_and_type_ref_index_at(&self, index: u16) -> u16 {
        debug_assert!(self.tag_at(index).is_member_ref(), "member accessor on wrong slot");
        self.slot_at(index).pair_hi()
    }

    /// Dispatch kind of a `MethodHandle` slot.
    ///
    /// # Panics
    /// Panics if the stored kind byte is invalid; the builder rejects such
    /// pools, so this indicates memory corruption.
    #[must_use]
    pub fn method_handle_ref_kind_at(&self, index: u16) -> RefKind {
        debug_assert!(
            matches!(self.tag_at(index), Tag::MethodHandle | Tag::MethodHandleInError),
            "method handle accessor on wrong slot"
        );
        let raw = (self.slot_at(index).wide_lo() >> 16) as u8;
        RefKind::from_repr(raw).expect("reference kind validated at build time")
    }

    /// Member reference sub-index of a `MethodHandle` slot.
    #[must_use]
    pub fn method_handle_index_at(&self, index: u16) -> u16 {
        debug_assert!(
            matches!(self.tag_at(index), Tag::MethodHandle | Tag::MethodHandleInError),
            "method handle accessor on wrong slot"
        );
        self.slot_at(index).wide_lo() as u16
    }

    /// Descriptor sub-index of a `MethodType` slot.
    #[must_use]
    pub fn method_type_index_at(&self, index: u16) -> u16 {
        debug_assert!(
            matches!(self.tag_at(index), Tag::MethodType | Tag::MethodTypeInError),
            "method type accessor on wrong slot"
        );
        self.slot_at(index).wide_lo() as u16
    }

    /// Bootstrap specifier sub-index of a `Dynamic`/`InvokeDynamic` slot.
    #[must_use]
    pub fn bootstrap_specifier_index_at(&self, index: u16) -> u16 {
        debug_assert!(
            matches!(
                self.tag_at(index),
                Tag::Dynamic | Tag::DynamicInError | Tag::InvokeDynamic
            ),
            "bootstrap accessor on wrong slot"
        );
        self.slot_at(index).wide_lo() as u16
    }

    /// Name-and-type sub-index of a `Dynamic`/`InvokeDynamic` slot.
    #[must_use]
    pub fn bootstrap_name_and_type_ref_index_at(&self, index: u16) -> u16 {
        debug_assert!(
            matches!(
                self.tag_at(index),
                Tag::Dynamic | Tag::DynamicInError | Tag::InvokeDynamic
            ),
            "bootstrap accessor on wrong slot"
        );
        (self.slot_at(index).wide_lo() >> 16) as u16
    }

    // ---- bootstrap specifier (operand) table ----------------------------

    /// Bootstrap method reference of specifier `specifier`.
    #[must_use]
    pub fn operand_bootstrap_method_ref_index_at(&self, specifier: u16) -> u16 {
        self.bsm.bootstrap_method_index(specifier)
    }

    /// Static argument count of specifier `specifier`.
    #[must_use]
    pub fn operand_argument_count_at(&self, specifier: u16) -> u16 {
        self.bsm.argument_count(specifier)
    }

    /// Static argument `n` of specifier `specifier`.
    #[must_use]
    pub fn operand_argument_index_at(&self, specifier: u16, n: u16) -> u16 {
        self.bsm.argument_index_at(specifier, n)
    }

    /// The whole bootstrap specifier table.
    #[must_use]
    pub fn bsm_attributes(&self) -> &BsmAttributeTable {
        &self.bsm
    }

    // ---- reference side table -------------------------------------------

    /// Maps a pool index to its reference-table index, if the entry bears a
    /// heap reference.
    #[must_use]
    pub fn reference_index_at(&self, index: u16) -> Option<u32> {
        self.references.index_of(index)
    }

    /// Non-blocking peek at a reference cell.
    #[must_use]
    pub fn resolved_reference_at(&self, reference_index: u32) -> Option<HeapRef> {
        self.references.get(reference_index)
    }

    /// Encodes a reference index into the negative-sentinel coordinate space
    /// accepted by [`ConstantPool::resolve_possibly_cached_constant_at`].
    #[must_use]
    pub fn encode_cached_index(reference_index: u32) -> i32 {
        -(reference_index as i32) - 1
    }

    // ---- class resolution ------------------------------------------------

    fn resolved_klass_index_at(&self, index: u16) -> usize {
        self.slot_at(index).wide_hi() as usize
    }

    /// Resolves the class reference at `index`, loading it on first use.
    ///
    /// Fast path is a tag acquire-load plus a side-table read; no lock is
    /// taken on any path. Failures are recorded sticky so every later call
    /// observes the same error without re-invoking the loader.
    ///
    /// # Errors
    /// [`Error::ClassResolution`] when loading fails, replayed verbatim on
    /// repeat calls.
    pub fn klass_at(&self, index: u16, env: &dyn RuntimeEnv) -> Result<KlassRc> {
        self.klass_at_impl(index, env, true)
    }

    /// [`ConstantPool::klass_at`] without the save-error step.
    ///
    /// Used on deoptimization-triggered re-resolution paths, which must see
    /// the current loader answer rather than a historical sticky failure.
    ///
    /// # Errors
    /// Propagates the loader failure uncached.
    pub fn klass_at_ignore_error(&self, index: u16, env: &dyn RuntimeEnv) -> Result<KlassRc> {
        self.klass_at_impl(index, env, false)
    }

    /// Non-blocking peek: the resolved class, or `None` if not yet resolved
    /// (or failed). Never triggers resolution.
    #[must_use]
    pub fn klass_at_if_loaded(&self, index: u16) -> Option<KlassRc> {
        if self.tag_at(index).is_klass() {
            self.resolved_klasses[self.resolved_klass_index_at(index)]
                .get()
                .cloned()
        } else {
            None
        }
    }

    fn klass_at_impl(
        &self,
        index: u16,
        env: &dyn RuntimeEnv,
        save_errors: bool,
    ) -> Result<KlassRc> {
        let tag = self.tag_at(index);
        debug_assert!(tag.is_klass_reference(), "klass_at on {tag} slot");
        let rk_index = self.resolved_klass_index_at(index);

        // The tag is published after the cell, so observing Class here
        // guarantees the cell read below succeeds.
        if tag.is_klass() {
            if let Some(klass) = self.resolved_klasses[rk_index].get() {
                return Ok(klass.clone());
            }
        }

        if tag == Tag::UnresolvedClassInError && save_errors {
            return Err(self.replay_error(index));
        }

        // Loader upcall with no pool state held. Racing callers may each get
        // here; the loader's idempotency makes both publishes identical.
        let name = self.klass_name_at(index);
        match env.resolve_or_fail(&name, self.loader) {
            Ok(klass) => {
                let published = self.resolved_klasses[rk_index]
                    .get_or_init(|| klass)
                    .clone();
                match self.tags[index as usize].compare_exchange(
                    Tag::UnresolvedClass as u8,
                    Tag::Class as u8,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                ) {
                    Ok(_) => Ok(published),
                    Err(current) if current == Tag::Class as u8 => Ok(published),
                    Err(current) if current == Tag::UnresolvedClassInError as u8 => {
                        // A racing thread recorded a failure first; every
                        // caller must observe the same outcome.
                        if save_errors {
                            Err(self.replay_error(index))
                        } else {
                            Ok(published)
                        }
                    }
                    Err(current) => Err(malformed_error!(
                        "slot {index} tag byte {current} during class publish"
                    )),
                }
            }
            Err(error) if save_errors => self.record_klass_failure(index, error),
            Err(error) => Err(error),
        }
    }

    fn record_klass_failure(&self, index: u16, error: Error) -> Result<KlassRc> {
        if !error.is_linkage_family() {
            return Err(error);
        }
        // Record before the tag flips so a reader observing the error tag
        // always finds the record.
        self.errors.save(index, &error);
        match self.tags[index as usize].compare_exchange(
            Tag::UnresolvedClass as u8,
            Tag::UnresolvedClassInError as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => Err(self.replay_error(index)),
            Err(current) if current == Tag::UnresolvedClassInError as u8 => {
                Err(self.replay_error(index))
            }
            Err(current) if current == Tag::Class as u8 => {
                // A racing thread resolved successfully; our failure was
                // transient from its perspective. Adopt the winner.
                self.errors.clear(index);
                match self.resolved_klasses[self.resolved_klass_index_at(index)].get() {
                    Some(klass) => Ok(klass.clone()),
                    None => Err(error),
                }
            }
            Err(current) => Err(malformed_error!(
                "slot {index} tag byte {current} during error publish"
            )),
        }
    }

    fn replay_error(&self, index: u16) -> Error {
        if let Some(error) = self.errors.replay(index) {
            return error;
        }
        // The record raced out from under an error tag; rebuild a stable
        // equivalent from the slot.
        let tag = self.tag_at(index);
        if tag.is_klass_reference() {
            Error::ClassResolution {
                name: self.klass_name_at(index).to_string(),
                message: "resolution previously failed".to_string(),
            }
        } else {
            Error::Linkage {
                kind: crate::LinkageKind::IncompatibleClassChange,
                message: format!("constant pool index {index} previously failed to resolve"),
            }
        }
    }

    // ---- string resolution ----------------------------------------------

    /// Resolves the string constant at `index` through the reference side
    /// table, interning on first use.
    ///
    /// The result may be a patched pseudo-string; callers that require an
    /// interned string must check [`ConstantPool::is_pseudo_string_at`].
    ///
    /// # Errors
    /// Currently infallible in practice (interning does not fail), kept
    /// fallible for parity with the other resolvers.
    pub fn string_at(&self, index: u16, env: &dyn RuntimeEnv) -> Result<HeapRef> {
        debug_assert_eq!(self.tag_at(index), Tag::String, "string_at on wrong slot");
        let cell = self.slot_at(index).wide_hi();
        if let Some(resolved) = self.references.get(cell) {
            return Ok(resolved);
        }
        let contents = self.unresolved_string_at(index);
        let interned = env.intern_string(contents.as_str());
        Ok(self.references.publish(cell, interned))
    }

    /// Non-blocking peek at a string entry's resolved reference.
    #[must_use]
    pub fn string_at_if_resolved(&self, index: u16) -> Option<HeapRef> {
        debug_assert_eq!(self.tag_at(index), Tag::String, "string accessor on wrong slot");
        self.references.get(self.slot_at(index).wide_hi())
    }

    /// Returns `true` if the string entry holds a patched object rather than
    /// an interned string.
    #[must_use]
    pub fn is_pseudo_string_at(&self, index: u16) -> bool {
        debug_assert_eq!(self.tag_at(index), Tag::String, "string accessor on wrong slot");
        self.references.is_pseudo(self.slot_at(index).wide_hi())
    }

    /// Patches an arbitrary object into a string entry (anonymous-class and
    /// method-handle bootstrapping support).
    ///
    /// Must happen before the entry's first normal resolution; the pseudo
    /// marker is set before the value is published so no reader can observe
    /// the object as an interned string.
    pub fn patch_pseudo_string_at(&self, index: u16, object: HeapRef) -> HeapRef {
        debug_assert_eq!(self.tag_at(index), Tag::String, "string accessor on wrong slot");
        let cell = self.slot_at(index).wide_hi();
        debug_assert!(
            self.references.get(cell).is_none(),
            "patching an already-resolved string entry"
        );
        self.references.mark_pseudo(cell);
        self.references.publish(cell, object)
    }

    // ---- generic constant resolution ------------------------------------

    /// Resolves the loadable constant at pool index `index`.
    ///
    /// # Errors
    /// Linkage-family errors from the underlying class/string/method-handle/
    /// dynamic resolution, sticky per the protocol; [`Error::Malformed`] for
    /// non-loadable tags.
    pub fn resolve_constant_at(&self, index: u16, env: &dyn RuntimeEnv) -> Result<HeapRef> {
        self.resolve_constant_at_impl(index, env)
    }

    /// Resolves a constant identified by its reference-table index.
    ///
    /// Interpreter fast paths hold this coordinate after rewriting; when the
    /// cell is already populated this is a single side-table read.
    ///
    /// # Errors
    /// As [`ConstantPool::resolve_constant_at`]; additionally
    /// [`Error::Malformed`] when `reference_index` maps to no pool entry.
    pub fn resolve_cached_constant_at(
        &self,
        reference_index: u32,
        env: &dyn RuntimeEnv,
    ) -> Result<HeapRef> {
        if let Some(resolved) = self.references.get(reference_index) {
            return Ok(resolved);
        }
        match self.references.pool_index_of(reference_index) {
            Some(pool_index) => self.resolve_constant_at_impl(pool_index, env),
            None => Err(malformed_error!(
                "reference index {reference_index} maps to no pool entry"
            )),
        }
    }

    /// Resolves a constant given either coordinate.
    ///
    /// Non-negative values are raw pool indices; negative values are
    /// reference-table indices under the [`ConstantPool::encode_cached_index`]
    /// encoding. Callers that only sometimes know the rewritten coordinate
    /// (reflection, compiler) use this entry point.
    ///
    /// # Errors
    /// As the two underlying entry points.
    pub fn resolve_possibly_cached_constant_at(
        &self,
        raw_index: i32,
        env: &dyn RuntimeEnv,
    ) -> Result<HeapRef> {
        if raw_index < 0 {
            self.resolve_cached_constant_at((-(raw_index + 1)) as u32, env)
        } else {
            match u16::try_from(raw_index) {
                Ok(index) => self.resolve_constant_at_impl(index, env),
                Err(_) => Err(malformed_error!("pool index {raw_index} out of range")),
            }
        }
    }

    fn resolve_constant_at_impl(&self, index: u16, env: &dyn RuntimeEnv) -> Result<HeapRef> {
        // A published reference wins over everything, including a sticky
        // error recorded by a slower racer.
        if let Some(cell) = self.references.index_of(index) {
            if let Some(resolved) = self.references.get(cell) {
                return Ok(resolved);
            }
        }

        let tag = self.tag_at(index);
        match tag {
            Tag::Integer => Ok(HeapRef::new(HeapObject::Value(ConstantValue::Int(
                self.int_at(index),
            )))),
            Tag::Float => Ok(HeapRef::new(HeapObject::Value(ConstantValue::Float(
                self.float_at(index),
            )))),
            Tag::Long => Ok(HeapRef::new(HeapObject::Value(ConstantValue::Long(
                self.long_at(index),
            )))),
            Tag::Double => Ok(HeapRef::new(HeapObject::Value(ConstantValue::Double(
                self.double_at(index),
            )))),
            Tag::Class | Tag::UnresolvedClass | Tag::UnresolvedClassInError => {
                let klass = self.klass_at(index, env)?;
                Ok(HeapRef::new(HeapObject::ClassMirror(klass)))
            }
            Tag::String => self.string_at(index, env),
            Tag::MethodHandle | Tag::MethodHandleInError => {
                self.resolve_method_handle_at(index, env)
            }
            Tag::MethodType | Tag::MethodTypeInError => self.resolve_method_type_at(index, env),
            Tag::Dynamic | Tag::DynamicInError => self.resolve_bootstrap_specifier_at(index, env),
            other => Err(malformed_error!(
                "constant at {index} has non-loadable tag {other}"
            )),
        }
    }

    fn record_reference_failure(
        &self,
        index: u16,
        from: Tag,
        error: Error,
    ) -> Result<HeapRef> {
        // A racing success may already be published; it wins.
        if let Some(cell) = self.references.index_of(index) {
            if let Some(resolved) = self.references.get(cell) {
                return Ok(resolved);
            }
        }
        if !error.is_linkage_family() {
            return Err(error);
        }
        self.errors.save(index, &error);
        if let Some(error_tag) = from.error_variant() {
            // Losing this race to another error recorder is fine; the first
            // saved record is the one replayed either way.
            let _ = self.tags[index as usize].compare_exchange(
                from as u8,
                error_tag as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            );
        }
        Err(self.replay_error(index))
    }

    fn resolve_method_handle_at(&self, index: u16, env: &dyn RuntimeEnv) -> Result<HeapRef> {
        let Some(cell) = self.references.index_of(index) else {
            return Err(malformed_error!("method handle at {index} has no reference cell"));
        };
        if let Some(resolved) = self.references.get(cell) {
            return Ok(resolved);
        }
        if let Some(error) = self.errors.replay(index) {
            return Err(error);
        }

        let kind = self.method_handle_ref_kind_at(index);
        let member = self.method_handle_index_at(index);
        let holder = match self.klass_at(self.klass_ref_index_at(member), env) {
            Ok(holder) => holder,
            Err(error) => return self.record_reference_failure(index, Tag::MethodHandle, error),
        };
        let (name, descriptor) = self.name_and_type_at(self.name_and_type_ref_index_at(member));
        match env.link_method_handle(kind, &holder, &name, &descriptor) {
            Ok(handle) => Ok(self.references.publish(cell, handle)),
            Err(error) => self.record_reference_failure(index, Tag::MethodHandle, error),
        }
    }

    fn resolve_method_type_at(&self, index: u16, env: &dyn RuntimeEnv) -> Result<HeapRef> {
        let Some(cell) = self.references.index_of(index) else {
            return Err(malformed_error!("method type at {index} has no reference cell"));
        };
        if let Some(resolved) = self.references.get(cell) {
            return Ok(resolved);
        }
        if let Some(error) = self.errors.replay(index) {
            return Err(error);
        }

        let descriptor = self.utf8_at(self.method_type_index_at(index));
        match env.link_method_type(&descriptor) {
            Ok(method_type) => Ok(self.references.publish(cell, method_type)),
            Err(error) => self.record_reference_failure(index, Tag::MethodType, error),
        }
    }

    // ---- bootstrap resolution -------------------------------------------

    /// Resolves the bootstrap specifier of the `Dynamic`/`InvokeDynamic`
    /// entry at `index`, invokes the bootstrap method through the
    /// orchestrator, and caches the product in the reference side table.
    ///
    /// Whether a bootstrap method tolerates concurrent duplicate invocation
    /// is the bootstrap author's obligation; this engine only guarantees
    /// that one product wins the publish and that all callers observe it.
    ///
    /// # Errors
    /// [`Error::Linkage`] with [`crate::LinkageKind::BootstrapMethodFailed`]
    /// (or the underlying argument-resolution error), sticky per the
    /// protocol.
    pub fn resolve_bootstrap_specifier_at(
        &self,
        index: u16,
        env: &dyn RuntimeEnv,
    ) -> Result<HeapRef> {
        let tag = self.tag_at(index);
        debug_assert!(
            matches!(tag, Tag::Dynamic | Tag::DynamicInError | Tag::InvokeDynamic),
            "bootstrap resolution on {tag} slot"
        );
        let Some(cell) = self.references.index_of(index) else {
            return Err(malformed_error!("dynamic entry at {index} has no reference cell"));
        };
        if let Some(resolved) = self.references.get(cell) {
            return Ok(resolved);
        }
        if let Some(error) = self.errors.replay(index) {
            return Err(error);
        }

        let from = if tag == Tag::InvokeDynamic {
            Tag::InvokeDynamic
        } else {
            Tag::Dynamic
        };
        let specifier = match self.bootstrap_specifier_for(index, env) {
            Ok(specifier) => specifier,
            Err(error) => return self.record_reference_failure(index, from, error),
        };
        match env.invoke_bootstrap_method(&specifier) {
            Ok(product) => Ok(self.references.publish(cell, product)),
            Err(error) => self.record_reference_failure(index, from, error),
        }
    }

    /// Assembles the fully resolved bootstrap specifier for a dynamic entry:
    /// the bootstrap method handle plus every static argument, each resolved
    /// through the possibly-cached path.
    fn bootstrap_specifier_for(
        &self,
        index: u16,
        env: &dyn RuntimeEnv,
    ) -> Result<BootstrapSpecifier> {
        let specifier = self.bootstrap_specifier_index_at(index);
        let nat_index = self.bootstrap_name_and_type_ref_index_at(index);
        let (name, descriptor) = self.name_and_type_at(nat_index);

        let bsm_ref = self.bsm.bootstrap_method_index(specifier);
        let method_handle = self.resolve_possibly_cached_constant_at(i32::from(bsm_ref), env)?;

        let argc = self.bsm.argument_count(specifier);
        let mut arguments = Vec::with_capacity(argc as usize);
        for n in 0..argc {
            let arg_index = self.bsm.argument_index_at(specifier, n);
            arguments.push(self.resolve_possibly_cached_constant_at(i32::from(arg_index), env)?);
        }

        Ok(BootstrapSpecifier {
            method_handle,
            name,
            descriptor,
            arguments,
        })
    }

    // ---- bulk resolution -------------------------------------------------

    /// Eagerly resolves every class and string constant in parallel.
    ///
    /// Used at archive-creation and warmup time. Failures are recorded
    /// sticky exactly as in the lazy path and do not abort the sweep.
    /// Dynamic constants are deliberately skipped: bootstrap methods may
    /// have side effects and only run on demand.
    ///
    /// Returns the number of entries that resolved successfully.
    pub fn preresolve(&self, env: &dyn RuntimeEnv) -> usize {
        (1..self.len())
            .into_par_iter()
            .filter(|&index| match self.tag_at(index) {
                Tag::UnresolvedClass | Tag::Class => self.klass_at(index, env).is_ok(),
                Tag::String => self.string_at(index, env).is_ok(),
                _ => false,
            })
            .count()
    }

    /// Clears the sticky error recorded against `index`, if any.
    ///
    /// Owner-driven maintenance (class redefinition); never called by the
    /// resolution paths themselves. The tag is left in its error state, so
    /// this does not un-stick resolution — it only releases the record.
    pub fn clear_resolution_error(&self, index: u16) {
        self.errors.clear(index);
    }
}

impl std::fmt::Debug for ConstantPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstantPool")
            .field("holder", &self.holder_name)
            .field("loader", &self.loader)
            .field("len", &self.len())
            .field("resolved_klasses", &self.resolved_klasses.len())
            .field("references", &self.references.len())
            .finish_non_exhaustive()
    }
}
