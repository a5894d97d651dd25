//! Single-threaded constant pool construction.
//!
//! The class-file parser feeds raw entries into a [`PoolBuilder`] and calls
//! [`PoolBuilder::build`], which validates internal consistency (every
//! sub-index must point at an entry of the right kind), lays out the slot and
//! tag arrays, and sizes the side tables: one resolved-class cell per
//! class-bearing entry, one reference cell per heap-reference-bearing entry.
//! After `build` returns, the slot array is frozen; all further mutation is
//! the resolution engine's.
//!
//! Index numbering follows class-file rules: index 0 is reserved, and long or
//! double entries occupy two indices (the second is an invalid filler).

use std::sync::atomic::AtomicU8;
use std::sync::OnceLock;

use crate::pool::bsm::BsmTableBuilder;
use crate::pool::error_table::ResolutionErrorTable;
use crate::pool::pool::ConstantPool;
use crate::pool::refs::ResolvedReferences;
use crate::pool::slot::Slot;
use crate::pool::tag::Tag;
use crate::runtime::{LoaderId, RefKind, Symbol};
use crate::Result;

/// A raw, unresolved entry as delivered by the parser.
#[derive(Debug, Clone)]
enum PendingEntry {
    /// Reserved slot 0 and long/double fillers.
    Invalid,
    Utf8(Symbol),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class { name_index: u16 },
    String { utf8_index: u16 },
    FieldRef { class_index: u16, name_and_type_index: u16 },
    MethodRef { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodRef { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { ref_kind: u8, ref_index: u16 },
    MethodType { descriptor_index: u16 },
    Dynamic { specifier: u16, name_and_type_index: u16 },
    InvokeDynamic { specifier: u16, name_and_type_index: u16 },
}

impl PendingEntry {
    fn tag(&self) -> Tag {
        match self {
            PendingEntry::Invalid => Tag::Invalid,
            PendingEntry::Utf8(_) => Tag::Utf8,
            PendingEntry::Integer(_) => Tag::Integer,
            PendingEntry::Float(_) => Tag::Float,
            PendingEntry::Long(_) => Tag::Long,
            PendingEntry::Double(_) => Tag::Double,
            PendingEntry::Class { .. } => Tag::UnresolvedClass,
            PendingEntry::String { .. } => Tag::String,
            PendingEntry::FieldRef { .. } => Tag::Fieldref,
            PendingEntry::MethodRef { .. } => Tag::Methodref,
            PendingEntry::InterfaceMethodRef { .. } => Tag::InterfaceMethodref,
            PendingEntry::NameAndType { .. } => Tag::NameAndType,
            PendingEntry::MethodHandle { .. } => Tag::MethodHandle,
            PendingEntry::MethodType { .. } => Tag::MethodType,
            PendingEntry::Dynamic { .. } => Tag::Dynamic,
            PendingEntry::InvokeDynamic { .. } => Tag::InvokeDynamic,
        }
    }
}

/// Accumulates parsed entries and freezes them into a [`ConstantPool`].
pub struct PoolBuilder {
    holder_name: Symbol,
    loader: LoaderId,
    entries: Vec<PendingEntry>,
    bsm: BsmTableBuilder,
}

impl PoolBuilder {
    /// Creates a builder for the pool of class `holder_name` as defined by
    /// `loader`. Index 0 is reserved immediately.
    #[must_use]
    pub fn new(holder_name: Symbol, loader: LoaderId) -> Self {
        PoolBuilder {
            holder_name,
            loader,
            entries: vec![PendingEntry::Invalid],
            bsm: BsmTableBuilder::new(),
        }
    }

    fn push(&mut self, entry: PendingEntry) -> u16 {
        let index = self.entries.len() as u16;
        self.entries.push(entry);
        index
    }

    /// Appends a UTF-8 entry.
    pub fn push_utf8(&mut self, contents: Symbol) -> u16 {
        self.push(PendingEntry::Utf8(contents))
    }

    /// Appends an integer constant.
    pub fn push_integer(&mut self, value: i32) -> u16 {
        self.push(PendingEntry::Integer(value))
    }

    /// Appends a float constant.
    pub fn push_float(&mut self, value: f32) -> u16 {
        self.push(PendingEntry::Float(value))
    }

    /// Appends a long constant. Occupies this index and the next.
    pub fn push_long(&mut self, value: i64) -> u16 {
        let index = self.push(PendingEntry::Long(value));
        self.push(PendingEntry::Invalid);
        index
    }

    /// Appends a double constant. Occupies this index and the next.
    pub fn push_double(&mut self, value: f64) -> u16 {
        let index = self.push(PendingEntry::Double(value));
        self.push(PendingEntry::Invalid);
        index
    }

    /// Appends an unresolved class reference naming the UTF-8 entry at
    /// `name_index`.
    pub fn push_class(&mut self, name_index: u16) -> u16 {
        self.push(PendingEntry::Class { name_index })
    }

    /// Appends a string constant backed by the UTF-8 entry at `utf8_index`.
    pub fn push_string(&mut self, utf8_index: u16) -> u16 {
        self.push(PendingEntry::String { utf8_index })
    }

    /// Appends a field reference.
    pub fn push_field_ref(&mut self, class_index: u16, name_and_type_index: u16) -> u16 {
        self.push(PendingEntry::FieldRef {
            class_index,
            name_and_type_index,
        })
    }

    /// Appends a method reference.
    pub fn push_method_ref(&mut self, class_index: u16, name_and_type_index: u16) -> u16 {
        self.push(PendingEntry::MethodRef {
            class_index,
            name_and_type_index,
        })
    }

    /// Appends an interface-method reference.
    pub fn push_interface_method_ref(
        &mut self,
        class_index: u16,
        name_and_type_index: u16,
    ) -> u16 {
        self.push(PendingEntry::InterfaceMethodRef {
            class_index,
            name_and_type_index,
        })
    }

    /// Appends a name-and-type pair.
    pub fn push_name_and_type(&mut self, name_index: u16, descriptor_index: u16) -> u16 {
        self.push(PendingEntry::NameAndType {
            name_index,
            descriptor_index,
        })
    }

    /// Appends a method handle constant.
    pub fn push_method_handle(&mut self, ref_kind: u8, ref_index: u16) -> u16 {
        self.push(PendingEntry::MethodHandle { ref_kind, ref_index })
    }

    /// Appends a method type constant.
    pub fn push_method_type(&mut self, descriptor_index: u16) -> u16 {
        self.push(PendingEntry::MethodType { descriptor_index })
    }

    /// Registers a bootstrap specifier and returns its index for use with
    /// [`PoolBuilder::push_dynamic`] / [`PoolBuilder::push_invoke_dynamic`].
    pub fn push_bootstrap_specifier(&mut self, bsm_method_ref: u16, arguments: &[u16]) -> u16 {
        self.bsm.push_specifier(bsm_method_ref, arguments)
    }

    /// Appends a dynamically computed constant.
    pub fn push_dynamic(&mut self, specifier: u16, name_and_type_index: u16) -> u16 {
        self.push(PendingEntry::Dynamic {
            specifier,
            name_and_type_index,
        })
    }

    /// Appends a dynamically computed call site.
    pub fn push_invoke_dynamic(&mut self, specifier: u16, name_and_type_index: u16) -> u16 {
        self.push(PendingEntry::InvokeDynamic {
            specifier,
            name_and_type_index,
        })
    }

    /// Number of indices allocated so far, including reserved slot 0.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if only the reserved slot exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    fn expect_tag(&self, index: u16, wanted: Tag, what: &str) -> Result<()> {
        match self.entries.get(index as usize) {
            Some(entry) if entry.tag() == wanted => Ok(()),
            Some(entry) => Err(malformed_error!(
                "{what} index {index} points at {} entry, expected {wanted}",
                entry.tag()
            )),
            None => Err(malformed_error!("{what} index {index} out of range")),
        }
    }

    fn validate(&self) -> Result<()> {
        for (index, entry) in self.entries.iter().enumerate() {
            match entry {
                PendingEntry::Class { name_index } => {
                    self.expect_tag(*name_index, Tag::Utf8, "class name")?;
                }
                PendingEntry::String { utf8_index } => {
                    self.expect_tag(*utf8_index, Tag::Utf8, "string contents")?;
                }
                PendingEntry::FieldRef {
                    class_index,
                    name_and_type_index,
                }
                | PendingEntry::MethodRef {
                    class_index,
                    name_and_type_index,
                }
                | PendingEntry::InterfaceMethodRef {
                    class_index,
                    name_and_type_index,
                } => {
                    self.expect_tag(*class_index, Tag::UnresolvedClass, "member class")?;
                    self.expect_tag(*name_and_type_index, Tag::NameAndType, "member name-and-type")?;
                }
                PendingEntry::NameAndType {
                    name_index,
                    descriptor_index,
                } => {
                    self.expect_tag(*name_index, Tag::Utf8, "name-and-type name")?;
                    self.expect_tag(*descriptor_index, Tag::Utf8, "name-and-type descriptor")?;
                }
                PendingEntry::MethodHandle { ref_kind, ref_index } => {
                    let Some(kind) = RefKind::from_repr(*ref_kind) else {
                        return Err(malformed_error!(
                            "method handle at {index} has invalid reference kind {ref_kind}"
                        ));
                    };
                    let referent = self
                        .entries
                        .get(*ref_index as usize)
                        .map(PendingEntry::tag);
                    let valid = match kind {
                        RefKind::GetField
                        | RefKind::GetStatic
                        | RefKind::PutField
                        | RefKind::PutStatic => referent == Some(Tag::Fieldref),
                        RefKind::InvokeVirtual | RefKind::NewInvokeSpecial => {
                            referent == Some(Tag::Methodref)
                        }
                        RefKind::InvokeStatic | RefKind::InvokeSpecial => matches!(
                            referent,
                            Some(Tag::Methodref) | Some(Tag::InterfaceMethodref)
                        ),
                        RefKind::InvokeInterface => referent == Some(Tag::InterfaceMethodref),
                    };
                    if !valid {
                        return Err(malformed_error!(
                            "method handle at {index} ({kind:?}) references incompatible entry {ref_index}"
                        ));
                    }
                }
                PendingEntry::MethodType { descriptor_index } => {
                    self.expect_tag(*descriptor_index, Tag::Utf8, "method type descriptor")?;
                }
                PendingEntry::Dynamic {
                    specifier,
                    name_and_type_index,
                }
                | PendingEntry::InvokeDynamic {
                    specifier,
                    name_and_type_index,
                } => {
                    if *specifier as usize >= self.bsm.specifier_count() {
                        return Err(malformed_error!(
                            "dynamic entry at {index} names bootstrap specifier {specifier}, only {} exist",
                            self.bsm.specifier_count()
                        ));
                    }
                    self.expect_tag(*name_and_type_index, Tag::NameAndType, "dynamic name-and-type")?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Validates the accumulated entries and freezes them into a pool.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] when any sub-index points at an
    /// entry of the wrong kind or out of range.
    pub fn build(self) -> Result<ConstantPool> {
        self.validate()?;

        let count = self.entries.len();
        let mut tags = Vec::with_capacity(count);
        let mut slots = Vec::with_capacity(count);
        let mut symbols = Vec::new();
        let mut klass_count = 0u32;
        let mut to_reference = vec![-1i32; count];
        let mut to_pool = Vec::new();

        for (index, entry) in self.entries.iter().enumerate() {
            let mut reference_cell = || {
                let cell = to_pool.len() as u32;
                to_pool.push(index as u16);
                to_reference[index] = cell as i32;
                cell
            };

            let slot = match entry {
                PendingEntry::Invalid => Slot::default(),
                PendingEntry::Utf8(contents) => {
                    let symbol_index = symbols.len() as u32;
                    symbols.push(contents.clone());
                    Slot::from_index(symbol_index)
                }
                PendingEntry::Integer(value) => Slot::from_i32(*value),
                PendingEntry::Float(value) => Slot::from_f32(*value),
                PendingEntry::Long(value) => Slot::from_i64(*value),
                PendingEntry::Double(value) => Slot::from_f64(*value),
                PendingEntry::Class { name_index } => {
                    let rk_index = klass_count;
                    klass_count += 1;
                    Slot::pack_wide(u32::from(*name_index), rk_index)
                }
                PendingEntry::String { utf8_index } => {
                    let cell = reference_cell();
                    Slot::pack_wide(u32::from(*utf8_index), cell)
                }
                PendingEntry::FieldRef {
                    class_index,
                    name_and_type_index,
                }
                | PendingEntry::MethodRef {
                    class_index,
                    name_and_type_index,
                }
                | PendingEntry::InterfaceMethodRef {
                    class_index,
                    name_and_type_index,
                } => Slot::pack_pair(*class_index, *name_and_type_index),
                PendingEntry::NameAndType {
                    name_index,
                    descriptor_index,
                } => Slot::pack_pair(*name_index, *descriptor_index),
                PendingEntry::MethodHandle { ref_kind, ref_index } => {
                    let cell = reference_cell();
                    Slot::pack_wide(
                        u32::from(*ref_index) | (u32::from(*ref_kind) << 16),
                        cell,
                    )
                }
                PendingEntry::MethodType { descriptor_index } => {
                    let cell = reference_cell();
                    Slot::pack_wide(u32::from(*descriptor_index), cell)
                }
                PendingEntry::Dynamic {
                    specifier,
                    name_and_type_index,
                }
                | PendingEntry::InvokeDynamic {
                    specifier,
                    name_and_type_index,
                } => {
                    let cell = reference_cell();
                    Slot::pack_wide(
                        u32::from(*specifier) | (u32::from(*name_and_type_index) << 16),
                        cell,
                    )
                }
            };

            tags.push(AtomicU8::new(entry.tag() as u8));
            slots.push(slot);
        }

        Ok(ConstantPool {
            holder_name: self.holder_name,
            loader: self.loader,
            tags: tags.into_boxed_slice(),
            slots: slots.into_boxed_slice(),
            symbols: symbols.into_boxed_slice(),
            resolved_klasses: (0..klass_count).map(|_| OnceLock::new()).collect(),
            references: ResolvedReferences::new(to_reference, to_pool),
            bsm: self.bsm.build(),
            errors: ResolutionErrorTable::new(),
        })
    }
}
