//! Tagged-slot discriminants.
//!
//! Every constant pool slot carries one tag byte identifying the kind of
//! constant occupying it and, for resolvable kinds, its resolution state. The
//! tag byte is the *publication signal* of the resolution protocol: readers
//! acquire-load it, writers release-publish it only after the resolved value
//! is fully written to its side table.
//!
//! Values below 100 follow the class-file constant kinds; values from 100 up
//! are internal states that never appear in a class file (unresolved class
//! references and the sticky error variants).

use strum::{Display, FromRepr};

/// Discriminant for one constant pool slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, Display)]
#[repr(u8)]
pub enum Tag {
    /// Unoccupied slot: index 0, and the filler slot after a long/double.
    Invalid = 0,
    /// Modified-UTF-8 text, stored as an interned symbol.
    Utf8 = 1,
    /// Inline 32-bit integer.
    Integer = 3,
    /// Inline 32-bit float.
    Float = 4,
    /// Inline 64-bit integer.
    Long = 5,
    /// Inline 64-bit float.
    Double = 6,
    /// Class reference, resolved. The resolved-class side table holds the handle.
    Class = 7,
    /// String constant. Resolution state lives in the reference side table,
    /// not in the tag.
    String = 8,
    /// Field member reference.
    Fieldref = 9,
    /// Method member reference.
    Methodref = 10,
    /// Interface-method member reference.
    InterfaceMethodref = 11,
    /// Name-and-descriptor pair.
    NameAndType = 12,
    /// Method handle constant.
    MethodHandle = 15,
    /// Method type constant.
    MethodType = 16,
    /// Dynamically computed constant.
    Dynamic = 17,
    /// Dynamically computed call site.
    InvokeDynamic = 18,

    /// Class reference not yet resolved.
    UnresolvedClass = 100,
    /// Class reference whose resolution failed; the error table holds the
    /// saved failure.
    UnresolvedClassInError = 101,
    /// Method handle constant whose resolution failed.
    MethodHandleInError = 102,
    /// Method type constant whose resolution failed.
    MethodTypeInError = 103,
    /// Dynamically computed constant whose resolution failed.
    DynamicInError = 104,
}

impl Tag {
    /// Returns `true` for a resolved class reference.
    #[must_use]
    pub fn is_klass(&self) -> bool {
        matches!(self, Tag::Class)
    }

    /// Returns `true` for an unresolved (but not failed) class reference.
    #[must_use]
    pub fn is_unresolved_klass(&self) -> bool {
        matches!(self, Tag::UnresolvedClass)
    }

    /// Returns `true` for any class-bearing slot, whatever its state.
    #[must_use]
    pub fn is_klass_reference(&self) -> bool {
        matches!(
            self,
            Tag::Class | Tag::UnresolvedClass | Tag::UnresolvedClassInError
        )
    }

    /// Returns `true` for the sticky error states.
    #[must_use]
    pub fn is_in_error(&self) -> bool {
        matches!(
            self,
            Tag::UnresolvedClassInError
                | Tag::MethodHandleInError
                | Tag::MethodTypeInError
                | Tag::DynamicInError
        )
    }

    /// Returns `true` for field/method/interface-method member references.
    #[must_use]
    pub fn is_member_ref(&self) -> bool {
        matches!(
            self,
            Tag::Fieldref | Tag::Methodref | Tag::InterfaceMethodref
        )
    }

    /// Returns `true` for constants whose resolved value is a heap reference
    /// published through the reference side table.
    #[must_use]
    pub fn is_reference_bearing(&self) -> bool {
        matches!(
            self,
            Tag::String | Tag::MethodHandle | Tag::MethodType | Tag::Dynamic | Tag::InvokeDynamic
        )
    }

    /// Returns `true` for constants the generic `resolve_constant_at` path
    /// accepts (loadable constants in class-file terms).
    #[must_use]
    pub fn is_loadable(&self) -> bool {
        matches!(
            self,
            Tag::Integer
                | Tag::Float
                | Tag::Long
                | Tag::Double
                | Tag::Class
                | Tag::UnresolvedClass
                | Tag::UnresolvedClassInError
                | Tag::String
                | Tag::MethodHandle
                | Tag::MethodHandleInError
                | Tag::MethodType
                | Tag::MethodTypeInError
                | Tag::Dynamic
                | Tag::DynamicInError
        )
    }

    /// Returns `true` for inline constants occupying two class-file indices.
    #[must_use]
    pub fn is_double_width(&self) -> bool {
        matches!(self, Tag::Long | Tag::Double)
    }

    /// The sticky error state this tag transitions to on resolution failure,
    /// if it has one.
    #[must_use]
    pub fn error_variant(&self) -> Option<Tag> {
        match self {
            Tag::UnresolvedClass => Some(Tag::UnresolvedClassInError),
            Tag::MethodHandle => Some(Tag::MethodHandleInError),
            Tag::MethodType => Some(Tag::MethodTypeInError),
            Tag::Dynamic => Some(Tag::DynamicInError),
            _ => None,
        }
    }

    /// The non-error state a sticky error tag originated from.
    #[must_use]
    pub fn source_of_error(&self) -> Option<Tag> {
        match self {
            Tag::UnresolvedClassInError => Some(Tag::UnresolvedClass),
            Tag::MethodHandleInError => Some(Tag::MethodHandle),
            Tag::MethodTypeInError => Some(Tag::MethodType),
            Tag::DynamicInError => Some(Tag::Dynamic),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repr_round_trip() {
        for tag in [
            Tag::Invalid,
            Tag::Utf8,
            Tag::Integer,
            Tag::Float,
            Tag::Long,
            Tag::Double,
            Tag::Class,
            Tag::String,
            Tag::Fieldref,
            Tag::Methodref,
            Tag::InterfaceMethodref,
            Tag::NameAndType,
            Tag::MethodHandle,
            Tag::MethodType,
            Tag::Dynamic,
            Tag::InvokeDynamic,
            Tag::UnresolvedClass,
            Tag::UnresolvedClassInError,
            Tag::MethodHandleInError,
            Tag::MethodTypeInError,
            Tag::DynamicInError,
        ] {
            assert_eq!(Tag::from_repr(tag as u8), Some(tag));
        }
        assert_eq!(Tag::from_repr(2), None);
        assert_eq!(Tag::from_repr(99), None);
    }

    #[test]
    fn test_error_transitions_pair_up() {
        for tag in [Tag::UnresolvedClass, Tag::MethodHandle, Tag::MethodType, Tag::Dynamic] {
            let error = tag.error_variant().unwrap();
            assert!(error.is_in_error());
            assert_eq!(error.source_of_error(), Some(tag));
        }
        assert_eq!(Tag::Class.error_variant(), None);
        assert_eq!(Tag::InvokeDynamic.error_variant(), None);
    }

    #[test]
    fn test_classification() {
        assert!(Tag::Class.is_klass());
        assert!(!Tag::UnresolvedClass.is_klass());
        assert!(Tag::UnresolvedClass.is_klass_reference());
        assert!(Tag::UnresolvedClassInError.is_klass_reference());
        assert!(Tag::Fieldref.is_member_ref());
        assert!(!Tag::NameAndType.is_member_ref());
        assert!(Tag::String.is_reference_bearing());
        assert!(!Tag::Integer.is_reference_bearing());
        assert!(Tag::Long.is_double_width());
        assert!(Tag::Dynamic.is_loadable());
        assert!(!Tag::NameAndType.is_loadable());
    }
}
