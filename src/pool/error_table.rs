//! Sticky resolution-error table.
//!
//! When resolving a class, method handle, method type or dynamic constant
//! fails with a linkage-family error, the failure is recorded here keyed by
//! pool index. Subsequent lookups replay an error with the same class and
//! message instead of re-invoking the loader, so repeated failing attempts
//! are cheap and user-visible messages stay stable.
//!
//! Internal errors are never recorded; see [`crate::Error::is_linkage_family`].

use dashmap::DashMap;

use crate::{Error, LinkageKind};

/// Reconstructible snapshot of a linkage-family failure.
#[derive(Debug, Clone)]
enum SavedError {
    ClassResolution { name: String, message: String },
    Linkage { kind: LinkageKind, message: String },
    Circularity { name: String },
}

impl SavedError {
    fn capture(error: &Error) -> Option<SavedError> {
        match error {
            Error::ClassResolution { name, message } => Some(SavedError::ClassResolution {
                name: name.clone(),
                message: message.clone(),
            }),
            Error::Linkage { kind, message } => Some(SavedError::Linkage {
                kind: *kind,
                message: message.clone(),
            }),
            Error::Circularity { name } => Some(SavedError::Circularity { name: name.clone() }),
            _ => None,
        }
    }

    fn rebuild(&self) -> Error {
        match self {
            SavedError::ClassResolution { name, message } => Error::ClassResolution {
                name: name.clone(),
                message: message.clone(),
            },
            SavedError::Linkage { kind, message } => Error::Linkage {
                kind: *kind,
                message: message.clone(),
            },
            SavedError::Circularity { name } => Error::Circularity { name: name.clone() },
        }
    }
}

/// Per-pool map of sticky resolution failures, keyed by pool index.
#[derive(Debug, Default)]
pub(crate) struct ResolutionErrorTable {
    entries: DashMap<u16, SavedError>,
}

impl ResolutionErrorTable {
    pub(crate) fn new() -> Self {
        ResolutionErrorTable {
            entries: DashMap::new(),
        }
    }

    /// Records `error` against `index` unless an earlier failure is already
    /// recorded (first error wins) or the error is not cacheable.
    ///
    /// Returns `true` when the error class is linkage-family and therefore
    /// eligible for a sticky tag transition.
    pub(crate) fn save(&self, index: u16, error: &Error) -> bool {
        match SavedError::capture(error) {
            Some(saved) => {
                self.entries.entry(index).or_insert(saved);
                true
            }
            None => false,
        }
    }

    /// Replays the failure recorded against `index`.
    pub(crate) fn replay(&self, index: u16) -> Option<Error> {
        self.entries.get(&index).map(|saved| saved.rebuild())
    }

    /// Explicitly clears a recorded failure. Resolution never does this on
    /// its own; it exists for redefinition-style maintenance by the owner.
    pub(crate) fn clear(&self, index: u16) {
        self.entries.remove(&index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_error_wins_and_replays() {
        let table = ResolutionErrorTable::new();
        let first = Error::ClassResolution {
            name: "Foo".to_string(),
            message: "not found".to_string(),
        };
        let second = Error::ClassResolution {
            name: "Foo".to_string(),
            message: "different".to_string(),
        };

        assert!(table.save(5, &first));
        assert!(table.save(5, &second));

        match table.replay(5) {
            Some(Error::ClassResolution { name, message }) => {
                assert_eq!(name, "Foo");
                assert_eq!(message, "not found");
            }
            other => panic!("unexpected replay: {other:?}"),
        }
    }

    #[test]
    fn test_internal_errors_not_cached() {
        let table = ResolutionErrorTable::new();
        assert!(!table.save(1, &Error::LockError));
        assert!(table.replay(1).is_none());
    }

    #[test]
    fn test_clear() {
        let table = ResolutionErrorTable::new();
        table.save(
            2,
            &Error::Linkage {
                kind: LinkageKind::NoSuchMethod,
                message: "m()V".to_string(),
            },
        );
        assert!(table.replay(2).is_some());
        table.clear(2);
        assert!(table.replay(2).is_none());
    }
}
