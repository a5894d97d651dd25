use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// Classification of linkage failures that are replayed verbatim on repeated
/// resolution attempts.
///
/// The kind decides which user-visible error class a runtime frontend maps the
/// failure to. Together with the saved message it is sufficient to reconstruct
/// an [`Error`] that is indistinguishable from the first failing attempt,
/// which is what sticky error caching requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkageKind {
    /// The named class could not be found by the defining loader.
    NoClassDefFound,
    /// A referenced field does not exist on the resolved class.
    NoSuchField,
    /// A referenced method does not exist on the resolved class.
    NoSuchMethod,
    /// The resolved entity exists but is not accessible to the referencing class.
    IllegalAccess,
    /// The resolved entity changed shape incompatibly since compile time.
    IncompatibleClassChange,
    /// A bootstrap method invocation failed to produce a value or call target.
    BootstrapMethodFailed,
}

impl std::fmt::Display for LinkageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LinkageKind::NoClassDefFound => "NoClassDefFound",
            LinkageKind::NoSuchField => "NoSuchField",
            LinkageKind::NoSuchMethod => "NoSuchMethod",
            LinkageKind::IllegalAccess => "IllegalAccess",
            LinkageKind::IncompatibleClassChange => "IncompatibleClassChange",
            LinkageKind::BootstrapMethodFailed => "BootstrapMethodFailed",
        };
        f.write_str(name)
    }
}

/// The generic Error type, which provides coverage for all errors this library can
/// potentially return.
///
/// The taxonomy mirrors the behavior contract of the resolution engine:
/// resolution failures (`ClassResolution`, `Linkage`, `Circularity`) are local to
/// the entry being resolved and may be cached sticky against it, while internal
/// consistency violations (`Malformed`) are fail-fast and never cached.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// A symbolic class reference could not be resolved.
    ///
    /// Raised when the class-loading collaborator fails to locate or define the
    /// named class, or when a loader constraint is violated. Recorded sticky
    /// against the failing constant pool index so every subsequent resolution
    /// attempt observes the same error without re-invoking the loader.
    #[error("class resolution failed for '{name}': {message}")]
    ClassResolution {
        /// Binary name of the class that failed to resolve
        name: String,
        /// Stable, reproducible failure description
        message: String,
    },

    /// A member or dynamic-call-site linkage failure.
    ///
    /// Covers missing fields/methods, access violations, incompatible class
    /// changes and bootstrap method failures. Like [`Error::ClassResolution`],
    /// linkage errors are replayed verbatim on repeat attempts.
    #[error("linkage error ({kind}): {message}")]
    Linkage {
        /// Which user-visible linkage error class this maps to
        kind: LinkageKind,
        /// Stable, reproducible failure description
        message: String,
    },

    /// A circular superclass dependency was detected during loading.
    ///
    /// Detected by the class-loading orchestrator from facts recorded in the
    /// placeholder table; aborts the entire load attempt for the implicated
    /// (name, loader) key and is raised to every thread queued on it.
    #[error("circular class definition detected while loading '{name}'")]
    Circularity {
        /// Binary name of the class at the head of the cycle
        name: String,
    },

    /// Internal consistency violation in constant pool data.
    ///
    /// Wrong-tag reads, misaligned bootstrap argument tables and invalid
    /// cross-indices are programming or parser errors, never recoverable
    /// conditions. The error carries the source location where the
    /// malformation was detected.
    #[error("malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// Failed to lock target.
    ///
    /// Thread synchronization failed, typically because a mutex was poisoned
    /// by a panicking thread.
    #[error("failed to lock target")]
    LockError,
}

impl Error {
    /// Returns `true` for errors that belong to the linkage family and are
    /// therefore eligible for sticky caching against a pool index.
    ///
    /// Internal errors and lock failures propagate uncached, so transient
    /// conditions never poison an entry permanently.
    #[must_use]
    pub fn is_linkage_family(&self) -> bool {
        matches!(
            self,
            Error::ClassResolution { .. } | Error::Linkage { .. } | Error::Circularity { .. }
        )
    }
}
