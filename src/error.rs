//! Error taxonomy for the crate.
//!
//! Lookup-style operations (buckets, [`Director::get_system`]) never fail
//! hard: a miss is reported as `None` plus a log line. The variants here
//! exist so those misses can also be carried as values where a caller wants
//! them, and so persistence/configuration can propagate real failures.
//!
//! The only fatal path is [`Require::require`] on an absent value, which is
//! a programmer error.
//!
//! [`Director::get_system`]: crate::systems::director::Director::get_system

use thiserror::Error;

/// Errors produced by buckets, the module registry, persistence and config.
#[derive(Debug, Error)]
pub enum KitError {
    /// A name-keyed lookup missed.
    #[error("'{name}' not found in {container}")]
    NotFound { container: String, name: String },
    /// A bucket value could not be coerced into the requested type.
    #[error("'{name}' in {container} holds '{raw}', unsupported type for {requested}")]
    TypeMismatch {
        container: String,
        name: String,
        raw: String,
        requested: &'static str,
    },
    /// An absent optional value was accessed directly.
    #[error("accessed empty value: {0}")]
    EmptyValue(String),
    /// A second module of the same concrete type was registered.
    #[error("module type {0} is already registered")]
    DuplicateRegistration(&'static str),
    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// INI configuration error.
    #[error("config error: {0}")]
    Config(String),
}

/// Crate-wide result alias.
pub type KitResult<T> = Result<T, KitError>;

/// Direct access to a value that is expected to be present.
///
/// `Option` is the present/absent wrapper used by every lookup in the crate.
/// Callers should branch on `is_some()`; `require` is for the places where
/// absence means the program is wired incorrectly.
pub trait Require<T> {
    /// Return the value, or panic with an [`KitError::EmptyValue`] message.
    fn require(self, what: &str) -> T;
    /// Return the value, or an [`KitError::EmptyValue`] error.
    fn try_require(self, what: &str) -> KitResult<T>;
}

impl<T> Require<T> for Option<T> {
    #[track_caller]
    fn require(self, what: &str) -> T {
        match self {
            Some(value) => value,
            None => panic!("{}", KitError::EmptyValue(what.to_string())),
        }
    }

    fn try_require(self, what: &str) -> KitResult<T> {
        self.ok_or_else(|| KitError::EmptyValue(what.to_string()))
    }
}
