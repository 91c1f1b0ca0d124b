//! Error types for resource loading and construction.

use core::any::Any;
use core::fmt;
use core::time::Duration;
use std::sync::Arc;

/// Boxed error returned by loaders.
pub type BoxError = Box<dyn core::error::Error + Send + Sync + 'static>;

/// Shared, type-erased loader failure.
pub type SharedError = Arc<dyn core::error::Error + Send + Sync + 'static>;

/// Terminal failure of a load, as stored in
/// [`ResourceState::Error`](crate::state::ResourceState::Error).
///
/// Cloning is cheap: the loader's error is kept behind an [`Arc`] and handed
/// to every observer unchanged.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    /// The loader returned an error. The original value is preserved and can
    /// be recovered with [`downcast_ref`](Self::downcast_ref).
    #[error(transparent)]
    Loader(SharedError),

    /// The loader did not settle before the deadline.
    #[error("loader timed out after {after:?}")]
    Timeout {
        /// The deadline that was exceeded.
        after: Duration,
    },

    /// The loader panicked.
    #[error("loader panicked: {message}")]
    Panicked {
        /// The panic payload, if it was a string.
        message: String,
    },
}

impl LoadError {
    /// Wraps a loader error.
    pub fn loader(error: impl Into<BoxError>) -> Self {
        Self::Loader(Arc::from(error.into()))
    }

    pub(crate) fn panicked(payload: Box<dyn Any + Send>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(message) => *message,
            Err(payload) => match payload.downcast::<&'static str>() {
                Ok(message) => (*message).to_owned(),
                Err(_) => "non-string panic payload".to_owned(),
            },
        };
        Self::Panicked { message }
    }

    /// Returns `true` for the timeout marker.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns the loader's own error if it is of type `E`.
    #[must_use]
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: core::error::Error + 'static,
    {
        match self {
            Self::Loader(error) => error.downcast_ref::<E>(),
            Self::Timeout { .. } | Self::Panicked { .. } => None,
        }
    }
}

/// Two loader errors are equal only if they are the same shared value.
impl PartialEq for LoadError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Loader(a), Self::Loader(b)) => Arc::ptr_eq(a, b),
            (Self::Timeout { after: a }, Self::Timeout { after: b }) => a == b,
            (Self::Panicked { message: a }, Self::Panicked { message: b }) => a == b,
            _ => false,
        }
    }
}

/// Invalid [`ResourceConfig`](crate::config::ResourceConfig) values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A timeout of zero would fail every attempt immediately.
    #[error("timeout must be greater than zero")]
    ZeroTimeout,

    /// The change history backing state observers is out of range.
    #[error("history capacity must be between 1 and {max}, got {capacity}")]
    HistoryCapacity {
        /// The rejected capacity.
        capacity: usize,
        /// The largest accepted capacity.
        max: usize,
    },
}

/// Errors that can occur while spawning a resource.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// The configuration was rejected.
    #[error("invalid resource config: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// No Tokio runtime is available to run the scheduler.
    #[error("no tokio runtime is running; resources must be spawned from within one")]
    NoRuntime,
}

/// Errors that can occur during hook registration.
#[derive(Debug, Clone)]
pub enum HookRegistrationError {
    /// A hook with this name already exists on the schedule.
    DuplicateName {
        /// Type name of the schedule where the duplicate was found.
        schedule: &'static str,
        /// The duplicate hook name.
        name: String,
    },
}

impl fmt::Display for HookRegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookRegistrationError::DuplicateName { schedule, name } => {
                write!(f, "hook '{name}' already registered for schedule '{schedule}'")
            }
        }
    }
}

impl core::error::Error for HookRegistrationError {}
