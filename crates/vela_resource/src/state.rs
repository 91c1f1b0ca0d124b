//! Resource state values.
//!
//! A [`ResourceState`] is what observers of a resource see. Exactly one tag is
//! active at a time, and only `Loaded` and `Local` carry data:
//!
//! | State | Data | Produced by |
//! |-------|------|-------------|
//! | `Loading` | no | controller creation, invocation start |
//! | `Loaded` | yes | successful loader invocation |
//! | `Error` | no | failed invocation (retries exhausted or timeout) |
//! | `Local` | yes | `set` / `update` on the controller |

use core::fmt;

use crate::error::LoadError;

/// The observable state of a resource.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceState<T> {
    /// A load is in progress, or the first one has not started yet.
    Loading,
    /// The most recent invocation succeeded.
    Loaded {
        /// The loaded value.
        data: T,
    },
    /// The most recent invocation failed.
    Error {
        /// The terminal failure.
        error: LoadError,
    },
    /// The value was replaced locally, bypassing the loader.
    Local {
        /// The locally-set value.
        data: T,
    },
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self::Loading
    }
}

impl<T> ResourceState<T> {
    /// Returns the data-free tag of this state.
    #[must_use]
    pub fn status(&self) -> ResourceStatus {
        match self {
            Self::Loading => ResourceStatus::Loading,
            Self::Loaded { .. } => ResourceStatus::Loaded,
            Self::Error { .. } => ResourceStatus::Error,
            Self::Local { .. } => ResourceStatus::Local,
        }
    }

    /// Returns `true` while loading.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Returns `true` if the state carries data.
    #[must_use]
    pub fn has_value(&self) -> bool {
        self.data().is_some()
    }

    /// Returns the data of a `Loaded` or `Local` state.
    #[must_use]
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Loaded { data } | Self::Local { data } => Some(data),
            Self::Loading | Self::Error { .. } => None,
        }
    }

    /// Consumes the state and returns its data, if any.
    #[must_use]
    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Loaded { data } | Self::Local { data } => Some(data),
            Self::Loading | Self::Error { .. } => None,
        }
    }

    /// Returns the failure of an `Error` state.
    #[must_use]
    pub fn error(&self) -> Option<&LoadError> {
        match self {
            Self::Error { error } => Some(error),
            _ => None,
        }
    }

    /// Maps the carried data, keeping the tag.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ResourceState<U> {
        match self {
            Self::Loading => ResourceState::Loading,
            Self::Loaded { data } => ResourceState::Loaded { data: f(data) },
            Self::Error { error } => ResourceState::Error { error },
            Self::Local { data } => ResourceState::Local { data: f(data) },
        }
    }
}

/// Data-free tag of a [`ResourceState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceStatus {
    /// See [`ResourceState::Loading`].
    Loading,
    /// See [`ResourceState::Loaded`].
    Loaded,
    /// See [`ResourceState::Error`].
    Error,
    /// See [`ResourceState::Local`].
    Local,
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceStatus::Loading => "loading",
            ResourceStatus::Loaded => "loaded",
            ResourceStatus::Error => "error",
            ResourceStatus::Local => "local",
        };
        f.write_str(name)
    }
}
