//! Error types for the cascade simulation core.
//!
//! Every fallible operation in the crate returns [`ContagionError`]. Each
//! variant maps onto a stable [`ContagionErrorCode`] so binaries can log a
//! machine-readable identifier alongside the human-readable message.

use std::{fmt, sync::Arc};

use thiserror::Error;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!("Retrieve the stable [`", stringify!($CodeTy), "`] for this error.")]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// A failed worker batch captured by [`ContagionError::Aggregate`].
#[derive(Clone, Debug, PartialEq)]
pub struct BatchFailure {
    /// Zero-based index of the batch that failed.
    pub batch: usize,
    /// Error raised while the batch was running.
    pub error: ContagionError,
}

impl fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "batch {}: {}", self.batch, self.error)
    }
}

/// Error type produced by graph generation, simulation, and aggregation.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ContagionError {
    /// A caller-supplied parameter was outside its accepted range.
    #[error("invalid {parameter}: got {value}, expected {expected}")]
    InvalidParameter {
        /// Name of the offending parameter.
        parameter: &'static str,
        /// The rejected value, rendered for diagnostics.
        value: Arc<str>,
        /// Human-readable description of the accepted range.
        expected: &'static str,
    },
    /// The computed edge probability fell outside `[0, 1]` and the
    /// configured policy refuses to clamp it.
    #[error("edge probability {probability} lies outside [0, 1]")]
    DegenerateProbability {
        /// The offending probability `z / n`.
        probability: f64,
    },
    /// The worker pool could not be created.
    #[error("failed to start worker pool: {message}")]
    WorkerPool {
        /// Message reported by the pool builder.
        message: Arc<str>,
    },
    /// A worker panicked while running its batch.
    #[error("worker panicked: {message}")]
    WorkerPanicked {
        /// Panic payload, when it carried a message.
        message: Arc<str>,
    },
    /// One or more batches of a parallel run failed.
    #[error("{} of {batches} batches failed; first failure: {}", .failures.len(), first_failure(.failures))]
    Aggregate {
        /// Number of batches that were dispatched.
        batches: usize,
        /// Every failed batch in batch order.
        failures: Vec<BatchFailure>,
    },
}

fn first_failure(failures: &[BatchFailure]) -> String {
    failures
        .first()
        .map_or_else(|| "none".to_owned(), ToString::to_string)
}

define_error_codes! {
    /// Stable codes describing [`ContagionError`] variants.
    enum ContagionErrorCode for ContagionError {
        /// A caller-supplied parameter was outside its accepted range.
        InvalidParameter => InvalidParameter { .. } => "LTCASCADE_INVALID_PARAMETER",
        /// The computed edge probability fell outside `[0, 1]`.
        DegenerateProbability => DegenerateProbability { .. } => "LTCASCADE_DEGENERATE_PROBABILITY",
        /// The worker pool could not be created.
        WorkerPool => WorkerPool { .. } => "LTCASCADE_WORKER_POOL",
        /// A worker panicked while running its batch.
        WorkerPanicked => WorkerPanicked { .. } => "LTCASCADE_WORKER_PANICKED",
        /// One or more batches of a parallel run failed.
        Aggregate => Aggregate { .. } => "LTCASCADE_AGGREGATE_FAILURE",
    }
}

impl ContagionError {
    /// Builds an [`ContagionError::InvalidParameter`] for `parameter`.
    ///
    /// # Examples
    /// ```
    /// use ltcascade_core::{ContagionError, ContagionErrorCode};
    ///
    /// let err = ContagionError::invalid_parameter("nodes", 1, "at least 2");
    /// assert_eq!(err.code(), ContagionErrorCode::InvalidParameter);
    /// assert_eq!(err.to_string(), "invalid nodes: got 1, expected at least 2");
    /// ```
    #[must_use]
    pub fn invalid_parameter(
        parameter: &'static str,
        value: impl fmt::Display,
        expected: &'static str,
    ) -> Self {
        Self::InvalidParameter {
            parameter,
            value: Arc::from(value.to_string()),
            expected,
        }
    }

    /// Returns the failed batches when this is an aggregate error.
    #[must_use]
    pub fn batch_failures(&self) -> Option<&[BatchFailure]> {
        match self {
            Self::Aggregate { failures, .. } => Some(failures),
            _ => None,
        }
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, ContagionError>;
