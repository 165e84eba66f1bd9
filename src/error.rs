//! Contains detailed error representation.
//!
//! See the main [`ImageError`] which separates header misuse from resource
//! limits. Exhaustion of the allocation budget is *not* represented here:
//! the row allocator reports it as a normal empty return so that callers may
//! free memory, raise their [`Limits`](crate::Limits) and try again.

use core::fmt;

use snafu::prelude::*;

/// The generic error type for row-table operations.
///
/// Every variant describes an input the operation cannot proceed with, as
/// opposed to a resource shortage it could recover from.
#[derive(Snafu, Debug)]
#[non_exhaustive]
pub enum ImageError {
    /// The context carries no usable header: the image height is zero, so
    /// there is no row storage to build.
    #[snafu(display("missing image header"))]
    MissingHeader,

    /// Completing the operation would have required more resources than the
    /// platform or the configured limits allow.
    #[snafu(display("cannot allocate row storage: {kind}"))]
    Limits {
        /// The limit that was hit.
        kind: LimitErrorKind,
    },
}

/// Indicates the limit that prevented an operation from completing.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[non_exhaustive]
pub enum LimitErrorKind {
    /// The image dimensions exceed what the operation can address, in either
    /// direction.
    DimensionError,
    /// The operation would have performed an allocation larger than allowed.
    InsufficientMemory,
}

impl fmt::Display for LimitErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LimitErrorKind::DimensionError => "the image dimensions are too large",
            LimitErrorKind::InsufficientMemory => "the allocation exceeds the memory limit",
        })
    }
}

/// Result of a row-table operation.
pub type ImageResult<T> = Result<T, ImageError>;
