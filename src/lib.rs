//! Scanline buffer allocation for image codecs.
//!
//! This crate provides the row-table plumbing an image codec needs between
//! header parsing and pixel decoding: given parsed dimensions it allocates
//! one buffer per scan line, optionally pre-fills the buffers, registers the
//! table with the image context and keeps every byte accounted against a
//! configurable allocation budget. Dimension overflow is rejected up front
//! and a failure partway through building the table rolls everything back,
//! so callers never observe a partial table or a leaked reservation.
//!
//! ```
//! use image_rows::{allocate_rows, ImageInfo, Limits};
//!
//! let mut info = ImageInfo::with_size(4, 3);
//! let mut limits = Limits::default();
//!
//! let rows = allocate_rows(&mut info, &mut limits, Some(0))
//!     .expect("valid header")
//!     .expect("within the allocation budget");
//! assert_eq!(rows.len(), 3);
//! assert!(rows.rows().all(|row| row.iter().all(|&byte| byte == 0)));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod common;
pub mod error;
mod limits;
mod rows;

pub use crate::common::{BitDepth, ColorType, ImageInfo};
pub use crate::error::{ImageError, ImageResult, LimitErrorKind};
pub use crate::limits::Limits;
pub use crate::rows::{allocate_rows, allocate_rows_with_min, free_rows, RowTable};
