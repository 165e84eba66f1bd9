//! Resource limits for row allocation.

use crate::error::{ImageError, ImageResult, LimitErrorKind};

/// Resource limits for building row storage.
///
/// The dimension limits are strict: an allocation for an image exceeding
/// them always fails with [`LimitErrorKind::DimensionError`]. The allocation
/// limit is a running budget; every reservation made against it must be
/// freed back once the memory it covered is released, which the row
/// allocator does on all of its unwind paths.
#[derive(Clone, Debug)]
#[allow(missing_copy_implementations)]
#[non_exhaustive]
pub struct Limits {
    /// The maximum allowed image width. The default is no limit.
    pub max_image_width: Option<u32>,
    /// The maximum allowed image height. The default is no limit.
    pub max_image_height: Option<u32>,
    /// The maximum allowed sum of allocations held at any one time excluding
    /// allocator overhead. The bytes required to store the row table count
    /// towards this value. The default is 512MiB.
    pub max_alloc: Option<u64>,
}

/// Add some reasonable limits.
///
/// **Note**: This is not equivalent to _not_ adding limits. This may be
/// changed in future major version increases.
impl Default for Limits {
    fn default() -> Limits {
        Limits {
            max_image_width: None,
            max_image_height: None,
            max_alloc: Some(512 * 1024 * 1024),
        }
    }
}

impl Limits {
    /// Disable all limits.
    #[must_use]
    pub fn no_limits() -> Limits {
        Limits {
            max_image_width: None,
            max_image_height: None,
            max_alloc: None,
        }
    }

    /// This function checks the `max_image_width` and `max_image_height`
    /// limits given the image width and height.
    pub fn check_dimensions(&self, width: u32, height: u32) -> ImageResult<()> {
        if let Some(max_width) = self.max_image_width {
            if width > max_width {
                return Err(ImageError::Limits {
                    kind: LimitErrorKind::DimensionError,
                });
            }
        }

        if let Some(max_height) = self.max_image_height {
            if height > max_height {
                return Err(ImageError::Limits {
                    kind: LimitErrorKind::DimensionError,
                });
            }
        }

        Ok(())
    }

    /// This function checks that the current limit allows for reserving the
    /// set amount of bytes, it then reduces the limit accordingly.
    pub fn reserve(&mut self, amount: u64) -> ImageResult<()> {
        if let Some(max_alloc) = self.max_alloc.as_mut() {
            if *max_alloc < amount {
                return Err(ImageError::Limits {
                    kind: LimitErrorKind::InsufficientMemory,
                });
            }

            *max_alloc -= amount;
        }

        Ok(())
    }

    /// This function acts identically to [`reserve`], but takes a `usize`
    /// for convenience.
    ///
    /// [`reserve`]: #method.reserve
    pub fn reserve_usize(&mut self, amount: usize) -> ImageResult<()> {
        match u64::try_from(amount) {
            Ok(n) => self.reserve(n),
            Err(_) if self.max_alloc.is_some() => Err(ImageError::Limits {
                kind: LimitErrorKind::InsufficientMemory,
            }),
            Err(_) => {
                // Out of bounds, but we weren't asked to consider any limit.
                Ok(())
            }
        }
    }

    /// This function increases the `max_alloc` limit with amount. Should
    /// only be used together with [`reserve`].
    ///
    /// [`reserve`]: #method.reserve
    pub fn free(&mut self, amount: u64) {
        if let Some(max_alloc) = self.max_alloc.as_mut() {
            *max_alloc = max_alloc.saturating_add(amount);
        }
    }

    /// This function acts identically to [`free`], but takes a `usize` for
    /// convenience.
    ///
    /// [`free`]: #method.free
    pub fn free_usize(&mut self, amount: usize) {
        match u64::try_from(amount) {
            Ok(n) => self.free(n),
            Err(_) if self.max_alloc.is_some() => {
                panic!("max_alloc is set, we should have exited earlier when the reserve failed");
            }
            Err(_) => {
                // Out of bounds, but we weren't asked to consider any limit.
            }
        }
    }
}

#[test]
fn limits_reserve_free() {
    let mut limits = Limits {
        max_image_width: Some(100),
        max_image_height: Some(100),
        max_alloc: Some(1024),
    };

    assert!(limits.reserve(512).is_ok());
    assert_eq!(limits.max_alloc, Some(512));

    assert!(limits.reserve(600).is_err());
    assert_eq!(limits.max_alloc, Some(512));

    limits.free(256);
    assert_eq!(limits.max_alloc, Some(768));
}

#[test]
fn limits_check_dimensions() {
    let mut limits = Limits::no_limits();
    assert!(limits.check_dimensions(u32::MAX, u32::MAX).is_ok());

    limits.max_image_width = Some(64);
    limits.max_image_height = Some(64);
    assert!(limits.check_dimensions(64, 64).is_ok());
    assert!(matches!(
        limits.check_dimensions(65, 1),
        Err(ImageError::Limits {
            kind: LimitErrorKind::DimensionError,
        })
    ));
    assert!(limits.check_dimensions(1, 65).is_err());
}
