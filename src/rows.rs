//! Allocation of the per-row buffer table used to hold decoded pixel data.
//!
//! Between header parsing and pixel decoding a codec needs one buffer per
//! scan line, sized from the parsed dimensions. [`allocate_rows`] builds
//! that table, optionally pre-fills it, registers it with the [`ImageInfo`]
//! and accounts every byte against the caller's [`Limits`]. Running out of
//! budget is an ordinary outcome here, reported as `Ok(None)` with
//! everything rolled back, while unusable headers are hard errors.

use std::collections::TryReserveError;
use std::mem;
use std::ops::{Index, IndexMut};

use crate::common::ImageInfo;
use crate::error::{ImageError, ImageResult, LimitErrorKind};
use crate::limits::Limits;

/// Size of one slot of the row table.
const ROW_SLOT_SIZE: usize = mem::size_of::<Box<[u8]>>();

/// An owned table of row buffers, one per image scan line.
///
/// Every row has the same length, fixed when the table is built. A table is
/// only ever observed complete: the allocator never registers or returns a
/// partially built one.
#[derive(Debug)]
pub struct RowTable {
    rows: Vec<Box<[u8]>>,
    row_bytes: usize,
}

impl RowTable {
    /// Number of rows in the table.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Length in bytes of every row.
    pub fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    /// Borrows row `y`, or `None` past the end of the table.
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        self.rows.get(y).map(|row| &row[..])
    }

    /// Mutably borrows row `y`, or `None` past the end of the table.
    pub fn row_mut(&mut self, y: usize) -> Option<&mut [u8]> {
        self.rows.get_mut(y).map(|row| &mut row[..])
    }

    /// Iterates over the rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.rows.iter().map(|row| &row[..])
    }

    /// Iterates mutably over the rows, top to bottom.
    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut [u8]> {
        self.rows.iter_mut().map(|row| &mut row[..])
    }

    /// Bytes this table accounts for against [`Limits`]: the row buffers
    /// plus the row index itself.
    pub fn in_memory_size(&self) -> u64 {
        let slots = self.rows.len() as u64;
        slots
            .saturating_mul(self.row_bytes as u64)
            .saturating_add(slots.saturating_mul(ROW_SLOT_SIZE as u64))
    }
}

impl Index<usize> for RowTable {
    type Output = [u8];

    fn index(&self, y: usize) -> &[u8] {
        &self.rows[y]
    }
}

impl IndexMut<usize> for RowTable {
    fn index_mut(&mut self, y: usize) -> &mut [u8] {
        &mut self.rows[y]
    }
}

/// Allocates one buffer per image row and registers the table with `info`.
///
/// Convenience form of [`allocate_rows_with_min`] using the natural row
/// size. When `fill` is `Some(byte)` every allocated row is filled with that
/// byte; with `None` the row contents are unspecified.
pub fn allocate_rows<'a>(
    info: &'a mut ImageInfo,
    limits: &mut Limits,
    fill: Option<u8>,
) -> ImageResult<Option<&'a mut RowTable>> {
    allocate_rows_with_min(info, limits, 0, fill)
}

/// Allocates one buffer of at least `min_row_bytes` bytes per image row and
/// registers the table with `info`.
///
/// Each row is `max(row_bytes, min_row_bytes)` long, where `row_bytes` is
/// computed from the header's width, bit depth and color type. A table
/// registered by an earlier call is discarded first and its bytes returned
/// to the budget, so the call is safe to repeat on the same context.
///
/// `Ok(None)` reports that the allocation budget or the host allocator was
/// exhausted. Nothing is registered in that case and every intermediate
/// allocation and reservation has been rolled back; the caller may free
/// memory, raise the limits and try again. Errors are reserved for headers
/// the operation cannot work from:
///
/// * [`ImageError::MissingHeader`] when the height is zero;
/// * [`ImageError::Limits`] with [`LimitErrorKind::DimensionError`] when the
///   row size is zero or unrepresentable, when the row index alone would
///   overflow address arithmetic, or when a configured dimension limit is
///   exceeded.
pub fn allocate_rows_with_min<'a>(
    info: &'a mut ImageInfo,
    limits: &mut Limits,
    min_row_bytes: usize,
    fill: Option<u8>,
) -> ImageResult<Option<&'a mut RowTable>> {
    let height = info.height;
    if height == 0 {
        return Err(ImageError::MissingHeader);
    }

    // A row size of zero signals a width that cannot be represented.
    let row_bytes = info.checked_row_bytes().unwrap_or(0);
    if row_bytes == 0 || u64::from(height) > (usize::MAX / ROW_SLOT_SIZE) as u64 {
        return Err(ImageError::Limits {
            kind: LimitErrorKind::DimensionError,
        });
    }
    limits.check_dimensions(info.width, height)?;

    let row_bytes = row_bytes.max(min_row_bytes);

    // Discard previously registered rows before building the new table.
    free_rows(info, limits);

    match build_table(limits, height as usize, row_bytes, fill) {
        Some(table) => {
            info.set_rows(table);
            Ok(info.rows_mut())
        }
        None => Ok(None),
    }
}

/// Discards the row table registered with `info`, if any, returning its
/// bytes to the allocation budget.
pub fn free_rows(info: &mut ImageInfo, limits: &mut Limits) {
    if let Some(table) = info.take_rows() {
        limits.free(table.in_memory_size());
    }
}

/// Builds the full table or nothing: a failure on any row drops all rows
/// built so far and frees their reservations together with the index's.
fn build_table(
    limits: &mut Limits,
    height: usize,
    row_bytes: usize,
    fill: Option<u8>,
) -> Option<RowTable> {
    // The dimension check bounds `height * ROW_SLOT_SIZE`.
    let index_bytes = height * ROW_SLOT_SIZE;
    if limits.reserve_usize(index_bytes).is_err() {
        return None;
    }
    let mut rows: Vec<Box<[u8]>> = match try_vec_with_capacity(height) {
        Ok(rows) => rows,
        Err(_) => {
            limits.free_usize(index_bytes);
            return None;
        }
    };

    for built in 0..height {
        match allocate_row(limits, row_bytes, fill) {
            Some(row) => rows.push(row),
            None => {
                drop(rows);
                limits.free(
                    (built as u64)
                        .saturating_mul(row_bytes as u64)
                        .saturating_add(index_bytes as u64),
                );
                return None;
            }
        }
    }

    Some(RowTable { rows, row_bytes })
}

fn allocate_row(limits: &mut Limits, row_bytes: usize, fill: Option<u8>) -> Option<Box<[u8]>> {
    if limits.reserve_usize(row_bytes).is_err() {
        return None;
    }
    match try_vec_with_capacity(row_bytes) {
        Ok(mut row) => {
            row.resize(row_bytes, fill.unwrap_or(0));
            Some(row.into_boxed_slice())
        }
        Err(_) => {
            limits.free_usize(row_bytes);
            None
        }
    }
}

fn try_vec_with_capacity<T>(capacity: usize) -> Result<Vec<T>, TryReserveError> {
    let mut vec = Vec::new();
    vec.try_reserve_exact(capacity)?;
    Ok(vec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{BitDepth, ColorType};
    use quickcheck::quickcheck;

    #[test]
    fn allocates_and_registers_the_table() {
        let mut info = ImageInfo::with_size(4, 3);
        let mut limits = Limits::default();

        let rows = allocate_rows(&mut info, &mut limits, Some(0))
            .unwrap()
            .expect("within the default budget");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows.row_bytes(), 4);

        let registered = info.rows().expect("table is registered");
        assert_eq!(registered.len(), 3);
    }

    #[test]
    fn zero_height_is_a_missing_header() {
        let mut info = ImageInfo::with_size(4, 0);
        let mut limits = Limits::no_limits();
        assert!(matches!(
            allocate_rows(&mut info, &mut limits, None),
            Err(ImageError::MissingHeader)
        ));
        assert!(info.rows().is_none());
    }

    #[test]
    fn zero_row_size_is_a_dimension_error() {
        let mut info = ImageInfo::with_size(0, 3);
        let mut limits = Limits::no_limits();
        assert!(matches!(
            allocate_rows(&mut info, &mut limits, None),
            Err(ImageError::Limits {
                kind: LimitErrorKind::DimensionError,
            })
        ));
    }

    #[test]
    fn min_row_bytes_raises_short_rows() {
        let mut info = ImageInfo::with_size(4, 3);
        let mut limits = Limits::no_limits();

        let rows = allocate_rows_with_min(&mut info, &mut limits, 10, None)
            .unwrap()
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows.row_bytes(), 10);
        assert!(rows.rows().all(|row| row.len() == 10));
    }

    #[test]
    fn rows_are_writable_through_the_table() {
        let mut info = ImageInfo::with_size(2, 2);
        info.bit_depth = BitDepth::Eight;
        info.color_type = ColorType::Rgb;
        let mut limits = Limits::default();

        let rows = allocate_rows(&mut info, &mut limits, Some(0xff))
            .unwrap()
            .unwrap();
        rows[1][0] = 7;
        assert_eq!(rows.row(1).unwrap()[0], 7);
        assert_eq!(rows.row(0).unwrap()[0], 0xff);
        assert!(rows.row(2).is_none());
    }

    quickcheck! {
        fn table_matches_requested_shape(width: u32, height: u32, fill: u8) -> bool {
            let width = width % 128 + 1;
            let height = height % 64 + 1;
            let mut info = ImageInfo::with_size(width, height);
            let mut limits = Limits::no_limits();

            let rows = allocate_rows(&mut info, &mut limits, Some(fill))
                .unwrap()
                .unwrap();
            rows.len() == height as usize
                && rows
                    .rows()
                    .all(|row| row.len() == width as usize && row.iter().all(|&b| b == fill))
        }
    }
}
