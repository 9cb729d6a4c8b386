//! Metadata table infrastructure: row traits, the lazy table store, and the
//! coded-index machinery.
//!
//! The `#~` stream is a sequence of packed row arrays whose column widths are
//! only known once the [`TableInfo`] layout context has been resolved from the
//! global row counts and heap-size flags. Everything in this module is built
//! around that resolved layout:
//!
//! - [`RowReadable`] / [`RowWritable`]: per-kind row decode/encode against a
//!   layout.
//! - [`MetadataTable`]: the lazy table store. Positional reads decode straight
//!   from the raw bytes; the first structural touch (in-place update, buffer
//!   flush) decodes every row into an in-memory sequence exactly once.
//! - [`CodedIndex`] / [`CodedIndexType`]: tagged cross-table references.
//! - [`TableWriter`]: write-side row buffering with stable token assignment.

mod codedindex;
mod tabledata;
mod tableid;
mod tableinfo;
mod writer;

pub mod rows;

use std::{
    collections::HashMap,
    marker::PhantomData,
    sync::{Arc, Mutex, OnceLock, RwLock},
};

use rayon::iter::{plumbing, IndexedParallelIterator, ParallelIterator};

use crate::Result;

pub use codedindex::{CodedIndex, CodedIndexType};
pub use rows::*;
pub use tabledata::{RowData, TableData};
pub use tableid::TableId;
pub use tableinfo::{TableInfo, TableInfoRef, TableRowInfo};
pub use writer::{SortOrder, TableWriter};

/// Decode side of a metadata table row.
///
/// Implementations parse exactly the columns the resolved layout declares for
/// their table kind, at the widths the layout dictates, and must be `Send` and
/// cheap to clone so materialized tables can hand out copies.
pub trait RowReadable: Sized + Send + Clone {
    /// The size in bytes of one row under the given layout.
    fn row_size(sizes: &TableInfoRef) -> u32;

    /// Reads one row at `offset`, advancing the offset past it.
    ///
    /// `rid` is the 1-based row id of the row being read; it is carried into
    /// the row for token minting, not read from the buffer.
    ///
    /// # Errors
    /// Returns an error if the buffer is truncated or a column is malformed.
    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self>;
}

/// Encode side of a metadata table row, symmetric with [`RowReadable`].
pub trait RowWritable: Sized {
    /// Writes this row's columns at `offset`, advancing the offset past them.
    ///
    /// The byte layout must match what [`RowReadable::row_read`] consumes
    /// under the same [`TableInfoRef`].
    ///
    /// # Errors
    /// Returns an error if the buffer is too small or a value does not fit
    /// its resolved column width.
    fn row_write(
        &self,
        data: &mut [u8],
        offset: &mut usize,
        rid: u32,
        sizes: &TableInfoRef,
    ) -> Result<()>;
}

/// Materialized row storage, published once by the first materializer.
///
/// `rid_slots` is installed by a sorted buffer flush: it maps row ids whose
/// physical position no longer equals `rid - 1`, so tokens issued at add time
/// keep addressing the row they were issued for.
struct TableRows<T> {
    rows: Vec<T>,
    rid_slots: Option<HashMap<u32, u32>>,
}

impl<T: Clone> TableRows<T> {
    fn slot_of(&self, rid: u32) -> usize {
        match &self.rid_slots {
            Some(map) => map.get(&rid).copied().unwrap_or(rid - 1) as usize,
            None => (rid - 1) as usize,
        }
    }

    fn fetch(&self, rid: u32) -> Option<T> {
        if rid == 0 {
            return None;
        }
        self.rows.get(self.slot_of(rid)).cloned()
    }
}

/// The lazy table store: one instance per table kind present in an image.
///
/// Wraps the table's raw byte region, its resolved layout, and the declared
/// row count. Rows are not decoded up front: `get` seeks directly to
/// `(rid - 1) * row_size` and decodes one row. The first structural touch
/// (`set`, a write-buffer flush) decodes the whole table into memory behind a
/// `OnceLock`, so two readers racing to materialize publish exactly one
/// sequence; the raw and materialized paths yield bit-identical rows.
pub struct MetadataTable<'a, T> {
    /// Reference to the raw table data bytes
    data: &'a [u8],
    /// Number of rows declared by the stream header
    raw_row_count: u32,
    /// Size in bytes of each row
    row_size: u32,
    /// The resolved layout context
    sizes: TableInfoRef,
    /// Decoded rows, set once on first structural touch
    decoded: OnceLock<RwLock<TableRows<T>>>,
    _phantom: PhantomData<T>,
}

impl<'a, T: RowReadable> MetadataTable<'a, T> {
    /// Creates a table store over `data` holding `row_count` rows.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `data` is shorter than the
    /// declared rows require.
    pub fn new(data: &'a [u8], row_count: u32, sizes: TableInfoRef) -> Result<Self> {
        let row_size = T::row_size(&sizes);
        if (u64::from(row_count) * u64::from(row_size)) > data.len() as u64 {
            return Err(crate::Error::OutOfBounds);
        }

        Ok(MetadataTable {
            data,
            raw_row_count: row_count,
            row_size,
            sizes,
            decoded: OnceLock::new(),
            _phantom: PhantomData,
        })
    }

    /// Returns the total size of the raw table region in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        u64::from(self.raw_row_count) * u64::from(self.row_size)
    }

    /// Returns the size of a single row in bytes.
    #[must_use]
    pub fn row_size(&self) -> u32 {
        self.row_size
    }

    /// Returns the current number of rows.
    ///
    /// Equal to the declared count until a buffer flush grows the table.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn row_count(&self) -> u32 {
        match self.decoded.get() {
            Some(lock) => read_lock!(lock).rows.len() as u32,
            None => self.raw_row_count,
        }
    }

    /// Returns true once the raw→decoded transition has happened.
    #[must_use]
    pub fn is_materialized(&self) -> bool {
        self.decoded.get().is_some()
    }

    /// Retrieves a row by its 1-based id.
    ///
    /// Id 0 (the null reference) and ids beyond the row count yield `None`,
    /// never an error — dangling references are routine in malformed images
    /// and callers proceed past them.
    #[must_use]
    pub fn get(&self, rid: u32) -> Option<T> {
        if let Some(lock) = self.decoded.get() {
            return read_lock!(lock).fetch(rid);
        }

        if rid == 0 || self.raw_row_count < rid {
            return None;
        }

        T::row_read(
            self.data,
            &mut ((rid as usize - 1) * self.row_size as usize),
            rid,
            &self.sizes,
        )
        .ok()
    }

    /// Replaces the row stored under `rid`.
    ///
    /// Structural touch: triggers materialization, then updates in place.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if no row exists under `rid`, or
    /// a decode error if materialization fails.
    pub fn set(&self, rid: u32, row: T) -> Result<()> {
        let lock = self.materialize()?;
        let mut decoded = write_lock!(lock);

        if rid == 0 {
            return Err(crate::Error::OutOfRange(format!(
                "Row id 0 is the null reference - {rid}"
            )));
        }

        let slot = decoded.slot_of(rid);
        match decoded.rows.get_mut(slot) {
            Some(stored) => {
                *stored = row;
                Ok(())
            }
            None => Err(crate::Error::OutOfRange(format!(
                "Row id beyond table row count - {rid}"
            ))),
        }
    }

    /// Creates a sequential iterator over all rows.
    ///
    /// Iterating all rows is a structural touch and materializes the table;
    /// if materialization fails (malformed trailing rows), iteration falls
    /// back to per-row decoding and terminates at the first bad row.
    #[must_use]
    pub fn iter(&self) -> TableIterator<'_, 'a, T> {
        let _ = self.materialize();
        TableIterator {
            table: self,
            next_rid: 1,
        }
    }

    /// Creates a parallel iterator over all rows.
    #[must_use]
    pub fn par_iter(&self) -> TableParIterator<'_, 'a, T> {
        TableParIterator {
            table: self,
            range: 0..self.row_count(),
        }
    }

    /// Decode every row into the in-memory sequence, once.
    ///
    /// Losers of the materialization race drop their decoded copy and reuse
    /// the published one; the backing identity never changes afterwards.
    fn materialize(&self) -> Result<&RwLock<TableRows<T>>> {
        if let Some(lock) = self.decoded.get() {
            return Ok(lock);
        }

        let mut rows = Vec::with_capacity(self.raw_row_count as usize);
        let mut offset = 0_usize;
        for rid in 1..=self.raw_row_count {
            rows.push(T::row_read(self.data, &mut offset, rid, &self.sizes)?);
        }

        let _ = self.decoded.set(RwLock::new(TableRows {
            rows,
            rid_slots: None,
        }));

        match self.decoded.get() {
            Some(lock) => Ok(lock),
            // OnceLock::get cannot fail after a set, but avoid unwrap
            None => Err(crate::Error::Error(
                "Lazy table state unavailable after materialization".to_string(),
            )),
        }
    }

    /// Appends flushed buffer rows in final physical order.
    ///
    /// `new_rows` carries (rid issued at add time, row). Where the physical
    /// slot no longer equals `rid - 1` (sorted flush), a rid→slot mapping is
    /// recorded so previously issued tokens stay valid.
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn append_rows(&self, new_rows: Vec<(u32, T)>) -> Result<()> {
        let lock = self.materialize()?;
        let mut decoded = write_lock!(lock);

        let base = decoded.rows.len() as u32;
        let mut remap = decoded.rid_slots.take().unwrap_or_default();

        for (position, (rid, row)) in new_rows.into_iter().enumerate() {
            let slot = base + position as u32;
            if rid != slot + 1 {
                remap.insert(rid, slot);
            }
            decoded.rows.push(row);
        }

        decoded.rid_slots = if remap.is_empty() { None } else { Some(remap) };
        Ok(())
    }
}

impl<'a, T: RowReadable + RowWritable> MetadataTable<'a, T> {
    /// Serializes every row back into `data` in physical order, producing the
    /// packed byte form of this table under its layout.
    ///
    /// # Errors
    /// Returns an error if `data` is too small or a row fails to encode.
    pub fn write_to(&self, data: &mut [u8], offset: &mut usize) -> Result<()> {
        if let Some(lock) = self.decoded.get() {
            let decoded = read_lock!(lock);
            for (slot, row) in decoded.rows.iter().enumerate() {
                row.row_write(data, offset, slot as u32 + 1, &self.sizes)?;
            }
            return Ok(());
        }

        for rid in 1..=self.raw_row_count {
            let mut read_offset = (rid as usize - 1) * self.row_size as usize;
            let row = T::row_read(self.data, &mut read_offset, rid, &self.sizes)?;
            row.row_write(data, offset, rid, &self.sizes)?;
        }
        Ok(())
    }
}

impl<'b, 'a, T: RowReadable> IntoIterator for &'b MetadataTable<'a, T> {
    type Item = T;
    type IntoIter = TableIterator<'b, 'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Sequential iterator over table rows, yielding each row by 1-based id.
pub struct TableIterator<'b, 'a, T> {
    table: &'b MetadataTable<'a, T>,
    next_rid: u32,
}

impl<'b, 'a, T: RowReadable> Iterator for TableIterator<'b, 'a, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.table.get(self.next_rid)?;
        self.next_rid += 1;
        Some(row)
    }
}

/// Parallel iterator over table rows, bridged through rayon's plumbing.
pub struct TableParIterator<'b, 'a, T> {
    table: &'b MetadataTable<'a, T>,
    range: std::ops::Range<u32>,
}

impl<'b, 'a, T: RowReadable + Sync + 'b> TableParIterator<'b, 'a, T> {
    /// Parallel `try_for_each`: runs `op` over every row concurrently and
    /// reports the first error encountered.
    ///
    /// # Errors
    /// Returns the first error produced by `op`.
    ///
    /// # Panics
    /// Panics if the internal error mutex is poisoned.
    pub fn try_for_each<F>(self, op: F) -> Result<()>
    where
        F: Fn(T) -> Result<()> + Send + Sync,
    {
        let error = Arc::new(Mutex::new(None));

        self.for_each(|item| {
            if error.lock().unwrap().is_some() {
                return;
            }

            if let Err(e) = op(item) {
                let mut guard = error.lock().unwrap();
                if guard.is_none() {
                    *guard = Some(e);
                }
            }
        });

        match Arc::into_inner(error).unwrap().into_inner().unwrap() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<'b, 'a, T: RowReadable + Sync> ParallelIterator for TableParIterator<'b, 'a, T> {
    type Item = T;

    fn drive_unindexed<C>(self, consumer: C) -> C::Result
    where
        C: plumbing::UnindexedConsumer<Self::Item>,
    {
        plumbing::bridge(self, consumer)
    }
}

impl<'b, 'a, T: RowReadable + Sync> IndexedParallelIterator for TableParIterator<'b, 'a, T> {
    fn len(&self) -> usize {
        self.range.len()
    }

    fn drive<C>(self, consumer: C) -> C::Result
    where
        C: plumbing::Consumer<Self::Item>,
    {
        plumbing::bridge(self, consumer)
    }

    fn with_producer<CB>(self, callback: CB) -> CB::Output
    where
        CB: plumbing::ProducerCallback<Self::Item>,
    {
        callback.callback(TableProducer {
            table: self.table,
            range: self.range,
        })
    }
}

/// Work-splitting producer backing [`TableParIterator`].
struct TableProducer<'b, 'a, T> {
    table: &'b MetadataTable<'a, T>,
    range: std::ops::Range<u32>,
}

impl<'b, 'a, T: RowReadable + Sync> plumbing::Producer for TableProducer<'b, 'a, T> {
    type Item = T;
    type IntoIter = TableProducerIterator<'b, 'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        TableProducerIterator {
            table: self.table,
            range: self.range,
        }
    }

    fn split_at(self, index: usize) -> (Self, Self) {
        // Row positions fit in u32 by construction
        #[allow(clippy::cast_possible_truncation)]
        let mid = self.range.start + index as u32;
        let left = TableProducer {
            table: self.table,
            range: self.range.start..mid,
        };
        let right = TableProducer {
            table: self.table,
            range: mid..self.range.end,
        };
        (left, right)
    }
}

/// Per-thread chunk iterator for the parallel producer.
struct TableProducerIterator<'b, 'a, T> {
    table: &'b MetadataTable<'a, T>,
    range: std::ops::Range<u32>,
}

impl<'b, 'a, T: RowReadable + Sync> Iterator for TableProducerIterator<'b, 'a, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.range.start >= self.range.end {
            return None;
        }

        let row_index = self.range.start;
        self.range.start += 1;

        // +1 because row ids start at 1
        self.table.get(row_index + 1)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.range.len();
        (len, Some(len))
    }
}

impl<'b, 'a, T: RowReadable + Sync> ExactSizeIterator for TableProducerIterator<'b, 'a, T> {}

impl<'b, 'a, T: RowReadable + Sync> DoubleEndedIterator for TableProducerIterator<'b, 'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.range.start >= self.range.end {
            return None;
        }

        self.range.end -= 1;
        self.table.get(self.range.end + 1)
    }
}
