//! Write-side row buffering for rebuilding metadata tables.
//!
//! A [`TableWriter`] accumulates rows created during an edit session and
//! assigns each one its permanent token the moment it is added — other rows
//! may immediately embed that token, so it can never change, even when a
//! sort-mandated table physically reorders rows at flush time. The flush into
//! the destination [`MetadataTable`] records a rid→slot mapping for exactly
//! that case.

use crate::{
    metadata::{
        tables::{MetadataTable, RowReadable, TableId},
        token::Token,
    },
    Result,
};

/// Physical row ordering applied at flush time.
pub enum SortOrder<T> {
    /// Rows are flushed in insertion order; the caller either does not care
    /// or is trusted to pre-sort.
    Unsorted,
    /// Rows are flushed sorted by the extracted key, as the format requires
    /// for tables scoped to a parent (e.g. by owner rid). The sort is stable,
    /// so equal keys keep insertion order.
    ByKey(fn(&T) -> u64),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum WriterState {
    /// Accepting `add` and in-place mutation
    Open,
    /// Rows written to the destination, buffer cleared
    Flushed,
}

/// Accumulates new rows for one table during an edit/build session.
///
/// Rows are never removed: a logically deleted row is overwritten with a
/// default sentinel via [`TableWriter::reset`] so rids issued to other rows
/// stay dense and permanent. The writer moves Open → Flushed once; flushing
/// the then-empty buffer again is a no-op, and there is no way back to Open.
pub struct TableWriter<T> {
    table_id: TableId,
    /// Row count of the destination when this writer was created; new rids
    /// continue from here
    base: u32,
    order: SortOrder<T>,
    rows: Vec<T>,
    state: WriterState,
}

impl<T: RowReadable> TableWriter<T> {
    /// Creates a writer issuing rids after the destination's current rows.
    #[must_use]
    pub fn new(table_id: TableId, base_row_count: u32, order: SortOrder<T>) -> Self {
        TableWriter {
            table_id,
            base: base_row_count,
            order,
            rows: Vec::new(),
            state: WriterState::Open,
        }
    }

    /// Creates a writer targeting `table`, continuing its rid sequence.
    #[must_use]
    pub fn for_table(table: &MetadataTable<'_, T>, table_id: TableId, order: SortOrder<T>) -> Self {
        TableWriter::new(table_id, table.row_count(), order)
    }

    /// Returns the number of rows buffered so far.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn len(&self) -> u32 {
        self.rows.len() as u32
    }

    /// Returns true if no rows are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Maps an issued rid back to its buffer position.
    fn buffer_index(&self, rid: u32) -> Option<usize> {
        if rid <= self.base {
            return None;
        }
        let index = (rid - self.base - 1) as usize;
        (index < self.rows.len()).then_some(index)
    }

    /// Appends a row and returns its permanent token.
    ///
    /// The rid is the next sequential one and never changes, regardless of
    /// where a sorted flush later places the row physically.
    ///
    /// # Errors
    /// Returns [`crate::Error::WriterFlushed`] if the buffer has already been
    /// flushed.
    #[allow(clippy::cast_possible_truncation)]
    pub fn add(&mut self, row: T) -> Result<Token> {
        if self.state == WriterState::Flushed {
            return Err(crate::Error::WriterFlushed);
        }

        self.rows.push(row);
        let rid = self.base + self.rows.len() as u32;
        Ok(Token::from_table(self.table_id, rid))
    }

    /// Borrows an already-added row for inspection.
    #[must_use]
    pub fn row_ref(&self, rid: u32) -> Option<&T> {
        self.buffer_index(rid).map(|index| &self.rows[index])
    }

    /// Replaces an already-added row in place, before flush.
    ///
    /// # Errors
    /// Returns [`crate::Error::WriterFlushed`] after flush, or
    /// [`crate::Error::OutOfRange`] if `rid` was not issued by this writer.
    pub fn set(&mut self, rid: u32, row: T) -> Result<()> {
        if self.state == WriterState::Flushed {
            return Err(crate::Error::WriterFlushed);
        }

        match self.buffer_index(rid) {
            Some(index) => {
                self.rows[index] = row;
                Ok(())
            }
            None => Err(crate::Error::OutOfRange(format!(
                "Row id was not issued by this buffer - {rid}"
            ))),
        }
    }

    /// Logically deletes a row by overwriting it with the default sentinel.
    ///
    /// # Errors
    /// Same conditions as [`TableWriter::set`].
    pub fn reset(&mut self, rid: u32) -> Result<()>
    where
        T: Default,
    {
        self.set(rid, T::default())
    }

    /// Flushes all buffered rows into `table`.
    ///
    /// The destination is materialized and grown by the buffer's count. A
    /// `ByKey` writer emits rows in sorted physical order; the rid→slot
    /// mapping installed in the table keeps every token issued by `add`
    /// pointing at the row it was issued for. Transitions the buffer to
    /// Flushed and clears it; a second flush of the empty buffer is a no-op.
    ///
    /// # Errors
    /// Returns an error if materializing the destination fails.
    #[allow(clippy::cast_possible_truncation)]
    pub fn flush_to(&mut self, table: &MetadataTable<'_, T>) -> Result<()> {
        if self.state == WriterState::Flushed {
            return Ok(());
        }

        let mut pairs: Vec<(u32, T)> = self
            .rows
            .drain(..)
            .enumerate()
            .map(|(index, row)| (self.base + index as u32 + 1, row))
            .collect();

        if let SortOrder::ByKey(key) = &self.order {
            let key = *key;
            pairs.sort_by_key(|(_, row)| key(row));
        }

        table.append_rows(pairs)?;
        self.state = WriterState::Flushed;
        Ok(())
    }
}
