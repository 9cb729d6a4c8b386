//! The `#~` stream: header fields plus the packed table regions.

use std::sync::Arc;

use strum::IntoEnumIterator;

use crate::{
    file::io::read_le,
    metadata::tables::{
        MetadataTable, RowReadable, TableData, TableId, TableInfo, TableInfoRef,
    },
    Error::OutOfBounds,
    Result,
};

/// Parsed view over the `#~` stream.
///
/// The stream opens with a fixed 24-byte header (schema version, heap-size
/// flags, the `valid` and `sorted` bitmasks), continues with one row count
/// per set `valid` bit, and then packs the present tables back to back. All
/// column widths depend on the complete set of row counts and the heap-size
/// flags, so the layout is resolved once up front and shared by every table.
///
/// # Examples
///
/// ```rust,no_run
/// use metascope::metadata::{streams::TablesHeader, tables::{TableId, TypeDefRaw}};
///
/// # fn example(tables: &TablesHeader) -> metascope::Result<()> {
/// if let Some(typedefs) = tables.table::<TypeDefRaw>(TableId::TypeDef) {
///     for row in typedefs.iter().take(5) {
///         println!("type: flags={:#x} name={}", row.flags, row.type_name);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct TablesHeader<'a> {
    /// Major version of the table schema, 2 for all current images
    pub major_version: u8,
    /// Minor version of the table schema, 0 for all current images
    pub minor_version: u8,
    /// Bitmask of present tables
    pub valid: u64,
    /// Bitmask of tables whose rows the producer sorted by their key column
    pub sorted: u64,
    /// The resolved layout: row counts and index widths for every table
    pub info: TableInfoRef,
    /// One parsed region per table kind, `None` where absent
    tables: Vec<Option<TableData<'a>>>,
}

impl<'a> TablesHeader<'a> {
    /// Parses the stream: header, row counts, then every present table region.
    ///
    /// Reserved `valid` bits (positions without a defined table kind) consume
    /// their row count slot but produce no region, keeping all later counts
    /// and offsets aligned.
    ///
    /// # Errors
    /// Returns an error if the stream is shorter than its header, declares no
    /// tables, or a table region runs past the end of the stream.
    pub fn from(data: &'a [u8]) -> Result<TablesHeader<'a>> {
        if data.len() < 24 {
            return Err(OutOfBounds);
        }

        let valid_bitvec = read_le::<u64>(&data[8..])?;
        if valid_bitvec == 0 {
            return Err(malformed_error!("No valid rows in any of the tables"));
        }

        let info: TableInfoRef = Arc::new(TableInfo::new(data, valid_bitvec)?);

        let mut tables: Vec<Option<TableData<'a>>> = Vec::new();
        tables.resize_with(TableId::GenericParamConstraint as usize + 1, || None);

        let mut current_offset = (24 + valid_bitvec.count_ones() * 4) as usize;
        for table_id in TableId::iter() {
            let rows = info.get(table_id).rows;
            if rows == 0 {
                continue;
            }
            if current_offset > data.len() {
                return Err(OutOfBounds);
            }

            let (table, size) =
                TableData::read(&data[current_offset..], table_id, rows, info.clone())?;
            tables[table_id as usize] = Some(table);
            current_offset += size;
        }

        Ok(TablesHeader {
            major_version: read_le::<u8>(&data[4..])?,
            minor_version: read_le::<u8>(&data[5..])?,
            valid: valid_bitvec,
            sorted: read_le::<u64>(&data[16..])?,
            info,
            tables,
        })
    }

    /// Returns the typed view of a present table.
    ///
    /// `T` must be the row type belonging to `table_id` (`TypeDefRaw` for
    /// `TableId::TypeDef` and so on); each region was parsed under its own id
    /// so the downcast only reinterprets between identical monomorphizations
    /// when that pairing holds. Returns `None` for absent tables.
    #[must_use]
    pub fn table<T: RowReadable>(&self, table_id: TableId) -> Option<&MetadataTable<'a, T>> {
        match self.tables.get(table_id as usize) {
            Some(Some(data)) => Some(data.as_table::<T>()),
            _ => None,
        }
    }

    /// Returns true if `table_id` is present.
    #[must_use]
    pub fn has_table(&self, table_id: TableId) -> bool {
        (self.valid & (1u64 << (table_id as u8))) != 0
    }

    /// Returns true if the producer declared `table_id` sorted.
    #[must_use]
    pub fn is_sorted(&self, table_id: TableId) -> bool {
        (self.sorted & (1u64 << (table_id as u8))) != 0
    }

    /// The number of present tables.
    #[must_use]
    pub fn table_count(&self) -> u32 {
        self.valid.count_ones()
    }

    /// The row count of `table_id`, 0 when absent.
    #[must_use]
    pub fn table_row_count(&self, table_id: TableId) -> u32 {
        self.info.get(table_id).rows
    }

    /// Decodes one row of `table_id` as a tagged value, `None` when the
    /// table is absent or `rid` is out of range.
    #[must_use]
    pub fn row(&self, table_id: TableId, rid: u32) -> Option<crate::metadata::tables::RowData> {
        match self.tables.get(table_id as usize) {
            Some(Some(data)) => data.row(rid),
            _ => None,
        }
    }

    /// Iterates the ids of all present tables.
    pub fn present_tables(&self) -> impl Iterator<Item = TableId> + '_ {
        TableId::iter().filter(|&table_id| self.has_table(table_id))
    }
}
