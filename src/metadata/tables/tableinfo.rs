use std::sync::Arc;

use strum::{EnumCount, IntoEnumIterator};

use crate::{
    file::io::{read_le, read_le_at},
    metadata::tables::{CodedIndexType, TableId},
    Error::OutOfBounds,
    Result,
};

/// Per-table row count and the index width derived from it.
#[derive(Clone, Copy, Default, PartialEq, Debug)]
pub struct TableRowInfo {
    /// The count of rows in this table
    pub rows: u32,
    /// Number of bits required to represent any valid row index
    pub bits: u8,
    /// If the count needs more than 16 bits, indexes of other tables into this table are 4 bytes instead of 2
    pub is_large: bool,
}

impl TableRowInfo {
    /// Creates a new `TableRowInfo` for a table with `rows` rows, computing the
    /// number of bits any index into it requires.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(rows: u32) -> Self {
        let bits = if rows == 0 {
            1
        } else {
            // 32 - leading zeros is always <= 32, fits in u8
            (32 - rows.leading_zeros()) as u8
        };

        Self {
            rows,
            bits,
            is_large: rows > u32::from(u16::MAX),
        }
    }
}

/// The resolved layout context for one metadata image.
///
/// Holds the row count of every table and the widths derived from them: simple
/// table indexes, coded indexes, and heap offsets. Built exactly once, from the
/// `#~` header, before any row is decoded — coded-index widths in one table
/// depend on row counts of others, so there is no per-table shortcut. Immutable
/// after construction and shared as [`TableInfoRef`].
#[derive(Clone, Default)]
pub struct TableInfo {
    rows: Vec<TableRowInfo>,
    coded_indexes: Vec<u8>,
    is_large_index_str: bool,
    is_large_index_guid: bool,
    is_large_index_blob: bool,
}

/// Cheap-copy reference to a `TableInfo` structure
pub type TableInfoRef = Arc<TableInfo>;

impl TableInfo {
    /// Resolve the layout from a `#~` stream header.
    ///
    /// `data` is the tables stream starting at its reserved u32; the row-count
    /// vector begins at offset 24, one u32 per bit set in `valid_bitvec` in
    /// ascending bit order. Bits that do not correspond to a known table still
    /// consume their row count (so later counts stay aligned) but the table is
    /// treated as absent rather than failing the parse.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the declared row counts run
    /// past the end of the buffer.
    pub fn new(data: &[u8], valid_bitvec: u64) -> Result<Self> {
        let mut rows = vec![TableRowInfo::default(); TableId::GenericParamConstraint as usize + 1];
        let mut next_row_offset = 24;

        for bit in 0..64u8 {
            if (valid_bitvec & (1u64 << bit)) == 0 {
                continue;
            }

            if data.len() < next_row_offset {
                return Err(OutOfBounds);
            }

            let row_count = read_le_at::<u32>(data, &mut next_row_offset)?;

            // Reserved or unknown table bit: count consumed, table absent
            let Some(table_id) = TableId::from_id(bit) else {
                continue;
            };

            if row_count == 0 {
                continue;
            }

            rows[table_id as usize] = TableRowInfo::new(row_count);
        }

        let heap_size_flags = read_le::<u8>(&data[6..])?;
        let mut table_info = TableInfo {
            rows,
            coded_indexes: vec![0; CodedIndexType::COUNT],
            is_large_index_str: heap_size_flags & 1 == 1,
            is_large_index_guid: heap_size_flags & 2 == 2,
            is_large_index_blob: heap_size_flags & 4 == 4,
        };

        table_info.calculate_coded_index_bits();

        Ok(table_info)
    }

    #[cfg(test)]
    /// Special constructor for unit-tests
    ///
    /// ## Arguments
    /// * 'valid_tables'    - A slice of tuples, which provides (table_id, row_count) of the valid tables
    /// * 'large_str'       - Specify if the #Strings heap indexes are 4 or 2 bytes
    /// * 'large_blob'      - Specify if the #Blob heap indexes are 4 or 2 bytes
    /// * 'large_guid'      - Specify if the #GUID heap indexes are 4 or 2 bytes
    pub fn new_test(
        valid_tables: &[(TableId, u32)],
        large_str: bool,
        large_blob: bool,
        large_guid: bool,
    ) -> Self {
        let mut table_info = TableInfo {
            rows: vec![TableRowInfo::default(); TableId::GenericParamConstraint as usize + 1],
            coded_indexes: vec![0; CodedIndexType::COUNT],
            is_large_index_str: large_str,
            is_large_index_guid: large_guid,
            is_large_index_blob: large_blob,
        };

        for valid_table in valid_tables {
            table_info.rows[valid_table.0 as usize] = TableRowInfo::new(valid_table.1);
        }

        table_info.calculate_coded_index_bits();
        table_info
    }

    /// Decodes a coded index value into its component table and row index.
    ///
    /// A value whose row component is 0 is the null reference and is handled
    /// by [`crate::metadata::tables::CodedIndex::read`]; this method only
    /// splits and validates the raw encoding.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the tag does not select a
    /// usable candidate table for this coded index type.
    pub fn decode_coded_index(
        &self,
        value: u32,
        coded_index_type: CodedIndexType,
    ) -> Result<(TableId, u32)> {
        let tag_bits = coded_index_type.tag_bits();
        let tag_mask = (1u32 << tag_bits) - 1;

        let tag = value & tag_mask;
        let index = value >> tag_bits;

        let table = coded_index_type.table_for_tag(tag)?;
        Ok((table, index))
    }

    /// Encodes a (table, row) pair into the raw coded index value.
    ///
    /// Symmetric with [`TableInfo::decode_coded_index`]: the tag assignment
    /// follows the format's fixed candidate ordering, so
    /// `encode(decode(v)) == v` for every decodable value. A row of 0 encodes
    /// to the canonical null bit pattern 0 regardless of table.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if `table` is not a candidate of
    /// this coded index type.
    pub fn encode_coded_index(
        &self,
        table: TableId,
        row: u32,
        coded_index_type: CodedIndexType,
    ) -> Result<u32> {
        if row == 0 {
            return Ok(0);
        }

        let tag = coded_index_type.tag_for(table)?;
        Ok((row << coded_index_type.tag_bits()) | tag)
    }

    /// Returns true if the requested table needs more than 16 index bits and
    /// hence 4-byte index columns instead of 2.
    #[must_use]
    pub fn is_large(&self, id: TableId) -> bool {
        self.rows[id as usize].is_large
    }

    /// Indicates the size of indexes referring into the '#Strings' heap. True means 4 bytes, False is 2 bytes
    #[must_use]
    pub fn is_large_str(&self) -> bool {
        self.is_large_index_str
    }

    /// Indicates the size of indexes referring into the '#GUID' heap. True means 4 bytes, False is 2 bytes
    #[must_use]
    pub fn is_large_guid(&self) -> bool {
        self.is_large_index_guid
    }

    /// Indicates the size of indexes referring into the '#Blob' heap. True means 4 bytes, False is 2 bytes
    #[must_use]
    pub fn is_large_blob(&self) -> bool {
        self.is_large_index_blob
    }

    /// Returns the width of a '#Strings' heap offset in bytes
    #[must_use]
    pub fn str_bytes(&self) -> u8 {
        if self.is_large_index_str {
            4
        } else {
            2
        }
    }

    /// Returns the width of a '#GUID' heap offset in bytes
    #[must_use]
    pub fn guid_bytes(&self) -> u8 {
        if self.is_large_index_guid {
            4
        } else {
            2
        }
    }

    /// Returns the width of a '#Blob' heap offset in bytes
    #[must_use]
    pub fn blob_bytes(&self) -> u8 {
        if self.is_large_index_blob {
            4
        } else {
            2
        }
    }

    /// Returns the row metadata for a specific table.
    ///
    /// Absent tables have a layout with row count 0, never a missing entry.
    #[must_use]
    pub fn get(&self, table: TableId) -> &TableRowInfo {
        &self.rows[table as usize]
    }

    /// Returns the number of bits required to represent an index into a specific table.
    #[must_use]
    pub fn table_index_bits(&self, table_id: TableId) -> u8 {
        self.rows[table_id as usize].bits
    }

    /// Returns the number of bytes required to represent an index into a specific table.
    #[must_use]
    pub fn table_index_bytes(&self, table_id: TableId) -> u8 {
        if self.rows[table_id as usize].bits > 16 {
            4
        } else {
            2
        }
    }

    /// Returns the cached bit size for a specific coded index type.
    #[must_use]
    pub fn coded_index_bits(&self, coded_index_type: CodedIndexType) -> u8 {
        self.coded_indexes[coded_index_type as usize]
    }

    /// Returns the cached byte size for a specific coded index reference.
    #[must_use]
    pub fn coded_index_bytes(&self, coded_index_type: CodedIndexType) -> u8 {
        if self.coded_indexes[coded_index_type as usize] > 16 {
            4
        } else {
            2
        }
    }

    /// Calculates the number of bits required for a specific coded index type:
    /// the widest candidate's index bits plus the tag bits.
    fn calculate_coded_index_size(&self, coded_index_type: CodedIndexType) -> u8 {
        let max_bits = coded_index_type
            .tables()
            .iter()
            .map(|table| self.table_index_bits(*table))
            .max()
            .unwrap_or(1);

        max_bits + coded_index_type.tag_bits()
    }

    /// Calculates and caches the bit sizes required for all coded index types.
    fn calculate_coded_index_bits(&mut self) {
        for coded_index in CodedIndexType::iter() {
            let size = self.calculate_coded_index_size(coded_index);
            self.coded_indexes[coded_index as usize] = size;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_info_bits() {
        assert_eq!(TableRowInfo::new(0).bits, 1);
        assert_eq!(TableRowInfo::new(1).bits, 1);
        assert_eq!(TableRowInfo::new(255).bits, 8);
        assert_eq!(TableRowInfo::new(0xFFFF).bits, 16);
        assert!(!TableRowInfo::new(0xFFFF).is_large);
        assert_eq!(TableRowInfo::new(0x1_0000).bits, 17);
        assert!(TableRowInfo::new(0x1_0000).is_large);
    }

    #[test]
    fn coded_index_width_thresholds() {
        // 70000 rows in one of two candidates pushes the reference to 4 bytes
        let info = TableInfo::new_test(&[(TableId::MethodDef, 70_000)], false, false, false);
        assert_eq!(info.coded_index_bytes(CodedIndexType::MethodDefOrRef), 4);
        assert_eq!(info.table_index_bytes(TableId::MethodDef), 4);

        // 100 rows stays at 2 bytes
        let info = TableInfo::new_test(&[(TableId::MethodDef, 100)], false, false, false);
        assert_eq!(info.coded_index_bytes(CodedIndexType::MethodDefOrRef), 2);
        assert_eq!(info.table_index_bytes(TableId::MethodDef), 2);

        // The tag bits alone can tip the width: 0xFFFF rows needs 16 bits,
        // plus one tag bit makes the coded reference large while the plain
        // table index stays small.
        let info = TableInfo::new_test(&[(TableId::MethodDef, 0xFFFF)], false, false, false);
        assert_eq!(info.table_index_bytes(TableId::MethodDef), 2);
        assert_eq!(info.coded_index_bytes(CodedIndexType::MethodDefOrRef), 4);
    }

    #[test]
    fn heap_widths() {
        let info = TableInfo::new_test(&[], true, false, true);
        assert_eq!(info.str_bytes(), 4);
        assert_eq!(info.blob_bytes(), 2);
        assert_eq!(info.guid_bytes(), 4);
    }

    #[test]
    fn new_skips_reserved_bits() {
        // Header: 6 bytes reserved/version, heap flags, reserved byte,
        // valid mask with Module (bit 0) and a reserved bit (0x1F) set,
        // sorted mask, then two row counts.
        let mut data = vec![0u8; 24];
        let valid: u64 = 1 | (1 << 0x1F);
        data[8..16].copy_from_slice(&valid.to_le_bytes());
        data.extend_from_slice(&2u32.to_le_bytes()); // Module rows
        data.extend_from_slice(&99u32.to_le_bytes()); // reserved table rows, skipped

        let info = TableInfo::new(&data, valid).unwrap();
        assert_eq!(info.get(TableId::Module).rows, 2);
        // Every known table still has a layout
        assert_eq!(info.get(TableId::TypeDef).rows, 0);
    }

    #[test]
    fn coded_index_encode_decode_symmetry() {
        let info = TableInfo::new_test(
            &[(TableId::TypeDef, 50), (TableId::TypeRef, 20)],
            false,
            false,
            false,
        );

        // TypeDefOrRef: TypeDef tag 0, TypeRef tag 1, TypeSpec tag 2
        let encoded = info
            .encode_coded_index(TableId::TypeRef, 7, CodedIndexType::TypeDefOrRef)
            .unwrap();
        assert_eq!(encoded, (7 << 2) | 1);

        let (table, row) = info
            .decode_coded_index(encoded, CodedIndexType::TypeDefOrRef)
            .unwrap();
        assert_eq!(table, TableId::TypeRef);
        assert_eq!(row, 7);

        // Null encodes to bit pattern 0 for any table
        assert_eq!(
            info.encode_coded_index(TableId::TypeDef, 0, CodedIndexType::TypeDefOrRef)
                .unwrap(),
            0
        );

        // A non-candidate table is rejected
        assert!(info
            .encode_coded_index(TableId::Assembly, 1, CodedIndexType::TypeDefOrRef)
            .is_err());
    }
}
