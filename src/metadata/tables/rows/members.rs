//! Raw rows for member-attachment tables: external member references,
//! constants, custom attributes, marshalling, security, events and properties.

use super::{col_read, col_size, col_type, col_write, table_row};

table_row! {
    /// The `MemberRef` table (0x0A) references fields and methods of external
    /// types (and varargs call sites on local ones).
    MemberRefRaw: MemberRef {
        /// The owning type or module, `MemberRefParent` coded index
        class: coded(MemberRefParent),
        /// Member name, `#Strings` offset
        name: str,
        /// Member signature, `#Blob` offset
        signature: blob,
    }
}

table_row! {
    /// The `Constant` table (0x0B) stores compile-time constant values for
    /// fields, parameters and properties.
    ConstantRaw: Constant {
        /// Element type of the value (`ELEMENT_TYPE_*`)
        base_type: u8,
        /// Always zero
        padding: u8,
        /// The constant's owner, `HasConstant` coded index
        parent: coded(HasConstant),
        /// The encoded value, `#Blob` offset
        value: blob,
    }
}

table_row! {
    /// The `CustomAttribute` table (0x0C) attaches attribute instances to
    /// nearly every other metadata element.
    CustomAttributeRaw: CustomAttribute {
        /// The decorated element, `HasCustomAttribute` coded index
        parent: coded(HasCustomAttribute),
        /// The attribute constructor, `CustomAttributeType` coded index
        constructor: coded(CustomAttributeType),
        /// Serialized constructor arguments, `#Blob` offset
        value: blob,
    }
}

table_row! {
    /// The `FieldMarshal` table (0x0D) describes native marshalling for
    /// fields and parameters crossing the interop boundary.
    FieldMarshalRaw: FieldMarshal {
        /// The marshalled element, `HasFieldMarshal` coded index
        parent: coded(HasFieldMarshal),
        /// Native type descriptor, `#Blob` offset
        native_type: blob,
    }
}

table_row! {
    /// The `DeclSecurity` table (0x0E) carries declarative security
    /// permission sets.
    DeclSecurityRaw: DeclSecurity {
        /// Security action code
        action: u16,
        /// The protected element, `HasDeclSecurity` coded index
        parent: coded(HasDeclSecurity),
        /// Serialized permission set, `#Blob` offset
        permission_set: blob,
    }
}

table_row! {
    /// The `EventMap` table (0x12) maps types to their event ranges.
    EventMapRaw: EventMap {
        /// The owning type, index into `TypeDef`
        parent: idx(TypeDef),
        /// First owned row in `Event`
        event_list: idx(Event),
    }
}

table_row! {
    /// The `EventPtr` table (0x13) indirects `Event` rows in uncompressed images.
    EventPtrRaw: EventPtr {
        /// Index into `Event`
        event: idx(Event),
    }
}

table_row! {
    /// The `Event` table (0x14) defines events.
    EventRaw: Event {
        /// `EventAttributes` bitmask
        flags: u16,
        /// Event name, `#Strings` offset
        name: str,
        /// The delegate type, `TypeDefOrRef` coded index
        event_type: coded(TypeDefOrRef),
    }
}

table_row! {
    /// The `PropertyMap` table (0x15) maps types to their property ranges.
    PropertyMapRaw: PropertyMap {
        /// The owning type, index into `TypeDef`
        parent: idx(TypeDef),
        /// First owned row in `Property`
        property_list: idx(Property),
    }
}

table_row! {
    /// The `PropertyPtr` table (0x16) indirects `Property` rows in
    /// uncompressed images.
    PropertyPtrRaw: PropertyPtr {
        /// Index into `Property`
        property: idx(Property),
    }
}

table_row! {
    /// The `Property` table (0x17) defines properties.
    PropertyRaw: Property {
        /// `PropertyAttributes` bitmask
        flags: u16,
        /// Property name, `#Strings` offset
        name: str,
        /// Property signature, `#Blob` offset
        signature: blob,
    }
}

table_row! {
    /// The `FieldRVA` table (0x1D) gives fields with mapped initial data
    /// their RVA.
    FieldRvaRaw: FieldRVA {
        /// RVA of the initial data
        rva: u32,
        /// The mapped field, index into `Field`
        field: idx(Field),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::tables::{MetadataTable, RowWritable, TableId, TableInfo, TableInfoRef};
    use std::sync::Arc;

    #[test]
    fn customattribute_crafted_short() {
        let data = vec![
            0x06, 0x00, // parent ((0 << 5) | 6 = null, tag ignored)
            0x0B, 0x00, // constructor ((1 << 3) | 3 = MemberRef row 1)
            0x42, 0x00, // value
        ];

        let sizes = Arc::new(TableInfo::new_test(
            &[
                (TableId::CustomAttribute, 1),
                (TableId::MethodDef, 10),
                (TableId::MemberRef, 10),
            ],
            false,
            false,
            false,
        ));
        let table = MetadataTable::<CustomAttributeRaw>::new(&data, 1, sizes).unwrap();

        let row = table.get(1).unwrap();
        assert_eq!(row.token.value(), 0x0C00_0001);
        // Row 0 is the null reference regardless of the tag bits
        assert!(row.parent.is_null());
        assert_eq!(row.constructor.tag, TableId::MemberRef);
        assert_eq!(row.constructor.row, 1);
        assert_eq!(row.value, 0x42);
    }

    #[test]
    fn customattribute_crafted_long() {
        let data = vec![
            0x26, 0x00, 0x00, 0x00, // parent ((1 << 5) | 6 = MemberRef row 1)
            0x0A, 0x00, 0x00, 0x00, // constructor ((1 << 3) | 2 = MethodDef row 1)
            0x42, 0x42, 0x00, 0x00, // value (large blob)
        ];

        let sizes = Arc::new(TableInfo::new_test(
            &[
                (TableId::CustomAttribute, 1),
                (TableId::MethodDef, u32::from(u16::MAX) + 2),
                (TableId::MemberRef, 10),
            ],
            true,
            true,
            true,
        ));
        let table = MetadataTable::<CustomAttributeRaw>::new(&data, 1, sizes).unwrap();

        let row = table.get(1).unwrap();
        assert_eq!(row.parent.tag, TableId::MemberRef);
        assert_eq!(row.parent.row, 1);
        assert_eq!(row.constructor.tag, TableId::MethodDef);
        assert_eq!(row.constructor.row, 1);
        assert_eq!(row.value, 0x4242);
    }

    #[test]
    fn constant_roundtrip() {
        let data = vec![
            0x08, // base_type (ELEMENT_TYPE_I4)
            0x00, // padding
            0x05, 0x00, // parent ((1 << 2) | 1 = Param row 1)
            0x07, 0x00, // value
        ];

        let sizes: TableInfoRef = Arc::new(TableInfo::new_test(
            &[
                (TableId::Constant, 1),
                (TableId::Field, 10),
                (TableId::Param, 10),
                (TableId::Property, 10),
            ],
            false,
            false,
            false,
        ));
        let table = MetadataTable::<ConstantRaw>::new(&data, 1, sizes.clone()).unwrap();

        let row = table.get(1).unwrap();
        assert_eq!(row.base_type, 0x08);
        assert_eq!(row.parent.tag, TableId::Param);
        assert_eq!(row.parent.row, 1);
        assert_eq!(row.value, 7);

        let mut rewritten = vec![0u8; data.len()];
        let mut offset = 0;
        row.row_write(&mut rewritten, &mut offset, 1, &sizes).unwrap();
        assert_eq!(rewritten, data);
    }

    #[test]
    fn eventmap_crafted_short() {
        let data = vec![
            0x02, 0x00, // parent
            0x01, 0x00, // event_list
        ];

        let sizes = Arc::new(TableInfo::new_test(
            &[
                (TableId::EventMap, 1),
                (TableId::TypeDef, 10),
                (TableId::Event, 10),
            ],
            false,
            false,
            false,
        ));
        let table = MetadataTable::<EventMapRaw>::new(&data, 1, sizes).unwrap();

        let row = table.get(1).unwrap();
        assert_eq!(row.parent, 2);
        assert_eq!(row.event_list, 1);
    }
}
