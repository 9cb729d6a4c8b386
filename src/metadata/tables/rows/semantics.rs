//! Raw rows for behavioral-association tables: method semantics and
//! overrides, interop mappings, generics.

use super::{col_read, col_size, col_type, col_write, table_row};

table_row! {
    /// The `MethodSemantics` table (0x18) binds getter/setter/adder/remover
    /// methods to their property or event.
    MethodSemanticsRaw: MethodSemantics {
        /// `MethodSemanticsAttributes` bitmask
        semantics: u16,
        /// The bound method, index into `MethodDef`
        method: idx(MethodDef),
        /// The property or event, `HasSemantics` coded index
        association: coded(HasSemantics),
    }
}

table_row! {
    /// The `MethodImpl` table (0x19) records explicit method overrides.
    MethodImplRaw: MethodImpl {
        /// The type providing the override, index into `TypeDef`
        class: idx(TypeDef),
        /// The overriding body, `MethodDefOrRef` coded index
        method_body: coded(MethodDefOrRef),
        /// The overridden declaration, `MethodDefOrRef` coded index
        method_declaration: coded(MethodDefOrRef),
    }
}

table_row! {
    /// The `ImplMap` table (0x1C) maps members to unmanaged imports (P/Invoke).
    ImplMapRaw: ImplMap {
        /// `PInvokeAttributes` bitmask
        mapping_flags: u16,
        /// The forwarded member, `MemberForwarded` coded index
        member_forwarded: coded(MemberForwarded),
        /// Entry point name, `#Strings` offset
        import_name: str,
        /// The unmanaged module, index into `ModuleRef`
        import_scope: idx(ModuleRef),
    }
}

table_row! {
    /// The `GenericParam` table (0x2A) declares generic parameters of types
    /// and methods.
    GenericParamRaw: GenericParam {
        /// 0-based position in the parameter list
        number: u16,
        /// `GenericParamAttributes` bitmask
        flags: u16,
        /// The declaring type or method, `TypeOrMethodDef` coded index
        owner: coded(TypeOrMethodDef),
        /// Parameter name, `#Strings` offset
        name: str,
    }
}

table_row! {
    /// The `MethodSpec` table (0x2B) instantiates generic methods.
    MethodSpecRaw: MethodSpec {
        /// The generic method, `MethodDefOrRef` coded index
        method: coded(MethodDefOrRef),
        /// The instantiation signature, `#Blob` offset
        instantiation: blob,
    }
}

table_row! {
    /// The `GenericParamConstraint` table (0x2C) constrains generic parameters.
    GenericParamConstraintRaw: GenericParamConstraint {
        /// The constrained parameter, index into `GenericParam`
        owner: idx(GenericParam),
        /// The constraining type, `TypeDefOrRef` coded index
        constraint: coded(TypeDefOrRef),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::tables::{MetadataTable, RowWritable, TableId, TableInfo, TableInfoRef};
    use std::sync::Arc;

    #[test]
    fn genericparam_crafted_short() {
        let data = vec![
            0x00, 0x00, // number
            0x04, 0x00, // flags
            0x05, 0x00, // owner ((2 << 1) | 1 = MethodDef row 2)
            0x33, 0x33, // name
        ];

        let sizes = Arc::new(TableInfo::new_test(
            &[
                (TableId::GenericParam, 1),
                (TableId::TypeDef, 10),
                (TableId::MethodDef, 10),
            ],
            false,
            false,
            false,
        ));
        let table = MetadataTable::<GenericParamRaw>::new(&data, 1, sizes).unwrap();

        let row = table.get(1).unwrap();
        assert_eq!(row.token.value(), 0x2A00_0001);
        assert_eq!(row.number, 0);
        assert_eq!(row.flags, 4);
        assert_eq!(row.owner.tag, TableId::MethodDef);
        assert_eq!(row.owner.row, 2);
        assert_eq!(row.name, 0x3333);
    }

    #[test]
    fn genericparam_crafted_long() {
        let data = vec![
            0x01, 0x00, // number
            0x00, 0x00, // flags
            0x04, 0x00, 0x00, 0x00, // owner ((2 << 1) | 0 = TypeDef row 2)
            0x33, 0x33, 0x33, 0x00, // name (large str)
        ];

        let sizes = Arc::new(TableInfo::new_test(
            &[
                (TableId::GenericParam, 1),
                (TableId::TypeDef, u32::from(u16::MAX) + 2),
                (TableId::MethodDef, 10),
            ],
            true,
            false,
            false,
        ));
        let table = MetadataTable::<GenericParamRaw>::new(&data, 1, sizes).unwrap();

        let row = table.get(1).unwrap();
        assert_eq!(row.number, 1);
        assert_eq!(row.owner.tag, TableId::TypeDef);
        assert_eq!(row.owner.row, 2);
        assert_eq!(row.name, 0x0033_3333);
    }

    #[test]
    fn methodimpl_roundtrip() {
        let data = vec![
            0x03, 0x00, // class
            0x02, 0x00, // method_body ((1 << 1) | 0 = MethodDef row 1)
            0x03, 0x00, // method_declaration ((1 << 1) | 1 = MemberRef row 1)
        ];

        let sizes: TableInfoRef = Arc::new(TableInfo::new_test(
            &[
                (TableId::MethodImpl, 1),
                (TableId::TypeDef, 10),
                (TableId::MethodDef, 10),
                (TableId::MemberRef, 10),
            ],
            false,
            false,
            false,
        ));
        let table = MetadataTable::<MethodImplRaw>::new(&data, 1, sizes.clone()).unwrap();

        let row = table.get(1).unwrap();
        assert_eq!(row.class, 3);
        assert_eq!(row.method_body.tag, TableId::MethodDef);
        assert_eq!(row.method_declaration.tag, TableId::MemberRef);

        let mut rewritten = vec![0u8; data.len()];
        let mut offset = 0;
        row.row_write(&mut rewritten, &mut offset, 1, &sizes).unwrap();
        assert_eq!(rewritten, data);
    }

    #[test]
    fn implmap_crafted_short() {
        let data = vec![
            0x00, 0x01, // mapping_flags
            0x03, 0x00, // member_forwarded ((1 << 1) | 1 = MethodDef row 1)
            0x77, 0x00, // import_name
            0x01, 0x00, // import_scope
        ];

        let sizes = Arc::new(TableInfo::new_test(
            &[
                (TableId::ImplMap, 1),
                (TableId::Field, 10),
                (TableId::MethodDef, 10),
                (TableId::ModuleRef, 10),
            ],
            false,
            false,
            false,
        ));
        let table = MetadataTable::<ImplMapRaw>::new(&data, 1, sizes).unwrap();

        let row = table.get(1).unwrap();
        assert_eq!(row.mapping_flags, 0x0100);
        assert_eq!(row.member_forwarded.tag, TableId::MethodDef);
        assert_eq!(row.member_forwarded.row, 1);
        assert_eq!(row.import_name, 0x77);
        assert_eq!(row.import_scope, 1);
    }
}
