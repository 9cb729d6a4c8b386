//! Raw rows for the core type-system tables: modules, types, fields, methods,
//! parameters, and their layout/nesting relationships.

use super::{col_read, col_size, col_type, col_write, table_row};

table_row! {
    /// The `Module` table (0x00) describes the current module. Exactly one row
    /// in a well-formed image.
    ModuleRaw: Module {
        /// Generation counter, used by edit-and-continue
        generation: u16,
        /// Module name, `#Strings` offset
        name: str,
        /// Module version id, `#GUID` index
        mvid: guid,
        /// Edit-and-continue id, `#GUID` index
        enc_id: guid,
        /// Edit-and-continue base id, `#GUID` index
        enc_base_id: guid,
    }
}

table_row! {
    /// The `TypeRef` table (0x01) references types defined in external scopes.
    TypeRefRaw: TypeRef {
        /// Where the type lives, `ResolutionScope` coded index
        resolution_scope: coded(ResolutionScope),
        /// Type name, `#Strings` offset
        type_name: str,
        /// Type namespace, `#Strings` offset
        type_namespace: str,
    }
}

table_row! {
    /// The `TypeDef` table (0x02) defines the types of this module, with
    /// member ranges delimited by the following row's start indices.
    TypeDefRaw: TypeDef {
        /// `TypeAttributes` bitmask
        flags: u32,
        /// Type name, `#Strings` offset
        type_name: str,
        /// Type namespace, `#Strings` offset
        type_namespace: str,
        /// Base type, `TypeDefOrRef` coded index (null for interfaces and `Object`)
        extends: coded(TypeDefOrRef),
        /// First owned row in `Field`
        field_list: idx(Field),
        /// First owned row in `MethodDef`
        method_list: idx(MethodDef),
    }
}

table_row! {
    /// The `FieldPtr` table (0x03) indirects `Field` rows in uncompressed images.
    FieldPtrRaw: FieldPtr {
        /// Index into `Field`
        field: idx(Field),
    }
}

table_row! {
    /// The `Field` table (0x04) defines the fields of all types.
    FieldRaw: Field {
        /// `FieldAttributes` bitmask
        flags: u16,
        /// Field name, `#Strings` offset
        name: str,
        /// Field signature, `#Blob` offset
        signature: blob,
    }
}

table_row! {
    /// The `MethodPtr` table (0x05) indirects `MethodDef` rows in uncompressed images.
    MethodPtrRaw: MethodPtr {
        /// Index into `MethodDef`
        method: idx(MethodDef),
    }
}

table_row! {
    /// The `MethodDef` table (0x06) defines the methods of all types.
    MethodDefRaw: MethodDef {
        /// RVA of the method body, 0 for abstract/runtime methods
        rva: u32,
        /// `MethodImplAttributes` bitmask
        impl_flags: u16,
        /// `MethodAttributes` bitmask
        flags: u16,
        /// Method name, `#Strings` offset
        name: str,
        /// Method signature, `#Blob` offset
        signature: blob,
        /// First owned row in `Param`
        param_list: idx(Param),
    }
}

table_row! {
    /// The `ParamPtr` table (0x07) indirects `Param` rows in uncompressed images.
    ParamPtrRaw: ParamPtr {
        /// Index into `Param`
        param: idx(Param),
    }
}

table_row! {
    /// The `Param` table (0x08) describes method parameters.
    ParamRaw: Param {
        /// `ParamAttributes` bitmask
        flags: u16,
        /// 1-based parameter position; 0 is the return value
        sequence: u16,
        /// Parameter name, `#Strings` offset
        name: str,
    }
}

table_row! {
    /// The `InterfaceImpl` table (0x09) records which interfaces a type implements.
    InterfaceImplRaw: InterfaceImpl {
        /// The implementing type, index into `TypeDef`
        class: idx(TypeDef),
        /// The implemented interface, `TypeDefOrRef` coded index
        interface: coded(TypeDefOrRef),
    }
}

table_row! {
    /// The `ClassLayout` table (0x0F) carries explicit packing and size for types.
    ClassLayoutRaw: ClassLayout {
        /// Packing alignment in bytes
        packing_size: u16,
        /// Total size of the type in bytes
        class_size: u32,
        /// The laid-out type, index into `TypeDef`
        parent: idx(TypeDef),
    }
}

table_row! {
    /// The `FieldLayout` table (0x10) assigns explicit byte offsets to fields.
    FieldLayoutRaw: FieldLayout {
        /// Byte offset of the field within its type
        field_offset: u32,
        /// The positioned field, index into `Field`
        field: idx(Field),
    }
}

table_row! {
    /// The `StandAloneSig` table (0x11) holds signatures not owned by any
    /// member: local variable signatures and function pointer shapes.
    StandAloneSigRaw: StandAloneSig {
        /// The signature, `#Blob` offset
        signature: blob,
    }
}

table_row! {
    /// The `ModuleRef` table (0x1A) references external modules, primarily
    /// P/Invoke targets.
    ModuleRefRaw: ModuleRef {
        /// Module name, `#Strings` offset
        name: str,
    }
}

table_row! {
    /// The `TypeSpec` table (0x1B) holds blob-encoded type specifications,
    /// primarily generic instantiations.
    TypeSpecRaw: TypeSpec {
        /// The type signature, `#Blob` offset
        signature: blob,
    }
}

table_row! {
    /// The `NestedClass` table (0x29) records nesting relationships between types.
    NestedClassRaw: NestedClass {
        /// The nested type, index into `TypeDef`
        nested_class: idx(TypeDef),
        /// The enclosing type, index into `TypeDef`
        enclosing_class: idx(TypeDef),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::tables::{
        MetadataTable, RowWritable, TableId, TableInfo, TableInfoRef,
    };
    use std::sync::Arc;

    #[test]
    fn typedef_crafted_short() {
        let data = vec![
            0x01, 0x00, 0x00, 0x00, // flags
            0x11, 0x11, // type_name
            0x22, 0x22, // type_namespace
            0x05, 0x00, // extends ((1 << 2) | 1 = TypeRef row 1)
            0x03, 0x00, // field_list
            0x04, 0x00, // method_list
        ];

        let sizes = Arc::new(TableInfo::new_test(
            &[
                (TableId::TypeDef, 10),
                (TableId::TypeRef, 10),
                (TableId::Field, 10),
                (TableId::MethodDef, 10),
            ],
            false,
            false,
            false,
        ));
        let table = MetadataTable::<TypeDefRaw>::new(&data, 1, sizes).unwrap();

        let row = table.get(1).unwrap();
        assert_eq!(row.rid, 1);
        assert_eq!(row.token.value(), 0x0200_0001);
        assert_eq!(row.flags, 1);
        assert_eq!(row.type_name, 0x1111);
        assert_eq!(row.type_namespace, 0x2222);
        assert_eq!(row.extends.tag, TableId::TypeRef);
        assert_eq!(row.extends.row, 1);
        assert_eq!(row.field_list, 3);
        assert_eq!(row.method_list, 4);
    }

    #[test]
    fn typedef_crafted_long() {
        let data = vec![
            0x01, 0x00, 0x00, 0x00, // flags
            0x11, 0x11, 0x11, 0x11, // type_name (large str)
            0x22, 0x22, 0x22, 0x22, // type_namespace
            0x05, 0x00, 0x00, 0x00, // extends
            0x03, 0x00, 0x00, 0x00, // field_list (large Field)
            0x04, 0x00, 0x00, 0x00, // method_list (large MethodDef)
        ];

        let sizes = Arc::new(TableInfo::new_test(
            &[
                (TableId::TypeDef, u32::from(u16::MAX) + 3),
                (TableId::TypeRef, u32::from(u16::MAX) + 3),
                (TableId::Field, u32::from(u16::MAX) + 3),
                (TableId::MethodDef, u32::from(u16::MAX) + 3),
            ],
            true,
            true,
            true,
        ));
        let table = MetadataTable::<TypeDefRaw>::new(&data, 1, sizes).unwrap();

        let row = table.get(1).unwrap();
        assert_eq!(row.type_name, 0x1111_1111);
        assert_eq!(row.extends.tag, TableId::TypeRef);
        assert_eq!(row.extends.row, 1);
        assert_eq!(row.method_list, 4);
    }

    #[test]
    fn module_roundtrip() {
        let data = vec![
            0x00, 0x00, // generation
            0x34, 0x12, // name
            0x01, 0x00, // mvid
            0x00, 0x00, // enc_id
            0x00, 0x00, // enc_base_id
        ];

        let sizes: TableInfoRef = Arc::new(TableInfo::new_test(
            &[(TableId::Module, 1)],
            false,
            false,
            false,
        ));
        let table = MetadataTable::<ModuleRaw>::new(&data, 1, sizes.clone()).unwrap();

        let row = table.get(1).unwrap();
        assert_eq!(row.token.value(), 0x0000_0001);
        assert_eq!(row.name, 0x1234);
        assert_eq!(row.mvid, 1);

        let mut rewritten = vec![0u8; data.len()];
        let mut offset = 0;
        row.row_write(&mut rewritten, &mut offset, 1, &sizes).unwrap();
        assert_eq!(rewritten, data);
    }

    #[test]
    fn nestedclass_crafted_short() {
        let data = vec![
            0x01, 0x01, // nested_class
            0x02, 0x02, // enclosing_class
        ];

        let sizes = Arc::new(TableInfo::new_test(
            &[(TableId::NestedClass, 1), (TableId::TypeDef, 10)],
            false,
            false,
            false,
        ));
        let table = MetadataTable::<NestedClassRaw>::new(&data, 1, sizes).unwrap();

        for row in table.iter() {
            assert_eq!(row.rid, 1);
            assert_eq!(row.token.value(), 0x2900_0001);
            assert_eq!(row.nested_class, 0x0101);
            assert_eq!(row.enclosing_class, 0x0202);
        }
    }

    #[test]
    fn methoddef_null_extends_roundtrip() {
        // A TypeDef whose extends column is the null reference must survive
        // a write unchanged (bit pattern 0).
        let data = vec![
            0x00, 0x00, 0x00, 0x00, // flags
            0x01, 0x00, // type_name
            0x00, 0x00, // type_namespace
            0x00, 0x00, // extends = null
            0x01, 0x00, // field_list
            0x01, 0x00, // method_list
        ];

        let sizes: TableInfoRef = Arc::new(TableInfo::new_test(
            &[(TableId::TypeDef, 2)],
            false,
            false,
            false,
        ));
        let table = MetadataTable::<TypeDefRaw>::new(&data, 1, sizes.clone()).unwrap();
        let row = table.get(1).unwrap();
        assert!(row.extends.is_null());

        let mut rewritten = vec![0u8; data.len()];
        let mut offset = 0;
        row.row_write(&mut rewritten, &mut offset, 1, &sizes).unwrap();
        assert_eq!(rewritten, data);
    }
}
