//! Type-erased storage for the parsed table regions of the `#~` stream.
//!
//! The tables header carves the stream into one region per present table and
//! needs to hold all of them in a single collection even though each region
//! decodes through a different row type. [`TableData`] is that collection
//! element: a closed enum with one variant per table kind.

use crate::{
    metadata::tables::{
        AssemblyOsRaw, AssemblyProcessorRaw, AssemblyRaw, AssemblyRefOsRaw,
        AssemblyRefProcessorRaw, AssemblyRefRaw, ClassLayoutRaw, ConstantRaw, CustomAttributeRaw,
        DeclSecurityRaw, EventMapRaw, EventPtrRaw, EventRaw, ExportedTypeRaw, FieldLayoutRaw,
        FieldMarshalRaw, FieldPtrRaw, FieldRaw, FieldRvaRaw, FileRaw, GenericParamConstraintRaw,
        GenericParamRaw, ImplMapRaw, InterfaceImplRaw, ManifestResourceRaw, MemberRefRaw,
        MetadataTable, MethodDefRaw, MethodImplRaw, MethodPtrRaw, MethodSemanticsRaw,
        MethodSpecRaw, ModuleRaw, ModuleRefRaw, NestedClassRaw, ParamPtrRaw, ParamRaw,
        PropertyMapRaw, PropertyPtrRaw, PropertyRaw, RowReadable, StandAloneSigRaw, TableId,
        TableInfoRef, TypeDefRaw, TypeRefRaw, TypeSpecRaw,
    },
    Result,
};

macro_rules! table_data {
    ( $( $variant:ident => $row:ty ),+ $(,)? ) => {
        /// One parsed table region, tagged by its table kind.
        pub enum TableData<'a> {
            $( $variant(MetadataTable<'a, $row>), )+
        }

        /// One decoded row, tagged by its table kind.
        ///
        /// The owned counterpart to [`TableData`]: callers that handle rows
        /// of arbitrary kind (the member cache) receive this instead of a
        /// generic parameter.
        #[derive(Clone, Debug, PartialEq)]
        pub enum RowData {
            $( $variant($row), )+
        }

        impl<'a> TableData<'a> {
            /// Parses the region for `table_id` at the start of `data` and
            /// returns it together with its byte length, so the caller can
            /// advance to the next region.
            ///
            /// # Errors
            /// Returns [`crate::Error::OutOfBounds`] if `data` is shorter than
            /// `rows` rows at the layout-resolved width.
            #[allow(clippy::cast_possible_truncation)]
            pub(crate) fn read(
                data: &'a [u8],
                table_id: TableId,
                rows: u32,
                info: TableInfoRef,
            ) -> Result<(TableData<'a>, usize)> {
                match table_id {
                    $(
                        TableId::$variant => {
                            let table = MetadataTable::<$row>::new(data, rows, info)?;
                            let size = table.size() as usize;
                            Ok((TableData::$variant(table), size))
                        }
                    )+
                }
            }

            /// Downcasts to the concrete table for `T`'s kind.
            ///
            /// The caller must pass the row type matching the variant stored
            /// here — the tables header guarantees this by construction, as
            /// each region is parsed and stored under its own [`TableId`].
            /// Every variant holds a `MetadataTable<'a, _>` differing only in
            /// the row type parameter, so the cast reinterprets between
            /// identically-shaped monomorphizations.
            pub(crate) fn as_table<T: RowReadable>(&self) -> &MetadataTable<'a, T> {
                match self {
                    $(
                        TableData::$variant(table) => unsafe {
                            &*std::ptr::from_ref(table).cast::<MetadataTable<'a, T>>()
                        },
                    )+
                }
            }

            /// The table kind stored in this region.
            #[must_use]
            pub fn id(&self) -> TableId {
                match self {
                    $( TableData::$variant(_) => TableId::$variant, )+
                }
            }

            /// The row count of this region.
            #[must_use]
            pub fn row_count(&self) -> u32 {
                match self {
                    $( TableData::$variant(table) => table.row_count(), )+
                }
            }

            /// Decodes the row at `rid` as a tagged value, `None` when out of
            /// range.
            #[must_use]
            pub fn row(&self, rid: u32) -> Option<RowData> {
                match self {
                    $( TableData::$variant(table) => table.get(rid).map(RowData::$variant), )+
                }
            }
        }
    };
}

table_data! {
    Module => ModuleRaw,
    TypeRef => TypeRefRaw,
    TypeDef => TypeDefRaw,
    FieldPtr => FieldPtrRaw,
    Field => FieldRaw,
    MethodPtr => MethodPtrRaw,
    MethodDef => MethodDefRaw,
    ParamPtr => ParamPtrRaw,
    Param => ParamRaw,
    InterfaceImpl => InterfaceImplRaw,
    MemberRef => MemberRefRaw,
    Constant => ConstantRaw,
    CustomAttribute => CustomAttributeRaw,
    FieldMarshal => FieldMarshalRaw,
    DeclSecurity => DeclSecurityRaw,
    ClassLayout => ClassLayoutRaw,
    FieldLayout => FieldLayoutRaw,
    StandAloneSig => StandAloneSigRaw,
    EventMap => EventMapRaw,
    EventPtr => EventPtrRaw,
    Event => EventRaw,
    PropertyMap => PropertyMapRaw,
    PropertyPtr => PropertyPtrRaw,
    Property => PropertyRaw,
    MethodSemantics => MethodSemanticsRaw,
    MethodImpl => MethodImplRaw,
    ModuleRef => ModuleRefRaw,
    TypeSpec => TypeSpecRaw,
    ImplMap => ImplMapRaw,
    FieldRVA => FieldRvaRaw,
    Assembly => AssemblyRaw,
    AssemblyProcessor => AssemblyProcessorRaw,
    AssemblyOS => AssemblyOsRaw,
    AssemblyRef => AssemblyRefRaw,
    AssemblyRefProcessor => AssemblyRefProcessorRaw,
    AssemblyRefOS => AssemblyRefOsRaw,
    File => FileRaw,
    ExportedType => ExportedTypeRaw,
    ManifestResource => ManifestResourceRaw,
    NestedClass => NestedClassRaw,
    GenericParam => GenericParamRaw,
    MethodSpec => MethodSpecRaw,
    GenericParamConstraint => GenericParamConstraintRaw,
}
