use strum::{EnumCount, EnumIter};

/// Identifiers for the metadata tables defined in ECMA-335 Partition II, Section 22.
///
/// Each variant's discriminant is the table ID used in the binary format: the
/// high byte of a metadata token, and the bit position inside the `#~` stream's
/// valid/sorted bitmasks. The `*Ptr` tables are the edit-and-continue
/// indirection tables; they rarely occur in compiler output but are valid
/// format and must round-trip.
#[derive(Clone, Copy, PartialEq, Debug, EnumIter, EnumCount, Eq, Hash, PartialOrd, Ord)]
pub enum TableId {
    /// `Module` table (0x00) - the current module, exactly one row.
    Module = 0x00,
    /// `TypeRef` table (0x01) - references to types in external scopes.
    TypeRef = 0x01,
    /// `TypeDef` table (0x02) - type definitions within this module.
    TypeDef = 0x02,
    /// `FieldPtr` table (0x03) - indirection into `Field` for uncompressed images.
    FieldPtr = 0x03,
    /// `Field` table (0x04) - field definitions within types.
    Field = 0x04,
    /// `MethodPtr` table (0x05) - indirection into `MethodDef` for uncompressed images.
    MethodPtr = 0x05,
    /// `MethodDef` table (0x06) - method definitions within types.
    MethodDef = 0x06,
    /// `ParamPtr` table (0x07) - indirection into `Param` for uncompressed images.
    ParamPtr = 0x07,
    /// `Param` table (0x08) - parameter definitions for methods.
    Param = 0x08,
    /// `InterfaceImpl` table (0x09) - interface implementations by types.
    InterfaceImpl = 0x09,
    /// `MemberRef` table (0x0A) - references to members of external types.
    MemberRef = 0x0A,
    /// `Constant` table (0x0B) - compile-time constant values for fields,
    /// parameters, and properties.
    Constant = 0x0B,
    /// `CustomAttribute` table (0x0C) - custom attribute applications.
    CustomAttribute = 0x0C,
    /// `FieldMarshal` table (0x0D) - marshalling descriptors for interop.
    FieldMarshal = 0x0D,
    /// `DeclSecurity` table (0x0E) - declarative security permission sets.
    DeclSecurity = 0x0E,
    /// `ClassLayout` table (0x0F) - explicit packing and size for types.
    ClassLayout = 0x0F,
    /// `FieldLayout` table (0x10) - explicit byte offsets of fields.
    FieldLayout = 0x10,
    /// `StandAloneSig` table (0x11) - signatures not attached to any member,
    /// e.g. local variable signatures and function pointer shapes.
    StandAloneSig = 0x11,
    /// `EventMap` table (0x12) - maps types to their event ranges.
    EventMap = 0x12,
    /// `EventPtr` table (0x13) - indirection into `Event` for uncompressed images.
    EventPtr = 0x13,
    /// `Event` table (0x14) - event definitions within types.
    Event = 0x14,
    /// `PropertyMap` table (0x15) - maps types to their property ranges.
    PropertyMap = 0x15,
    /// `PropertyPtr` table (0x16) - indirection into `Property` for uncompressed images.
    PropertyPtr = 0x16,
    /// `Property` table (0x17) - property definitions within types.
    Property = 0x17,
    /// `MethodSemantics` table (0x18) - associates accessor methods with
    /// properties and events.
    MethodSemantics = 0x18,
    /// `MethodImpl` table (0x19) - explicit method implementation mappings.
    MethodImpl = 0x19,
    /// `ModuleRef` table (0x1A) - references to external modules.
    ModuleRef = 0x1A,
    /// `TypeSpec` table (0x1B) - blob-encoded type specifications, primarily
    /// generic instantiations.
    TypeSpec = 0x1B,
    /// `ImplMap` table (0x1C) - P/Invoke mappings to unmanaged entry points.
    ImplMap = 0x1C,
    /// `FieldRVA` table (0x1D) - relative virtual addresses of mapped field data.
    FieldRVA = 0x1D,
    /// `Assembly` table (0x20) - the current assembly, at most one row.
    Assembly = 0x20,
    /// `AssemblyProcessor` table (0x21) - processor info, rarely emitted.
    AssemblyProcessor = 0x21,
    /// `AssemblyOS` table (0x22) - operating system info, rarely emitted.
    AssemblyOS = 0x22,
    /// `AssemblyRef` table (0x23) - referenced external assemblies.
    AssemblyRef = 0x23,
    /// `AssemblyRefProcessor` table (0x24) - processor info for references, rarely emitted.
    AssemblyRefProcessor = 0x24,
    /// `AssemblyRefOS` table (0x25) - OS info for references, rarely emitted.
    AssemblyRefOS = 0x25,
    /// `File` table (0x26) - files belonging to this assembly.
    File = 0x26,
    /// `ExportedType` table (0x27) - types exported or forwarded by this assembly.
    ExportedType = 0x27,
    /// `ManifestResource` table (0x28) - embedded or linked resources.
    ManifestResource = 0x28,
    /// `NestedClass` table (0x29) - nesting relationships between types.
    NestedClass = 0x29,
    /// `GenericParam` table (0x2A) - generic parameter declarations.
    GenericParam = 0x2A,
    /// `MethodSpec` table (0x2B) - instantiated generic methods.
    MethodSpec = 0x2B,
    /// `GenericParamConstraint` table (0x2C) - constraints on generic parameters.
    GenericParamConstraint = 0x2C,
}

impl TableId {
    /// Maps a raw table byte (token high byte, or bit position in the valid
    /// bitmask) to a known table kind.
    ///
    /// Returns `None` for reserved or unrecognized values; callers treat such
    /// tables as absent rather than failing the parse.
    #[must_use]
    pub fn from_id(id: u8) -> Option<TableId> {
        match id {
            0x00 => Some(TableId::Module),
            0x01 => Some(TableId::TypeRef),
            0x02 => Some(TableId::TypeDef),
            0x03 => Some(TableId::FieldPtr),
            0x04 => Some(TableId::Field),
            0x05 => Some(TableId::MethodPtr),
            0x06 => Some(TableId::MethodDef),
            0x07 => Some(TableId::ParamPtr),
            0x08 => Some(TableId::Param),
            0x09 => Some(TableId::InterfaceImpl),
            0x0A => Some(TableId::MemberRef),
            0x0B => Some(TableId::Constant),
            0x0C => Some(TableId::CustomAttribute),
            0x0D => Some(TableId::FieldMarshal),
            0x0E => Some(TableId::DeclSecurity),
            0x0F => Some(TableId::ClassLayout),
            0x10 => Some(TableId::FieldLayout),
            0x11 => Some(TableId::StandAloneSig),
            0x12 => Some(TableId::EventMap),
            0x13 => Some(TableId::EventPtr),
            0x14 => Some(TableId::Event),
            0x15 => Some(TableId::PropertyMap),
            0x16 => Some(TableId::PropertyPtr),
            0x17 => Some(TableId::Property),
            0x18 => Some(TableId::MethodSemantics),
            0x19 => Some(TableId::MethodImpl),
            0x1A => Some(TableId::ModuleRef),
            0x1B => Some(TableId::TypeSpec),
            0x1C => Some(TableId::ImplMap),
            0x1D => Some(TableId::FieldRVA),
            0x20 => Some(TableId::Assembly),
            0x21 => Some(TableId::AssemblyProcessor),
            0x22 => Some(TableId::AssemblyOS),
            0x23 => Some(TableId::AssemblyRef),
            0x24 => Some(TableId::AssemblyRefProcessor),
            0x25 => Some(TableId::AssemblyRefOS),
            0x26 => Some(TableId::File),
            0x27 => Some(TableId::ExportedType),
            0x28 => Some(TableId::ManifestResource),
            0x29 => Some(TableId::NestedClass),
            0x2A => Some(TableId::GenericParam),
            0x2B => Some(TableId::MethodSpec),
            0x2C => Some(TableId::GenericParamConstraint),
            _ => None,
        }
    }

    /// The token prefix for this table: the table byte shifted into the high
    /// byte of a 32-bit token.
    #[must_use]
    pub fn token_base(self) -> u32 {
        (self as u32) << 24
    }
}
