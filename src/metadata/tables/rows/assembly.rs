//! Raw rows for assembly-level tables: the manifest, external assembly
//! references, files, exported types and resources.

use super::{col_read, col_size, col_type, col_write, table_row};

table_row! {
    /// The `Assembly` table (0x20) is the manifest of this assembly. Zero or
    /// one row.
    AssemblyRaw: Assembly {
        /// Hash algorithm id (`AssemblyHashAlgorithm`)
        hash_alg_id: u32,
        /// Major version
        major_version: u16,
        /// Minor version
        minor_version: u16,
        /// Build number
        build_number: u16,
        /// Revision number
        revision_number: u16,
        /// `AssemblyFlags` bitmask
        flags: u32,
        /// Public key, `#Blob` offset
        public_key: blob,
        /// Assembly name, `#Strings` offset
        name: str,
        /// Culture string, `#Strings` offset
        culture: str,
    }
}

table_row! {
    /// The `AssemblyProcessor` table (0x21). Unused by compilers, kept for
    /// byte-exact reads of images that carry it anyway.
    AssemblyProcessorRaw: AssemblyProcessor {
        /// Processor identifier
        processor: u32,
    }
}

table_row! {
    /// The `AssemblyOS` table (0x22). Unused by compilers, kept for
    /// byte-exact reads of images that carry it anyway.
    AssemblyOsRaw: AssemblyOS {
        /// Platform identifier
        os_platform_id: u32,
        /// OS major version
        os_major_version: u32,
        /// OS minor version
        os_minor_version: u32,
    }
}

table_row! {
    /// The `AssemblyRef` table (0x23) references external assemblies.
    AssemblyRefRaw: AssemblyRef {
        /// Major version
        major_version: u16,
        /// Minor version
        minor_version: u16,
        /// Build number
        build_number: u16,
        /// Revision number
        revision_number: u16,
        /// `AssemblyFlags` bitmask
        flags: u32,
        /// Full public key or its 8-byte token, `#Blob` offset
        public_key_or_token: blob,
        /// Assembly name, `#Strings` offset
        name: str,
        /// Culture string, `#Strings` offset
        culture: str,
        /// Hash of the referenced assembly, `#Blob` offset
        hash_value: blob,
    }
}

table_row! {
    /// The `AssemblyRefProcessor` table (0x24). Unused by compilers.
    AssemblyRefProcessorRaw: AssemblyRefProcessor {
        /// Processor identifier
        processor: u32,
        /// The described reference, index into `AssemblyRef`
        assembly_ref: idx(AssemblyRef),
    }
}

table_row! {
    /// The `AssemblyRefOS` table (0x25). Unused by compilers.
    AssemblyRefOsRaw: AssemblyRefOS {
        /// Platform identifier
        os_platform_id: u32,
        /// OS major version
        os_major_version: u32,
        /// OS minor version
        os_minor_version: u32,
        /// The described reference, index into `AssemblyRef`
        assembly_ref: idx(AssemblyRef),
    }
}

table_row! {
    /// The `File` table (0x26) lists the files of a multi-module assembly.
    FileRaw: File {
        /// `FileAttributes` bitmask
        flags: u32,
        /// File name, `#Strings` offset
        name: str,
        /// File content hash, `#Blob` offset
        hash_value: blob,
    }
}

table_row! {
    /// The `ExportedType` table (0x27) lists types exported from other
    /// modules of this assembly, or forwarded elsewhere.
    ExportedTypeRaw: ExportedType {
        /// `TypeAttributes` bitmask
        flags: u32,
        /// Hint rid of the `TypeDef` in the owning module, may be stale
        type_def_id: u32,
        /// Type name, `#Strings` offset
        type_name: str,
        /// Type namespace, `#Strings` offset
        type_namespace: str,
        /// Where the type actually lives, `Implementation` coded index
        implementation: coded(Implementation),
    }
}

table_row! {
    /// The `ManifestResource` table (0x28) lists embedded and linked resources.
    ManifestResourceRaw: ManifestResource {
        /// Byte offset within the resource data, for embedded resources
        resource_offset: u32,
        /// `ManifestResourceAttributes` bitmask
        flags: u32,
        /// Resource name, `#Strings` offset
        name: str,
        /// Null for embedded resources, `Implementation` coded index otherwise
        implementation: coded(Implementation),
    }
}
