//! Parsed signature shapes and the element-type constants they decode from.

use crate::metadata::token::Token;

/// The `ELEMENT_TYPE` bytes that open each node of a signature blob
/// (ECMA-335 II.23.1.16).
pub mod element_type {
    pub const END: u8 = 0x00;
    pub const VOID: u8 = 0x01;
    pub const BOOLEAN: u8 = 0x02;
    pub const CHAR: u8 = 0x03;
    pub const I1: u8 = 0x04;
    pub const U1: u8 = 0x05;
    pub const I2: u8 = 0x06;
    pub const U2: u8 = 0x07;
    pub const I4: u8 = 0x08;
    pub const U4: u8 = 0x09;
    pub const I8: u8 = 0x0A;
    pub const U8: u8 = 0x0B;
    pub const R4: u8 = 0x0C;
    pub const R8: u8 = 0x0D;
    pub const STRING: u8 = 0x0E;
    pub const PTR: u8 = 0x0F;
    pub const BYREF: u8 = 0x10;
    pub const VALUETYPE: u8 = 0x11;
    pub const CLASS: u8 = 0x12;
    pub const VAR: u8 = 0x13;
    pub const ARRAY: u8 = 0x14;
    pub const GENERICINST: u8 = 0x15;
    pub const TYPEDBYREF: u8 = 0x16;
    pub const I: u8 = 0x18;
    pub const U: u8 = 0x19;
    pub const FNPTR: u8 = 0x1B;
    pub const OBJECT: u8 = 0x1C;
    pub const SZARRAY: u8 = 0x1D;
    pub const MVAR: u8 = 0x1E;
    pub const CMOD_REQD: u8 = 0x1F;
    pub const CMOD_OPT: u8 = 0x20;
    pub const INTERNAL: u8 = 0x21;
    pub const SENTINEL: u8 = 0x41;
    pub const PINNED: u8 = 0x45;
}

/// One dimension of a general (non-SZ) array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArrayDimension {
    /// Declared size, when present
    pub size: Option<u32>,
    /// Declared lower bound, when present
    pub lower_bound: Option<u32>,
}

/// A parsed type node from a signature blob (II.23.2.12).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TypeSignature {
    #[default]
    Void,
    Boolean,
    Char,
    I1,
    U1,
    I2,
    U2,
    I4,
    U4,
    I8,
    U8,
    R4,
    R8,
    /// `System.String`
    String,
    /// Platform-sized signed integer
    I,
    /// Platform-sized unsigned integer
    U,
    /// `System.Object`
    Object,
    /// `System.TypedReference`
    TypedByRef,
    /// Unmanaged pointer
    Ptr {
        modifiers: Vec<Token>,
        pointee: Box<TypeSignature>,
    },
    /// Managed reference
    ByRef(Box<TypeSignature>),
    /// Value type, `TypeDefOrRefOrSpec` token
    ValueType(Token),
    /// Reference type, `TypeDefOrRefOrSpec` token
    Class(Token),
    /// Generic parameter of the enclosing type, by position
    GenericParamType(u32),
    /// Generic parameter of the enclosing method, by position
    GenericParamMethod(u32),
    /// General array with rank and per-dimension bounds
    Array {
        element: Box<TypeSignature>,
        rank: u32,
        dimensions: Vec<ArrayDimension>,
    },
    /// Single-dimension zero-based array
    SzArray {
        modifiers: Vec<Token>,
        element: Box<TypeSignature>,
    },
    /// Instantiated generic type
    GenericInst {
        base: Box<TypeSignature>,
        args: Vec<TypeSignature>,
    },
    /// Function pointer carrying a full method shape
    FnPtr(Box<SignatureMethod>),
    /// `modreq` custom modifiers
    ModifiedRequired(Vec<Token>),
    /// `modopt` custom modifiers
    ModifiedOptional(Vec<Token>),
    /// Pinned local
    Pinned(Box<TypeSignature>),
    /// Vararg boundary marker
    Sentinel,
    /// CLI-internal type
    Internal,
}

/// Calling convention from the low nibble of a method signature's first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallingConvention {
    #[default]
    Default,
    C,
    StdCall,
    ThisCall,
    FastCall,
    VarArg,
}

/// One parameter (or return slot) of a method or property signature.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureParameter {
    /// Custom modifiers preceding the type
    pub modifiers: Vec<Token>,
    /// Passed by reference
    pub by_ref: bool,
    /// The parameter type
    pub base: TypeSignature,
}

/// A method signature: `MethodDefSig`, `MethodRefSig` or
/// `StandAloneMethodSig` (II.23.2.1–3).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureMethod {
    /// The `HASTHIS` flag
    pub has_this: bool,
    /// The `EXPLICITTHIS` flag
    pub explicit_this: bool,
    pub convention: CallingConvention,
    /// Number of generic parameters, 0 for non-generic methods
    pub generic_param_count: u32,
    pub return_type: SignatureParameter,
    pub params: Vec<SignatureParameter>,
    /// Parameters after the vararg sentinel, call-site signatures only
    pub varargs: Vec<SignatureParameter>,
}

/// A field signature (II.23.2.4).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureField {
    pub modifiers: Vec<Token>,
    pub base: TypeSignature,
}

/// A property signature (II.23.2.5).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureProperty {
    pub has_this: bool,
    pub modifiers: Vec<Token>,
    /// The property type
    pub base: TypeSignature,
    /// Indexer parameters, empty for plain properties
    pub params: Vec<SignatureParameter>,
}

/// One entry of a local variable signature.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureLocalVariable {
    pub modifiers: Vec<Token>,
    pub by_ref: bool,
    pub pinned: bool,
    pub base: TypeSignature,
}

/// A local variable signature (II.23.2.6).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureLocalVariables {
    pub locals: Vec<SignatureLocalVariable>,
}

/// A type specification signature (II.23.2.14).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureTypeSpec {
    pub base: TypeSignature,
}

/// A method specification signature (II.23.2.15).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureMethodSpec {
    pub generic_args: Vec<TypeSignature>,
}
