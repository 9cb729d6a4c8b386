//! Decoding and resolution of `#Blob` signatures.
//!
//! Signatures describe the types of fields, methods, properties, locals and
//! type specifications in a compact recursive encoding (ECMA-335 II.23.2).
//! [`SignatureParser`] decodes the bytes into [`TypeSignature`] trees;
//! [`SignatureResolver`] walks those trees against the metadata tables,
//! following `TypeSpec` indirections with cycle protection.

mod parser;
mod resolver;
mod types;

pub use parser::SignatureParser;
pub use resolver::{ResolvedType, SignatureResolver};
pub use types::{
    element_type, ArrayDimension, CallingConvention, SignatureField, SignatureLocalVariable,
    SignatureLocalVariables, SignatureMethod, SignatureMethodSpec, SignatureParameter,
    SignatureProperty, SignatureTypeSpec, TypeSignature,
};
