//! Resolution of parsed type signatures against the metadata tables.
//!
//! Parsing leaves `TypeDef`/`TypeRef`/`TypeSpec` references as raw tokens;
//! resolution walks them down to concrete shapes, following `TypeSpec`
//! indirections through the `#Blob` heap. Crafted images can make those
//! indirections cyclic (a `TypeSpec` whose signature mentions itself), so the
//! walk carries the set of tokens currently on the traversal path and breaks
//! re-entry with a [`ResolvedType::Reference`] placeholder instead of
//! recursing.

use std::collections::HashSet;

use crate::{
    metadata::{
        members::MemberCache,
        signatures::{SignatureMethod, SignatureParser, TypeSignature},
        streams::{Blob, TablesHeader},
        tables::{TableId, TypeSpecRaw},
        token::Token,
    },
    Error::TokenNotFound,
    Result,
};

/// A fully resolved type shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedType {
    /// A primitive or otherwise self-contained signature node
    Primitive(TypeSignature),
    /// A reference type, with generic arguments when instantiated
    Class {
        token: Token,
        args: Vec<ResolvedType>,
    },
    /// A value type, with generic arguments when instantiated
    ValueType {
        token: Token,
        args: Vec<ResolvedType>,
    },
    /// An unmanaged pointer
    Pointer(Box<ResolvedType>),
    /// A managed reference
    ByRef(Box<ResolvedType>),
    /// A general array
    Array {
        element: Box<ResolvedType>,
        rank: u32,
    },
    /// A single-dimension zero-based array
    SzArray(Box<ResolvedType>),
    /// An unsubstituted generic parameter, by position
    GenericParam {
        /// True for method generic parameters, false for type ones
        method: bool,
        index: u32,
    },
    /// A function pointer carrying its full method shape
    FnPtr(Box<SignatureMethod>),
    /// A token already on the traversal path; breaking the cycle here keeps
    /// resolution terminating
    Reference(Token),
}

/// Resolves type signatures against one metadata view's tables and heaps.
pub struct SignatureResolver<'a> {
    tables: &'a TablesHeader<'a>,
    blob: &'a Blob<'a>,
    cache: &'a MemberCache,
}

struct ResolveContext {
    /// Tokens on the current traversal path
    in_flight: HashSet<Token>,
}

impl<'a> SignatureResolver<'a> {
    #[must_use]
    pub fn new(tables: &'a TablesHeader<'a>, blob: &'a Blob<'a>, cache: &'a MemberCache) -> Self {
        SignatureResolver {
            tables,
            blob,
            cache,
        }
    }

    /// Resolves a parsed type signature to its concrete shape.
    ///
    /// # Errors
    /// Returns [`crate::Error::TokenNotFound`] for a token whose row does not
    /// exist, and propagates blob and signature decode errors from `TypeSpec`
    /// indirections.
    pub fn resolve(&self, signature: &TypeSignature) -> Result<ResolvedType> {
        let mut context = ResolveContext {
            in_flight: HashSet::new(),
        };
        self.resolve_type(signature, &mut context)
    }

    /// Resolves a `TypeDef`, `TypeRef` or `TypeSpec` token directly.
    ///
    /// # Errors
    /// Same conditions as [`SignatureResolver::resolve`].
    pub fn resolve_token(&self, token: Token) -> Result<ResolvedType> {
        let mut context = ResolveContext {
            in_flight: HashSet::new(),
        };
        self.resolve_type_token(token, Vec::new(), false, &mut context)
    }

    fn resolve_type(
        &self,
        signature: &TypeSignature,
        context: &mut ResolveContext,
    ) -> Result<ResolvedType> {
        match signature {
            TypeSignature::Class(token) => {
                self.resolve_type_token(*token, Vec::new(), false, context)
            }
            TypeSignature::ValueType(token) => {
                self.resolve_type_token(*token, Vec::new(), true, context)
            }
            TypeSignature::GenericInst { base, args } => {
                let mut resolved_args = Vec::with_capacity(args.len());
                for arg in args {
                    resolved_args.push(self.resolve_type(arg, context)?);
                }

                match base.as_ref() {
                    TypeSignature::Class(token) => {
                        self.resolve_type_token(*token, resolved_args, false, context)
                    }
                    TypeSignature::ValueType(token) => {
                        self.resolve_type_token(*token, resolved_args, true, context)
                    }
                    other => Err(malformed_error!(
                        "Generic instantiation of a non-nominal base - {:?}",
                        other
                    )),
                }
            }
            TypeSignature::Ptr { pointee, .. } => Ok(ResolvedType::Pointer(Box::new(
                self.resolve_type(pointee, context)?,
            ))),
            TypeSignature::ByRef(inner) => Ok(ResolvedType::ByRef(Box::new(
                self.resolve_type(inner, context)?,
            ))),
            TypeSignature::Pinned(inner) => self.resolve_type(inner, context),
            TypeSignature::Array { element, rank, .. } => Ok(ResolvedType::Array {
                element: Box::new(self.resolve_type(element, context)?),
                rank: *rank,
            }),
            TypeSignature::SzArray { element, .. } => Ok(ResolvedType::SzArray(Box::new(
                self.resolve_type(element, context)?,
            ))),
            TypeSignature::GenericParamType(index) => Ok(ResolvedType::GenericParam {
                method: false,
                index: *index,
            }),
            TypeSignature::GenericParamMethod(index) => Ok(ResolvedType::GenericParam {
                method: true,
                index: *index,
            }),
            TypeSignature::FnPtr(method) => Ok(ResolvedType::FnPtr(method.clone())),
            other => Ok(ResolvedType::Primitive(other.clone())),
        }
    }

    fn resolve_type_token(
        &self,
        token: Token,
        args: Vec<ResolvedType>,
        value_type: bool,
        context: &mut ResolveContext,
    ) -> Result<ResolvedType> {
        if !context.in_flight.insert(token) {
            return Ok(ResolvedType::Reference(token));
        }

        let result = self.resolve_type_token_inner(token, args, value_type, context);

        context.in_flight.remove(&token);
        result
    }

    fn resolve_type_token_inner(
        &self,
        token: Token,
        args: Vec<ResolvedType>,
        value_type: bool,
        context: &mut ResolveContext,
    ) -> Result<ResolvedType> {
        let Some(table_id) = token.table_id() else {
            return Err(TokenNotFound(token));
        };

        match table_id {
            TableId::TypeDef | TableId::TypeRef => {
                // Tokens inside signatures must address live rows
                if self.cache.resolve(token, self.tables).is_none() {
                    return Err(TokenNotFound(token));
                }

                if value_type {
                    Ok(ResolvedType::ValueType { token, args })
                } else {
                    Ok(ResolvedType::Class { token, args })
                }
            }
            TableId::TypeSpec => {
                let Some(spec) = self
                    .tables
                    .table::<TypeSpecRaw>(TableId::TypeSpec)
                    .and_then(|table| table.get(token.row()))
                else {
                    return Err(TokenNotFound(token));
                };

                let data = self.blob.get(spec.signature as usize)?;
                let spec_signature = SignatureParser::new(data).type_spec_signature()?;
                self.resolve_type(&spec_signature.base, context)
            }
            _ => Err(TokenNotFound(token)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::signatures::SignatureParser;

    /// A `#~` stream with two TypeDef rows and two TypeSpec rows, all heaps
    /// small.
    fn crafted_tables() -> Vec<u8> {
        let valid: u64 = (1 << TableId::TypeDef as u8) | (1 << TableId::TypeSpec as u8);

        let mut data = Vec::new();
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&[2, 0, 0, 1]);
        data.extend_from_slice(&valid.to_le_bytes());
        data.extend_from_slice(&0u64.to_le_bytes());
        data.extend_from_slice(&2u32.to_le_bytes()); // TypeDef rows
        data.extend_from_slice(&2u32.to_le_bytes()); // TypeSpec rows

        // TypeDef: flags u32, name, namespace, extends, field_list, method_list
        for name in [1u16, 2] {
            data.extend_from_slice(&0u32.to_le_bytes());
            data.extend_from_slice(&name.to_le_bytes());
            data.extend_from_slice(&0u16.to_le_bytes());
            data.extend_from_slice(&0u16.to_le_bytes());
            data.extend_from_slice(&1u16.to_le_bytes());
            data.extend_from_slice(&1u16.to_le_bytes());
        }

        // TypeSpec: signature blob index
        data.extend_from_slice(&1u16.to_le_bytes()); // self-referential generic
        data.extend_from_slice(&8u16.to_le_bytes()); // plain List<int>

        data
    }

    /// `#Blob` heap with the two TypeSpec signatures.
    fn crafted_blob() -> Vec<u8> {
        let mut data = vec![0u8];
        // Index 1: GENERICINST CLASS TypeDef#1 <CLASS TypeSpec#1>, cyclic
        data.push(6);
        data.extend_from_slice(&[0x15, 0x12, 0x04, 0x01, 0x12, 0x06]);
        // Index 8: GENERICINST VALUETYPE TypeDef#2 <I4>
        data.push(5);
        data.extend_from_slice(&[0x15, 0x11, 0x08, 0x01, 0x08]);
        data
    }

    #[test]
    fn nominal_types_resolve_and_register() {
        let stream = crafted_tables();
        let heap = crafted_blob();
        let tables = TablesHeader::from(&stream).unwrap();
        let blob = Blob::from(&heap).unwrap();
        let cache = MemberCache::new();
        let resolver = SignatureResolver::new(&tables, &blob, &cache);

        let token = Token::from_table(TableId::TypeDef, 1);
        let resolved = resolver.resolve(&TypeSignature::Class(token)).unwrap();
        assert_eq!(
            resolved,
            ResolvedType::Class {
                token,
                args: Vec::new()
            }
        );
        assert!(cache.get(token).is_some());
    }

    #[test]
    fn generic_instantiation_resolves_arguments() {
        let stream = crafted_tables();
        let heap = crafted_blob();
        let tables = TablesHeader::from(&stream).unwrap();
        let blob = Blob::from(&heap).unwrap();
        let cache = MemberCache::new();
        let resolver = SignatureResolver::new(&tables, &blob, &cache);

        // TypeSpec#2: GENERICINST VALUETYPE TypeDef#2 <I4>
        let resolved = resolver
            .resolve_token(Token::from_table(TableId::TypeSpec, 2))
            .unwrap();
        assert_eq!(
            resolved,
            ResolvedType::ValueType {
                token: Token::from_table(TableId::TypeDef, 2),
                args: vec![ResolvedType::Primitive(TypeSignature::I4)],
            }
        );
    }

    #[test]
    fn cyclic_type_spec_terminates() {
        let stream = crafted_tables();
        let heap = crafted_blob();
        let tables = TablesHeader::from(&stream).unwrap();
        let blob = Blob::from(&heap).unwrap();
        let cache = MemberCache::new();
        let resolver = SignatureResolver::new(&tables, &blob, &cache);

        // TypeSpec#1 instantiates TypeDef#1 with itself as the argument
        let spec_token = Token::from_table(TableId::TypeSpec, 1);
        let resolved = resolver.resolve_token(spec_token).unwrap();
        assert_eq!(
            resolved,
            ResolvedType::Class {
                token: Token::from_table(TableId::TypeDef, 1),
                args: vec![ResolvedType::Reference(spec_token)],
            }
        );
    }

    #[test]
    fn sibling_references_are_not_cut_short() {
        let stream = crafted_tables();
        let heap = crafted_blob();
        let tables = TablesHeader::from(&stream).unwrap();
        let blob = Blob::from(&heap).unwrap();
        let cache = MemberCache::new();
        let resolver = SignatureResolver::new(&tables, &blob, &cache);

        // The same token twice in one signature is not a cycle
        let token = Token::from_table(TableId::TypeDef, 1);
        let mut parser = SignatureParser::new(&[0x15, 0x12, 0x04, 0x02, 0x12, 0x04, 0x12, 0x04]);
        let signature = parser.type_signature().unwrap();

        let resolved = resolver.resolve(&signature).unwrap();
        let expected_arg = ResolvedType::Class {
            token,
            args: Vec::new(),
        };
        assert_eq!(
            resolved,
            ResolvedType::Class {
                token,
                args: vec![expected_arg.clone(), expected_arg],
            }
        );
    }

    #[test]
    fn dangling_tokens_are_errors() {
        let stream = crafted_tables();
        let heap = crafted_blob();
        let tables = TablesHeader::from(&stream).unwrap();
        let blob = Blob::from(&heap).unwrap();
        let cache = MemberCache::new();
        let resolver = SignatureResolver::new(&tables, &blob, &cache);

        let dangling = Token::from_table(TableId::TypeDef, 9);
        assert!(matches!(
            resolver.resolve(&TypeSignature::Class(dangling)),
            Err(crate::Error::TokenNotFound(_))
        ));

        // Not a type token at all
        assert!(resolver
            .resolve_token(Token::from_table(TableId::MethodDef, 1))
            .is_err());
    }

    #[test]
    fn structural_shapes_resolve_without_table_lookups() {
        let stream = crafted_tables();
        let heap = crafted_blob();
        let tables = TablesHeader::from(&stream).unwrap();
        let blob = Blob::from(&heap).unwrap();
        let cache = MemberCache::new();
        let resolver = SignatureResolver::new(&tables, &blob, &cache);

        // int*[]
        let mut parser = SignatureParser::new(&[0x1D, 0x0F, 0x08]);
        let signature = parser.type_signature().unwrap();
        assert_eq!(
            resolver.resolve(&signature).unwrap(),
            ResolvedType::SzArray(Box::new(ResolvedType::Pointer(Box::new(
                ResolvedType::Primitive(TypeSignature::I4)
            ))))
        );

        // Method generic parameter
        assert_eq!(
            resolver
                .resolve(&TypeSignature::GenericParamMethod(2))
                .unwrap(),
            ResolvedType::GenericParam {
                method: true,
                index: 2
            }
        );

        assert!(cache.is_empty());
    }
}
