//! Recursive-descent decoder for signature blobs.

use crate::{
    file::parser::Parser,
    metadata::signatures::{
        element_type, ArrayDimension, CallingConvention, SignatureField, SignatureLocalVariable,
        SignatureLocalVariables, SignatureMethod, SignatureMethodSpec, SignatureParameter,
        SignatureProperty, SignatureTypeSpec, TypeSignature,
    },
    metadata::token::Token,
    Error::RecursionLimit,
    Result,
};

/// Maximum nesting depth of a single signature blob. Signatures nest through
/// pointers, arrays, generic instantiations and function pointers; a
/// hand-crafted blob could otherwise recurse without bound.
const MAX_RECURSION_DEPTH: usize = 50;

/// Decodes the signature forms of II.23.2 from one blob.
///
/// One parser instance decodes one signature; positions are not reusable
/// across blobs.
///
/// # Examples
///
/// ```rust
/// use metascope::metadata::signatures::SignatureParser;
/// let mut parser = SignatureParser::new(&[0x20, 0x01, 0x01, 0x0E]);
/// let sig = parser.method_signature().unwrap();
/// assert!(sig.has_this);
/// assert_eq!(sig.params.len(), 1);
/// ```
pub struct SignatureParser<'a> {
    parser: Parser<'a>,
    depth: usize,
}

impl<'a> SignatureParser<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        SignatureParser {
            parser: Parser::new(data),
            depth: 0,
        }
    }

    /// Decodes one type node, recursing into nested shapes.
    ///
    /// # Errors
    /// Returns [`crate::Error::RecursionLimit`] past the nesting bound, and
    /// a malformation or bounds error for undecodable bytes.
    pub fn type_signature(&mut self) -> Result<TypeSignature> {
        self.depth += 1;
        if self.depth >= MAX_RECURSION_DEPTH {
            return Err(RecursionLimit(MAX_RECURSION_DEPTH));
        }
        let result = self.type_signature_inner();
        self.depth -= 1;
        result
    }

    fn type_signature_inner(&mut self) -> Result<TypeSignature> {
        let element = self.parser.read_le::<u8>()?;
        match element {
            element_type::VOID => Ok(TypeSignature::Void),
            element_type::BOOLEAN => Ok(TypeSignature::Boolean),
            element_type::CHAR => Ok(TypeSignature::Char),
            element_type::I1 => Ok(TypeSignature::I1),
            element_type::U1 => Ok(TypeSignature::U1),
            element_type::I2 => Ok(TypeSignature::I2),
            element_type::U2 => Ok(TypeSignature::U2),
            element_type::I4 => Ok(TypeSignature::I4),
            element_type::U4 => Ok(TypeSignature::U4),
            element_type::I8 => Ok(TypeSignature::I8),
            element_type::U8 => Ok(TypeSignature::U8),
            element_type::R4 => Ok(TypeSignature::R4),
            element_type::R8 => Ok(TypeSignature::R8),
            element_type::STRING => Ok(TypeSignature::String),
            element_type::I => Ok(TypeSignature::I),
            element_type::U => Ok(TypeSignature::U),
            element_type::OBJECT => Ok(TypeSignature::Object),
            element_type::TYPEDBYREF => Ok(TypeSignature::TypedByRef),
            element_type::PTR => Ok(TypeSignature::Ptr {
                modifiers: self.custom_modifiers()?,
                pointee: Box::new(self.type_signature()?),
            }),
            element_type::BYREF => Ok(TypeSignature::ByRef(Box::new(self.type_signature()?))),
            element_type::VALUETYPE => Ok(TypeSignature::ValueType(
                self.parser.read_compressed_token()?,
            )),
            element_type::CLASS => {
                Ok(TypeSignature::Class(self.parser.read_compressed_token()?))
            }
            element_type::VAR => Ok(TypeSignature::GenericParamType(
                self.parser.read_compressed_uint()?,
            )),
            element_type::MVAR => Ok(TypeSignature::GenericParamMethod(
                self.parser.read_compressed_uint()?,
            )),
            element_type::ARRAY => self.array_signature(),
            element_type::SZARRAY => Ok(TypeSignature::SzArray {
                modifiers: self.custom_modifiers()?,
                element: Box::new(self.type_signature()?),
            }),
            element_type::GENERICINST => self.generic_inst_signature(),
            element_type::FNPTR => Ok(TypeSignature::FnPtr(Box::new(self.method_signature()?))),
            element_type::CMOD_REQD => {
                Ok(TypeSignature::ModifiedRequired(self.custom_modifiers()?))
            }
            element_type::CMOD_OPT => {
                Ok(TypeSignature::ModifiedOptional(self.custom_modifiers()?))
            }
            element_type::PINNED => Ok(TypeSignature::Pinned(Box::new(self.type_signature()?))),
            element_type::SENTINEL => Ok(TypeSignature::Sentinel),
            element_type::INTERNAL => Ok(TypeSignature::Internal),
            _ => Err(malformed_error!("Unsupported ELEMENT_TYPE - {}", element)),
        }
    }

    fn array_signature(&mut self) -> Result<TypeSignature> {
        let element = self.type_signature()?;
        let rank = self.parser.read_compressed_uint()?;

        let num_sizes = self.parser.read_compressed_uint()?;
        let mut dimensions = vec![ArrayDimension::default(); num_sizes as usize];
        for dimension in &mut dimensions {
            dimension.size = Some(self.parser.read_compressed_uint()?);
        }

        let num_bounds = self.parser.read_compressed_uint()?;
        for index in 0..num_bounds {
            if let Some(dimension) = dimensions.get_mut(index as usize) {
                dimension.lower_bound = Some(self.parser.read_compressed_uint()?);
            }
        }

        Ok(TypeSignature::Array {
            element: Box::new(element),
            rank,
            dimensions,
        })
    }

    fn generic_inst_signature(&mut self) -> Result<TypeSignature> {
        let head = self.parser.peek_byte()?;
        if head != element_type::CLASS && head != element_type::VALUETYPE {
            return Err(malformed_error!(
                "GENERICINST base is neither CLASS nor VALUETYPE - {}",
                head
            ));
        }

        let base = self.type_signature()?;
        let arg_count = self.parser.read_compressed_uint()?;
        let mut args = Vec::with_capacity(arg_count as usize);
        for _ in 0..arg_count {
            args.push(self.type_signature()?);
        }

        Ok(TypeSignature::GenericInst {
            base: Box::new(base),
            args,
        })
    }

    /// Consumes the run of `CMOD_OPT`/`CMOD_REQD` prefixes at the cursor.
    fn custom_modifiers(&mut self) -> Result<Vec<Token>> {
        let mut modifiers = Vec::new();

        while self.parser.has_more_data() {
            let next = self.parser.peek_byte()?;
            if next != element_type::CMOD_OPT && next != element_type::CMOD_REQD {
                break;
            }

            self.parser.advance()?;
            modifiers.push(self.parser.read_compressed_token()?);
        }

        Ok(modifiers)
    }

    fn parameter(&mut self) -> Result<SignatureParameter> {
        let modifiers = self.custom_modifiers()?;

        let by_ref = self.parser.peek_byte()? == element_type::BYREF;
        if by_ref {
            self.parser.advance()?;
        }

        Ok(SignatureParameter {
            modifiers,
            by_ref,
            base: self.type_signature()?,
        })
    }

    /// Decodes a `MethodDefSig`/`MethodRefSig`/`StandAloneMethodSig`.
    ///
    /// # Errors
    /// Returns an error for an unknown calling convention nibble or any
    /// undecodable parameter.
    pub fn method_signature(&mut self) -> Result<SignatureMethod> {
        let head = self.parser.read_le::<u8>()?;

        let convention = match head & 0x0F {
            0x0 => CallingConvention::Default,
            0x1 => CallingConvention::C,
            0x2 => CallingConvention::StdCall,
            0x3 => CallingConvention::ThisCall,
            0x4 => CallingConvention::FastCall,
            0x5 => CallingConvention::VarArg,
            other => {
                return Err(malformed_error!(
                    "Unknown calling convention - {:#x}",
                    other
                ))
            }
        };

        let generic_param_count = if head & 0x10 != 0 {
            self.parser.read_compressed_uint()?
        } else {
            0
        };
        let param_count = self.parser.read_compressed_uint()?;

        let mut method = SignatureMethod {
            has_this: head & 0x20 != 0,
            explicit_this: head & 0x40 != 0,
            convention,
            generic_param_count,
            return_type: self.parameter()?,
            params: Vec::new(),
            varargs: Vec::new(),
        };

        let mut past_sentinel = false;
        for _ in 0..param_count {
            if !past_sentinel && self.parser.peek_byte()? == element_type::SENTINEL {
                self.parser.advance()?;
                past_sentinel = true;
            }

            let param = self.parameter()?;
            if past_sentinel {
                method.varargs.push(param);
            } else {
                method.params.push(param);
            }
        }

        Ok(method)
    }

    /// Decodes a field signature (II.23.2.4).
    ///
    /// # Errors
    /// Returns an error if the leading byte is not the `FIELD` marker.
    pub fn field_signature(&mut self) -> Result<SignatureField> {
        let head = self.parser.read_le::<u8>()?;
        if head != 0x06 {
            return Err(malformed_error!("Field signature bad start - {}", head));
        }

        Ok(SignatureField {
            modifiers: self.custom_modifiers()?,
            base: self.type_signature()?,
        })
    }

    /// Decodes a property signature (II.23.2.5).
    ///
    /// # Errors
    /// Returns an error if the leading byte lacks the `PROPERTY` bit.
    pub fn property_signature(&mut self) -> Result<SignatureProperty> {
        let head = self.parser.read_le::<u8>()?;
        if head & 0x08 == 0 {
            return Err(malformed_error!("Property signature bad start - {}", head));
        }

        let param_count = self.parser.read_compressed_uint()?;
        let modifiers = self.custom_modifiers()?;
        let base = self.type_signature()?;

        let mut params = Vec::with_capacity(param_count as usize);
        for _ in 0..param_count {
            params.push(self.parameter()?);
        }

        Ok(SignatureProperty {
            has_this: head & 0x20 != 0,
            modifiers,
            base,
            params,
        })
    }

    /// Decodes a local variable signature (II.23.2.6).
    ///
    /// # Errors
    /// Returns an error if the leading byte is not the `LOCAL_SIG` marker.
    pub fn local_var_signature(&mut self) -> Result<SignatureLocalVariables> {
        let head = self.parser.read_le::<u8>()?;
        if head != 0x07 {
            return Err(malformed_error!("Local var signature bad start - {}", head));
        }

        let count = self.parser.read_compressed_uint()?;
        let mut locals = Vec::with_capacity(count as usize);
        for _ in 0..count {
            if self.parser.peek_byte()? == element_type::TYPEDBYREF {
                self.parser.advance()?;
                locals.push(SignatureLocalVariable {
                    base: TypeSignature::TypedByRef,
                    ..Default::default()
                });
                continue;
            }

            // Modifiers and the PINNED constraint may interleave
            let mut modifiers = Vec::new();
            let mut pinned = false;
            while self.parser.has_more_data() {
                match self.parser.peek_byte()? {
                    element_type::CMOD_OPT | element_type::CMOD_REQD => {
                        self.parser.advance()?;
                        modifiers.push(self.parser.read_compressed_token()?);
                    }
                    element_type::PINNED => {
                        self.parser.advance()?;
                        pinned = true;
                    }
                    _ => break,
                }
            }

            let by_ref = self.parser.peek_byte()? == element_type::BYREF;
            if by_ref {
                self.parser.advance()?;
            }

            locals.push(SignatureLocalVariable {
                modifiers,
                by_ref,
                pinned,
                base: self.type_signature()?,
            });
        }

        Ok(SignatureLocalVariables { locals })
    }

    /// Decodes a type specification signature (II.23.2.14).
    ///
    /// # Errors
    /// Returns an error for any undecodable type node.
    pub fn type_spec_signature(&mut self) -> Result<SignatureTypeSpec> {
        Ok(SignatureTypeSpec {
            base: self.type_signature()?,
        })
    }

    /// Decodes a method specification signature (II.23.2.15).
    ///
    /// # Errors
    /// Returns an error if the leading byte is not the `GENRICINST` marker.
    pub fn method_spec_signature(&mut self) -> Result<SignatureMethodSpec> {
        let head = self.parser.read_le::<u8>()?;
        if head != 0x0A {
            return Err(malformed_error!(
                "Method spec signature bad start - {}",
                head
            ));
        }

        let arg_count = self.parser.read_compressed_uint()?;
        let mut generic_args = Vec::with_capacity(arg_count as usize);
        for _ in 0..arg_count {
            generic_args.push(self.type_signature()?);
        }

        Ok(SignatureMethodSpec { generic_args })
    }
}
