//! End-to-end tests over a fully synthetic metadata image: root, stream
//! directory, all five streams, and cross-stream resolution.

use std::sync::Arc;

use metascope::{
    metadata::tables::{GenericParamRaw, NestedClassRaw, TypeDefRaw, TypeSpecRaw},
    prelude::*,
};

/// Assembles a metadata image from named stream contents, computing the
/// directory offsets.
fn build_image(streams: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let version = b"v4.0.30319\0\0";
    let header_len = 16 + version.len() + 4;
    let directory_len: usize = streams
        .iter()
        .map(|(name, _)| 8 + (name.len() + 1).div_ceil(4) * 4)
        .sum();

    let mut image = Vec::new();
    image.extend_from_slice(&0x424A_5342u32.to_le_bytes());
    image.extend_from_slice(&1u16.to_le_bytes());
    image.extend_from_slice(&1u16.to_le_bytes());
    image.extend_from_slice(&0u32.to_le_bytes());
    image.extend_from_slice(&(version.len() as u32).to_le_bytes());
    image.extend_from_slice(version);
    image.extend_from_slice(&0u16.to_le_bytes());
    image.extend_from_slice(&(streams.len() as u16).to_le_bytes());

    let mut content_offset = header_len + directory_len;
    for (name, content) in streams {
        image.extend_from_slice(&(content_offset as u32).to_le_bytes());
        image.extend_from_slice(&(content.len() as u32).to_le_bytes());
        image.extend_from_slice(name.as_bytes());
        let padded = (name.len() + 1).div_ceil(4) * 4;
        image.extend(std::iter::repeat(0u8).take(padded - name.len()));
        content_offset += content.len();
    }

    for (_, content) in streams {
        image.extend_from_slice(content);
    }
    image
}

/// `#~` with Module (1 row), TypeDef (2), TypeSpec (2), NestedClass (3,
/// sorted) and GenericParam (1). All heaps small.
fn tables_stream() -> Vec<u8> {
    let valid: u64 = (1 << TableId::Module as u8)
        | (1 << TableId::TypeDef as u8)
        | (1 << TableId::TypeSpec as u8)
        | (1 << TableId::NestedClass as u8)
        | (1 << TableId::GenericParam as u8);
    let sorted: u64 = 1 << TableId::NestedClass as u8;

    let mut data = Vec::new();
    data.extend_from_slice(&0u32.to_le_bytes());
    data.extend_from_slice(&[2, 0, 0, 1]);
    data.extend_from_slice(&valid.to_le_bytes());
    data.extend_from_slice(&sorted.to_le_bytes());
    for rows in [1u32, 2, 2, 3, 1] {
        data.extend_from_slice(&rows.to_le_bytes());
    }

    // Module: generation 0, name "Widget", mvid 1
    data.extend_from_slice(&[0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00]);

    // TypeDef 1: "Widget", no base
    data.extend_from_slice(&0u32.to_le_bytes());
    data.extend_from_slice(&[0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00]);
    // TypeDef 2: "Gadget", extends TypeDef 1 ((1 << 2) | 0)
    data.extend_from_slice(&0x100u32.to_le_bytes());
    data.extend_from_slice(&[0x08, 0x00, 0x00, 0x00, 0x04, 0x00, 0x01, 0x00, 0x01, 0x00]);

    // TypeSpec signatures at blob offsets 1 and 8
    data.extend_from_slice(&1u16.to_le_bytes());
    data.extend_from_slice(&8u16.to_le_bytes());

    // NestedClass: (nested, enclosing), sorted by nested
    for (nested, enclosing) in [(2u16, 1u16), (3, 1), (4, 2)] {
        data.extend_from_slice(&nested.to_le_bytes());
        data.extend_from_slice(&enclosing.to_le_bytes());
    }

    // GenericParam: number 0, flags 0, owner TypeDef 2 ((2 << 1) | 0), name "T"
    data.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x04, 0x00, 0x0F, 0x00]);

    data
}

fn blob_stream() -> Vec<u8> {
    let mut data = vec![0u8];
    // Offset 1: GENERICINST CLASS TypeDef#1 <CLASS TypeSpec#1>, cyclic
    data.push(6);
    data.extend_from_slice(&[0x15, 0x12, 0x04, 0x01, 0x12, 0x06]);
    // Offset 8: GENERICINST VALUETYPE TypeDef#2 <I4>
    data.push(5);
    data.extend_from_slice(&[0x15, 0x11, 0x08, 0x01, 0x08]);
    data
}

fn crafted_image() -> Vec<u8> {
    build_image(&[
        ("#~", tables_stream()),
        ("#Strings", b"\0Widget\0Gadget\0T\0".to_vec()),
        ("#US", vec![0x00, 0x05, b'H', 0x00, b'i', 0x00, 0x00]),
        ("#GUID", vec![0xAB; 16]),
        ("#Blob", blob_stream()),
    ])
}

#[test]
fn full_image_parses() {
    let metadata = Metadata::from_vec(crafted_image()).unwrap();
    let view = metadata.view();

    assert_eq!(view.root().version, "v4.0.30319");
    assert_eq!(view.root().stream_count, 5);

    let tables = view.tables().unwrap();
    assert_eq!(tables.table_count(), 5);
    assert_eq!(tables.table_row_count(TableId::TypeDef), 2);
    assert_eq!(tables.table_row_count(TableId::MethodDef), 0);
    assert!(tables.is_sorted(TableId::NestedClass));
    assert!(!tables.is_sorted(TableId::TypeDef));

    assert!(view.strings().is_some());
    assert!(view.user_strings().is_some());
    assert!(view.guids().is_some());
    assert!(view.blob().is_some());
}

#[test]
fn rows_resolve_against_heaps() {
    let metadata = Metadata::from_vec(crafted_image()).unwrap();
    let view = metadata.view();
    let tables = view.tables().unwrap();
    let strings = view.strings().unwrap();

    let typedefs = tables.table::<TypeDefRaw>(TableId::TypeDef).unwrap();
    let gadget = typedefs.get(2).unwrap();
    assert_eq!(strings.get(gadget.type_name as usize).unwrap(), "Gadget");
    assert_eq!(gadget.flags, 0x100);
    assert_eq!(gadget.extends.tag, TableId::TypeDef);
    assert_eq!(gadget.extends.row, 1);

    let widget = typedefs.get(1).unwrap();
    assert_eq!(strings.get(widget.type_name as usize).unwrap(), "Widget");
    assert!(widget.extends.is_null());

    let generic_params = tables
        .table::<GenericParamRaw>(TableId::GenericParam)
        .unwrap();
    let param = generic_params.get(1).unwrap();
    assert_eq!(strings.get(param.name as usize).unwrap(), "T");
    assert_eq!(param.owner.tag, TableId::TypeDef);
    assert_eq!(param.owner.row, 2);

    assert_eq!(
        view.user_strings().unwrap().get(1).unwrap().to_string_lossy(),
        "Hi"
    );
    assert_eq!(view.blob().unwrap().get(8).unwrap().len(), 5);
    assert_eq!(
        view.guids().unwrap().get(1).unwrap().to_bytes(),
        [0xAB; 16]
    );
}

#[test]
fn fixed_layout_positional_access() {
    let metadata = Metadata::from_vec(crafted_image()).unwrap();
    let tables = metadata.view().tables().unwrap();

    let nested = tables
        .table::<NestedClassRaw>(TableId::NestedClass)
        .unwrap();
    assert_eq!(nested.row_size(), 4);
    assert_eq!(nested.row_count(), 3);

    // Positional read decodes the bytes at exactly row_size * (rid - 1)
    let second = nested.get(2).unwrap();
    assert_eq!(second.nested_class, 3);
    assert_eq!(second.enclosing_class, 1);
    assert_eq!(second.offset, 4);

    assert!(nested.get(0).is_none());
    assert!(nested.get(4).is_none());

    // Raw and materialized paths agree row for row
    let raw: Vec<NestedClassRaw> = (1..=3).map(|rid| nested.get(rid).unwrap()).collect();
    let materialized: Vec<NestedClassRaw> = nested.iter().collect();
    assert!(nested.is_materialized());
    assert_eq!(raw, materialized);
}

#[test]
fn member_resolution_is_identity_stable() {
    let metadata = Metadata::from_vec(crafted_image()).unwrap();
    let view = metadata.view();

    let token = Token::from_table(TableId::TypeDef, 2);
    let first = view.resolve(token).unwrap();
    let second = view.resolve(token).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.token, token);

    match &first.row {
        RowData::TypeDef(row) => assert_eq!(row.type_name, 8),
        other => panic!("wrong row kind: {other:?}"),
    }

    assert!(view.resolve(Token::new(0)).is_none());
    assert!(view.resolve(Token::from_table(TableId::TypeDef, 99)).is_none());
    assert!(view.resolve(Token::new(0xFF00_0001)).is_none());
}

#[test]
fn cyclic_signature_resolution_terminates() {
    let metadata = Metadata::from_vec(crafted_image()).unwrap();
    let view = metadata.view();
    let resolver = view.signature_resolver().unwrap();

    // TypeSpec#1 instantiates TypeDef#1 with itself as the type argument
    let spec_token = Token::from_table(TableId::TypeSpec, 1);
    let resolved = resolver.resolve_token(spec_token).unwrap();
    assert_eq!(
        resolved,
        ResolvedType::Class {
            token: Token::from_table(TableId::TypeDef, 1),
            args: vec![ResolvedType::Reference(spec_token)],
        }
    );

    // The acyclic sibling resolves fully
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
fn typespec_rows_point_into_the_blob_heap() {
    let metadata = Metadata::from_vec(crafted_image()).unwrap();
    let view = metadata.view();
    let tables = view.tables().unwrap();

    let specs = tables.table::<TypeSpecRaw>(TableId::TypeSpec).unwrap();
    let blob = view.blob().unwrap();

    let first = blob.get(specs.get(1).unwrap().signature as usize).unwrap();
    assert_eq!(first, &[0x15, 0x12, 0x04, 0x01, 0x12, 0x06]);

    let mut parser = SignatureParser::new(first);
    let signature = parser.type_signature().unwrap();
    assert!(matches!(signature, TypeSignature::GenericInst { .. }));
}

#[test]
fn truncated_stream_fails_construction() {
    let mut image = crafted_image();
    image.truncate(image.len() - 8);
    // The directory now points past the buffer
    assert!(Metadata::from_vec(image).is_err());
}
