use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use metascope::{metadata::tables::TypeDefRaw, prelude::*};

/// A `#~` stream with `rows` TypeDef rows, small layout throughout.
fn build_stream(rows: u32) -> Vec<u8> {
    let valid: u64 = 1 << TableId::TypeDef as u8;

    let mut data = Vec::new();
    data.extend_from_slice(&0u32.to_le_bytes());
    data.extend_from_slice(&[2, 0, 0, 1]);
    data.extend_from_slice(&valid.to_le_bytes());
    data.extend_from_slice(&0u64.to_le_bytes());
    data.extend_from_slice(&rows.to_le_bytes());

    for rid in 1..=rows {
        data.extend_from_slice(&rid.to_le_bytes()); // flags
        data.extend_from_slice(&(rid as u16).to_le_bytes()); // name
        data.extend_from_slice(&0u16.to_le_bytes()); // namespace
        data.extend_from_slice(&0u16.to_le_bytes()); // extends
        data.extend_from_slice(&1u16.to_le_bytes()); // field_list
        data.extend_from_slice(&1u16.to_le_bytes()); // method_list
    }

    data
}

fn bench_tables(c: &mut Criterion) {
    let stream = build_stream(10_000);

    c.bench_function("tables_header_parse", |b| {
        b.iter(|| TablesHeader::from(black_box(&stream)).unwrap());
    });

    c.bench_function("positional_get", |b| {
        let header = TablesHeader::from(&stream).unwrap();
        let table = header.table::<TypeDefRaw>(TableId::TypeDef).unwrap();
        b.iter(|| black_box(table.get(black_box(5_000))));
    });

    c.bench_function("iterate_all_rows", |b| {
        let header = TablesHeader::from(&stream).unwrap();
        let table = header.table::<TypeDefRaw>(TableId::TypeDef).unwrap();
        b.iter(|| -> u64 { table.iter().map(|row| u64::from(row.flags)).sum() });
    });
}

criterion_group!(benches, bench_tables);
criterion_main!(benches);
