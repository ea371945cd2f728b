use std::sync::Arc;

use bytecraft::{
    endian::ByteOrder,
    field::{CustomRead, Field},
    primitive::Primitive,
    schema::{Schema, SchemaDecl},
    value::Value,
};
use criterion::{Criterion, criterion_group, criterion_main};

fn plain_schema(field_count: usize) -> Schema {
    let mut decl = SchemaDecl::new("Plain").byte_order(ByteOrder::Big);

    for i in 0..field_count {
        decl = decl.field(Field::plain(&format!("f{}", i), Primitive::U16));
    }

    Schema::compile(decl).unwrap()
}

/// `{ count: u16, offsets: [u16; count], records: Leaf at each offset }`
fn offset_schema() -> Schema {
    let leaf = Arc::new(
        Schema::compile(
            SchemaDecl::new("Leaf")
                .byte_order(ByteOrder::Big)
                .field(Field::plain("value", Primitive::U32)),
        )
        .unwrap(),
    );

    Schema::compile(
        SchemaDecl::new("Offsets")
            .byte_order(ByteOrder::Big)
            .field(Field::plain("count", Primitive::U16))
            .field(Field::collection("offsets", Primitive::U16, "count"))
            .field(Field::custom(
                "records",
                CustomRead::new(&["offsets"], move |ctx| {
                    let offsets: Vec<i64> = ctx
                        .array("offsets")?
                        .iter()
                        .filter_map(Value::as_integer)
                        .map(|o| o as i64)
                        .collect();

                    let mut out = Vec::with_capacity(offsets.len());
                    for offset in offsets {
                        out.push(Value::Record(ctx.read_record_at(&leaf, offset, &[])?));
                    }
                    Ok(Value::Array(out))
                }),
            )),
    )
    .unwrap()
}

fn gen_packet(len: usize) -> Vec<u8> {
    // Deterministic but non-trivial pattern
    (0..len).map(|i| (i * 31 % 256) as u8).collect()
}

fn gen_offset_table(count: u16) -> Vec<u8> {
    let header = 2 + 2 * count as usize;
    let mut data = count.to_be_bytes().to_vec();

    for i in 0..count as usize {
        data.extend_from_slice(&((header + i * 4) as u16).to_be_bytes());
    }
    for i in 0..count as u32 {
        data.extend_from_slice(&i.to_be_bytes());
    }

    data
}

fn bench_schema_parse(c: &mut Criterion) {
    for &field_count in &[1usize, 10, 50, 100] {
        let schema = plain_schema(field_count);
        let packet = gen_packet(field_count * 2);

        c.bench_function(&format!("parse_{}_fields", field_count), |b| {
            b.iter(|| {
                let _ = schema.parse(&packet, &[]).unwrap();
            })
        });
    }

    let schema = offset_schema();
    for &count in &[10u16, 100, 1000] {
        let data = gen_offset_table(count);

        c.bench_function(&format!("parse_{}_offsets", count), |b| {
            b.iter(|| {
                let _ = schema.parse(&data, &[]).unwrap();
            })
        });
    }
}

criterion_group!(benches, bench_schema_parse);
criterion_main!(benches);
