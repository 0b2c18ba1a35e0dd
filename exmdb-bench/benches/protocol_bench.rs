//! Property codec and request framing benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use exmdb_protocol::constants::proptags;
use exmdb_protocol::request::{CreateFolderByPropertiesRequest, QueryTableRequest};
use exmdb_protocol::{Buffer, PropValue, Request, TaggedPropval, WStringEncoding};
use exmdb_schema::Schema;

fn hierarchy_row(index: u64) -> Vec<TaggedPropval> {
    vec![
        TaggedPropval::new(proptags::FOLDERID, PropValue::LongLong(index)),
        TaggedPropval::new(
            proptags::DISPLAYNAME,
            PropValue::WString(format!("Folder {index}")),
        ),
        TaggedPropval::new(proptags::LASTMODIFICATIONTIME, PropValue::FileTime(index)),
        TaggedPropval::new(proptags::CONTENTCOUNT, PropValue::Long(index as u32)),
        TaggedPropval::new(proptags::ENTRYID, PropValue::Binary(vec![0xab; 46])),
    ]
}

/// Builds a QueryTable response payload with `rows` rows.
fn query_payload(rows: u64) -> Vec<u8> {
    let mut buf = Buffer::new();
    buf.put(&(rows as u32));
    for index in 0..rows {
        let row = hierarchy_row(index);
        buf.put(&(row.len() as u16));
        for propval in &row {
            propval.encode(&mut buf).unwrap();
        }
    }
    buf.freeze().to_vec()
}

fn bench_query_table_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_table_decode");

    for rows in [1u64, 100, 1000] {
        let payload = query_payload(rows);

        group.throughput(Throughput::Elements(rows));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &payload, |b, payload| {
            b.iter(|| {
                let mut buf = Buffer::from_slice(payload, WStringEncoding::Narrow);
                black_box(QueryTableRequest::parse_response(&mut buf).unwrap())
            });
        });
    }

    group.finish();
}

fn bench_propval_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("propval_encode");
    let row = hierarchy_row(42);

    for (name, encoding) in [
        ("narrow", WStringEncoding::Narrow),
        ("utf16", WStringEncoding::Utf16),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut buf = Buffer::with_encoding(encoding);
                for propval in &row {
                    propval.encode(&mut buf).unwrap();
                }
                black_box(buf.len())
            });
        });
    }

    group.finish();
}

fn bench_request_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_serialize");

    let query = QueryTableRequest::new(
        "/var/lib/gromox/domain/1",
        0,
        1,
        vec![
            proptags::FOLDERID,
            proptags::DISPLAYNAME,
            proptags::CONTENTCOUNT,
        ],
        0,
        100,
    );
    group.bench_function("query_table", |b| {
        b.iter(|| black_box(query.serialize().unwrap()));
    });

    let create = CreateFolderByPropertiesRequest::new("/var/lib/gromox/domain/1", 0, hierarchy_row(7));
    group.bench_function("create_folder", |b| {
        b.iter(|| black_box(create.serialize().unwrap()));
    });

    group.finish();
}

fn bench_schema_ddl(c: &mut Criterion) {
    let mut group = c.benchmark_group("schema_ddl");

    group.bench_function("domain", |b| {
        b.iter(|| black_box(Schema::domain().ddl_script()));
    });
    group.bench_function("user", |b| {
        b.iter(|| black_box(Schema::user().ddl_script()));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_query_table_decode,
    bench_propval_encode,
    bench_request_serialize,
    bench_schema_ddl,
);
criterion_main!(benches);
