//! Benchmarks for the query normalizer hot paths.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nlsparql::core::TagFlags;
use nlsparql::parsing::query_normalizer::QueryNormalizer;
use nlsparql::parsing::sparql_lexer::tokenize;

const PURE: &str = "select distinct ?uri where { ?uri dbo:author dbr:J._K._Rowling . ?uri dbp:publisher dbr:Bloomsbury_(publisher) . ?uri rdf:type dbo:Book }";
const INTERM: &str = "select distinct var_uri where brack_open var_uri dbo_author dbr_J._K._Rowling sep_dot var_uri dbp_publisher dbr_Bloomsbury_ attr_open publisher attr_close sep_dot var_uri rdf_type dbo_Book brack_close";

fn bench_tokenize(c: &mut Criterion) {
    c.bench_function("tokenize", |b| b.iter(|| tokenize(black_box(PURE))));
}

fn bench_to_interm(c: &mut Criterion) {
    let normalizer = QueryNormalizer::new().unwrap();
    let mut group = c.benchmark_group("to_interm");
    group.bench_function("opaque", |b| b.iter(|| normalizer.to_interm(black_box(PURE), false, TagFlags::none())));
    group.bench_function("variants", |b| b.iter(|| normalizer.uri_variants(black_box(PURE))));
    group.finish();
}

fn bench_to_pure(c: &mut Criterion) {
    let normalizer = QueryNormalizer::new().unwrap();
    c.bench_function("correct_and_to_pure", |b| {
        b.iter(|| normalizer.to_pure_sparql(&normalizer.correct_query(black_box(INTERM))))
    });
}

criterion_group!(benches, bench_tokenize, bench_to_interm, bench_to_pure);
criterion_main!(benches);
