use brrtparam::parse::decode_str;
use brrtparam::request::{decode_parameters, RawParameters};
use brrtparam::runtime_config::DecodeLimits;
use brrtparam::spec::{Format, ParameterDefinition, ParameterLocation, ParameterStyle, SchemaNode};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

/// Benchmark array decoding across styles and sizes
fn bench_array_styles(c: &mut Criterion) {
    let mut group = c.benchmark_group("array_styles");
    let schema = SchemaNode::array(SchemaNode::integer());

    for len in [4usize, 64, 512] {
        let items: Vec<String> = (0..len).map(|i| i.to_string()).collect();
        let cases = [
            (ParameterStyle::Form, ParameterLocation::Query, items.join(",")),
            (ParameterStyle::PipeDelimited, ParameterLocation::Query, items.join("|")),
            (ParameterStyle::Label, ParameterLocation::Path, format!(".{}", items.join("."))),
            (ParameterStyle::Matrix, ParameterLocation::Path, format!(";id={}", items.join(","))),
        ];
        for (style, location, raw) in cases {
            let param = ParameterDefinition::new("id", location, schema.clone())
                .style(style)
                .explode(false);
            group.bench_with_input(BenchmarkId::new(style.as_str(), len), &raw, |b, raw| {
                b.iter(|| decode_str(black_box(&param), black_box(raw)))
            });
        }
    }
    group.finish();
}

/// Benchmark object styles, including nested deepObject keys
fn bench_object_styles(c: &mut Criterion) {
    let schema = SchemaNode::object([
        ("size", SchemaNode::integer()),
        ("since", SchemaNode::formatted(Format::DateTime)),
        ("tags", SchemaNode::array(SchemaNode::string())),
    ]);
    let form = ParameterDefinition::new("filter", ParameterLocation::Query, schema.clone())
        .explode(false);
    let deep = ParameterDefinition::new("filter", ParameterLocation::Query, schema)
        .style(ParameterStyle::DeepObject);

    c.bench_function("form_object", |b| {
        b.iter(|| decode_str(black_box(&form), black_box("size,10,since,2024-01-01T00:00:00Z")))
    });
    c.bench_function("deep_object", |b| {
        b.iter(|| {
            decode_str(
                black_box(&deep),
                black_box("filter[size]=10&filter[since]=2024-01-01T00:00:00Z&filter[tags]=a&filter[tags]=b"),
            )
        })
    });
}

/// Benchmark extracting and decoding a whole request
fn bench_request(c: &mut Criterion) {
    let params = vec![
        ParameterDefinition::new("id", ParameterLocation::Path, SchemaNode::integer()),
        ParameterDefinition::new(
            "tag",
            ParameterLocation::Query,
            SchemaNode::array(SchemaNode::string()),
        ),
        ParameterDefinition::new("X-Limit", ParameterLocation::Header, SchemaNode::integer())
            .default_value(20_i64),
        ParameterDefinition::new("session", ParameterLocation::Cookie, SchemaNode::string()),
    ];
    let limits = DecodeLimits::default();

    c.bench_function("request_extract_and_decode", |b| {
        b.iter(|| {
            let raw = RawParameters::from_parts(
                "/users/{id}",
                black_box("/users/42?tag=a&tag=b&tag=c"),
                [("Cookie", "session=abc123; theme=dark")],
            );
            decode_parameters(&params, &raw, &limits)
        })
    });
}

criterion_group!(benches, bench_array_styles, bench_object_styles, bench_request);
criterion_main!(benches);
