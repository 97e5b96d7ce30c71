//! Benchmarks for template parsing and resolution

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use engine::{data_from_json, DataContext, TemplateParser};

const INSERT_TEMPLATE: &str = r#"#for (person in $people)
insert $$p isa person, has name @string($person.name), has age @int($person.age)#if (@equals($person.active, true)), has status "active"#end;
#end
"#;

fn generate_people(count: usize) -> DataContext {
    let mut json = String::from(r#"{"people": ["#);
    for i in 0..count {
        if i > 0 {
            json.push(',');
        }
        json.push_str(&format!(
            r#"{{"name": "person {}", "age": "{}", "active": {}}}"#,
            i,
            20 + i % 50,
            i % 2 == 0
        ));
    }
    json.push_str("]}");
    data_from_json(&json).expect("generated data is valid JSON")
}

fn generate_nested_template(depth: usize) -> String {
    let mut template = String::new();
    for i in 0..depth {
        template.push_str(&format!("#if (@equals($level, {}))level {}\n#else\n", i, i));
    }
    template.push_str("deeper");
    for _ in 0..depth {
        template.push_str("#end");
    }
    template
}

fn benchmark_bulk_resolution(c: &mut Criterion) {
    let parser = TemplateParser::create();
    let mut group = c.benchmark_group("bulk_insert");

    for count in [10, 100, 1000] {
        let data = generate_people(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &data, |b, data| {
            b.iter(|| {
                let result = parser.resolve(black_box(INSERT_TEMPLATE), data);
                black_box(result)
            });
        });
    }

    group.finish();
}

fn benchmark_parsing(c: &mut Criterion) {
    let parser = TemplateParser::create();
    let mut group = c.benchmark_group("check_nested");

    for depth in [8, 64, 200] {
        let template = generate_nested_template(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &template, |b, template| {
            b.iter(|| black_box(parser.check(black_box(template))));
        });
    }

    group.finish();
}

fn benchmark_batch(c: &mut Criterion) {
    let parser = TemplateParser::create();
    let records: Vec<DataContext> = (0..500)
        .map(|i| {
            data_from_json(&format!(r#"{{"id": {}, "tags": "a,b,c"}}"#, i))
                .expect("generated data is valid JSON")
        })
        .collect();
    let template = "insert $$x isa item, has id @long($id)#for (t in @split($tags, \",\")), has tag @upper($t)#end;\n";

    c.bench_function("resolve_batch_500", |b| {
        b.iter(|| black_box(parser.resolve_batch(template, black_box(&records))));
    });
}

criterion_group!(
    benches,
    benchmark_bulk_resolution,
    benchmark_parsing,
    benchmark_batch
);

criterion_main!(benches);
