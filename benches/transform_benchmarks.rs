use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

use sandboxberry::manifest::{FieldOption, Manifest, ManifestObject};
use sandboxberry::mapping::RelationMapper;
use sandboxberry::models::SourceRecord;
use sandboxberry::orchestration::DependencyGraph;
use sandboxberry::query_builder::{build_query, remove_system_columns};
use sandboxberry::transform::ObjectTransformer;

fn contact_object() -> ManifestObject {
    ManifestObject::new("Contact")
        .with_field(FieldOption::pass_through("LastName"))
        .with_field(FieldOption::relation("AccountId", "Account"))
        .with_field(FieldOption::recursive("ReportsToId"))
        .with_field(FieldOption::skip("Birthdate"))
}

fn benchmark_build_query(c: &mut Criterion) {
    let columns = vec![
        "Id",
        "Name",
        "CreatedDate",
        "ParentId",
        "OwnerId",
        "SystemModstamp",
        "Help_Sandbox_Data_Set__c",
    ];
    c.bench_function("build_query", |b| {
        b.iter(|| {
            let kept = remove_system_columns(black_box(&columns));
            build_query("Account", &kept, Some("Help_Sandbox_Data_Set__c = true"), Some(200))
        })
    });
}

fn benchmark_transform(c: &mut Criterion) {
    let mapper = Arc::new(RelationMapper::new());
    for i in 0..1_000 {
        let _ = mapper.register("Account", &format!("001{i:012}"), &format!("dst{i:012}"));
    }
    let transformer = ObjectTransformer::new(Arc::new(contact_object()), mapper);

    let mut group = c.benchmark_group("transform");
    for resolved in [true, false] {
        let account = if resolved { "001000000000042" } else { "001999999999999" };
        let record = SourceRecord::new("Contact", "003A")
            .with_field("LastName", "Smith")
            .with_field("AccountId", account)
            .with_field("ReportsToId", "003B")
            .with_field("Birthdate", "1980-01-01");
        group.bench_with_input(
            BenchmarkId::new("contact", if resolved { "resolved" } else { "deferred" }),
            &record,
            |b, record| b.iter(|| transformer.transform(black_box(record.clone()))),
        );
    }
    group.finish();
}

fn benchmark_plan(c: &mut Criterion) {
    let objects = (0..50)
        .map(|i| {
            let object = ManifestObject::new(&format!("Object{i}__c"));
            if i == 0 {
                object
            } else {
                object.with_field(FieldOption::relation(
                    "Parent__c",
                    &format!("Object{}__c", i / 2),
                ))
            }
        })
        .collect();
    let manifest = Manifest::new(objects);

    c.bench_function("dependency_plan_50_objects", |b| {
        b.iter(|| DependencyGraph::from_manifest(black_box(&manifest)).plan())
    });
}

criterion_group!(benches, benchmark_build_query, benchmark_transform, benchmark_plan);
criterion_main!(benches);
