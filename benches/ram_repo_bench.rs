use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hadronstore::container::ObjectContainer;
use hadronstore::repo::{IndexKind, RamObjectRepository};
use hadronstore::schema::{AdpRegistry, Class, Designation, MaxPopulation, Member, MinPopulation};
use hadronstore::strings::StringTable;
use std::sync::Arc;
use tempfile::tempdir;

fn person_class(adp: &AdpRegistry) -> Class {
    let mut class = Class::new("Person", Designation::User);
    class.add_member(Member::new("name", "string", MinPopulation::Required, MaxPopulation::One, 0)).unwrap();
    class.add_member(Member::new("age", "u16", MinPopulation::Optional, MaxPopulation::One, 1)).unwrap();
    class.freeze().unwrap();
    adp.register_class(class).unwrap();
    let class = adp.class_by_name("Person").unwrap();
    for member in class.members().to_vec() {
        adp.register_member("Person", member).unwrap();
    }
    adp.class_by_name("Person").unwrap()
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("ram_repo/insert");
    for &n in &[64usize, 1024, 10_000] {
        group.bench_with_input(BenchmarkId::new("unique_indexed", n), &n, |b, &n| {
            b.iter(|| {
                let adp = Arc::new(AdpRegistry::new("bench"));
                adp.init_standard();
                let class = person_class(&adp);
                let strings = Arc::new(StringTable::new());
                let dir = tempdir().unwrap();
                let repo = RamObjectRepository::open(dir.path().join("person.delta"), class.clone(), adp.clone(), strings, &[("name", IndexKind::Unique)], None).unwrap();
                for i in 0..n {
                    let mut o = ObjectContainer::init(adp.clone(), class.clone(), None).unwrap();
                    o.set_value_text("name", &format!("person-{i}")).unwrap();
                    o.set_value_text("age", "30").unwrap();
                    black_box(repo.insert(&o).unwrap());
                }
            });
        });
    }
    group.finish();
}

fn bench_fetch(c: &mut Criterion) {
    let adp = Arc::new(AdpRegistry::new("bench-fetch"));
    adp.init_standard();
    let class = person_class(&adp);
    let strings = Arc::new(StringTable::new());
    let dir = tempdir().unwrap();
    let repo = RamObjectRepository::open(dir.path().join("person.delta"), class.clone(), adp.clone(), strings, &[("name", IndexKind::Unique)], None).unwrap();
    for i in 0..10_000 {
        let mut o = ObjectContainer::init(adp.clone(), class.clone(), None).unwrap();
        o.set_value_text("name", &format!("person-{i}")).unwrap();
        o.set_value_text("age", "30").unwrap();
        repo.insert(&o).unwrap();
    }

    let mut group = c.benchmark_group("ram_repo/fetch");
    group.bench_function("by_id", |b| {
        b.iter(|| black_box(repo.fetch(5000).unwrap()));
    });
    group.finish();
}

criterion_group!(benches, bench_insert, bench_fetch);
criterion_main!(benches);
