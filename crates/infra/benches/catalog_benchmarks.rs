use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::{TimeDelta, Utc};
use emporium_catalog::{NewBrand, NewCategory, NewProduct};
use emporium_core::{Slug, UserId};
use emporium_infra::catalog_store::{CatalogStore, InMemoryCatalogStore, SteppingClock};

/// Store with `size` products, every third one inactive.
fn seeded_store(size: usize) -> InMemoryCatalogStore<SteppingClock> {
    let clock = SteppingClock::new(Utc::now(), TimeDelta::milliseconds(1));
    let store = InMemoryCatalogStore::with_clock(clock);
    let brand = store
        .create_brand(NewBrand::new("Acme", Slug::parse("acme").unwrap()))
        .unwrap();
    let category = store
        .create_category(NewCategory::new("Tools", Slug::parse("tools").unwrap()))
        .unwrap();

    for i in 0..size {
        let title = format!("Item {i}");
        let mut draft = NewProduct::new(
            category.id,
            brand.id,
            UserId::new(),
            title.as_str(),
            Slug::from_name(&title).unwrap(),
            10.0,
        );
        draft.is_active = i % 3 != 0;
        store.create_product(draft).unwrap();
    }
    store
}

fn bench_active_products_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_active_products");

    for size in [100usize, 1_000, 10_000].iter() {
        let store = seeded_store(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(store.list_active_products().unwrap()));
        });
    }

    group.finish();
}

fn bench_all_vs_active(c: &mut Criterion) {
    let mut group = c.benchmark_group("all_vs_active_products");
    let store = seeded_store(1_000);

    group.bench_function("list_all_products", |b| {
        b.iter(|| black_box(store.list_all_products().unwrap()));
    });
    group.bench_function("list_active_products", |b| {
        b.iter(|| black_box(store.list_active_products().unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_active_products_scan, bench_all_vs_active);
criterion_main!(benches);
