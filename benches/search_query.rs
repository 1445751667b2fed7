use criterion::{black_box, criterion_group, criterion_main, Criterion};
use stays::models::{Category, Feature};
use stays::search_client::RoomSearch;

fn full_search() -> RoomSearch {
    RoomSearch {
        name: Some("sea view".into()),
        address: Some("harbour".into()),
        min_price: Some(40.0),
        max_price: Some(250.0),
        min_beds: Some(1),
        min_guests: Some(2),
        min_rating: Some(3.5),
        category: Some(Category::King),
        features: vec![Feature::Internet, Feature::Breakfast, Feature::PetsAllowed],
        page: Some(3),
        per_page: Some(10),
    }
}

fn bench_search_query(c: &mut Criterion) {
    let empty = RoomSearch::default();
    let full = full_search();

    c.bench_function("page_query/unfiltered", |b| {
        b.iter(|| black_box(&empty).page_query().sql().len())
    });
    c.bench_function("page_query/all_filters", |b| {
        b.iter(|| black_box(&full).page_query().sql().len())
    });
    c.bench_function("count_query/all_filters", |b| {
        b.iter(|| black_box(&full).count_query().sql().len())
    });
    c.bench_function("cache_key/all_filters", |b| b.iter(|| black_box(&full).cache_key()));
}

criterion_group!(benches, bench_search_query);
criterion_main!(benches);
