//! Placeholder and Locator Benchmarks
//!
//! Benchmarks for test-data token expansion and locating elements
//! against the in-memory driver.
//!
//! Run with: `cargo bench --bench placeholder_ops`

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pagewright::test_data::{EmbeddedStore, FixedClock, JsonTestDataReader, PlaceholderEngine};
use pagewright::{
    By, DefaultElementLocator, ElementLocator, MockDriver, MockElement, SearchRoot, SharedDriver,
};
use serde_json::Value;
use std::sync::Arc;

fn engine() -> PlaceholderEngine {
    PlaceholderEngine::new()
        .with_clock(FixedClock::at_date(2024, 6, 15).unwrap())
        .with_seed(42)
}

fn bench_token_expansion(c: &mut Criterion) {
    let mut group = c.benchmark_group("token_expansion");
    let engine = engine();

    let inputs = vec![
        ("plain", "no tokens in this line at all".to_string()),
        ("single_string", "user-<AlphanumericString(12)>".to_string()),
        ("date_offset", "<DateTime.Now(yyyy-MM-dd) + 2 months - 3 days>".to_string()),
        (
            "mixed_x20",
            "<GuidNew> <NumericString(8)> <Decimal(10,99)> <DateTime.Now()> ".repeat(20),
        ),
    ];

    for (name, input) in inputs {
        group.bench_with_input(BenchmarkId::from_parameter(name), &input, |bench, text| {
            bench.iter(|| black_box(engine.replace_tokens(black_box(text))));
        });
    }

    group.finish();
}

fn bench_json_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("json_read");

    for count in [10usize, 100, 1000] {
        let records: Vec<String> = (0..count)
            .map(|i| {
                format!(
                    r#"{{"TestDataId":"user-{i}","name":"<AlphabeticalString(8)>","ref":"<GuidNew>"}}"#
                )
            })
            .collect();
        let document = format!(r#"{{"users":[{}]}}"#, records.join(","));
        let mut store = EmbeddedStore::new();
        store.insert("TestData.Users.json", document.into_bytes());
        let reader = JsonTestDataReader::new(store).with_engine(engine());
        let last = format!("user-{}", count - 1);

        group.bench_with_input(BenchmarkId::from_parameter(count), &last, |bench, id| {
            bench.iter(|| {
                let value: Value = reader.read("Users", black_box(id)).unwrap();
                black_box(value);
            });
        });
    }

    group.finish();
}

fn bench_mock_locate(c: &mut Criterion) {
    let mut group = c.benchmark_group("mock_locate");

    for rows in [10usize, 100, 500] {
        let mock = Arc::new(MockDriver::new());
        mock.load(
            MockElement::new("table").children((0..rows).map(|i| {
                let cell = MockElement::new("td").id(format!("cell-{i}"));
                MockElement::new("tr")
                    .class("row")
                    .child(cell.text(i.to_string()))
            })),
        );
        let driver: SharedDriver = mock;
        let by_id = DefaultElementLocator::new(
            SearchRoot::Document(Arc::clone(&driver)),
            By::id(format!("cell-{}", rows - 1)),
        );
        let by_css = DefaultElementLocator::new(SearchRoot::Document(driver), By::css("tr.row td"));

        group.bench_with_input(BenchmarkId::new("by_id", rows), &by_id, |bench, locator| {
            bench.iter(|| black_box(locator.find_element().unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("css_all", rows), &by_css, |bench, locator| {
            bench.iter(|| black_box(locator.find_elements().unwrap()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_token_expansion,
    bench_json_read,
    bench_mock_locate
);
criterion_main!(benches);
