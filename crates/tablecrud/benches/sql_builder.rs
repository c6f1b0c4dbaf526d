use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tablecrud::sql::{PlaceholderStyle, count_placeholders, render_placeholders};
use tablecrud::table::build::{insert_sql, select_sql, update_sql};
use tablecrud::{Binding, BindingSet};

fn columns(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("col{i}")).collect()
}

/// WHERE col0 = ? AND col1 = ? ...
fn filter(n: usize) -> BindingSet {
    let fragment = (0..n)
        .map(|i| format!("col{i} = ?"))
        .collect::<Vec<_>>()
        .join(" AND ");
    let bindings = (0..n)
        .map(|i| Binding::integer(format!("col{i}"), i as i64))
        .collect::<Result<Vec<_>, _>>()
        .expect("valid bindings");
    BindingSet::new(format!("WHERE {fragment}"), bindings)
}

fn bench_insert_sql(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/insert");

    for n in [1, 5, 10, 50, 100] {
        let cols = columns(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &cols, |b, cols| {
            b.iter(|| black_box(insert_sql("t", cols.iter().map(String::as_str))));
        });
    }

    group.finish();
}

fn bench_select_and_update_sql(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/select_update");

    for n in [1, 5, 10, 50] {
        let cols = columns(n);
        let filter = filter(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let refs: Vec<&str> = cols.iter().map(String::as_str).collect();
                black_box(select_sql("t", &refs, Some(&filter)));
                black_box(update_sql("t", refs.iter().copied(), Some(&filter)));
            });
        });
    }

    group.finish();
}

fn bench_render_placeholders(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/render_dollar");

    for n in [1, 10, 100, 500] {
        let sql = update_sql("t", columns(n).iter().map(String::as_str), Some(&filter(n)));
        group.bench_with_input(BenchmarkId::from_parameter(n), &sql, |b, sql| {
            b.iter(|| {
                black_box(count_placeholders(sql));
                black_box(render_placeholders(sql, PlaceholderStyle::Dollar));
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_insert_sql,
    bench_select_and_update_sql,
    bench_render_placeholders
);
criterion_main!(benches);
