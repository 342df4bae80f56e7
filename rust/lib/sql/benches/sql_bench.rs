use criterion::{black_box, criterion_group, criterion_main, Criterion};

use clinic_sql::{Executor, SQLStore, SqliteStore, Value};

const SCHEMA: &str = "CREATE TABLE orders (
    id INTEGER PRIMARY KEY,
    customer_id TEXT NOT NULL,
    total_amount INTEGER NOT NULL,
    is_paid INTEGER NOT NULL
);
CREATE INDEX idx_orders_customer ON orders(customer_id);";

fn seeded() -> SqliteStore {
    let store = SqliteStore::open_in_memory().unwrap();
    store.exec_batch(SCHEMA).unwrap();
    for i in 0..10_000i64 {
        store
            .exec(
                "INSERT INTO orders (id, customer_id, total_amount, is_paid) VALUES (?1, ?2, ?3, ?4)",
                &[
                    Value::from(i),
                    Value::from(format!("c{}", i % 500)),
                    Value::from(i * 1_000),
                    Value::from(i % 3 != 0),
                ],
            )
            .unwrap();
    }
    store
}

fn bench_insert(c: &mut Criterion) {
    let store = SqliteStore::open_in_memory().unwrap();
    store.exec_batch(SCHEMA).unwrap();

    c.bench_function("sqlite_insert_order", |b| {
        b.iter(|| {
            store
                .exec(
                    "INSERT INTO orders (customer_id, total_amount, is_paid) VALUES (?1, ?2, 1)",
                    &[Value::from("c-bench"), Value::from(1_500_000_i64)],
                )
                .unwrap();
        });
    });
}

fn bench_paid_sum(c: &mut Criterion) {
    let store = seeded();
    let mut i = 0i64;
    c.bench_function("sqlite_paid_sum_by_customer", |b| {
        b.iter(|| {
            let rows = store
                .query(
                    "SELECT COALESCE(SUM(total_amount), 0) AS spent FROM orders \
                     WHERE customer_id = ?1 AND is_paid = 1",
                    &[Value::from(format!("c{}", black_box(i % 500)))],
                )
                .unwrap();
            assert_eq!(rows.len(), 1);
            i += 1;
        });
    });
}

fn bench_transaction(c: &mut Criterion) {
    let store = seeded();
    c.bench_function("sqlite_transaction_two_statements", |b| {
        b.iter(|| {
            store
                .transaction(&mut |tx| {
                    tx.exec(
                        "UPDATE orders SET is_paid = 1 WHERE id = ?1",
                        &[Value::from(black_box(7_i64))],
                    )?;
                    tx.query(
                        "SELECT SUM(total_amount) AS s FROM orders WHERE customer_id = 'c7'",
                        &[],
                    )?;
                    Ok(())
                })
                .unwrap();
        });
    });
}

criterion_group!(benches, bench_insert, bench_paid_sum, bench_transaction);
criterion_main!(benches);
