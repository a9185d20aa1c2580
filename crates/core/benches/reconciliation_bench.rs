//! Reconciliation throughput benchmarks
//!
//! Run with: `cargo bench --bench reconciliation_bench -p altoro-core`

use altoro_core::reconciliation::{group_and_sum, net_amount, reconcile, FieldPair};
use altoro_domain::{Row, Table};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rust_decimal::Decimal;

fn accounts(count: usize, drift_every: usize) -> Table {
    Table::from_rows((0..count).map(|i| {
        let mut balance = Decimal::new(100_000 + i as i64 * 37, 2);
        if drift_every > 0 && i % drift_every == 0 {
            balance += Decimal::new(5, 2);
        }
        Row::new()
            .with("account_id", format!("{:06}", 800_000 + i))
            .with("balance", balance)
            .with("available", balance)
    }))
}

fn transactions(accounts: usize, per_account: usize) -> Table {
    Table::from_rows((0..accounts * per_account).map(|i| {
        let amount = Decimal::new(1_000 + (i % 97) as i64 * 13, 2);
        let (debit, credit) =
            if i % 3 == 0 { (amount, Decimal::ZERO) } else { (Decimal::ZERO, amount) };
        Row::new()
            .with("account_id", format!("{:06}", 800_000 + i % accounts))
            .with("transaction_id", i)
            .with("debit", debit)
            .with("credit", credit)
    }))
}

fn bench_reconcile_accounts(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_accounts");
    let pairs = [FieldPair::same("balance"), FieldPair::same("available")];

    for size in [100, 1_000, 10_000] {
        let a = accounts(size, 0);
        let b = accounts(size, 10);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |bench, _| {
            bench.iter(|| {
                reconcile(black_box(&a), black_box(&b), "account_id", &pairs, Decimal::new(1, 2))
            });
        });
    }
    group.finish();
}

fn bench_group_and_sum(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_and_sum");

    for per_account in [10, 100] {
        let table = transactions(200, per_account);
        group.throughput(Throughput::Elements(table.len() as u64));
        let id = BenchmarkId::new("per_account", per_account);
        group.bench_with_input(id, &table, |bench, table| {
            bench.iter(|| {
                let mut totals = group_and_sum(
                    black_box(table),
                    "account_id",
                    &["debit", "credit"],
                    "transaction_id",
                );
                net_amount(&mut totals, "credit", "debit", "net");
                totals
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_reconcile_accounts, bench_group_and_sum);
criterion_main!(benches);
