use criterion::{Criterion, criterion_group, criterion_main};
use stock_ledger::{InMemoryStockLedger, ItemId, StockLedger};

fn bench_reserve_release(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ledger = InMemoryStockLedger::with_stock([("ITEM-BENCH", 1_000_000)]);
    let item = ItemId::new("ITEM-BENCH");

    c.bench_function("ledger/reserve_release", |b| {
        b.iter(|| {
            rt.block_on(async {
                ledger.reserve(&item, 1).await.unwrap();
                ledger.release(&item, 1).await.unwrap();
            });
        });
    });
}

fn bench_contended_reserve(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("ledger/contended_reserve_16_tasks", |b| {
        b.iter(|| {
            rt.block_on(async {
                let ledger = InMemoryStockLedger::with_stock([("ITEM-HOT", 8)]);
                let handles: Vec<_> = (0..16)
                    .map(|_| {
                        let ledger = ledger.clone();
                        tokio::spawn(
                            async move { ledger.reserve(&ItemId::new("ITEM-HOT"), 1).await },
                        )
                    })
                    .collect();
                for handle in handles {
                    let _ = handle.await.unwrap();
                }
            });
        });
    });
}

fn bench_rejected_reserve(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ledger = InMemoryStockLedger::with_stock([("ITEM-EMPTY", 0)]);
    let item = ItemId::new("ITEM-EMPTY");

    c.bench_function("ledger/rejected_reserve", |b| {
        b.iter(|| {
            rt.block_on(async {
                let _ = ledger.reserve(&item, 1).await;
            });
        });
    });
}

criterion_group!(
    benches,
    bench_reserve_release,
    bench_contended_reserve,
    bench_rejected_reserve
);
criterion_main!(benches);
