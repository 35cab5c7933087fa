// Token ledger benchmarks.
//
// Covers transfer throughput as the number of holders grows (every action
// stages a copy of the state) and dounlock sweeps over records with many
// matured entries.

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};

use locktoken_contracts::{ContractConfig, LogNotifier, Signers, TokenAction, TokenContract};
use locktoken_protocol::{Asset, ManualClock, Name, TimePointSec};

type Contract = TokenContract<ManualClock, LogNotifier>;

fn tok(s: &str) -> Asset {
    s.parse().unwrap()
}

/// Distinct account name for index `i`: "h" followed by base-26 letters.
fn holder(i: usize) -> Name {
    let mut s = String::from("h");
    let mut n = i;
    loop {
        s.push((b'a' + (n % 26) as u8) as char);
        n /= 26;
        if n == 0 {
            break;
        }
    }
    s.parse().unwrap()
}

/// Contract with `holders` funded accounts.
fn setup(holders: usize) -> Contract {
    let issuer: Name = "issuer".parse().unwrap();
    let mut c = TokenContract::with_parts(
        ContractConfig::default(),
        ManualClock::new(TimePointSec::from_secs(1_000)),
        LogNotifier,
    );
    let auth: Signers = ["locktoken".parse().unwrap(), issuer].into_iter().collect();
    c.execute(
        &auth,
        TokenAction::Create {
            issuer,
            maximum_supply: tok("1000000000.0000 TOK"),
        },
    )
    .unwrap();
    for i in 0..holders {
        c.execute(
            &auth,
            TokenAction::Issue {
                to: holder(i),
                quantity: tok("1000.0000 TOK"),
                memo: String::new(),
            },
        )
        .unwrap();
    }
    c
}

fn bench_transfer(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger/transfer");
    group.throughput(Throughput::Elements(1));

    for holders in [10usize, 1_000] {
        let mut contract = setup(holders);
        let from = holder(0);
        let to = holder(1);
        let auth = Signers::of(from);
        let back = Signers::of(to);

        group.bench_with_input(BenchmarkId::from_parameter(holders), &holders, |b, _| {
            b.iter(|| {
                contract
                    .execute(
                        &auth,
                        TokenAction::Transfer {
                            from,
                            to,
                            quantity: tok("0.0001 TOK"),
                            memo: String::new(),
                        },
                    )
                    .unwrap();
                contract
                    .execute(
                        &back,
                        TokenAction::Transfer {
                            from: to,
                            to: from,
                            quantity: tok("0.0001 TOK"),
                            memo: String::new(),
                        },
                    )
                    .unwrap();
            });
        });
    }
    group.finish();
}

fn bench_dounlock(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger/dounlock");

    for entries in [1usize, 64, 512] {
        group.throughput(Throughput::Elements(entries as u64));
        group.bench_with_input(BenchmarkId::from_parameter(entries), &entries, |b, &n| {
            b.iter_batched(
                || {
                    let mut contract = setup(1);
                    let owner = holder(0);
                    let auth = Signers::of(owner);
                    for delay in 0..n {
                        contract
                            .execute(
                                &auth,
                                TokenAction::Lock {
                                    owner,
                                    quantity: tok("0.0001 TOK"),
                                    unlock_delay_sec: (n - delay) as u32,
                                },
                            )
                            .unwrap();
                    }
                    contract
                        .execute(
                            &auth,
                            TokenAction::Unlock {
                                owner,
                                sym_code: "TOK".parse().unwrap(),
                            },
                        )
                        .unwrap();
                    contract.clock().advance(n as u32);
                    contract
                },
                |mut contract| {
                    contract
                        .execute(
                            &Signers::none(),
                            TokenAction::DoUnlock {
                                owner: holder(0),
                                sym_code: "TOK".parse().unwrap(),
                            },
                        )
                        .unwrap()
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_transfer, bench_dounlock);
criterion_main!(benches);
