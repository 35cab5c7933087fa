//! Integration tests for keyed tables, their digest, and sled persistence.
//!
//! Each test stands alone with its own temporary database.

use serde::{Deserialize, Serialize};

use locktoken_protocol::storage::{LedgerDB, RamLedger, StagedWrite, StateHasher, Table};
use locktoken_protocol::{Asset, Name};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Holding {
    balance: Asset,
}

fn name(s: &str) -> Name {
    s.parse().unwrap()
}

fn holding(s: &str) -> Holding {
    Holding {
        balance: s.parse().unwrap(),
    }
}

fn digest(table: &Table<Holding>) -> String {
    let mut hasher = StateHasher::new();
    hasher.absorb(table).unwrap();
    hasher.finalize()
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn table_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut ram = RamLedger::new();
    let mut table = Table::new("holdings");
    table
        .insert(&mut ram, name("alice").raw(), 1, name("alice"), holding("1.0000 TOK"))
        .unwrap();
    table
        .insert(&mut ram, name("bob").raw(), 1, name("carol"), holding("2.50 GLD"))
        .unwrap();

    // First session: write.
    {
        let db = LedgerDB::open(dir.path()).expect("open db");
        let mut staged = StagedWrite::new();
        db.stage_table(&mut staged, &table).unwrap();
        staged.set_metadata("root", digest(&table));
        db.commit(staged).unwrap();
    }

    // Second session: reload rows, payers and ram charges.
    {
        let db = LedgerDB::open(dir.path()).expect("reopen db");
        let mut restored_ram = RamLedger::new();
        let mut restored = Table::new("holdings");
        db.load_table(&mut restored, &mut restored_ram).unwrap();

        assert_eq!(restored.len(), 2);
        assert_eq!(
            restored.find(name("bob").raw(), 1),
            Some(&holding("2.50 GLD"))
        );
        assert_eq!(restored.payer(name("bob").raw(), 1), Some(name("carol")));
        assert_eq!(restored_ram, ram);
        assert_eq!(
            db.get_metadata("root").unwrap(),
            Some(digest(&table).into_bytes())
        );
    }
}

#[test]
fn restage_drops_erased_rows_only() {
    let db = LedgerDB::open_temporary().unwrap();
    let mut ram = RamLedger::new();
    let mut table = Table::new("holdings");
    for (i, owner) in ["alice", "bob", "carol"].iter().enumerate() {
        table
            .insert(&mut ram, name(owner).raw(), 7, name(owner), holding(&format!("{i}.0000 TOK")))
            .unwrap();
    }
    let mut staged = StagedWrite::new();
    db.stage_table(&mut staged, &table).unwrap();
    db.commit(staged).unwrap();

    table.erase(&mut ram, name("bob").raw(), 7).unwrap();
    let mut staged = StagedWrite::new();
    db.stage_table(&mut staged, &table).unwrap();
    db.commit(staged).unwrap();

    let mut reloaded = Table::new("holdings");
    db.load_table(&mut reloaded, &mut RamLedger::new()).unwrap();
    assert_eq!(reloaded.len(), 2);
    assert!(!reloaded.contains(name("bob").raw(), 7));
    assert_eq!(digest(&reloaded), digest(&table));
}

#[test]
fn tables_with_shared_prefixes_stay_separate() {
    let db = LedgerDB::open_temporary().unwrap();
    let mut ram = RamLedger::new();
    let mut short: Table<Holding> = Table::new("stat");
    let mut long: Table<Holding> = Table::new("stats");
    short
        .insert(&mut ram, 1, 1, name("alice"), holding("1.0000 TOK"))
        .unwrap();
    long.insert(&mut ram, 1, 1, name("alice"), holding("9.0000 TOK"))
        .unwrap();

    let mut staged = StagedWrite::new();
    db.stage_table(&mut staged, &short).unwrap();
    db.stage_table(&mut staged, &long).unwrap();
    db.commit(staged).unwrap();

    let mut reloaded: Table<Holding> = Table::new("stat");
    db.load_table(&mut reloaded, &mut RamLedger::new()).unwrap();
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded.find(1, 1), Some(&holding("1.0000 TOK")));
}

// ---------------------------------------------------------------------------
// Digest
// ---------------------------------------------------------------------------

#[test]
fn digest_ignores_write_order_but_sees_payers() {
    let mut ram = RamLedger::new();
    let mut a = Table::new("holdings");
    a.insert(&mut ram, 1, 1, name("alice"), holding("1.0000 TOK")).unwrap();
    a.insert(&mut ram, 2, 1, name("bob"), holding("2.0000 TOK")).unwrap();

    let mut b = Table::new("holdings");
    b.insert(&mut ram, 2, 1, name("bob"), holding("2.0000 TOK")).unwrap();
    b.insert(&mut ram, 1, 1, name("alice"), holding("1.0000 TOK")).unwrap();
    assert_eq!(digest(&a), digest(&b));

    let mut c = Table::new("holdings");
    c.insert(&mut ram, 1, 1, name("carol"), holding("1.0000 TOK")).unwrap();
    c.insert(&mut ram, 2, 1, name("bob"), holding("2.0000 TOK")).unwrap();
    assert_ne!(digest(&a), digest(&c));
}
