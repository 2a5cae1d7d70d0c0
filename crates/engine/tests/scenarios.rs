//! End-to-end scenarios through the engine and a real store

use std::thread;

use fueleu_banking::{BankingConfig, EntryStatus};
use fueleu_core::{Amount, ComplianceBalance, FuelType, ShipId, Year};
use fueleu_engine::{ComplianceEngine, EngineConfig, EngineEvent, ErrorKind};
use fueleu_intensity::ConsumptionRecord;
use fueleu_store::{CompliancePort, InMemoryStore, SqliteStore};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// 100 t at 40 000 MJ/t: every gCO2e/MJ below target is worth 4 t of CB
const TARGET: Decimal = dec!(90);

fn id(s: &str) -> ShipId {
    s.parse().unwrap()
}

fn amount(v: Decimal) -> Amount {
    Amount::new(v).unwrap()
}

fn config() -> EngineConfig {
    EngineConfig::new(BankingConfig::new(2, dec!(0.5), 1))
}

fn engine() -> ComplianceEngine<InMemoryStore> {
    ComplianceEngine::new(config(), InMemoryStore::new()).unwrap()
}

/// Record one year of HFO at `factor` and compute its snapshot
fn sail<P: CompliancePort>(engine: &ComplianceEngine<P>, ship: &str, year: Year, factor: Decimal) {
    engine.set_target_intensity(year, TARGET).unwrap();
    let record = ConsumptionRecord::new(id(ship), year, FuelType::Hfo, dec!(100), factor)
        .with_lcv(dec!(40000));
    engine.record_consumption(&record).unwrap();
    engine.compute_snapshot(&id(ship), year).unwrap();
}

#[test]
fn deficit_is_covered_from_older_banked_surplus() {
    let engine = engine();
    sail(&engine, "A", 2025, dec!(70)); // +80
    sail(&engine, "A", 2027, dec!(102.5)); // -50

    engine.bank_surplus(&id("A"), 2025, amount(dec!(80))).unwrap();
    let balance = engine.resolve_adjusted_balance(&id("A"), 2027).unwrap();

    assert_eq!(balance.raw_cb, ComplianceBalance::new(dec!(-50)));
    assert_eq!(balance.covered, amount(dec!(50)));
    assert_eq!(balance.adjusted_cb, ComplianceBalance::ZERO);
    // The rest stays in the bank
    assert_eq!(balance.carried_reserve, amount(dec!(30)));
    assert!(balance.uncovered_gap.is_zero());

    let entries = engine.banking_entries(&id("A")).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].origin_year, 2025);
    assert_eq!(entries[0].remaining_amount, amount(dec!(30)));
    assert_eq!(entries[0].status, EntryStatus::Open);

    // Re-resolving draws nothing further
    let again = engine.resolve_adjusted_balance(&id("A"), 2027).unwrap();
    assert_eq!(again.adjusted_cb, balance.adjusted_cb);
    assert_eq!(
        engine.banking_entries(&id("A")).unwrap()[0].remaining_amount,
        amount(dec!(30))
    );
}

#[test]
fn fifo_leaves_younger_entry_untouched() {
    let engine = engine();
    sail(&engine, "A", 2025, dec!(85)); // +20
    sail(&engine, "A", 2026, dec!(80)); // +40
    sail(&engine, "A", 2027, dec!(93)); // -12

    engine.bank_surplus(&id("A"), 2025, amount(dec!(20))).unwrap();
    engine.bank_surplus(&id("A"), 2026, amount(dec!(40))).unwrap();
    engine.resolve_adjusted_balance(&id("A"), 2027).unwrap();

    let entries = engine.banking_entries(&id("A")).unwrap();
    assert_eq!(entries[0].remaining_amount, amount(dec!(8)));
    assert_eq!(entries[1].remaining_amount, amount(dec!(40)));
    assert!(entries[1].applications.is_empty());
}

#[test]
fn pool_moves_largest_surplus_first() {
    let engine = engine();
    sail(&engine, "A", 2025, dec!(95)); // -20
    sail(&engine, "B", 2025, dec!(77.5)); // +50
    sail(&engine, "C", 2025, dec!(87.5)); // +10

    let formation = engine
        .form_pool(2025, &[id("A"), id("B"), id("C")])
        .unwrap();

    let post: Vec<Decimal> = formation
        .allocations
        .iter()
        .map(|a| a.post_cb.value())
        .collect();
    assert_eq!(post, vec![dec!(0), dec!(30), dec!(10)]);
    assert_eq!(formation.pool.aggregate_adjusted_cb, ComplianceBalance::new(dec!(40)));

    let stored = engine.pool(&formation.pool.pool_id).unwrap();
    assert_eq!(stored, Some(formation.clone()));
    assert_eq!(
        engine.port().load_pool_membership(&id("C"), 2025).unwrap(),
        Some(formation.pool.pool_id.clone())
    );
}

#[test]
fn non_compliant_pool_writes_nothing() {
    let engine = engine();
    sail(&engine, "A", 2025, dec!(105)); // -60
    sail(&engine, "B", 2025, dec!(87.5)); // +10

    let err = engine.form_pool(2025, &[id("A"), id("B")]).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PoolNonCompliant);
    assert_eq!(engine.port().load_pool_membership(&id("A"), 2025).unwrap(), None);
    assert_eq!(engine.port().load_pool_membership(&id("B"), 2025).unwrap(), None);
    assert!(!engine
        .journal_events()
        .unwrap()
        .iter()
        .any(|e| matches!(e, EngineEvent::PoolFormed { .. })));
}

#[test]
fn ship_joins_one_pool_per_year() {
    let engine = engine();
    sail(&engine, "A", 2025, dec!(95));
    sail(&engine, "B", 2025, dec!(77.5));
    sail(&engine, "C", 2025, dec!(87.5));

    engine.form_pool(2025, &[id("A"), id("B")]).unwrap();
    let err = engine.form_pool(2025, &[id("B"), id("C")]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = engine.form_pool(2025, &[id("C"), id("Z")]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn concurrent_pools_sharing_a_member_cannot_both_form() {
    let engine = engine();
    for (ship, factor) in [("A", dec!(95)), ("B", dec!(77.5)), ("C", dec!(87.5)), ("D", dec!(92))] {
        sail(&engine, ship, 2025, factor);
    }

    let results = thread::scope(|s| {
        let first = s.spawn(|| engine.form_pool(2025, &[id("A"), id("B")]));
        let second = s.spawn(|| engine.form_pool(2025, &[id("D"), id("B"), id("C")]));
        vec![first.join().unwrap(), second.join().unwrap()]
    });

    let formed = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(formed, 1);
    let failed = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert_eq!(failed.kind(), ErrorKind::Conflict);
}

#[test]
fn banked_reserve_cannot_be_pooled_in_later_years() {
    let engine = engine();
    sail(&engine, "A", 2025, dec!(70)); // +80
    sail(&engine, "A", 2026, dec!(90)); // 0
    sail(&engine, "A", 2027, dec!(90)); // 0
    sail(&engine, "B", 2026, dec!(107.5)); // -70
    sail(&engine, "C", 2027, dec!(107.5)); // -70
    engine.bank_surplus(&id("A"), 2025, amount(dec!(80))).unwrap();

    let preview = engine.preview_adjusted_balance(&id("A"), 2026).unwrap();
    assert_eq!(preview.adjusted_cb, ComplianceBalance::ZERO);
    assert_eq!(preview.carried_reserve, amount(dec!(80)));

    for (year, other) in [(2026, "B"), (2027, "C")] {
        let err = engine.form_pool(year, &[id("A"), id(other)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PoolNonCompliant);
    }
    assert_eq!(
        engine.banking_entries(&id("A")).unwrap()[0].remaining_amount,
        amount(dec!(80))
    );
}

#[test]
fn later_draw_does_not_change_an_earlier_year() {
    let engine = engine();
    sail(&engine, "A", 2025, dec!(70)); // +80
    sail(&engine, "A", 2026, dec!(90)); // 0
    sail(&engine, "A", 2027, dec!(102.5)); // -50
    engine.bank_surplus(&id("A"), 2025, amount(dec!(80))).unwrap();

    let before = engine.preview_adjusted_balance(&id("A"), 2026).unwrap();
    engine.resolve_adjusted_balance(&id("A"), 2027).unwrap();
    let after = engine.preview_adjusted_balance(&id("A"), 2026).unwrap();

    assert_eq!(before.adjusted_cb, after.adjusted_cb);
}

#[test]
fn pool_donation_cannot_also_be_banked() {
    let engine = engine();
    sail(&engine, "A", 2025, dec!(95)); // -20
    sail(&engine, "B", 2025, dec!(77.5)); // +50
    engine.form_pool(2025, &[id("A"), id("B")]).unwrap();

    let err = engine
        .bank_surplus(&id("B"), 2025, amount(dec!(50)))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(engine.banking_entries(&id("B")).unwrap().is_empty());

    engine.bank_surplus(&id("B"), 2025, amount(dec!(30))).unwrap();
    let balance = engine.preview_adjusted_balance(&id("B"), 2025).unwrap();
    assert_eq!(balance.adjusted_cb, ComplianceBalance::new(dec!(20)));
    assert_eq!(balance.pool_delta, ComplianceBalance::new(dec!(-20)));
    assert_eq!(balance.pooled_cb, ComplianceBalance::ZERO);

    // Nor borrowed against on the receiving side
    let err = engine
        .borrow(&id("A"), 2025, amount(dec!(5)), amount(dec!(100)))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn pool_receipt_is_not_drawn_again_from_own_bank() {
    let engine = engine();
    sail(&engine, "A", 2024, dec!(70)); // +80
    sail(&engine, "A", 2025, dec!(95)); // -20
    sail(&engine, "B", 2025, dec!(77.5)); // +50

    let formation = engine.form_pool(2025, &[id("A"), id("B")]).unwrap();
    let a = formation.allocation_for(&id("A")).unwrap();
    assert_eq!(a.delta, ComplianceBalance::new(dec!(20)));

    engine.bank_surplus(&id("A"), 2024, amount(dec!(80))).unwrap();
    let balance = engine.resolve_adjusted_balance(&id("A"), 2025).unwrap();

    assert!(balance.drawn.is_empty());
    assert!(!balance.has_gap());
    assert_eq!(balance.pooled_cb, ComplianceBalance::ZERO);
    assert!(balance.is_compliant());
    assert_eq!(
        engine.banking_entries(&id("A")).unwrap()[0].remaining_amount,
        amount(dec!(80))
    );
}

/// Three years of banking, pooling and coverage across two ships. Without
/// borrowing or expiry, every tonne of raw CB ends up either in a
/// ship-year's pooled CB or in the bank.
fn run_conservation<P: CompliancePort>(engine: &ComplianceEngine<P>) {
    sail(engine, "A", 2024, dec!(70)); // +80
    sail(engine, "A", 2025, dec!(95)); // -20
    sail(engine, "A", 2026, dec!(97.5)); // -30
    sail(engine, "B", 2024, dec!(90)); // 0
    sail(engine, "B", 2025, dec!(77.5)); // +50
    sail(engine, "B", 2026, dec!(90)); // 0

    engine.form_pool(2025, &[id("A"), id("B")]).unwrap();
    engine.bank_surplus(&id("A"), 2024, amount(dec!(80))).unwrap();
    assert!(engine.bank_surplus(&id("B"), 2025, amount(dec!(31))).is_err());
    engine.bank_surplus(&id("B"), 2025, amount(dec!(30))).unwrap();

    engine.resolve_adjusted_balance(&id("A"), 2025).unwrap();
    let a_2026 = engine.resolve_adjusted_balance(&id("A"), 2026).unwrap();
    assert_eq!(a_2026.covered, amount(dec!(30)));

    let mut raw = Decimal::ZERO;
    let mut pooled = Decimal::ZERO;
    for ship in ["A", "B"] {
        for year in 2024..=2026 {
            let balance = engine.preview_adjusted_balance(&id(ship), year).unwrap();
            assert!(balance.drawn.is_empty());
            raw += balance.raw_cb.value();
            pooled += balance.pooled_cb.value();
        }
    }
    let banked: Decimal = ["A", "B"]
        .iter()
        .flat_map(|ship| engine.banking_entries(&id(ship)).unwrap())
        .filter(|e| e.is_open())
        .map(|e| e.remaining_amount.value())
        .sum();

    assert_eq!(raw, dec!(80));
    assert_eq!(banked, dec!(80));
    assert_eq!(pooled + banked, raw);
}

#[test]
fn ledger_and_pools_conserve_compliance_balance() {
    run_conservation(&engine());
}

#[test]
fn ledger_and_pools_conserve_compliance_balance_in_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::new(dir.path().join("fueleu.db")).unwrap();
    run_conservation(&ComplianceEngine::new(config(), store).unwrap());
}

#[test]
fn borrowing_is_repaid_from_next_surplus() {
    let engine = engine();
    sail(&engine, "A", 2025, dec!(95)); // -20
    sail(&engine, "A", 2026, dec!(70)); // +80

    engine
        .borrow(&id("A"), 2025, amount(dec!(20)), amount(dec!(80)))
        .unwrap();
    let balance = engine.resolve_adjusted_balance(&id("A"), 2025).unwrap();
    assert_eq!(balance.adjusted_cb, ComplianceBalance::ZERO);
    assert!(balance.drawn.is_empty());

    let repayment = engine.repay_borrowings(&id("A"), 2026).unwrap();
    assert_eq!(repayment.repaid, amount(dec!(20)));

    let balance = engine.resolve_adjusted_balance(&id("A"), 2026).unwrap();
    assert_eq!(balance.repaid, amount(dec!(20)));
    assert_eq!(balance.adjusted_cb, ComplianceBalance::new(dec!(60)));
    assert!(engine.overdue_borrowings(&id("A"), 2027).unwrap().is_empty());
}

#[test]
fn unpaid_advance_becomes_a_violation() {
    let engine = engine();
    sail(&engine, "A", 2025, dec!(95)); // -20

    engine
        .borrow(&id("A"), 2025, amount(dec!(10)), amount(dec!(40)))
        .unwrap();

    assert!(engine.overdue_borrowings(&id("A"), 2026).unwrap().is_empty());
    let overdue = engine.overdue_borrowings(&id("A"), 2027).unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].outstanding, amount(dec!(10)));

    // Advances are never expired
    let entries = engine.banking_entries(&id("A")).unwrap();
    assert_eq!(entries[0].status, EntryStatus::Open);
}

#[test]
fn borrowing_over_cap_is_rejected() {
    let engine = engine();
    sail(&engine, "A", 2025, dec!(95)); // -20

    let err = engine
        .borrow(&id("A"), 2025, amount(dec!(15)), amount(dec!(20)))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(engine.banking_entries(&id("A")).unwrap().is_empty());
}

#[test]
fn sqlite_backed_engine_with_file_journal() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config();
    config.journal_path = Some(dir.path().join("journal.jsonl"));
    let store = SqliteStore::new(dir.path().join("fueleu.db")).unwrap();

    {
        let engine = ComplianceEngine::new(config.clone(), store).unwrap();
        sail(&engine, "A", 2025, dec!(70));
        sail(&engine, "A", 2026, dec!(102.5));
        engine.bank_surplus(&id("A"), 2025, amount(dec!(80))).unwrap();
        let balance = engine.resolve_adjusted_balance(&id("A"), 2026).unwrap();
        assert_eq!(balance.adjusted_cb, ComplianceBalance::ZERO);
        assert_eq!(balance.carried_reserve, amount(dec!(30)));
    }

    // Reopen: state and journal chain survive
    let store = SqliteStore::new(dir.path().join("fueleu.db")).unwrap();
    let engine = ComplianceEngine::new(config, store).unwrap();
    let preview = engine.preview_adjusted_balance(&id("A"), 2026).unwrap();
    assert_eq!(preview.adjusted_cb, ComplianceBalance::ZERO);
    assert_eq!(preview.carried_reserve, amount(dec!(30)));
    assert!(preview.drawn.is_empty());

    // 2 snapshots, 1 banking, 1 coverage
    assert_eq!(engine.verify_journal().unwrap(), 4);
}
