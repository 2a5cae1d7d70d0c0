//! CLI commands

use fueleu_banking::{BankingEntry, BorrowingViolation, RepaymentOutcome};
use fueleu_core::{Amount, FuelType, ShipId, Year};
use fueleu_engine::AdjustedBalance;
use fueleu_intensity::{ComplianceSnapshot, ConsumptionRecord};
use fueleu_pooling::PoolFormation;
use rust_decimal::Decimal;

use crate::context::AppContext;

fn ship(id: &str) -> anyhow::Result<ShipId> {
    Ok(id.parse()?)
}

/// Store a target intensity for a year
pub fn target(ctx: &AppContext, year: Year, intensity: Decimal) -> anyhow::Result<()> {
    ctx.engine.set_target_intensity(year, intensity)?;
    println!("✅ Target intensity for {} set to {} gCO2e/MJ", year, intensity);
    Ok(())
}

/// Store a consumption record
#[allow(clippy::too_many_arguments)]
pub fn record(
    ctx: &AppContext,
    ship_id: &str,
    year: Year,
    fuel: &str,
    quantity: Decimal,
    emission_factor: Decimal,
    lcv: Option<Decimal>,
    renewable: bool,
) -> anyhow::Result<ConsumptionRecord> {
    let fuel: FuelType = fuel.parse()?;
    let mut record = ConsumptionRecord::new(ship(ship_id)?, year, fuel, quantity, emission_factor);
    if let Some(lcv) = lcv {
        record = record.with_lcv(lcv);
    }
    if renewable {
        record = record.renewable();
    }

    ctx.engine.record_consumption(&record)?;
    println!(
        "✅ Recorded {} t {} for {} in {}",
        record.quantity, record.fuel, record.ship_id, record.year
    );
    Ok(record)
}

/// Compute (or re-read) the snapshot for a ship-year
pub fn snapshot(ctx: &AppContext, ship_id: &str, year: Year) -> anyhow::Result<ComplianceSnapshot> {
    let snapshot = ctx.engine.compute_snapshot(&ship(ship_id)?, year)?;
    println!("📊 {} {}", snapshot.ship_id, snapshot.year);
    println!("   Target intensity: {}", snapshot.target_intensity);
    println!("   Actual intensity: {}", snapshot.actual_intensity);
    println!("   Energy (MJ):      {}", snapshot.total_energy);
    println!(
        "   Raw CB:           {} ({})",
        snapshot.raw_cb,
        if snapshot.is_deficit() { "deficit" } else { "surplus" }
    );
    Ok(snapshot)
}

/// Bank surplus of a year
pub fn bank(ctx: &AppContext, ship_id: &str, year: Year, amount: Decimal) -> anyhow::Result<BankingEntry> {
    let entry = ctx
        .engine
        .bank_surplus(&ship(ship_id)?, year, Amount::new(amount)?)?;
    println!(
        "✅ Banked {} from {} for {} (entry #{})",
        entry.original_amount, year, entry.ship_id, entry.sequence
    );
    Ok(entry)
}

/// Borrow against expected next-year surplus
pub fn borrow(
    ctx: &AppContext,
    ship_id: &str,
    year: Year,
    amount: Decimal,
    expected_surplus: Decimal,
) -> anyhow::Result<BankingEntry> {
    let entry = ctx.engine.borrow(
        &ship(ship_id)?,
        year,
        Amount::new(amount)?,
        Amount::new(expected_surplus)?,
    )?;
    println!(
        "✅ Borrowed {} for {} in {} (entry #{}, repay by {})",
        entry.original_amount,
        entry.ship_id,
        year,
        entry.sequence,
        entry.repay_by.map_or_else(|| "-".to_string(), |y| y.to_string())
    );
    Ok(entry)
}

/// Repay earlier advances from a surplus year
pub fn repay(ctx: &AppContext, ship_id: &str, year: Year) -> anyhow::Result<RepaymentOutcome> {
    let outcome = ctx.engine.repay_borrowings(&ship(ship_id)?, year)?;
    println!(
        "✅ Repaid {} of {} available surplus in {}",
        outcome.repaid, outcome.available, year
    );
    for draw in &outcome.repayments {
        println!("   entry #{} ({}): {}", draw.sequence, draw.origin_year, draw.amount);
    }
    Ok(outcome)
}

/// Resolve (or preview) the Adjusted CB
pub fn resolve(
    ctx: &AppContext,
    ship_id: &str,
    year: Year,
    preview: bool,
) -> anyhow::Result<AdjustedBalance> {
    let ship_id = ship(ship_id)?;
    let balance = if preview {
        ctx.engine.preview_adjusted_balance(&ship_id, year)?
    } else {
        ctx.engine.resolve_adjusted_balance(&ship_id, year)?
    };

    println!("{}", serde_json::to_string_pretty(&balance)?);
    if balance.has_gap() {
        println!("⚠️  Uncovered compliance gap: {}", balance.uncovered_gap);
    }
    for violation in &balance.overdue_borrowings {
        println!(
            "❌ Advance #{} from {} overdue since {}: {} outstanding",
            violation.sequence, violation.origin_year, violation.repay_by, violation.outstanding
        );
    }
    Ok(balance)
}

/// Form a pool for a year
pub fn pool(ctx: &AppContext, year: Year, members: &[String]) -> anyhow::Result<PoolFormation> {
    let members = members
        .iter()
        .map(|m| ship(m))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let formation = ctx.engine.form_pool(year, &members)?;

    println!(
        "✅ Pool {} formed for {} (aggregate {})",
        formation.pool.pool_id, year, formation.pool.aggregate_adjusted_cb
    );
    for allocation in &formation.allocations {
        println!(
            "   {:<16} {:>14} -> {:>14} ({:+})",
            allocation.ship_id.as_str(),
            allocation.pre_cb.to_string(),
            allocation.post_cb.to_string(),
            allocation.delta.value()
        );
    }
    Ok(formation)
}

/// List banking entries, flagging overdue advances
pub fn entries(
    ctx: &AppContext,
    ship_id: &str,
    as_of: Option<Year>,
) -> anyhow::Result<(Vec<BankingEntry>, Vec<BorrowingViolation>)> {
    let ship_id = ship(ship_id)?;
    let entries = ctx.engine.banking_entries(&ship_id)?;

    if entries.is_empty() {
        println!("No banking entries for {}", ship_id);
    }
    for entry in &entries {
        println!(
            "#{:<4} {} {:<16} {:<8} {:>12} / {:>12}",
            entry.sequence,
            entry.origin_year,
            entry.kind.to_string(),
            entry.status.to_string(),
            entry.remaining_amount.to_string(),
            entry.original_amount.to_string()
        );
    }

    let overdue = match as_of {
        Some(year) => ctx.engine.overdue_borrowings(&ship_id, year)?,
        None => Vec::new(),
    };
    for violation in &overdue {
        println!(
            "❌ Advance #{} overdue (repay by {}): {} outstanding",
            violation.sequence, violation.repay_by, violation.outstanding
        );
    }
    Ok((entries, overdue))
}

/// Verify the audit journal's hash chain
pub fn audit(ctx: &AppContext) -> anyhow::Result<usize> {
    match ctx.engine.verify_journal() {
        Ok(count) => {
            println!("✅ Hash chain verified ({} records)", count);
            Ok(count)
        }
        Err(e) => {
            println!("❌ Hash chain broken: {}", e);
            Err(e.into())
        }
    }
}
