//! report-runner: headless report builder over synthetic account data.
//!
//! Usage:
//!   report-runner --seed 12345 --months 14 --db run.db
//!   report-runner --seed 12345 --json

use anyhow::Result;
use bigdecimal::BigDecimal;
use chrono::{Days, Months, NaiveDate, Utc};
use creditreport_core::aggregate::{aggregate_categories, month_entries};
use creditreport_core::assembler::{AccountSnapshot, ReportAssembler};
use creditreport_core::keys::KeyRing;
use creditreport_core::report::AccountReference;
use creditreport_core::signer;
use creditreport_core::store::ReportStore;
use creditreport_core::transaction::Transaction;
use creditreport_core::window::{
    first_day_of_month, rolling_window_indicators, window_begin, window_end,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::env;
use uuid::Uuid;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let months = parse_arg(&args, "--months", 14u32);
    let json_output = args.iter().any(|a| a == "--json");
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");

    if !json_output {
        println!("report-runner");
        println!("  seed:   {seed}");
        println!("  months: {months}");
        println!("  db:     {db}");
        println!();
    }

    let store = ReportStore::open(db)?;
    store.migrate()?;

    let fetch_time = Utc::now();
    let today = fetch_time.date_naive();
    let transactions = synthesize_transactions(seed, months, today);

    let user_id = Uuid::new_v4();
    let snapshot = AccountSnapshot {
        user_id,
        account_reference: AccountReference {
            iban: Some(format!("DE8937040044{:010}", seed % 10_000_000_000)),
            ..AccountReference::default()
        },
        balance: BigDecimal::from(12_500),
        credit_limit: Some(BigDecimal::from(-1_000)),
        currency: "EUR".to_string(),
        last_data_fetch_time: fetch_time,
        account_holder: Some("Synthetic Holder".to_string()),
    };

    let keys = KeyRing::generate()?;
    keys.sync_archive(&store, fetch_time)?;

    let assembler = ReportAssembler::new(keys);
    let signed = assembler.assemble(&snapshot, &transactions)?;
    store.insert_signed_report(&signed)?;

    let reloaded = store
        .find_signed_report_by_user(user_id)?
        .ok_or_else(|| anyhow::anyhow!("report not found after insert"))?;
    let valid = signer::verify(&reloaded.report, &reloaded.signature, assembler.keys())?;

    let indicators = rolling_window_indicators(&reloaded.report.credit_score_monthly, today);
    let begin = window_begin(today);
    let end = window_end(today);
    let summaries = aggregate_categories(
        month_entries(&reloaded.report.credit_score_monthly),
        begin,
        end,
    );

    if json_output {
        let out = serde_json::json!({
            "report": reloaded.report,
            "signatureValid": valid,
            "signedFieldPaths": reloaded.signature.signed_field_paths,
            "indicators": indicators,
            "categorySummaries": summaries.values().collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("=== REPORT SUMMARY ===");
    println!("  user:            {user_id}");
    println!("  report id:       {}", reloaded.report.id);
    println!("  transactions:    {}", reloaded.report.transactions_size);
    println!("  monthly records: {}", reloaded.report.credit_score_monthly.len());
    println!("  signed fields:   {:?}", reloaded.signature.signed_field_paths);
    println!("  signature valid: {valid}");
    println!();
    println!("=== 12-MONTH WINDOW {begin}..{end} ===");
    println!("  months covered:     {}", indicators.months_covered);
    println!("  incoming txns:      {}", indicators.incoming_transactions_size);
    println!("  outgoing txns:      {}", indicators.outgoing_transactions_size);
    println!("  total income:       {}", indicators.total_income_amount);
    println!("  total outgoing:     {}", indicators.total_outgoing_amount);
    println!("  avg monthly income: {}", indicators.monthly_average_income);
    println!("  avg monthly cost:   {}", indicators.monthly_average_cost);
    println!();
    println!("=== CATEGORY SUMMARIES ===");
    for summary in summaries.values() {
        println!(
            "  {:<20} {:>4} txns | total {:>12} | avg {:>10}",
            summary.category.to_string(),
            summary.total_transactions,
            summary.total_transaction_amount.to_string(),
            summary.average_transaction_amount.to_string(),
        );
    }

    Ok(())
}

/// Deterministic synthetic history: monthly revenue, rent, and a handful
/// of card payments, going back `months` months.
fn synthesize_transactions(seed: u64, months: u32, today: NaiveDate) -> Vec<Transaction> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut transactions = Vec::new();

    for back in 1..=months {
        let month_start = first_day_of_month(today) - Months::new(back);
        transactions.push(Transaction::new(
            month_start + Days::new(1),
            BigDecimal::from(rng.gen_range(2_800..3_400)),
            Some("Revenue".to_string()),
        ));
        transactions.push(Transaction::new(
            month_start + Days::new(2),
            BigDecimal::from(-rng.gen_range(900..1_100)),
            Some("Rent and Facilities".to_string()),
        ));
        for _ in 0..rng.gen_range(3..8) {
            transactions.push(Transaction::new(
                month_start + Days::new(rng.gen_range(3..28)),
                BigDecimal::from(-rng.gen_range(10..250)),
                Some("Food and Drinks".to_string()),
            ));
        }
    }

    transactions
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
