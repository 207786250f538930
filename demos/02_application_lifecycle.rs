/// application lifecycle - submit, decide, disburse, schedule, summarize
use chrono::{Duration, TimeZone, Utc};
use loan_decision_rs::{
    DecisionEngine, DecisionPolicy, EventStore, LoanApplication, LoanRequest, LoanStatus, Money,
    PortfolioSummary, Rate, SafeTimeProvider, SeededRiskScorer, TimeSource,
};
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 4, 1, 10, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();

    // seeded scorer so reruns produce the same decisions
    let engine = DecisionEngine::new(DecisionPolicy::reference(), SeededRiskScorer::new(2024))?;
    let mut events = EventStore::new();

    let requests = [
        (Money::from_major(250_000), dec!(8.5), 36),
        (Money::from_major(1_200_000), dec!(10.0), 120),
        (Money::from_major(60_000), dec!(11.0), 12),
        (Money::from_major(450_000), dec!(9.5), 60),
    ];

    let mut records = Vec::new();
    for (amount, rate, tenure) in requests {
        let request = LoanRequest::new(amount, Rate::from_percent(rate), tenure);
        let record = engine.process(LoanApplication::new(42, 2, request), &time, &mut events)?;
        println!(
            "{} {:>9} -> {} (score {})",
            record.application_id, record.requested_amount, record.status, record.approval_score
        );
        records.push(record);
        controller.advance(Duration::hours(2));
    }

    // disburse the first approved loan a week later
    controller.advance(Duration::days(7));
    if let Some(record) = records.iter_mut().find(|r| r.status == LoanStatus::Approved) {
        record.mark_disbursed(time.now(), &mut events)?;
        println!("\ndisbursed {}", record.application_id);

        if let Some(schedule) = record.schedule() {
            let schedule = schedule?;
            println!("first three installments:");
            for payment in schedule.payments.iter().take(3) {
                println!(
                    "  #{:<3} {}  emi {}  interest {}  principal {}  balance {}",
                    payment.payment_number,
                    payment.payment_date.format("%Y-%m-%d"),
                    payment.payment_amount,
                    payment.interest_portion,
                    payment.principal_portion,
                    payment.ending_balance
                );
            }
        }
    }

    let summary = PortfolioSummary::from_records(&records);
    println!("\n{}", serde_json::to_string_pretty(&summary)?);
    println!("{} events recorded", events.len());

    Ok(())
}
