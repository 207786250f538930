/// policy and bounds - strict server-side checks, fee floor, json policies
use loan_decision_rs::{
    DecisionEngine, DecisionPolicy, EmiPreview, FixedRiskScorer, LoanRequest, Money, Rate,
};
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    println!("=== emi preview ===");
    for tenure in [12, 24, 36, 48, 60, 84, 120] {
        let preview = EmiPreview::estimate(Money::from_major(500_000), Rate::from_percent(dec!(10.5)), tenure)?;
        println!(
            "  {:>3} months: emi {} total {}",
            tenure, preview.monthly_emi, preview.total_payable
        );
    }

    println!("\n=== strict policy with fee floor ===");
    let policy = DecisionPolicy::strict().with_advertised_fee_floor();
    let json = policy.to_json()?;
    println!("{json}");

    // reload from json as a deployment would
    let policy = DecisionPolicy::from_json(&json)?;
    let engine = DecisionEngine::new(policy, FixedRiskScorer::for_score(82)?)?;

    let ok = LoanRequest::new(Money::from_major(40_000), Rate::from_percent(dec!(9.0)), 24);
    let decision = engine.decide(&ok)?;
    println!("\n40k / 9% / 24m -> {:?}", decision.terms().map(|t| t.processing_fee));

    let off_menu = LoanRequest::new(Money::from_major(40_000), Rate::from_percent(dec!(9.0)), 18);
    match engine.decide(&off_menu) {
        Ok(_) => println!("18 months accepted"),
        Err(e) => println!("18 months refused: {e}"),
    }

    Ok(())
}
