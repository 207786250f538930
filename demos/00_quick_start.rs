/// quick start - decide one application and print the outcome
use loan_decision_rs::{DecisionEngine, LoanRequest, Money, Rate};
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    // ₹1,00,000 over 5 years at 9.5% p.a.
    let request = LoanRequest::new(Money::from_major(100_000), Rate::from_percent(dec!(9.5)), 60);

    let engine = DecisionEngine::reference();
    let decision = engine.decide(&request)?;

    println!("score: {}", decision.approval_score());
    match decision.terms() {
        Some(terms) => {
            println!("approved");
            println!("  sanctioned:     {}", terms.sanctioned_amount);
            println!("  monthly emi:    {}", terms.monthly_emi);
            println!("  total interest: {}", terms.total_interest);
            println!("  processing fee: {}", terms.processing_fee);
        }
        None => println!("rejected"),
    }

    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}
