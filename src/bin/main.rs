use financial_decision_orchestrator::{fixtures::demo_profile, AppConfig, FinancialAction};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("Financial Decision Orchestrator demo starting");

    // Built-in profile against the mock agent set
    let service = AppConfig::default().build_service()?;
    let user = demo_profile();
    let action = FinancialAction::Save {
        amount: 500.0,
        goal_id: Some("emergency-fund".to_string()),
    };

    info!(
        action = %action.kind(),
        amount = action.amount(),
        "Running evaluation"
    );

    match service.evaluate(&user, &action, true).await {
        Ok(evaluation) => {
            info!("Evaluation successful");
            println!("\n=== EVALUATION RESULT ===");
            println!("{}", serde_json::to_string_pretty(&evaluation)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("Evaluation failed: {}", e);
            Err(Box::new(e) as Box<dyn std::error::Error>)
        }
    }
}
