use clap::Parser;
use miette::{IntoDiagnostic, Result};
use payrun::application::engine::{PayoutDraft, PayoutEngine};
use payrun::config::{EngineConfig, RetryPolicy, SettlementConfig};
use payrun::domain::payout::{Currency, RecipientDetails};
use payrun::infrastructure::in_memory::InMemoryPayoutStore;
use payrun::infrastructure::settlement::SimulatedSettlement;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Runs a batch of demo payouts through the lifecycle engine and prints
/// the final records as JSON lines.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of demo payouts to submit
    #[arg(long, default_value_t = 5)]
    count: u32,

    /// Probability of a transient settlement failure per attempt
    #[arg(long, default_value_t = 0.1)]
    failure_rate: f64,

    /// Delay before a failed settlement attempt is redelivered
    #[arg(long, default_value_t = 500)]
    retry_delay_ms: u64,

    /// Maximum redeliveries after the first attempt
    #[arg(long, default_value_t = 3)]
    max_retries: u32,

    /// Upper bound of the simulated settlement latency
    #[arg(long, default_value_t = 200)]
    latency_max_ms: u64,
}

fn demo_recipient(n: u32) -> RecipientDetails {
    RecipientDetails {
        full_name: format!("Demo Recipient {n}"),
        bank_name: "Demo Bank".into(),
        account_number: format!("408178109000000000{:02}", n % 100),
        inn: format!("77010000{:02}", n % 100),
        kpp: "770101001".into(),
        bik: "044525225".into(),
        corr_account: "30101810400000000225".into(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "payrun=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config = EngineConfig {
        retry: RetryPolicy {
            max_retries: cli.max_retries,
            retry_delay_ms: cli.retry_delay_ms,
        },
        settlement: SettlementConfig {
            failure_rate: cli.failure_rate,
            latency_min_ms: 0,
            latency_max_ms: cli.latency_max_ms,
        },
    };

    let store = Arc::new(InMemoryPayoutStore::new());
    let gateway = Arc::new(SimulatedSettlement::new(config.settlement));
    let engine = PayoutEngine::new(store, gateway, config);

    let currencies = [Currency::Rub, Currency::Usd, Currency::Eur];
    let mut pending = Vec::new();
    for n in 0..cli.count {
        let draft = PayoutDraft {
            amount: Decimal::new(5_000 + i64::from(n) * 125, 2),
            currency: currencies[n as usize % currencies.len()],
            recipient: demo_recipient(n),
            description: Some(format!("demo payout {n}")),
        };
        let (record, receiver) = engine.submit(draft).await.into_diagnostic()?;
        pending.push((record.id, receiver));
    }

    for (id, receiver) in pending {
        let outcome = receiver.await.into_diagnostic()?;
        let record = engine.get(id).await.into_diagnostic()?;
        let line = serde_json::to_string(&record).into_diagnostic()?;
        println!("{line}");
        tracing::info!(payout = %id, ?outcome, "payout finished");
    }

    Ok(())
}
