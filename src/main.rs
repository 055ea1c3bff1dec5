use anyhow::Result;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use fund_events_indexer::config::Config;
use fund_events_indexer::db::Database;
use fund_events_indexer::error::IndexerError;
use fund_events_indexer::{source, EventProcessor, MemoryStore, ReceiptSummary, TracingDiagnostics};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first
    let cfg_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = Config::load(&cfg_path)?;

    // Initialize logging, RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    info!("Configuration loaded from {}", cfg_path);

    let schema = std::fs::read_to_string(&config.database.schema_path)?;
    let db = Database::connect(&config.db_url(), &schema).await?;
    db.test_connection().await?;

    let processor = EventProcessor::new(config.processing, TracingDiagnostics);
    info!("Processing options: {:?}", processor.options());

    let mut receipts = source::open(&config.input.path).await?;
    info!("Reading receipts from {}", config.input.path);

    let mut totals = ReceiptSummary::default();
    let mut receipts_seen = 0usize;
    let mut written = 0usize;
    let mut pending = MemoryStore::new();

    while let Some(next) = receipts.next_receipt().await {
        let receipt = match next {
            Ok(receipt) => receipt,
            Err(e @ IndexerError::MalformedReceipt { .. }) => {
                warn!("Skipping input: {}", e);
                continue;
            }
            Err(e) => {
                error!("Input stream failed: {}", e);
                return Err(e.into());
            }
        };
        receipts_seen += 1;

        let summary = processor.handle_receipt(&receipt, &mut pending);
        let records = pending.drain();
        written += db.persist_all(&records).await;

        debug!(
            "Receipt {} at block #{}: ACTIONS: {} | RECORDS: {}",
            receipt.receipt.id,
            receipt.block.header.height,
            summary.actions,
            summary.records,
        );
        totals += summary;
    }

    info!(
        "Done. RECEIPTS: {} | ACTIONS: {} | FUNCTION CALLS: {} | UNRECOGNIZED: {} | RECORDS: {} | WRITTEN: {}",
        receipts_seen,
        totals.actions,
        totals.function_calls,
        totals.unrecognized,
        totals.records,
        written,
    );

    Ok(())
}
