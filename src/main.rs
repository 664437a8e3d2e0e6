use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use taskwatch::{Config, LogWriter, Subscribe, System};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = Config::default();
    if !cfg.fits_watchdog() {
        tracing::warn!(
            timeout = ?cfg.watchdog_timeout,
            worst_cycle = ?cfg.worst_receiver_cycle(),
            "receiver cycle can exceed the watchdog timeout"
        );
    }

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::from_config(&cfg))];
    let system = System::builder(cfg).with_subscribers(subs).build();

    let res = system.run().await;
    system.shutdown().await;
    res?;
    Ok(())
}
