//! # LogWriter: renders events as `tracing` records.
//!
//! Every line carries the configured banner, and every record carries the
//! tag and the event sequence number as structured fields.
//!
//! ## Example output (fmt layer)
//! ```text
//! INFO taskwatch: {Hugo Leonardo-RM:89360} [WDT] Watchdog inicializado com timeout de 6 segundos. tag="PROVA_FINAL" seq=2
//! INFO taskwatch: {Hugo Leonardo-RM:89360} [GERADOR] Valor 0 enviado para a fila. tag="PROVA_FINAL" seq=9
//! WARN taskwatch: {Hugo Leonardo-RM:89360} [RECEPTOR] AVISO: Nenhum dado recebido no tempo limite. tag="PROVA_FINAL" seq=41
//! ```

use async_trait::async_trait;
use tracing::Level;

use crate::config::Config;
use crate::events::Event;
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Debug, Clone)]
pub struct LogWriter {
    tag: String,
    banner: String,
}

impl LogWriter {
    /// Construct a writer with an explicit tag and banner.
    #[must_use]
    pub fn new(tag: impl Into<String>, banner: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            banner: banner.into(),
        }
    }

    /// Construct a writer using `cfg.tag` and `cfg.banner`.
    #[must_use]
    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.tag, cfg.banner)
    }

    /// Full line for `ev`: banner followed by the event message.
    pub fn line(&self, ev: &Event) -> String {
        format!("{} {}", self.banner, ev.message())
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, ev: &Event) {
        let line = self.line(ev);
        let tag = self.tag.as_str();

        match ev.level() {
            Level::ERROR => tracing::error!(tag, seq = ev.seq, "{line}"),
            Level::WARN => tracing::warn!(tag, seq = ev.seq, "{line}"),
            Level::INFO => tracing::info!(tag, seq = ev.seq, "{line}"),
            Level::DEBUG => tracing::debug!(tag, seq = ev.seq, "{line}"),
            _ => tracing::trace!(tag, seq = ev.seq, "{line}"),
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
