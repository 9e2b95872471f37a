//! Payload sources
//!
//! A source hands the collector one parsed option-chain document per cycle,
//! or `None` when nothing could be captured. How it gets there (HTTP, a
//! browser session, a file on disk) is the source's business, including
//! its own timeouts.

pub mod nse;
pub mod replay;

use crate::config::{AppConfig, SourceKind};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait every payload source implements
#[async_trait]
pub trait PayloadSource: Send + Sync {
    /// Short identifier for logs (e.g. "nse", "replay")
    fn id(&self) -> &'static str;

    /// Capture one raw payload. `Ok(None)` means "nothing this cycle".
    async fn fetch(&self) -> Result<Option<serde_json::Value>>;
}

/// Build the source selected in configuration
pub fn from_config(config: &AppConfig) -> Result<Arc<dyn PayloadSource>> {
    let source: Arc<dyn PayloadSource> = match &config.source {
        SourceKind::Nse => Arc::new(nse::NseSource::new(&config.symbol)?),
        SourceKind::File(path) => Arc::new(replay::ReplaySource::new(path.clone())),
    };
    tracing::info!("Payload source: {} ({})", source.id(), config.source);
    Ok(source)
}
