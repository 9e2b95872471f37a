//! File replay source
//!
//! Re-reads a saved option-chain JSON document on every cycle. Useful for
//! running the pipeline offline and for tests.

use crate::error::Result;
use crate::sources::PayloadSource;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::warn;

pub struct ReplaySource {
    path: PathBuf,
}

impl ReplaySource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl PayloadSource for ReplaySource {
    fn id(&self) -> &'static str {
        "replay"
    }

    async fn fetch(&self) -> Result<Option<serde_json::Value>> {
        let body = match tokio::fs::read_to_string(&self.path).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Replay file {} unreadable: {}", self.path.display(), e);
                return Ok(None);
            }
        };

        Ok(Some(serde_json::from_str(&body)?))
    }
}
