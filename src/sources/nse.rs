//! NSE option-chain JSON API

use crate::error::{AppError, Result};
use crate::sources::PayloadSource;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

const BASE_URL: &str = "https://www.nseindia.com";

/// Index underlyings use a different endpoint from single stocks
const INDEX_SYMBOLS: &[&str] = &["NIFTY", "BANKNIFTY", "FINNIFTY", "MIDCPNIFTY", "NIFTYNXT50"];

/// NSE option-chain source
pub struct NseSource {
    client: Client,
    url: Url,
}

impl NseSource {
    pub fn new(symbol: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .default_headers(Self::default_headers())
            .build()?;

        Ok(Self {
            client,
            url: Self::chain_url(symbol)?,
        })
    }

    /// API endpoint for a symbol
    pub fn chain_url(symbol: &str) -> Result<Url> {
        let symbol = symbol.trim().to_uppercase();
        let path = if INDEX_SYMBOLS.contains(&symbol.as_str()) {
            "api/option-chain-indices"
        } else {
            "api/option-chain-equities"
        };

        Url::parse_with_params(&format!("{}/{}", BASE_URL, path), &[("symbol", symbol.as_str())])
            .map_err(|e| AppError::Config(format!("Invalid option-chain URL: {}", e)))
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36",
            ),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(REFERER, HeaderValue::from_static("https://www.nseindia.com/option-chain"));
        headers
    }
}

#[async_trait]
impl PayloadSource for NseSource {
    fn id(&self) -> &'static str {
        "nse"
    }

    async fn fetch(&self) -> Result<Option<serde_json::Value>> {
        debug!("Fetching option chain: {}", self.url);

        let response = self.client.get(self.url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Option-chain request returned HTTP {}", status);
            return Ok(None);
        }

        let body = response.text().await?;
        match serde_json::from_str::<serde_json::Value>(&body) {
            Ok(value) if value.is_object() => Ok(Some(value)),
            Ok(_) => {
                warn!("Option-chain response is not a JSON object");
                Ok(None)
            }
            Err(e) => {
                // Upstream serves an HTML block page instead of JSON when throttling
                warn!("Option-chain response is not JSON: {}", e);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_url() {
        let url = NseSource::chain_url("nifty").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.nseindia.com/api/option-chain-indices?symbol=NIFTY"
        );
    }

    #[test]
    fn test_equity_url() {
        let url = NseSource::chain_url("M&M").unwrap();
        assert_eq!(url.path(), "/api/option-chain-equities");
        assert_eq!(url.query(), Some("symbol=M%26M"));
    }
}
