use crate::api::QuoteSource;
use crate::error::{Result, SurfaceError};
use crate::models::{ChainBatch, RawQuote};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Recorded market state for one ticker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerFixture {
    pub last_price: f64,
    pub chains: Vec<ChainBatch>,
}

/// In-memory quote source, e.g. a snapshot captured from a live session
#[derive(Debug, Clone, Default)]
pub struct StaticQuoteSource {
    tickers: HashMap<String, TickerFixture>,
}

impl StaticQuoteSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ticker(mut self, ticker: &str, fixture: TickerFixture) -> Self {
        self.tickers.insert(ticker.to_uppercase(), fixture);
        self
    }

    /// Load a `{ "TICKER": { "last_price": .., "chains": [..] } }` JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let parsed: HashMap<String, TickerFixture> = serde_json::from_str(&raw)?;
        info!("Loaded {} ticker fixture(s) from {:?}", parsed.len(), path);

        let tickers = parsed
            .into_iter()
            .map(|(k, v)| (k.to_uppercase(), v))
            .collect();
        Ok(Self { tickers })
    }

    fn ticker(&self, ticker: &str) -> Result<&TickerFixture> {
        self.tickers.get(&ticker.to_uppercase()).ok_or_else(|| {
            SurfaceError::InputUnavailableError(format!("unknown ticker {}", ticker))
        })
    }
}

impl QuoteSource for StaticQuoteSource {
    async fn last_price(&self, ticker: &str) -> Result<f64> {
        Ok(self.ticker(ticker)?.last_price)
    }

    async fn expirations(&self, ticker: &str) -> Result<Vec<NaiveDate>> {
        Ok(self.ticker(ticker)?.chains.iter().map(|c| c.expiration).collect())
    }

    async fn call_chain(&self, ticker: &str, expiration: NaiveDate) -> Result<Vec<RawQuote>> {
        self.ticker(ticker)?
            .chains
            .iter()
            .find(|c| c.expiration == expiration)
            .map(|c| c.rows.clone())
            .ok_or_else(|| {
                SurfaceError::InputUnavailableError(format!(
                    "no {} chain for expiration {}",
                    ticker, expiration
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_ticker_is_input_unavailable() {
        let source = StaticQuoteSource::new();
        assert!(matches!(
            source.last_price("XYZ").await,
            Err(SurfaceError::InputUnavailableError(_))
        ));
    }

    #[tokio::test]
    async fn serves_recorded_chain() {
        let exp = NaiveDate::from_ymd_opt(2026, 10, 23).unwrap();
        let source = StaticQuoteSource::new().with_ticker(
            "gld",
            TickerFixture {
                last_price: 380.0,
                chains: vec![ChainBatch::new(exp, vec![RawQuote::new(380.0, 0.18)])],
            },
        );
        assert_eq!(source.last_price("GLD").await.unwrap(), 380.0);
        assert_eq!(source.expirations("GLD").await.unwrap(), vec![exp]);
        assert_eq!(source.call_chain("GLD", exp).await.unwrap().len(), 1);
        assert!(source
            .call_chain("GLD", exp.succ_opt().unwrap())
            .await
            .is_err());
    }

    #[test]
    fn loads_json_fixture_with_case_insensitive_tickers() {
        let raw = r#"{
            "gld": {
                "last_price": 380.0,
                "chains": [
                    { "expiration": "2026-10-23",
                      "rows": [ { "strike": 380.0, "implied_volatility": 0.18 } ] }
                ]
            }
        }"#;
        let path = std::env::temp_dir().join(format!("live-volsurf-{}.json", std::process::id()));
        std::fs::write(&path, raw).unwrap();
        let source = StaticQuoteSource::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let fixture = source.ticker("GLD").unwrap();
        assert_eq!(fixture.chains[0].rows[0].implied_volatility, 0.18);
    }
}
