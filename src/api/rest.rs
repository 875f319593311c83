use crate::api::QuoteSource;
use crate::config::AlpacaConfig;
use crate::error::{Result, SurfaceError};
use crate::models::{OptionContract, RawQuote};
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

const PAGE_LIMIT: u32 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockTrade {
    pub t: DateTime<Utc>,
    #[serde(alias = "p")]
    pub price: f64,
    #[serde(alias = "s", default)]
    pub size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatestStockTradeResponse {
    pub symbol: String,
    pub trade: StockTrade,
}

// Alpaca returns strike and expiration as strings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractListing {
    pub symbol: String,
    pub expiration_date: String,
    pub strike_price: String,
    #[serde(rename = "type")]
    pub contract_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionContractsResponse {
    #[serde(rename = "option_contracts", default)]
    pub results: Vec<ContractListing>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionSnapshot {
    #[serde(rename = "impliedVolatility")]
    pub implied_volatility: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionSnapshotsResponse {
    #[serde(default)]
    pub snapshots: HashMap<String, OptionSnapshot>,
    pub next_page_token: Option<String>,
}

/// Alpaca market-data client serving spot and call chains
pub struct RestClient {
    client: reqwest::Client,
    config: AlpacaConfig,
}

impl RestClient {
    pub fn new(config: AlpacaConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("APCA-API-KEY-ID", &self.config.api_key)
            .header("APCA-API-SECRET-KEY", &self.config.api_secret)
    }

    /// GET a JSON document; transport, status and decode failures all mean
    /// the input is unavailable for this request
    async fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T> {
        debug!("GET {}", url);
        let resp = self.auth(self.client.get(url)).send().await.map_err(|e| {
            SurfaceError::InputUnavailableError(format!("Failed to get {}: {}", what, e))
        })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(SurfaceError::InputUnavailableError(format!(
                "{} request failed with status {}: {}",
                what, status, error_text
            )));
        }

        let resp_text = resp.text().await.map_err(|e| {
            SurfaceError::InputUnavailableError(format!("Failed to read {}: {}", what, e))
        })?;

        serde_json::from_str::<T>(&resp_text).map_err(|e| {
            SurfaceError::InputUnavailableError(format!("Failed to parse {}: {}", what, e))
        })
    }

    /// Latest trade for a stock or ETF
    pub async fn get_latest_stock_trade(&self, symbol: &str) -> Result<StockTrade> {
        let url = format!("{}/v2/stocks/{}/trades/latest", self.config.data_url, symbol);
        let data: LatestStockTradeResponse = self.get_json(&url, "latest stock trade").await?;
        Ok(data.trade)
    }

    /// All call contracts expiring on or after `from`, following pagination
    pub async fn get_call_contracts(
        &self,
        underlying_symbol: &str,
        from: NaiveDate,
    ) -> Result<Vec<ContractListing>> {
        info!("Getting call contracts for {} from {}", underlying_symbol, from);
        let mut contracts = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = format!(
                "{}/v2/options/contracts?underlying_symbols={}&type=call&expiration_date_gte={}&limit={}",
                self.config.paper_url,
                underlying_symbol,
                from.format("%Y-%m-%d"),
                PAGE_LIMIT
            );
            if let Some(token) = &page_token {
                url.push_str(&format!("&page_token={}", token));
            }

            let page: OptionContractsResponse = self.get_json(&url, "option contracts").await?;
            contracts.extend(page.results);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!("Got {} contracts for {}", contracts.len(), underlying_symbol);
        Ok(contracts)
    }

    /// Call snapshots for one expiration, keyed by OCC symbol
    pub async fn get_call_chain_snapshots(
        &self,
        underlying_symbol: &str,
        expiration: NaiveDate,
    ) -> Result<HashMap<String, OptionSnapshot>> {
        let mut snapshots = HashMap::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = format!(
                "{}/v1beta1/options/snapshots/{}?type=call&expiration_date={}&limit={}",
                self.config.data_url,
                underlying_symbol,
                expiration.format("%Y-%m-%d"),
                PAGE_LIMIT
            );
            if let Some(token) = &page_token {
                url.push_str(&format!("&page_token={}", token));
            }

            let page: OptionSnapshotsResponse =
                self.get_json(&url, "option chain snapshots").await?;
            snapshots.extend(page.snapshots);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(snapshots)
    }
}

impl QuoteSource for RestClient {
    async fn last_price(&self, ticker: &str) -> Result<f64> {
        let trade = self.get_latest_stock_trade(ticker).await?;
        info!("Latest {} trade: {} at {}", ticker, trade.price, trade.t);
        Ok(trade.price)
    }

    async fn expirations(&self, ticker: &str) -> Result<Vec<NaiveDate>> {
        let today = Utc::now().date_naive();
        let contracts = self.get_call_contracts(ticker, today).await?;

        let mut expirations: Vec<NaiveDate> = contracts
            .iter()
            .filter_map(|c| match NaiveDate::parse_from_str(&c.expiration_date, "%Y-%m-%d") {
                Ok(d) => Some(d),
                Err(e) => {
                    warn!("Bad expiration '{}' on {}: {}", c.expiration_date, c.symbol, e);
                    None
                }
            })
            .collect();
        expirations.sort_unstable();
        expirations.dedup();
        Ok(expirations)
    }

    async fn call_chain(&self, ticker: &str, expiration: NaiveDate) -> Result<Vec<RawQuote>> {
        let snapshots = self.get_call_chain_snapshots(ticker, expiration).await?;

        let mut rows: Vec<RawQuote> = snapshots
            .iter()
            .filter_map(|(occ, snap)| {
                let contract = OptionContract::from_occ_symbol(occ)?;
                if !contract.is_call() || contract.expiration != expiration {
                    return None;
                }
                snap.implied_volatility
                    .map(|iv| RawQuote::new(contract.strike, iv))
            })
            .collect();

        if rows.is_empty() {
            return Err(SurfaceError::InputUnavailableError(format!(
                "empty {} call chain for {}",
                ticker, expiration
            )));
        }

        // Snapshot maps are unordered; strike order keeps tie-breaks reproducible
        rows.sort_by(|a, b| a.strike.total_cmp(&b.strike));
        debug!(
            "{} {}: {} calls with IV out of {} snapshots",
            ticker,
            expiration,
            rows.len(),
            snapshots.len()
        );
        Ok(rows)
    }
}
