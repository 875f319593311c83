//! Request orchestration around the pure surface pipeline: fetch, resolve
//! spot, select expirations, then assemble.

use crate::api::{select_expirations, Clock, QuoteSource};
use crate::assembler::{SurfaceAssembler, SurfaceSnapshot};
use crate::config::SurfaceConfig;
use crate::error::{Result, SurfaceError};
use crate::models::{ChainBatch, SpotPrice};
use chrono::NaiveDate;
use dashmap::DashMap;
use futures::future::try_join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub struct SurfaceService<S, C> {
    source: S,
    clock: C,
    config: SurfaceConfig,
    assembler: SurfaceAssembler,
    fetch_timeout: Duration,
    // one refresh per ticker at a time
    in_flight: DashMap<String, Arc<Mutex<()>>>,
}

impl<S: QuoteSource, C: Clock> SurfaceService<S, C> {
    pub fn new(source: S, clock: C, config: SurfaceConfig, fetch_timeout: Duration) -> Self {
        let assembler = SurfaceAssembler::from_config(&config);
        Self {
            source,
            clock,
            config,
            assembler,
            fetch_timeout,
            in_flight: DashMap::new(),
        }
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    /// Recompute the whole surface for `ticker` from a fresh snapshot.
    ///
    /// Concurrent refreshes of the same ticker are serialised; different
    /// tickers proceed independently.
    pub async fn refresh(&self, ticker: &str, manual_spot: Option<f64>) -> Result<SurfaceSnapshot> {
        let guard = self
            .in_flight
            .entry(ticker.to_uppercase())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _lock = guard.lock().await;

        let as_of = self.clock.today();
        info!("Refreshing {} surface as of {}", ticker, as_of);

        let (spot, batches) = tokio::time::timeout(
            self.fetch_timeout,
            self.fetch(ticker, as_of, manual_spot),
        )
        .await
        .map_err(|_| {
            warn!("Fetch for {} exceeded {:?}", ticker, self.fetch_timeout);
            SurfaceError::InputUnavailableError(format!(
                "timed out after {:?} fetching {} market data",
                self.fetch_timeout, ticker
            ))
        })??;

        self.assembler.assemble(&batches, as_of, spot)
    }

    async fn fetch(
        &self,
        ticker: &str,
        as_of: NaiveDate,
        manual_spot: Option<f64>,
    ) -> Result<(SpotPrice, Vec<ChainBatch>)> {
        // The feed is only consulted when there is no usable override
        let spot = match SpotPrice::manual_override(manual_spot) {
            Some(spot) => spot,
            None => SpotPrice::from_feed(
                self.source.last_price(ticker).await?,
                self.config.spot_multiplier,
            ),
        };
        debug!("Spot for {}: {:.2} ({})", ticker, spot.value, spot.source);

        let listed = self.source.expirations(ticker).await?;
        let expirations = select_expirations(&listed, as_of, self.config.max_expirations);
        if expirations.is_empty() {
            return Err(SurfaceError::InputUnavailableError(format!(
                "no {} expirations after {}",
                ticker, as_of
            )));
        }
        debug!("Using expirations {:?}", expirations);

        let batches = try_join_all(expirations.into_iter().map(|expiration| async move {
            let rows = self.source.call_chain(ticker, expiration).await?;
            Ok::<_, SurfaceError>(ChainBatch::new(expiration, rows))
        }))
        .await?;

        Ok((spot, batches))
    }
}
