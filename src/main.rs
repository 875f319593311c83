//! Command-line front end for live-volsurf
//!
//! Runs one surface refresh and prints the metric readout:
//!
//! ```text
//! live-volsurf [TICKER] [--spot PX] [--fixture PATH] [--as-of YYYY-MM-DD] [--json]
//! ```
//!
//! Without `--fixture` the Alpaca feed is used and `ALPACA_API_KEY` /
//! `ALPACA_API_SECRET` must be set. `--as-of` replaces the local date, e.g.
//! `--fixture demos/gld_fixture.json --as-of 2026-10-19` replays the recorded chain.

use chrono::NaiveDate;
use live_volsurf::api::{
    Clock, FixedClock, QuoteSource, RestClient, StaticQuoteSource, SystemClock,
};
use live_volsurf::config::Config;
use live_volsurf::error::{Result, SurfaceError};
use live_volsurf::service::SurfaceService;
use tracing::{info, warn};

struct Args {
    ticker: Option<String>,
    manual_spot: Option<f64>,
    fixture: Option<String>,
    as_of: Option<NaiveDate>,
    json: bool,
}

fn parse_args(raw_args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut args = Args {
        ticker: None,
        manual_spot: None,
        fixture: None,
        as_of: None,
        json: false,
    };

    let mut it = raw_args.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--spot" => {
                let raw = it
                    .next()
                    .ok_or_else(|| SurfaceError::ParseError("--spot needs a value".to_string()))?;
                let value = raw.parse::<f64>().map_err(|e| {
                    SurfaceError::ParseError(format!("invalid --spot '{}': {}", raw, e))
                })?;
                args.manual_spot = Some(value);
            }
            "--fixture" => {
                args.fixture = Some(it.next().ok_or_else(|| {
                    SurfaceError::ParseError("--fixture needs a path".to_string())
                })?);
            }
            "--as-of" => {
                let raw = it.next().ok_or_else(|| {
                    SurfaceError::ParseError("--as-of needs a YYYY-MM-DD date".to_string())
                })?;
                let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| {
                    SurfaceError::ParseError(format!("invalid --as-of '{}': {}", raw, e))
                })?;
                args.as_of = Some(date);
            }
            "--json" => args.json = true,
            flag if flag.starts_with("--") => {
                return Err(SurfaceError::ParseError(format!("unknown flag {}", flag)));
            }
            ticker => args.ticker = Some(ticker.to_uppercase()),
        }
    }

    Ok(args)
}

async fn run<S: QuoteSource, C: Clock>(
    service: SurfaceService<S, C>,
    ticker: &str,
    args: &Args,
) -> Result<()> {
    match service.refresh(ticker, args.manual_spot).await {
        Ok(snapshot) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
                return Ok(());
            }

            let surface = service.config();
            let tone = surface.tone.classify(snapshot.metrics.skew);
            let (lo, hi) = snapshot.grid.z_range();
            println!(
                "{} surface as of {}: {} quotes, {}x{} grid, IV {:.2}%..{:.2}%",
                ticker,
                snapshot.as_of,
                snapshot.observations.len(),
                snapshot.grid.shape().0,
                snapshot.grid.shape().1,
                lo * 100.0,
                hi * 100.0
            );
            for line in snapshot.metrics.summary_lines(surface.otm_offset) {
                println!("{}", line);
            }
            println!("TONE: {:?} {}", tone, tone.hex());
            Ok(())
        }
        Err(e) => {
            warn!("Refresh failed ({}): {}", e.kind(), e);
            println!("DATA ERROR: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run_with<S: QuoteSource>(
    source: S,
    config: &Config,
    ticker: &str,
    args: &Args,
) -> Result<()> {
    match args.as_of {
        Some(date) => {
            info!("Pinning as-of date to {}", date);
            let service = SurfaceService::new(
                source,
                FixedClock(date),
                config.surface.clone(),
                config.fetch_timeout(),
            );
            run(service, ticker, args).await
        }
        None => {
            let service = SurfaceService::new(
                source,
                SystemClock,
                config.surface.clone(),
                config.fetch_timeout(),
            );
            run(service, ticker, args).await
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    config.init_logging()?;

    let args = parse_args(std::env::args().skip(1))?;
    let ticker = args.ticker.clone().unwrap_or_else(|| config.ticker.clone());
    info!("Starting live-volsurf for {}", ticker);

    match &args.fixture {
        Some(path) => {
            let source = StaticQuoteSource::from_json_file(path)?;
            run_with(source, &config, &ticker, &args).await
        }
        None => {
            let client = RestClient::new(config.require_alpaca()?.clone());
            run_with(client, &config, &ticker, &args).await
        }
    }
}
