//! # live-volsurf
//!
//! Implied-volatility surface and skew analytics for a live option chain.
//!
//! ## Features
//!
//! - Normalisation of raw call chains into a (days-to-expiry, strike, IV) cloud
//!   inside a moneyness band around spot
//! - Exact radial-basis-function fit of that cloud, sampled on a regular grid
//! - At-the-money vol, fixed-offset skew and a bullish/neutral/bearish regime
//! - Alpaca market-data client and an in-memory fixture source
//! - Environment-based configuration
//!
//! ## Example
//!
//! ```rust,no_run
//! use live_volsurf::api::{RestClient, SystemClock};
//! use live_volsurf::config::Config;
//! use live_volsurf::service::SurfaceService;
//!
//! #[tokio::main]
//! async fn main() -> live_volsurf::error::Result<()> {
//!     let config = Config::from_env()?;
//!     config.init_logging()?;
//!
//!     let client = RestClient::new(config.require_alpaca()?.clone());
//!     let service = SurfaceService::new(
//!         client,
//!         SystemClock,
//!         config.surface.clone(),
//!         config.fetch_timeout(),
//!     );
//!
//!     let snapshot = service.refresh(&config.ticker, None).await?;
//!     for line in snapshot.metrics.summary_lines(config.surface.otm_offset) {
//!         println!("{}", line);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod assembler;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod utils;

// Re-export commonly used types
pub use api::{QuoteSource, RestClient, StaticQuoteSource};
pub use assembler::{SurfaceAssembler, SurfaceSnapshot};
pub use config::{Config, SurfaceConfig};
pub use error::{Result, SurfaceError};
pub use service::SurfaceService;
