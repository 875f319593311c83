use crate::error::{Result, SurfaceError};
use crate::models::{RegimeThresholds, ToneThresholds};
use crate::utils::RbfKernel;
use dotenv::dotenv;
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Configuration for the Alpaca API
#[derive(Debug, Clone, Deserialize)]
pub struct AlpacaConfig {
    /// Alpaca API key
    pub api_key: String,
    /// Alpaca API secret
    pub api_secret: String,
    /// Alpaca API data URL
    pub data_url: String,
    /// Alpaca trading API URL, used for contract listings
    pub paper_url: String,
}

/// Parameters of the surface pipeline.
///
/// The defaults reproduce the gold-options desk setup: GLD strikes scaled by
/// `10.885` onto the futures quote, a ±15% moneyness band, the four nearest
/// expirations and a 30×30 evaluation grid.
#[derive(Debug, Clone, Deserialize)]
pub struct SurfaceConfig {
    /// Multiplier mapping the chain's strike scale onto the spot's quote scale
    pub spot_multiplier: f64,
    /// Half-width of the moneyness band, relative to spot
    pub moneyness_band: f64,
    /// Number of future expirations to sample
    pub max_expirations: usize,
    /// Points per axis of the evaluated grid
    pub grid_size: usize,
    /// Absolute strike offset above spot used as the skew wing
    pub otm_offset: f64,
    pub kernel: RbfKernel,
    pub regime: RegimeThresholds,
    pub tone: ToneThresholds,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            spot_multiplier: 10.885,
            moneyness_band: 0.15,
            max_expirations: 4,
            grid_size: 30,
            otm_offset: 300.0,
            kernel: RbfKernel::Linear,
            regime: RegimeThresholds::default(),
            tone: ToneThresholds::default(),
        }
    }
}

impl SurfaceConfig {
    /// Read surface parameters from the environment, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = SurfaceConfig {
            spot_multiplier: env_or("SPOT_MULTIPLIER", defaults.spot_multiplier)?,
            moneyness_band: env_or("MONEYNESS_BAND", defaults.moneyness_band)?,
            max_expirations: env_or("MAX_EXPIRATIONS", defaults.max_expirations)?,
            grid_size: env_or("GRID_SIZE", defaults.grid_size)?,
            otm_offset: env_or("OTM_OFFSET", defaults.otm_offset)?,
            kernel: env_or("RBF_KERNEL", defaults.kernel)?,
            regime: RegimeThresholds {
                bearish_above: env_or("REGIME_BEARISH_ABOVE", defaults.regime.bearish_above)?,
                bullish_below: env_or("REGIME_BULLISH_BELOW", defaults.regime.bullish_below)?,
            },
            tone: ToneThresholds {
                red_above: env_or("TONE_RED_ABOVE", defaults.tone.red_above)?,
                green_below: env_or("TONE_GREEN_BELOW", defaults.tone.green_below)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.spot_multiplier.is_finite() && self.spot_multiplier > 0.0) {
            return Err(SurfaceError::ConfigError(format!(
                "spot multiplier must be positive, got {}",
                self.spot_multiplier
            )));
        }
        if !(self.moneyness_band > 0.0 && self.moneyness_band < 1.0) {
            return Err(SurfaceError::ConfigError(format!(
                "moneyness band must lie in (0, 1), got {}",
                self.moneyness_band
            )));
        }
        if self.max_expirations == 0 {
            return Err(SurfaceError::ConfigError(
                "at least one expiration must be sampled".to_string(),
            ));
        }
        if self.grid_size < 2 {
            return Err(SurfaceError::ConfigError(format!(
                "grid size must be at least 2, got {}",
                self.grid_size
            )));
        }
        if !self.otm_offset.is_finite() {
            return Err(SurfaceError::ConfigError(
                "OTM offset must be finite".to_string(),
            ));
        }
        let thresholds = [
            self.regime.bearish_above,
            self.regime.bullish_below,
            self.tone.red_above,
            self.tone.green_below,
        ];
        if thresholds.iter().any(|t| !t.is_finite()) {
            return Err(SurfaceError::ConfigError(
                "skew thresholds must be finite".to_string(),
            ));
        }
        if self.regime.bullish_below > self.regime.bearish_above {
            return Err(SurfaceError::ConfigError(
                "regime thresholds are inverted".to_string(),
            ));
        }
        if self.tone.green_below > self.tone.red_above {
            return Err(SurfaceError::ConfigError(
                "display tone thresholds are inverted".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for the application
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Alpaca credentials; absent when no key pair is set
    pub alpaca: Option<AlpacaConfig>,
    /// Underlying to build the surface for
    pub ticker: String,
    /// Log level
    pub log_level: String,
    /// Upper bound on the time spent fetching one snapshot
    pub fetch_timeout_secs: u64,
    pub surface: SurfaceConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let default_data_url = "https://data.alpaca.markets".to_string();
        let default_paper_url = "https://paper-api.alpaca.markets".to_string();

        let alpaca = match (env::var("ALPACA_API_KEY"), env::var("ALPACA_API_SECRET")) {
            (Ok(api_key), Ok(api_secret)) => Some(AlpacaConfig {
                api_key,
                api_secret,
                data_url: env::var("ALPACA_DATA_URL").unwrap_or(default_data_url),
                paper_url: env::var("ALPACA_PAPER_URL").unwrap_or(default_paper_url),
            }),
            (Ok(_), Err(_)) => {
                return Err(SurfaceError::ConfigError(
                    "ALPACA_API_SECRET environment variable not set".to_string(),
                ))
            }
            _ => None,
        };

        Ok(Config {
            alpaca,
            ticker: env::var("SURFACE_TICKER").unwrap_or_else(|_| "GLD".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            fetch_timeout_secs: env_or("FETCH_TIMEOUT_SECS", 30)?,
            surface: SurfaceConfig::from_env()?,
        })
    }

    /// Alpaca credentials, or a configuration error naming the missing key
    pub fn require_alpaca(&self) -> Result<&AlpacaConfig> {
        self.alpaca.as_ref().ok_or_else(|| {
            SurfaceError::ConfigError("ALPACA_API_KEY environment variable not set".to_string())
        })
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Initialize logging based on configuration
    pub fn init_logging(&self) -> Result<()> {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.log_level));

        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .map_err(|e| SurfaceError::ConfigError(format!("Failed to init logging: {}", e)))?;

        Ok(())
    }
}

fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|e| {
            SurfaceError::ConfigError(format!("{} has invalid value '{}': {}", name, raw, e))
        }),
        Err(_) => Ok(default),
    }
}
