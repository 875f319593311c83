use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionType {
    Call,
    Put,
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionType::Call => write!(f, "Call"),
            OptionType::Put => write!(f, "Put"),
        }
    }
}

/// One row of an option chain: a strike and the feed's implied volatility
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawQuote {
    pub strike: f64,
    pub implied_volatility: f64,
}

impl RawQuote {
    pub fn new(strike: f64, implied_volatility: f64) -> Self {
        Self {
            strike,
            implied_volatility,
        }
    }
}

/// All call rows quoted for one expiration date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainBatch {
    pub expiration: NaiveDate,
    pub rows: Vec<RawQuote>,
}

impl ChainBatch {
    pub fn new(expiration: NaiveDate, rows: Vec<RawQuote>) -> Self {
        Self { expiration, rows }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SpotSource {
    /// Operator-supplied override
    Manual,
    /// Last trade from the quote feed, scaled by the spot multiplier
    Feed,
}

impl std::fmt::Display for SpotSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpotSource::Manual => write!(f, "MANUAL"),
            SpotSource::Feed => write!(f, "FEED"),
        }
    }
}

/// Spot price with the single source that is authoritative for the request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotPrice {
    pub value: f64,
    pub source: SpotSource,
}

impl SpotPrice {
    pub fn manual(value: f64) -> Self {
        Self {
            value,
            source: SpotSource::Manual,
        }
    }

    /// Spot from a raw feed price, scaled onto the strike grid's quote scale
    pub fn from_feed(last_price: f64, multiplier: f64) -> Self {
        Self {
            value: last_price * multiplier,
            source: SpotSource::Feed,
        }
    }

    /// The operator override as an authoritative spot, if it is usable.
    /// Blank, zero, negative and non-finite input mean "no override", in which
    /// case the caller falls back to the feed; the two are never blended.
    pub fn manual_override(manual: Option<f64>) -> Option<Self> {
        manual.filter(|v| v.is_finite() && *v > 0.0).map(Self::manual)
    }
}

/// Option contract identity as encoded in an OCC symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    pub symbol: String,
    pub option_type: OptionType, // call vs put
    pub strike: f64,
    pub expiration: NaiveDate,
    pub option_symbol: String, // OCC format
}

impl OptionContract {
    pub fn new(symbol: String, option_type: OptionType, strike: f64, expiration: NaiveDate) -> Self {
        let option_symbol = Self::generate_occ_symbol(&symbol, option_type, strike, expiration);

        Self {
            symbol,
            option_type,
            strike,
            expiration,
            option_symbol,
        }
    }

    /// format: Symbol + YY + MM + DD + C/P + Strike
    /// e.g. GLD251121C00250000
    fn generate_occ_symbol(
        symbol: &str,
        option_type: OptionType,
        strike: f64,
        expiration: NaiveDate,
    ) -> String {
        let type_char = match option_type {
            OptionType::Call => 'C',
            OptionType::Put => 'P',
        };
        let strike_str = format!("{:08}", (strike * 1000.0).round() as u32);
        let date_str = expiration.format("%y%m%d").to_string();
        format!("{}{}{}{}", symbol, date_str, type_char, strike_str)
    }

    /// Parse OCC option symbol
    pub fn from_occ_symbol(occ_symbol: &str) -> Option<Self> {
        trace!("Parsing OCC symbol: {}", occ_symbol);

        // The strike is always the last 8 digits and the type flag sits right before it,
        // which keeps underlyings containing 'C' or 'P' parseable.
        if !occ_symbol.is_ascii() || occ_symbol.len() < 15 {
            warn!("OCC symbol too short: {}", occ_symbol);
            return None;
        }
        let type_pos = occ_symbol.len() - 9;

        let option_type = match &occ_symbol[type_pos..type_pos + 1] {
            "C" => OptionType::Call,
            "P" => OptionType::Put,
            _ => {
                warn!("Invalid option type character in OCC symbol: {}", occ_symbol);
                return None;
            }
        };

        let symbol = occ_symbol[..(type_pos - 6)].to_string();
        if symbol.is_empty() {
            warn!("Missing underlying in OCC symbol: {}", occ_symbol);
            return None;
        }
        let date_str = &occ_symbol[(type_pos - 6)..type_pos];
        let strike_str = &occ_symbol[(type_pos + 1)..];

        trace!("Extracted symbol: {}, date_str: {}", symbol, date_str);

        // Parse the strike price (divide by 1000 to convert from integer to decimal)
        let strike = match strike_str.parse::<u32>() {
            Ok(s) => s as f64 / 1000.0,
            Err(e) => {
                warn!("Failed to parse strike price '{}' in OCC symbol {}: {}", strike_str, occ_symbol, e);
                return None;
            }
        };

        let expiration = match NaiveDate::parse_from_str(date_str, "%y%m%d") {
            Ok(d) => d,
            Err(e) => {
                warn!("Invalid date '{}' in OCC symbol {}: {}", date_str, occ_symbol, e);
                return None;
            }
        };

        trace!(
            "Parsed OCC symbol: {} -> symbol={}, type={:?}, strike={}, expiration={}",
            occ_symbol, symbol, option_type, strike, expiration
        );

        Some(Self {
            symbol,
            option_type,
            strike,
            expiration,
            option_symbol: occ_symbol.to_string(),
        })
    }

    pub fn is_call(&self) -> bool {
        self.option_type == OptionType::Call
    }

    pub fn is_put(&self) -> bool {
        self.option_type == OptionType::Put
    }
}
