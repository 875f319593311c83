//! Market data collaborators
//!
//! The surface pipeline never performs I/O itself. These traits describe what
//! it needs from the outside world: a quote source for spot and option chains,
//! and a clock for the as-of date.

mod fixture;
mod rest;

pub use fixture::{StaticQuoteSource, TickerFixture};
pub use rest::RestClient;

use crate::error::Result;
use crate::models::RawQuote;
use chrono::NaiveDate;
use std::future::Future;

/// Source of spot prices and call-option chains for a ticker.
///
/// Failures (network, unknown ticker, empty chain) are reported as
/// [`crate::SurfaceError::InputUnavailableError`].
pub trait QuoteSource {
    /// Most recent trade price, in the feed's own quote scale
    fn last_price(&self, ticker: &str) -> impl Future<Output = Result<f64>> + Send;

    /// Listed expiration dates, in any order
    fn expirations(&self, ticker: &str) -> impl Future<Output = Result<Vec<NaiveDate>>> + Send;

    /// Call rows for one expiration
    fn call_chain(
        &self,
        ticker: &str,
        expiration: NaiveDate,
    ) -> impl Future<Output = Result<Vec<RawQuote>>> + Send;
}

pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date of the host
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// The `max` nearest expirations strictly after `today`, ascending
pub fn select_expirations(all: &[NaiveDate], today: NaiveDate, max: usize) -> Vec<NaiveDate> {
    let mut future: Vec<NaiveDate> = all.iter().copied().filter(|d| *d > today).collect();
    future.sort_unstable();
    future.dedup();
    future.truncate(max);
    future
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn selects_nearest_future_expirations() {
        let today = date(2026, 10, 19);
        let all = vec![
            date(2026, 11, 20),
            date(2026, 10, 19),
            date(2026, 10, 23),
            date(2026, 10, 30),
            date(2026, 10, 23),
            date(2026, 12, 18),
            date(2027, 1, 15),
            date(2026, 9, 30),
        ];
        assert_eq!(
            select_expirations(&all, today, 4),
            vec![
                date(2026, 10, 23),
                date(2026, 10, 30),
                date(2026, 11, 20),
                date(2026, 12, 18)
            ]
        );
    }

    #[test]
    fn nothing_after_today_selects_nothing() {
        let today = date(2026, 10, 19);
        assert!(select_expirations(&[today, date(2026, 1, 1)], today, 4).is_empty());
    }

    #[test]
    fn fixed_clock_reports_its_date() {
        assert_eq!(FixedClock(date(2026, 10, 19)).today(), date(2026, 10, 19));
    }
}
