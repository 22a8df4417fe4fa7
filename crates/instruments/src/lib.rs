//! A time-bounded cache of the broker's tradable-instrument catalog.
//!
//! The catalog is large and changes rarely, so it is fetched at most once per
//! refresh interval and replaced wholesale. A failed refresh keeps the
//! previous catalog queryable (stale-but-available) and is never raised to
//! the caller.

use std::sync::Arc;

use broker_client::Broker;
use chrono::{DateTime, Duration, Utc};
use core_types::{Instrument, split_symbol};
use tokio::sync::Mutex;

pub mod error;

pub use error::{Error, Result};

#[derive(Debug, Default)]
struct CacheState {
    instruments: Vec<Instrument>,
    last_updated: Option<DateTime<Utc>>,
}

pub struct InstrumentCache {
    broker: Arc<dyn Broker>,
    refresh_interval: Duration,
    // An async mutex held across the catalog fetch: concurrent stale-triggering
    // callers queue behind the one in-flight refresh instead of duplicating it.
    state: Mutex<CacheState>,
}

impl InstrumentCache {
    pub fn new(broker: Arc<dyn Broker>, refresh_interval: Duration) -> Self {
        Self {
            broker,
            refresh_interval,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Refreshes the catalog when it has never been fetched or has aged past
    /// the refresh interval. Broker failures are logged and swallowed;
    /// staleness is preserved for the next attempt.
    pub async fn refresh_if_stale(&self, access_token: &str) {
        let mut state = self.state.lock().await;
        self.refresh_locked(&mut state, access_token).await;
    }

    async fn refresh_locked(&self, state: &mut CacheState, access_token: &str) {
        let stale = state
            .last_updated
            .is_none_or(|at| Utc::now() - at >= self.refresh_interval);
        if !stale {
            return;
        }

        match self.broker.list_instruments(access_token).await {
            Ok(instruments) => {
                tracing::info!(count = instruments.len(), "Instrument catalog refreshed");
                state.instruments = instruments;
                state.last_updated = Some(Utc::now());
            }
            Err(e) => {
                tracing::warn!(error = %e, "Instrument catalog refresh failed; keeping stale data");
            }
        }
    }

    /// Resolves an `EXCHANGE:TRADINGSYMBOL` string to its instrument token.
    ///
    /// Matching is case-sensitive and exact on both parts; the first catalog
    /// entry wins. Malformed symbols (no delimiter) fail the same way an
    /// unknown symbol does.
    pub async fn resolve(&self, symbol: &str, access_token: &str) -> Result<u32> {
        let mut state = self.state.lock().await;
        self.refresh_locked(&mut state, access_token).await;

        let (exchange, tradingsymbol) =
            split_symbol(symbol).ok_or_else(|| Error::SymbolNotFound(symbol.to_string()))?;

        state
            .instruments
            .iter()
            .find(|i| i.exchange == exchange && i.tradingsymbol == tradingsymbol)
            .map(|i| i.instrument_token)
            .ok_or_else(|| Error::SymbolNotFound(symbol.to_string()))
    }

    /// Finds the first instrument whose trading symbol matches `query`
    /// case-insensitively, regardless of exchange.
    pub async fn search(&self, query: &str, access_token: &str) -> Result<Instrument> {
        let mut state = self.state.lock().await;
        self.refresh_locked(&mut state, access_token).await;

        state
            .instruments
            .iter()
            .find(|i| i.tradingsymbol.eq_ignore_ascii_case(query))
            .cloned()
            .ok_or_else(|| Error::InstrumentNotFound(query.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use broker_client::{
        BrokerSession, MarginOrderParams, ModifyOrderParams, OrderParams,
        error::Error as BrokerError,
    };
    use core_types::{Candle, LtpQuote, OhlcQuote, OrderRecord, Position, Quote};
    use rust_decimal::Decimal;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// A broker that only serves the instrument catalog, counting fetches.
    struct CatalogBroker {
        catalog: Vec<Instrument>,
        fetches: AtomicUsize,
        failing: AtomicBool,
    }

    impl CatalogBroker {
        fn new(catalog: Vec<Instrument>) -> Self {
            Self {
                catalog,
                fetches: AtomicUsize::new(0),
                failing: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl Broker for CatalogBroker {
        fn login_url(&self) -> String {
            unimplemented!()
        }
        async fn exchange_session(&self, _: &str) -> broker_client::Result<BrokerSession> {
            unimplemented!()
        }
        async fn list_instruments(&self, _: &str) -> broker_client::Result<Vec<Instrument>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(BrokerError::Api {
                    status: 503,
                    message: "instrument dump unavailable".to_string(),
                });
            }
            Ok(self.catalog.clone())
        }
        async fn quote(
            &self,
            _: &str,
            _: &[String],
        ) -> broker_client::Result<HashMap<String, Quote>> {
            unimplemented!()
        }
        async fn ltp(
            &self,
            _: &str,
            _: &[String],
        ) -> broker_client::Result<HashMap<String, LtpQuote>> {
            unimplemented!()
        }
        async fn ohlc(
            &self,
            _: &str,
            _: &[String],
        ) -> broker_client::Result<HashMap<String, OhlcQuote>> {
            unimplemented!()
        }
        async fn historical_candles(
            &self,
            _: &str,
            _: u32,
            _: chrono::NaiveDate,
            _: chrono::NaiveDate,
            _: &str,
        ) -> broker_client::Result<Vec<Candle>> {
            unimplemented!()
        }
        async fn place_order(&self, _: &str, _: &OrderParams) -> broker_client::Result<String> {
            unimplemented!()
        }
        async fn modify_order(
            &self,
            _: &str,
            _: &str,
            _: &str,
            _: &ModifyOrderParams,
        ) -> broker_client::Result<String> {
            unimplemented!()
        }
        async fn cancel_order(&self, _: &str, _: &str, _: &str) -> broker_client::Result<String> {
            unimplemented!()
        }
        async fn list_orders(&self, _: &str) -> broker_client::Result<Vec<OrderRecord>> {
            unimplemented!()
        }
        async fn list_positions(&self, _: &str) -> broker_client::Result<Vec<Position>> {
            unimplemented!()
        }
        async fn estimate_margin(
            &self,
            _: &str,
            _: &MarginOrderParams,
        ) -> broker_client::Result<Decimal> {
            unimplemented!()
        }
    }

    fn sample_catalog() -> Vec<Instrument> {
        vec![
            Instrument {
                instrument_token: 408065,
                tradingsymbol: "INFY".to_string(),
                exchange: "NSE".to_string(),
                lot_size: 1,
            },
            Instrument {
                instrument_token: 738561,
                tradingsymbol: "RELIANCE".to_string(),
                exchange: "NSE".to_string(),
                lot_size: 1,
            },
        ]
    }

    #[tokio::test]
    async fn resolves_within_interval_share_one_fetch() {
        let broker = Arc::new(CatalogBroker::new(sample_catalog()));
        let cache = InstrumentCache::new(broker.clone(), Duration::hours(24));

        assert_eq!(cache.resolve("NSE:INFY", "tok").await.unwrap(), 408065);
        assert_eq!(cache.resolve("NSE:RELIANCE", "tok").await.unwrap(), 738561);
        assert_eq!(broker.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_catalog() {
        let broker = Arc::new(CatalogBroker::new(sample_catalog()));
        // Zero interval: every call is a stale-triggering call.
        let cache = InstrumentCache::new(broker.clone(), Duration::zero());

        assert!(cache.resolve("NSE:INFY", "tok").await.is_ok());
        broker.failing.store(true, Ordering::SeqCst);

        // The refresh attempt fails, but the old catalog still answers.
        assert_eq!(cache.resolve("NSE:INFY", "tok").await.unwrap(), 408065);
        assert_eq!(broker.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn malformed_and_unknown_symbols_fail() {
        let broker = Arc::new(CatalogBroker::new(sample_catalog()));
        let cache = InstrumentCache::new(broker, Duration::hours(24));

        assert!(matches!(
            cache.resolve("INFY", "tok").await,
            Err(Error::SymbolNotFound(_))
        ));
        assert!(matches!(
            cache.resolve("NSE:NONEXISTENT", "tok").await,
            Err(Error::SymbolNotFound(_))
        ));
    }

    #[tokio::test]
    async fn resolve_is_case_sensitive_but_search_is_not() {
        let broker = Arc::new(CatalogBroker::new(sample_catalog()));
        let cache = InstrumentCache::new(broker, Duration::hours(24));

        assert!(cache.resolve("NSE:infy", "tok").await.is_err());

        let hit = cache.search("reliance", "tok").await.unwrap();
        assert_eq!(hit.tradingsymbol, "RELIANCE");
        assert!(cache.search("GONE", "tok").await.is_err());
    }
}
