use std::collections::HashMap;

use app_config::types::KiteSettings;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use core_types::{Candle, Instrument, LtpQuote, OhlcQuote, OrderRecord, Position, Quote};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

pub mod error;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use types::*;

/// The minimal contract this gateway needs from the trading broker.
///
/// `KiteClient` is the production implementation; tests substitute scripted
/// implementations behind `Arc<dyn Broker>`.
#[async_trait]
pub trait Broker: Send + Sync {
    /// The browser URL a user visits to start the login flow.
    fn login_url(&self) -> String;

    /// Exchanges a one-time request token for an access token.
    async fn exchange_session(&self, request_token: &str) -> Result<BrokerSession>;

    /// Fetches the full tradable-instrument catalog.
    async fn list_instruments(&self, access_token: &str) -> Result<Vec<Instrument>>;

    /// Fetches full market quotes for the given `EXCHANGE:TRADINGSYMBOL` keys.
    async fn quote(&self, access_token: &str, symbols: &[String])
    -> Result<HashMap<String, Quote>>;

    /// Fetches last-traded prices for the given symbols.
    async fn ltp(&self, access_token: &str, symbols: &[String])
    -> Result<HashMap<String, LtpQuote>>;

    /// Fetches OHLC snapshots for the given symbols.
    async fn ohlc(
        &self,
        access_token: &str,
        symbols: &[String],
    ) -> Result<HashMap<String, OhlcQuote>>;

    /// Fetches historical candles for one instrument.
    async fn historical_candles(
        &self,
        access_token: &str,
        instrument_token: u32,
        from: NaiveDate,
        to: NaiveDate,
        interval: &str,
    ) -> Result<Vec<Candle>>;

    /// Places a new order; returns the broker-assigned order id.
    async fn place_order(&self, access_token: &str, params: &OrderParams) -> Result<String>;

    /// Modifies a pending order.
    async fn modify_order(
        &self,
        access_token: &str,
        variety: &str,
        order_id: &str,
        params: &ModifyOrderParams,
    ) -> Result<String>;

    /// Cancels a pending order.
    async fn cancel_order(&self, access_token: &str, variety: &str, order_id: &str)
    -> Result<String>;

    /// Lists the day's order book.
    async fn list_orders(&self, access_token: &str) -> Result<Vec<OrderRecord>>;

    /// Lists net positions.
    async fn list_positions(&self, access_token: &str) -> Result<Vec<Position>>;

    /// Estimates the margin required for the described order.
    async fn estimate_margin(
        &self,
        access_token: &str,
        params: &MarginOrderParams,
    ) -> Result<Decimal>;
}

/// HTTP client for the Kite Connect REST API.
pub struct KiteClient {
    http_client: reqwest::Client,
    api_key: String,
    api_secret: String,
    base_url: String,
    login_base_url: String,
}

impl KiteClient {
    /// Constructs a new KiteClient from KiteSettings.
    pub fn new(settings: &KiteSettings) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::ClientBuildError(e.to_string()))?;
        Ok(KiteClient {
            http_client,
            api_key: settings.api_key.clone(),
            api_secret: settings.api_secret.clone(),
            base_url: settings.rest_base_url.clone(),
            login_base_url: settings.login_base_url.clone(),
        })
    }

    fn auth_header(&self, access_token: &str) -> String {
        format!("token {}:{}", self.api_key, access_token)
    }

    /// Reads a Kite response, unwrapping the `{status, data}` envelope and
    /// turning error bodies into `Error::Api` carrying the broker's message.
    async fn unwrap_envelope(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let text = response.text().await.map_err(Error::RequestFailed)?;
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

        if !status.is_success() {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .map_or_else(|| text.clone(), str::to_string);
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        body.get("data").cloned().ok_or(Error::Api {
            status: status.as_u16(),
            message: "broker response carried no data".to_string(),
        })
    }

    async fn get_data(
        &self,
        access_token: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http_client
            .get(&url)
            .query(query)
            .header("X-Kite-Version", "3")
            .header("Authorization", self.auth_header(access_token))
            .send()
            .await
            .map_err(Error::RequestFailed)?;
        Self::unwrap_envelope(response).await
    }

    /// Fetches one of the three quote variants, all of which share the
    /// repeated-`i`-parameter query shape.
    async fn quote_endpoint<T: serde::de::DeserializeOwned>(
        &self,
        access_token: &str,
        path: &str,
        symbols: &[String],
    ) -> Result<HashMap<String, T>> {
        let query: Vec<(&str, String)> = symbols.iter().map(|s| ("i", s.clone())).collect();
        let data = self.get_data(access_token, path, &query).await?;
        serde_json::from_value(data).map_err(Error::DeserializationFailed)
    }
}

#[async_trait]
impl Broker for KiteClient {
    fn login_url(&self) -> String {
        format!("{}?v=3&api_key={}", self.login_base_url, self.api_key)
    }

    async fn exchange_session(&self, request_token: &str) -> Result<BrokerSession> {
        // checksum = sha256(api_key + request_token + api_secret)
        let mut hasher = Sha256::new();
        hasher.update(format!("{}{}{}", self.api_key, request_token, self.api_secret).as_bytes());
        let checksum = format!("{:x}", hasher.finalize());

        let params = [
            ("api_key", self.api_key.as_str()),
            ("request_token", request_token),
            ("checksum", checksum.as_str()),
        ];

        let response = self
            .http_client
            .post(format!("{}/session/token", self.base_url))
            .header("X-Kite-Version", "3")
            .form(&params)
            .send()
            .await
            .map_err(Error::RequestFailed)?;

        let data = match Self::unwrap_envelope(response).await {
            Ok(data) => data,
            Err(Error::Api { message, .. }) => return Err(Error::Auth(message)),
            Err(e) => return Err(e),
        };

        serde_json::from_value(data).map_err(Error::DeserializationFailed)
    }

    async fn list_instruments(&self, access_token: &str) -> Result<Vec<Instrument>> {
        let url = format!("{}/instruments", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .header("X-Kite-Version", "3")
            .header("Authorization", self.auth_header(access_token))
            .send()
            .await
            .map_err(Error::RequestFailed)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let csv_data = response.text().await.map_err(Error::RequestFailed)?;
        let mut reader = csv::Reader::from_reader(csv_data.as_bytes());
        let mut instruments = Vec::new();
        let mut error_count = 0usize;
        for row in reader.deserialize::<InstrumentCsvRow>() {
            match row {
                Ok(row) => instruments.push(Instrument {
                    instrument_token: row.instrument_token,
                    tradingsymbol: row.tradingsymbol,
                    exchange: row.exchange,
                    lot_size: row.lot_size,
                }),
                Err(_) => error_count += 1,
            }
        }
        if error_count > 0 {
            tracing::warn!(error_count, "Skipped unparseable instrument CSV rows");
        }
        Ok(instruments)
    }

    async fn quote(
        &self,
        access_token: &str,
        symbols: &[String],
    ) -> Result<HashMap<String, Quote>> {
        self.quote_endpoint(access_token, "/quote", symbols).await
    }

    async fn ltp(
        &self,
        access_token: &str,
        symbols: &[String],
    ) -> Result<HashMap<String, LtpQuote>> {
        self.quote_endpoint(access_token, "/quote/ltp", symbols)
            .await
    }

    async fn ohlc(
        &self,
        access_token: &str,
        symbols: &[String],
    ) -> Result<HashMap<String, OhlcQuote>> {
        self.quote_endpoint(access_token, "/quote/ohlc", symbols)
            .await
    }

    async fn historical_candles(
        &self,
        access_token: &str,
        instrument_token: u32,
        from: NaiveDate,
        to: NaiveDate,
        interval: &str,
    ) -> Result<Vec<Candle>> {
        let path = format!("/instruments/historical/{}/{}", instrument_token, interval);
        let query = [
            ("from", from.format("%Y-%m-%d").to_string()),
            ("to", to.format("%Y-%m-%d").to_string()),
        ];
        let data = self.get_data(access_token, &path, &query).await?;

        let rows: Vec<Value> = data
            .get("candles")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(Error::DeserializationFailed)?
            .unwrap_or_default();

        Ok(parse_candles(rows))
    }

    async fn place_order(&self, access_token: &str, params: &OrderParams) -> Result<String> {
        let mut form: Vec<(&str, String)> = vec![
            ("exchange", params.exchange.clone()),
            ("tradingsymbol", params.tradingsymbol.clone()),
            ("transaction_type", params.transaction_type.clone()),
            ("quantity", params.quantity.to_string()),
            ("product", params.product.clone()),
            ("order_type", params.order_type.clone()),
            ("validity", params.validity.clone()),
        ];
        if let Some(price) = params.price {
            form.push(("price", price.to_string()));
        }
        if let Some(trigger) = params.trigger_price {
            form.push(("trigger_price", trigger.to_string()));
        }
        if let Some(squareoff) = params.squareoff {
            form.push(("squareoff", squareoff.to_string()));
        }
        if let Some(stoploss) = params.stoploss {
            form.push(("stoploss", stoploss.to_string()));
        }

        let response = self
            .http_client
            .post(format!("{}/orders/{}", self.base_url, params.variety))
            .header("X-Kite-Version", "3")
            .header("Authorization", self.auth_header(access_token))
            .form(&form)
            .send()
            .await
            .map_err(Error::RequestFailed)?;

        let data = Self::unwrap_envelope(response).await?;
        extract_order_id(&data)
    }

    async fn modify_order(
        &self,
        access_token: &str,
        variety: &str,
        order_id: &str,
        params: &ModifyOrderParams,
    ) -> Result<String> {
        let mut form: Vec<(&str, String)> = Vec::new();
        if let Some(quantity) = params.quantity {
            form.push(("quantity", quantity.to_string()));
        }
        if let Some(price) = params.price {
            form.push(("price", price.to_string()));
        }
        if let Some(trigger) = params.trigger_price {
            form.push(("trigger_price", trigger.to_string()));
        }
        if let Some(ref order_type) = params.order_type {
            form.push(("order_type", order_type.clone()));
        }
        if let Some(ref validity) = params.validity {
            form.push(("validity", validity.clone()));
        }

        let response = self
            .http_client
            .put(format!("{}/orders/{}/{}", self.base_url, variety, order_id))
            .header("X-Kite-Version", "3")
            .header("Authorization", self.auth_header(access_token))
            .form(&form)
            .send()
            .await
            .map_err(Error::RequestFailed)?;

        let data = Self::unwrap_envelope(response).await?;
        extract_order_id(&data)
    }

    async fn cancel_order(
        &self,
        access_token: &str,
        variety: &str,
        order_id: &str,
    ) -> Result<String> {
        let response = self
            .http_client
            .delete(format!("{}/orders/{}/{}", self.base_url, variety, order_id))
            .header("X-Kite-Version", "3")
            .header("Authorization", self.auth_header(access_token))
            .send()
            .await
            .map_err(Error::RequestFailed)?;

        let data = Self::unwrap_envelope(response).await?;
        extract_order_id(&data)
    }

    async fn list_orders(&self, access_token: &str) -> Result<Vec<OrderRecord>> {
        let data = self.get_data(access_token, "/orders", &[]).await?;
        serde_json::from_value(data).map_err(Error::DeserializationFailed)
    }

    async fn list_positions(&self, access_token: &str) -> Result<Vec<Position>> {
        let data = self.get_data(access_token, "/portfolio/positions", &[]).await?;
        let positions: PositionsData =
            serde_json::from_value(data).map_err(Error::DeserializationFailed)?;
        Ok(positions
            .net
            .into_iter()
            .map(|p| Position {
                symbol: p.tradingsymbol,
                quantity: p.quantity,
                average_price: p.average_price,
                pnl: p.pnl,
                product: p.product,
            })
            .collect())
    }

    async fn estimate_margin(
        &self,
        access_token: &str,
        params: &MarginOrderParams,
    ) -> Result<Decimal> {
        let response = self
            .http_client
            .post(format!("{}/margins/orders", self.base_url))
            .header("X-Kite-Version", "3")
            .header("Authorization", self.auth_header(access_token))
            .json(&[params])
            .send()
            .await
            .map_err(Error::RequestFailed)?;

        let data = Self::unwrap_envelope(response).await?;
        let total = data
            .as_array()
            .and_then(|rows| rows.first())
            .and_then(|row| row.get("total"))
            .cloned()
            .map(serde_json::from_value::<Decimal>)
            .transpose()
            .map_err(Error::DeserializationFailed)?
            .unwrap_or_default();
        Ok(total)
    }
}

#[derive(Debug, Deserialize)]
struct PositionsData {
    #[serde(default)]
    net: Vec<RawPosition>,
}

#[derive(Debug, Deserialize)]
struct RawPosition {
    tradingsymbol: String,
    quantity: i64,
    average_price: Decimal,
    pnl: Decimal,
    product: String,
}

/// Converts the broker's positional candle arrays
/// `[time, open, high, low, close, volume(, oi)]` into clean `Candle`s.
/// Rows that do not fit the shape are skipped.
fn parse_candles(rows: Vec<Value>) -> Vec<Candle> {
    let mut candles = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(fields) = row.as_array() else {
            continue;
        };
        if fields.len() < 6 {
            continue;
        }
        let Some(time) = fields[0]
            .as_str()
            .and_then(|s| DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z").ok())
        else {
            continue;
        };
        candles.push(Candle {
            time,
            open: decimal_field(&fields[1]),
            high: decimal_field(&fields[2]),
            low: decimal_field(&fields[3]),
            close: decimal_field(&fields[4]),
            volume: fields[5].as_i64().unwrap_or(0),
        });
    }
    candles
}

fn decimal_field(value: &Value) -> Decimal {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

fn extract_order_id(data: &Value) -> Result<String> {
    data.get("order_id")
        .map(|id| match id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .ok_or(Error::Api {
            status: 200,
            message: "broker response carried no order_id".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn candles_parse_from_positional_arrays() {
        let rows = vec![
            json!(["2024-01-01T09:15:00+0530", 100.0, 110.5, 95.25, 105.0, 12345]),
            json!(["2024-01-02T09:15:00+0530", 105.0, 112.0, 101.0, 108.5, 23456, 99]),
        ];
        let candles = parse_candles(rows);
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].high, dec!(110.5));
        assert_eq!(candles[1].close, dec!(108.5));
        assert_eq!(candles[1].volume, 23456);
    }

    #[test]
    fn malformed_candle_rows_are_skipped() {
        let rows = vec![
            json!(["not a timestamp", 1, 2, 3, 4, 5]),
            json!([42]),
            json!("garbage"),
            json!(["2024-01-02T09:15:00+0530", 105.0, 112.0, 101.0, 108.5, 23456]),
        ];
        assert_eq!(parse_candles(rows).len(), 1);
    }

    #[test]
    fn order_id_extraction_handles_string_and_number() {
        assert_eq!(
            extract_order_id(&json!({"order_id": "240101000000001"})).unwrap(),
            "240101000000001"
        );
        assert!(extract_order_id(&json!({})).is_err());
    }
}
