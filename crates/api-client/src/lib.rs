use crate::auth::sign_request;
use async_trait::async_trait;
use chrono::Utc;
use configuration::ExchangeConfig;
use core_types::Credentials;
use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

mod auth;
pub mod error;
pub mod responses;

// --- Public API ---
pub use error::ValuationError;
pub use responses::{AccountResponse, ApiErrorResponse, SpotBalance, TickerPriceResponse};

/// The asset every price is quoted in. It is worth exactly one dollar here.
pub const QUOTE_ASSET: &str = "USDT";

/// Values one exchange account in USD.
///
/// This is the seam the investor directory depends on, so the live client can
/// be swapped for a fake in tests.
#[async_trait]
pub trait AccountValuator: Send + Sync {
    /// Total USD value of every asset held in the account.
    async fn account_value_usd(&self, credentials: &Credentials) -> Result<f64, ValuationError>;
}

/// An `AccountValuator` backed by the Binance spot REST API.
#[derive(Clone)]
pub struct BinanceSpotClient {
    client: reqwest::Client,
    base_url: String,
    recv_window_ms: u64,
}

impl BinanceSpotClient {
    pub fn new(config: &ExchangeConfig) -> Result<Self, ValuationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            recv_window_ms: config.recv_window_ms,
        })
    }

    async fn get_signed<T: DeserializeOwned>(
        &self,
        path: &str,
        credentials: &Credentials,
        params: &mut BTreeMap<&str, String>,
    ) -> Result<T, ValuationError> {
        params.insert("recvWindow", self.recv_window_ms.to_string());
        params.insert("timestamp", Utc::now().timestamp_millis().to_string());

        let query_string = serde_qs::to_string(params)
            .map_err(|e| ValuationError::InvalidData(format!("Failed to encode query: {}", e)))?;
        let signature = sign_request(&credentials.api_secret, &query_string);

        let url = format!(
            "{}{}?{}&signature={}",
            self.base_url, path, query_string, signature
        );

        let response = self
            .client
            .get(&url)
            .header("X-MBX-APIKEY", &credentials.api_key)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn get_public<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ValuationError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).query(query).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ValuationError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str::<T>(&text).map_err(|e| ValuationError::Deserialization(e.to_string()))
        } else {
            let api_error: ApiErrorResponse = serde_json::from_str(&text).map_err(|e| {
                ValuationError::Deserialization(format!(
                    "Failed to deserialize error response ({}): {}. Original text: {}",
                    status, e, text
                ))
            })?;
            Err(ValuationError::Exchange {
                code: api_error.code,
                msg: api_error.msg,
            })
        }
    }

    /// Fetches every asset balance of the account. (Authenticated)
    pub async fn get_balances(&self, credentials: &Credentials) -> Result<Vec<SpotBalance>, ValuationError> {
        let mut params = BTreeMap::new();
        let account: AccountResponse = self
            .get_signed("/api/v3/account", credentials, &mut params)
            .await?;
        Ok(account.balances)
    }

    /// USD price of one unit of `asset`, read from its `{asset}USDT` pair.
    pub async fn get_usd_price(&self, asset: &str) -> Result<Decimal, ValuationError> {
        let asset = asset.to_uppercase();
        if asset == QUOTE_ASSET {
            return Ok(Decimal::ONE);
        }
        let symbol = format!("{}{}", asset, QUOTE_ASSET);
        let ticker: TickerPriceResponse = self
            .get_public("/api/v3/ticker/price", &[("symbol", symbol.as_str())])
            .await?;
        Ok(ticker.price)
    }
}

#[async_trait]
impl AccountValuator for BinanceSpotClient {
    async fn account_value_usd(&self, credentials: &Credentials) -> Result<f64, ValuationError> {
        let holdings: Vec<SpotBalance> = self
            .get_balances(credentials)
            .await?
            .into_iter()
            .filter(|b| !b.total().is_zero())
            .collect();

        let lookups = holdings.iter().map(|holding| async move {
            match self.get_usd_price(&holding.asset).await {
                Ok(price) => Some((holding.asset.clone(), price)),
                Err(e) => {
                    tracing::debug!(asset = %holding.asset, error = %e, "Asset has no USD price, valued at 0.");
                    None
                }
            }
        });
        let prices: HashMap<String, Decimal> = join_all(lookups).await.into_iter().flatten().collect();

        let total = value_holdings(&holdings, &prices);
        total
            .to_f64()
            .ok_or_else(|| ValuationError::InvalidData(format!("Account value {} is not representable", total)))
    }
}

/// Sums `quantity * price` over the holdings. Assets without a price count as 0.
pub fn value_holdings(holdings: &[SpotBalance], prices: &HashMap<String, Decimal>) -> Decimal {
    holdings
        .iter()
        .map(|holding| {
            let price = prices.get(&holding.asset).copied().unwrap_or(Decimal::ZERO);
            holding.total() * price
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn balance(asset: &str, free: &str, locked: &str) -> SpotBalance {
        SpotBalance {
            asset: asset.to_string(),
            free: dec(free),
            locked: dec(locked),
        }
    }

    fn client_for(server: &Server) -> BinanceSpotClient {
        BinanceSpotClient::new(&ExchangeConfig {
            base_url: server.url(),
            timeout_secs: 5,
            recv_window_ms: 5_000,
        })
        .unwrap()
    }

    #[test]
    fn unpriced_assets_count_as_zero() {
        let holdings = vec![
            balance("BTC", "0.5", "0.25"),
            balance("USDT", "100", "0"),
            balance("OBSCURE", "1000", "0"),
        ];
        let prices = HashMap::from([
            ("BTC".to_string(), dec("40000")),
            ("USDT".to_string(), Decimal::ONE),
        ]);

        assert_eq!(value_holdings(&holdings, &prices), dec("30100"));
    }

    #[tokio::test]
    async fn values_a_spot_account() {
        let mut server = Server::new_async().await;
        let account = server
            .mock("GET", Matcher::Regex(r"^/api/v3/account".to_string()))
            .match_header("X-MBX-APIKEY", "key-1")
            .match_query(Matcher::AllOf(vec![
                Matcher::Regex("timestamp=".to_string()),
                Matcher::Regex("signature=".to_string()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"makerCommission":10,"balances":[
                    {"asset":"BTC","free":"0.50000000","locked":"0.50000000"},
                    {"asset":"USDT","free":"100.00000000","locked":"0.00000000"},
                    {"asset":"DUST","free":"10.00000000","locked":"0.00000000"},
                    {"asset":"ETH","free":"0.00000000","locked":"0.00000000"}
                ]}"#,
            )
            .create_async()
            .await;
        let btc = server
            .mock("GET", Matcher::Regex(r"^/api/v3/ticker/price".to_string()))
            .match_query(Matcher::UrlEncoded("symbol".to_string(), "BTCUSDT".to_string()))
            .with_status(200)
            .with_body(r#"{"symbol":"BTCUSDT","price":"20000.00000000"}"#)
            .create_async()
            .await;
        let dust = server
            .mock("GET", Matcher::Regex(r"^/api/v3/ticker/price".to_string()))
            .match_query(Matcher::UrlEncoded("symbol".to_string(), "DUSTUSDT".to_string()))
            .with_status(400)
            .with_body(r#"{"code":-1121,"msg":"Invalid symbol."}"#)
            .create_async()
            .await;

        let value = client_for(&server)
            .account_value_usd(&Credentials::new("key-1", "secret-1"))
            .await
            .unwrap();

        assert_eq!(value, 20_100.0);
        account.assert_async().await;
        btc.assert_async().await;
        dust.assert_async().await;
    }

    #[tokio::test]
    async fn rejected_credentials_surface_as_exchange_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", Matcher::Regex(r"^/api/v3/account".to_string()))
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"code":-2015,"msg":"Invalid API-key, IP, or permissions for action."}"#)
            .create_async()
            .await;

        let result = client_for(&server)
            .account_value_usd(&Credentials::new("bad", "bad"))
            .await;

        assert!(matches!(result, Err(ValuationError::Exchange { code: -2015, .. })));
    }
}
