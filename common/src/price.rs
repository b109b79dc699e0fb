use crate::config::PriceConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;

/// Source of the current fiat price of one whole coin.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Single best-effort lookup. `None` means the price is unavailable and
    /// the caller must not proceed.
    async fn current_unit_price(&self) -> Option<f64>;
}

/// Client for the CoinGecko `simple/price` endpoint.
pub struct CoinGeckoClient {
    client: Client,
    endpoint: String,
    coin_id: String,
    fiat_code: String,
}

impl std::fmt::Debug for CoinGeckoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoinGeckoClient")
            .field("endpoint", &self.endpoint)
            .field("coin_id", &self.coin_id)
            .field("fiat_code", &self.fiat_code)
            .field("client", &"<reqwest::Client>")
            .finish()
    }
}

impl CoinGeckoClient {
    pub fn new(config: &PriceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            coin_id: config.coin_id.clone(),
            fiat_code: config.fiat_code.clone(),
        })
    }

    pub fn pair(&self) -> (&str, &str) {
        (&self.coin_id, &self.fiat_code)
    }

    /// Fetches the price, surfacing the reason on failure.
    pub async fn fetch_unit_price(&self) -> Result<f64> {
        let url = format!("{}/simple/price", self.endpoint);
        debug!(
            "Requesting {} price in {} from {}",
            self.coin_id, self.fiat_code, url
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("ids", self.coin_id.as_str()),
                ("vs_currencies", self.fiat_code.as_str()),
            ])
            .send()
            .await
            .context("Failed to send price request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Price API error ({}): {}", status, body));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse price response")?;
        parse_price_response(&body, &self.coin_id, &self.fiat_code)
    }
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    async fn current_unit_price(&self) -> Option<f64> {
        match self.fetch_unit_price().await {
            Ok(price) => Some(price),
            Err(e) => {
                error!("Error fetching {} price: {:#}", self.coin_id, e);
                None
            }
        }
    }
}

/// Extracts `body[coin_id][fiat_code]` as a positive finite number.
pub fn parse_price_response(body: &serde_json::Value, coin_id: &str, fiat_code: &str) -> Result<f64> {
    let price = body
        .get(coin_id)
        .with_context(|| format!("Price response has no entry for '{}'", coin_id))?
        .get(fiat_code)
        .with_context(|| {
            format!(
                "Price response for '{}' has no '{}' quote",
                coin_id, fiat_code
            )
        })?
        .as_f64()
        .with_context(|| format!("Price for '{}' in '{}' is not a number", coin_id, fiat_code))?;

    if !price.is_finite() || price <= 0.0 {
        anyhow::bail!("Price for '{}' in '{}' is not positive: {}", coin_id, fiat_code, price);
    }
    Ok(price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn test_config(server_url: &str) -> PriceConfig {
        PriceConfig {
            endpoint: format!("{}/api/v3/", server_url),
            coin_id: "bitcoin".to_string(),
            fiat_code: "eur".to_string(),
            timeout_seconds: 2,
        }
    }

    fn price_query() -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("ids".into(), "bitcoin".into()),
            Matcher::UrlEncoded("vs_currencies".into(), "eur".into()),
        ])
    }

    #[test]
    fn test_parse_price_response_valid() {
        let body = json!({ "bitcoin": { "eur": 50000.5 } });
        assert_eq!(parse_price_response(&body, "bitcoin", "eur").unwrap(), 50000.5);
    }

    #[test]
    fn test_parse_price_response_integer_price() {
        let body = json!({ "bitcoin": { "eur": 60000 } });
        assert_eq!(parse_price_response(&body, "bitcoin", "eur").unwrap(), 60000.0);
    }

    #[test]
    fn test_parse_price_response_missing_coin() {
        let body = json!({ "ethereum": { "eur": 3000.0 } });
        let err = parse_price_response(&body, "bitcoin", "eur").unwrap_err();
        assert!(err.to_string().contains("no entry for 'bitcoin'"));
    }

    #[test]
    fn test_parse_price_response_missing_fiat() {
        let body = json!({ "bitcoin": { "usd": 65000.0 } });
        let err = parse_price_response(&body, "bitcoin", "eur").unwrap_err();
        assert!(err.to_string().contains("no 'eur' quote"));
    }

    #[test]
    fn test_parse_price_response_not_a_number() {
        let body = json!({ "bitcoin": { "eur": "50000" } });
        assert!(parse_price_response(&body, "bitcoin", "eur").is_err());
    }

    #[test]
    fn test_parse_price_response_non_positive() {
        let body = json!({ "bitcoin": { "eur": 0 } });
        assert!(parse_price_response(&body, "bitcoin", "eur").is_err());
        let body = json!({ "bitcoin": { "eur": -1.5 } });
        assert!(parse_price_response(&body, "bitcoin", "eur").is_err());
    }

    #[tokio::test]
    async fn test_current_unit_price_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v3/simple/price")
            .match_query(price_query())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"bitcoin":{"eur":50000.0}}"#)
            .create_async()
            .await;

        let client = CoinGeckoClient::new(&test_config(&server.url())).unwrap();
        assert_eq!(client.current_unit_price().await, Some(50000.0));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_current_unit_price_server_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v3/simple/price")
            .match_query(price_query())
            .with_status(500)
            .with_body("internal error")
            .expect(2)
            .create_async()
            .await;

        let client = CoinGeckoClient::new(&test_config(&server.url())).unwrap();
        let err = client.fetch_unit_price().await.unwrap_err();
        assert!(err.to_string().contains("500"));
        assert_eq!(client.current_unit_price().await, None);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_current_unit_price_rate_limited() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v3/simple/price")
            .match_query(price_query())
            .with_status(429)
            .with_body(r#"{"status":{"error_code":429}}"#)
            .create_async()
            .await;

        let client = CoinGeckoClient::new(&test_config(&server.url())).unwrap();
        assert_eq!(client.current_unit_price().await, None);
    }

    #[tokio::test]
    async fn test_current_unit_price_malformed_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v3/simple/price")
            .match_query(price_query())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("not json at all")
            .create_async()
            .await;

        let client = CoinGeckoClient::new(&test_config(&server.url())).unwrap();
        assert_eq!(client.current_unit_price().await, None);
    }

    #[tokio::test]
    async fn test_current_unit_price_unexpected_shape() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v3/simple/price")
            .match_query(price_query())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{}"#)
            .create_async()
            .await;

        let client = CoinGeckoClient::new(&test_config(&server.url())).unwrap();
        assert_eq!(client.current_unit_price().await, None);
    }

    #[tokio::test]
    async fn test_current_unit_price_unreachable_host() {
        let config = PriceConfig {
            endpoint: "http://127.0.0.1:1".to_string(),
            timeout_seconds: 1,
            ..PriceConfig::default()
        };
        let client = CoinGeckoClient::new(&config).unwrap();
        assert_eq!(client.current_unit_price().await, None);
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let client = CoinGeckoClient::new(&test_config("http://localhost:1234")).unwrap();
        assert_eq!(client.endpoint, "http://localhost:1234/api/v3");
        assert_eq!(client.pair(), ("bitcoin", "eur"));
    }
}
