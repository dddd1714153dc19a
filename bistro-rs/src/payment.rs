//! Payment processor bridge: card payment intents over the Stripe HTTP API.
//!
//! The client owns the secret key and base URL; handlers only ever see the
//! client-facing secret of a created intent, never the processor response.

use reqwest::StatusCode;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const CURRENCY: &str = "usd";

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("price cannot be expressed in minor units")]
    InvalidAmount,
    #[error("payment processor request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("payment processor rejected the request: {status}")]
    Rejected { status: StatusCode, detail: String },
}

#[derive(Clone)]
pub struct PaymentClient {
    http: reqwest::Client,
    secret_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct IntentResponse {
    client_secret: String,
}

impl PaymentClient {
    pub fn new(secret_key: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Request a card payment intent for `price` (currency major units) and
    /// return the client-usable secret. Processor failures surface as-is;
    /// there is no retry.
    pub async fn create_intent(&self, price: Decimal) -> Result<String, PaymentError> {
        let amount = minor_units(price).ok_or(PaymentError::InvalidAmount)?;
        let params = [
            ("amount", amount.to_string()),
            ("currency", String::from(CURRENCY)),
            ("payment_method_types[]", String::from("card")),
        ];

        let response = self
            .http
            .post(format!("{}/v1/payment_intents", self.base_url))
            .bearer_auth(&self.secret_key)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PaymentError::Rejected { status, detail });
        }

        let intent = response.json::<IntentResponse>().await?;
        debug!(amount, currency = CURRENCY, "payment intent created");
        Ok(intent.client_secret)
    }
}

/// Currency major units to integer minor units, truncating fractional cents.
pub fn minor_units(price: Decimal) -> Option<i64> {
    price.checked_mul(Decimal::ONE_HUNDRED)?.trunc().to_i64()
}
