//! eBay Trading API transport
//!
//! The sync core talks to eBay through the `TradingApi` trait so the
//! reconciliation algorithms can be tested against canned responses.
//! `EbayTradingClient` is the thin blocking-reqwest implementation used in
//! production; retries, if any, belong below this seam, never in the core.

pub mod fetcher;

use crate::error::{Result, SyncError};
use serde_json::Value;

/// Production Trading API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.ebay.com/ws/api.dll";

/// Trading API compatibility level sent with every call
const COMPATIBILITY_LEVEL: &str = "967";

/// A Trading API collaborator: one operation in, one structured response out.
///
/// Connection failures surface as `SyncError::Transport` or
/// `SyncError::HttpStatus` and are always fatal to the current run.
pub trait TradingApi {
    fn execute(&self, operation: &str, params: &Value) -> Result<Value>;
}

/// Blocking HTTP client for the eBay Trading API
pub struct EbayTradingClient {
    client: reqwest::blocking::Client,
    endpoint: String,
    site_id: u32,
    auth_token: String,
}

impl EbayTradingClient {
    pub fn new(endpoint: impl Into<String>, site_id: u32, auth_token: impl Into<String>) -> Self {
        log::debug!("Creating Trading API client for site {}", site_id);
        Self {
            client: reqwest::blocking::Client::new(),
            endpoint: endpoint.into(),
            site_id,
            auth_token: auth_token.into(),
        }
    }
}

impl TradingApi for EbayTradingClient {
    fn execute(&self, operation: &str, params: &Value) -> Result<Value> {
        log::debug!("Executing Trading API call {}", operation);

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-EBAY-API-CALL-NAME", operation)
            .header("X-EBAY-API-SITEID", self.site_id.to_string())
            .header("X-EBAY-API-COMPATIBILITY-LEVEL", COMPATIBILITY_LEVEL)
            .header("X-EBAY-API-IAF-TOKEN", &self.auth_token)
            .json(params)
            .send()?;

        if !response.status().is_success() {
            return Err(SyncError::HttpStatus(response.status()));
        }

        Ok(response.json()?)
    }
}

/// Normalize a Trading API field that is a lone object when one entry exists
/// and an array when several do.
pub fn as_sequence(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::Null => Vec::new(),
        other => vec![other.clone()],
    }
}

/// Read an integer field the Trading API serializes as either a JSON number
/// or a decimal string.
pub fn int_field(value: &Value, key: &str) -> Option<i64> {
    match value.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Read a string field, returning `None` when absent or not a string
pub fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key)?.as_str()
}
