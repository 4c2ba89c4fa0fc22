//! Live adapter for both CRM ports using the contacts REST API.
//!
//! Implements [`UniquenessOracle`] as an equality-filtered contact search
//! limited to one result, and [`RecordStore`] as a single-property contact
//! update. The access token is read from the environment at call time, so
//! construction never fails and short-circuiting code paths never need
//! credentials.

use std::collections::HashMap;
use std::env;
use std::error::Error;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::action::CARD_FIELD;
use crate::ports::{ExistsFuture, RecordStore, UniquenessOracle, UpdateFuture};

const DEFAULT_BASE_URL: &str = "https://api.hubapi.com";

/// Environment variable holding the CRM private-app access token.
pub const TOKEN_ENV: &str = "CRM_ACCESS_TOKEN";

/// Live CRM client speaking the contacts search and update endpoints.
#[derive(Clone)]
pub struct LiveCrmClient {
    client: Client,
    base_url: String,
}

impl LiveCrmClient {
    /// Creates a new live CRM client against the default API host.
    ///
    /// The host can be overridden with the `CRM_BASE_URL` environment
    /// variable, which is mainly useful for pointing at a test double.
    #[must_use]
    pub fn new() -> Self {
        let base_url = env::var("CRM_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self { client: Client::new(), base_url }
    }

    /// Creates a client against an explicit base URL.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self { client: Client::new(), base_url: base_url.into() }
    }
}

impl Default for LiveCrmClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Request body for the contact search endpoint.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    filter_groups: Vec<FilterGroup<'a>>,
    properties: Vec<&'a str>,
    limit: u32,
}

/// A group of filters combined with AND semantics.
#[derive(Serialize)]
struct FilterGroup<'a> {
    filters: Vec<Filter<'a>>,
}

/// A single property filter.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Filter<'a> {
    property_name: &'a str,
    operator: &'a str,
    value: &'a str,
}

/// Response body of the contact search endpoint.
#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

/// Request body for the contact update endpoint.
#[derive(Serialize)]
struct UpdateRequest<'a> {
    properties: HashMap<&'a str, &'a str>,
}

/// Error body returned by the CRM API.
#[derive(Deserialize)]
struct CrmError {
    message: String,
}

fn access_token() -> Result<String, Box<dyn Error + Send + Sync>> {
    env::var(TOKEN_ENV).map_err(|_| format!("{TOKEN_ENV} environment variable not set").into())
}

fn error_message(status: reqwest::StatusCode, body: String) -> String {
    let msg = serde_json::from_str::<CrmError>(&body).map(|e| e.message).unwrap_or(body);
    format!("CRM API error ({}): {msg}", status.as_u16())
}

impl UniquenessOracle for LiveCrmClient {
    fn exists(&self, value: &str) -> ExistsFuture<'_> {
        let value = value.to_owned();

        Box::pin(async move {
            let token = access_token()?;

            let body = SearchRequest {
                filter_groups: vec![FilterGroup {
                    filters: vec![Filter {
                        property_name: CARD_FIELD,
                        operator: "EQ",
                        value: &value,
                    }],
                }],
                properties: vec![CARD_FIELD],
                limit: 1,
            };

            let url = format!("{}/crm/v3/objects/contacts/search", self.base_url);
            let response = self
                .client
                .post(&url)
                .bearer_auth(&token)
                .json(&body)
                .send()
                .await
                .map_err(|e| -> Box<dyn Error + Send + Sync> {
                    format!("CRM search request failed: {e}").into()
                })?;

            let status = response.status();
            let text = response.text().await.map_err(|e| -> Box<dyn Error + Send + Sync> {
                format!("Failed to read CRM search response: {e}").into()
            })?;

            if !status.is_success() {
                return Err(error_message(status, text).into());
            }

            let parsed: SearchResponse =
                serde_json::from_str(&text).map_err(|e| -> Box<dyn Error + Send + Sync> {
                    format!("Failed to parse CRM search response: {e}").into()
                })?;

            Ok(!parsed.results.is_empty())
        })
    }
}

impl RecordStore for LiveCrmClient {
    fn update_field(&self, record_id: &str, field_name: &str, value: &str) -> UpdateFuture<'_> {
        let record_id = record_id.to_owned();
        let field_name = field_name.to_owned();
        let value = value.to_owned();

        Box::pin(async move {
            let token = access_token()?;

            let mut properties = HashMap::new();
            properties.insert(field_name.as_str(), value.as_str());
            let body = UpdateRequest { properties };

            let url = format!("{}/crm/v3/objects/contacts/{record_id}", self.base_url);
            let response = self
                .client
                .patch(&url)
                .bearer_auth(&token)
                .json(&body)
                .send()
                .await
                .map_err(|e| -> Box<dyn Error + Send + Sync> {
                    format!("CRM update request failed: {e}").into()
                })?;

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(error_message(status, text).into());
            }

            Ok(())
        })
    }
}
