use super::{ErrorLog, ErrorStore, NewErrorLog};
use crate::config::RestStoreConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::{log_debug, log_error};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

/// Error table behind a Supabase/PostgREST endpoint.
#[derive(Debug, Clone)]
pub struct RestErrorStore {
    client: reqwest::Client,
    table_url: String,
    headers: HeaderMap,
}

impl RestErrorStore {
    /// Create a store for `{base_url}/rest/v1/{table}`
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Configuration`] if the API key cannot be used
    /// as a header value.
    pub fn new(config: &RestStoreConfig) -> PipelineResult<Self> {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: &RestStoreConfig) -> PipelineResult<Self> {
        let table_url = format!(
            "{}/rest/v1/{}",
            config.base_url.trim_end_matches('/'),
            config.table
        );

        log_debug!(
            table_url = %table_url,
            "Creating REST error log store"
        );

        Ok(Self {
            client,
            table_url,
            headers: Self::build_headers(&config.api_key)?,
        })
    }

    /// Supabase expects the key both as `apikey` and as a bearer token
    pub fn build_headers(api_key: &str) -> PipelineResult<HeaderMap> {
        let key = HeaderValue::from_str(api_key)
            .map_err(|e| PipelineError::configuration(format!("Invalid API key format: {e}")))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| PipelineError::configuration(format!("Invalid API key format: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        Ok(headers)
    }

    pub fn table_url(&self) -> &str {
        &self.table_url
    }

    async fn reject(response: reqwest::Response) -> PipelineError {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        PipelineError::store_rejected(status, body)
    }
}

#[async_trait]
impl ErrorStore for RestErrorStore {
    async fn insert(&self, rows: &[NewErrorLog]) -> PipelineResult<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let response = self
            .client
            .post(&self.table_url)
            .headers(self.headers.clone())
            .header("Prefer", "return=minimal")
            .json(rows)
            .send()
            .await
            .map_err(|e| {
                log_error!(
                    url = %self.table_url,
                    error = %e,
                    "Error log insert request failed"
                );
                PipelineError::store_unavailable(format!("Insert failed: {e}"), Some(Box::new(e)))
            })?;

        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }

        log_debug!(rows = rows.len(), "Error log batch inserted");
        Ok(())
    }

    async fn select_since(&self, since: DateTime<Utc>) -> PipelineResult<Vec<ErrorLog>> {
        let lower_bound = format!(
            "gte.{}",
            since.to_rfc3339_opts(SecondsFormat::Millis, true)
        );

        let response = self
            .client
            .get(&self.table_url)
            .headers(self.headers.clone())
            .query(&[
                ("select", "*"),
                ("created_at", lower_bound.as_str()),
                ("order", "created_at.desc"),
            ])
            .send()
            .await
            .map_err(|e| {
                PipelineError::store_unavailable(format!("Select failed: {e}"), Some(Box::new(e)))
            })?;

        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }

        let raw_body = response.text().await.map_err(|e| {
            PipelineError::store_response_invalid(format!("Failed to read response: {e}"))
        })?;

        serde_json::from_str(&raw_body).map_err(|e| {
            log_error!(
                error = %e,
                raw_body = %raw_body,
                "Failed to parse error log rows"
            );
            PipelineError::store_response_invalid(format!("Invalid rows: {e}"))
        })
    }
}
