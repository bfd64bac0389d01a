//! Async client for one Zendesk account
//!
//! Owns authentication, cursor pagination and retry so that the migration
//! engine only ever sees complete catalogs or a single failed call. One
//! client instance is scoped to one account for one run.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::config::AccountConfig;
use crate::migrate::executor::EntityWriter;
use crate::migrate::reader::AccountReader;
use crate::migrate::rewrite::{FieldPayload, ObjectPayload};

use super::error::{CreationError, TransportError};
use super::models::{
    CreatedCustomObject, CreatedTicketField, CustomObjectResource, CustomObjectsPage, PageLinks,
    PageMeta, TicketFieldResource, TicketFieldsPage,
};
use super::retry::{RetryConfig, is_retryable_status};

const REQUEST_TIMEOUT_SECS: u64 = 30;
const PAGE_SIZE: u32 = 100;

/// HTTP client bound to a single Zendesk account
pub struct ZendeskClient {
    http: reqwest::Client,
    base_url: String,
    email: String,
    token: String,
    retry: RetryConfig,
}

impl ZendeskClient {
    pub fn new(account: &AccountConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: account.base_url(),
            email: account.email.clone(),
            token: account.token.clone(),
            retry: RetryConfig::default(),
        })
    }

    /// Pagination hands back absolute URLs; everything else is a path
    fn url(&self, path_or_url: &str) -> String {
        if path_or_url.starts_with("http") {
            path_or_url.to_string()
        } else {
            format!("{}{}", self.base_url, path_or_url)
        }
    }

    async fn request_json(
        &self,
        method: Method,
        path_or_url: &str,
        body: Option<&Value>,
    ) -> Result<Value, TransportError> {
        let url = self.url(path_or_url);
        let operation = format!("{} {}", method, path_or_url);
        let mut attempt = 1u32;

        loop {
            let mut request = self
                .http
                .request(method.clone(), &url)
                .basic_auth(format!("{}/token", self.email), Some(&self.token));
            if let Some(body) = body {
                request = request.json(body);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json::<Value>().await.map_err(|e| TransportError {
                            operation: operation.clone(),
                            message: format!("invalid JSON response: {}", e),
                            status: Some(status.as_u16()),
                        });
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    if is_retryable_status(status) && attempt < self.retry.max_attempts {
                        let delay = self.retry.delay_for(attempt);
                        log::warn!(
                            "{} returned {}, retrying in {:?} (attempt {}/{})",
                            operation,
                            status,
                            delay,
                            attempt,
                            self.retry.max_attempts
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    log::error!("{} returned {}: {}", operation, status, body_text);
                    return Err(TransportError {
                        operation,
                        message: format!("{}: {}", status, body_text),
                        status: Some(status.as_u16()),
                    });
                }
                Err(e) => {
                    if (e.is_timeout() || e.is_connect()) && attempt < self.retry.max_attempts {
                        let delay = self.retry.delay_for(attempt);
                        log::warn!(
                            "{} failed ({}), retrying in {:?} (attempt {}/{})",
                            operation,
                            e,
                            delay,
                            attempt,
                            self.retry.max_attempts
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    return Err(TransportError {
                        operation,
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    });
                }
            }
        }
    }

    async fn fetch_ticket_fields(&self) -> Result<Vec<TicketFieldResource>, TransportError> {
        let mut fields = Vec::new();
        let mut next = Some(format!("/ticket_fields?page[size]={}", PAGE_SIZE));

        while let Some(url) = next {
            let value = self.request_json(Method::GET, &url, None).await?;
            let page: TicketFieldsPage =
                serde_json::from_value(value).map_err(|e| TransportError {
                    operation: format!("GET {}", url),
                    message: format!("unexpected response shape: {}", e),
                    status: None,
                })?;
            next = next_url(&page.links, &page.meta, &page.next_page);
            fields.extend(page.ticket_fields);
        }

        log::debug!("fetched {} ticket fields from {}", fields.len(), self.base_url);
        Ok(fields)
    }

    async fn fetch_custom_objects(&self) -> Result<Vec<CustomObjectResource>, TransportError> {
        let mut objects = Vec::new();
        let mut next = Some(format!("/custom_objects?page[size]={}", PAGE_SIZE));

        while let Some(url) = next {
            let value = self.request_json(Method::GET, &url, None).await?;
            let page: CustomObjectsPage =
                serde_json::from_value(value).map_err(|e| TransportError {
                    operation: format!("GET {}", url),
                    message: format!("unexpected response shape: {}", e),
                    status: None,
                })?;
            next = next_url(&page.links, &page.meta, &page.next_page);
            objects.extend(page.custom_objects);
        }

        log::debug!("fetched {} custom object types from {}", objects.len(), self.base_url);
        Ok(objects)
    }
}

/// Cursor pagination takes precedence; offset `next_page` is the fallback
fn next_url(
    links: &Option<PageLinks>,
    meta: &Option<PageMeta>,
    next_page: &Option<String>,
) -> Option<String> {
    if let Some(meta) = meta
        && !meta.has_more
    {
        return None;
    }
    if let Some(links) = links
        && let Some(next) = &links.next
    {
        return Some(next.clone());
    }
    next_page.clone()
}

#[async_trait]
impl AccountReader for ZendeskClient {
    async fn list_fields(&self) -> Result<Vec<TicketFieldResource>, TransportError> {
        self.fetch_ticket_fields().await
    }

    async fn list_custom_object_types(&self) -> Result<Vec<CustomObjectResource>, TransportError> {
        self.fetch_custom_objects().await
    }
}

#[async_trait]
impl EntityWriter for ZendeskClient {
    async fn create_field(&self, payload: &FieldPayload) -> Result<u64, CreationError> {
        let body = serde_json::json!({ "ticket_field": payload });
        let value = self
            .request_json(Method::POST, "/ticket_fields", Some(&body))
            .await?;
        let created: CreatedTicketField =
            serde_json::from_value(value).map_err(|e| CreationError {
                status: None,
                message: format!("unexpected create response: {}", e),
            })?;
        log::info!(
            "created ticket field '{}' with id {}",
            created.ticket_field.title,
            created.ticket_field.id
        );
        Ok(created.ticket_field.id)
    }

    async fn create_custom_object_type(&self, payload: &ObjectPayload) -> Result<u64, CreationError> {
        let body = serde_json::json!({ "custom_object": payload });
        let value = self
            .request_json(Method::POST, "/custom_objects", Some(&body))
            .await?;
        let created: CreatedCustomObject =
            serde_json::from_value(value).map_err(|e| CreationError {
                status: None,
                message: format!("unexpected create response: {}", e),
            })?;
        log::info!(
            "created custom object type '{}' with id {}",
            created.custom_object.key,
            created.custom_object.id
        );
        Ok(created.custom_object.id)
    }
}
