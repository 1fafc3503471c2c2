use crate::core::dataset::{Dataset, Record};
use crate::core::ports::{ConfigProvider, DataSource};
use crate::core::query::Query;
use crate::utils::error::{CovidError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Deserialize)]
struct PageBody {
    data: Vec<Record>,
    // Absent pagination means there is nothing beyond this page.
    #[serde(default)]
    pagination: Pagination,
}

#[derive(Debug, Deserialize, Default)]
struct Pagination {
    next: Option<String>,
}

/// Walks the API's page-numbered pagination protocol for one query and
/// concatenates the pages into a single dataset. Strictly sequential: the
/// next page is not requested until the previous response is parsed. The
/// result is all-or-nothing; any failure aborts the whole fetch.
pub struct PagedFetcher {
    client: Client,
    endpoint: String,
}

impl PagedFetcher {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &impl ConfigProvider) -> Result<Self> {
        Self::new(
            config.api_endpoint(),
            Duration::from_secs(config.timeout_seconds()),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch every page for `query` and return the assembled dataset.
    /// Record order equals the concatenation of each page's `data` in
    /// page-number order; no deduplication or sorting happens here.
    pub async fn fetch(&self, query: &Query) -> Result<Dataset> {
        query.validate()?;

        let filters = query.filter_string();
        let structure = query.field_map().to_structure_json()?;
        let mut records: Vec<Record> = Vec::new();
        let mut page_number: u32 = 1;

        loop {
            tracing::debug!(page = page_number, filters = %filters, "requesting page");
            let page_param = page_number.to_string();
            let response = self
                .client
                .get(&self.endpoint)
                .query(&[
                    ("filters", filters.as_str()),
                    ("structure", structure.as_str()),
                    ("page", page_param.as_str()),
                ])
                .send()
                .await?;

            let status = response.status();
            if status == StatusCode::NO_CONTENT {
                tracing::debug!(page = page_number, "no content, pagination exhausted");
                break;
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(CovidError::UpstreamRequest {
                    status: status.as_u16(),
                    body,
                });
            }

            let body = response.text().await?;
            let page: PageBody =
                serde_json::from_str(&body).map_err(|e| CovidError::MalformedResponse {
                    message: format!("page {}: {}", page_number, e),
                })?;

            tracing::debug!(page = page_number, records = page.data.len(), "page received");
            records.extend(page.data);

            if page.pagination.next.is_none() {
                break;
            }
            page_number += 1;
        }

        tracing::info!(records = records.len(), pages = page_number, "fetch complete");
        Ok(Dataset::new(query.column_names(), records))
    }
}

#[async_trait]
impl DataSource for PagedFetcher {
    async fn fetch(&self, query: &Query) -> Result<Dataset> {
        PagedFetcher::fetch(self, query).await
    }
}
