//! HTTP access to the test results service
//!
//! One GET per page with HTTP Basic credentials. Transport failures and
//! error statuses become [`FetchError::Network`], 401/403 become
//! [`FetchError::Unauthorized`], and a success body that is not a list of
//! records (bare or paginated) becomes [`FetchError::Decode`].

use super::record::Page;
use super::{FetchError, RecordSource, ResultSet};
use crate::config::{ResourceMode, ServiceConfig};
use crate::session::FetchRequest;
use anyhow::{Context, Result};
use protocol::{ParameterMap, TestType, SHARED_RESOURCE};
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct HttpFetcher {
    client: Client,
    base_url: Url,
    resource_mode: ResourceMode,
    max_pages: u32,
}

impl HttpFetcher {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let mut base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid service base_url: {}", config.base_url))?;

        // Url::join replaces the last segment unless the path ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut builder = Client::builder()
            .user_agent(concat!("livelab/", env!("CARGO_PKG_VERSION")));
        if config.timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(config.timeout_ms));
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        info!(
            "Results service at {} ({:?} resources, timeout {}ms)",
            base_url, config.resource_mode, config.timeout_ms
        );

        Ok(Self {
            client,
            base_url,
            resource_mode: config.resource_mode,
            max_pages: config.max_pages.max(1),
        })
    }

    /// Collection URL queried for `test_type`
    pub fn endpoint(&self, test_type: TestType) -> Result<Url, FetchError> {
        let resource = match self.resource_mode {
            ResourceMode::Shared => SHARED_RESOURCE,
            ResourceMode::PerType => test_type.resource(),
        };

        self.base_url
            .join(&format!("{}/", resource))
            .map_err(|e| FetchError::Network(format!("Invalid endpoint for {}: {}", resource, e)))
    }

    async fn get_page(
        &self,
        url: Url,
        request: &FetchRequest,
        params: Option<&ParameterMap>,
    ) -> Result<Page, FetchError> {
        let credentials = &request.credentials;
        let mut builder = self
            .client
            .get(url.clone())
            .basic_auth(credentials.username(), Some(credentials.password()));
        if let Some(params) = params {
            builder = builder.query(params);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::Unauthorized);
        }
        if !status.is_success() {
            return Err(FetchError::Network(format!(
                "Results service returned {} for {}",
                status, url
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(format!("Failed to read response body: {}", e)))?;

        serde_json::from_slice(&body)
            .map_err(|e| FetchError::Decode(format!("Expected a list of test records: {}", e)))
    }
}

impl RecordSource for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<ResultSet, FetchError> {
        let url = self.endpoint(request.test_type)?;
        debug!(
            generation = request.generation,
            test_type = %request.test_type,
            params = request.params.len(),
            "GET {}",
            url
        );

        let (mut records, mut next) = self
            .get_page(url, request, Some(&request.params))
            .await?
            .into_parts();
        let mut pages = 1;

        while let Some(link) = next {
            if pages >= self.max_pages {
                warn!(
                    generation = request.generation,
                    max_pages = self.max_pages,
                    "Page limit reached, remaining results were not fetched"
                );
                break;
            }

            let url = self
                .base_url
                .join(&link)
                .map_err(|e| FetchError::Decode(format!("Invalid next link {:?}: {}", link, e)))?;
            // credentials only go to the configured service
            if url.origin() != self.base_url.origin() {
                warn!(
                    generation = request.generation,
                    next = %url,
                    "Next page is on another host, remaining results were not fetched"
                );
                break;
            }
            let (page, following) = self.get_page(url, request, None).await?.into_parts();
            records.extend(page);
            next = following;
            pages += 1;
        }

        debug!(
            generation = request.generation,
            records = records.len(),
            pages,
            "Fetched test records"
        );
        Ok(records)
    }
}
