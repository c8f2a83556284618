/// Deel REST client for contract fetching and timesheet submission
use std::time::Duration;

use async_trait::async_trait;
use deelbridge_core::deel_ports::{ContractQuery, DeelGateway, TimesheetDraft, TimesheetId};
use deelbridge_domain::{Contract, DeelApiConfig, DeelBridgeError, Result};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::http::HttpClient;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client for the Deel REST v2 API.
///
/// Pagination and submission are strictly sequential; a non-success
/// response aborts the call with the status code and raw body, and no
/// partial result is returned.
pub struct DeelClient {
    base_url: String,
    api_token: String,
    http_client: HttpClient,
}

impl DeelClient {
    /// Create a new client from resolved API credentials.
    pub fn new(config: &DeelApiConfig) -> Result<Self> {
        let http_client =
            HttpClient::builder().timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS)).build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            http_client,
        })
    }

    async fn fetch_page(
        &self,
        query: &ContractQuery,
        cursor: Option<&str>,
    ) -> Result<ContractsEnvelope> {
        let endpoint = format!("{}/rest/v2/contracts", self.base_url);

        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(cursor) = cursor {
            params.push(("after_cursor", cursor.to_string()));
        }
        if !query.statuses.is_empty() {
            let encoded = serde_json::to_string(&query.statuses)
                .map_err(|err| DeelBridgeError::Internal(format!("status filter encode: {err}")))?;
            params.push(("statuses", encoded));
        }
        if let Some(search) = query.search.as_deref() {
            params.push(("search", search.to_string()));
        }

        let request = self
            .http_client
            .request(Method::GET, &endpoint)
            .bearer_auth(&self.api_token)
            .query(&params);

        let response = self.http_client.send(request).await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DeelBridgeError::Api { status: status.as_u16(), body });
        }

        response
            .json::<ContractsEnvelope>()
            .await
            .map_err(|err| DeelBridgeError::Internal(format!("contracts response parse: {err}")))
    }
}

#[async_trait]
impl DeelGateway for DeelClient {
    async fn fetch_contracts(&self, query: &ContractQuery) -> Result<Vec<Contract>> {
        let mut contracts = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self.fetch_page(query, cursor.as_deref()).await?;
            let page_len = page.data.len();
            contracts.extend(page.data);

            debug!(page_rows = page_len, total = contracts.len(), "fetched contracts page");

            cursor = page.page.and_then(|p| p.cursor).filter(|c| !c.is_empty());
            if page_len == 0 || cursor.is_none() {
                break;
            }
        }

        info!(count = contracts.len(), "fetched contracts from Deel");
        Ok(contracts)
    }

    async fn submit_timesheet(&self, draft: &TimesheetDraft) -> Result<TimesheetId> {
        let endpoint = format!("{}/rest/v2/timesheets", self.base_url);

        let payload = TimesheetRequest {
            data: TimesheetPayload {
                quantity: draft.quantity,
                contract_id: &draft.contract_id,
                description: &draft.description,
                date_submitted: &draft.date_submitted,
                is_auto_approved: draft.is_auto_approved,
            },
        };

        let request = self
            .http_client
            .request(Method::POST, &endpoint)
            .bearer_auth(&self.api_token)
            .json(&payload);

        let response = self.http_client.send(request).await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DeelBridgeError::Api { status: status.as_u16(), body });
        }

        let envelope = response
            .json::<TimesheetEnvelope>()
            .await
            .map_err(|err| DeelBridgeError::Internal(format!("timesheet response parse: {err}")))?;

        debug!(timesheet_id = %envelope.data.id, status = %envelope.data.status, "timesheet created");
        Ok(envelope.data.id)
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct ContractsEnvelope {
    data: Vec<Contract>,
    #[serde(default)]
    page: Option<PageInfo>,
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    #[serde(default)]
    cursor: Option<String>,
}

#[derive(Debug, Serialize)]
struct TimesheetRequest<'a> {
    data: TimesheetPayload<'a>,
}

#[derive(Debug, Serialize)]
struct TimesheetPayload<'a> {
    quantity: f64,
    contract_id: &'a str,
    description: &'a str,
    date_submitted: &'a str,
    is_auto_approved: bool,
}

#[derive(Debug, Deserialize)]
struct TimesheetEnvelope {
    data: TimesheetRecord,
}

#[derive(Debug, Deserialize)]
struct TimesheetRecord {
    id: String,
    #[serde(default)]
    status: String,
}
