//! Async REST client for the review API.

use crate::error::ClientError;
use async_trait::async_trait;
use reviewdesk_domain::api::{
    ApproveRequest, BatchApproveRequest, BatchRejectRequest, BatchResult, CreateRecordRequest,
    EditRequest, ExportManifest, ExportRequest, NotificationStatus, RecordPage, RejectRequest,
    StatsResponse, REVIEWER_HEADER,
};
use reviewdesk_domain::record::FieldMap;
use reviewdesk_domain::traits::RecordQuery;
use reviewdesk_domain::{AuditEntry, ExtractionRecord, RecordId};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Source of authoritative record state for [`crate::RecordCache`]
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch one page of records
    async fn fetch_page(&self, query: &RecordQuery) -> Result<RecordPage, ClientError>;

    /// Fetch aggregate counts
    async fn fetch_stats(&self) -> Result<StatsResponse, ClientError>;
}

/// HTTP client for one reviewdesk server
#[derive(Debug, Clone)]
pub struct ReviewApiClient {
    http: reqwest::Client,
    base_url: String,
    reviewer: Option<String>,
}

impl ReviewApiClient {
    /// Create a client for `base_url` (e.g. `http://localhost:8000`)
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            reviewer: None,
        }
    }

    /// Identify mutating requests as coming from `reviewer`
    pub fn with_reviewer(mut self, reviewer: impl Into<String>) -> Self {
        self.reviewer = Some(reviewer.into());
        self
    }

    /// Server base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_identity(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.reviewer {
            Some(reviewer) => builder.header(REVIEWER_HEADER, reviewer),
            None => builder,
        }
    }

    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_body(status.as_u16(), &body));
        }
        Ok(response.json().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.http.get(self.url(path)).send().await?;
        Self::read(response).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let request = self.with_identity(self.http.post(self.url(path))).json(body);
        Self::read(request.send().await?).await
    }

    /// GET /health as raw JSON
    pub async fn health(&self) -> Result<serde_json::Value, ClientError> {
        self.get("/health").await
    }

    /// List records
    pub async fn list_records(&self, query: &RecordQuery) -> Result<RecordPage, ClientError> {
        let response = self
            .http
            .get(self.url("/api/v1/records"))
            .query(query)
            .send()
            .await?;
        Self::read(response).await
    }

    /// Register a freshly extracted record
    pub async fn create_record(
        &self,
        request: &CreateRecordRequest,
    ) -> Result<ExtractionRecord, ClientError> {
        self.post("/api/v1/records", request).await
    }

    /// Fetch one record
    pub async fn get_record(&self, id: RecordId) -> Result<ExtractionRecord, ClientError> {
        self.get(&format!("/api/v1/records/{}", id)).await
    }

    /// Aggregate counts
    pub async fn stats(&self) -> Result<StatsResponse, ClientError> {
        self.get("/api/v1/records/stats").await
    }

    /// Review history of one record, oldest first
    pub async fn audit_trail(&self, id: RecordId) -> Result<Vec<AuditEntry>, ClientError> {
        self.get(&format!("/api/v1/records/{}/audit", id)).await
    }

    /// Approve one record
    pub async fn approve(
        &self,
        id: RecordId,
        notes: Option<String>,
    ) -> Result<ExtractionRecord, ClientError> {
        self.post(
            &format!("/api/v1/records/{}/approve", id),
            &ApproveRequest { notes },
        )
        .await
    }

    /// Reject one record
    pub async fn reject(&self, id: RecordId, reason: &str) -> Result<ExtractionRecord, ClientError> {
        self.post(
            &format!("/api/v1/records/{}/reject", id),
            &RejectRequest {
                reason: reason.to_string(),
            },
        )
        .await
    }

    /// Replace the edited payload of one record
    pub async fn edit(
        &self,
        id: RecordId,
        data: FieldMap,
        notes: Option<String>,
    ) -> Result<ExtractionRecord, ClientError> {
        let request = self
            .with_identity(self.http.put(self.url(&format!("/api/v1/records/{}", id))))
            .json(&EditRequest { data, notes });
        Self::read(request.send().await?).await
    }

    /// Approve many records
    pub async fn approve_batch(
        &self,
        record_ids: Vec<RecordId>,
        notes: Option<String>,
    ) -> Result<BatchResult, ClientError> {
        self.post(
            "/api/v1/records/approve-batch",
            &BatchApproveRequest { record_ids, notes },
        )
        .await
    }

    /// Reject many records with one reason
    pub async fn reject_batch(
        &self,
        record_ids: Vec<RecordId>,
        reason: &str,
    ) -> Result<BatchResult, ClientError> {
        self.post(
            "/api/v1/records/reject-batch",
            &BatchRejectRequest {
                record_ids,
                reason: reason.to_string(),
            },
        )
        .await
    }

    /// Select records for export and mark approved ones exported
    pub async fn export(&self, request: &ExportRequest) -> Result<ExportManifest, ClientError> {
        self.post("/api/v1/records/export", request).await
    }

    /// Hub counters
    pub async fn notification_status(&self) -> Result<NotificationStatus, ClientError> {
        self.get("/api/v1/notifications/status").await
    }

    /// WebSocket URL of the notification endpoint
    pub fn notifications_url(&self) -> String {
        let base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.base_url.clone()
        };
        format!("{}/ws/notifications", base)
    }
}

#[async_trait]
impl RecordSource for ReviewApiClient {
    async fn fetch_page(&self, query: &RecordQuery) -> Result<RecordPage, ClientError> {
        self.list_records(query).await
    }

    async fn fetch_stats(&self) -> Result<StatsResponse, ClientError> {
        self.stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notifications_url() {
        let client = ReviewApiClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(
            client.notifications_url(),
            "ws://localhost:8000/ws/notifications"
        );

        let secure = ReviewApiClient::new("https://review.example.com");
        assert_eq!(
            secure.notifications_url(),
            "wss://review.example.com/ws/notifications"
        );
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let client = ReviewApiClient::new("http://127.0.0.1:9");
        let result = client.stats().await;
        assert!(matches!(result, Err(ClientError::Connection(_))));
    }
}
