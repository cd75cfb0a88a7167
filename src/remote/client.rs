use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::RemoteError;
use super::types::{
    CreateJobResponse, JobRequest, JobStatusResponse, LandingResponse, ReleaseRequest,
    ReleaseResponse, Site,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:4001";

/// The carrier/warehouse boundary consumed by intake and the workflow runner.
///
/// Implementations return `Err` only when no status payload could be obtained.
pub trait RemoteService: Send + Sync {
    fn create_job(
        &self,
        job: &JobRequest,
    ) -> impl Future<Output = Result<CreateJobResponse, RemoteError>> + Send;

    fn query_job_status(
        &self,
        job_id: &str,
    ) -> impl Future<Output = Result<JobStatusResponse, RemoteError>> + Send;

    fn release_product(
        &self,
        warehouse: Site,
        release: &ReleaseRequest,
    ) -> impl Future<Output = Result<ReleaseResponse, RemoteError>> + Send;

    fn query_warehouse_product_status(
        &self,
        warehouse: Site,
        product_id: &str,
    ) -> impl Future<Output = Result<LandingResponse, RemoteError>> + Send;
}

/// [`RemoteService`] over HTTP/JSON.
pub struct HttpRemoteClient {
    client: Client,
    base_url: Url,
}

impl HttpRemoteClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let base_url =
            Url::parse(base_url).map_err(|e| RemoteError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(RemoteError::InvalidUrl(base_url.to_string()));
        }
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Decode a status payload regardless of the HTTP status code; the remote
    /// reports some business errors with 400 and a regular status body.
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
        let status = response.status();
        let body = response.text().await?;
        match serde_json::from_str::<T>(&body) {
            Ok(payload) => Ok(payload),
            Err(e) if status.is_success() => Err(RemoteError::Decode(e.to_string())),
            Err(_) => Err(RemoteError::Api {
                status: status.as_u16(),
                message: body,
            }),
        }
    }
}

impl RemoteService for HttpRemoteClient {
    async fn create_job(&self, job: &JobRequest) -> Result<CreateJobResponse, RemoteError> {
        let url = self.endpoint(&["carrier", "request-job"])?;
        debug!(%url, product_id = %job.product_id, "requesting carrier job");
        let response = self.client.post(url).json(job).send().await?;
        Self::decode(response).await
    }

    async fn query_job_status(&self, job_id: &str) -> Result<JobStatusResponse, RemoteError> {
        let url = self.endpoint(&["carrier", "job", job_id, "status"])?;
        let response = self.client.get(url).send().await?;
        Self::decode(response).await
    }

    async fn release_product(
        &self,
        warehouse: Site,
        release: &ReleaseRequest,
    ) -> Result<ReleaseResponse, RemoteError> {
        let url = self.endpoint(&["warehouse", warehouse.as_str(), "release"])?;
        let response = self.client.post(url).json(release).send().await?;
        Self::decode(response).await
    }

    async fn query_warehouse_product_status(
        &self,
        warehouse: Site,
        product_id: &str,
    ) -> Result<LandingResponse, RemoteError> {
        let url = self.endpoint(&["warehouse", warehouse.as_str(), "product", product_id, "status"])?;
        let response = self.client.get(url).send().await?;
        Self::decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::types::{
        CarrierJobStatus, CreateJobStatus, LandingStatus, ReleaseStatus,
    };
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> HttpRemoteClient {
        HttpRemoteClient::new(&server.uri(), Duration::from_secs(2)).unwrap()
    }

    fn sample_job() -> JobRequest {
        JobRequest {
            client_id: "client-1".into(),
            product_id: "wine-42".into(),
            quantity: 6,
            origin: Site::A,
            destination: Site::B,
            collection_time: "2026-10-20T11:00:00Z".parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn create_job_posts_request_and_reads_acceptance() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/carrier/request-job"))
            .and(body_json(json!({
                "clientId": "client-1",
                "productId": "wine-42",
                "quantity": 6,
                "origin": "A",
                "destination": "B",
                "collectionTime": "2026-10-20T11:00:00Z"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "ACCEPT", "jobId": "job_xyz"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let resp = client_for(&server).create_job(&sample_job()).await.unwrap();
        assert_eq!(resp.status, CreateJobStatus::Accept);
        assert_eq!(resp.job_id.as_deref(), Some("job_xyz"));
    }

    #[tokio::test]
    async fn business_error_on_400_is_a_payload_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/carrier/request-job"))
            .respond_with(ResponseTemplate::new(400).set_body_json(
                json!({"status": "ERROR", "error": "Invalid origin or destination"}),
            ))
            .mount(&server)
            .await;

        let resp = client_for(&server).create_job(&sample_job()).await.unwrap();
        assert_eq!(resp.status, CreateJobStatus::Error);
        assert_eq!(resp.error.as_deref(), Some("Invalid origin or destination"));
    }

    #[tokio::test]
    async fn query_job_status_hits_job_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/carrier/job/job_xyz/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "NOT FOUND"})))
            .mount(&server)
            .await;

        let resp = client_for(&server).query_job_status("job_xyz").await.unwrap();
        assert_eq!(resp.status, CarrierJobStatus::NotFound);
    }

    #[tokio::test]
    async fn release_product_posts_to_origin_warehouse() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/warehouse/A/release"))
            .and(body_json(json!({
                "productId": "wine-42",
                "quantity": 6,
                "collectionTime": "2026-10-20T11:00:00Z"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "SUCCESS"})))
            .expect(1)
            .mount(&server)
            .await;

        let release = ReleaseRequest {
            product_id: "wine-42".into(),
            quantity: 6,
            collection_time: "2026-10-20T11:00:00Z".parse().unwrap(),
        };
        let resp = client_for(&server).release_product(Site::A, &release).await.unwrap();
        assert_eq!(resp.status, ReleaseStatus::Success);
    }

    #[tokio::test]
    async fn warehouse_status_hits_product_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/warehouse/B/product/wine-42/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "LANDED"})))
            .mount(&server)
            .await;

        let resp = client_for(&server)
            .query_warehouse_product_status(Site::B, "wine-42")
            .await
            .unwrap();
        assert_eq!(resp.status, LandingStatus::Landed);
    }

    #[tokio::test]
    async fn unrecognised_error_body_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/carrier/job/job_xyz/status"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .mount(&server)
            .await;

        let err = client_for(&server).query_job_status("job_xyz").await.unwrap_err();
        match err {
            RemoteError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "upstream unavailable");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_success_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/carrier/job/job_xyz/status"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let err = client_for(&server).query_job_status("job_xyz").await.unwrap_err();
        assert!(matches!(err, RemoteError::Decode(_)));
    }

    #[tokio::test]
    async fn refused_connection_is_http_error() {
        let client = HttpRemoteClient::new("http://127.0.0.1:1", Duration::from_secs(1)).unwrap();
        let err = client.query_job_status("job_xyz").await.unwrap_err();
        assert!(matches!(err, RemoteError::Http(_)));
    }

    #[test]
    fn rejects_unusable_base_url() {
        assert!(matches!(
            HttpRemoteClient::new("not a url", Duration::from_secs(1)),
            Err(RemoteError::InvalidUrl(_))
        ));
        assert!(matches!(
            HttpRemoteClient::new("mailto:ops@example.com", Duration::from_secs(1)),
            Err(RemoteError::InvalidUrl(_))
        ));
    }

    #[test]
    fn endpoint_joins_segments_under_base_path() {
        let client =
            HttpRemoteClient::new("http://remote.test/api/", Duration::from_secs(1)).unwrap();
        let url = client.endpoint(&["carrier", "job", "job 1", "status"]).unwrap();
        assert_eq!(url.as_str(), "http://remote.test/api/carrier/job/job%201/status");
    }
}
