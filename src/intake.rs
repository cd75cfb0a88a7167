//! Validation and carrier submission of new transport jobs.
//!
//! [`Intake::request_job`] is the single entry point for inbound job
//! requests: it validates the raw submission, asks the carrier to create the
//! job, and on acceptance hands it to the [`Scheduler`] and starts it.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::confirmation::ConfirmationWriter;
use crate::error::ConvoyError;
use crate::remote::{CreateJobResponse, CreateJobStatus, JobRequest, RemoteService, Site};
use crate::scheduler::Scheduler;
use crate::workflow::TransportJob;

/// An inbound job request before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSubmission {
    #[serde(alias = "client_id")]
    pub client_id: String,
    #[serde(alias = "product_id")]
    pub product_id: String,
    pub quantity: u32,
    pub origin: String,
    pub destination: String,
    #[serde(alias = "collection_time")]
    pub collection_time: String,
}

#[derive(Debug, Deserialize)]
struct JobFile {
    #[serde(default)]
    jobs: Vec<JobSubmission>,
}

impl JobSubmission {
    /// Read a batch of submissions from `path`.
    ///
    /// `.toml` files hold a `[[jobs]]` array of tables; anything else is
    /// parsed as a JSON array of submissions.
    pub fn load_all(path: &Path) -> Result<Vec<JobSubmission>, ConvoyError> {
        let contents = std::fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            Ok(toml::from_str::<JobFile>(&contents)?.jobs)
        } else {
            Ok(serde_json::from_str(&contents)?)
        }
    }
}

impl TryFrom<JobSubmission> for JobRequest {
    type Error = ConvoyError;

    fn try_from(submission: JobSubmission) -> Result<Self, Self::Error> {
        if submission.client_id.trim().is_empty() {
            return Err(ConvoyError::Validation("clientId must not be empty".into()));
        }
        if submission.product_id.trim().is_empty() {
            return Err(ConvoyError::Validation("productId must not be empty".into()));
        }
        if submission.product_id.contains(['/', '\\']) {
            return Err(ConvoyError::Validation(
                "productId must not contain path separators".into(),
            ));
        }
        if submission.quantity == 0 {
            return Err(ConvoyError::Validation("quantity must be positive".into()));
        }

        let origin: Site = submission
            .origin
            .parse()
            .map_err(|e| ConvoyError::Validation(format!("origin: {e}")))?;
        let destination: Site = submission
            .destination
            .parse()
            .map_err(|e| ConvoyError::Validation(format!("destination: {e}")))?;
        if origin == destination {
            return Err(ConvoyError::Validation(
                "origin is the same as destination".into(),
            ));
        }

        let collection_time = DateTime::parse_from_rfc3339(&submission.collection_time)
            .map_err(|e| {
                ConvoyError::Validation(format!(
                    "collectionTime {:?} is not an ISO-8601 timestamp: {e}",
                    submission.collection_time
                ))
            })?
            .with_timezone(&Utc);

        Ok(JobRequest {
            client_id: submission.client_id,
            product_id: submission.product_id,
            quantity: submission.quantity,
            origin,
            destination,
            collection_time,
        })
    }
}

pub struct Intake<S, W> {
    remote: Arc<S>,
    scheduler: Scheduler<S, W>,
}

impl<S, W> Intake<S, W>
where
    S: RemoteService + 'static,
    W: ConfirmationWriter + 'static,
{
    pub fn new(remote: Arc<S>, scheduler: Scheduler<S, W>) -> Self {
        Self { remote, scheduler }
    }

    pub fn scheduler(&self) -> &Scheduler<S, W> {
        &self.scheduler
    }

    /// Validate a submission and ask the carrier to take the job.
    ///
    /// `ACCEPT` enqueues the job and starts the scheduler; `REJECT` is returned
    /// as-is; `ERROR` and transport failures become `Err`.
    pub async fn request_job(
        &self,
        submission: JobSubmission,
    ) -> Result<CreateJobResponse, ConvoyError> {
        let request = JobRequest::try_from(submission)?;
        let response = self.remote.create_job(&request).await?;
        info!(
            product_id = %request.product_id,
            status = ?response.status,
            job_id = ?response.job_id,
            "carrier answered job request"
        );

        match response.status {
            CreateJobStatus::Accept => {
                let job_id = response
                    .job_id
                    .clone()
                    .filter(|id| !id.is_empty())
                    .ok_or_else(|| {
                        ConvoyError::CreateJob("carrier accepted the job without a jobId".into())
                    })?;
                self.scheduler
                    .enqueue(TransportJob::accepted(job_id, request))
                    .await;
                self.scheduler.start().await;
            }
            CreateJobStatus::Reject => {
                info!(product_id = %request.product_id, "carrier rejected job request");
            }
            CreateJobStatus::Error => {
                let message = response
                    .error
                    .unwrap_or_else(|| "unknown carrier error".to_string());
                warn!(product_id = %request.product_id, %message, "carrier failed to create job");
                return Err(ConvoyError::CreateJob(message));
            }
        }

        Ok(response)
    }
}
