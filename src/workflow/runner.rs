use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::job::{JobReport, TransportJob};
use super::state::{Event, StateMachine, Transition, WorkflowState};
use crate::confirmation::{CollectionConfirmation, ConfirmationWriter, LandingConfirmation};
use crate::remote::types::ReleaseRequest;
use crate::remote::{RemoteError, RemoteService};

/// Drives a single job from ACCEPTED to DONE or ABORTED.
///
/// Each iteration issues at most one remote call for the current state, feeds
/// the outcome to [`StateMachine`], then sleeps for the poll interval unless
/// the job became terminal. Transport failures leave the state untouched and
/// are retried on the next iteration, without limit.
pub struct WorkflowRunner<S, W> {
    remote: Arc<S>,
    writer: Arc<W>,
    poll_interval: Duration,
}

impl<S, W> Clone for WorkflowRunner<S, W> {
    fn clone(&self) -> Self {
        Self {
            remote: Arc::clone(&self.remote),
            writer: Arc::clone(&self.writer),
            poll_interval: self.poll_interval,
        }
    }
}

impl<S: RemoteService, W: ConfirmationWriter> WorkflowRunner<S, W> {
    pub fn new(remote: Arc<S>, writer: Arc<W>, poll_interval: Duration) -> Self {
        Self {
            remote,
            writer,
            poll_interval,
        }
    }

    pub async fn run(&self, mut job: TransportJob) -> JobReport {
        let started_at = Utc::now();
        info!(job_id = %job.job_id, product_id = %job.request.product_id, "executing workflow");

        while !job.state.is_terminal() {
            if job.state != WorkflowState::JobReleased {
                job.remote_calls += 1;
            }
            match self.observe(&job).await {
                Ok(Some(event)) => {
                    let transition = StateMachine::next(job.state, &event);
                    if transition == Transition::Next(WorkflowState::Done) {
                        self.confirm_landing(&job).await;
                    }
                    log_transition(&job, &event, &transition);
                    job.apply(&transition);
                }
                Ok(None) => break,
                Err(e) => {
                    job.transport_failures += 1;
                    warn!(
                        job_id = %job.job_id,
                        state = %job.state,
                        attempt = job.transport_failures,
                        error = %e,
                        "remote call failed, retrying after poll interval"
                    );
                }
            }

            if job.state.is_terminal() {
                break;
            }
            sleep(self.poll_interval).await;
        }

        let report = JobReport::from_job(&job, started_at);
        info!(
            job_id = %report.job_id,
            state = %report.state,
            duration_ms = report.duration_ms,
            "workflow finished"
        );
        report
    }

    /// Perform the single action owned by the job's current state.
    async fn observe(&self, job: &TransportJob) -> Result<Option<Event>, RemoteError> {
        let request = &job.request;
        let event = match job.state {
            WorkflowState::Accepted => {
                let release = ReleaseRequest {
                    product_id: request.product_id.clone(),
                    quantity: request.quantity,
                    collection_time: request.collection_time,
                };
                let response = self.remote.release_product(request.origin, &release).await?;
                if let Some(error) = &response.error {
                    debug!(job_id = %job.job_id, %error, "warehouse release reported an error");
                }
                Event::Release(response.status)
            }
            WorkflowState::ProductReleased | WorkflowState::JobPending => {
                let response = self.remote.query_job_status(&job.job_id).await?;
                Event::Carrier(response.status)
            }
            WorkflowState::JobReleased => {
                self.confirm_collection(job).await;
                Event::CollectionConfirmed
            }
            WorkflowState::LandedPolling => {
                let response = self
                    .remote
                    .query_warehouse_product_status(request.destination, &request.product_id)
                    .await?;
                Event::Landing(response.status)
            }
            WorkflowState::Done | WorkflowState::Aborted => return Ok(None),
        };
        Ok(Some(event))
    }

    async fn confirm_collection(&self, job: &TransportJob) {
        let confirmation = CollectionConfirmation {
            job_id: job.job_id.clone(),
            product_id: job.request.product_id.clone(),
            quantity: job.request.quantity,
            collection_time: job.request.collection_time,
        };
        if let Err(e) = self.writer.write_collection(&confirmation).await {
            warn!(job_id = %job.job_id, error = %e, "failed to write collection confirmation");
        }
    }

    async fn confirm_landing(&self, job: &TransportJob) {
        let confirmation = LandingConfirmation {
            warehouse: job.request.destination,
            product_id: job.request.product_id.clone(),
            quantity: job.request.quantity,
        };
        if let Err(e) = self.writer.write_landing(&confirmation).await {
            warn!(job_id = %job.job_id, error = %e, "failed to write landing confirmation");
        }
    }
}

fn log_transition(job: &TransportJob, event: &Event, transition: &Transition) {
    match transition {
        Transition::Next(next) if *next == job.state => {
            debug!(job_id = %job.job_id, state = %job.state, %event, "still waiting");
        }
        Transition::Next(next) => {
            info!(job_id = %job.job_id, from = %job.state, to = %next, %event, "state changed");
        }
        Transition::Abort { reason } => {
            warn!(job_id = %job.job_id, state = %job.state, %reason, "workflow aborted");
        }
        Transition::Halted(_) => {}
    }
}
