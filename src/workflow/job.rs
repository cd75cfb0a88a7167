use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::{Transition, WorkflowState};
use crate::remote::JobRequest;

/// A carrier-accepted transport job and its workflow progress.
#[derive(Debug, Clone)]
pub struct TransportJob {
    pub job_id: String,
    pub request: JobRequest,
    pub state: WorkflowState,
    /// States left behind, in order. Polling self-loops are not repeated.
    pub state_history: Vec<WorkflowState>,
    pub remote_calls: u32,
    pub transport_failures: u32,
    pub abort_reason: Option<String>,
    pub accepted_at: DateTime<Utc>,
}

impl TransportJob {
    pub fn accepted(job_id: String, request: JobRequest) -> Self {
        Self {
            job_id,
            request,
            state: WorkflowState::Accepted,
            state_history: Vec::new(),
            remote_calls: 0,
            transport_failures: 0,
            abort_reason: None,
            accepted_at: Utc::now(),
        }
    }

    /// Apply a state machine transition to this job.
    pub fn apply(&mut self, transition: &Transition) {
        match transition {
            Transition::Next(next) => self.move_to(*next),
            Transition::Abort { reason } => {
                self.abort_reason = Some(reason.clone());
                self.move_to(WorkflowState::Aborted);
            }
            Transition::Halted(_) => {}
        }
    }

    fn move_to(&mut self, next: WorkflowState) {
        if next != self.state {
            self.state_history.push(self.state);
            self.state = next;
        }
    }
}

/// Summary produced when a job's workflow ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub job_id: String,
    pub product_id: String,
    pub state: WorkflowState,
    pub state_transitions: Vec<WorkflowState>,
    pub remote_calls: u32,
    pub transport_failures: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abort_reason: Option<String>,
    pub accepted_at: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: i64,
}

impl JobReport {
    pub fn from_job(job: &TransportJob, started_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        let mut transitions = job.state_history.clone();
        transitions.push(job.state);

        Self {
            job_id: job.job_id.clone(),
            product_id: job.request.product_id.clone(),
            state: job.state,
            state_transitions: transitions,
            remote_calls: job.remote_calls,
            transport_failures: job.transport_failures,
            abort_reason: job.abort_reason.clone(),
            accepted_at: job.accepted_at,
            started_at,
            completed_at: now,
            duration_ms: (now - started_at).num_milliseconds(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.state == WorkflowState::Done
    }
}
