//! Concurrency-limited scheduling of transport job workflows.
//!
//! The [`Scheduler`] owns the pending queue, the in-flight counter and the run
//! flag behind a single lock. At most one admission loop exists at a time; it
//! admits a batch of up to `max_concurrency - in_flight` jobs in FIFO order,
//! runs them concurrently, and re-evaluates the queue once the whole batch has
//! finished. Runners report completion over a channel and never touch the
//! shared state themselves.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinError;
use tracing::{debug, error, info, warn};

use crate::confirmation::ConfirmationWriter;
use crate::remote::RemoteService;
use crate::workflow::{JobReport, TransportJob, WorkflowRunner, WorkflowState};

/// Where a job currently is from the scheduler's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Queued,
    Running,
    Finished(WorkflowState),
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobPhase::Queued => write!(f, "QUEUED"),
            JobPhase::Running => write!(f, "RUNNING"),
            JobPhase::Finished(state) => write!(f, "FINISHED ({state})"),
        }
    }
}

#[derive(Default)]
struct SchedulerState {
    queue: VecDeque<TransportJob>,
    in_flight: usize,
    running: bool,
    loop_active: bool,
    phases: HashMap<String, JobPhase>,
    reports: Vec<JobReport>,
}

struct Inner<S, W> {
    runner: WorkflowRunner<S, W>,
    max_concurrency: usize,
    state: Mutex<SchedulerState>,
    idle: watch::Sender<bool>,
}

type Completion = (String, Result<JobReport, JoinError>);

pub struct Scheduler<S, W> {
    inner: Arc<Inner<S, W>>,
}

impl<S, W> Clone for Scheduler<S, W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, W> Scheduler<S, W>
where
    S: RemoteService + 'static,
    W: ConfirmationWriter + 'static,
{
    pub fn new(runner: WorkflowRunner<S, W>, max_concurrency: usize) -> Self {
        let (idle, _) = watch::channel(true);
        Self {
            inner: Arc::new(Inner {
                runner,
                max_concurrency: max_concurrency.max(1),
                state: Mutex::new(SchedulerState::default()),
                idle,
            }),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.inner.max_concurrency
    }

    /// Append a job to the pending queue. Does not start admission.
    pub async fn enqueue(&self, job: TransportJob) {
        let mut state = self.inner.state.lock().await;
        debug!(job_id = %job.job_id, queued = state.queue.len() + 1, "job enqueued");
        state.phases.insert(job.job_id.clone(), JobPhase::Queued);
        state.queue.push_back(job);
    }

    /// Set the run flag and make sure an admission loop is working the queue.
    ///
    /// Calling this while a loop is already active only re-arms the flag.
    pub async fn start(&self) {
        let mut state = self.inner.state.lock().await;
        state.running = true;
        if state.loop_active {
            debug!("admission loop already active");
            return;
        }
        if state.queue.is_empty() {
            state.running = false;
            return;
        }
        state.loop_active = true;
        self.inner.idle.send_replace(false);
        drop(state);

        info!("start executing tasks");
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.admission_loop().await });
    }

    /// Clear the run flag. Admitted runners keep going; no new jobs are admitted.
    pub async fn stop(&self) {
        let mut state = self.inner.state.lock().await;
        if state.running {
            info!("stop executing tasks");
            state.running = false;
        }
    }

    pub async fn is_running(&self) -> bool {
        self.inner.state.lock().await.running
    }

    pub async fn in_flight(&self) -> usize {
        self.inner.state.lock().await.in_flight
    }

    pub async fn queued(&self) -> usize {
        self.inner.state.lock().await.queue.len()
    }

    pub async fn job_phase(&self, job_id: &str) -> Option<JobPhase> {
        self.inner.state.lock().await.phases.get(job_id).copied()
    }

    /// Remove and return the reports of every job finished so far.
    pub async fn take_reports(&self) -> Vec<JobReport> {
        std::mem::take(&mut self.inner.state.lock().await.reports)
    }

    /// Resolve once no admission loop is active.
    pub async fn wait_idle(&self) {
        let mut idle = self.inner.idle.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = idle.wait_for(|idle| *idle).await;
    }
}

impl<S, W> Inner<S, W>
where
    S: RemoteService + 'static,
    W: ConfirmationWriter + 'static,
{
    async fn admission_loop(self: Arc<Self>) {
        info!("start executing workflows");

        loop {
            let batch = self.admit_batch().await;
            if batch.is_empty() {
                break;
            }
            info!(count = batch.len(), "admitted concurrent jobs");

            let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();
            for job in batch {
                let job_id = job.job_id.clone();
                let runner = self.runner.clone();
                let done_tx = done_tx.clone();
                tokio::spawn(async move {
                    let outcome = tokio::spawn(async move { runner.run(job).await }).await;
                    // The loop stops listening only after every completion arrived.
                    let _ = done_tx.send((job_id, outcome));
                });
            }
            drop(done_tx);

            while let Some((job_id, outcome)) = done_rx.recv().await {
                self.complete(job_id, outcome).await;
            }
        }
    }

    /// Take the next batch from the queue, or mark the loop inactive and
    /// return an empty batch when there is nothing to admit.
    async fn admit_batch(&self) -> Vec<TransportJob> {
        let mut state = self.state.lock().await;
        if !state.running || state.queue.is_empty() {
            if state.queue.is_empty() {
                state.running = false;
            }
            self.deactivate(&mut state);
            return Vec::new();
        }

        let room = self.max_concurrency.saturating_sub(state.in_flight);
        let take = room.min(state.queue.len());
        if take == 0 {
            warn!(in_flight = state.in_flight, "no room to admit jobs");
            self.deactivate(&mut state);
            return Vec::new();
        }

        let batch: Vec<TransportJob> = state.queue.drain(..take).collect();
        state.in_flight += batch.len();
        for job in &batch {
            state.phases.insert(job.job_id.clone(), JobPhase::Running);
        }
        batch
    }

    /// Mark the loop inactive while still holding the state lock, so a
    /// concurrent `start` either sees the loop active or spawns a fresh one.
    fn deactivate(&self, state: &mut SchedulerState) {
        state.loop_active = false;
        self.idle.send_replace(true);
        debug!(queued = state.queue.len(), "admission loop exiting");
    }

    async fn complete(&self, job_id: String, outcome: Result<JobReport, JoinError>) {
        let mut state = self.state.lock().await;
        state.in_flight = state.in_flight.saturating_sub(1);
        match outcome {
            Ok(report) => {
                state.phases.insert(job_id, JobPhase::Finished(report.state));
                state.reports.push(report);
            }
            Err(e) => {
                error!(%job_id, error = %e, "workflow task failed");
                state.phases.insert(job_id, JobPhase::Finished(WorkflowState::Aborted));
            }
        }
    }
}
