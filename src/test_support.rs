//! Scripted collaborators shared by the workflow, scheduler and intake tests.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;

use crate::confirmation::{CollectionConfirmation, ConfirmationWriter, LandingConfirmation};
use crate::error::ConvoyError;
use crate::remote::types::{
    JobStatusResponse, LandingResponse, ReleaseRequest, ReleaseResponse,
};
use crate::remote::{
    CarrierJobStatus, CreateJobResponse, CreateJobStatus, JobRequest, LandingStatus,
    ReleaseStatus, RemoteError, RemoteService, Site,
};

pub fn sample_request(product_id: &str) -> JobRequest {
    JobRequest {
        client_id: "client-1".into(),
        product_id: product_id.into(),
        quantity: 6,
        origin: Site::A,
        destination: Site::B,
        collection_time: "2026-10-20T11:00:00Z".parse().unwrap(),
    }
}

/// Ordered record of every remote call and confirmation write.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Queue of scripted replies; `None` stands for a transport failure. Once the
/// queue is empty every call gets the fallback reply.
struct Script<T> {
    queue: Mutex<VecDeque<Option<T>>>,
    fallback: T,
}

impl<T: Copy> Script<T> {
    fn new(fallback: T) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback,
        }
    }

    fn set(&self, replies: impl IntoIterator<Item = Option<T>>) {
        *self.queue.lock().unwrap() = replies.into_iter().collect();
    }

    fn next(&self) -> Result<T, RemoteError> {
        match self.queue.lock().unwrap().pop_front() {
            Some(Some(reply)) => Ok(reply),
            Some(None) => Err(RemoteError::Decode("scripted transport failure".into())),
            None => Ok(self.fallback),
        }
    }
}

/// A [`RemoteService`] whose answers default to the happy path.
pub struct ScriptedRemote {
    create: Mutex<VecDeque<Option<CreateJobResponse>>>,
    release: Script<ReleaseStatus>,
    job_status: Script<CarrierJobStatus>,
    landing: Script<LandingStatus>,
    release_gate: Option<Arc<Semaphore>>,
    issued_ids: AtomicUsize,
    active_releases: AtomicUsize,
    max_active_releases: AtomicUsize,
    calls: CallLog,
}

impl ScriptedRemote {
    pub fn new() -> Self {
        Self {
            create: Mutex::new(VecDeque::new()),
            release: Script::new(ReleaseStatus::Success),
            job_status: Script::new(CarrierJobStatus::Released),
            landing: Script::new(LandingStatus::Landed),
            release_gate: None,
            issued_ids: AtomicUsize::new(0),
            active_releases: AtomicUsize::new(0),
            max_active_releases: AtomicUsize::new(0),
            calls: CallLog::default(),
        }
    }

    pub fn create(self, replies: impl IntoIterator<Item = Option<CreateJobResponse>>) -> Self {
        *self.create.lock().unwrap() = replies.into_iter().collect();
        self
    }

    pub fn release(self, replies: impl IntoIterator<Item = Option<ReleaseStatus>>) -> Self {
        self.release.set(replies);
        self
    }

    pub fn job_status(self, replies: impl IntoIterator<Item = Option<CarrierJobStatus>>) -> Self {
        self.job_status.set(replies);
        self
    }

    pub fn landing(self, replies: impl IntoIterator<Item = Option<LandingStatus>>) -> Self {
        self.landing.set(replies);
        self
    }

    /// Block every release call until a permit is available on `gate`.
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.release_gate = Some(gate);
        self
    }

    pub fn calls(&self) -> CallLog {
        self.calls.clone()
    }

    pub fn max_active_releases(&self) -> usize {
        self.max_active_releases.load(Ordering::SeqCst)
    }
}

impl RemoteService for ScriptedRemote {
    async fn create_job(&self, job: &JobRequest) -> Result<CreateJobResponse, RemoteError> {
        self.calls.push(format!("create:{}", job.product_id));
        let scripted = self.create.lock().unwrap().pop_front();
        match scripted {
            Some(Some(reply)) => Ok(reply),
            Some(None) => Err(RemoteError::Decode("scripted transport failure".into())),
            None => {
                let n = self.issued_ids.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(CreateJobResponse {
                    status: CreateJobStatus::Accept,
                    job_id: Some(format!("job_{n}")),
                    error: None,
                    collection_time: Some(job.collection_time),
                })
            }
        }
    }

    async fn query_job_status(&self, job_id: &str) -> Result<JobStatusResponse, RemoteError> {
        self.calls.push(format!("status:{job_id}"));
        let status = self.job_status.next()?;
        Ok(JobStatusResponse { status })
    }

    async fn release_product(
        &self,
        warehouse: Site,
        release: &ReleaseRequest,
    ) -> Result<ReleaseResponse, RemoteError> {
        self.calls.push(format!("release:{warehouse}:{}", release.product_id));
        let active = self.active_releases.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active_releases.fetch_max(active, Ordering::SeqCst);
        if let Some(gate) = &self.release_gate {
            let permit = gate.acquire().await.unwrap();
            permit.forget();
        }
        self.active_releases.fetch_sub(1, Ordering::SeqCst);
        let status = self.release.next()?;
        Ok(ReleaseResponse {
            status,
            error: None,
        })
    }

    async fn query_warehouse_product_status(
        &self,
        warehouse: Site,
        product_id: &str,
    ) -> Result<LandingResponse, RemoteError> {
        self.calls.push(format!("landing:{warehouse}:{product_id}"));
        let status = self.landing.next()?;
        Ok(LandingResponse {
            status,
            error: None,
        })
    }
}

/// A [`ConfirmationWriter`] that records writes into a [`CallLog`].
pub struct RecordingWriter {
    calls: CallLog,
    fail: bool,
}

impl RecordingWriter {
    pub fn new(calls: CallLog) -> Self {
        Self { calls, fail: false }
    }

    pub fn failing(calls: CallLog) -> Self {
        Self { calls, fail: true }
    }

    fn outcome(&self, path: String) -> Result<PathBuf, ConvoyError> {
        if self.fail {
            Err(std::io::Error::other("disk full").into())
        } else {
            Ok(PathBuf::from(path))
        }
    }
}

impl ConfirmationWriter for RecordingWriter {
    async fn write_collection(
        &self,
        confirmation: &CollectionConfirmation,
    ) -> Result<PathBuf, ConvoyError> {
        self.calls.push(format!("collection:{}", confirmation.job_id));
        self.outcome(format!("collection-confirmation-{}.json", confirmation.job_id))
    }

    async fn write_landing(
        &self,
        confirmation: &LandingConfirmation,
    ) -> Result<PathBuf, ConvoyError> {
        self.calls.push(format!(
            "landed:{}:{}",
            confirmation.warehouse, confirmation.product_id
        ));
        self.outcome(format!(
            "landing-confirmation-{}-{}.json",
            confirmation.warehouse, confirmation.product_id
        ))
    }
}
