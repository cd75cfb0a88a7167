pub mod client;
pub mod error;
pub mod types;

pub use client::{HttpRemoteClient, RemoteService};
pub use error::RemoteError;
pub use types::{
    CarrierJobStatus, CreateJobResponse, CreateJobStatus, JobRequest, LandingStatus,
    ReleaseStatus, Site,
};
