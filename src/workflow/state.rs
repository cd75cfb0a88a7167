use std::fmt;

use serde::{Deserialize, Serialize};

use crate::remote::{CarrierJobStatus, LandingStatus, ReleaseStatus};

/// States of a transport job workflow.
///
/// ACCEPTED → PRODUCT_RELEASED → JOB_PENDING* → JOB_RELEASED → LANDED_POLLING* → DONE,
/// with ABORTED reachable from every polling state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowState {
    Accepted,
    ProductReleased,
    JobPending,
    JobReleased,
    LandedPolling,
    Done,
    Aborted,
}

impl WorkflowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowState::Done | WorkflowState::Aborted)
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowState::Accepted => write!(f, "ACCEPTED"),
            WorkflowState::ProductReleased => write!(f, "PRODUCT_RELEASED"),
            WorkflowState::JobPending => write!(f, "JOB_PENDING"),
            WorkflowState::JobReleased => write!(f, "JOB_RELEASED"),
            WorkflowState::LandedPolling => write!(f, "LANDED_POLLING"),
            WorkflowState::Done => write!(f, "DONE"),
            WorkflowState::Aborted => write!(f, "ABORTED"),
        }
    }
}

/// An observed outcome that drives the workflow forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Answer of the origin warehouse to the release request.
    Release(ReleaseStatus),
    /// Carrier-side job status.
    Carrier(CarrierJobStatus),
    /// The collection confirmation step has run.
    CollectionConfirmed,
    /// Destination warehouse landing status.
    Landing(LandingStatus),
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Release(status) => write!(f, "release {status}"),
            Event::Carrier(status) => write!(f, "job status {status}"),
            Event::CollectionConfirmed => write!(f, "collection confirmed"),
            Event::Landing(status) => write!(f, "landing status {status}"),
        }
    }
}

/// The result of feeding an event to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Move to (or stay in, for polling self-loops) the given state.
    Next(WorkflowState),
    /// The job cannot proceed; it ends in ABORTED.
    Abort { reason: String },
    /// The job is already terminal; nothing changes.
    Halted(WorkflowState),
}

/// Pure transition logic for a single job.
pub struct StateMachine;

impl StateMachine {
    /// Compute the transition for `state` given the observed `event`.
    ///
    /// Any event not expected in the current state aborts the job.
    pub fn next(state: WorkflowState, event: &Event) -> Transition {
        use WorkflowState::*;

        match (state, event) {
            (Done | Aborted, _) => Transition::Halted(state),

            (Accepted, Event::Release(ReleaseStatus::Success)) => Transition::Next(ProductReleased),

            (ProductReleased | JobPending, Event::Carrier(CarrierJobStatus::Pending)) => {
                Transition::Next(JobPending)
            }
            (ProductReleased | JobPending, Event::Carrier(CarrierJobStatus::Released)) => {
                Transition::Next(JobReleased)
            }

            (JobReleased, Event::CollectionConfirmed) => Transition::Next(LandedPolling),

            (LandedPolling, Event::Landing(LandingStatus::NotLanded)) => {
                Transition::Next(LandedPolling)
            }
            (LandedPolling, Event::Landing(LandingStatus::Landed)) => Transition::Next(Done),

            (state, event) => Transition::Abort {
                reason: format!("{event} in {state}"),
            },
        }
    }
}
