//! Wire types for the carrier and warehouse endpoints.
//!
//! Every response carries a status tag. Business failures (`REJECT`, `ERROR`,
//! `NOT FOUND`, ...) are ordinary variants here, never Rust errors.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A warehouse site acting as origin or destination of a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Site {
    A,
    B,
}

impl Site {
    pub const ALL: [Site; 2] = [Site::A, Site::B];

    pub fn as_str(&self) -> &'static str {
        match self {
            Site::A => "A",
            Site::B => "B",
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Site {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Site::ALL
            .into_iter()
            .find(|site| site.as_str() == s)
            .ok_or_else(|| format!("unknown site {s:?}, expected one of A, B"))
    }
}

/// A transport request as submitted by a client and forwarded to the carrier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub client_id: String,
    pub product_id: String,
    pub quantity: u32,
    pub origin: Site,
    pub destination: Site,
    pub collection_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreateJobStatus {
    Accept,
    Reject,
    Error,
}

/// Carrier answer to a job creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobResponse {
    pub status: CreateJobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_time: Option<DateTime<Utc>>,
}

/// Carrier-side status of an accepted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CarrierJobStatus {
    #[serde(rename = "NOT FOUND")]
    NotFound,
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "RELEASED")]
    Released,
    #[serde(rename = "COLLECTION FAILED")]
    CollectionFailed,
}

impl fmt::Display for CarrierJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CarrierJobStatus::NotFound => write!(f, "NOT FOUND"),
            CarrierJobStatus::Pending => write!(f, "PENDING"),
            CarrierJobStatus::Released => write!(f, "RELEASED"),
            CarrierJobStatus::CollectionFailed => write!(f, "COLLECTION FAILED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub status: CarrierJobStatus,
}

/// Body of a product release request sent to the origin warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseRequest {
    pub product_id: String,
    pub quantity: u32,
    pub collection_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReleaseStatus {
    Success,
    Error,
}

impl fmt::Display for ReleaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseStatus::Success => write!(f, "SUCCESS"),
            ReleaseStatus::Error => write!(f, "ERROR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseResponse {
    pub status: ReleaseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Landing status of a product at the destination warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LandingStatus {
    #[serde(rename = "ERROR")]
    Error,
    #[serde(rename = "NOT FOUND")]
    NotFound,
    #[serde(rename = "LANDED")]
    Landed,
    #[serde(rename = "NOT LANDED")]
    NotLanded,
}

impl fmt::Display for LandingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LandingStatus::Error => write!(f, "ERROR"),
            LandingStatus::NotFound => write!(f, "NOT FOUND"),
            LandingStatus::Landed => write!(f, "LANDED"),
            LandingStatus::NotLanded => write!(f, "NOT LANDED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandingResponse {
    pub status: LandingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
