//! Confirmation side effects written while a workflow runs.
//!
//! A collection confirmation is keyed by job id and written once the carrier
//! reports the job released. A landing confirmation is keyed by destination
//! warehouse and product and written once the product has landed.

use std::future::Future;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::error::ConvoyError;
use crate::remote::Site;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionConfirmation {
    #[serde(skip)]
    pub job_id: String,
    pub product_id: String,
    pub quantity: u32,
    pub collection_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LandingConfirmation {
    #[serde(skip)]
    pub warehouse: Site,
    #[serde(skip)]
    pub product_id: String,
    pub quantity: u32,
}

pub trait ConfirmationWriter: Send + Sync {
    fn write_collection(
        &self,
        confirmation: &CollectionConfirmation,
    ) -> impl Future<Output = Result<PathBuf, ConvoyError>> + Send;

    fn write_landing(
        &self,
        confirmation: &LandingConfirmation,
    ) -> impl Future<Output = Result<PathBuf, ConvoyError>> + Send;
}

/// Writes confirmations as pretty-printed JSON files into one directory.
pub struct FileConfirmationWriter {
    dir: PathBuf,
}

impl FileConfirmationWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn write_json<T: Serialize>(&self, filename: String, value: &T) -> Result<PathBuf, ConvoyError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(filename);
        let contents = serde_json::to_string_pretty(value)?;
        tokio::fs::write(&path, contents).await?;
        Ok(path)
    }
}

impl ConfirmationWriter for FileConfirmationWriter {
    async fn write_collection(
        &self,
        confirmation: &CollectionConfirmation,
    ) -> Result<PathBuf, ConvoyError> {
        let filename = format!(
            "collection-confirmation-{}.json",
            file_component(&confirmation.job_id)
        );
        let path = self.write_json(filename, confirmation).await?;
        info!(job_id = %confirmation.job_id, path = %path.display(), "collection confirmation saved");
        Ok(path)
    }

    async fn write_landing(
        &self,
        confirmation: &LandingConfirmation,
    ) -> Result<PathBuf, ConvoyError> {
        let filename = format!(
            "landing-confirmation-{}-{}.json",
            confirmation.warehouse,
            file_component(&confirmation.product_id)
        );
        let path = self.write_json(filename, confirmation).await?;
        info!(
            warehouse = %confirmation.warehouse,
            product_id = %confirmation.product_id,
            path = %path.display(),
            "landing confirmation saved"
        );
        Ok(path)
    }
}

/// Keep an id inside the output directory when used in a file name.
fn file_component(id: &str) -> String {
    id.chars()
        .map(|c| if matches!(c, '/' | '\\') || c.is_control() { '_' } else { c })
        .collect()
}
