//! Publishing of the generated sitemap
//!
//! A publisher takes the sitemap file written by the output module and puts it
//! somewhere a search engine can read it. Every configured target runs
//! independently; one failing never stops the others and never touches the
//! crawl result.

mod git;
mod object_store;
mod s3;

pub use git::GitPublisher;
pub use object_store::ObjectStorePublisher;
pub use s3::S3Publisher;

use crate::config::{PublishConfig, UserAgentConfig};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while publishing
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("S3 upload failed: {0}")]
    S3(String),

    #[error("Upload rejected with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("git {command} failed: {output}")]
    Git { command: String, output: String },

    #[error("Missing credentials: environment variable {0} is not set")]
    MissingCredentials(String),
}

/// What a successful publish did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishReceipt {
    /// The artifact was uploaded and can be fetched at `location`
    Uploaded { location: String },

    /// A new commit was created; `pushed` tells whether it left the machine
    Committed { pushed: bool },

    /// The target already held an identical sitemap
    Unchanged,
}

impl std::fmt::Display for PublishReceipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uploaded { location } => write!(f, "uploaded to {}", location),
            Self::Committed { pushed: true } => f.write_str("committed and pushed"),
            Self::Committed { pushed: false } => f.write_str("committed (not pushed)"),
            Self::Unchanged => f.write_str("unchanged"),
        }
    }
}

/// A destination for the rendered sitemap
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Short name used in logs and the final report
    fn name(&self) -> &str;

    /// Publishes the file at `artifact`
    async fn publish(&self, artifact: &Path) -> Result<PublishReceipt, PublishError>;
}

/// Outcome of one publisher in a [`publish_all`] run
#[derive(Debug)]
pub struct PublishReport {
    pub target: String,
    pub result: Result<PublishReceipt, PublishError>,
}

/// Builds every publisher enabled in the configuration
///
/// Uploads come first (S3, then the plain object store) so the sitemap is
/// live before the git commit that references it.
pub async fn publishers_from_config(
    config: &PublishConfig,
    user_agent: &UserAgentConfig,
    timeout: Duration,
) -> Result<Vec<Box<dyn Publisher>>, PublishError> {
    let mut publishers: Vec<Box<dyn Publisher>> = Vec::new();

    if let Some(s3) = &config.s3 {
        publishers.push(Box::new(S3Publisher::from_env(s3.clone()).await));
    }

    if let Some(store) = &config.object_store {
        publishers.push(Box::new(ObjectStorePublisher::new(
            store.clone(),
            user_agent,
            timeout,
        )?));
    }

    if let Some(git) = &config.git {
        publishers.push(Box::new(GitPublisher::from_config(git)));
    }

    Ok(publishers)
}

/// Runs every publisher in order, collecting each outcome
pub async fn publish_all(publishers: &[Box<dyn Publisher>], artifact: &Path) -> Vec<PublishReport> {
    let mut reports = Vec::with_capacity(publishers.len());

    for publisher in publishers {
        let result = publisher.publish(artifact).await;
        match &result {
            Ok(receipt) => {
                tracing::info!(target_name = publisher.name(), %receipt, "Published sitemap")
            }
            Err(e) => {
                tracing::error!(target_name = publisher.name(), error = %e, "Publishing failed")
            }
        }
        reports.push(PublishReport {
            target: publisher.name().to_string(),
            result,
        });
    }

    reports
}
