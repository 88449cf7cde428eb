//! Upload to Amazon S3
//!
//! Requests are signed with whatever credentials the AWS default chain finds
//! (environment, shared profile, instance or container role), so a scheduled
//! run needs no secrets in the configuration file.

use crate::config::S3Config;
use crate::publish::{PublishError, PublishReceipt, Publisher};
use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use std::path::Path;

const SITEMAP_CONTENT_TYPE: &str = "application/xml";

/// Publishes the sitemap with an S3 `PutObject`
pub struct S3Publisher {
    config: S3Config,
    client: Client,
}

impl S3Publisher {
    /// Builds a publisher using the default AWS credential chain
    pub async fn from_env(config: S3Config) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self::with_client(config, Client::from_conf(builder.build()))
    }

    pub fn with_client(config: S3Config, client: Client) -> Self {
        Self { config, client }
    }

    /// Where the uploaded sitemap can be read
    ///
    /// The configured public URL wins; otherwise the bucket's
    /// virtual-hosted-style URL.
    pub fn public_location(&self) -> String {
        match &self.config.public_url {
            Some(url) => url.clone(),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.config.bucket, self.config.region, self.config.key
            ),
        }
    }
}

#[async_trait]
impl Publisher for S3Publisher {
    fn name(&self) -> &str {
        "s3"
    }

    async fn publish(&self, artifact: &Path) -> Result<PublishReceipt, PublishError> {
        let body = tokio::fs::read(artifact).await?;

        tracing::debug!(
            bucket = %self.config.bucket,
            key = %self.config.key,
            bytes = body.len(),
            "Uploading sitemap to S3"
        );

        let mut request = self
            .client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&self.config.key)
            .content_type(SITEMAP_CONTENT_TYPE)
            .body(ByteStream::from(body));

        if !self.config.acl.is_empty() {
            request = request.acl(ObjectCannedAcl::from(self.config.acl.as_str()));
        }

        request
            .send()
            .await
            .map_err(|e| PublishError::S3(DisplayErrorContext(&e).to_string()))?;

        Ok(PublishReceipt::Uploaded {
            location: self.public_location(),
        })
    }
}
