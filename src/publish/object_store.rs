//! Upload to an object store over plain HTTP
//!
//! The sitemap is sent with a single `PUT` to a configured object URL, such
//! as a pre-signed URL or a store that accepts bearer tokens read from an
//! environment variable. Signed uploads to S3 go through [`super::S3Publisher`].

use crate::config::{ObjectStoreConfig, UserAgentConfig};
use crate::publish::{PublishError, PublishReceipt, Publisher};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use url::Url;

const SITEMAP_CONTENT_TYPE: &str = "application/xml";
const ACL_HEADER: &str = "x-amz-acl";

/// Publishes the sitemap with an HTTP `PUT`
pub struct ObjectStorePublisher {
    config: ObjectStoreConfig,
    client: Client,
}

impl ObjectStorePublisher {
    pub fn new(
        config: ObjectStoreConfig,
        user_agent: &UserAgentConfig,
        timeout: Duration,
    ) -> Result<Self, PublishError> {
        let client = Client::builder()
            .user_agent(user_agent.header_value())
            .timeout(timeout)
            .build()?;

        Ok(Self { config, client })
    }

    /// Where the uploaded sitemap can be read
    ///
    /// The configured public URL wins; otherwise the upload URL without its
    /// query string (which usually carries a pre-signed signature).
    pub fn public_location(&self) -> String {
        if let Some(public_url) = &self.config.public_url {
            return public_url.clone();
        }

        match Url::parse(&self.config.url) {
            Ok(mut url) => {
                url.set_query(None);
                url.set_fragment(None);
                url.to_string()
            }
            Err(_) => self.config.url.clone(),
        }
    }

    fn bearer_token(&self) -> Result<Option<String>, PublishError> {
        match &self.config.token_env {
            Some(var) => std::env::var(var)
                .map(Some)
                .map_err(|_| PublishError::MissingCredentials(var.clone())),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl Publisher for ObjectStorePublisher {
    fn name(&self) -> &str {
        "object-store"
    }

    async fn publish(&self, artifact: &Path) -> Result<PublishReceipt, PublishError> {
        let token = self.bearer_token()?;
        let body = tokio::fs::read(artifact).await?;

        tracing::debug!(
            url = %self.config.url,
            bytes = body.len(),
            "Uploading sitemap"
        );

        let mut request = self
            .client
            .put(&self.config.url)
            .header(CONTENT_TYPE, SITEMAP_CONTENT_TYPE)
            .body(body);

        if let Some(acl) = &self.config.acl {
            request = request.header(ACL_HEADER, acl);
        }

        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(PublishReceipt::Uploaded {
            location: self.public_location(),
        })
    }
}
