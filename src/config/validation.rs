use crate::config::types::{
    Config, CrawlerConfig, OutputConfig, PublishConfig, RetryConfig, S3Config, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_retry_config(&config.retry)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_publish_config(&config.publish)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let seed = Url::parse(&config.seed_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", config.seed_url, e))
    })?;

    if seed.scheme() != "http" && seed.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "Seed URL '{}' must use HTTP or HTTPS",
            config.seed_url
        )));
    }

    if seed.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' has no host",
            config.seed_url
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.fetch_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "fetch_timeout_secs must be >= 1, got {}",
            config.fetch_timeout_secs
        )));
    }

    if config.concurrency < 1 || config.concurrency > 32 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 32, got {}",
            config.concurrency
        )));
    }

    if config.max_duration_secs == Some(0) {
        return Err(ConfigError::Validation(
            "max_duration_secs must be > 0 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates the retry policy
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if !config.backoff_factor.is_finite() || config.backoff_factor < 1.0 {
        return Err(ConfigError::Validation(format!(
            "backoff_factor must be >= 1.0, got {}",
            config.backoff_factor
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    // Validate contact URL
    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    // Validate contact email (basic validation)
    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.sitemap_path.is_empty() {
        return Err(ConfigError::Validation(
            "sitemap_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the optional publishing targets
fn validate_publish_config(config: &PublishConfig) -> Result<(), ConfigError> {
    if let Some(s3) = &config.s3 {
        validate_s3_config(s3)?;
    }

    if let Some(store) = &config.object_store {
        let url = Url::parse(&store.url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid object store url '{}': {}", store.url, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Object store url '{}' must use HTTP or HTTPS",
                store.url
            )));
        }

        if let Some(public_url) = &store.public_url {
            Url::parse(public_url).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid public_url '{}': {}", public_url, e))
            })?;
        }
    }

    if let Some(git) = &config.git {
        if git.repo_path.is_empty() {
            return Err(ConfigError::Validation(
                "git repo_path cannot be empty".to_string(),
            ));
        }

        // The sitemap must land directly inside the repository
        if git.file_name.is_empty()
            || git.file_name.contains(|c: char| c == '/' || c == '\\')
            || git.file_name == ".."
        {
            return Err(ConfigError::Validation(format!(
                "git file_name must be a plain file name, got '{}'",
                git.file_name
            )));
        }

        if git.commit_message.trim().is_empty() {
            return Err(ConfigError::Validation(
                "git commit_message cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_s3_config(config: &S3Config) -> Result<(), ConfigError> {
    // Bucket names: 3-63 chars of lowercase letters, digits, dots and hyphens
    let bucket_ok = (3..=63).contains(&config.bucket.len())
        && config
            .bucket
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-');
    if !bucket_ok {
        return Err(ConfigError::Validation(format!(
            "Invalid S3 bucket name '{}'",
            config.bucket
        )));
    }

    if config.key.is_empty() || config.key.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "S3 key must be a non-empty relative key, got '{}'",
            config.key
        )));
    }

    if config.region.trim().is_empty() {
        return Err(ConfigError::Validation(
            "S3 region cannot be empty".to_string(),
        ));
    }

    for (field, value) in [
        ("endpoint-url", &config.endpoint_url),
        ("public-url", &config.public_url),
    ] {
        if let Some(value) = value {
            Url::parse(value).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid S3 {} '{}': {}", field, value, e))
            })?;
        }
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Basic email format check: must contain @ and have text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    // Domain part should contain at least one dot
    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
