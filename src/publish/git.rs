//! Publishing through a git repository
//!
//! Static hosts such as GitHub Pages serve whatever is committed, so the
//! sitemap is copied into a local checkout, committed and optionally pushed.
//! The `git` binary does the work; its stdout/stderr end up in the error on
//! failure.

use crate::config::GitConfig;
use crate::publish::{PublishError, PublishReceipt, Publisher};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;

/// Commits the sitemap into a local git working tree
pub struct GitPublisher {
    repo_path: PathBuf,
    file_name: String,
    commit_message: String,
    push: bool,
}

impl GitPublisher {
    pub fn from_config(config: &GitConfig) -> Self {
        Self {
            repo_path: PathBuf::from(&config.repo_path),
            file_name: config.file_name.clone(),
            commit_message: config.commit_message.clone(),
            push: config.push,
        }
    }

    async fn git(&self, args: &[&str]) -> Result<Output, PublishError> {
        tracing::debug!(repo = %self.repo_path.display(), ?args, "Running git");
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_path)
            .output()
            .await?;
        Ok(output)
    }

    /// Runs a git subcommand that must succeed
    async fn git_checked(&self, args: &[&str]) -> Result<Output, PublishError> {
        let output = self.git(args).await?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(git_failure(args, &output))
        }
    }
}

#[async_trait]
impl Publisher for GitPublisher {
    fn name(&self) -> &str {
        "git"
    }

    async fn publish(&self, artifact: &Path) -> Result<PublishReceipt, PublishError> {
        if !self.repo_path.is_dir() {
            return Err(PublishError::Git {
                command: "checkout".to_string(),
                output: format!("repository not found: {}", self.repo_path.display()),
            });
        }

        let destination = self.repo_path.join(&self.file_name);
        tokio::fs::copy(artifact, &destination).await?;
        tracing::debug!(destination = %destination.display(), "Copied sitemap into repository");

        self.git_checked(&["add", self.file_name.as_str()]).await?;

        let commit_args = ["commit", "-m", self.commit_message.as_str()];
        let commit = self.git(&commit_args).await?;
        if !commit.status.success() {
            if is_nothing_to_commit(&commit) {
                tracing::info!("Sitemap unchanged, skipping push");
                return Ok(PublishReceipt::Unchanged);
            }
            return Err(git_failure(&commit_args, &commit));
        }

        if self.push {
            self.git_checked(&["push"]).await?;
        }

        Ok(PublishReceipt::Committed { pushed: self.push })
    }
}

fn is_nothing_to_commit(output: &Output) -> bool {
    const MARKER: &str = "nothing to commit";
    String::from_utf8_lossy(&output.stdout).contains(MARKER)
        || String::from_utf8_lossy(&output.stderr).contains(MARKER)
}

fn git_failure(args: &[&str], output: &Output) -> PublishError {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let text = if stderr.trim().is_empty() { stdout } else { stderr };

    PublishError::Git {
        command: args.first().copied().unwrap_or_default().to_string(),
        output: text.trim().to_string(),
    }
}
