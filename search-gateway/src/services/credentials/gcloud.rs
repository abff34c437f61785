//! Ambient credential from the locally installed cloud CLI.

use super::{CredentialError, CredentialSource};
use async_trait::async_trait;
use tokio::process::Command;

/// Runs `<program> auth print-access-token` and reads the token from stdout.
pub struct GcloudCliSource {
    program: String,
    args: Vec<String>,
}

impl GcloudCliSource {
    pub fn new(program: &str) -> Self {
        Self::with_args(program, &["auth", "print-access-token"])
    }

    pub fn with_args(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[async_trait]
impl CredentialSource for GcloudCliSource {
    fn name(&self) -> &'static str {
        "gcloud-cli"
    }

    async fn fetch_token(&self) -> Result<String, CredentialError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| CredentialError::Command(format!("{}: {}", self.program, e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            return Err(CredentialError::Command(format!(
                "{} exited with {}: {}",
                self.program, output.status, stderr
            )));
        }

        if stdout.is_empty() {
            let reason = if stderr.is_empty() {
                "empty output".to_string()
            } else {
                stderr
            };
            return Err(CredentialError::EmptyToken(reason));
        }

        // gcloud prints update notices to stderr alongside a valid token
        if !stderr.is_empty() {
            tracing::debug!(stderr = %stderr, "gcloud printed diagnostics with token");
        }

        Ok(stdout)
    }
}
