// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! samba-tool command execution
//!
//! This module executes samba-tool commands using the system's samba-tool
//! binary. Arguments are always passed as a vector, never interpolated into a
//! shell string, so values containing shell metacharacters reach samba-tool
//! unmangled.
//!
//! # Features
//!
//! - Async command execution with tokio
//! - Optional `-U`/`--password` credentials appended to every invocation
//! - Optional elevation via `sudo -n` for unprivileged deployments
//! - Command metrics (count, duration) per subcommand

use anyhow::{Context, Result};
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, error};

use crate::metrics;

/// Default location of the samba-tool binary
pub const DEFAULT_SAMBA_TOOL_PATH: &str = "/usr/bin/samba-tool";

/// samba-tool command executor
#[derive(Clone)]
pub struct SambaToolExecutor {
    pub(crate) samba_tool_path: String,
    /// Optional account used for `-U`
    username: Option<String>,
    /// Optional password for `--password`
    password: Option<String>,
    /// Prefix invocations with `sudo -n`
    elevate: bool,
}

impl SambaToolExecutor {
    /// Create a new samba-tool executor
    ///
    /// # Arguments
    /// * `samba_tool_path` - Path to the samba-tool binary (default: "/usr/bin/samba-tool")
    /// * `username` - Optional account name passed as `-U`
    /// * `password` - Optional password passed as `--password`
    /// * `elevate` - Run through `sudo -n` when the API is not running as root
    pub fn new(
        samba_tool_path: Option<String>,
        username: Option<String>,
        password: Option<String>,
        elevate: bool,
    ) -> Self {
        Self {
            samba_tool_path: samba_tool_path
                .unwrap_or_else(|| DEFAULT_SAMBA_TOOL_PATH.to_string()),
            username,
            password,
            elevate,
        }
    }

    /// Execute a samba-tool command
    ///
    /// # Arguments
    /// * `args` - Subcommand path plus arguments (e.g., `["user", "list"]`,
    ///   `["dns", "add", "dc1", "example.com", "www", "A", "192.0.2.1"]`)
    ///
    /// # Returns
    /// The stdout output from samba-tool on success
    ///
    /// # Errors
    /// Returns an error carrying samba-tool's stderr text verbatim when the
    /// command exits non-zero; a generic message is substituted only when
    /// stderr is empty.
    pub async fn run(&self, args: &[String]) -> Result<String> {
        debug!(
            "Executing samba-tool command: {} {:?}",
            self.samba_tool_path, args
        );

        let start = Instant::now();
        let command_label = command_label(args);

        let mut cmd = if self.elevate {
            let mut c = Command::new("sudo");
            c.arg("-n").arg(&self.samba_tool_path);
            c
        } else {
            Command::new(&self.samba_tool_path)
        };
        cmd.args(args);

        // Credentials go after the subcommand arguments so builders stay pure
        if let Some(ref username) = self.username {
            cmd.arg("-U").arg(username);
        }
        if let Some(ref password) = self.password {
            cmd.arg(format!("--password={}", password));
        }

        let output = cmd
            .output()
            .await
            .context("Failed to execute samba-tool command")?;

        let duration = start.elapsed().as_secs_f64();

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = normalize_failure(&stderr, output.status.code());
            error!("samba-tool command failed: {}", message);
            metrics::record_samba_command(&command_label, false, duration);
            return Err(anyhow::anyhow!("{}", message));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        debug!("samba-tool command output: {}", stdout);
        metrics::record_samba_command(&command_label, true, duration);
        Ok(stdout)
    }
}

/// Metrics label for a command: the subcommand path without its operands
/// (e.g., "user list", "dns add")
fn command_label(args: &[String]) -> String {
    args.iter().take(2).cloned().collect::<Vec<_>>().join(" ")
}

/// Error message for a failed invocation: stderr verbatim, trimmed, with a
/// generic fallback when samba-tool wrote nothing to stderr
fn normalize_failure(stderr: &str, code: Option<i32>) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        match code {
            Some(code) => format!("samba-tool exited with status {}", code),
            None => "samba-tool terminated by signal".to_string(),
        }
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_creation_defaults() {
        let executor = SambaToolExecutor::new(None, None, None, false);
        assert_eq!(executor.samba_tool_path, "/usr/bin/samba-tool");
    }

    #[test]
    fn test_executor_creation_custom_path() {
        let executor = SambaToolExecutor::new(
            Some("/usr/local/bin/samba-tool".to_string()),
            Some("administrator".to_string()),
            Some("Passw0rd".to_string()),
            true,
        );
        assert_eq!(executor.samba_tool_path, "/usr/local/bin/samba-tool");
    }

    #[test]
    fn test_command_label_takes_subcommand_path() {
        let args: Vec<String> = ["dns", "add", "dc1", "example.com", "www", "A", "192.0.2.1"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(command_label(&args), "dns add");
    }

    #[test]
    fn test_command_label_single_token() {
        let args = vec!["time".to_string()];
        assert_eq!(command_label(&args), "time");
    }

    #[test]
    fn test_normalize_failure_stderr_verbatim() {
        // The stderr text must survive untouched so callers surface it as-is
        let message = normalize_failure("NT_STATUS_ACCESS_DENIED\n", Some(255));
        assert_eq!(message, "NT_STATUS_ACCESS_DENIED");
    }

    #[test]
    fn test_normalize_failure_empty_stderr() {
        assert_eq!(
            normalize_failure("", Some(1)),
            "samba-tool exited with status 1"
        );
        assert_eq!(normalize_failure("  \n", None), "samba-tool terminated by signal");
    }
}
