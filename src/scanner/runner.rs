// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{info, warn};
use uuid::Uuid;

use super::registry::ProcessRegistry;
use crate::errors::ProcessError;

/// Fixed scanner invocation parameters. The argument set is deliberately not
/// configurable: JSON-lines output, quiet mode, no interaction-server
/// callbacks, bounded request rate and per-template timeout.
const RATE_LIMIT: u32 = 50;
const TEMPLATE_TIMEOUT_SECS: u32 = 90;

/// Install locations the scanner binary may be loaded from.
const KNOWN_BINARY_PATHS: &[&str] = &[
    "nuclei",
    "/usr/bin/nuclei",
    "/usr/local/bin/nuclei",
    "/opt/nuclei/nuclei",
];

/// Runs the external scanner as a subprocess, one per scan, cooperating with
/// the process registry so a cancel request can kill the run at any point.
pub struct ScanRunner {
    binary: String,
    registry: Arc<ProcessRegistry>,
}

/// Captured result of one scanner run.
pub struct ScanOutput {
    pub stdout: Vec<u8>,
    /// True when the scan was canceled while the process ran; whatever
    /// output was captured up to that point is still present.
    pub canceled: bool,
}

impl ScanRunner {
    pub fn new(binary: Option<String>, registry: Arc<ProcessRegistry>) -> Self {
        let binary = match binary {
            Some(path) => Self::resolve_binary(path),
            None => "nuclei".to_string(),
        };
        Self { binary, registry }
    }

    fn resolve_binary(path: String) -> String {
        if KNOWN_BINARY_PATHS.contains(&path.as_str()) || Path::new(&path).is_file() {
            path
        } else {
            warn!(
                "scanner binary {} not found, falling back to nuclei in PATH",
                path
            );
            "nuclei".to_string()
        }
    }

    /// Run the scanner against a single target, capturing stdout until the
    /// process exits or the scan is canceled through the registry.
    ///
    /// A non-zero exit code is logged but not an error: the scanner may exit
    /// non-zero while still having emitted valid findings. Failing to start
    /// the process or to read its output is fatal.
    pub async fn run(&self, scan_id: Uuid, target: &str) -> Result<ScanOutput, ProcessError> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-u")
            .arg(target)
            .arg("-j")
            .arg("-silent")
            .arg("-no-interactsh")
            .arg("-rate-limit")
            .arg(RATE_LIMIT.to_string())
            .arg("-timeout")
            .arg(TEMPLATE_TIMEOUT_SECS.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(ProcessError::Spawn)?;
        let mut stdout_pipe = child.stdout.take().ok_or(ProcessError::MissingStdout)?;

        if !self.registry.attach(scan_id, child) {
            return Ok(ScanOutput {
                stdout: Vec::new(),
                canceled: true,
            });
        }

        let mut stdout = Vec::new();
        if let Err(err) = stdout_pipe.read_to_end(&mut stdout).await {
            if let Some(mut child) = self.registry.take_child(scan_id) {
                let _ = child.start_kill();
            }
            return Err(ProcessError::Output(err));
        }

        match self.registry.take_child(scan_id) {
            Some(mut child) => {
                match child.wait().await {
                    Ok(status) if !status.success() => {
                        info!(
                            "scanner exited with {} for scan {} ({} bytes captured)",
                            status,
                            scan_id,
                            stdout.len()
                        );
                    }
                    Ok(_) => {}
                    Err(err) => return Err(ProcessError::Output(err)),
                }
                Ok(ScanOutput {
                    stdout,
                    canceled: false,
                })
            }
            // A cancel request claimed the child while output was draining.
            None => Ok(ScanOutput {
                stdout,
                canceled: true,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_binary_paths_pass_through() {
        assert_eq!(ScanRunner::resolve_binary("nuclei".to_string()), "nuclei");
        assert_eq!(
            ScanRunner::resolve_binary("/usr/bin/nuclei".to_string()),
            "/usr/bin/nuclei"
        );
    }

    #[test]
    fn unknown_binary_falls_back_to_path_lookup() {
        assert_eq!(
            ScanRunner::resolve_binary("/nonexistent/scanner".to_string()),
            "nuclei"
        );
    }

    #[tokio::test]
    async fn spawn_failure_is_fatal() {
        let registry = Arc::new(ProcessRegistry::new());
        let scan_id = Uuid::new_v4();
        registry.register(scan_id);

        let runner = ScanRunner {
            binary: "/nonexistent/scanner-binary".to_string(),
            registry: Arc::clone(&registry),
        };

        let result = runner.run(scan_id, "https://example.com").await;
        assert!(matches!(result, Err(ProcessError::Spawn(_))));
    }
}
