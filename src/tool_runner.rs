//! # External tool invocation
//!
//! Runs one external binary as a filter: image bytes go in on stdin, the
//! optimized bytes come back on stdout. Every run is bounded by a timeout and
//! the child is spawned with `kill_on_drop`, so whichever way the future
//! finishes (success, error, timeout) the process is terminated and its
//! pipes are closed.

use futures::future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{CompressError, Result};

/// A fully resolved external command
#[derive(Debug, Clone)]
pub struct ToolCommand {
    name: String,
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ToolCommand {
    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            timeout,
        }
    }

    pub fn args<T, I>(mut self, args: I) -> Self
    where
        T: ToString,
        I: IntoIterator<Item = T>,
    {
        self.args.extend(args.into_iter().map(|arg| arg.to_string()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    fn failure(&self, reason: impl Into<String>) -> CompressError {
        CompressError::external(self.name.clone(), reason)
    }

    /// Feed `input` on stdin and collect stdout.
    ///
    /// Missing binaries, spawn errors, non-zero exits, empty output and
    /// timeouts all map to `CompressError::ExternalTool`.
    pub async fn run(&self, input: &[u8]) -> Result<Vec<u8>> {
        debug!("Running {}: {:?} {:?}", self.name, self.program, self.args);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.failure(format!("cannot start {:?}: {}", self.program, e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| self.failure("stdin pipe unavailable"))?;

        // stdin is dropped at the end of this block, closing the pipe
        let feed = async move {
            stdin.write_all(input).await?;
            stdin.shutdown().await
        };

        let start_time = Instant::now();
        let (fed, output) = tokio::time::timeout(
            self.timeout,
            future::join(feed, child.wait_with_output()),
        )
        .await
        .map_err(|_| {
            warn!("{} timed out after {:?}", self.name, self.timeout);
            self.failure(format!("timed out after {:?}", self.timeout))
        })?;
        let elapsed = start_time.elapsed();

        let output = output.map_err(|e| self.failure(format!("waiting for process failed: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("{} failed after {:?}: {}", self.name, elapsed, stderr.trim());
            return Err(self.failure(format!("{}: {}", output.status, stderr.trim())));
        }

        fed.map_err(|e| self.failure(format!("writing stdin failed: {}", e)))?;

        if output.stdout.is_empty() {
            return Err(self.failure("produced no output"));
        }

        debug!(
            "{} completed in {:?}: {} -> {} bytes",
            self.name,
            elapsed,
            input.len(),
            output.stdout.len()
        );
        Ok(output.stdout)
    }
}
