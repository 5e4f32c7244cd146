use async_trait::async_trait;
use tokio::process::Command;
use tracing::{error, info, warn};

use crate::response::{ServerError, ServerResult};

#[async_trait]
pub trait HostControl: Send + Sync {
    /// Starts the host restart. Returns once the request is handed off; the
    /// outcome is never awaited by callers.
    async fn restart_host(&self) -> ServerResult<()>;
}

/// Restarts the host by running a configured shell command line.
pub struct ShellHostControl {
    program: String,
    args: Vec<String>,
}

impl ShellHostControl {
    pub fn new(command_line: &str) -> ServerResult<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| ServerError::internal_error("empty host restart command"))?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

#[async_trait]
impl HostControl for ShellHostControl {
    async fn restart_host(&self) -> ServerResult<()> {
        warn!("Restarting host with {} {:?}", self.program, self.args);
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .spawn()
            .map_err(|e| ServerError::internal_error(&format!("failed to spawn: {e}")))?;

        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => info!("Host restart command finished"),
                Ok(status) => error!("Host restart command exited with {}", status),
                Err(e) => error!("Failed to wait on host restart command: {}", e),
            }
        });
        Ok(())
    }
}
