//! Opener backed by an external launcher program.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

use super::config::OpenerConfig;
use super::{OpenError, Opener, PDF_MIME_TYPE};

/// Opens documents with the platform launcher (`xdg-open`, `open`, ...).
pub struct SystemOpener {
    program: String,
    args: Vec<String>,
    launch_grace: Duration,
}

impl SystemOpener {
    /// Creates a new opener with the given configuration.
    pub fn new(config: &OpenerConfig) -> Self {
        let (program, args) = config.command();
        Self {
            program,
            args,
            launch_grace: Duration::from_millis(config.launch_grace_ms),
        }
    }

    /// Creates an opener with platform defaults.
    pub fn with_defaults() -> Self {
        Self::new(&OpenerConfig::default())
    }

    /// The launcher program.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Resolve a `file://` URI to a local path.
    fn local_path(uri: &str) -> Result<PathBuf, OpenError> {
        let url =
            reqwest::Url::parse(uri).map_err(|e| OpenError::UnsupportedUri(format!("{}: {}", uri, e)))?;
        if url.scheme() != "file" {
            return Err(OpenError::UnsupportedUri(format!(
                "scheme '{}' is not supported",
                url.scheme()
            )));
        }
        url.to_file_path()
            .map_err(|_| OpenError::UnsupportedUri(uri.to_string()))
    }

    fn build_args(&self, uri: &str) -> Vec<String> {
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|a| a.replace("{mime}", PDF_MIME_TYPE))
            .collect();
        args.push(uri.to_string());
        args
    }
}

#[async_trait]
impl Opener for SystemOpener {
    fn name(&self) -> &str {
        "system"
    }

    async fn can_open(&self, uri: &str) -> bool {
        Self::local_path(uri).is_ok_and(|p| p.is_file())
    }

    async fn open(&self, uri: &str) -> Result<(), OpenError> {
        let path = Self::local_path(uri)?;
        if !path.is_file() {
            return Err(OpenError::NotOpenable(uri.to_string()));
        }

        let args = self.build_args(uri);
        debug!("Launching {} {:?}", self.program, args);

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    OpenError::NoViewer {
                        program: self.program.clone(),
                    }
                } else {
                    OpenError::Io(e)
                }
            })?;

        // Launchers exit right away; a viewer started directly keeps running.
        match timeout(self.launch_grace, child.wait()).await {
            Ok(Ok(status)) if status.success() => {}
            Ok(Ok(status)) => {
                return Err(OpenError::ViewerFailed {
                    program: self.program.clone(),
                    code: status.code(),
                })
            }
            Ok(Err(e)) => return Err(OpenError::Io(e)),
            Err(_) => debug!("{} still running, assuming viewer started", self.program),
        }

        info!("Opened {}", path.display());
        Ok(())
    }
}
