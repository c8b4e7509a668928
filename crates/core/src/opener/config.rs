//! Configuration for the platform opener.

use serde::{Deserialize, Serialize};

/// Configuration for the system opener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenerConfig {
    /// Program used to open documents. Platform default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,

    /// Arguments placed before the document URI. `{mime}` is replaced by
    /// the document MIME type.
    #[serde(default)]
    pub args: Vec<String>,

    /// How long to wait for the launcher to exit before treating the
    /// viewer as started, in milliseconds.
    #[serde(default = "default_launch_grace_ms")]
    pub launch_grace_ms: u64,
}

fn default_launch_grace_ms() -> u64 {
    2000
}

impl Default for OpenerConfig {
    fn default() -> Self {
        Self {
            program: None,
            args: Vec::new(),
            launch_grace_ms: default_launch_grace_ms(),
        }
    }
}

impl OpenerConfig {
    /// Program and leading arguments after applying platform defaults.
    pub fn command(&self) -> (String, Vec<String>) {
        match &self.program {
            Some(program) => (program.clone(), self.args.clone()),
            None => {
                let (program, mut args) = platform_default();
                args.extend(self.args.iter().cloned());
                (program, args)
            }
        }
    }
}

#[cfg(target_os = "macos")]
fn platform_default() -> (String, Vec<String>) {
    ("open".to_string(), Vec::new())
}

#[cfg(target_os = "windows")]
fn platform_default() -> (String, Vec<String>) {
    (
        "cmd".to_string(),
        vec!["/C".to_string(), "start".to_string(), String::new()],
    )
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn platform_default() -> (String, Vec<String>) {
    ("xdg-open".to_string(), Vec::new())
}
