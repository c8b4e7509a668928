//! Mock opener for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::opener::{OpenError, Opener};

/// Mock implementation of the Opener trait.
///
/// Records every URI it is asked to open instead of launching a viewer.
#[derive(Debug)]
pub struct MockOpener {
    opened: Arc<RwLock<Vec<String>>>,
    can_open: Arc<RwLock<bool>>,
    next_error: Arc<RwLock<Option<OpenError>>>,
}

impl Default for MockOpener {
    fn default() -> Self {
        Self::new()
    }
}

impl MockOpener {
    pub fn new() -> Self {
        Self {
            opened: Arc::new(RwLock::new(Vec::new())),
            can_open: Arc::new(RwLock::new(true)),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// URIs successfully opened, in order.
    pub async fn opened_uris(&self) -> Vec<String> {
        self.opened.read().await.clone()
    }

    /// Set the answer of `can_open`.
    pub async fn set_can_open(&self, can_open: bool) {
        *self.can_open.write().await = can_open;
    }

    /// Configure the next open to fail with the given error.
    pub async fn set_next_error(&self, error: OpenError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl Opener for MockOpener {
    fn name(&self) -> &str {
        "mock"
    }

    async fn can_open(&self, _uri: &str) -> bool {
        *self.can_open.read().await
    }

    async fn open(&self, uri: &str) -> Result<(), OpenError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        self.opened.write().await.push(uri.to_string());
        Ok(())
    }
}
