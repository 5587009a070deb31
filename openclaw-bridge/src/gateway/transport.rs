//! Shared HTTP session for one gateway connection.

use std::future::Future;

use reqwest::Client;
use tokio::sync::watch;

use crate::error::{Error, Result};

/// Connection pool shared by every call made through one gateway client.
///
/// Cloning is cheap and all clones refer to the same pool. Once closed, new
/// calls fail immediately and calls already in flight are abandoned with
/// [`Error::Connectivity`] instead of waiting for their timeout.
#[derive(Clone)]
pub struct Transport {
    http: Client,
    closed: watch::Sender<bool>,
}

impl Transport {
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    pub fn with_client(http: Client) -> Self {
        let (closed, _) = watch::channel(false);
        Self { http, closed }
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    pub fn close(&self) {
        if !self.closed.send_replace(true) {
            tracing::debug!("Gateway transport closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Run `call` unless the transport is, or becomes, closed.
    pub(crate) async fn guard<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let mut closed = self.closed.subscribe();
        if *closed.borrow_and_update() {
            return Err(Error::Connectivity("transport is closed".to_string()));
        }

        tokio::select! {
            result = call => result,
            _ = closed.wait_for(|closed| *closed) => {
                Err(Error::Connectivity("transport closed during request".to_string()))
            }
        }
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}
