// Shared transport configuration for building the reqwest::Client.
//
// Connect and read deadlines are bounded separately; the overall request
// deadline caps the whole exchange so no call can outlive it.

use std::time::Duration;

use crate::error::Error;

/// Transport tuning for the HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// TCP connect deadline.
    pub connect_timeout: Duration,
    /// Deadline for each read on an established connection.
    pub read_timeout: Duration,
    /// Deadline for the whole request, covering the send side as well.
    pub request_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(15),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .read_timeout(self.read_timeout)
            .timeout(self.request_timeout)
            .user_agent(concat!("pageturn/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Client {
                message: e.to_string(),
            })
    }

    /// Largest single deadline, reported in `Error::Timeout`.
    pub(crate) fn timeout_secs(&self) -> u64 {
        self.connect_timeout
            .max(self.read_timeout)
            .max(self.request_timeout)
            .as_secs()
    }
}
