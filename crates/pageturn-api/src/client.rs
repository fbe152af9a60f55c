// KOReader HTTP client
//
// Wraps `reqwest::Client` with endpoint validation, URL construction, and
// the two status policies the reader needs: strict 2xx for events, and
// 2xx-or-404 for the reachability probe.

use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::endpoint::Endpoint;
use crate::error::Error;
use crate::event::{PROBE_PATH, RemoteEvent};
use crate::transport::TransportConfig;

/// Raw HTTP client for the reader's event interface.
///
/// Holds one pooled `reqwest::Client` and is cheap to clone; clones share
/// the pool. The endpoint is passed per call so a settings change takes
/// effect on the next request without rebuilding anything.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    timeout_secs: u64,
}

impl RemoteClient {
    /// Create a client from a `TransportConfig`.
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            timeout_secs: transport.timeout_secs(),
        })
    }

    /// Deliver an event to the reader. Succeeds iff the status is 2xx.
    pub async fn send_event(&self, endpoint: &Endpoint, event: RemoteEvent) -> Result<(), Error> {
        let status = self.get(endpoint, &event.path()).await?;
        if status.is_success() {
            debug!(%endpoint, ?event, status = status.as_u16(), "event delivered");
            Ok(())
        } else {
            warn!(%endpoint, ?event, status = status.as_u16(), "event rejected");
            Err(status_error(status))
        }
    }

    /// Check that something is serving HTTP at the endpoint.
    ///
    /// A 404 counts as reachable: the reader answers but has nothing at `/`.
    pub async fn probe(&self, endpoint: &Endpoint) -> Result<(), Error> {
        let status = self.get(endpoint, PROBE_PATH).await?;
        if status.is_success() || status == StatusCode::NOT_FOUND {
            debug!(%endpoint, status = status.as_u16(), "probe succeeded");
            Ok(())
        } else {
            warn!(%endpoint, status = status.as_u16(), "probe failed");
            Err(status_error(status))
        }
    }

    /// Validate, build the URL, send a bodiless GET, and return the status.
    async fn get(&self, endpoint: &Endpoint, path: &str) -> Result<StatusCode, Error> {
        let url = endpoint.url(path).inspect_err(|_| {
            warn!(%endpoint, "refusing request to invalid endpoint");
        })?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::from_reqwest(&e, self.timeout_secs))?;

        Ok(resp.status())
    }
}

fn status_error(status: StatusCode) -> Error {
    Error::HttpStatus {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Unknown").to_owned(),
    }
}
