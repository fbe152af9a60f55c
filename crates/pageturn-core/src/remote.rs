// ── Remote seam ──
//
// The two requests the dispatcher needs. `pageturn_api::RemoteClient` is
// the production implementation; tests substitute a scripted fake.

use std::future::Future;
use std::sync::Arc;

use pageturn_api::{Endpoint, RemoteClient};

use crate::command::LogicalCommand;

/// Issues commands and probes against an endpoint.
///
/// Implementations must tolerate concurrent calls.
pub trait Remote: Send + Sync + 'static {
    fn send_command(
        &self,
        endpoint: &Endpoint,
        command: LogicalCommand,
    ) -> impl Future<Output = Result<(), pageturn_api::Error>> + Send;

    fn probe(
        &self,
        endpoint: &Endpoint,
    ) -> impl Future<Output = Result<(), pageturn_api::Error>> + Send;
}

impl Remote for RemoteClient {
    fn send_command(
        &self,
        endpoint: &Endpoint,
        command: LogicalCommand,
    ) -> impl Future<Output = Result<(), pageturn_api::Error>> + Send {
        self.send_event(endpoint, command.remote_event())
    }

    fn probe(
        &self,
        endpoint: &Endpoint,
    ) -> impl Future<Output = Result<(), pageturn_api::Error>> + Send {
        RemoteClient::probe(self, endpoint)
    }
}

impl<R: Remote> Remote for Arc<R> {
    fn send_command(
        &self,
        endpoint: &Endpoint,
        command: LogicalCommand,
    ) -> impl Future<Output = Result<(), pageturn_api::Error>> + Send {
        (**self).send_command(endpoint, command)
    }

    fn probe(
        &self,
        endpoint: &Endpoint,
    ) -> impl Future<Output = Result<(), pageturn_api::Error>> + Send {
        (**self).probe(endpoint)
    }
}
