// pageturn-api: Async Rust client for the KOReader HTTP event interface

pub mod client;
pub mod endpoint;
pub mod error;
pub mod event;
pub mod transport;

pub use client::RemoteClient;
pub use endpoint::{Endpoint, EndpointFieldError};
pub use error::Error;
pub use event::RemoteEvent;
pub use transport::TransportConfig;
