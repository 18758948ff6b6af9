//! Error types for the pulsar-connect crate

use std::net::SocketAddr;
use thiserror::Error;

/// Failures while establishing the local end of a connection.
///
/// Exchange failures are never errors: they come back from
/// [`UdpClient::send`](crate::UdpClient::send) as result envelopes.
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("Failed to resolve {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("No address found for {host}:{port}")]
    NoAddress { host: String, port: u16 },

    #[error("Failed to bind local socket on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}
