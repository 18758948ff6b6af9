//! Error types for the Star server

use std::net::SocketAddr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to receive datagram: {0}")]
    Receive(#[source] std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
