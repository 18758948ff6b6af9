//! Pulsar Connect: client side of the Pulsar datagram protocol
//!
//! # Architecture
//!
//! ```text
//!   UdpClient                                    Star
//!   ─────────                                    ────
//!   connect()   resolve host, bind ephemeral socket
//!   send()      ── request frame (id = n) ──────▶
//!   receive()   ◀────── response frame (id = n) ─
//!               poll up to `attempts` × `retry_delay`
//! ```
//!
//! The client never retransmits. It sends each request once and re-polls
//! for the answer, discarding late replies to earlier requests by their
//! correlation id.
//!
//! # Example
//!
//! ```rust,no_run
//! use pulsar_connect::{ClientConfig, UdpClient};
//! use pulsar_proto::{Argument, ResourceKind};
//!
//! # async fn example() -> Result<(), pulsar_connect::ConnectError> {
//! let mut client = UdpClient::new(ClientConfig::default());
//! client.connect().await?;
//!
//! let result = client
//!     .send("sum_of_height", &[Argument::placeholder(ResourceKind::Collection)])
//!     .await;
//! println!("{}: {}", result.status, result.text());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;

pub use client::{
    ClientConfig, ClientState, UdpClient, DEFAULT_ATTEMPTS, DEFAULT_HOST, DEFAULT_PORT,
    DEFAULT_RETRY_DELAY,
};
pub use error::ConnectError;
