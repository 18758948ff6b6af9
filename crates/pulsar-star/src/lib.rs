//! Pulsar Star library.
//!
//! The Star owns the people collection and answers command requests arriving
//! as datagrams. Requests are handled strictly one at a time, in arrival
//! order, so every operation sees the collection exclusively.

pub mod error;
pub mod server;

pub use error::ServeError;
pub use server::{handle_datagram, Exchange, UdpServer};
