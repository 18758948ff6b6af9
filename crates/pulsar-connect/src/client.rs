//! UdpClient: one request, one bounded wait for the reply

use crate::error::ConnectError;
use pulsar_proto::{
    decode_response, encode_request, Argument, ResultEnvelope, StatusCode, RECV_BUFFER_SIZE,
};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::{lookup_host, UdpSocket};
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 1234;
pub const DEFAULT_ATTEMPTS: u32 = 10;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Where the Star lives and how long to wait for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Number of bounded reads before giving up on a reply
    pub attempts: u32,
    /// Upper bound on each read
    pub retry_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            attempts: DEFAULT_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl ClientConfig {
    /// Longest a single [`UdpClient::receive`] can take
    pub fn max_wait(&self) -> Duration {
        self.retry_delay * self.attempts
    }
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// No local socket; `send` answers `Unreachable`
    Disconnected,
    /// Local socket bound and server address resolved
    Connected,
}

#[derive(Debug)]
struct Link {
    socket: UdpSocket,
    server: SocketAddr,
}

/// Client end of the datagram channel.
///
/// One request is in flight at a time; the socket is reused across calls.
#[derive(Debug)]
pub struct UdpClient {
    config: ClientConfig,
    link: Option<Link>,
    /// Last id handed out; ids start at 1 and 0 is never used for a request
    last_id: u64,
    /// Id of the request `receive` is waiting on
    awaiting: Option<u64>,
}

impl UdpClient {
    /// Create a disconnected client
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            link: None,
            last_id: 0,
            awaiting: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> ClientState {
        if self.link.is_some() {
            ClientState::Connected
        } else {
            ClientState::Disconnected
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ClientState::Connected
    }

    /// Resolved server address while connected
    pub fn server_addr(&self) -> Option<SocketAddr> {
        self.link.as_ref().map(|l| l.server)
    }

    /// Local socket address while connected
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.link.as_ref().and_then(|l| l.socket.local_addr().ok())
    }

    /// Resolve the configured host and bind an ephemeral local socket.
    ///
    /// No datagram is exchanged; only a later `send` proves the Star is
    /// there. On failure the client is left disconnected.
    pub async fn connect(&mut self) -> Result<SocketAddr, ConnectError> {
        self.disconnect();

        let host = if self.config.host.trim().is_empty() {
            DEFAULT_HOST
        } else {
            self.config.host.as_str()
        };
        let port = self.config.port;

        let addrs: Vec<SocketAddr> = lookup_host((host, port))
            .await
            .map_err(|source| ConnectError::Resolve {
                host: host.to_string(),
                port,
                source,
            })?
            .collect();

        let server = addrs
            .iter()
            .find(|a| a.is_ipv4())
            .or_else(|| addrs.first())
            .copied()
            .ok_or_else(|| ConnectError::NoAddress {
                host: host.to_string(),
                port,
            })?;

        let local: SocketAddr = if server.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|source| ConnectError::Bind {
                addr: local,
                source,
            })?;

        info!(
            "Connected to Star at {} (local {})",
            server,
            socket.local_addr().map(|a| a.to_string()).unwrap_or_default()
        );
        self.link = Some(Link { socket, server });
        Ok(server)
    }

    /// Drop the local socket. Safe to call in any state.
    pub fn disconnect(&mut self) {
        if let Some(link) = self.link.take() {
            info!("Disconnected from Star at {}", link.server);
        }
        self.awaiting = None;
    }

    /// Change host and port. The client is disconnected and must be
    /// connected again before the next `send`.
    pub fn reconfigure(&mut self, host: impl Into<String>, port: u16) {
        self.disconnect();
        self.config.host = host.into();
        self.config.port = port;
        debug!(
            "Client reconfigured for {}:{}",
            self.config.host, self.config.port
        );
    }

    fn next_id(&mut self) -> u64 {
        self.last_id = self.last_id.wrapping_add(1);
        if self.last_id == 0 {
            self.last_id = 1;
        }
        self.last_id
    }

    /// Send one request and wait for its reply
    pub async fn send(&mut self, alias: &str, args: &[Argument]) -> ResultEnvelope {
        let server = match &self.link {
            Some(link) => link.server,
            None => {
                debug!("Not connected, {} not sent", alias);
                return ResultEnvelope::from_status(StatusCode::Unreachable);
            }
        };

        let id = self.next_id();
        let frame = match encode_request(id, alias, args) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Request {} for {} not encodable: {}", id, alias, e);
                return ResultEnvelope::with_message(StatusCode::OperationRejected, e.to_string());
            }
        };

        let sent = match &self.link {
            Some(link) => link.socket.send_to(&frame, server).await,
            None => return ResultEnvelope::from_status(StatusCode::Unreachable),
        };
        if let Err(e) = sent {
            warn!("Failed to send {} to {}: {}", alias, server, e);
            return ResultEnvelope::with_message(
                StatusCode::Unreachable,
                format!("{}: {}", StatusCode::Unreachable.message(), e),
            );
        }

        debug!("Sent request {} ({}, {} bytes) to {}", id, alias, frame.len(), server);
        self.awaiting = Some(id);
        self.receive().await
    }

    /// Poll for the reply to the last request sent.
    ///
    /// Makes at most `attempts` reads, each bounded by `retry_delay`. Only a
    /// decodable reply from the server carrying the awaited id ends the wait
    /// early. Datagrams from other peers and replies to other requests are
    /// dropped. An undecodable or uncorrelated (id `0`) reply from the server
    /// is held back and returned only if nothing better arrives in time.
    pub async fn receive(&mut self) -> ResultEnvelope {
        let Some(link) = &self.link else {
            return ResultEnvelope::from_status(StatusCode::Unreachable);
        };
        let expected = self.awaiting;
        let mut buf = vec![0u8; RECV_BUFFER_SIZE];
        let mut held: Option<ResultEnvelope> = None;

        for attempt in 1..=self.config.attempts {
            let read = timeout(self.config.retry_delay, link.socket.recv_from(&mut buf)).await;
            let (len, from) = match read {
                Err(_) => {
                    trace!("No reply yet (attempt {}/{})", attempt, self.config.attempts);
                    continue;
                }
                Ok(Err(e)) => {
                    // ICMP errors surface here on some platforms
                    debug!("Receive failed (attempt {}): {}", attempt, e);
                    tokio::time::sleep(self.config.retry_delay).await;
                    continue;
                }
                Ok(Ok(received)) => received,
            };

            if from != link.server {
                warn!(
                    "Ignoring {} bytes from {}, expected replies from {}",
                    len, from, link.server
                );
                continue;
            }

            let response = match decode_response(&buf[..len]) {
                Ok(response) => response,
                Err(e) => {
                    warn!("Undecodable reply from {}: {}", from, e);
                    let status = e.status();
                    held = Some(ResultEnvelope::with_message(
                        status,
                        format!("{}: {}", status.message(), e),
                    ));
                    continue;
                }
            };

            if let Some(id) = expected {
                if response.id == 0 {
                    debug!(
                        "Uncorrelated reply ({}) while waiting for {}",
                        response.envelope.status, id
                    );
                    held = Some(response.envelope);
                    continue;
                }
                if response.id != id {
                    warn!(
                        "Discarding stale reply {} while waiting for {}",
                        response.id, id
                    );
                    continue;
                }
            }

            debug!(
                "Reply {} from {}: {}",
                response.id, from, response.envelope.status
            );
            self.awaiting = None;
            return response.envelope;
        }

        self.awaiting = None;
        if let Some(envelope) = held {
            debug!("No correlated reply, reporting {}", envelope.status);
            return envelope;
        }

        debug!(
            "No reply after {} attempts ({:?})",
            self.config.attempts,
            self.config.max_wait()
        );
        ResultEnvelope::from_status(StatusCode::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulsar_proto::ResourceKind;

    #[tokio::test]
    async fn test_send_while_disconnected_is_unreachable() {
        let mut client = UdpClient::new(ClientConfig::default());
        assert_eq!(client.state(), ClientState::Disconnected);

        let result = client
            .send("show", &[Argument::placeholder(ResourceKind::Collection)])
            .await;

        assert_eq!(result.status, StatusCode::Unreachable);
        assert_eq!(result.text(), StatusCode::Unreachable.message());
        assert_eq!(client.last_id, 0);
    }

    #[tokio::test]
    async fn test_connect_and_disconnect() {
        let mut client = UdpClient::new(ClientConfig {
            host: "127.0.0.1".to_string(),
            port: 40_000,
            ..ClientConfig::default()
        });

        let server = client.connect().await.unwrap();
        assert_eq!(server, "127.0.0.1:40000".parse::<SocketAddr>().unwrap());
        assert!(client.is_connected());
        assert!(client.local_addr().is_some());

        client.disconnect();
        client.disconnect();
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_reconfigure_disconnects() {
        let mut client = UdpClient::new(ClientConfig {
            host: "127.0.0.1".to_string(),
            ..ClientConfig::default()
        });
        client.connect().await.unwrap();

        client.reconfigure("127.0.0.1", 4321);

        assert!(!client.is_connected());
        assert_eq!(client.config().port, 4321);
        let server = client.connect().await.unwrap();
        assert_eq!(server.port(), 4321);
    }

    #[tokio::test]
    async fn test_unresolvable_host_stays_disconnected() {
        let mut client = UdpClient::new(ClientConfig {
            host: "no-such-host.invalid".to_string(),
            ..ClientConfig::default()
        });

        assert!(client.connect().await.is_err());
        assert!(!client.is_connected());
    }

    #[test]
    fn test_ids_skip_zero() {
        let mut client = UdpClient::new(ClientConfig::default());
        client.last_id = u64::MAX;
        assert_eq!(client.next_id(), 1);
        assert_eq!(client.next_id(), 2);
    }

    #[test]
    fn test_max_wait() {
        assert_eq!(ClientConfig::default().max_wait(), Duration::from_secs(5));
    }
}
