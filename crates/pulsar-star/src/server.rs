//! UDP receive loop for the Star.
//!
//! One datagram in, one datagram out. No inbound packet, however broken, can
//! stop the loop or go unanswered: decode failures, unknown commands, body
//! errors and panics all become an error envelope sent back to the sender.

use crate::error::ServeError;
use pulsar_core_dispatch::{dispatch_request, CommandRegistry, ResourceSet};
use pulsar_proto::{
    decode_request, encode_response, peek_request_id, Response, ResultEnvelope, StatusCode,
    RECV_BUFFER_SIZE,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::{debug, error, info, warn};

/// Outcome of one request/response exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub peer: SocketAddr,
    pub request_id: u64,
    pub status: StatusCode,
    /// False when the reply could not be sent
    pub replied: bool,
}

/// Turn one inbound datagram into the response to send back.
///
/// Undecodable requests are answered with the matching error status and,
/// when the header is readable, the original request id.
pub fn handle_datagram(
    registry: &CommandRegistry,
    resources: &ResourceSet,
    bytes: &[u8],
) -> Response {
    match decode_request(bytes) {
        Ok(request) => {
            debug!(
                "Request {}: {} ({} args)",
                request.id,
                request.alias,
                request.args.len()
            );
            let envelope = dispatch_request(registry, &request.alias, request.args, resources);
            Response {
                id: request.id,
                envelope,
            }
        }
        Err(e) => {
            let status = e.status();
            warn!("Undecodable request ({} bytes): {}", bytes.len(), e);
            Response {
                id: peek_request_id(bytes),
                envelope: ResultEnvelope::with_message(
                    status,
                    format!("{}: {}", status.message(), e),
                ),
            }
        }
    }
}

/// The Star's datagram endpoint and everything a command may need
pub struct UdpServer {
    socket: UdpSocket,
    registry: Arc<CommandRegistry>,
    resources: ResourceSet,
    buf: Vec<u8>,
}

impl UdpServer {
    /// Bind the server socket. Failure is returned as is; there is no retry.
    pub async fn bind(
        addr: SocketAddr,
        registry: Arc<CommandRegistry>,
        resources: ResourceSet,
    ) -> Result<Self, ServeError> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| ServeError::Bind { addr, source })?;
        info!("Star bound to {}", socket.local_addr()?);

        Ok(Self {
            socket,
            registry,
            resources,
            buf: vec![0u8; RECV_BUFFER_SIZE],
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServeError> {
        Ok(self.socket.local_addr()?)
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// Wait for one datagram, execute it and reply
    pub async fn receive_one(&mut self) -> Result<Exchange, ServeError> {
        let (len, peer) = self
            .socket
            .recv_from(&mut self.buf)
            .await
            .map_err(ServeError::Receive)?;
        Ok(self.answer(len, peer).await)
    }

    async fn answer(&self, len: usize, peer: SocketAddr) -> Exchange {
        let response = handle_datagram(&self.registry, &self.resources, &self.buf[..len]);
        let status = response.envelope.status;

        let frame = match encode_response(response.id, &response.envelope) {
            Ok(frame) => Some(frame),
            Err(e) => {
                warn!("Reply to request {} not encodable: {}", response.id, e);
                let fallback = ResultEnvelope::with_message(
                    StatusCode::InternalError,
                    format!("Reply could not be encoded: {}", e),
                );
                encode_response(response.id, &fallback)
                    .map_err(|e| error!("Fallback reply not encodable: {}", e))
                    .ok()
            }
        };

        let replied = match frame {
            Some(frame) => match self.socket.send_to(&frame, peer).await {
                Ok(_) => true,
                Err(e) => {
                    error!("Failed to reply to {}: {}", peer, e);
                    false
                }
            },
            None => false,
        };

        debug!("Request {} from {} -> {}", response.id, peer, status);
        Exchange {
            peer,
            request_id: response.id,
            status,
            replied,
        }
    }

    /// Serve until the process ends
    pub async fn serve(&mut self) {
        self.serve_until(std::future::pending::<()>()).await
    }

    /// Serve until `shutdown` resolves. A request already received is
    /// answered before the loop stops.
    pub async fn serve_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        match self.socket.local_addr() {
            Ok(addr) => info!("Star serving on {}", addr),
            Err(_) => info!("Star serving"),
        }

        loop {
            let received = tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, Star stopping");
                    break;
                }
                received = self.socket.recv_from(&mut self.buf) => received,
            };

            match received {
                Ok((len, peer)) => {
                    self.answer(len, peer).await;
                }
                Err(e) => warn!("Receive failed: {}", e),
            }
        }
    }
}
