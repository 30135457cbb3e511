//! UDP DNS Server
//!
//! Single receive-process-reply loop over one socket. Bad packets and
//! transient socket errors are logged and skipped; only a shutdown signal
//! ends the loop.

use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::dns::wire::MAX_UDP_PAYLOAD;
use crate::dns::DockerDnsHandler;

/// DNS responder bound to its socket
pub struct DnsServer {
    socket: UdpSocket,
    handler: DockerDnsHandler,
}

impl DnsServer {
    /// Bind the UDP socket
    pub async fn bind(addr: SocketAddr, handler: DockerDnsHandler) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self { socket, handler })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Serve until `shutdown` flips to true or its sender goes away.
    /// The socket is closed when this returns.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let addr = self.local_addr()?;
        info!("🌐 DNS server listening on {}", addr);

        let mut buf = vec![0u8; MAX_UDP_PAYLOAD];

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                received = self.socket.recv_from(&mut buf) => match received {
                    Ok((len, src)) => {
                        if let Some(reply) = self.handler.handle(&buf[..len]).await {
                            if let Err(e) = self.socket.send_to(&reply, src).await {
                                warn!("Failed to reply to {}: {}", src, e);
                            }
                        } else {
                            debug!("No reply to {}", src);
                        }
                    }
                    Err(e) => {
                        warn!("DNS socket error: {}", e);
                    }
                }
            }
        }

        info!("DNS server on {} shut down", addr);
        Ok(())
    }
}
