use crate::application::ports::ReachabilityProbe;
use async_trait::async_trait;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Treats a successful TCP handshake with a known host as "online".
pub struct TcpReachabilityProbe {
    address: String,
    connect_timeout: Duration,
}

impl TcpReachabilityProbe {
    pub fn new(address: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            address: address.into(),
            connect_timeout,
        }
    }
}

#[async_trait]
impl ReachabilityProbe for TcpReachabilityProbe {
    async fn is_reachable(&self) -> bool {
        match timeout(self.connect_timeout, TcpStream::connect(&self.address)).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(err)) => {
                tracing::trace!(
                    target: "offline::connectivity",
                    address = %self.address,
                    error = %err,
                    "probe connect failed"
                );
                false
            }
            Err(_) => {
                tracing::trace!(
                    target: "offline::connectivity",
                    address = %self.address,
                    "probe connect timed out"
                );
                false
            }
        }
    }
}
