use log::{error, info};
use std::net::SocketAddr;
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::sync::oneshot;

use super::connection::{serve_connection, ServeOptions};
use super::error::TransportError;
use super::invoker::Invoker;

/// TCP front end: one task per connection
pub struct TcpServer {
    listener: TcpListener,
    invoker: Invoker,
    options: ServeOptions,
}

impl TcpServer {
    pub async fn bind(
        addr: impl ToSocketAddrs,
        invoker: Invoker,
        options: ServeOptions,
    ) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            invoker,
            options,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections forever
    pub async fn run(self) -> Result<(), TransportError> {
        loop {
            self.accept_one().await?;
        }
    }

    /// Accept connections until `shutdown` fires (or its sender is dropped)
    pub async fn run_until(self, mut shutdown: oneshot::Receiver<()>) -> Result<(), TransportError> {
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, no longer accepting connections");
                    return Ok(());
                }
                accepted = self.accept_one() => accepted?,
            }
        }
    }

    async fn accept_one(&self) -> Result<(), TransportError> {
        let (stream, peer) = self.listener.accept().await?;
        info!("Accepted connection from {}", peer);

        let invoker = self.invoker.clone();
        let options = self.options;
        tokio::spawn(async move {
            let (reader, writer) = stream.into_split();
            match serve_connection(invoker, reader, writer, options).await {
                Ok(handled) => info!("{} disconnected after {} message(s)", peer, handled),
                Err(e) => error!("Connection {} failed: {}", peer, e),
            }
        });
        Ok(())
    }
}
