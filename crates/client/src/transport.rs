//! Stream transport abstraction and its TCP implementation.
//!
//! The session only needs three primitives: a possibly-partial write, a
//! bounded read, and a way to close the write half for the orderly
//! shutdown handshake. Keeping them behind a trait lets tests script the
//! exact chunking a real network would produce.

use std::io;

use anyhow::{ensure, Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::info;

/// A connected byte stream to the whiteboard server.
#[async_trait]
pub trait Transport: Send {
    /// Write a prefix of `data`, returning how many bytes were accepted.
    async fn send(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Read into `buf`, returning `0` at end-of-input.
    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Close the write half, signalling that no more data will be sent.
    async fn shutdown_write(&mut self) -> io::Result<()>;
}

/// TCP transport over a tokio stream.
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    /// Connect to the whiteboard server.
    pub async fn connect(server: &str, port: u16) -> Result<Self> {
        ensure!(
            !server.contains('/'),
            "server {server:?} must be a bare host name"
        );

        info!("connecting to {server}:{port}");
        let stream = TcpStream::connect((server, port))
            .await
            .with_context(|| format!("failed to connect to {server}:{port}"))?;
        info!("connected to {server}:{port}");

        Ok(Self { stream })
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, data: &[u8]) -> io::Result<usize> {
        self.stream.write(data).await
    }

    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf).await
    }

    async fn shutdown_write(&mut self) -> io::Result<()> {
        self.stream.shutdown().await
    }
}
