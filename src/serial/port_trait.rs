//! Trait abstraction for the transmit side of the serial link, so the protocol
//! engine can be tested without hardware

use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Trait for serial port output operations
#[async_trait]
pub trait SerialPortIO: Send {
    /// Write all data to the port
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flush the output buffer
    async fn flush(&mut self) -> io::Result<()>;
}

/// Wrapper around any tokio writer (the write half of a
/// `tokio_serial::SerialStream` in production) that implements `SerialPortIO`
#[derive(Debug)]
pub struct TokioSerialPort<W> {
    port: W,
}

impl<W> TokioSerialPort<W> {
    pub fn new(port: W) -> Self {
        Self { port }
    }
}

#[async_trait]
impl<W> SerialPortIO for TokioSerialPort<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.port.write_all(data).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.port.flush().await
    }
}
