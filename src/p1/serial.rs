//! # P1 Serial Port
//!
//! This module provides the real telegram source: a DSMR P1 port opened with
//! `tokio_serial`. The RTS line doubles as the meter's data request gate.

use crate::error::P1Error;
use crate::p1::reader::TelegramSource;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio_serial::{SerialPort, SerialPortBuilderExt};

/// How long a single poll waits for bytes before reporting none.
const READ_WINDOW: Duration = Duration::from_millis(1);

/// Size of the read buffer used for a single poll.
const READ_CHUNK: usize = 256;

/// Configuration for the P1 serial connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub port: String,
    pub baudrate: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig {
            port: "/dev/ttyUSB0".to_string(),
            // DSMR 4 and 5 use 115200 8N1
            baudrate: 115_200,
        }
    }
}

/// Represents a handle to the P1 serial connection, encapsulating the tokio_serial::SerialStream.
pub struct P1SerialPort {
    port: tokio_serial::SerialStream,
}

impl P1SerialPort {
    /// Opens the serial port 8N1 at the configured baud rate.
    pub fn open(config: &SerialConfig) -> Result<P1SerialPort, P1Error> {
        let port = tokio_serial::new(&config.port, config.baudrate)
            .data_bits(tokio_serial::DataBits::Eight)
            .stop_bits(tokio_serial::StopBits::One)
            .parity(tokio_serial::Parity::None)
            .open_native_async()
            .map_err(|e| P1Error::SerialPortError(e.to_string()))?;

        Ok(P1SerialPort { port })
    }
}

#[async_trait::async_trait]
impl TelegramSource for P1SerialPort {
    async fn read_available(&mut self) -> Result<Vec<u8>, P1Error> {
        let mut buf = [0u8; READ_CHUNK];
        match tokio::time::timeout(READ_WINDOW, self.port.read(&mut buf)).await {
            // Nothing arrived within the window
            Err(_) => Ok(Vec::new()),
            Ok(Ok(n)) => Ok(buf[..n].to_vec()),
            Ok(Err(e)) => Err(P1Error::SerialPortError(e.to_string())),
        }
    }

    async fn set_ready(&mut self, ready: bool) -> Result<(), P1Error> {
        self.port
            .write_request_to_send(ready)
            .map_err(|e| P1Error::SerialPortError(e.to_string()))
    }
}
