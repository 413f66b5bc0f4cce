//! # Frame Transport
//!
//! The radio stack is outside the bridge: the bridge hands complete APS frames
//! to a [`FrameTransport`] and receives inbound frames as [`InboundFrame`]s.

use crate::error::P1Error;
use crate::util::logging::log_frame_hex;
use async_trait::async_trait;
use bytes::Bytes;
use log::info;
use std::fmt;

/// Where an outbound frame is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// The network coordinator (short address 0x0000)
    Coordinator,
    /// A node addressed by its IEEE address
    Extended(u64),
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Coordinator => f.write_str("coordinator"),
            Destination::Extended(ieee) => write!(f, "{ieee:016X}"),
        }
    }
}

/// A frame to be sent, with its APS addressing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundFrame {
    pub destination: Destination,
    pub source_endpoint: u8,
    pub destination_endpoint: u8,
    pub cluster: u16,
    pub profile: u16,
    pub payload: Bytes,
}

/// A frame delivered by the radio stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundFrame {
    /// IEEE address of the sender
    pub sender: u64,
    /// Network (short) address of the sender
    pub sender_nwk: u16,
    pub source_endpoint: u8,
    pub destination_endpoint: u8,
    pub cluster: u16,
    pub profile: u16,
    pub payload: Bytes,
}

/// Sends frames on behalf of the bridge. A failed transmit is never retried.
#[async_trait]
pub trait FrameTransport: Send {
    async fn transmit(&mut self, frame: &OutboundFrame) -> Result<(), P1Error>;
}

/// Transport that only logs the frames it is given.
#[derive(Debug, Default)]
pub struct LogTransport {
    sent: usize,
}

impl LogTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> usize {
        self.sent
    }
}

#[async_trait]
impl FrameTransport for LogTransport {
    async fn transmit(&mut self, frame: &OutboundFrame) -> Result<(), P1Error> {
        info!(
            "-> {} ep{}->ep{} cluster 0x{:04X} profile 0x{:04X}",
            frame.destination,
            frame.source_endpoint,
            frame.destination_endpoint,
            frame.cluster,
            frame.profile
        );
        log_frame_hex("TX", &frame.payload);
        self.sent += 1;
        Ok(())
    }
}
