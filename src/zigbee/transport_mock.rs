//! In-memory [`FrameTransport`] for tests: records every frame it accepts and
//! can be told to fail a number of upcoming transmissions.

use crate::error::P1Error;
use crate::zigbee::transport::{FrameTransport, OutboundFrame};
use async_trait::async_trait;

#[derive(Debug, Default)]
pub struct MockTransport {
    sent: Vec<OutboundFrame>,
    fail_next: usize,
    attempts: usize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` transmissions fail.
    pub fn fail_next(&mut self, count: usize) {
        self.fail_next = count;
    }

    /// Frames that were accepted, in order.
    pub fn sent(&self) -> &[OutboundFrame] {
        &self.sent
    }

    pub fn take_sent(&mut self) -> Vec<OutboundFrame> {
        std::mem::take(&mut self.sent)
    }

    /// All transmit calls, including failed ones.
    pub fn attempts(&self) -> usize {
        self.attempts
    }
}

#[async_trait]
impl FrameTransport for MockTransport {
    async fn transmit(&mut self, frame: &OutboundFrame) -> Result<(), P1Error> {
        self.attempts += 1;
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(P1Error::TransmitFailure("mock transport refused frame".into()));
        }
        self.sent.push(frame.clone());
        Ok(())
    }
}
