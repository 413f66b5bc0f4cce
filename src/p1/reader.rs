//! # P1 Telegram Reader
//!
//! Assembles one complete telegram (`/ ... !XXXX`) from a byte source that
//! delivers data in arbitrarily sized chunks. The reader polls the source with a
//! fixed interval and three nested budgets:
//!
//! 1. scanning for the `/` start marker,
//! 2. accumulating the body until the `!` end marker,
//! 3. draining the 4 checksum digits that follow `!`.
//!
//! Running out of any budget yields [`P1Error::AcquisitionTimeout`] and no
//! partial telegram. The source's ready-to-send gate is asserted before the first
//! poll and deasserted once the reader is done, whatever the outcome.

use crate::constants::{P1_CHECKSUM_DIGITS, P1_END_MARKER, P1_START_MARKER};
use crate::error::{AcquisitionStage, P1Error};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A byte source delivering telegram data, e.g. the P1 serial port.
#[async_trait::async_trait]
pub trait TelegramSource: Send {
    /// Returns the bytes available right now; an empty vector means none.
    async fn read_available(&mut self) -> Result<Vec<u8>, P1Error>;

    /// Asserts or deasserts the data request line of the meter.
    async fn set_ready(&mut self, ready: bool) -> Result<(), P1Error>;
}

/// Poll budgets and intervals of the three acquisition stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub scan_polls: u32,
    pub scan_interval_ms: u64,
    pub body_polls: u32,
    pub body_interval_ms: u64,
    pub tail_polls: u32,
    pub tail_interval_ms: u64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            scan_polls: 10,
            scan_interval_ms: 50,
            body_polls: 100,
            body_interval_ms: 10,
            tail_polls: 10,
            tail_interval_ms: 10,
        }
    }
}

impl ReaderConfig {
    /// Same budgets without any sleeping between polls.
    pub fn without_delays(mut self) -> Self {
        self.scan_interval_ms = 0;
        self.body_interval_ms = 0;
        self.tail_interval_ms = 0;
        self
    }
}

/// Reads exactly one framed telegram from `source`.
///
/// The returned buffer starts with `/` and ends with the 4 checksum digits;
/// anything received after the checksum is discarded.
pub async fn read_telegram<S: TelegramSource + ?Sized>(
    source: &mut S,
    config: &ReaderConfig,
) -> Result<Vec<u8>, P1Error> {
    source.set_ready(true).await?;
    let result = acquire(source, config).await;
    let released = source.set_ready(false).await;

    let telegram = result?;
    released?;
    Ok(telegram)
}

async fn acquire<S: TelegramSource + ?Sized>(
    source: &mut S,
    config: &ReaderConfig,
) -> Result<Vec<u8>, P1Error> {
    let mut buffer = scan_for_start(source, config).await?;
    let end = accumulate_body(source, config, &mut buffer).await?;
    drain_tail(source, config, &mut buffer, end).await?;

    buffer.truncate(end + 1 + P1_CHECKSUM_DIGITS);
    debug!("Telegram complete: {} bytes", buffer.len());
    Ok(buffer)
}

async fn scan_for_start<S: TelegramSource + ?Sized>(
    source: &mut S,
    config: &ReaderConfig,
) -> Result<Vec<u8>, P1Error> {
    for _ in 0..config.scan_polls {
        let chunk = source.read_available().await?;
        if let Some(start) = chunk.iter().position(|&b| b == P1_START_MARKER) {
            trace!("Start marker found at offset {start} of {} byte chunk", chunk.len());
            return Ok(chunk[start..].to_vec());
        }
        pause(config.scan_interval_ms).await;
    }
    Err(P1Error::AcquisitionTimeout {
        stage: AcquisitionStage::Scanning,
    })
}

/// Returns the position of the end marker in `buffer`.
async fn accumulate_body<S: TelegramSource + ?Sized>(
    source: &mut S,
    config: &ReaderConfig,
    buffer: &mut Vec<u8>,
) -> Result<usize, P1Error> {
    // The chunk holding the start marker may already hold the whole telegram.
    let mut searched = 0;
    if let Some(end) = find_end(buffer, &mut searched) {
        return Ok(end);
    }

    for _ in 0..config.body_polls {
        let chunk = source.read_available().await?;
        if !chunk.is_empty() {
            buffer.extend_from_slice(&chunk);
            if let Some(end) = find_end(buffer, &mut searched) {
                return Ok(end);
            }
        }
        pause(config.body_interval_ms).await;
    }
    Err(P1Error::AcquisitionTimeout {
        stage: AcquisitionStage::Body,
    })
}

fn find_end(buffer: &[u8], searched: &mut usize) -> Option<usize> {
    let found = buffer[*searched..]
        .iter()
        .position(|&b| b == P1_END_MARKER)
        .map(|offset| *searched + offset);
    *searched = buffer.len();
    found
}

async fn drain_tail<S: TelegramSource + ?Sized>(
    source: &mut S,
    config: &ReaderConfig,
    buffer: &mut Vec<u8>,
    end: usize,
) -> Result<(), P1Error> {
    let complete_len = end + 1 + P1_CHECKSUM_DIGITS;
    let mut polls = 0;
    while buffer.len() < complete_len {
        if polls == config.tail_polls {
            return Err(P1Error::AcquisitionTimeout {
                stage: AcquisitionStage::Tail,
            });
        }
        pause(config.tail_interval_ms).await;
        buffer.extend_from_slice(&source.read_available().await?);
        polls += 1;
    }
    Ok(())
}

async fn pause(interval_ms: u64) {
    if interval_ms > 0 {
        tokio::time::sleep(Duration::from_millis(interval_ms)).await;
    }
}
