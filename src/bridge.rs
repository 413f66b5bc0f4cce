//! # P1 Bridge
//!
//! Ties the pieces together: one acquisition cycle reads a telegram, parses it
//! into the attribute store and reports what became dirty; inbound frames are
//! answered from the same store in between cycles.
//!
//! Nothing here is fatal. A failed cycle leaves the store untouched for the next
//! comparison, a failed transmit drops one frame, a malformed request is dropped
//! without reply.

use crate::config::BridgeConfig;
use crate::error::P1Error;
use crate::p1::parser::{parse_telegram, ParsedTelegram, PublishPolicy};
use crate::p1::reader::{read_telegram, ReaderConfig, TelegramSource};
use crate::stats::BridgeStats;
use crate::util::logging::{log_frame_hex, ThrottleManager};
use crate::zigbee::command::CommandEngine;
use crate::zigbee::endpoint::meter_endpoints;
use crate::zigbee::meter::meter_attribute_store;
use crate::zigbee::report::{ReportEncoder, ReportSummary};
use crate::zigbee::store::AttributeStore;
use crate::zigbee::transport::{FrameTransport, InboundFrame};
use log::{debug, info, warn};
use std::time::Duration;
use tokio::sync::mpsc;

pub struct P1Bridge {
    store: AttributeStore,
    engine: CommandEngine,
    encoder: ReportEncoder,
    stats: BridgeStats,
    always_publish: bool,
    reader: ReaderConfig,
    throttle: ThrottleManager,
}

impl P1Bridge {
    pub fn new(config: &BridgeConfig) -> Result<Self, P1Error> {
        config.validate()?;
        Ok(P1Bridge {
            store: meter_attribute_store(&config.device)?,
            engine: CommandEngine::new(meter_endpoints()),
            encoder: ReportEncoder::new(config.report_destination_endpoint),
            stats: BridgeStats::default(),
            always_publish: config.always_publish,
            reader: config.reader.clone(),
            throttle: ThrottleManager::default(),
        })
    }

    pub fn store(&self) -> &AttributeStore {
        &self.store
    }

    pub fn engine(&self) -> &CommandEngine {
        &self.engine
    }

    pub fn encoder(&self) -> &ReportEncoder {
        &self.encoder
    }

    pub fn stats(&self) -> &BridgeStats {
        &self.stats
    }

    pub fn policy(&self) -> PublishPolicy {
        PublishPolicy {
            always_publish: self.always_publish,
            first_run: self.engine.is_first_run(),
        }
    }

    /// Validates and parses one telegram into the store.
    pub fn process_telegram(&mut self, telegram: &[u8]) -> Result<ParsedTelegram, P1Error> {
        let policy = self.policy();
        match parse_telegram(telegram, &mut self.store, policy) {
            Ok(parsed) => {
                self.stats.telegrams_parsed += 1;
                self.stats.skipped_lines += parsed.skipped_lines as u64;
                Ok(parsed)
            }
            Err(e) => {
                self.note_cycle_error(&e);
                Err(e)
            }
        }
    }

    /// Reports both dirty sets of a parsed telegram.
    pub async fn publish<T: FrameTransport + ?Sized>(
        &mut self,
        parsed: &ParsedTelegram,
        transport: &mut T,
    ) -> ReportSummary {
        let mut summary = ReportSummary::default();
        for dirty in parsed.dirty_sets() {
            summary += self.encoder.publish(dirty, &self.store, transport).await;
        }
        self.stats.record_reports(summary);
        summary
    }

    /// Runs one acquisition cycle; `None` when no telegram could be used.
    pub async fn run_cycle<S, T>(&mut self, source: &mut S, transport: &mut T) -> Option<ReportSummary>
    where
        S: TelegramSource + ?Sized,
        T: FrameTransport + ?Sized,
    {
        self.stats.cycles += 1;

        let telegram = match read_telegram(source, &self.reader).await {
            Ok(telegram) => telegram,
            Err(e) => {
                self.note_cycle_error(&e);
                return None;
            }
        };
        let parsed = self.process_telegram(&telegram).ok()?;
        if let Some(timestamp) = parsed.timestamp {
            debug!("Telegram of {timestamp}");
        }

        let summary = self.publish(&parsed, transport).await;
        debug!("Stats: {}", self.stats.to_json());
        Some(summary)
    }

    /// Answers one inbound frame. Returns whether a reply was sent.
    pub async fn handle_inbound<T: FrameTransport + ?Sized>(
        &mut self,
        frame: &InboundFrame,
        transport: &mut T,
    ) -> Result<bool, P1Error> {
        log_frame_hex("RX", &frame.payload);
        let reply = match self.engine.handle(frame, &self.store) {
            Ok(reply) => reply,
            Err(e) => {
                debug!(
                    "Dropping frame from {:016X} cluster 0x{:04X}: {e}",
                    frame.sender, frame.cluster
                );
                self.stats.record_error(&e);
                return Err(e);
            }
        };

        let Some(reply) = reply else {
            return Ok(false);
        };
        match transport.transmit(&reply).await {
            Ok(()) => {
                self.stats.requests_answered += 1;
                Ok(true)
            }
            Err(e) => {
                warn!("Reply to {:016X} dropped: {e}", frame.sender);
                self.stats.transmit_failures += 1;
                Ok(false)
            }
        }
    }

    /// Runs acquisition cycles every `cycle_time`, answering inbound frames in between.
    ///
    /// Returns once `inbound` is closed; frames already queued are still answered.
    pub async fn run<S, T>(
        &mut self,
        source: &mut S,
        transport: &mut T,
        mut inbound: mpsc::Receiver<InboundFrame>,
        cycle_time: Duration,
    ) where
        S: TelegramSource + ?Sized,
        T: FrameTransport + ?Sized,
    {
        let mut ticker = tokio::time::interval(cycle_time);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!("Bridge running, cycle time {cycle_time:?}");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Some(summary) = self.run_cycle(source, transport).await {
                        debug!("Cycle sent {} frames, {} failed", summary.sent, summary.failed);
                    }
                }
                frame = inbound.recv() => match frame {
                    Some(frame) => {
                        let _ = self.handle_inbound(&frame, transport).await;
                    }
                    None => break,
                },
            }
        }
        info!("Inbound channel closed, bridge stopped");
    }

    fn note_cycle_error(&mut self, error: &P1Error) {
        self.stats.record_error(error);
        let category = match error {
            P1Error::AcquisitionTimeout { .. } => "acquisition",
            P1Error::ChecksumMismatch { .. } | P1Error::InvalidTelegram(_) => "checksum",
            _ => "serial",
        };
        crate::log_warn_throttled!(self.throttle, category, "Skipping cycle: {error}");
    }
}
