//! # Attribute Report Encoder
//!
//! Turns a dirty set into ZCL "report attributes" frames, one per cluster:
//!
//! ```text
//! | 0x00 | seq | 0x0A | attr id LE | type | value | attr id LE | type | value | ...
//! ```
//!
//! Clusters are emitted in the order they are first seen in the dirty set and
//! attributes keep their dirty-set order inside a cluster. Unset attributes are
//! never encoded and a cluster with nothing left produces no frame.
//!
//! The sequence number is shared by all endpoints and only advances when the
//! transport accepted the frame.

use crate::constants::{
    ENDPOINT_ELECTRICITY, PROFILE_HOME_AUTOMATION, ZCL_CMD_REPORT_ATTRIBUTES, ZCL_FC_REPORT,
};
use crate::p1::parser::DirtySet;
use crate::zigbee::attribute::AttributeDescriptor;
use crate::zigbee::frame::ZclHeader;
use crate::zigbee::store::AttributeStore;
use crate::zigbee::transport::{Destination, FrameTransport, OutboundFrame};
use bytes::{BufMut, Bytes, BytesMut};
use log::{debug, warn};
use serde::Serialize;
use std::ops::AddAssign;

/// Outcome of publishing one or more dirty sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub sent: usize,
    pub failed: usize,
}

impl AddAssign for ReportSummary {
    fn add_assign(&mut self, other: ReportSummary) {
        self.sent += other.sent;
        self.failed += other.failed;
    }
}

/// Groups attributes by cluster, keeping first-seen cluster order.
pub fn group_by_cluster<'a>(
    attributes: &[&'a AttributeDescriptor],
) -> Vec<(u16, Vec<&'a AttributeDescriptor>)> {
    let mut groups: Vec<(u16, Vec<&AttributeDescriptor>)> = Vec::new();
    for &attribute in attributes {
        let cluster = attribute.key().cluster;
        match groups.iter_mut().find(|(c, _)| *c == cluster) {
            Some((_, members)) => members.push(attribute),
            None => groups.push((cluster, vec![attribute])),
        }
    }
    groups
}

/// Encodes one report frame payload; `None` if no attribute has a value.
pub fn encode_report(sequence: u8, attributes: &[&AttributeDescriptor]) -> Option<Bytes> {
    let mut buf = BytesMut::with_capacity(64);
    ZclHeader::new(ZCL_FC_REPORT, sequence, ZCL_CMD_REPORT_ATTRIBUTES).pack(&mut buf);
    let header_len = buf.len();

    for attribute in attributes {
        let mark = buf.len();
        buf.put_u16_le(attribute.key().attribute);
        if !attribute.encode_typed_value(&mut buf) {
            buf.truncate(mark);
        }
    }

    (buf.len() > header_len).then(|| buf.freeze())
}

/// Stateful report publisher owning the outbound sequence number.
#[derive(Debug, Clone)]
pub struct ReportEncoder {
    sequence: u8,
    destination_endpoint: u8,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        ReportEncoder::new(ENDPOINT_ELECTRICITY)
    }
}

impl ReportEncoder {
    pub fn new(destination_endpoint: u8) -> Self {
        ReportEncoder {
            sequence: 0,
            destination_endpoint,
        }
    }

    /// Sequence number of the next report frame.
    pub fn sequence(&self) -> u8 {
        self.sequence
    }

    /// Frames a publish would send if every transmit succeeded.
    pub fn preview(&self, dirty: &DirtySet, store: &AttributeStore) -> Vec<OutboundFrame> {
        let mut sequence = self.sequence;
        let attributes = store.resolve(dirty.keys());
        group_by_cluster(&attributes)
            .into_iter()
            .filter_map(|(cluster, members)| {
                let payload = encode_report(sequence, &members)?;
                sequence = sequence.wrapping_add(1);
                Some(self.frame(dirty.endpoint(), cluster, payload))
            })
            .collect()
    }

    /// Sends one report per cluster of the dirty set. Failures are counted, not retried.
    pub async fn publish<T: FrameTransport + ?Sized>(
        &mut self,
        dirty: &DirtySet,
        store: &AttributeStore,
        transport: &mut T,
    ) -> ReportSummary {
        let mut summary = ReportSummary::default();
        let attributes = store.resolve(dirty.keys());

        for (cluster, members) in group_by_cluster(&attributes) {
            let Some(payload) = encode_report(self.sequence, &members) else {
                continue;
            };
            let frame = self.frame(dirty.endpoint(), cluster, payload);
            match transport.transmit(&frame).await {
                Ok(()) => {
                    debug!(
                        "Reported {} attributes of ep{} cluster 0x{cluster:04X}, seq {}",
                        members.len(),
                        dirty.endpoint(),
                        self.sequence
                    );
                    self.sequence = self.sequence.wrapping_add(1);
                    summary.sent += 1;
                }
                Err(e) => {
                    warn!("Dropping report for ep{} cluster 0x{cluster:04X}: {e}", dirty.endpoint());
                    summary.failed += 1;
                }
            }
        }
        summary
    }

    fn frame(&self, endpoint: u8, cluster: u16, payload: Bytes) -> OutboundFrame {
        OutboundFrame {
            destination: Destination::Coordinator,
            source_endpoint: endpoint,
            destination_endpoint: self.destination_endpoint,
            cluster,
            profile: PROFILE_HOME_AUTOMATION,
            payload,
        }
    }
}
