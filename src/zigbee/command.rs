//! # Command Engine
//!
//! Answers inbound requests addressed to the meter. Frames are dispatched on
//! their profile:
//!
//! - profile 0x0000 (ZDO): the cluster id is the request. Simple descriptor,
//!   active endpoints, bind and unbind are answered from endpoint 0 with the
//!   response cluster (request | 0x8000). IEEE address responses update the
//!   peer identity, node descriptor responses are ignored.
//! - profile 0x0104 (ZCL): only profile-wide commands are handled. Read
//!   attributes is answered with a single read attributes response; a default
//!   response acknowledges our first report and ends the first-run phase.
//!
//! Anything else is rejected with [`P1Error::MalformedRequest`] and never
//! answered.

use crate::constants::{
    ENDPOINT_ZDO, PROFILE_HOME_AUTOMATION, PROFILE_ZDO, ZCL_CMD_DEFAULT_RSP,
    ZCL_CMD_READ_ATTRIBUTES, ZCL_CMD_READ_ATTRIBUTES_RSP, ZCL_FC_RESPONSE, ZCL_STATUS_SUCCESS,
    ZCL_STATUS_UNSUPPORTED_ATTRIBUTE, ZDO_ACTIVE_EP_REQ, ZDO_BIND_REQ, ZDO_IEEE_ADDR_RSP,
    ZDO_NODE_DESC_RSP, ZDO_RESPONSE_BIT, ZDO_SIMPLE_DESC_REQ, ZDO_STATUS_INVALID_EP,
    ZDO_STATUS_SUCCESS, ZDO_UNBIND_REQ,
};
use crate::error::P1Error;
use crate::zigbee::endpoint::EndpointDescriptor;
use crate::zigbee::frame::{FrameType, ZclHeader};
use crate::zigbee::store::AttributeStore;
use crate::zigbee::transport::{Destination, InboundFrame, OutboundFrame};
use bytes::{BufMut, Bytes, BytesMut};
use log::{debug, info};
use nom::{
    number::complete::{le_u16, le_u64, u8 as byte},
    IResult,
};
use serde::Serialize;

/// Whether our first attribute report has been acknowledged yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FirstRunState {
    AwaitingFirstAck,
    Steady,
}

/// Address pair of the peer that queried us, learned from its IEEE address response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerIdentity {
    pub ieee: u64,
    pub nwk: u16,
}

/// Destination of a bind request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindTarget {
    Group(u16),
    Device { ieee: u64, endpoint: u8 },
}

/// Decoded ZDO bind/unbind request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindRequest {
    pub source: u64,
    pub source_endpoint: u8,
    pub cluster: u16,
    pub target: BindTarget,
}

/// Parses a bind or unbind request following its transaction sequence number.
pub fn parse_bind_request(input: &[u8]) -> IResult<&[u8], BindRequest> {
    let (input, source) = le_u64(input)?;
    let (input, source_endpoint) = byte(input)?;
    let (input, cluster) = le_u16(input)?;
    let (input, mode) = byte(input)?;
    let (input, target) = match mode {
        0x01 => {
            let (input, group) = le_u16(input)?;
            (input, BindTarget::Group(group))
        }
        _ => {
            let (input, ieee) = le_u64(input)?;
            let (input, endpoint) = byte(input)?;
            (input, BindTarget::Device { ieee, endpoint })
        }
    };
    Ok((
        input,
        BindRequest {
            source,
            source_endpoint,
            cluster,
            target,
        },
    ))
}

pub struct CommandEngine {
    endpoints: Vec<EndpointDescriptor>,
    state: FirstRunState,
    peer: Option<PeerIdentity>,
}

impl CommandEngine {
    pub fn new(endpoints: Vec<EndpointDescriptor>) -> Self {
        CommandEngine {
            endpoints,
            state: FirstRunState::AwaitingFirstAck,
            peer: None,
        }
    }

    pub fn state(&self) -> FirstRunState {
        self.state
    }

    pub fn is_first_run(&self) -> bool {
        self.state == FirstRunState::AwaitingFirstAck
    }

    pub fn peer(&self) -> Option<PeerIdentity> {
        self.peer
    }

    pub fn endpoints(&self) -> &[EndpointDescriptor] {
        &self.endpoints
    }

    /// Handles one inbound frame, returning the reply to send, if any.
    pub fn handle(
        &mut self,
        frame: &InboundFrame,
        store: &AttributeStore,
    ) -> Result<Option<OutboundFrame>, P1Error> {
        match frame.profile {
            PROFILE_ZDO => self.handle_zdo(frame),
            PROFILE_HOME_AUTOMATION => self.handle_zcl(frame, store),
            other => Err(P1Error::MalformedRequest(format!(
                "unknown profile 0x{other:04X}"
            ))),
        }
    }

    fn handle_zdo(&mut self, frame: &InboundFrame) -> Result<Option<OutboundFrame>, P1Error> {
        let data = &frame.payload[..];
        let body = match frame.cluster {
            ZDO_SIMPLE_DESC_REQ => {
                require(data, 4, "simple descriptor request")?;
                let endpoint = data[3];
                debug!("Simple descriptor request for ep{endpoint}");
                let mut body = BytesMut::new();
                body.put_u8(data[0]);
                match self.endpoints.iter().find(|e| e.endpoint == endpoint) {
                    Some(descriptor) => {
                        body.put_u8(ZDO_STATUS_SUCCESS);
                        body.put_slice(&data[1..3]);
                        body.put_u8(descriptor.encoded_len() as u8);
                        descriptor.serialize(&mut body);
                    }
                    None => {
                        body.put_u8(ZDO_STATUS_INVALID_EP);
                        body.put_slice(&data[1..3]);
                        body.put_u8(0);
                    }
                }
                body
            }
            ZDO_ACTIVE_EP_REQ => {
                require(data, 3, "active endpoints request")?;
                debug!("Active endpoints request");
                let mut body = BytesMut::new();
                body.put_u8(data[0]);
                body.put_u8(ZDO_STATUS_SUCCESS);
                body.put_slice(&data[1..3]);
                body.put_u8(self.endpoints.len() as u8);
                for descriptor in &self.endpoints {
                    body.put_u8(descriptor.endpoint);
                }
                body
            }
            ZDO_BIND_REQ | ZDO_UNBIND_REQ => {
                require(data, 1, "bind request")?;
                match parse_bind_request(&data[1..]) {
                    Ok((_, request)) => info!(
                        "{} {:016X} ep{} cluster 0x{:04X} -> {:?}",
                        if frame.cluster == ZDO_BIND_REQ { "Bind" } else { "Unbind" },
                        request.source,
                        request.source_endpoint,
                        request.cluster,
                        request.target
                    ),
                    Err(_) => debug!("Undecodable bind request body, acknowledging anyway"),
                }
                let mut body = BytesMut::new();
                body.put_u8(data[0]);
                body.put_u8(ZDO_STATUS_SUCCESS);
                body
            }
            ZDO_IEEE_ADDR_RSP => {
                require(data, 12, "IEEE address response")?;
                let peer = PeerIdentity {
                    ieee: u64::from_le_bytes(data[2..10].try_into().map_err(|_| {
                        P1Error::MalformedRequest("IEEE address response".into())
                    })?),
                    nwk: u16::from_le_bytes([data[10], data[11]]),
                };
                info!("Peer is {:016X} / 0x{:04X}", peer.ieee, peer.nwk);
                self.peer = Some(peer);
                return Ok(None);
            }
            ZDO_NODE_DESC_RSP => return Ok(None),
            other => {
                return Err(P1Error::MalformedRequest(format!(
                    "unhandled ZDO cluster 0x{other:04X}"
                )))
            }
        };

        Ok(Some(OutboundFrame {
            destination: Destination::Extended(frame.sender),
            source_endpoint: ENDPOINT_ZDO,
            destination_endpoint: ENDPOINT_ZDO,
            cluster: frame.cluster | ZDO_RESPONSE_BIT,
            profile: PROFILE_ZDO,
            payload: body.freeze(),
        }))
    }

    fn handle_zcl(
        &mut self,
        frame: &InboundFrame,
        store: &AttributeStore,
    ) -> Result<Option<OutboundFrame>, P1Error> {
        let (header, payload) = ZclHeader::decode(&frame.payload)?;
        // Only profile-wide commands are served; cluster commands reuse the same ids.
        if header.frame_type() != FrameType::Global {
            return Err(P1Error::MalformedRequest(format!(
                "unhandled {:?} command 0x{:02X} on cluster 0x{:04X}",
                header.frame_type(),
                header.command,
                frame.cluster
            )));
        }
        match header.command {
            ZCL_CMD_READ_ATTRIBUTES => {
                if payload.len() % 2 != 0 {
                    return Err(P1Error::MalformedRequest(format!(
                        "read attributes list of {} bytes is not a list of ids",
                        payload.len()
                    )));
                }
                let response = read_attributes_response(
                    header.sequence,
                    frame.destination_endpoint,
                    frame.cluster,
                    payload,
                    store,
                );
                Ok(Some(OutboundFrame {
                    destination: Destination::Extended(frame.sender),
                    source_endpoint: frame.destination_endpoint,
                    destination_endpoint: frame.source_endpoint,
                    cluster: frame.cluster,
                    profile: frame.profile,
                    payload: response,
                }))
            }
            ZCL_CMD_DEFAULT_RSP => {
                if let [command, status, ..] = payload {
                    debug!("Default response to command 0x{command:02X}, status 0x{status:02X}");
                }
                if self.state == FirstRunState::AwaitingFirstAck {
                    info!("First report acknowledged, publishing changes only");
                    self.state = FirstRunState::Steady;
                }
                Ok(None)
            }
            other => Err(P1Error::MalformedRequest(format!(
                "unhandled ZCL command 0x{other:02X} (fc 0x{:02X}, seq {})",
                header.frame_control.bits(),
                header.sequence
            ))),
        }
    }
}

/// Builds a read attributes response for the attribute ids in `request`.
fn read_attributes_response(
    sequence: u8,
    endpoint: u8,
    cluster: u16,
    request: &[u8],
    store: &AttributeStore,
) -> Bytes {
    let mut buf = BytesMut::with_capacity(3 + request.len() * 4);
    ZclHeader::new(ZCL_FC_RESPONSE, sequence, ZCL_CMD_READ_ATTRIBUTES_RSP).pack(&mut buf);

    for id in request.chunks_exact(2) {
        let attribute = u16::from_le_bytes([id[0], id[1]]);
        buf.put_u16_le(attribute);
        match store.lookup(endpoint, cluster, attribute) {
            Ok(descriptor) if descriptor.is_set() => {
                buf.put_u8(ZCL_STATUS_SUCCESS);
                descriptor.encode_typed_value(&mut buf);
            }
            _ => {
                debug!("Read of unsupported attribute 0x{attribute:04X} on ep{endpoint}");
                buf.put_u8(ZCL_STATUS_UNSUPPORTED_ATTRIBUTE);
            }
        }
    }
    buf.freeze()
}

fn require(data: &[u8], len: usize, what: &str) -> Result<(), P1Error> {
    if data.len() < len {
        return Err(P1Error::MalformedRequest(format!(
            "{what} needs {len} bytes, got {}",
            data.len()
        )));
    }
    Ok(())
}
