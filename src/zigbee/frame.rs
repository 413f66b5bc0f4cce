//! # ZCL Frame Header
//!
//! Decoding and packing of the Zigbee Cluster Library frame header:
//!
//! ```text
//! | frame control | [manufacturer code, 2 bytes LE] | sequence | command id | payload...
//! ```
//!
//! The manufacturer code is only present when the manufacturer-specific bit of
//! the frame control byte is set. Parsing is done with `nom`.

use crate::constants::{
    ZCL_FC_DIRECTION_SERVER_TO_CLIENT, ZCL_FC_DISABLE_DEFAULT_RESPONSE, ZCL_FC_FRAME_TYPE_MASK,
    ZCL_FC_MANUFACTURER_SPECIFIC, ZCL_HEADER_LEN,
};
use crate::error::P1Error;
use bitflags::bitflags;
use bytes::{BufMut, BytesMut};
use nom::{
    combinator::cond,
    number::complete::{le_u16, u8 as byte},
    IResult,
};

bitflags! {
    /// ZCL frame control field.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FrameControl: u8 {
        const CLUSTER_SPECIFIC = 0x01;
        const MANUFACTURER_SPECIFIC = ZCL_FC_MANUFACTURER_SPECIFIC;
        const SERVER_TO_CLIENT = ZCL_FC_DIRECTION_SERVER_TO_CLIENT;
        const DISABLE_DEFAULT_RESPONSE = ZCL_FC_DISABLE_DEFAULT_RESPONSE;
    }
}

/// Kind of command carried by a ZCL frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    /// Profile-wide (global) command such as read attributes
    Global,
    /// Command defined by the addressed cluster
    ClusterSpecific,
    /// Reserved frame type values
    Reserved(u8),
}

impl FrameControl {
    pub fn frame_type(self) -> FrameType {
        match self.bits() & ZCL_FC_FRAME_TYPE_MASK {
            0 => FrameType::Global,
            1 => FrameType::ClusterSpecific,
            other => FrameType::Reserved(other),
        }
    }
}

/// Decoded ZCL frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZclHeader {
    pub frame_control: FrameControl,
    pub manufacturer_code: Option<u16>,
    pub sequence: u8,
    pub command: u8,
}

impl ZclHeader {
    /// Header of a frame without manufacturer code.
    pub fn new(frame_control: u8, sequence: u8, command: u8) -> Self {
        ZclHeader {
            frame_control: FrameControl::from_bits_retain(frame_control),
            manufacturer_code: None,
            sequence,
            command,
        }
    }

    /// Splits a ZCL payload into header and command payload.
    pub fn decode(payload: &[u8]) -> Result<(ZclHeader, &[u8]), P1Error> {
        if payload.len() < ZCL_HEADER_LEN {
            return Err(P1Error::MalformedRequest(format!(
                "ZCL frame of {} bytes is shorter than its header",
                payload.len()
            )));
        }
        parse_zcl_header(payload)
            .map(|(rest, header)| (header, rest))
            .map_err(|_| P1Error::MalformedRequest("truncated manufacturer-specific header".into()))
    }

    pub fn frame_type(&self) -> FrameType {
        self.frame_control.frame_type()
    }

    /// Number of bytes the header occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        ZCL_HEADER_LEN + if self.manufacturer_code.is_some() { 2 } else { 0 }
    }

    pub fn pack(&self, buf: &mut BytesMut) {
        let mut frame_control = self.frame_control;
        frame_control.set(
            FrameControl::MANUFACTURER_SPECIFIC,
            self.manufacturer_code.is_some(),
        );
        buf.put_u8(frame_control.bits());
        if let Some(code) = self.manufacturer_code {
            buf.put_u16_le(code);
        }
        buf.put_u8(self.sequence);
        buf.put_u8(self.command);
    }
}

/// Uses the `nom` crate to parse a ZCL header from a byte slice.
pub fn parse_zcl_header(input: &[u8]) -> IResult<&[u8], ZclHeader> {
    let (input, fc) = byte(input)?;
    let frame_control = FrameControl::from_bits_retain(fc);
    let (input, manufacturer_code) = cond(
        frame_control.contains(FrameControl::MANUFACTURER_SPECIFIC),
        le_u16,
    )(input)?;
    let (input, sequence) = byte(input)?;
    let (input, command) = byte(input)?;
    Ok((
        input,
        ZclHeader {
            frame_control,
            manufacturer_code,
            sequence,
            command,
        },
    ))
}
