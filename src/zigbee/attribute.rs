//! # ZCL Attributes
//!
//! Wire-level description of a single reportable attribute: where it lives
//! (endpoint, cluster, attribute id), its ZCL type tag and its current value.

use crate::error::P1Error;
use bytes::BufMut;
use std::fmt;

/// ZCL data type tags used by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ZclDataType {
    Bitmap8 = 0x18,
    Bitmap32 = 0x1B,
    Uint8 = 0x20,
    Uint16 = 0x21,
    Uint24 = 0x22,
    Uint32 = 0x23,
    Uint48 = 0x25,
    Int32 = 0x2B,
    Enum8 = 0x30,
    /// Length-prefixed character string
    CharString = 0x42,
}

impl ZclDataType {
    /// Fixed value width in bytes, `None` for length-prefixed types.
    pub fn width(self) -> Option<usize> {
        match self {
            ZclDataType::Bitmap8 | ZclDataType::Uint8 | ZclDataType::Enum8 => Some(1),
            ZclDataType::Uint16 => Some(2),
            ZclDataType::Uint24 => Some(3),
            ZclDataType::Bitmap32 | ZclDataType::Uint32 | ZclDataType::Int32 => Some(4),
            ZclDataType::Uint48 => Some(6),
            ZclDataType::CharString => None,
        }
    }

    pub fn tag(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for ZclDataType {
    type Error = P1Error;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Ok(match tag {
            0x18 => ZclDataType::Bitmap8,
            0x1B => ZclDataType::Bitmap32,
            0x20 => ZclDataType::Uint8,
            0x21 => ZclDataType::Uint16,
            0x22 => ZclDataType::Uint24,
            0x23 => ZclDataType::Uint32,
            0x25 => ZclDataType::Uint48,
            0x2B => ZclDataType::Int32,
            0x30 => ZclDataType::Enum8,
            0x42 => ZclDataType::CharString,
            other => {
                return Err(P1Error::InvalidValue(format!(
                    "unknown ZCL type tag 0x{other:02X}"
                )))
            }
        })
    }
}

/// Identifies an attribute: endpoint, cluster and attribute id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeKey {
    pub endpoint: u8,
    pub cluster: u16,
    pub attribute: u16,
}

impl AttributeKey {
    pub const fn new(endpoint: u8, cluster: u16, attribute: u16) -> Self {
        AttributeKey {
            endpoint,
            cluster,
            attribute,
        }
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ep{}/0x{:04X}/0x{:04X}",
            self.endpoint, self.cluster, self.attribute
        )
    }
}

/// A reportable attribute with its wire metadata and current value.
///
/// Key and type never change after construction; only the value does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDescriptor {
    key: AttributeKey,
    data_type: ZclDataType,
    value: Option<Vec<u8>>,
}

impl AttributeDescriptor {
    /// Creates a descriptor whose value is not yet known.
    pub fn unset(key: AttributeKey, data_type: ZclDataType) -> Self {
        AttributeDescriptor {
            key,
            data_type,
            value: None,
        }
    }

    /// Creates a descriptor holding an unsigned integer of the type's width.
    pub fn with_uint(key: AttributeKey, data_type: ZclDataType, value: u64) -> Result<Self, P1Error> {
        let width = data_type.width().ok_or_else(|| {
            P1Error::InvalidValue(format!("{key} has no fixed width for an integer"))
        })?;
        let mut descriptor = Self::unset(key, data_type);
        descriptor.set_value(uint_le_bytes(value, width).ok_or_else(|| {
            P1Error::InvalidValue(format!("{value} does not fit {key}"))
        })?)?;
        Ok(descriptor)
    }

    /// Creates a character string attribute.
    pub fn with_string(key: AttributeKey, value: &str) -> Self {
        AttributeDescriptor {
            key,
            data_type: ZclDataType::CharString,
            value: Some(value.as_bytes().to_vec()),
        }
    }

    pub fn key(&self) -> AttributeKey {
        self.key
    }

    pub fn data_type(&self) -> ZclDataType {
        self.data_type
    }

    pub fn value(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// Reads a fixed-width value back as an unsigned integer.
    pub fn as_uint(&self) -> Option<u64> {
        self.data_type.width()?;
        self.value.as_deref().map(uint_from_le)
    }

    /// Replaces the value, returning `true` if it differs from the stored one.
    pub fn set_value(&mut self, value: Vec<u8>) -> Result<bool, P1Error> {
        if let Some(width) = self.data_type.width() {
            if value.len() != width {
                return Err(P1Error::InvalidValue(format!(
                    "{} expects {} bytes, got {}",
                    self.key,
                    width,
                    value.len()
                )));
            }
        } else if value.len() > u8::MAX as usize {
            return Err(P1Error::InvalidValue(format!(
                "{} string too long ({} bytes)",
                self.key,
                value.len()
            )));
        }

        let changed = self.value.as_deref() != Some(value.as_slice());
        self.value = Some(value);
        Ok(changed)
    }

    /// Writes the type tag followed by the value bytes.
    ///
    /// Returns `false` without writing anything when the value is unset.
    pub fn encode_typed_value<B: BufMut>(&self, buf: &mut B) -> bool {
        let Some(value) = self.value.as_deref() else {
            return false;
        };
        buf.put_u8(self.data_type.tag());
        if self.data_type.width().is_none() {
            buf.put_u8(value.len() as u8);
        }
        buf.put_slice(value);
        true
    }
}

/// Encodes `value` as `width` little-endian bytes, `None` if it does not fit.
pub fn uint_le_bytes(value: u64, width: usize) -> Option<Vec<u8>> {
    if width < 8 && value >> (width * 8) != 0 {
        return None;
    }
    Some(value.to_le_bytes()[..width.min(8)].to_vec())
}

/// Decodes up to 8 little-endian bytes as an unsigned integer.
pub fn uint_from_le(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .take(8)
        .rev()
        .fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: AttributeKey = AttributeKey::new(1, 0x0702, 0x0100);

    #[test]
    fn test_uint_le_bytes() {
        assert_eq!(uint_le_bytes(4426, 6).unwrap(), vec![0x4A, 0x11, 0, 0, 0, 0]);
        assert_eq!(uint_le_bytes(0xFFFF, 2).unwrap(), vec![0xFF, 0xFF]);
        assert!(uint_le_bytes(0x1_0000, 2).is_none());
        assert_eq!(uint_from_le(&[0x4A, 0x11, 0, 0, 0, 0]), 4426);
    }

    #[test]
    fn test_set_value_reports_change() {
        let mut attr = AttributeDescriptor::unset(KEY, ZclDataType::Uint48);
        assert!(attr.set_value(vec![1, 0, 0, 0, 0, 0]).unwrap());
        assert!(!attr.set_value(vec![1, 0, 0, 0, 0, 0]).unwrap());
        assert!(attr.set_value(vec![2, 0, 0, 0, 0, 0]).unwrap());
        assert_eq!(attr.as_uint(), Some(2));
    }

    #[test]
    fn test_set_value_rejects_wrong_width() {
        let mut attr = AttributeDescriptor::unset(KEY, ZclDataType::Uint48);
        assert!(matches!(
            attr.set_value(vec![1, 0]),
            Err(P1Error::InvalidValue(_))
        ));
        assert!(!attr.is_set());
    }

    #[test]
    fn test_encode_typed_value() {
        let attr = AttributeDescriptor::with_uint(KEY, ZclDataType::Uint24, 1000).unwrap();
        let mut buf = Vec::new();
        assert!(attr.encode_typed_value(&mut buf));
        assert_eq!(buf, vec![0x22, 0xE8, 0x03, 0x00]);

        let name = AttributeDescriptor::with_string(AttributeKey::new(1, 0, 4), "consp");
        let mut buf = Vec::new();
        assert!(name.encode_typed_value(&mut buf));
        assert_eq!(buf, vec![0x42, 5, b'c', b'o', b'n', b's', b'p']);

        let unset = AttributeDescriptor::unset(KEY, ZclDataType::Uint48);
        let mut buf = Vec::new();
        assert!(!unset.encode_typed_value(&mut buf));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_type_tag_roundtrip() {
        assert_eq!(ZclDataType::try_from(0x25).unwrap(), ZclDataType::Uint48);
        assert!(ZclDataType::try_from(0xFF).is_err());
    }
}
