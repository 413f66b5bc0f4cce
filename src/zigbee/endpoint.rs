//! Static endpoint descriptors and their ZDO simple descriptor encoding.

use crate::constants::{
    CLUSTER_BASIC, CLUSTER_ELECTRICAL_MEASUREMENT, CLUSTER_METERING, DEVICE_ID_METER,
    ENDPOINT_ELECTRICITY, ENDPOINT_GAS, PROFILE_HOME_AUTOMATION,
};
use bytes::BufMut;

/// Description of one application endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescriptor {
    pub endpoint: u8,
    pub profile: u16,
    pub device_id: u16,
    pub device_version: u8,
    pub input_clusters: Vec<u16>,
    pub output_clusters: Vec<u16>,
}

impl EndpointDescriptor {
    /// Length of the serialized simple descriptor.
    pub fn encoded_len(&self) -> usize {
        8 + 2 * (self.input_clusters.len() + self.output_clusters.len())
    }

    /// Writes the simple descriptor: endpoint, profile, device id, version,
    /// then the counted input and output cluster lists.
    pub fn serialize<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.endpoint);
        buf.put_u16_le(self.profile);
        buf.put_u16_le(self.device_id);
        buf.put_u8(self.device_version << 4);
        buf.put_u8(self.input_clusters.len() as u8);
        for cluster in &self.input_clusters {
            buf.put_u16_le(*cluster);
        }
        buf.put_u8(self.output_clusters.len() as u8);
        for cluster in &self.output_clusters {
            buf.put_u16_le(*cluster);
        }
    }
}

/// The electricity (1) and gas (2) meter endpoints.
pub fn meter_endpoints() -> Vec<EndpointDescriptor> {
    vec![
        EndpointDescriptor {
            endpoint: ENDPOINT_ELECTRICITY,
            profile: PROFILE_HOME_AUTOMATION,
            device_id: DEVICE_ID_METER,
            device_version: 0,
            input_clusters: vec![CLUSTER_BASIC, CLUSTER_METERING, CLUSTER_ELECTRICAL_MEASUREMENT],
            output_clusters: Vec::new(),
        },
        EndpointDescriptor {
            endpoint: ENDPOINT_GAS,
            profile: PROFILE_HOME_AUTOMATION,
            device_id: DEVICE_ID_METER,
            device_version: 0,
            input_clusters: vec![CLUSTER_METERING],
            output_clusters: Vec::new(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_electricity_endpoint() {
        let endpoints = meter_endpoints();
        let mut buf = Vec::new();
        endpoints[0].serialize(&mut buf);
        assert_eq!(
            buf,
            vec![
                0x01, 0x04, 0x01, 0x07, 0x00, 0x00, 0x03, 0x00, 0x00, 0x02, 0x07, 0x04, 0x0B,
                0x00
            ]
        );
        assert_eq!(buf.len(), endpoints[0].encoded_len());
    }

    #[test]
    fn test_version_in_high_nibble() {
        let mut descriptor = meter_endpoints().remove(1);
        descriptor.device_version = 1;
        descriptor.output_clusters.push(0x0019);
        let mut buf = Vec::new();
        descriptor.serialize(&mut buf);
        assert_eq!(buf[5], 0x10);
        assert_eq!(&buf[6..], &[0x01, 0x02, 0x07, 0x01, 0x19, 0x00]);
    }
}
