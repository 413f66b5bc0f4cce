#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use p1_zigbee_rs::{
    meter_attribute_store, meter_endpoints, CommandEngine, DeviceInfo, InboundFrame,
};

fuzz_target!(|data: &[u8]| {
    // profile selector, cluster (2), destination endpoint, then the payload
    if data.len() < 4 {
        return;
    }
    let Ok(store) = meter_attribute_store(&DeviceInfo::default()) else {
        return;
    };
    let mut engine = CommandEngine::new(meter_endpoints());

    let frame = InboundFrame {
        sender: 0x00124B0026B696A0,
        sender_nwk: 0,
        source_endpoint: 1,
        destination_endpoint: data[3],
        cluster: u16::from_le_bytes([data[1], data[2]]),
        profile: if data[0] & 1 == 0 { 0x0000 } else { 0x0104 },
        payload: Bytes::copy_from_slice(&data[4..]),
    };

    if let Ok(Some(reply)) = engine.handle(&frame, &store) {
        assert!(!reply.payload.is_empty());
    }
});
