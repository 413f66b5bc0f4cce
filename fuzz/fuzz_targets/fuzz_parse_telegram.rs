#![no_main]

use libfuzzer_sys::fuzz_target;
use p1_zigbee_rs::{checksum, meter_attribute_store, parse_telegram, DeviceInfo, PublishPolicy};

const POLICY: PublishPolicy = PublishPolicy {
    always_publish: false,
    first_run: true,
};

fuzz_target!(|data: &[u8]| {
    let Ok(mut store) = meter_attribute_store(&DeviceInfo::default()) else {
        return;
    };

    // Raw input almost always fails the checksum
    let _ = parse_telegram(data, &mut store, POLICY);

    // Frame the input with a correct checksum so the line parser is reached
    let mut telegram = Vec::with_capacity(data.len() + 6);
    telegram.push(b'/');
    telegram.extend(data.iter().filter(|&&b| b != b'!'));
    telegram.push(b'!');
    let crc = checksum(&telegram);
    telegram.extend_from_slice(format!("{crc:04X}").as_bytes());

    let parsed = parse_telegram(&telegram, &mut store, POLICY);
    assert!(parsed.is_ok(), "framed telegram rejected: {parsed:?}");
});
