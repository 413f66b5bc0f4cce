//! Shared telegram fixtures for the integration tests.
#![allow(dead_code)]

use p1_zigbee_rs::checksum;

/// DSMR 5 example telegram (three phases, one gas meter).
pub const SAMPLE_TELEGRAM: &str = concat!(
    "/ISk5\\2MT382-1000\r\n",
    "\r\n",
    "1-3:0.2.8(50)\r\n",
    "0-0:1.0.0(170102192002W)\r\n",
    "0-0:96.1.1(4B384547303034303436333935353037)\r\n",
    "1-0:1.8.1(000004.426*kWh)\r\n",
    "1-0:1.8.2(000002.399*kWh)\r\n",
    "1-0:2.8.1(000002.444*kWh)\r\n",
    "1-0:2.8.2(000000.000*kWh)\r\n",
    "0-0:96.14.0(0002)\r\n",
    "1-0:1.7.0(00.244*kW)\r\n",
    "1-0:2.7.0(00.000*kW)\r\n",
    "0-0:96.7.21(00013)\r\n",
    "0-0:96.7.9(00000)\r\n",
    "1-0:99.97.0(0)(0-0:96.7.19)\r\n",
    "1-0:32.32.0(00000)\r\n",
    "1-0:52.32.0(00000)\r\n",
    "1-0:72.32.0(00000)\r\n",
    "1-0:32.36.0(00000)\r\n",
    "1-0:52.36.0(00000)\r\n",
    "1-0:72.36.0(00000)\r\n",
    "0-0:96.13.0()\r\n",
    "1-0:32.7.0(0230.0*V)\r\n",
    "1-0:52.7.0(0230.0*V)\r\n",
    "1-0:72.7.0(0229.0*V)\r\n",
    "1-0:31.7.0(0.48*A)\r\n",
    "1-0:51.7.0(0.44*A)\r\n",
    "1-0:71.7.0(0.86*A)\r\n",
    "1-0:21.7.0(00.070*kW)\r\n",
    "1-0:41.7.0(00.032*kW)\r\n",
    "1-0:61.7.0(00.142*kW)\r\n",
    "1-0:22.7.0(00.000*kW)\r\n",
    "1-0:42.7.0(00.000*kW)\r\n",
    "1-0:62.7.0(00.000*kW)\r\n",
    "0-1:24.1.0(003)\r\n",
    "0-1:96.1.0(3232323241424344313233343536373839)\r\n",
    "0-1:24.2.1(170102161005W)(00000.107*m3)\r\n",
    "0-2:24.1.0(003)\r\n",
    "0-2:96.1.0()\r\n",
    "!6EEE",
);

pub fn sample() -> Vec<u8> {
    SAMPLE_TELEGRAM.as_bytes().to_vec()
}

/// Appends the checksum to a telegram running from `/` through `!`.
pub fn with_checksum(framed: &str) -> Vec<u8> {
    assert!(framed.starts_with('/') && framed.ends_with('!'));
    let mut telegram = framed.as_bytes().to_vec();
    telegram.extend_from_slice(format!("{:04X}", checksum(framed.as_bytes())).as_bytes());
    telegram
}

/// The sample telegram without its checksum digits.
pub fn sample_framed() -> &'static str {
    &SAMPLE_TELEGRAM[..SAMPLE_TELEGRAM.len() - 4]
}

/// The sample telegram with one line replaced and a fresh checksum.
pub fn sample_with(line: &str, replacement: &str) -> Vec<u8> {
    let framed = sample_framed();
    assert!(framed.contains(line), "sample has no line {line}");
    with_checksum(&framed.replacen(line, replacement, 1))
}

/// A minimal single phase telegram.
pub fn single_phase(t1: &str, power: &str) -> Vec<u8> {
    with_checksum(&format!(
        "/XMX5LGBBFG10\r\n\r\n1-3:0.2.8(42)\r\n1-0:1.8.1({t1}*kWh)\r\n1-0:1.8.2(000010.000*kWh)\r\n1-0:32.7.0(231.0*V)\r\n1-0:31.7.0(001*A)\r\n1-0:21.7.0({power}*kW)\r\n!"
    ))
}
