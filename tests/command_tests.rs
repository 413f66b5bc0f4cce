//! Request engine tests: ZDO descriptor/bind handling and ZCL attribute reads.

mod telegram_support;

use bytes::Bytes;
use p1_zigbee_rs::zigbee::command::PeerIdentity;
use p1_zigbee_rs::{
    meter_attribute_store, meter_endpoints, parse_telegram, AttributeStore, CommandEngine,
    Destination, DeviceInfo, FirstRunState, InboundFrame, OutboundFrame, P1Error, PublishPolicy,
};
use telegram_support::sample;

const COORDINATOR: u64 = 0x00124B0026B696A0;

fn zdo(cluster: u16, payload: &[u8]) -> InboundFrame {
    InboundFrame {
        sender: COORDINATOR,
        sender_nwk: 0x0000,
        source_endpoint: 0,
        destination_endpoint: 0,
        cluster,
        profile: 0x0000,
        payload: Bytes::copy_from_slice(payload),
    }
}

fn zcl(endpoint: u8, cluster: u16, payload: &[u8]) -> InboundFrame {
    InboundFrame {
        sender: COORDINATOR,
        sender_nwk: 0x0000,
        source_endpoint: 8,
        destination_endpoint: endpoint,
        cluster,
        profile: 0x0104,
        payload: Bytes::copy_from_slice(payload),
    }
}

fn parsed_store() -> AttributeStore {
    let mut store = meter_attribute_store(&DeviceInfo::default()).unwrap();
    let policy = PublishPolicy {
        always_publish: true,
        first_run: true,
    };
    parse_telegram(&sample(), &mut store, policy).unwrap();
    store
}

fn answer(engine: &mut CommandEngine, frame: &InboundFrame, store: &AttributeStore) -> OutboundFrame {
    engine
        .handle(frame, store)
        .unwrap()
        .expect("request should be answered")
}

#[test]
fn test_read_basic_manufacturer_and_model() {
    let store = parsed_store();
    let mut engine = CommandEngine::new(meter_endpoints());
    let reply = answer(
        &mut engine,
        &zcl(1, 0x0000, &[0x00, 0x2A, 0x00, 0x04, 0x00, 0x05, 0x00]),
        &store,
    );

    let mut expected = vec![0x10, 0x2A, 0x01, 0x04, 0x00, 0x00, 0x42, 5];
    expected.extend_from_slice(b"consp");
    expected.extend_from_slice(&[0x05, 0x00, 0x00, 0x42, 15]);
    expected.extend_from_slice(b"Zigbee P1 Meter");
    assert_eq!(&reply.payload[..], &expected[..]);

    assert_eq!(reply.destination, Destination::Extended(COORDINATOR));
    assert_eq!(reply.source_endpoint, 1);
    assert_eq!(reply.destination_endpoint, 8);
    assert_eq!(reply.cluster, 0x0000);
    assert_eq!(reply.profile, 0x0104);
}

#[test]
fn test_read_measured_value() {
    let store = parsed_store();
    let mut engine = CommandEngine::new(meter_endpoints());
    let reply = answer(&mut engine, &zcl(1, 0x0B04, &[0x00, 0x03, 0x00, 0x05, 0x05]), &store);
    assert_eq!(
        &reply.payload[..],
        &[0x10, 0x03, 0x01, 0x05, 0x05, 0x00, 0x21, 0xFC, 0x08]
    );
}

#[test]
fn test_read_unknown_attribute() {
    let store = parsed_store();
    let mut engine = CommandEngine::new(meter_endpoints());
    let reply = answer(
        &mut engine,
        &zcl(1, 0x0702, &[0x00, 0x04, 0x00, 0x77, 0x77, 0x02, 0x03]),
        &store,
    );
    assert_eq!(
        &reply.payload[..],
        &[0x10, 0x04, 0x01, 0x77, 0x77, 0x86, 0x02, 0x03, 0x00, 0x22, 0xE8, 0x03, 0x00]
    );
}

#[test]
fn test_read_unset_attribute_is_unsupported() {
    let store = meter_attribute_store(&DeviceInfo::default()).unwrap();
    let mut engine = CommandEngine::new(meter_endpoints());
    let reply = answer(&mut engine, &zcl(1, 0x0702, &[0x00, 0x05, 0x00, 0x00, 0x01]), &store);
    assert_eq!(&reply.payload[..], &[0x10, 0x05, 0x01, 0x00, 0x01, 0x86]);
}

#[test]
fn test_read_is_scoped_to_endpoint() {
    let store = parsed_store();
    let mut engine = CommandEngine::new(meter_endpoints());
    // The Basic cluster only lives on the electricity endpoint
    let reply = answer(&mut engine, &zcl(2, 0x0000, &[0x00, 0x06, 0x00, 0x04, 0x00]), &store);
    assert_eq!(&reply.payload[..], &[0x10, 0x06, 0x01, 0x04, 0x00, 0x86]);

    let gas = answer(&mut engine, &zcl(2, 0x0702, &[0x00, 0x07, 0x00, 0x00, 0x00]), &store);
    assert_eq!(
        &gas.payload[..],
        &[0x10, 0x07, 0x01, 0x00, 0x00, 0x00, 0x25, 0x6B, 0x00, 0x00, 0x00, 0x00, 0x00]
    );
    assert_eq!(gas.source_endpoint, 2);
}

#[test]
fn test_manufacturer_specific_read() {
    let store = parsed_store();
    let mut engine = CommandEngine::new(meter_endpoints());
    let reply = answer(
        &mut engine,
        &zcl(1, 0x0000, &[0x04, 0x34, 0x12, 0x09, 0x00, 0x07, 0x00]),
        &store,
    );
    assert_eq!(&reply.payload[..], &[0x10, 0x09, 0x01, 0x07, 0x00, 0x00, 0x30, 0x04]);
}

#[test]
fn test_simple_descriptor() {
    let store = parsed_store();
    let mut engine = CommandEngine::new(meter_endpoints());
    let reply = answer(&mut engine, &zdo(0x0004, &[0x11, 0x00, 0x00, 0x01]), &store);

    assert_eq!(
        &reply.payload[..],
        &[
            0x11, 0x00, 0x00, 0x00, 14, // tsn, status, nwk, length
            0x01, 0x04, 0x01, 0x07, 0x00, 0x00, // ep, profile, device, version
            0x03, 0x00, 0x00, 0x02, 0x07, 0x04, 0x0B, // input clusters
            0x00, // no output clusters
        ]
    );
    assert_eq!(reply.cluster, 0x8004);
    assert_eq!(reply.profile, 0x0000);
    assert_eq!(reply.source_endpoint, 0);
    assert_eq!(reply.destination_endpoint, 0);
    assert_eq!(reply.destination, Destination::Extended(COORDINATOR));
}

#[test]
fn test_simple_descriptor_gas_endpoint() {
    let store = parsed_store();
    let mut engine = CommandEngine::new(meter_endpoints());
    let reply = answer(&mut engine, &zdo(0x0004, &[0x12, 0x00, 0x00, 0x02]), &store);
    assert_eq!(reply.payload[4], 10);
    assert_eq!(&reply.payload[5..], &[0x02, 0x04, 0x01, 0x07, 0x00, 0x00, 0x01, 0x02, 0x07, 0x00]);
}

#[test]
fn test_simple_descriptor_invalid_endpoint() {
    let store = parsed_store();
    let mut engine = CommandEngine::new(meter_endpoints());
    let reply = answer(&mut engine, &zdo(0x0004, &[0x13, 0x00, 0x00, 0x05]), &store);
    assert_eq!(&reply.payload[..], &[0x13, 0x82, 0x00, 0x00, 0x00]);
}

#[test]
fn test_active_endpoints() {
    let store = parsed_store();
    let mut engine = CommandEngine::new(meter_endpoints());
    let reply = answer(&mut engine, &zdo(0x0005, &[0x22, 0x34, 0x12]), &store);
    assert_eq!(&reply.payload[..], &[0x22, 0x00, 0x34, 0x12, 2, 1, 2]);
    assert_eq!(reply.cluster, 0x8005);
}

#[test]
fn test_bind_and_unbind_acknowledged() {
    let store = parsed_store();
    let mut engine = CommandEngine::new(meter_endpoints());

    let mut bind = vec![0x31];
    bind.extend_from_slice(&0x0011_2233_4455_6677u64.to_le_bytes());
    bind.push(1);
    bind.extend_from_slice(&[0x02, 0x07, 0x03]);
    bind.extend_from_slice(&COORDINATOR.to_le_bytes());
    bind.push(1);

    let reply = answer(&mut engine, &zdo(0x0021, &bind), &store);
    assert_eq!(&reply.payload[..], &[0x31, 0x00]);
    assert_eq!(reply.cluster, 0x8021);

    let reply = answer(&mut engine, &zdo(0x0022, &[0x32]), &store);
    assert_eq!(&reply.payload[..], &[0x32, 0x00]);
    assert_eq!(reply.cluster, 0x8022);
}

#[test]
fn test_ieee_address_response_sets_peer() {
    let store = parsed_store();
    let mut engine = CommandEngine::new(meter_endpoints());
    assert_eq!(engine.peer(), None);

    let payload = [
        0x84, 0x00, 0xA0, 0x96, 0xB6, 0x26, 0x00, 0x4B, 0x12, 0x00, 0x00, 0x00,
    ];
    assert!(engine.handle(&zdo(0x8001, &payload), &store).unwrap().is_none());
    assert_eq!(
        engine.peer(),
        Some(PeerIdentity {
            ieee: COORDINATOR,
            nwk: 0x0000
        })
    );
}

#[test]
fn test_node_descriptor_response_ignored() {
    let store = parsed_store();
    let mut engine = CommandEngine::new(meter_endpoints());
    assert!(engine.handle(&zdo(0x8002, &[0x01, 0x00]), &store).unwrap().is_none());
    assert_eq!(engine.state(), FirstRunState::AwaitingFirstAck);
}

#[test]
fn test_default_response_ends_first_run() {
    let store = parsed_store();
    let mut engine = CommandEngine::new(meter_endpoints());
    assert!(engine.is_first_run());

    let ack = zcl(1, 0x0702, &[0x18, 0x00, 0x0B, 0x0A, 0x00]);
    assert!(engine.handle(&ack, &store).unwrap().is_none());
    assert_eq!(engine.state(), FirstRunState::Steady);

    // Further acknowledgements keep the steady state
    assert!(engine.handle(&ack, &store).unwrap().is_none());
    assert!(!engine.is_first_run());
}

#[test]
fn test_malformed_requests_rejected() {
    let store = parsed_store();
    let mut engine = CommandEngine::new(meter_endpoints());

    let cases = [
        zcl(1, 0x0702, &[0x00, 0x01]),
        zcl(1, 0x0702, &[0x00, 0x01, 0x02]),
        zcl(1, 0x0702, &[0x04, 0x34]),
        zdo(0x0004, &[0x11, 0x00, 0x00]),
        zdo(0x0005, &[0x22]),
        zdo(0x0021, &[]),
        zdo(0x8001, &[0x84, 0x00, 0xA0]),
        zdo(0x0013, &[0x01, 0x02, 0x03]),
        InboundFrame {
            profile: 0xC05E,
            ..zcl(1, 0x0000, &[0x00, 0x01, 0x00, 0x04, 0x00])
        },
    ];
    for frame in cases {
        let result = engine.handle(&frame, &store);
        assert!(
            matches!(result, Err(P1Error::MalformedRequest(_))),
            "cluster 0x{:04X} payload {:02X?}: {result:?}",
            frame.cluster,
            &frame.payload[..]
        );
    }
    assert_eq!(engine.peer(), None);
    assert_eq!(engine.state(), FirstRunState::AwaitingFirstAck);
}

#[test]
fn test_cluster_specific_commands_not_served() {
    let store = parsed_store();
    let mut engine = CommandEngine::new(meter_endpoints());

    // Metering GetProfile shares id 0x00 with read attributes
    let get_profile = zcl(1, 0x0702, &[0x01, 0x10, 0x00, 0x00, 0x00]);
    assert!(matches!(
        engine.handle(&get_profile, &store),
        Err(P1Error::MalformedRequest(_))
    ));

    // A cluster command with id 0x0B is not a default response
    let cluster_0b = zcl(1, 0x0702, &[0x19, 0x11, 0x0B, 0x0A, 0x00]);
    assert!(engine.handle(&cluster_0b, &store).is_err());
    assert_eq!(engine.state(), FirstRunState::AwaitingFirstAck);

    // Reserved frame types are rejected as well
    let reserved = zcl(1, 0x0000, &[0x02, 0x12, 0x00, 0x04, 0x00]);
    assert!(engine.handle(&reserved, &store).is_err());
}

#[test]
fn test_read_with_odd_id_list_rejected() {
    let store = parsed_store();
    let mut engine = CommandEngine::new(meter_endpoints());
    let result = engine.handle(&zcl(1, 0x0000, &[0x00, 0x13, 0x00, 0x04, 0x00, 0x05]), &store);
    assert!(matches!(result, Err(P1Error::MalformedRequest(_))));

    // An empty list is answered with an empty response
    let reply = answer(&mut engine, &zcl(1, 0x0000, &[0x00, 0x14, 0x00]), &store);
    assert_eq!(&reply.payload[..], &[0x10, 0x14, 0x01]);
}
