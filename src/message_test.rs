use arbitrary::Unstructured;
use rand::{prelude::random, rngs::StdRng, Rng, SeedableRng};

use super::*;
use crate::mqtt::{ConnAck, Connect, Publish, QoS, SubAck, UnSubscribe, UnsubAck};
use crate::{fuzzy, ReasonCode, VarU32};

#[test]
fn test_message_connect_v311() {
    let pkt = Connect::new(MqttProtocol::V311, "abc", true, 60);
    let msg = Message::build(MqttProtocol::V311, Packet::Connect(pkt)).unwrap();

    let refv = vec![
        0x10, 0x0F, 0x00, 0x04, b'M', b'Q', b'T', b'T', 0x04, 0x02, 0x00, 0x3C, 0x00,
        0x03, b'a', b'b', b'c',
    ];
    assert_eq!(msg.as_bytes(), refv.as_slice());

    let (out, n) = Message::parse(&refv, MqttProtocol::V311).unwrap();
    assert_eq!(n, refv.len());
    assert_eq!(out, msg);
}

#[test]
fn test_message_connect_v31() {
    let pkt = Connect::new(MqttProtocol::V31, "abc", true, 60);
    let msg = Message::build(MqttProtocol::V31, Packet::Connect(pkt)).unwrap();

    let refv = vec![
        0x10, 0x11, 0x00, 0x06, b'M', b'Q', b'I', b's', b'd', b'p', 0x03, 0x02, 0x00,
        0x3C, 0x00, 0x03, b'a', b'b', b'c',
    ];
    assert_eq!(msg.as_bytes(), refv.as_slice());
}

#[test]
fn test_message_connect_v5() {
    // empty property block is a single zero byte.
    let pkt = Connect::new(MqttProtocol::V5, "abc", true, 60);
    let msg = Message::build(MqttProtocol::V5, Packet::Connect(pkt)).unwrap();
    let refv = vec![
        0x10, 0x10, 0x00, 0x04, b'M', b'Q', b'T', b'T', 0x05, 0x02, 0x00, 0x3C, 0x00,
        0x00, 0x03, b'a', b'b', b'c',
    ];
    assert_eq!(msg.as_bytes(), refv.as_slice());

    let mut pkt = Connect::new(MqttProtocol::V5, "abc", true, 60);
    pkt.set_session_expiry(30);
    let msg = Message::build(MqttProtocol::V5, Packet::Connect(pkt)).unwrap();
    let refv = vec![
        0x10, 0x15, 0x00, 0x04, b'M', b'Q', b'T', b'T', 0x05, 0x02, 0x00, 0x3C, 0x05,
        0x11, 0x00, 0x00, 0x00, 0x1E, 0x00, 0x03, b'a', b'b', b'c',
    ];
    assert_eq!(msg.as_bytes(), refv.as_slice());

    match Message::parse(&refv, MqttProtocol::V5).unwrap().0.packet() {
        Packet::Connect(pkt) => {
            assert_eq!(pkt.properties.session_expiry_interval(), Some(30));
            assert_eq!(pkt.client_id(), "abc");
        }
        pkt => panic!("unexpected {}", pkt),
    }
}

#[test]
fn test_message_connect_flagged() {
    let mut pkt = Connect::new(MqttProtocol::V311, "abc", false, 0);
    pkt.set_username(Some("user"));
    pkt.payload.username = None;
    let err = Message::build(MqttProtocol::V311, Packet::Connect(pkt)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProtocolError);
}

#[test]
fn test_message_publish() {
    let pkt = Publish::new("T", b"hi", QoS::AtMostOnce, None);
    let msg = Message::build(MqttProtocol::V311, Packet::Publish(pkt)).unwrap();
    assert_eq!(msg.as_bytes(), &[0x30, 0x05, 0x00, 0x01, 0x54, 0x68, 0x69]);
    assert_eq!(msg.packet_type(), PacketType::Publish);
    assert_eq!(msg.header_byte(), 0x30);

    let s = msg.render();
    assert!(s.contains("PUBLISH"), "{}", s);
    assert!(s.contains("30 05 00 01 54 68 69"), "{}", s);

    // without a packet identifier QoS-1 cannot be serialized.
    let pkt = Publish::new("T", b"hi", QoS::AtLeastOnce, None);
    let err = Message::build(MqttProtocol::V311, Packet::Publish(pkt)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProtocolError);
}

#[test]
fn test_message_unsuback_v5() {
    let unsub = UnSubscribe::new(7, vec!["nothing/here".to_string()]);
    let code = ReasonCode::NoSubscriptionExisted;

    let pkt = UnsubAck::from_unsubscribe(&unsub, MqttProtocol::V5, code);
    let msg = Message::build(MqttProtocol::V5, Packet::UnsubAck(pkt)).unwrap();
    assert_eq!(msg.as_bytes(), &[0xB0, 0x04, 0x00, 0x07, 0x00, 0x11]);

    let pkt = UnsubAck::from_unsubscribe(&unsub, MqttProtocol::V311, code);
    let msg = Message::build(MqttProtocol::V311, Packet::UnsubAck(pkt)).unwrap();
    assert_eq!(msg.as_bytes(), &[0xB0, 0x02, 0x00, 0x07]);
}

#[test]
fn test_message_suback_order() {
    let refv = vec![0x90_u8, 0x05, 0x00, 0x0A, 0x00, 0x01, 0x80];
    let (msg, n) = Message::parse(&refv, MqttProtocol::V311).unwrap();
    assert_eq!(n, refv.len());
    match msg.packet() {
        Packet::SubAck(pkt) => {
            assert_eq!(pkt.packet_id, 10);
            assert_eq!(pkt.return_codes, vec![0x00, 0x01, 0x80]);
            assert_eq!(pkt.is_failure(2).unwrap(), true);
            assert_eq!(pkt.is_failure(0).unwrap(), false);
        }
        pkt => panic!("unexpected {}", pkt),
    }

    // v5, with an empty property block.
    let pkt = SubAck::new(10, vec![0x02, 0x87, 0x00]);
    let msg = Message::build(MqttProtocol::V5, Packet::SubAck(pkt)).unwrap();
    assert_eq!(msg.as_bytes(), &[0x90, 0x06, 0x00, 0x0A, 0x00, 0x02, 0x87, 0x00]);
}

#[test]
fn test_message_connack() {
    let pkt = ConnAck::new(MqttProtocol::V311, true, 0);
    let msg = Message::build(MqttProtocol::V311, Packet::ConnAck(pkt)).unwrap();
    assert_eq!(msg.as_bytes(), &[0x20, 0x02, 0x01, 0x00]);

    // session-present is reserved in 3.1.
    let pkt = ConnAck::new(MqttProtocol::V31, true, 5);
    let msg = Message::build(MqttProtocol::V31, Packet::ConnAck(pkt)).unwrap();
    assert_eq!(msg.as_bytes(), &[0x20, 0x02, 0x00, 0x05]);

    let pkt = ConnAck::new(MqttProtocol::V5, false, 0x87);
    let msg = Message::build(MqttProtocol::V5, Packet::ConnAck(pkt)).unwrap();
    assert_eq!(msg.as_bytes(), &[0x20, 0x03, 0x00, 0x87, 0x00]);

    // v5 CONNACK without a property block still parses.
    let (msg, _) = Message::parse(&[0x20_u8, 0x02, 0x00, 0x00], MqttProtocol::V5).unwrap();
    match msg.packet() {
        Packet::ConnAck(pkt) => {
            assert!(pkt.is_success());
            assert_eq!(pkt.properties, None);
            assert_eq!(pkt.return_code(MqttProtocol::V5), "Success");
        }
        pkt => panic!("unexpected {}", pkt),
    }
}

#[test]
fn test_message_trailing_bytes() {
    let mut stream = vec![0x30_u8, 0x05, 0x00, 0x01, 0x54, 0x68, 0x69];
    stream.extend_from_slice(&[0xC0, 0x00]);

    let (msg, n) = Message::parse(&stream, MqttProtocol::V311).unwrap();
    assert_eq!(n, 7);
    assert_eq!(msg.as_bytes(), &stream[..7]);

    let (msg, n) = Message::parse(&stream[7..], MqttProtocol::V311).unwrap();
    assert_eq!(n, 2);
    assert_eq!(msg.packet(), &Packet::PingReq);
}

#[test]
fn test_message_remaining_len_not_minimal() {
    // PUBLISH "T" "hi" with remaining-length 5 spelled as 0x85 0x00.
    let stream = [0x30_u8, 0x85, 0x00, 0x00, 0x01, b'T', b'h', b'i'];
    for proto in [MqttProtocol::V311, MqttProtocol::V5] {
        let err = Message::parse(&stream, proto).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedPacket);
        assert_eq!(err.code(), ReasonCode::MalformedPacket);
    }
}

#[test]
fn test_message_malformed() {
    use MqttProtocol::*;

    let refs: Vec<(MqttProtocol, Vec<u8>, ErrorKind)> = vec![
        // body shorter than remaining-length.
        (V311, vec![0x30, 0x05, 0x00, 0x01, 0x54], ErrorKind::InsufficientBytes),
        // body longer than a pre-v5 PUBACK.
        (V311, vec![0x40, 0x03, 0x00, 0x01, 0x00], ErrorKind::MalformedPacket),
        (V311, vec![0x20, 0x03, 0x00, 0x00, 0x00], ErrorKind::MalformedPacket),
        // QoS 3.
        (V311, vec![0x36, 0x05, 0x00, 0x01, 0x54, 0x00, 0x01], ErrorKind::MalformedPacket),
        (V31, vec![0x36, 0x05, 0x00, 0x01, 0x54, 0x00, 0x01], ErrorKind::MalformedPacket),
        // reserved flags.
        (V311, vec![0x80, 0x06, 0x00, 0x01, 0x00, 0x01, 0x61, 0x00], ErrorKind::MalformedPacket),
        (V5, vec![0xC1, 0x00], ErrorKind::MalformedPacket),
        // continuation bit set on the 4th length byte.
        (V311, vec![0x30, 0xFF, 0xFF, 0xFF, 0xFF, 0x01], ErrorKind::MalformedPacket),
        // packet-type 0.
        (V311, vec![0x00, 0x00], ErrorKind::MalformedPacket),
        // AUTH before v5.
        (V311, vec![0xF0, 0x00], ErrorKind::MalformedPacket),
        // invalid utf8 in topic.
        (V311, vec![0x30, 0x04, 0x00, 0x02, 0xC3, 0x28], ErrorKind::MalformedPacket),
        // SUBSCRIBE with no filters.
        (V311, vec![0x82, 0x02, 0x00, 0x01], ErrorKind::ProtocolError),
        // PINGRESP with a body.
        (V311, vec![0xD0, 0x01, 0x00], ErrorKind::MalformedPacket),
    ];

    for (proto, stream, kind) in refs.into_iter() {
        match Message::parse(&stream, proto) {
            Ok((msg, _)) => panic!("{:?} parsed as {}", stream, msg),
            Err(err) => assert_eq!(err.kind(), kind, "{:?} {}", stream, err),
        }
    }

    // MQTT-3.1 does not police flags on non-PUBLISH packets.
    let stream = vec![0x80_u8, 0x06, 0x00, 0x01, 0x00, 0x01, 0x61, 0x00];
    let (msg, _) = Message::parse(&stream, MqttProtocol::V31).unwrap();
    assert_eq!(msg.packet_type(), PacketType::Subscribe);
}

#[test]
fn test_message_setters() {
    let pkt = Publish::new("T", b"hi", QoS::AtLeastOnce, Some(1));
    let mut msg = Message::build(MqttProtocol::V311, Packet::Publish(pkt)).unwrap();
    assert_eq!(msg.as_bytes(), &[0x32, 0x07, 0x00, 0x01, 0x54, 0x00, 0x01, 0x68, 0x69]);

    msg.set_packet_id(0x1234).unwrap();
    assert_eq!(msg.packet().packet_id(), Some(0x1234));
    assert_eq!(&msg.as_bytes()[5..7], &[0x12, 0x34]);

    msg.set_dup(true).unwrap();
    assert_eq!(msg.header_byte(), 0x3A);
    msg.set_retain(true).unwrap();
    assert_eq!(msg.header_byte(), 0x3B);
    msg.set_dup(false).unwrap();
    assert_eq!(msg.header_byte(), 0x33);

    let mut msg = Message::build(MqttProtocol::V311, Packet::PingReq).unwrap();
    assert_eq!(msg.as_bytes(), &[0xC0, 0x00]);
    assert_eq!(msg.set_retain(true).unwrap_err().kind(), ErrorKind::ProtocolError);
    assert_eq!(msg.set_packet_id(1).unwrap_err().kind(), ErrorKind::ProtocolError);

    // QoS-0 PUBLISH has no packet identifier to replace.
    let pkt = Publish::new("T", b"hi", QoS::AtMostOnce, None);
    let mut msg = Message::build(MqttProtocol::V311, Packet::Publish(pkt)).unwrap();
    assert_eq!(msg.set_packet_id(1).unwrap_err().kind(), ErrorKind::ProtocolError);
}

#[test]
fn test_message_round_trip() {
    let seed: u64 = random();
    println!("test_message_round_trip seed:{}", seed);
    let mut rng = StdRng::seed_from_u64(seed);

    for proto in [MqttProtocol::V31, MqttProtocol::V311, MqttProtocol::V5] {
        for _ in 0..1000 {
            let bytes: Vec<u8> = (0..1024).map(|_| rng.gen()).collect();
            let mut uns = Unstructured::new(&bytes);
            let pkt = fuzzy::packet(&mut uns, proto).unwrap();

            let msg = Message::build(proto, pkt.clone()).unwrap();
            let data = msg.as_bytes();

            let fh = msg.fixed_header().unwrap();
            assert_eq!(data.len(), fh.len() + (*fh.remaining_len as usize));
            assert_eq!(fh.len(), 1 + VarU32(*fh.remaining_len).size());

            let (out, n) = Message::parse(data, proto).unwrap();
            assert_eq!(n, data.len(), "{}", msg.render());
            assert_eq!(out.as_bytes(), data, "{}", msg.render());
            assert_eq!(out.packet_type(), pkt.to_packet_type());

            let again = Message::build(proto, out.into_packet()).unwrap();
            assert_eq!(again.as_bytes(), data, "{}", msg.render());
        }
    }
}
