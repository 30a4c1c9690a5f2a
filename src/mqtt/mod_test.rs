use arbitrary::Unstructured;
use rand::{prelude::random, rngs::StdRng, Rng, SeedableRng};

use super::*;

#[test]
fn test_packet_type() {
    for val in 1..=15_u8 {
        let pkt_type = PacketType::try_from(val).unwrap();
        assert_eq!(u8::from(pkt_type), val);
    }
    assert_eq!(PacketType::try_from(0).unwrap_err().kind(), ErrorKind::MalformedPacket);
    assert_eq!(PacketType::try_from(16).unwrap_err().kind(), ErrorKind::MalformedPacket);
    assert_eq!(PacketType::UnsubAck.to_string(), "UNSUBACK");
}

#[test]
fn test_fixed_header() {
    let fh = FixedHeader::new(PacketType::Subscribe, VarU32(10)).unwrap();
    assert_eq!(fh.byte1, 0x82);
    assert_eq!(fh.len(), 2);
    assert_eq!(fh.frame_len().unwrap(), 12);

    let fh = FixedHeader::new(PacketType::PubRel, VarU32(200)).unwrap();
    assert_eq!(fh.byte1, 0x62);
    assert_eq!(fh.encode().unwrap().as_ref(), &[0x62, 0xC8, 0x01]);
    assert_eq!(fh.len(), 3);

    let fh = FixedHeader::new_publish(true, 2, true, VarU32(0)).unwrap();
    assert_eq!(fh.byte1, 0x3D);
    assert_eq!(fh.fields().unwrap(), (PacketType::Publish, true, 2, true));

    let err = FixedHeader::new(PacketType::Publish, VarU32(*VarU32::MAX + 1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProtocolError);

    let (fh, n) = FixedHeader::decode(&[0xB0_u8, 0x04, 0x00]).unwrap();
    assert_eq!(n, 2);
    assert_eq!(fh.packet_type().unwrap(), PacketType::UnsubAck);
    let err = fh.frame(&[0xB0_u8, 0x04, 0x00]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientBytes);
    assert_eq!(err.code(), ReasonCode::MalformedPacket);

    // remaining-length 5 spelled in two bytes.
    let err = FixedHeader::decode(&[0x30_u8, 0x85, 0x00]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedPacket);
    assert_eq!(err.code(), ReasonCode::MalformedPacket);
}

#[test]
fn test_fixed_header_validate() {
    use MqttProtocol::*;

    let refs: Vec<(u8, MqttProtocol, bool)> = vec![
        (0x10, V311, true),
        (0x11, V311, false),
        (0x11, V31, true),
        (0x30, V311, true),
        (0x3B, V311, true),
        (0x36, V311, false),
        (0x36, V31, false),
        (0x62, V311, true),
        (0x60, V311, false),
        (0x60, V31, true),
        (0x82, V5, true),
        (0x80, V5, false),
        (0xA2, V311, true),
        (0xA0, V311, false),
        (0xB0, V5, true),
        (0xB2, V5, false),
        (0xE0, V5, true),
        (0xF0, V5, true),
        (0xF8, V5, false),
    ];

    for (byte1, proto, ok) in refs.into_iter() {
        let fh = FixedHeader { byte1, remaining_len: VarU32(0) };
        assert_eq!(fh.validate(proto).is_ok(), ok, "byte1:0x{:x} {}", byte1, proto);
    }
}

#[test]
fn test_properties() {
    let mut props = Properties::new();
    props.push(Property::UserProp(("a".to_string(), "1".to_string())));
    props.push(Property::SessionExpiryInterval(5));
    props.push(Property::UserProp(("b".to_string(), "2".to_string())));
    props.push(Property::ReasonString("ok".to_string()));

    // 7 + 5 + 7 + 5
    assert_eq!(props.len(), 24);
    assert_eq!(props.size(), 25);

    let blob = props.encode().unwrap();
    assert_eq!(blob.as_ref().len(), 25);
    assert_eq!(&blob.as_ref()[..7], &[24, 0x26, 0, 1, b'a', 0, 1]);

    let (out, n) = Properties::decode(blob.as_ref()).unwrap();
    assert_eq!(n, 25);
    assert_eq!(out, props);
    assert_eq!(out.session_expiry_interval(), Some(5));
    assert_eq!(out.reason_string(), Some("ok"));
    let users: Vec<&UserProperty> = out.user_properties();
    assert_eq!(users.len(), 2);
    assert_eq!(users[1].0, "b");

    assert_eq!(Properties::default().encode().unwrap().as_ref(), &[0x00]);
    let props = Properties::with_session_expiry(30);
    assert_eq!(props.encode().unwrap().as_ref(), &[0x05, 0x11, 0, 0, 0, 30]);

    // property-len beyond the stream.
    let err = Properties::decode(&[0x05_u8, 0x11, 0x00]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientBytes);
    // unknown property identifier.
    let err = Properties::decode(&[0x02_u8, 0x05, 0x00]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedPacket);
}

#[test]
fn test_properties_arbitrary() {
    let seed: u64 = random();
    println!("test_properties_arbitrary seed:{}", seed);
    let mut rng = StdRng::seed_from_u64(seed);

    for _ in 0..1000 {
        let bytes: Vec<u8> = (0..256).map(|_| rng.gen()).collect();
        let mut uns = Unstructured::new(&bytes);
        let props: Properties = uns.arbitrary().unwrap();

        let blob = props.encode().unwrap();
        assert_eq!(blob.as_ref().len(), props.size());
        let (out, n) = Properties::decode(blob.as_ref()).unwrap();
        assert_eq!(n, props.size());
        assert_eq!(out, props);
    }
}

#[test]
fn test_connect_flags() {
    let mut pkt = Connect::new(MqttProtocol::V311, "abc", true, 60);
    pkt.set_will("w/t", b"bye", 1, true);
    pkt.set_username(Some("user"));
    pkt.set_password(Some(b"pass"));

    let flags = pkt.flags;
    assert_eq!(flags.0, 0b_1110_1110);
    assert!(flags.is_clean_start());
    assert!(flags.is_will());
    assert_eq!(flags.will_qos(), 1);
    assert!(flags.is_will_retain());
    assert!(flags.is_username());
    assert!(flags.is_password());

    let blob = pkt.encode(MqttProtocol::V311).unwrap();
    let (out, n) = Connect::decode(blob.as_ref(), MqttProtocol::V311).unwrap();
    assert_eq!(n, blob.as_ref().len());
    assert_eq!(out, pkt);
    assert_eq!(out.payload.will_topic.as_deref(), Some("w/t"));
    assert_eq!(out.payload.password, Some(b"pass".to_vec()));

    pkt.set_username(None);
    assert!(!pkt.flags.is_username());
    assert_eq!(pkt.payload.username, None);
}

#[test]
fn test_pub_ack() {
    use MqttProtocol::*;

    let pkt = Pub::new_pub_ack(5);
    assert_eq!(pkt.encode(V311).unwrap().as_ref(), &[0x40, 0x02, 0x00, 0x05]);
    assert_eq!(pkt.reason_code(), 0);

    let pkt = Pub::new_pub_rel(5);
    assert_eq!(pkt.encode(V311).unwrap().as_ref(), &[0x62, 0x02, 0x00, 0x05]);

    let pkt = Pub::new_pub_ack(5).with_code(ReasonCode::NoMatchingSubscribers);
    let blob = pkt.encode(V5).unwrap();
    assert_eq!(blob.as_ref(), &[0x40, 0x04, 0x00, 0x05, 0x10, 0x00]);
    assert_eq!(Pub::decode(blob.as_ref(), V5).unwrap(), (pkt, 6));

    // reason code without property block.
    let (pkt, n) = Pub::decode(&[0x50_u8, 0x03, 0x00, 0x05, 0x92], V5).unwrap();
    assert_eq!(n, 5);
    assert_eq!(pkt.packet_type, PacketType::PubRec);
    assert_eq!(pkt.code, Some(0x92));
    assert_eq!(pkt.properties, None);

    let (pkt, _) = Pub::decode(&[0x70_u8, 0x02, 0x00, 0x05], V5).unwrap();
    assert_eq!(pkt.packet_type, PacketType::PubComp);
    assert_eq!(pkt.reason_code(), 0);
}

#[test]
fn test_ack_encode_version() {
    use MqttProtocol::*;

    let pkt = Pub::new_pub_ack(5).with_code(ReasonCode::Success);
    assert_eq!(pkt.encode(V5).unwrap().as_ref(), &[0x40, 0x04, 0x00, 0x05, 0x00, 0x00]);
    for proto in [V31, V311] {
        let err = pkt.encode(proto).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProtocolError);
    }

    let mut pkt = Pub::new_pub_rec(5);
    pkt.properties = Some(Properties::default());
    assert_eq!(pkt.encode(V311).unwrap_err().kind(), ErrorKind::ProtocolError);

    let pkt = ConnAck::new(V5, false, 0);
    assert_eq!(pkt.encode(V5).unwrap().as_ref(), &[0x20, 0x03, 0x00, 0x00, 0x00]);
    assert_eq!(pkt.encode(V311).unwrap_err().kind(), ErrorKind::ProtocolError);

    let pkt = ConnAck::new(V311, true, 0);
    assert_eq!(pkt.encode(V311).unwrap().as_ref(), &[0x20, 0x02, 0x01, 0x00]);
}

#[test]
fn test_disconnect() {
    use MqttProtocol::*;

    let pkt = Disconnect::new();
    assert_eq!(pkt.encode(V31).unwrap().as_ref(), &[0xE0, 0x00]);
    assert_eq!(pkt.encode(V5).unwrap().as_ref(), &[0xE0, 0x00]);

    let pkt = Disconnect::with_reason(ReasonCode::ServerShutdown, Some("bye"));
    let blob = pkt.encode(V5).unwrap();
    assert_eq!(
        blob.as_ref(),
        &[0xE0, 0x08, 0x8B, 0x06, 0x1F, 0x00, 0x03, b'b', b'y', b'e']
    );
    let (out, n) = Disconnect::decode(blob.as_ref(), V5).unwrap();
    assert_eq!(n, 10);
    assert_eq!(out.reason_code(), 0x8B);
    assert_eq!(out.properties.as_ref().and_then(|p| p.reason_string()), Some("bye"));

    assert_eq!(pkt.encode(V311).unwrap_err().kind(), ErrorKind::ProtocolError);
    let err = Disconnect::decode(&[0xE0_u8, 0x01, 0x00], V311).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedPacket);
}

#[test]
fn test_auth() {
    let pkt = Auth::new(ReasonCode::ContinueAuthentication, Properties::default());
    let blob = pkt.encode(MqttProtocol::V5).unwrap();
    assert_eq!(blob.as_ref(), &[0xF0, 0x02, 0x18, 0x00]);
    assert_eq!(Auth::decode(blob.as_ref(), MqttProtocol::V5).unwrap(), (pkt.clone(), 4));

    let err = pkt.encode(MqttProtocol::V311).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProtocolError);
}

#[test]
fn test_packet_id() {
    let mut pkt = Packet::Subscribe(Subscribe::new(
        1,
        vec![SubscriptionEntry::new("a/#", QoS::ExactlyOnce)],
    ));
    assert_eq!(pkt.packet_id(), Some(1));
    pkt.set_packet_id(99).unwrap();
    assert_eq!(pkt.packet_id(), Some(99));

    assert_eq!(Packet::PingResp.packet_id(), None);
    let mut pkt = Packet::Disconnect(Disconnect::new());
    assert_eq!(pkt.set_packet_id(1).unwrap_err().kind(), ErrorKind::ProtocolError);
}

#[test]
fn test_subscribe_options() {
    // MQTT-5 subscription options ride in the upper bits of the QoS byte.
    let entry = SubscriptionEntry { topic_filter: "a".to_string(), qos: 0b_0010_1101 };
    assert_eq!(entry.requested_qos(), 1);

    let sub = Subscribe::new(3, vec![entry, SubscriptionEntry::new("b", QoS::ExactlyOnce)]);
    let suback = SubAck::from_subscribe(&sub);
    assert_eq!(suback.packet_id, 3);
    assert_eq!(suback.return_codes, vec![1, 2]);

    let blob = sub.encode(MqttProtocol::V5).unwrap();
    assert_eq!(
        blob.as_ref(),
        &[0x82, 0x0B, 0x00, 0x03, 0x00, 0x00, 0x01, b'a', 0x2D, 0x00, 0x01, b'b', 0x02]
    );
}
