use rand::{prelude::random, rngs::StdRng, seq::SliceRandom, SeedableRng};

use super::*;
use crate::mqtt::{ConnAck, Pub, QoS, SubAck};

fn publish(proto: MqttProtocol, topic: &str, qos: QoS, packet_id: Option<u16>) -> Message {
    let pkt = Publish::new(topic, b"hi", qos, packet_id);
    Message::build(proto, Packet::Publish(pkt)).unwrap()
}

fn parse(proto: MqttProtocol, bytes: &[u8]) -> Message {
    let (msg, n) = Message::parse(bytes, proto).unwrap();
    assert_eq!(n, bytes.len());
    msg
}

#[derive(Default)]
struct Acks(Vec<(u8, Option<u16>)>);

impl Acknowledge for Acks {
    fn ack_qos1(&mut self, publish: &Publish) -> Result<()> {
        self.0.push((1, publish.packet_id));
        Ok(())
    }

    fn ack_qos2(&mut self, publish: &Publish) -> Result<()> {
        self.0.push((2, publish.packet_id));
        Ok(())
    }
}

#[test]
fn test_first_difference() {
    assert_eq!(first_difference(&[1, 2, 3], &[1, 2, 3]), None);
    assert_eq!(
        first_difference(&[1, 2, 3], &[1, 2]),
        Some(Difference::Length { got: 3, expected: 2 })
    );
    let diff = first_difference(&[1, 9, 3], &[1, 2, 3]).unwrap();
    assert_eq!(diff, Difference::Byte { offset: 1, got: 9, expected: 2 });
    assert_eq!(diff.to_string(), "byte at offset 1 0x09 expected 0x02");
}

#[test]
fn test_compare_exact() {
    use MqttProtocol::*;

    let exp = publish(V311, "T", QoS::AtMostOnce, None);
    let got = parse(V311, &[0x30, 0x05, 0x00, 0x01, b'T', b'h', b'i']);
    assert_eq!(compare(&got, &exp).unwrap(), Verdict::Exact);

    let got = parse(V311, &[0x30, 0x05, 0x00, 0x01, b'T', b'h', b'o']);
    let err = compare(&got, &exp).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConformanceFailure);
    assert!(err.description().contains("offset 6"), "{}", err);
    assert!(err.description().contains(&exp.render()), "{}", err);
    assert!(err.description().contains(&got.render()), "{}", err);
}

#[test]
fn test_compare_relaxed() {
    use MqttProtocol::*;

    // PUBACK with explicit success code against implicit success.
    let exp = Message::build(V5, Packet::PubAck(Pub::new_pub_ack(5))).unwrap();
    let got = parse(V5, &[0x40, 0x03, 0x00, 0x05, 0x00]);
    assert_eq!(compare(&got, &exp).unwrap(), Verdict::Relaxed);

    let got = parse(V5, &[0x40, 0x03, 0x00, 0x05, 0x10]);
    assert!(compare(&got, &exp).is_err());
    let got = parse(V5, &[0x40, 0x03, 0x00, 0x06, 0x00]);
    assert!(compare(&got, &exp).is_err());

    // CONNACK without property block.
    let exp = Message::build(V5, Packet::ConnAck(ConnAck::new(V5, false, 0))).unwrap();
    let got = parse(V5, &[0x20, 0x02, 0x00, 0x00]);
    assert_eq!(compare(&got, &exp).unwrap(), Verdict::Relaxed);
    let got = parse(V5, &[0x20, 0x02, 0x01, 0x00]);
    assert!(compare(&got, &exp).is_err());

    // relaxed matching applies only to MQTT-5.
    let exp = Message::build(V311, Packet::SubAck(SubAck::new(1, vec![0, 1]))).unwrap();
    let got = Message::build(V311, Packet::SubAck(SubAck::new(1, vec![0, 2]))).unwrap();
    assert!(compare(&got, &exp).is_err());
}

#[test]
fn test_compare_relaxed_first_code_only() {
    use MqttProtocol::*;

    // SUBACK and UNSUBACK compare only the first return code, second code
    // differs and yet the messages match.
    let exp = Message::build(V5, Packet::SubAck(SubAck::new(1, vec![0, 1]))).unwrap();
    let got = Message::build(V5, Packet::SubAck(SubAck::new(1, vec![0, 2]))).unwrap();
    assert_eq!(exp.as_bytes(), &[0x90, 0x05, 0x00, 0x01, 0x00, 0x00, 0x01]);
    assert_eq!(compare(&got, &exp).unwrap(), Verdict::Relaxed);

    let got = Message::build(V5, Packet::SubAck(SubAck::new(1, vec![0x80, 1]))).unwrap();
    assert!(compare(&got, &exp).is_err());
}

#[test]
fn test_compare_ignore_qos() {
    use MqttProtocol::*;

    let exp = publish(V31, "T", QoS::AtLeastOnce, Some(1));
    let got = publish(V31, "T", QoS::ExactlyOnce, Some(1));
    assert_eq!(exp.header_byte(), 0x32);
    assert_eq!(got.header_byte(), 0x34);

    assert_eq!(compare_with(&got, &exp, true).unwrap(), Verdict::Relaxed);
    assert!(compare_with(&got, &exp, false).is_err());

    // only for MQTT-3.1.
    let exp = publish(V311, "T", QoS::AtLeastOnce, Some(1));
    let got = publish(V311, "T", QoS::ExactlyOnce, Some(1));
    assert!(compare_with(&got, &exp, true).is_err());
}

#[test]
fn test_match_unordered() {
    let seed: u64 = random();
    println!("test_match_unordered seed:{}", seed);
    let mut rng = StdRng::seed_from_u64(seed);

    let proto = MqttProtocol::V311;
    let expected: Vec<Message> = ["A", "B", "C", "D"]
        .iter()
        .map(|t| publish(proto, t, QoS::AtMostOnce, None))
        .collect();

    for _ in 0..10 {
        let mut received = expected.clone();
        received.shuffle(&mut rng);
        let res = match_unordered(expected.clone(), received, None).unwrap();
        assert!(res.is_ok());
        assert_eq!(res.matched.len(), 4);
        for (exp, got) in res.matched.iter() {
            assert_eq!(exp, got);
        }
    }

    // missing C.
    let received = vec![expected[1].clone(), expected[0].clone(), expected[3].clone()];
    let res = match_unordered(expected.clone(), received, None).unwrap();
    assert!(!res.is_ok());
    assert_eq!(res.matched.len(), 3);
    assert_eq!(res.unmatched_expected, vec![expected[2].clone()]);
    assert_eq!(res.unmatched_received.len(), 0);
    let err = res.into_result().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConformanceFailure);
    assert!(err.description().contains("missing"), "{}", err);

    // an extra packet.
    let mut received = expected.clone();
    received.push(publish(proto, "E", QoS::AtMostOnce, None));
    let res = match_unordered(expected.clone(), received, None).unwrap();
    assert_eq!(res.unmatched_expected.len(), 0);
    assert_eq!(res.unmatched_received.len(), 1);
    assert!(res.into_result().is_err());

    // duplicates pair off one to one.
    let expected = vec![expected[0].clone(), expected[0].clone()];
    let received = vec![expected[0].clone()];
    let res = match_unordered(expected, received, None).unwrap();
    assert_eq!(res.matched.len(), 1);
    assert_eq!(res.unmatched_expected.len(), 1);
}

#[test]
fn test_match_unordered_suback_mask() {
    use MqttProtocol::*;

    let exp = parse(V31, &[0x90, 0x03, 0x00, 0x01, 0x00]);
    let got = parse(V31, &[0x92, 0x03, 0x00, 0x01, 0x00]);
    assert_eq!(header_mask(PacketType::SubAck), 0xF9);
    assert_eq!(header_mask(PacketType::Publish), 0xFF);

    let res = match_unordered(vec![exp.clone()], vec![got], None).unwrap();
    assert!(res.is_ok());

    // same mask is not applied to PUBLISH.
    let exp = publish(V31, "T", QoS::AtLeastOnce, Some(1));
    let got = publish(V31, "T", QoS::ExactlyOnce, Some(1));
    let res = match_unordered(vec![exp], vec![got], None).unwrap();
    assert!(!res.is_ok());
}

#[test]
fn test_match_unordered_acknowledge() {
    let proto = MqttProtocol::V5;
    let expected = vec![
        publish(proto, "a", QoS::AtMostOnce, None),
        publish(proto, "b", QoS::AtLeastOnce, Some(10)),
        publish(proto, "c", QoS::ExactlyOnce, Some(11)),
        publish(proto, "d", QoS::ExactlyOnce, Some(12)),
    ];
    // "d" never arrives.
    let received = vec![expected[2].clone(), expected[0].clone(), expected[1].clone()];

    let mut acks = Acks::default();
    let res = match_unordered(expected, received, Some(&mut acks)).unwrap();
    assert_eq!(res.matched.len(), 3);
    assert_eq!(res.unmatched_expected.len(), 1);
    assert_eq!(acks.0, vec![(1, Some(10)), (2, Some(11))]);
}

#[test]
fn test_scorecard() {
    let exp = publish(MqttProtocol::V311, "T", QoS::AtMostOnce, None);
    let bad = publish(MqttProtocol::V311, "U", QoS::AtMostOnce, None);

    let mut card = Scorecard::new("session");
    assert!(card.passed());
    assert!(card.check("publish", &exp, &exp));
    assert!(!card.check("publish-topic", &bad, &exp));
    assert_eq!(card.record("value", Ok(10)), Some(10));
    let res: Result<()> = err!(Timeout, desc: "no reply");
    assert_eq!(card.record("silence", res), None);

    assert!(!card.passed());
    let failures = card.failures();
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].0, "publish-topic");
    assert_eq!(failures[0].1.kind(), ErrorKind::ConformanceFailure);
    assert_eq!(failures[1].1.kind(), ErrorKind::Timeout);

    let summary = card.summary();
    assert!(summary.starts_with("session: 2/4 steps passed"), "{}", summary);
    assert!(summary.contains("silence"), "{}", summary);
}
