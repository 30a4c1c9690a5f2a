use rand::{prelude::random, rngs::StdRng, Rng, SeedableRng};

use crate::{ErrorKind, Packetize};

use super::*;

#[test]
fn test_var_u32_boundaries() {
    let refs: Vec<(u32, usize)> = vec![
        (0, 1),
        (1, 1),
        (126, 1),
        (127, 1),
        (128, 2),
        (16_383, 2),
        (16_384, 3),
        (2_097_151, 3),
        (2_097_152, 4),
        (268_435_455, 4),
    ];

    for (val, size) in refs.into_iter() {
        let blob = VarU32(val).encode().unwrap();
        assert_eq!(blob.as_ref().len(), size, "val:{}", val);
        assert_eq!(VarU32(val).size(), size, "val:{}", val);

        let (out, n) = VarU32::decode(blob.as_ref()).unwrap();
        assert_eq!(n, size);
        assert_eq!(*out, val);
    }

    assert_eq!(VarU32(0).encode().unwrap().as_ref(), &[0x00]);
    assert_eq!(VarU32(127).encode().unwrap().as_ref(), &[0x7f]);
    assert_eq!(VarU32(128).encode().unwrap().as_ref(), &[0x80, 0x01]);
    assert_eq!(VarU32(268_435_455).encode().unwrap().as_ref(), &[0xff, 0xff, 0xff, 0x7f]);

    let err = VarU32(268_435_456).encode().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProtocolError);
}

#[test]
fn test_var_u32_decode_malformed() {
    // continuation bit still set on the 4th byte.
    let err = VarU32::decode(&[0xff_u8, 0xff, 0xff, 0xff, 0x01]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedPacket);

    let err = VarU32::decode(&[0x80_u8, 0x80]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientBytes);

    let err = VarU32::decode(&[0_u8; 0]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientBytes);

    // trailing bytes are left alone.
    let (val, n) = VarU32::decode(&[0x05_u8, 0xff]).unwrap();
    assert_eq!((*val, n), (5, 1));
}

#[test]
fn test_var_u32_random() {
    let seed = random();
    println!("test_var_u32_random seed:{}", seed);
    let mut rng = StdRng::seed_from_u64(seed);

    for _i in 0..100_000 {
        let val = rng.gen::<u32>() % (*VarU32::MAX + 1);
        let blob = VarU32(val).encode().unwrap();
        let (out, n) = VarU32::decode(blob.as_ref()).unwrap();
        assert_eq!((*out, n), (val, VarU32(val).size()));
    }
}

#[test]
fn test_utf8_string() {
    let refs: Vec<(&str, Vec<u8>)> = vec![
        ("", vec![0x00, 0x00]),
        ("T", vec![0x00, 0x01, 0x54]),
        ("abc", vec![0x00, 0x03, 0x61, 0x62, 0x63]),
        // 2 code points, 6 bytes.
        ("é\u{1F600}", vec![0x00, 0x06, 0xc3, 0xa9, 0xf0, 0x9f, 0x98, 0x80]),
    ];

    for (s, bytes) in refs.into_iter() {
        let blob = s.to_string().encode().unwrap();
        assert_eq!(blob.as_ref(), bytes.as_slice(), "{:?}", s);
        assert_eq!(usize::from(utf8_length(blob.as_ref()).unwrap()), s.len());

        let (out, n) = String::decode(blob.as_ref()).unwrap();
        assert_eq!(out, s);
        assert_eq!(n, bytes.len());
    }

    let long = "x".repeat(300);
    let blob = long.encode().unwrap();
    assert_eq!(utf8_length(blob.as_ref()).unwrap(), 300);
    assert_eq!(String::decode(blob.as_ref()).unwrap().0, long);

    let too_long = "x".repeat(65536);
    assert_eq!(too_long.encode().unwrap_err().kind(), ErrorKind::ProtocolError);
}

#[test]
fn test_utf8_string_malformed() {
    let err = String::decode(&[0x00_u8, 0x05, 0x61]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientBytes);

    let err = String::decode(&[0x00_u8, 0x02, 0xc3, 0x28]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedPacket);

    let err = utf8_length(&[0x00]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientBytes);
}

#[test]
fn test_mqtt_protocol() {
    use MqttProtocol::*;

    assert_eq!(V31.protocol_name(), "MQIsdp");
    assert_eq!(V311.protocol_name(), "MQTT");
    assert_eq!(V5.protocol_name(), "MQTT");

    for proto in [V31, V311, V5].into_iter() {
        assert_eq!(MqttProtocol::try_from(u8::from(proto)).unwrap(), proto);
    }
    let err = MqttProtocol::try_from(6).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedProtocolVersion);
    assert!(V31 < V311 && V311 < V5);
}
