//! Arbitrary MQTT packets, each one valid for the protocol version it is
//! generated for.

use arbitrary::{Error as ArbitraryError, Unstructured};

use std::result;

use crate::mqtt::{Auth, ConnAck, Connect, Disconnect, Packet, PacketType, Properties};
use crate::mqtt::{Pub, Publish, SubAck, Subscribe, SubscriptionEntry};
use crate::mqtt::{UnSubscribe, UnsubAck};
use crate::{ClientID, MqttProtocol};

const TOPICS: [&'static str; 5] = ["", "a", "a/b/c", "fvt/topic", "\u{e9}t\u{e9}/\u{1F600}"];
const FILTERS: [&'static str; 5] = ["#", "+/b", "a/b/c", "fvt/#", "sport/+/player"];
const NAMES: [&'static str; 3] = ["", "user", "fvt-\u{e9}"];

type Res<T> = result::Result<T, ArbitraryError>;

/// Generate an arbitrary packet for `proto`. AUTH is generated only for MQTT-5.
pub fn packet(uns: &mut Unstructured, proto: MqttProtocol) -> Res<Packet> {
    let pkt = match uns.arbitrary::<PacketType>()? {
        PacketType::Connect => Packet::Connect(connect(uns, proto)?),
        PacketType::ConnAck => Packet::ConnAck(connack(uns, proto)?),
        PacketType::Publish => Packet::Publish(publish(uns, proto)?),
        PacketType::PubAck => Packet::PubAck(pub_ack(uns, proto, PacketType::PubAck)?),
        PacketType::PubRec => Packet::PubRec(pub_ack(uns, proto, PacketType::PubRec)?),
        PacketType::PubRel => Packet::PubRel(pub_ack(uns, proto, PacketType::PubRel)?),
        PacketType::PubComp => Packet::PubComp(pub_ack(uns, proto, PacketType::PubComp)?),
        PacketType::Subscribe => Packet::Subscribe(subscribe(uns, proto)?),
        PacketType::SubAck => Packet::SubAck(suback(uns, proto)?),
        PacketType::UnSubscribe => Packet::UnSubscribe(unsubscribe(uns, proto)?),
        PacketType::UnsubAck => Packet::UnsubAck(unsuback(uns, proto)?),
        PacketType::PingReq => Packet::PingReq,
        PacketType::PingResp => Packet::PingResp,
        PacketType::Disconnect => Packet::Disconnect(disconnect(uns, proto)?),
        PacketType::Auth if proto.is_v5() => Packet::Auth(auth(uns)?),
        PacketType::Auth => Packet::PingReq,
    };

    Ok(pkt)
}

fn properties(uns: &mut Unstructured, proto: MqttProtocol) -> Res<Properties> {
    match proto {
        MqttProtocol::V5 => uns.arbitrary(),
        _ => Ok(Properties::default()),
    }
}

/// Optional property block, always absent before MQTT-5.
fn opt_properties(uns: &mut Unstructured, proto: MqttProtocol) -> Res<Option<Properties>> {
    match proto {
        MqttProtocol::V5 if uns.arbitrary::<bool>()? => Ok(Some(uns.arbitrary()?)),
        _ => Ok(None),
    }
}

fn connect(uns: &mut Unstructured, proto: MqttProtocol) -> Res<Connect> {
    let client_id: ClientID = uns.arbitrary()?;
    let mut pkt = Connect::new(proto, &client_id, uns.arbitrary()?, uns.arbitrary()?);

    pkt.properties = properties(uns, proto)?;
    if uns.arbitrary()? {
        let topic = uns.choose(&TOPICS)?.to_string();
        let payload: Vec<u8> = uns.arbitrary()?;
        let qos = uns.arbitrary::<u8>()? % 3;
        pkt.set_will(&topic, &payload, qos, uns.arbitrary()?);
        pkt.payload.will_properties = properties(uns, proto)?;
    }
    if uns.arbitrary()? {
        pkt.set_username(Some(*uns.choose(&NAMES)?));
    }
    if uns.arbitrary()? {
        let password: Vec<u8> = uns.arbitrary()?;
        pkt.set_password(Some(&password));
    }

    Ok(pkt)
}

fn connack(uns: &mut Unstructured, proto: MqttProtocol) -> Res<ConnAck> {
    let code = match proto {
        MqttProtocol::V5 => uns.arbitrary()?,
        _ => uns.arbitrary::<u8>()? % 6,
    };
    let mut pkt = ConnAck::new(proto, uns.arbitrary()?, code);
    pkt.properties = opt_properties(uns, proto)?;

    Ok(pkt)
}

fn publish(uns: &mut Unstructured, proto: MqttProtocol) -> Res<Publish> {
    let qos = uns.arbitrary::<u8>()? % 3;
    let packet_id = match qos {
        0 => None,
        _ => Some(uns.arbitrary()?),
    };

    let pkt = Publish {
        retain: uns.arbitrary()?,
        qos,
        dup: qos > 0 && uns.arbitrary::<bool>()?,
        topic_name: uns.choose(&TOPICS)?.to_string(),
        packet_id,
        properties: properties(uns, proto)?,
        payload: uns.arbitrary()?,
    };

    Ok(pkt)
}

fn pub_ack(uns: &mut Unstructured, proto: MqttProtocol, ptype: PacketType) -> Res<Pub> {
    let mut pkt = Pub::new(ptype, uns.arbitrary()?);
    if proto.is_v5() && uns.arbitrary::<bool>()? {
        pkt.code = Some(uns.arbitrary()?);
        pkt.properties = opt_properties(uns, proto)?;
    }

    Ok(pkt)
}

fn subscribe(uns: &mut Unstructured, proto: MqttProtocol) -> Res<Subscribe> {
    let n = 1 + (uns.arbitrary::<u8>()? % 4);
    let mut filters = vec![];
    for _ in 0..n {
        let topic_filter = uns.choose(&FILTERS)?.to_string();
        let qos = uns.arbitrary::<u8>()? % 3;
        filters.push(SubscriptionEntry { topic_filter, qos });
    }

    let mut pkt = Subscribe::new(uns.arbitrary()?, filters);
    pkt.properties = properties(uns, proto)?;

    Ok(pkt)
}

fn suback(uns: &mut Unstructured, proto: MqttProtocol) -> Res<SubAck> {
    let n = 1 + (uns.arbitrary::<u8>()? % 4);
    let mut codes = vec![];
    for _ in 0..n {
        codes.push(*uns.choose(&[0x00_u8, 0x01, 0x02, 0x80, 0x87, 0x8F])?);
    }

    let mut pkt = SubAck::new(uns.arbitrary()?, codes);
    pkt.properties = properties(uns, proto)?;

    Ok(pkt)
}

fn unsubscribe(uns: &mut Unstructured, proto: MqttProtocol) -> Res<UnSubscribe> {
    let n = 1 + (uns.arbitrary::<u8>()? % 4);
    let mut topics = vec![];
    for _ in 0..n {
        topics.push(uns.choose(&FILTERS)?.to_string());
    }

    let mut pkt = UnSubscribe::new(uns.arbitrary()?, topics);
    pkt.properties = properties(uns, proto)?;

    Ok(pkt)
}

fn unsuback(uns: &mut Unstructured, proto: MqttProtocol) -> Res<UnsubAck> {
    let codes = match proto {
        MqttProtocol::V5 => {
            let n = 1 + (uns.arbitrary::<u8>()? % 4);
            let mut codes = vec![];
            for _ in 0..n {
                codes.push(*uns.choose(&[0x00_u8, 0x11, 0x80, 0x87, 0x8F, 0x91])?);
            }
            codes
        }
        _ => vec![],
    };

    let mut pkt = UnsubAck::new(uns.arbitrary()?, codes);
    pkt.properties = properties(uns, proto)?;

    Ok(pkt)
}

fn disconnect(uns: &mut Unstructured, proto: MqttProtocol) -> Res<Disconnect> {
    let mut pkt = Disconnect::new();
    if proto.is_v5() && uns.arbitrary::<bool>()? {
        pkt.code = Some(*uns.choose(&[0x00_u8, 0x04, 0x80, 0x81, 0x8E, 0x9C])?);
        pkt.properties = opt_properties(uns, proto)?;
    }

    Ok(pkt)
}

fn auth(uns: &mut Unstructured) -> Res<Auth> {
    let mut pkt = Auth::default();
    if uns.arbitrary::<bool>()? {
        pkt.code = Some(*uns.choose(&[0x00_u8, 0x18, 0x19])?);
        pkt.properties = opt_properties(uns, MqttProtocol::V5)?;
    }

    Ok(pkt)
}
