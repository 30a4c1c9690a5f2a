use std::{fmt, result};

use crate::mqtt::{field_len, FixedHeader, Properties, QoS};
use crate::{Blob, Framing, MqttProtocol, Packetize, VarU32};
use crate::{Error, ErrorKind, Result};

const PP: &'static str = "Packet::Publish";

/// PUBLISH Packet
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Publish {
    pub retain: bool,
    pub qos: u8,
    pub dup: bool,
    pub topic_name: String,
    /// Present only when `qos` > 0.
    pub packet_id: Option<u16>,
    /// MQTT-5 only.
    pub properties: Properties,
    pub payload: Vec<u8>,
}

impl fmt::Display for Publish {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        write!(
            f,
            "PUBLISH topic:{:?} qos:{} retain:{} dup:{}",
            self.topic_name, self.qos, self.retain, self.dup
        )?;
        if let Some(packet_id) = self.packet_id {
            write!(f, " packet_id:{}", packet_id)?;
        }
        if !self.properties.is_empty() {
            write!(f, " properties:{}", self.properties)?;
        }
        match std::str::from_utf8(&self.payload) {
            Ok(s) => write!(f, " payload:{:?}", s),
            Err(_) => write!(f, " payload:{} bytes", self.payload.len()),
        }
    }
}

impl Framing for Publish {
    fn decode<T: AsRef<[u8]>>(stream: T, proto: MqttProtocol) -> Result<(Self, usize)> {
        let stream: &[u8] = stream.as_ref();

        let (fh, n) = dec_field!(FixedHeader, stream, 0);
        fh.validate(proto)?;
        let stream = fh.frame(stream)?;
        let (_, retain, qos, dup) = fh.fields()?;

        let (topic_name, n) = dec_field!(String, stream, n);
        let (packet_id, n) = dec_field!(u16, stream, n; qos > 0);
        let (properties, n) = dec_field!(Properties, stream, n; proto.is_v5());
        let payload = stream[n..].to_vec();
        let n = stream.len();

        let pkt = Publish {
            retain,
            qos,
            dup,
            topic_name,
            packet_id,
            properties: properties.unwrap_or_default(),
            payload,
        };

        Ok((pkt, n))
    }

    fn encode(&self, proto: MqttProtocol) -> Result<Blob> {
        let packet_id = match (self.qos, self.packet_id) {
            (0, _) => None,
            (_, Some(packet_id)) => Some(packet_id),
            (qos, None) => err!(ProtocolError, desc: "{} qos:{} without packet_id", PP, qos)?,
        };

        let mut remlen = field_len(self.topic_name.as_bytes()) + self.payload.len();
        if packet_id.is_some() {
            remlen += 2;
        }
        if proto.is_v5() {
            remlen += self.properties.size();
        }

        let remlen = VarU32(remlen.try_into()?);
        let fh = FixedHeader::new_publish(self.retain, self.qos, self.dup, remlen)?;
        fh.validate(proto)?;

        let mut data = fh.to_frame()?;
        data.extend_from_slice(self.topic_name.encode()?.as_ref());
        if let Some(packet_id) = packet_id {
            data.extend_from_slice(packet_id.encode()?.as_ref());
        }
        if proto.is_v5() {
            data.extend_from_slice(self.properties.encode()?.as_ref());
        }
        data.extend_from_slice(&self.payload);

        Ok(Blob::Large { data })
    }
}

impl Publish {
    pub fn new(topic: &str, payload: &[u8], qos: QoS, packet_id: Option<u16>) -> Publish {
        Publish {
            retain: false,
            qos: u8::from(qos),
            dup: false,
            topic_name: topic.to_string(),
            packet_id,
            properties: Properties::default(),
            payload: payload.to_vec(),
        }
    }

    pub fn to_qos(&self) -> Result<QoS> {
        QoS::try_from(self.qos)
    }
}
