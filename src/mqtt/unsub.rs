use std::{fmt, result};

use crate::mqtt::{field_len, FixedHeader, PacketType, Properties};
use crate::{Blob, Framing, MqttProtocol, Packetize, VarU32};
use crate::{Error, ErrorKind, ReasonCode, Result};

const PP: &'static str = "Packet::UnSubscribe";

/// Ordered list of topic filters, correlated 1:1 with MQTT-5 UNSUBACK codes.
pub type TopicList = Vec<String>;

/// UNSUBSCRIBE Packet
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UnSubscribe {
    pub packet_id: u16,
    /// MQTT-5 only.
    pub properties: Properties,
    pub topics: TopicList,
}

impl fmt::Display for UnSubscribe {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        write!(f, "UNSUBSCRIBE packet_id:{} {:?}", self.packet_id, self.topics)?;
        if !self.properties.is_empty() {
            write!(f, " properties:{}", self.properties)?;
        }
        Ok(())
    }
}

impl Framing for UnSubscribe {
    fn decode<T: AsRef<[u8]>>(stream: T, proto: MqttProtocol) -> Result<(Self, usize)> {
        let stream: &[u8] = stream.as_ref();

        let (fh, n) = dec_field!(FixedHeader, stream, 0);
        fh.validate(proto)?;
        let stream = fh.frame(stream)?;

        let (packet_id, n) = dec_field!(u16, stream, n);
        let (properties, mut n) = dec_field!(Properties, stream, n; proto.is_v5());

        let mut topics = vec![];
        while n < stream.len() {
            let (topic, m) = dec_field!(String, stream, n);
            topics.push(topic);
            n = m;
        }

        if topics.len() == 0 {
            err!(ProtocolError, code: ProtocolError, "{} empty topic list", PP)?;
        }

        fh.consumed(n, PP)?;

        let properties = properties.unwrap_or_default();
        Ok((UnSubscribe { packet_id, properties, topics }, n))
    }

    fn encode(&self, proto: MqttProtocol) -> Result<Blob> {
        let mut remlen = 2;
        if proto.is_v5() {
            remlen += self.properties.size();
        }
        for topic in self.topics.iter() {
            remlen += field_len(topic.as_bytes());
        }
        let fh = FixedHeader::new(PacketType::UnSubscribe, VarU32(remlen.try_into()?))?;

        let mut data = fh.to_frame()?;
        data.extend_from_slice(self.packet_id.encode()?.as_ref());
        if proto.is_v5() {
            data.extend_from_slice(self.properties.encode()?.as_ref());
        }
        for topic in self.topics.iter() {
            data.extend_from_slice(topic.encode()?.as_ref());
        }

        Ok(Blob::Large { data })
    }
}

impl UnSubscribe {
    pub fn new(packet_id: u16, topics: TopicList) -> UnSubscribe {
        UnSubscribe { packet_id, properties: Properties::default(), topics }
    }
}
