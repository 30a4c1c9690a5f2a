use std::{fmt, result};

use crate::mqtt::{field_len, FixedHeader, PacketType, Properties, QoS};
use crate::{Blob, Framing, MqttProtocol, Packetize, VarU32};
use crate::{Error, ErrorKind, ReasonCode, Result};

const PP: &'static str = "Packet::Subscribe";

/// Single subscription in SUBSCRIBE, topic-filter and requested QoS.
///
/// In MQTT-5 the `qos` byte also carries subscription options in its upper bits,
/// no-local, retain-as-published and retain-handling.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SubscriptionEntry {
    pub topic_filter: String,
    pub qos: u8,
}

impl SubscriptionEntry {
    pub fn new(topic_filter: &str, qos: QoS) -> SubscriptionEntry {
        SubscriptionEntry { topic_filter: topic_filter.to_string(), qos: u8::from(qos) }
    }

    /// Requested QoS, sans the MQTT-5 subscription options.
    pub fn requested_qos(&self) -> u8 {
        self.qos & 0b11
    }
}

/// Ordered list of subscriptions, correlated 1:1 with the codes in SUBACK.
pub type SubList = Vec<SubscriptionEntry>;

/// SUBSCRIBE Packet
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Subscribe {
    pub packet_id: u16,
    /// MQTT-5 only.
    pub properties: Properties,
    pub filters: SubList,
}

impl fmt::Display for Subscribe {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        let filters: Vec<String> = self
            .filters
            .iter()
            .map(|e| format!("{:?}@{}", e.topic_filter, e.qos))
            .collect();
        write!(f, "SUBSCRIBE packet_id:{} [{}]", self.packet_id, filters.join(", "))?;
        if !self.properties.is_empty() {
            write!(f, " properties:{}", self.properties)?;
        }
        Ok(())
    }
}

impl Framing for Subscribe {
    fn decode<T: AsRef<[u8]>>(stream: T, proto: MqttProtocol) -> Result<(Self, usize)> {
        let stream: &[u8] = stream.as_ref();

        let (fh, n) = dec_field!(FixedHeader, stream, 0);
        fh.validate(proto)?;
        let stream = fh.frame(stream)?;

        let (packet_id, n) = dec_field!(u16, stream, n);
        let (properties, mut n) = dec_field!(Properties, stream, n; proto.is_v5());

        let mut filters = vec![];
        while n < stream.len() {
            let (topic_filter, m) = dec_field!(String, stream, n);
            let (qos, m) = dec_field!(u8, stream, m);
            filters.push(SubscriptionEntry { topic_filter, qos });
            n = m;
        }

        if filters.len() == 0 {
            err!(ProtocolError, code: ProtocolError, "{} empty subscription", PP)?;
        }

        fh.consumed(n, PP)?;

        let properties = properties.unwrap_or_default();
        Ok((Subscribe { packet_id, properties, filters }, n))
    }

    fn encode(&self, proto: MqttProtocol) -> Result<Blob> {
        let mut remlen = 2;
        if proto.is_v5() {
            remlen += self.properties.size();
        }
        for entry in self.filters.iter() {
            remlen += field_len(entry.topic_filter.as_bytes()) + 1;
        }
        let fh = FixedHeader::new(PacketType::Subscribe, VarU32(remlen.try_into()?))?;

        let mut data = fh.to_frame()?;
        data.extend_from_slice(self.packet_id.encode()?.as_ref());
        if proto.is_v5() {
            data.extend_from_slice(self.properties.encode()?.as_ref());
        }
        for entry in self.filters.iter() {
            data.extend_from_slice(entry.topic_filter.encode()?.as_ref());
            data.extend_from_slice(entry.qos.encode()?.as_ref());
        }

        Ok(Blob::Large { data })
    }
}

impl Subscribe {
    pub fn new(packet_id: u16, filters: SubList) -> Subscribe {
        Subscribe { packet_id, properties: Properties::default(), filters }
    }
}
