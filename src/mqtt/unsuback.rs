use std::{fmt, result};

use crate::mqtt::{FixedHeader, PacketType, Properties, UnSubscribe};
use crate::{Blob, Framing, MqttProtocol, Packetize, ReasonCode, Result, VarU32};

/// UNSUBACK Packet
///
/// Before MQTT-5 it is just the packet-id. MQTT-5 adds a property block and a
/// reason code per topic in UNSUBSCRIBE, in request order.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UnsubAck {
    pub packet_id: u16,
    /// MQTT-5 only.
    pub properties: Properties,
    /// MQTT-5 only.
    pub return_codes: Vec<u8>,
}

impl fmt::Display for UnsubAck {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        write!(f, "UNSUBACK packet_id:{}", self.packet_id)?;
        if !self.return_codes.is_empty() {
            let codes: Vec<String> =
                self.return_codes.iter().map(|c| format!("0x{:02x}", c)).collect();
            write!(f, " codes:[{}]", codes.join(", "))?;
        }
        if !self.properties.is_empty() {
            write!(f, " properties:{}", self.properties)?;
        }
        Ok(())
    }
}

impl Framing for UnsubAck {
    fn decode<T: AsRef<[u8]>>(stream: T, proto: MqttProtocol) -> Result<(Self, usize)> {
        let stream: &[u8] = stream.as_ref();

        let (fh, n) = dec_field!(FixedHeader, stream, 0);
        fh.validate(proto)?;
        let stream = fh.frame(stream)?;

        let (packet_id, n) = dec_field!(u16, stream, n);
        let (properties, n) = dec_field!(Properties, stream, n; proto.is_v5());
        let return_codes = match proto {
            MqttProtocol::V5 => stream[n..].to_vec(),
            _ => vec![],
        };
        let n = n + return_codes.len();

        fh.consumed(n, "Packet::UnsubAck")?;

        let properties = properties.unwrap_or_default();
        Ok((UnsubAck { packet_id, properties, return_codes }, n))
    }

    fn encode(&self, proto: MqttProtocol) -> Result<Blob> {
        let remlen = match proto {
            MqttProtocol::V5 => 2 + self.properties.size() + self.return_codes.len(),
            _ => 2,
        };
        let fh = FixedHeader::new(PacketType::UnsubAck, VarU32(remlen.try_into()?))?;

        let mut data = fh.to_frame()?;
        data.extend_from_slice(self.packet_id.encode()?.as_ref());
        if proto.is_v5() {
            data.extend_from_slice(self.properties.encode()?.as_ref());
            data.extend_from_slice(&self.return_codes);
        }

        Ok(Blob::Large { data })
    }
}

impl UnsubAck {
    pub fn new(packet_id: u16, return_codes: Vec<u8>) -> UnsubAck {
        UnsubAck { packet_id, properties: Properties::default(), return_codes }
    }

    /// UNSUBACK a broker would send for `unsub`, every topic answered with
    /// `code`. Codes are dropped for versions before MQTT-5.
    pub fn from_unsubscribe(
        unsub: &UnSubscribe,
        proto: MqttProtocol,
        code: ReasonCode,
    ) -> UnsubAck {
        let codes = match proto {
            MqttProtocol::V5 => vec![code as u8; unsub.topics.len()],
            _ => vec![],
        };
        UnsubAck::new(unsub.packet_id, codes)
    }
}
