use std::{fmt, result};

use crate::mqtt::{FixedHeader, PacketType, Properties, Subscribe};
use crate::{Blob, Framing, MqttProtocol, Packetize, VarU32};
use crate::{Error, ErrorKind, Result};

const PP: &'static str = "Packet::SubAck";

/// SUBACK Packet
///
/// One return code per SUBSCRIBE entry, in request order. Granted QoS 0..=2, or
/// failure, 0x80 before MQTT-5 and a reason code >= 0x80 in MQTT-5.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SubAck {
    pub packet_id: u16,
    /// MQTT-5 only.
    pub properties: Properties,
    pub return_codes: Vec<u8>,
}

impl fmt::Display for SubAck {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        let codes: Vec<String> =
            self.return_codes.iter().map(|c| format!("0x{:02x}", c)).collect();
        write!(f, "SUBACK packet_id:{} codes:[{}]", self.packet_id, codes.join(", "))?;
        if !self.properties.is_empty() {
            write!(f, " properties:{}", self.properties)?;
        }
        Ok(())
    }
}

impl Framing for SubAck {
    fn decode<T: AsRef<[u8]>>(stream: T, proto: MqttProtocol) -> Result<(Self, usize)> {
        let stream: &[u8] = stream.as_ref();

        let (fh, n) = dec_field!(FixedHeader, stream, 0);
        fh.validate(proto)?;
        let stream = fh.frame(stream)?;

        let (packet_id, n) = dec_field!(u16, stream, n);
        let (properties, n) = dec_field!(Properties, stream, n; proto.is_v5());
        let return_codes = stream[n..].to_vec();
        let n = stream.len();

        let properties = properties.unwrap_or_default();
        Ok((SubAck { packet_id, properties, return_codes }, n))
    }

    fn encode(&self, proto: MqttProtocol) -> Result<Blob> {
        let mut remlen = 2 + self.return_codes.len();
        if proto.is_v5() {
            remlen += self.properties.size();
        }
        let fh = FixedHeader::new(PacketType::SubAck, VarU32(remlen.try_into()?))?;

        let mut data = fh.to_frame()?;
        data.extend_from_slice(self.packet_id.encode()?.as_ref());
        if proto.is_v5() {
            data.extend_from_slice(self.properties.encode()?.as_ref());
        }
        data.extend_from_slice(&self.return_codes);

        Ok(Blob::Large { data })
    }
}

impl SubAck {
    pub fn new(packet_id: u16, return_codes: Vec<u8>) -> SubAck {
        SubAck { packet_id, properties: Properties::default(), return_codes }
    }

    /// SUBACK granting every entry of `sub` its requested QoS.
    pub fn from_subscribe(sub: &Subscribe) -> SubAck {
        let codes = sub.filters.iter().map(|e| e.requested_qos()).collect();
        SubAck::new(sub.packet_id, codes)
    }

    /// Return code at `index`, failure when the code is 0x80 or above.
    pub fn is_failure(&self, index: usize) -> Result<bool> {
        match self.return_codes.get(index) {
            Some(code) => Ok(*code >= 0x80),
            None => err!(
                InvalidInput,
                desc: "{} index {} of {}",
                PP,
                index,
                self.return_codes.len()
            ),
        }
    }
}
