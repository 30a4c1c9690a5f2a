use std::{fmt, result};

use crate::mqtt::{props_len, FixedHeader, PacketType, Properties};
use crate::{Blob, Framing, MqttProtocol, Packetize, VarU32};
use crate::{Error, ErrorKind, ReasonCode, Result};

const PP: &'static str = "Packet::Pub";

/// PUBACK, PUBREC, PUBREL, PUBCOMP packets
///
/// `code` and `properties` exist only in MQTT-5, where the short form (packet-id
/// alone) means success.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Pub {
    pub packet_type: PacketType,
    pub packet_id: u16,
    pub code: Option<u8>,
    pub properties: Option<Properties>,
}

impl fmt::Display for Pub {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        write!(f, "{} packet_id:{}", self.packet_type, self.packet_id)?;
        if let Some(code) = self.code {
            write!(f, " code:0x{:02x}", code)?;
        }
        if let Some(properties) = &self.properties {
            write!(f, " properties:{}", properties)?;
        }
        Ok(())
    }
}

impl Framing for Pub {
    fn decode<T: AsRef<[u8]>>(stream: T, proto: MqttProtocol) -> Result<(Self, usize)> {
        let stream: &[u8] = stream.as_ref();

        let (fh, n) = dec_field!(FixedHeader, stream, 0);
        fh.validate(proto)?;
        let stream = fh.frame(stream)?;
        let packet_type = fh.packet_type()?;

        let remlen = *fh.remaining_len;
        if !proto.is_v5() && remlen != 2 {
            err!(
                MalformedPacket,
                code: MalformedPacket,
                "{} {} remaining-len {} for {}",
                PP,
                packet_type,
                remlen,
                proto
            )?;
        }

        let (packet_id, n) = dec_field!(u16, stream, n);
        let (code, n) = dec_field!(u8, stream, n; remlen > 2);
        let (properties, n) = dec_field!(Properties, stream, n; remlen > 3);

        fh.consumed(n, PP)?;

        let pkt = Pub { packet_type, packet_id, code, properties };
        Ok((pkt, n))
    }

    fn encode(&self, proto: MqttProtocol) -> Result<Blob> {
        if !proto.is_v5() && (self.code.is_some() || self.properties.is_some()) {
            err!(ProtocolError, desc: "{} reason/properties for {}", PP, proto)?;
        }

        // properties cannot go without a code, that defaults to success.
        let code = match (self.code, &self.properties) {
            (None, Some(_)) => Some(0),
            (code, _) => code,
        };

        let remlen = 2 + code.map(|_| 1).unwrap_or(0) + props_len(&self.properties);
        let remlen = VarU32(remlen.try_into()?);
        let fh = match self.packet_type {
            PacketType::PubAck
            | PacketType::PubRec
            | PacketType::PubRel
            | PacketType::PubComp => FixedHeader::new(self.packet_type, remlen)?,
            packet_type => err!(ProtocolError, desc: "{} packet_type {}", PP, packet_type)?,
        };

        let mut data = fh.to_frame()?;
        data.extend_from_slice(self.packet_id.encode()?.as_ref());
        if let Some(code) = code {
            data.extend_from_slice(code.encode()?.as_ref());
        }
        if let Some(properties) = &self.properties {
            data.extend_from_slice(properties.encode()?.as_ref());
        }

        Ok(Blob::Large { data })
    }
}

impl Pub {
    /// Short form, packet-id alone.
    pub fn new(packet_type: PacketType, packet_id: u16) -> Pub {
        Pub { packet_type, packet_id, code: None, properties: None }
    }

    pub fn new_pub_ack(packet_id: u16) -> Pub {
        Pub::new(PacketType::PubAck, packet_id)
    }

    pub fn new_pub_rec(packet_id: u16) -> Pub {
        Pub::new(PacketType::PubRec, packet_id)
    }

    pub fn new_pub_rel(packet_id: u16) -> Pub {
        Pub::new(PacketType::PubRel, packet_id)
    }

    pub fn new_pub_comp(packet_id: u16) -> Pub {
        Pub::new(PacketType::PubComp, packet_id)
    }

    /// MQTT-5 reason code, with an empty property block.
    pub fn with_code(mut self, code: ReasonCode) -> Pub {
        self.code = Some(code as u8);
        self.properties = Some(Properties::default());
        self
    }

    /// Reason code, absent code means success.
    pub fn reason_code(&self) -> u8 {
        self.code.unwrap_or(0)
    }
}
