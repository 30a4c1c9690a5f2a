use std::{fmt, result};

use crate::mqtt::{FixedHeader, Packet, PacketType};
use crate::util::to_hex;
use crate::{Framing, MqttProtocol, Packetize};
use crate::{Error, ErrorKind, Result};

/// A typed MQTT packet along with its complete serialized form, fixed header
/// included.
///
/// Messages are built from a packet, and serialized immediately, or parsed from
/// a byte stream, keeping the bytes exactly as received. Either way `as_bytes()`
/// is what goes, or went, on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    proto: MqttProtocol,
    packet: Packet,
    data: Vec<u8>,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        write!(f, "{}", self.packet)
    }
}

impl Message {
    /// Serialize `packet` for `proto`.
    pub fn build(proto: MqttProtocol, packet: Packet) -> Result<Message> {
        let data = packet.encode(proto)?.into_vec();
        Ok(Message { proto, packet, data })
    }

    /// Parse one message from the head of `stream`, return the message and the
    /// number of bytes consumed.
    pub fn parse<T: AsRef<[u8]>>(stream: T, proto: MqttProtocol) -> Result<(Message, usize)> {
        let stream: &[u8] = stream.as_ref();

        let (packet, n) = Packet::decode(stream, proto)?;
        let data = stream[..n].to_vec();

        Ok((Message { proto, packet, data }, n))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn packet(&self) -> &Packet {
        &self.packet
    }

    pub fn into_packet(self) -> Packet {
        self.packet
    }

    pub fn proto(&self) -> MqttProtocol {
        self.proto
    }

    pub fn packet_type(&self) -> PacketType {
        self.packet.to_packet_type()
    }

    pub fn fixed_header(&self) -> Result<FixedHeader> {
        Ok(FixedHeader::decode(&self.data)?.0)
    }

    /// First byte on the wire, packet type and flags.
    pub fn header_byte(&self) -> u8 {
        self.data.first().copied().unwrap_or(0)
    }

    /// Set the RETAIN flag on PUBLISH and re-serialize.
    pub fn set_retain(&mut self, retain: bool) -> Result<()> {
        match &mut self.packet {
            Packet::Publish(pkt) => pkt.retain = retain,
            pkt => err!(ProtocolError, desc: "set_retain on {}", pkt.to_packet_type())?,
        }
        self.reserialize()
    }

    /// Set the DUP flag on PUBLISH and re-serialize.
    pub fn set_dup(&mut self, dup: bool) -> Result<()> {
        match &mut self.packet {
            Packet::Publish(pkt) => pkt.dup = dup,
            pkt => err!(ProtocolError, desc: "set_dup on {}", pkt.to_packet_type())?,
        }
        self.reserialize()
    }

    /// Replace the packet identifier and re-serialize.
    pub fn set_packet_id(&mut self, packet_id: u16) -> Result<()> {
        self.packet.set_packet_id(packet_id)?;
        self.reserialize()
    }

    /// Diagnostic rendering, decoded summary followed by the raw bytes.
    pub fn render(&self) -> String {
        format!("{} <{}> [{}]", self.packet, self.proto, to_hex(&self.data))
    }

    fn reserialize(&mut self) -> Result<()> {
        self.data = self.packet.encode(self.proto)?.into_vec();
        Ok(())
    }
}

#[cfg(test)]
#[path = "message_test.rs"]
mod message_test;
