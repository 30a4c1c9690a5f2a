use crate::mqtt::{FixedHeader, PacketType};
use crate::{Blob, Framing, MqttProtocol, Packetize, VarU32};
use crate::{Error, ErrorKind, ReasonCode, Result};

/// PINGREQ Packet, fixed header alone.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct PingReq;

/// PINGRESP Packet, fixed header alone.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct PingResp;

impl Framing for PingReq {
    fn decode<T: AsRef<[u8]>>(stream: T, proto: MqttProtocol) -> Result<(Self, usize)> {
        let n = decode_empty(stream.as_ref(), proto, "Packet::PingReq")?;
        Ok((PingReq, n))
    }

    fn encode(&self, _proto: MqttProtocol) -> Result<Blob> {
        FixedHeader::new(PacketType::PingReq, VarU32(0))?.encode()
    }
}

impl Framing for PingResp {
    fn decode<T: AsRef<[u8]>>(stream: T, proto: MqttProtocol) -> Result<(Self, usize)> {
        let n = decode_empty(stream.as_ref(), proto, "Packet::PingResp")?;
        Ok((PingResp, n))
    }

    fn encode(&self, _proto: MqttProtocol) -> Result<Blob> {
        FixedHeader::new(PacketType::PingResp, VarU32(0))?.encode()
    }
}

fn decode_empty(stream: &[u8], proto: MqttProtocol, what: &str) -> Result<usize> {
    let (fh, n) = dec_field!(FixedHeader, stream, 0);
    fh.validate(proto)?;

    if *fh.remaining_len != 0 {
        err!(
            MalformedPacket,
            code: MalformedPacket,
            "{} remaining-len {}",
            what,
            *fh.remaining_len
        )?;
    }

    Ok(n)
}
