use std::{fmt, result};

use crate::mqtt::{props_len, FixedHeader, PacketType, Properties};
use crate::{Blob, Framing, MqttProtocol, Packetize, VarU32};
use crate::{Error, ErrorKind, ReasonCode, Result};

const PP: &'static str = "Packet::Auth";

/// AUTH Packet, MQTT-5 only.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Auth {
    pub code: Option<u8>,
    pub properties: Option<Properties>,
}

impl fmt::Display for Auth {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        write!(f, "AUTH")?;
        if let Some(code) = self.code {
            write!(f, " code:0x{:02x}", code)?;
        }
        if let Some(properties) = &self.properties {
            write!(f, " properties:{}", properties)?;
        }
        Ok(())
    }
}

impl Framing for Auth {
    fn decode<T: AsRef<[u8]>>(stream: T, proto: MqttProtocol) -> Result<(Self, usize)> {
        let stream: &[u8] = stream.as_ref();

        let (fh, n) = dec_field!(FixedHeader, stream, 0);
        if !proto.is_v5() {
            err!(MalformedPacket, code: MalformedPacket, "{} for {}", PP, proto)?;
        }
        fh.validate(proto)?;
        let stream = fh.frame(stream)?;

        let remlen = *fh.remaining_len;
        let (code, n) = dec_field!(u8, stream, n; remlen > 0);
        let (properties, n) = dec_field!(Properties, stream, n; remlen > 1);

        fh.consumed(n, PP)?;

        Ok((Auth { code, properties }, n))
    }

    fn encode(&self, proto: MqttProtocol) -> Result<Blob> {
        if !proto.is_v5() {
            err!(ProtocolError, desc: "{} for {}", PP, proto)?;
        }

        let code = match (self.code, &self.properties) {
            (None, Some(_)) => Some(ReasonCode::Success as u8),
            (code, _) => code,
        };

        let remlen = code.map(|_| 1).unwrap_or(0) + props_len(&self.properties);
        let fh = FixedHeader::new(PacketType::Auth, VarU32(remlen.try_into()?))?;

        let mut data = fh.to_frame()?;
        if let Some(code) = code {
            data.extend_from_slice(code.encode()?.as_ref());
        }
        if let Some(properties) = &self.properties {
            data.extend_from_slice(properties.encode()?.as_ref());
        }

        Ok(Blob::Large { data })
    }
}

impl Auth {
    pub fn new(code: ReasonCode, properties: Properties) -> Auth {
        Auth { code: Some(code as u8), properties: Some(properties) }
    }
}
