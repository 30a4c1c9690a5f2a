use std::{fmt, result};

use crate::mqtt::{props_len, FixedHeader, PacketType, Properties, Property};
use crate::{Blob, Framing, MqttProtocol, Packetize, VarU32};
use crate::{Error, ErrorKind, ReasonCode, Result};

const PP: &'static str = "Packet::Disconnect";

/// DISCONNECT Packet
///
/// Empty before MQTT-5. In MQTT-5 both the reason code and the property block
/// are optional, a zero remaining-length means normal disconnection.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Disconnect {
    pub code: Option<u8>,
    pub properties: Option<Properties>,
}

impl fmt::Display for Disconnect {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        write!(f, "DISCONNECT")?;
        if let Some(code) = self.code {
            write!(f, " code:0x{:02x}", code)?;
        }
        if let Some(properties) = &self.properties {
            write!(f, " properties:{}", properties)?;
        }
        Ok(())
    }
}

impl Framing for Disconnect {
    fn decode<T: AsRef<[u8]>>(stream: T, proto: MqttProtocol) -> Result<(Self, usize)> {
        let stream: &[u8] = stream.as_ref();

        let (fh, n) = dec_field!(FixedHeader, stream, 0);
        fh.validate(proto)?;
        let stream = fh.frame(stream)?;

        let remlen = *fh.remaining_len;
        if !proto.is_v5() && remlen != 0 {
            err!(MalformedPacket, code: MalformedPacket, "{} remaining-len {}", PP, remlen)?;
        }

        let (code, n) = dec_field!(u8, stream, n; remlen > 0);
        let (properties, n) = dec_field!(Properties, stream, n; remlen > 1);

        fh.consumed(n, PP)?;

        Ok((Disconnect { code, properties }, n))
    }

    fn encode(&self, proto: MqttProtocol) -> Result<Blob> {
        if !proto.is_v5() && (self.code.is_some() || self.properties.is_some()) {
            err!(ProtocolError, desc: "{} reason/properties for {}", PP, proto)?;
        }

        let code = match (self.code, &self.properties) {
            (None, Some(_)) => Some(ReasonCode::Success as u8),
            (code, _) => code,
        };

        let remlen = code.map(|_| 1).unwrap_or(0) + props_len(&self.properties);
        let fh = FixedHeader::new(PacketType::Disconnect, VarU32(remlen.try_into()?))?;

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

impl Disconnect {
    /// Normal disconnection, zero remaining-length on every version.
    pub fn new() -> Disconnect {
        Disconnect::default()
    }

    /// MQTT-5 disconnection with reason code and an optional reason-string.
    pub fn with_reason(code: ReasonCode, reason: Option<&str>) -> Disconnect {
        let mut properties = Properties::new();
        if let Some(reason) = reason {
            properties.push(Property::ReasonString(reason.to_string()));
        }
        Disconnect { code: Some(code as u8), properties: Some(properties) }
    }

    /// Reason code, absent code means normal disconnection.
    pub fn reason_code(&self) -> u8 {
        self.code.unwrap_or(0)
    }
}
