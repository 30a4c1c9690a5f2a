use std::{fmt, result};

use crate::mqtt::{props_len, FixedHeader, PacketType, Properties};
use crate::{Blob, Framing, MqttProtocol, Packetize, VarU32};
use crate::{Error, ErrorKind, ReasonCode, Result};

const PP: &'static str = "Packet::ConnAck";

/// Return codes in CONNACK for MQTT-3.1 and MQTT-3.1.1. MQTT-5 uses [ReasonCode].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[repr(u8)]
pub enum ConnectReturnCode {
    Accepted = 0,
    UnacceptableProtocolVersion = 1,
    IdentifierRejected = 2,
    ServerUnavailable = 3,
    BadUserNameOrPassword = 4,
    NotAuthorized = 5,
}

impl TryFrom<u8> for ConnectReturnCode {
    type Error = Error;

    fn try_from(val: u8) -> Result<ConnectReturnCode> {
        use ConnectReturnCode::*;

        let code = match val {
            0 => Accepted,
            1 => UnacceptableProtocolVersion,
            2 => IdentifierRejected,
            3 => ServerUnavailable,
            4 => BadUserNameOrPassword,
            5 => NotAuthorized,
            val => err!(ProtocolError, code: ProtocolError, "{} return-code {}", PP, val)?,
        };

        Ok(code)
    }
}

impl fmt::Display for ConnectReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        use ConnectReturnCode::*;

        let s = match self {
            Accepted => "Connection Accepted",
            UnacceptableProtocolVersion => "Connection Refused, unacceptable protocol version",
            IdentifierRejected => "Connection Refused, identifier rejected",
            ServerUnavailable => "Connection Refused, Server unavailable",
            BadUserNameOrPassword => "Connection Refused, bad user name or password",
            NotAuthorized => "Connection Refused, not authorized",
        };
        write!(f, "{}", s)
    }
}

/// Acknowledge flags byte in CONNACK, only bit-0 (session-present) is defined.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct ConnackFlags(pub u8);

impl ConnackFlags {
    pub const SESSION_PRESENT: u8 = 0b_0000_0001;

    pub fn new(session_present: bool) -> ConnackFlags {
        match session_present {
            true => ConnackFlags(Self::SESSION_PRESENT),
            false => ConnackFlags(0),
        }
    }

    pub fn is_session_present(&self) -> bool {
        (self.0 & Self::SESSION_PRESENT) > 0
    }
}

/// CONNACK Packet
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ConnAck {
    pub flags: ConnackFlags,
    /// Return code for 3.x, reason code for 5.
    pub code: u8,
    /// MQTT-5 only. Absent when the broker sent only flags and code.
    pub properties: Option<Properties>,
}

impl fmt::Display for ConnAck {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        write!(f, "CONNACK flags:0x{:02x} code:0x{:02x}", self.flags.0, self.code)?;
        if let Some(properties) = &self.properties {
            write!(f, " properties:{}", properties)?;
        }
        Ok(())
    }
}

impl Framing for ConnAck {
    fn decode<T: AsRef<[u8]>>(stream: T, proto: MqttProtocol) -> Result<(Self, usize)> {
        let stream: &[u8] = stream.as_ref();

        let (fh, n) = dec_field!(FixedHeader, stream, 0);
        fh.validate(proto)?;
        let stream = fh.frame(stream)?;

        if !proto.is_v5() && *fh.remaining_len != 2 {
            err!(
                MalformedPacket,
                code: MalformedPacket,
                "{} remaining-len {} for {}",
                PP,
                *fh.remaining_len,
                proto
            )?;
        }

        let (flags, n) = dec_field!(u8, stream, n);
        let (code, n) = dec_field!(u8, stream, n);
        let (properties, n) = dec_field!(Properties, stream, n; *fh.remaining_len > 2);

        fh.consumed(n, PP)?;

        let pkt = ConnAck { flags: ConnackFlags(flags), code, properties };
        Ok((pkt, n))
    }

    fn encode(&self, proto: MqttProtocol) -> Result<Blob> {
        if !proto.is_v5() && self.properties.is_some() {
            err!(ProtocolError, desc: "{} properties for {}", PP, proto)?;
        }

        let remlen = 2 + props_len(&self.properties);
        let fh = FixedHeader::new(PacketType::ConnAck, VarU32(remlen.try_into()?))?;

        let mut data = fh.to_frame()?;
        data.extend_from_slice(self.flags.0.encode()?.as_ref());
        data.extend_from_slice(self.code.encode()?.as_ref());
        if let Some(properties) = &self.properties {
            data.extend_from_slice(properties.encode()?.as_ref());
        }

        Ok(Blob::Large { data })
    }
}

impl ConnAck {
    /// CONNACK as a broker would send for `proto`. Session-present is dropped for
    /// MQTT-3.1, where that byte is reserved.
    pub fn new(proto: MqttProtocol, session_present: bool, code: u8) -> ConnAck {
        let session_present = session_present && proto >= MqttProtocol::V311;
        let properties = match proto {
            MqttProtocol::V5 => Some(Properties::default()),
            _ => None,
        };
        ConnAck { flags: ConnackFlags::new(session_present), code, properties }
    }

    /// Session-present flag, meaningful only from MQTT-3.1.1.
    pub fn session_present(&self, proto: MqttProtocol) -> bool {
        proto >= MqttProtocol::V311 && self.flags.is_session_present()
    }

    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    /// Human readable return-code, as defined for `proto`.
    pub fn return_code(&self, proto: MqttProtocol) -> String {
        let res = match proto {
            MqttProtocol::V5 => ReasonCode::try_from(self.code).map(|c| c.to_string()),
            _ => ConnectReturnCode::try_from(self.code).map(|c| c.to_string()),
        };
        match res {
            Ok(s) => s,
            Err(_) => format!("unknown code 0x{:02x}", self.code),
        }
    }
}
