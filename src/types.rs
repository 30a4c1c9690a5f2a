#[cfg(any(feature = "fuzzy", test))]
use arbitrary::{Arbitrary, Error as ArbitraryError, Unstructured};

use std::ops::{Deref, DerefMut};
use std::{fmt, result};

use crate::util::advance;
use crate::Packetize;
use crate::{Error, ErrorKind, ReasonCode, Result};

/// Enumeration of different MQTT Protocol version. Discriminant is the
/// protocol-level byte sent in CONNECT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(any(feature = "fuzzy", test), derive(Arbitrary))]
pub enum MqttProtocol {
    V31 = 3,
    V311 = 4,
    V5 = 5,
}

impl Default for MqttProtocol {
    fn default() -> MqttProtocol {
        MqttProtocol::V311
    }
}

impl TryFrom<u8> for MqttProtocol {
    type Error = Error;

    fn try_from(val: u8) -> Result<MqttProtocol> {
        match val {
            3 => Ok(MqttProtocol::V31),
            4 => Ok(MqttProtocol::V311),
            5 => Ok(MqttProtocol::V5),
            val => err!(
                UnsupportedProtocolVersion,
                code: UnsupportedProtocolVersion,
                "found: {:?}",
                val
            )?,
        }
    }
}

impl From<MqttProtocol> for u8 {
    fn from(val: MqttProtocol) -> u8 {
        match val {
            MqttProtocol::V31 => 3,
            MqttProtocol::V311 => 4,
            MqttProtocol::V5 => 5,
        }
    }
}

impl fmt::Display for MqttProtocol {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        match self {
            MqttProtocol::V31 => write!(f, "MQTT-3.1"),
            MqttProtocol::V311 => write!(f, "MQTT-3.1.1"),
            MqttProtocol::V5 => write!(f, "MQTT-5"),
        }
    }
}

impl MqttProtocol {
    /// Protocol name carried in CONNECT's variable header.
    pub fn protocol_name(&self) -> &'static str {
        match self {
            MqttProtocol::V31 => "MQIsdp",
            MqttProtocol::V311 | MqttProtocol::V5 => "MQTT",
        }
    }

    /// Property blocks exist only from version 5.
    pub fn is_v5(&self) -> bool {
        *self == MqttProtocol::V5
    }
}

/// Type is associated with [Packetize] trait and optimizes on the returned byte-blob.
///
/// Small variant stores the bytes in stack.
/// Large variant stores the bytes in heap.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Blob {
    Small { data: [u8; 32], size: usize },
    Large { data: Vec<u8> },
}

impl AsRef<[u8]> for Blob {
    fn as_ref(&self) -> &[u8] {
        match self {
            Blob::Small { data, size } => &data[..*size],
            Blob::Large { data } => &data,
        }
    }
}

impl Blob {
    pub fn into_vec(self) -> Vec<u8> {
        match self {
            Blob::Small { data, size } => data[..size].to_vec(),
            Blob::Large { data } => data,
        }
    }
}

/// Type client-id implements a unique ID defined by MQTT specification.
#[derive(Debug, Clone, Eq, PartialEq, PartialOrd, Ord)]
pub struct ClientID(pub String);

impl Deref for ClientID {
    type Target = String;

    fn deref(&self) -> &String {
        &self.0
    }
}

impl DerefMut for ClientID {
    fn deref_mut(&mut self) -> &mut String {
        &mut self.0
    }
}

impl From<&str> for ClientID {
    fn from(val: &str) -> ClientID {
        ClientID(val.to_string())
    }
}

#[cfg(any(feature = "fuzzy", test))]
impl<'a> Arbitrary<'a> for ClientID {
    fn arbitrary(uns: &mut Unstructured<'a>) -> result::Result<Self, ArbitraryError> {
        let client_id = match uns.arbitrary::<u8>()? % 3 {
            0 => ClientID::new_uuid_v4(),
            1 => ClientID("".to_string()),
            2 => ClientID(uns.choose(&["abc", "fvt-client", "\u{1F600}"])?.to_string()),
            _ => unreachable!(),
        };

        Ok(client_id)
    }
}

impl ClientID {
    pub fn new_uuid_v4() -> ClientID {
        ClientID(uuid::Uuid::new_v4().to_string())
    }
}

/// Type implement variable-length unsigned 32-bit integer.
///
/// Uses continuation bit at position 7 to continue reading next byte to frame 'u32'.
///
/// ```txt
/// i/p stream: 0b0www_wwww 0b1zzz_zzzz 0b1yyy_yyyy 0b1xxx_xxxx, low-byte to high-byte
/// o/p u32   : 0bwww_wwww_zzz_zzzz_yyy_yyyy_xxx_xxxx
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd)]
pub struct VarU32(pub u32);

#[cfg(any(feature = "fuzzy", test))]
impl<'a> Arbitrary<'a> for VarU32 {
    fn arbitrary(uns: &mut Unstructured<'a>) -> result::Result<Self, ArbitraryError> {
        let val: u32 = uns.arbitrary()?;
        Ok(VarU32(val % *VarU32::MAX))
    }
}

impl Deref for VarU32 {
    type Target = u32;

    fn deref(&self) -> &u32 {
        &self.0
    }
}

impl Packetize for VarU32 {
    fn decode<T: AsRef<[u8]>>(stream: T) -> Result<(Self, usize)> {
        let stream: &[u8] = stream.as_ref();

        let mut out = 0_u32;
        for i in 0..VarU32::MAX_BYTES {
            let byte = match stream.get(i) {
                Some(byte) => *byte,
                None => err!(InsufficientBytes, code: MalformedPacket, "VarU32::decode")?,
            };
            out += ((byte as u32) & 0x7f) << (7 * (i as u32));
            if byte < 0x80 {
                return Ok((VarU32(out), i + 1));
            }
        }

        err!(MalformedPacket, code: MalformedPacket, "VarU32::decode continuation at 4th")
    }

    fn encode(&self) -> Result<Blob> {
        if self.0 > *VarU32::MAX {
            err!(ProtocolError, desc: "VarU32::encode({})", self.0)?;
        }

        let (mut data, mut size, mut val) = ([0_u8; 32], 0, self.0);
        loop {
            let mut byte = (val % 128) as u8;
            val = val / 128;
            if val > 0 {
                byte |= 0x80;
            }
            data[size] = byte;
            size += 1;
            if val == 0 {
                break;
            }
        }

        Ok(Blob::Small { data, size })
    }
}

impl VarU32 {
    pub const MAX: VarU32 = VarU32(268_435_455);
    pub const MAX_BYTES: usize = 4;

    /// Number of bytes needed to encode this value.
    pub fn size(&self) -> usize {
        match self.0 {
            n if n < 128 => 1,
            n if n < 16_384 => 2,
            n if n < 2_097_152 => 3,
            _ => 4,
        }
    }
}

/// Type alias for MQTT User-Property.
pub type UserProperty = (String, String);

impl Packetize for UserProperty {
    fn decode<T: AsRef<[u8]>>(stream: T) -> Result<(Self, usize)> {
        let stream: &[u8] = stream.as_ref();

        let (key, m) = String::decode(stream)?;
        let (val, n) = String::decode(advance(stream, m)?)?;
        Ok(((key, val), (m + n)))
    }

    fn encode(&self) -> Result<Blob> {
        let mut data = Vec::with_capacity(4 + self.0.len() + self.1.len());
        data.extend_from_slice(self.0.encode()?.as_ref());
        data.extend_from_slice(self.1.encode()?.as_ref());
        Ok(Blob::Large { data })
    }
}

impl Packetize for u8 {
    fn decode<T: AsRef<[u8]>>(stream: T) -> Result<(Self, usize)> {
        let stream: &[u8] = stream.as_ref();

        match stream.len() {
            n if n >= 1 => Ok((stream[0], 1)),
            _ => err!(InsufficientBytes, code: MalformedPacket, "u8::decode()"),
        }
    }

    fn encode(&self) -> Result<Blob> {
        let mut data = [0_u8; 32];
        data[0] = *self;
        Ok(Blob::Small { data, size: 1 })
    }
}

impl Packetize for u16 {
    fn decode<T: AsRef<[u8]>>(stream: T) -> Result<(Self, usize)> {
        let stream: &[u8] = stream.as_ref();

        match stream.len() {
            n if n >= 2 => Ok((u16::from_be_bytes([stream[0], stream[1]]), 2)),
            _ => err!(InsufficientBytes, code: MalformedPacket, "u16::decode()"),
        }
    }

    fn encode(&self) -> Result<Blob> {
        let mut data = [0_u8; 32];
        data[..2].copy_from_slice(&self.to_be_bytes());
        Ok(Blob::Small { data, size: 2 })
    }
}

impl Packetize for u32 {
    fn decode<T: AsRef<[u8]>>(stream: T) -> Result<(Self, usize)> {
        let stream: &[u8] = stream.as_ref();

        match stream.len() {
            n if n >= 4 => {
                let bytes = [stream[0], stream[1], stream[2], stream[3]];
                Ok((u32::from_be_bytes(bytes), 4))
            }
            _ => err!(InsufficientBytes, code: MalformedPacket, "u32::decode()"),
        }
    }

    fn encode(&self) -> Result<Blob> {
        let mut data = [0_u8; 32];
        data[..4].copy_from_slice(&self.to_be_bytes());
        Ok(Blob::Small { data, size: 4 })
    }
}

/// UTF8 encoded string, prefixed with its byte-length as big-endian u16. Code
/// points are not policed here, brokers are expected to reject them.
impl Packetize for String {
    fn decode<T: AsRef<[u8]>>(stream: T) -> Result<(Self, usize)> {
        let stream: &[u8] = stream.as_ref();

        let len = usize::from(utf8_length(stream)?);
        if len + 2 > stream.len() {
            err!(InsufficientBytes, code: MalformedPacket, "String::decode {}", len)?;
        }

        match std::str::from_utf8(&stream[2..2 + len]) {
            Ok(s) => Ok((s.to_string(), 2 + len)),
            Err(err) => {
                err!(MalformedPacket, code: MalformedPacket, cause: err, "String::decode")
            }
        }
    }

    fn encode(&self) -> Result<Blob> {
        match self.len() {
            n if n > (u16::MAX as usize) => {
                err!(ProtocolError, desc: "String::encode too large {:?}", n)
            }
            n if n < 30 => {
                let mut data = [0_u8; 32];
                data[0..2].copy_from_slice(&(n as u16).to_be_bytes());
                data[2..2 + n].copy_from_slice(self.as_bytes());
                Ok(Blob::Small { data, size: 2 + n })
            }
            n => {
                let mut data = Vec::with_capacity(2 + n);
                data.extend_from_slice(&(n as u16).to_be_bytes());
                data.extend_from_slice(self.as_bytes());
                Ok(Blob::Large { data })
            }
        }
    }
}

/// Binary data, prefixed with its length as big-endian u16.
impl Packetize for Vec<u8> {
    fn decode<T: AsRef<[u8]>>(stream: T) -> Result<(Self, usize)> {
        let stream: &[u8] = stream.as_ref();

        let (len, _) = u16::decode(stream)?;
        let len = usize::from(len);
        if len + 2 > stream.len() {
            err!(InsufficientBytes, code: MalformedPacket, "Vector::decode")?;
        }
        Ok((stream[2..2 + len].to_vec(), 2 + len))
    }

    fn encode(&self) -> Result<Blob> {
        match self.len() {
            n if n > (u16::MAX as usize) => {
                err!(ProtocolError, desc: "Vector::encode({})", n)
            }
            n => {
                let mut data = Vec::with_capacity(2 + n);
                data.extend_from_slice(&(n as u16).to_be_bytes());
                data.extend_from_slice(self.as_ref());
                Ok(Blob::Large { data })
            }
        }
    }
}

/// Parse the 2-byte length prefix of a UTF8 encoded string, without touching
/// the string itself.
pub fn utf8_length(prefix: &[u8]) -> Result<u16> {
    match prefix {
        [hi, lo, ..] => Ok(u16::from_be_bytes([*hi, *lo])),
        _ => err!(InsufficientBytes, code: MalformedPacket, "utf8 length prefix"),
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
