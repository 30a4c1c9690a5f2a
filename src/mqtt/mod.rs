//! Module implement MQTT packet serialization for protocol versions 3.1, 3.1.1
//! and 5.
//!
//! Every packet implements [Framing], encode and decode calls take the protocol
//! version explicitly, there is no ambient version state.

#[cfg(any(feature = "fuzzy", test))]
use arbitrary::{Arbitrary, Error as ArbitraryError, Unstructured};

use std::{fmt, result};

use crate::util::advance;
use crate::{Blob, Framing, MqttProtocol, Packetize, UserProperty, VarU32};
use crate::{Error, ErrorKind, ReasonCode, Result};

/// MQTT packetization, decode a single field.
macro_rules! dec_field {
    ($type:ty, $stream:expr, $n:expr; $($pred:tt)*) => {{
        if $($pred)* {
            let (val, m) = <$type>::decode(crate::util::advance($stream, $n)?)?;
            (Some(val), $n + m)
        } else {
            (None, $n)
        }
    }};
    ($type:ty, $stream:expr, $n:expr) => {{
        let (val, m) = <$type>::decode(crate::util::advance($stream, $n)?)?;
        (val, $n + m)
    }};
}

/// MQTT packetization, decode a single property.
macro_rules! dec_prop {
    ($varn:ident, $valtype:ty, $stream:expr) => {{
        let (val, n) = <$valtype>::decode($stream)?;
        (Property::$varn(val), n)
    }};
}

/// MQTT packetization, enocde a single property.
macro_rules! enc_prop {
    ($data:ident, $varn:ident, $($val:tt)*) => {{
        $data.extend_from_slice(VarU32(PropertyType::$varn as u32).encode()?.as_ref());
        $data.extend_from_slice($($val)*.encode()?.as_ref());
    }};
}

/// MQTT packetization, to create the 1 byte fixed-header.
macro_rules! fixed_byte {
    ($pkt_type:expr, $retain:expr, $qos:expr, $dup:expr) => {{
        let retain: u8 = if $retain { 0b0001 } else { 0b0000 };
        let qos: u8 = ($qos & 0b11) << 1;
        let dup: u8 = if $dup { 0b1000 } else { 0b0000 };
        let pkt_type = $pkt_type << 4;

        pkt_type | retain | qos | dup
    }};
}

mod auth;
mod connack;
mod connect;
mod disconnect;
mod ping;
mod pubaclc;
mod publish;
mod sub;
mod suback;
mod unsub;
mod unsuback;

pub use auth::Auth;
pub use connack::{ConnAck, ConnackFlags, ConnectReturnCode};
pub use connect::{Connect, ConnectFlags, ConnectPayload};
pub use disconnect::Disconnect;
pub use ping::{PingReq, PingResp};
pub use pubaclc::Pub;
pub use publish::Publish;
pub use sub::{SubList, Subscribe, SubscriptionEntry};
pub use suback::SubAck;
pub use unsub::{TopicList, UnSubscribe};
pub use unsuback::UnsubAck;

/// MQTT packet type
#[cfg_attr(any(feature = "fuzzy", test), derive(Arbitrary))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    Connect = 1,
    ConnAck = 2,
    Publish = 3,
    PubAck = 4,
    PubRec = 5,
    PubRel = 6,
    PubComp = 7,
    Subscribe = 8,
    SubAck = 9,
    UnSubscribe = 10,
    UnsubAck = 11,
    PingReq = 12,
    PingResp = 13,
    Disconnect = 14,
    Auth = 15,
}

impl TryFrom<u8> for PacketType {
    type Error = Error;

    fn try_from(val: u8) -> Result<PacketType> {
        let val = match val {
            1 => PacketType::Connect,
            2 => PacketType::ConnAck,
            3 => PacketType::Publish,
            4 => PacketType::PubAck,
            5 => PacketType::PubRec,
            6 => PacketType::PubRel,
            7 => PacketType::PubComp,
            8 => PacketType::Subscribe,
            9 => PacketType::SubAck,
            10 => PacketType::UnSubscribe,
            11 => PacketType::UnsubAck,
            12 => PacketType::PingReq,
            13 => PacketType::PingResp,
            14 => PacketType::Disconnect,
            15 => PacketType::Auth,
            _ => err!(MalformedPacket, code: MalformedPacket, "forbidden packet-type")?,
        };

        Ok(val)
    }
}

impl From<PacketType> for u8 {
    fn from(val: PacketType) -> u8 {
        val as u8
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        let s = match self {
            PacketType::Connect => "CONNECT",
            PacketType::ConnAck => "CONNACK",
            PacketType::Publish => "PUBLISH",
            PacketType::PubAck => "PUBACK",
            PacketType::PubRec => "PUBREC",
            PacketType::PubRel => "PUBREL",
            PacketType::PubComp => "PUBCOMP",
            PacketType::Subscribe => "SUBSCRIBE",
            PacketType::SubAck => "SUBACK",
            PacketType::UnSubscribe => "UNSUBSCRIBE",
            PacketType::UnsubAck => "UNSUBACK",
            PacketType::PingReq => "PINGREQ",
            PacketType::PingResp => "PINGRESP",
            PacketType::Disconnect => "DISCONNECT",
            PacketType::Auth => "AUTH",
        };
        write!(f, "{}", s)
    }
}

/// Enumeration of all possible MQTT packets, its header, fields, properties, payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Connect(Connect),
    ConnAck(ConnAck),
    Publish(Publish),
    PubAck(Pub),
    PubRec(Pub),
    PubRel(Pub),
    PubComp(Pub),
    Subscribe(Subscribe),
    SubAck(SubAck),
    UnSubscribe(UnSubscribe),
    UnsubAck(UnsubAck),
    PingReq,
    PingResp,
    Disconnect(Disconnect),
    Auth(Auth),
}

impl Framing for Packet {
    fn decode<T: AsRef<[u8]>>(stream: T, proto: MqttProtocol) -> Result<(Self, usize)> {
        let stream: &[u8] = stream.as_ref();
        let (fh, _) = FixedHeader::decode(stream)?;

        match fh.packet_type()? {
            PacketType::Connect => {
                let (pkt, n) = Connect::decode(stream, proto)?;
                Ok((Packet::Connect(pkt), n))
            }
            PacketType::ConnAck => {
                let (pkt, n) = ConnAck::decode(stream, proto)?;
                Ok((Packet::ConnAck(pkt), n))
            }
            PacketType::Publish => {
                let (pkt, n) = Publish::decode(stream, proto)?;
                Ok((Packet::Publish(pkt), n))
            }
            PacketType::PubAck => {
                let (pkt, n) = Pub::decode(stream, proto)?;
                Ok((Packet::PubAck(pkt), n))
            }
            PacketType::PubRec => {
                let (pkt, n) = Pub::decode(stream, proto)?;
                Ok((Packet::PubRec(pkt), n))
            }
            PacketType::PubRel => {
                let (pkt, n) = Pub::decode(stream, proto)?;
                Ok((Packet::PubRel(pkt), n))
            }
            PacketType::PubComp => {
                let (pkt, n) = Pub::decode(stream, proto)?;
                Ok((Packet::PubComp(pkt), n))
            }
            PacketType::Subscribe => {
                let (pkt, n) = Subscribe::decode(stream, proto)?;
                Ok((Packet::Subscribe(pkt), n))
            }
            PacketType::SubAck => {
                let (pkt, n) = SubAck::decode(stream, proto)?;
                Ok((Packet::SubAck(pkt), n))
            }
            PacketType::UnSubscribe => {
                let (pkt, n) = UnSubscribe::decode(stream, proto)?;
                Ok((Packet::UnSubscribe(pkt), n))
            }
            PacketType::UnsubAck => {
                let (pkt, n) = UnsubAck::decode(stream, proto)?;
                Ok((Packet::UnsubAck(pkt), n))
            }
            PacketType::PingReq => {
                let (_pkt, n) = PingReq::decode(stream, proto)?;
                Ok((Packet::PingReq, n))
            }
            PacketType::PingResp => {
                let (_pkt, n) = PingResp::decode(stream, proto)?;
                Ok((Packet::PingResp, n))
            }
            PacketType::Disconnect => {
                let (pkt, n) = Disconnect::decode(stream, proto)?;
                Ok((Packet::Disconnect(pkt), n))
            }
            PacketType::Auth => {
                let (pkt, n) = Auth::decode(stream, proto)?;
                Ok((Packet::Auth(pkt), n))
            }
        }
    }

    fn encode(&self, proto: MqttProtocol) -> Result<Blob> {
        match self {
            Packet::Connect(pkt) => pkt.encode(proto),
            Packet::ConnAck(pkt) => pkt.encode(proto),
            Packet::Publish(pkt) => pkt.encode(proto),
            Packet::PubAck(pkt) => pkt.encode(proto),
            Packet::PubRec(pkt) => pkt.encode(proto),
            Packet::PubRel(pkt) => pkt.encode(proto),
            Packet::PubComp(pkt) => pkt.encode(proto),
            Packet::Subscribe(pkt) => pkt.encode(proto),
            Packet::SubAck(pkt) => pkt.encode(proto),
            Packet::UnSubscribe(pkt) => pkt.encode(proto),
            Packet::UnsubAck(pkt) => pkt.encode(proto),
            Packet::PingReq => PingReq.encode(proto),
            Packet::PingResp => PingResp.encode(proto),
            Packet::Disconnect(pkt) => pkt.encode(proto),
            Packet::Auth(pkt) => pkt.encode(proto),
        }
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        match self {
            Packet::Connect(pkt) => write!(f, "{}", pkt),
            Packet::ConnAck(pkt) => write!(f, "{}", pkt),
            Packet::Publish(pkt) => write!(f, "{}", pkt),
            Packet::PubAck(pkt) => write!(f, "{}", pkt),
            Packet::PubRec(pkt) => write!(f, "{}", pkt),
            Packet::PubRel(pkt) => write!(f, "{}", pkt),
            Packet::PubComp(pkt) => write!(f, "{}", pkt),
            Packet::Subscribe(pkt) => write!(f, "{}", pkt),
            Packet::SubAck(pkt) => write!(f, "{}", pkt),
            Packet::UnSubscribe(pkt) => write!(f, "{}", pkt),
            Packet::UnsubAck(pkt) => write!(f, "{}", pkt),
            Packet::PingReq => write!(f, "PINGREQ"),
            Packet::PingResp => write!(f, "PINGRESP"),
            Packet::Disconnect(pkt) => write!(f, "{}", pkt),
            Packet::Auth(pkt) => write!(f, "{}", pkt),
        }
    }
}

impl Packet {
    pub fn to_packet_type(&self) -> PacketType {
        match self {
            Packet::Connect(_) => PacketType::Connect,
            Packet::ConnAck(_) => PacketType::ConnAck,
            Packet::Publish(_) => PacketType::Publish,
            Packet::PubAck(_) => PacketType::PubAck,
            Packet::PubRec(_) => PacketType::PubRec,
            Packet::PubRel(_) => PacketType::PubRel,
            Packet::PubComp(_) => PacketType::PubComp,
            Packet::Subscribe(_) => PacketType::Subscribe,
            Packet::SubAck(_) => PacketType::SubAck,
            Packet::UnSubscribe(_) => PacketType::UnSubscribe,
            Packet::UnsubAck(_) => PacketType::UnsubAck,
            Packet::PingReq => PacketType::PingReq,
            Packet::PingResp => PacketType::PingResp,
            Packet::Disconnect(_) => PacketType::Disconnect,
            Packet::Auth(_) => PacketType::Auth,
        }
    }

    /// Packet identifier, if this packet carries one.
    pub fn packet_id(&self) -> Option<u16> {
        match self {
            Packet::Publish(pkt) => pkt.packet_id,
            Packet::PubAck(pkt)
            | Packet::PubRec(pkt)
            | Packet::PubRel(pkt)
            | Packet::PubComp(pkt) => Some(pkt.packet_id),
            Packet::Subscribe(pkt) => Some(pkt.packet_id),
            Packet::SubAck(pkt) => Some(pkt.packet_id),
            Packet::UnSubscribe(pkt) => Some(pkt.packet_id),
            Packet::UnsubAck(pkt) => Some(pkt.packet_id),
            _ => None,
        }
    }

    /// Replace the packet identifier. Only meaningful for packets that carry one,
    /// and for PUBLISH only when QoS > 0.
    pub fn set_packet_id(&mut self, packet_id: u16) -> Result<()> {
        match self {
            Packet::Publish(pkt) if pkt.qos > 0 => pkt.packet_id = Some(packet_id),
            Packet::PubAck(pkt)
            | Packet::PubRec(pkt)
            | Packet::PubRel(pkt)
            | Packet::PubComp(pkt) => pkt.packet_id = packet_id,
            Packet::Subscribe(pkt) => pkt.packet_id = packet_id,
            Packet::SubAck(pkt) => pkt.packet_id = packet_id,
            Packet::UnSubscribe(pkt) => pkt.packet_id = packet_id,
            Packet::UnsubAck(pkt) => pkt.packet_id = packet_id,
            pkt => err!(
                ProtocolError,
                desc: "{} does not carry a packet identifier",
                pkt.to_packet_type()
            )?,
        }

        Ok(())
    }
}

/// Quality of service
#[cfg_attr(any(feature = "fuzzy", test), derive(Arbitrary))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum QoS {
    AtMostOnce = 0,
    AtLeastOnce = 1,
    ExactlyOnce = 2,
}

impl TryFrom<u8> for QoS {
    type Error = Error;

    fn try_from(val: u8) -> Result<QoS> {
        let val = match val {
            0 => QoS::AtMostOnce,
            1 => QoS::AtLeastOnce,
            2 => QoS::ExactlyOnce,
            _ => err!(MalformedPacket, code: MalformedPacket, "reserved QoS")?,
        };

        Ok(val)
    }
}

impl From<QoS> for u8 {
    fn from(val: QoS) -> u8 {
        match val {
            QoS::AtMostOnce => 0,
            QoS::AtLeastOnce => 1,
            QoS::ExactlyOnce => 2,
        }
    }
}

/// Packet type from a byte
///
/// ```ignore
///          7                          3                          0
///          +--------------------------+--------------------------+
/// byte 1   | MQTT Control Packet Type | Flags for each type      |
///          +--------------------------+--------------------------+
///          |         Remaining Bytes Len  (1/2/3/4 bytes)        |
///          +-----------------------------------------------------+
///
/// http://docs.oasis-open.org/mqtt/mqtt/v3.1.1/os/mqtt-v3.1.1-os.html#_Figure_2.2_-
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd)]
pub struct FixedHeader {
    /// First byte of the stream. Used to identify packet types and several flags
    pub byte1: u8,
    /// Remaining length of the packet. Doesn't include fixed header bytes
    /// Represents variable header + payload size
    pub remaining_len: VarU32,
}

impl Packetize for FixedHeader {
    fn decode<T: AsRef<[u8]>>(stream: T) -> Result<(FixedHeader, usize)> {
        let stream: &[u8] = stream.as_ref();

        let (byte1, n) = dec_field!(u8, stream, 0);
        let (remaining_len, n) = dec_field!(VarU32, stream, n);
        if n != 1 + remaining_len.size() {
            err!(
                MalformedPacket,
                code: MalformedPacket,
                "FixedHeader remaining-len {} in {} bytes, not minimal",
                *remaining_len,
                n - 1
            )?;
        }

        Ok((FixedHeader { byte1, remaining_len }, n))
    }

    fn encode(&self) -> Result<Blob> {
        let remaining_len = self.remaining_len.encode()?;
        let n = remaining_len.as_ref().len();

        let mut data = [0_u8; 32];
        data[0] = self.byte1;
        data[1..1 + n].copy_from_slice(remaining_len.as_ref());

        Ok(Blob::Small { data, size: 1 + n })
    }
}

impl FixedHeader {
    pub const HDR_RETAIN: u8 = 0b_0000_0001;
    pub const HDR_QOS: u8 = 0b_0000_0110;
    pub const HDR_DUP: u8 = 0b_0000_1000;
    pub const HDR_FLAGS: u8 = 0b_0000_1111;
    pub const HDR_PKT_TYPE: u8 = 0b_1111_0000;

    /// Construct fixed-header for all packets other than PUBLISH. PUBREL, SUBSCRIBE
    /// and UNSUBSCRIBE get their reserved flags `0b0010`, rest get zero flags.
    pub fn new(pkt_type: PacketType, remaining_len: VarU32) -> Result<FixedHeader> {
        if remaining_len > VarU32::MAX {
            err!(ProtocolError, desc: "FixedHeader remain-len {}", *remaining_len)?
        }

        let flags = match pkt_type {
            PacketType::PubRel | PacketType::Subscribe | PacketType::UnSubscribe => 0b0010,
            _ => 0b0000,
        };
        let byte1 = (u8::from(pkt_type) << 4) | flags;
        Ok(FixedHeader { byte1, remaining_len })
    }

    /// Construct fixed-header for PUBLISH
    pub fn new_publish(
        retain: bool,
        qos: u8,
        dup: bool,
        remaining_len: VarU32,
    ) -> Result<FixedHeader> {
        if remaining_len > VarU32::MAX {
            err!(ProtocolError, desc: "FixedHeader remain-len {}", *remaining_len)?
        }

        let val = FixedHeader {
            byte1: fixed_byte!(u8::from(PacketType::Publish), retain, qos, dup),
            remaining_len,
        };

        Ok(val)
    }

    pub fn packet_type(&self) -> Result<PacketType> {
        PacketType::try_from((self.byte1 & Self::HDR_PKT_TYPE) >> 4)
    }

    /// Unwrap the fixed header into (packet-type, retain, qos, dup).
    pub fn fields(&self) -> Result<(PacketType, bool, u8, bool)> {
        let pkt_type = self.packet_type()?;
        let retain = (self.byte1 & Self::HDR_RETAIN) > 0;
        let qos = (self.byte1 & Self::HDR_QOS) >> 1;
        let dup = (self.byte1 & Self::HDR_DUP) > 0;

        Ok((pkt_type, retain, qos, dup))
    }

    /// Length of fixed header. Byte 1 + (1..4) bytes. So fixed header
    /// len can vary from 2 bytes to 5 bytes 1..4 bytes are variable length encoded
    /// to represent remaining length
    pub fn len(&self) -> usize {
        1 + self.remaining_len.size()
    }

    /// Length of the full packet, fixed header included.
    pub fn frame_len(&self) -> Result<usize> {
        Ok(self.len() + usize::try_from(*self.remaining_len)?)
    }

    /// Slice out this packet's bytes from `stream`, leaving out whatever follows.
    pub fn frame<'a>(&self, stream: &'a [u8]) -> Result<&'a [u8]> {
        let n = self.frame_len()?;
        match stream.len() {
            m if m >= n => Ok(&stream[..n]),
            m => err!(
                InsufficientBytes,
                code: MalformedPacket,
                "frame {} bytes, remaining-len {}, got {}",
                n,
                *self.remaining_len,
                m
            ),
        }
    }

    /// Decoded fields must add up to the remaining-length, no more, no less.
    pub fn consumed(&self, n: usize, what: &str) -> Result<()> {
        match self.frame_len()? {
            m if m == n => Ok(()),
            m => err!(
                MalformedPacket,
                code: MalformedPacket,
                "{} consumed {} bytes, frame has {}",
                what,
                n,
                m
            ),
        }
    }

    /// Start a byte-buffer for the whole packet, with the fixed header in place
    /// and room for the remaining bytes.
    pub fn to_frame(&self) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(self.frame_len()?);
        data.extend_from_slice(self.encode()?.as_ref());
        Ok(data)
    }

    /// Validate flags for packet type. MQTT-3.1 did not reserve the flag bits for
    /// non-PUBLISH packets, they are not checked for that version.
    pub fn validate(&self, proto: MqttProtocol) -> Result<()> {
        use PacketType::*;

        let flags = self.byte1 & Self::HDR_FLAGS;
        match self.packet_type()? {
            Publish if (flags & Self::HDR_QOS) == Self::HDR_QOS => err!(
                MalformedPacket,
                code: MalformedPacket,
                "FixedHeader PUBLISH qos-3 byte1:0x{:x}",
                self.byte1
            ),
            Publish => Ok(()),
            _ if proto == MqttProtocol::V31 => Ok(()),
            PubRel | Subscribe | UnSubscribe if flags == 0b0010 => Ok(()),
            Connect | ConnAck | PubAck | PubRec | PubComp | SubAck | UnsubAck
            | PingReq | PingResp | Disconnect | Auth
                if flags == 0 =>
            {
                Ok(())
            }
            _ => err!(
                MalformedPacket,
                code: MalformedPacket,
                "FixedHeader invalid flags byte1:0x{:x}",
                self.byte1
            ),
        }
    }
}

/// Enumerated list of all property types defined in MQTT spec.
#[cfg_attr(any(feature = "fuzzy", test), derive(Arbitrary))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    PayloadFormatIndicator = 1,
    MessageExpiryInterval = 2,
    ContentType = 3,
    ResponseTopic = 8,
    CorrelationData = 9,
    SubscriptionIdentifier = 11,
    SessionExpiryInterval = 17,
    AssignedClientIdentifier = 18,
    ServerKeepAlive = 19,
    AuthenticationMethod = 21,
    AuthenticationData = 22,
    RequestProblemInformation = 23,
    WillDelayInterval = 24,
    RequestResponseInformation = 25,
    ResponseInformation = 26,
    ServerReference = 28,
    ReasonString = 31,
    ReceiveMaximum = 33,
    TopicAliasMaximum = 34,
    TopicAlias = 35,
    MaximumQoS = 36,
    RetainAvailable = 37,
    UserProp = 38,
    MaximumPacketSize = 39,
    WildcardSubscriptionAvailable = 40,
    SubscriptionIdentifierAvailable = 41,
    SharedSubscriptionAvailable = 42,
}

impl TryFrom<u32> for PropertyType {
    type Error = Error;

    fn try_from(val: u32) -> Result<PropertyType> {
        use PropertyType::*;

        let val = match val {
            1 => PayloadFormatIndicator,
            2 => MessageExpiryInterval,
            3 => ContentType,
            8 => ResponseTopic,
            9 => CorrelationData,
            11 => SubscriptionIdentifier,
            17 => SessionExpiryInterval,
            18 => AssignedClientIdentifier,
            19 => ServerKeepAlive,
            21 => AuthenticationMethod,
            22 => AuthenticationData,
            23 => RequestProblemInformation,
            24 => WillDelayInterval,
            25 => RequestResponseInformation,
            26 => ResponseInformation,
            28 => ServerReference,
            31 => ReasonString,
            33 => ReceiveMaximum,
            34 => TopicAliasMaximum,
            35 => TopicAlias,
            36 => MaximumQoS,
            37 => RetainAvailable,
            38 => UserProp,
            39 => MaximumPacketSize,
            40 => WildcardSubscriptionAvailable,
            41 => SubscriptionIdentifierAvailable,
            42 => SharedSubscriptionAvailable,
            val => err!(
                MalformedPacket,
                code: MalformedPacket,
                "invalid PropertyType {}",
                val
            )?,
        };

        Ok(val)
    }
}

/// Enumeration of property and its value that are allowed in a MQTT packet.
/// Values are kept raw, a broker sending out-of-range values is for the
/// comparator to catch, not the decoder.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Property {
    PayloadFormatIndicator(u8),
    MessageExpiryInterval(u32),
    ContentType(String),
    ResponseTopic(String),
    CorrelationData(Vec<u8>),
    SubscriptionIdentifier(VarU32),
    SessionExpiryInterval(u32),
    AssignedClientIdentifier(String),
    ServerKeepAlive(u16),
    AuthenticationMethod(String),
    AuthenticationData(Vec<u8>),
    RequestProblemInformation(u8),
    WillDelayInterval(u32),
    RequestResponseInformation(u8),
    ResponseInformation(String),
    ServerReference(String),
    ReasonString(String),
    ReceiveMaximum(u16),
    TopicAliasMaximum(u16),
    TopicAlias(u16),
    MaximumQoS(u8),
    RetainAvailable(u8),
    UserProp(UserProperty),
    MaximumPacketSize(u32),
    WildcardSubscriptionAvailable(u8),
    SubscriptionIdentifierAvailable(u8),
    SharedSubscriptionAvailable(u8),
}

#[cfg(any(feature = "fuzzy", test))]
impl<'a> Arbitrary<'a> for Property {
    fn arbitrary(uns: &mut Unstructured<'a>) -> result::Result<Self, ArbitraryError> {
        use PropertyType::*;

        let strings: Vec<String> = vec!["", "img/png", "a/b", "userpass", "failed"]
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        let keys: Vec<String> = vec!["", "key"].into_iter().map(|s| s.to_string()).collect();
        let vals: Vec<String> = vec!["", "val"].into_iter().map(|s| s.to_string()).collect();

        let prop = match uns.arbitrary::<PropertyType>()? {
            PayloadFormatIndicator => Property::PayloadFormatIndicator(uns.arbitrary()?),
            MessageExpiryInterval => Property::MessageExpiryInterval(uns.arbitrary()?),
            ContentType => Property::ContentType(uns.choose(&strings)?.clone()),
            ResponseTopic => Property::ResponseTopic(uns.choose(&strings)?.clone()),
            CorrelationData => Property::CorrelationData(uns.arbitrary()?),
            SubscriptionIdentifier => {
                let val: VarU32 = uns.arbitrary()?;
                Property::SubscriptionIdentifier(val)
            }
            SessionExpiryInterval => Property::SessionExpiryInterval(uns.arbitrary()?),
            AssignedClientIdentifier => {
                Property::AssignedClientIdentifier(uns.choose(&strings)?.clone())
            }
            ServerKeepAlive => Property::ServerKeepAlive(uns.arbitrary()?),
            AuthenticationMethod => {
                Property::AuthenticationMethod(uns.choose(&strings)?.clone())
            }
            AuthenticationData => Property::AuthenticationData(uns.arbitrary()?),
            RequestProblemInformation => {
                Property::RequestProblemInformation(uns.arbitrary()?)
            }
            WillDelayInterval => Property::WillDelayInterval(uns.arbitrary()?),
            RequestResponseInformation => {
                Property::RequestResponseInformation(uns.arbitrary()?)
            }
            ResponseInformation => Property::ResponseInformation(uns.choose(&strings)?.clone()),
            ServerReference => Property::ServerReference(uns.choose(&strings)?.clone()),
            ReasonString => Property::ReasonString(uns.choose(&strings)?.clone()),
            ReceiveMaximum => Property::ReceiveMaximum(uns.arbitrary()?),
            TopicAliasMaximum => Property::TopicAliasMaximum(uns.arbitrary()?),
            TopicAlias => Property::TopicAlias(uns.arbitrary()?),
            MaximumQoS => Property::MaximumQoS(uns.arbitrary::<u8>()? % 2),
            RetainAvailable => Property::RetainAvailable(uns.arbitrary::<u8>()? % 2),
            UserProp => {
                let key = uns.choose(&keys)?.clone();
                let val = uns.choose(&vals)?.clone();
                Property::UserProp((key, val))
            }
            MaximumPacketSize => Property::MaximumPacketSize(uns.arbitrary()?),
            WildcardSubscriptionAvailable => {
                Property::WildcardSubscriptionAvailable(uns.arbitrary::<u8>()? % 2)
            }
            SubscriptionIdentifierAvailable => {
                Property::SubscriptionIdentifierAvailable(uns.arbitrary::<u8>()? % 2)
            }
            SharedSubscriptionAvailable => {
                Property::SharedSubscriptionAvailable(uns.arbitrary::<u8>()? % 2)
            }
        };

        Ok(prop)
    }
}

impl Packetize for Property {
    fn decode<T: AsRef<[u8]>>(stream: T) -> Result<(Self, usize)> {
        use PropertyType::*;

        let mut stream: &[u8] = stream.as_ref();

        let (prop_type, n) = dec_field!(VarU32, stream, 0);
        stream = advance(stream, n)?;

        let (property, m) = match PropertyType::try_from(*prop_type)? {
            PayloadFormatIndicator => dec_prop!(PayloadFormatIndicator, u8, stream),
            MessageExpiryInterval => dec_prop!(MessageExpiryInterval, u32, stream),
            ContentType => dec_prop!(ContentType, String, stream),
            ResponseTopic => dec_prop!(ResponseTopic, String, stream),
            CorrelationData => dec_prop!(CorrelationData, Vec<u8>, stream),
            SubscriptionIdentifier => dec_prop!(SubscriptionIdentifier, VarU32, stream),
            SessionExpiryInterval => dec_prop!(SessionExpiryInterval, u32, stream),
            AssignedClientIdentifier => {
                dec_prop!(AssignedClientIdentifier, String, stream)
            }
            ServerKeepAlive => dec_prop!(ServerKeepAlive, u16, stream),
            AuthenticationMethod => dec_prop!(AuthenticationMethod, String, stream),
            AuthenticationData => dec_prop!(AuthenticationData, Vec<u8>, stream),
            RequestProblemInformation => dec_prop!(RequestProblemInformation, u8, stream),
            WillDelayInterval => dec_prop!(WillDelayInterval, u32, stream),
            RequestResponseInformation => {
                dec_prop!(RequestResponseInformation, u8, stream)
            }
            ResponseInformation => dec_prop!(ResponseInformation, String, stream),
            ServerReference => dec_prop!(ServerReference, String, stream),
            ReasonString => dec_prop!(ReasonString, String, stream),
            ReceiveMaximum => dec_prop!(ReceiveMaximum, u16, stream),
            TopicAliasMaximum => dec_prop!(TopicAliasMaximum, u16, stream),
            TopicAlias => dec_prop!(TopicAlias, u16, stream),
            MaximumQoS => dec_prop!(MaximumQoS, u8, stream),
            RetainAvailable => dec_prop!(RetainAvailable, u8, stream),
            UserProp => dec_prop!(UserProp, UserProperty, stream),
            MaximumPacketSize => dec_prop!(MaximumPacketSize, u32, stream),
            WildcardSubscriptionAvailable => {
                dec_prop!(WildcardSubscriptionAvailable, u8, stream)
            }
            SubscriptionIdentifierAvailable => {
                dec_prop!(SubscriptionIdentifierAvailable, u8, stream)
            }
            SharedSubscriptionAvailable => {
                dec_prop!(SharedSubscriptionAvailable, u8, stream)
            }
        };

        Ok((property, n + m))
    }

    fn encode(&self) -> Result<Blob> {
        use Property::*;

        let mut data = Vec::with_capacity(self.size());
        match self {
            PayloadFormatIndicator(val) => enc_prop!(data, PayloadFormatIndicator, val),
            MessageExpiryInterval(val) => enc_prop!(data, MessageExpiryInterval, val),
            ContentType(val) => enc_prop!(data, ContentType, val),
            ResponseTopic(val) => enc_prop!(data, ResponseTopic, val),
            CorrelationData(val) => enc_prop!(data, CorrelationData, val),
            SubscriptionIdentifier(val) => enc_prop!(data, SubscriptionIdentifier, val),
            SessionExpiryInterval(val) => enc_prop!(data, SessionExpiryInterval, val),
            AssignedClientIdentifier(val) => {
                enc_prop!(data, AssignedClientIdentifier, val)
            }
            ServerKeepAlive(val) => enc_prop!(data, ServerKeepAlive, val),
            AuthenticationMethod(val) => enc_prop!(data, AuthenticationMethod, val),
            AuthenticationData(val) => enc_prop!(data, AuthenticationData, val),
            RequestProblemInformation(val) => {
                enc_prop!(data, RequestProblemInformation, val)
            }
            WillDelayInterval(val) => enc_prop!(data, WillDelayInterval, val),
            RequestResponseInformation(val) => {
                enc_prop!(data, RequestResponseInformation, val)
            }
            ResponseInformation(val) => enc_prop!(data, ResponseInformation, val),
            ServerReference(val) => enc_prop!(data, ServerReference, val),
            ReasonString(val) => enc_prop!(data, ReasonString, val),
            ReceiveMaximum(val) => enc_prop!(data, ReceiveMaximum, val),
            TopicAliasMaximum(val) => enc_prop!(data, TopicAliasMaximum, val),
            TopicAlias(val) => enc_prop!(data, TopicAlias, val),
            MaximumQoS(val) => enc_prop!(data, MaximumQoS, val),
            RetainAvailable(val) => enc_prop!(data, RetainAvailable, val),
            UserProp(val) => enc_prop!(data, UserProp, val),
            MaximumPacketSize(val) => enc_prop!(data, MaximumPacketSize, val),
            WildcardSubscriptionAvailable(val) => {
                enc_prop!(data, WildcardSubscriptionAvailable, val)
            }
            SubscriptionIdentifierAvailable(val) => {
                enc_prop!(data, SubscriptionIdentifierAvailable, val)
            }
            SharedSubscriptionAvailable(val) => {
                enc_prop!(data, SharedSubscriptionAvailable, val)
            }
        };

        Ok(Blob::Large { data })
    }
}

impl Property {
    pub fn to_property_type(&self) -> PropertyType {
        use PropertyType::*;

        match self {
            Property::PayloadFormatIndicator(_) => PayloadFormatIndicator,
            Property::MessageExpiryInterval(_) => MessageExpiryInterval,
            Property::ContentType(_) => ContentType,
            Property::ResponseTopic(_) => ResponseTopic,
            Property::CorrelationData(_) => CorrelationData,
            Property::SubscriptionIdentifier(_) => SubscriptionIdentifier,
            Property::SessionExpiryInterval(_) => SessionExpiryInterval,
            Property::AssignedClientIdentifier(_) => AssignedClientIdentifier,
            Property::ServerKeepAlive(_) => ServerKeepAlive,
            Property::AuthenticationMethod(_) => AuthenticationMethod,
            Property::AuthenticationData(_) => AuthenticationData,
            Property::RequestProblemInformation(_) => RequestProblemInformation,
            Property::WillDelayInterval(_) => WillDelayInterval,
            Property::RequestResponseInformation(_) => RequestResponseInformation,
            Property::ResponseInformation(_) => ResponseInformation,
            Property::ServerReference(_) => ServerReference,
            Property::ReasonString(_) => ReasonString,
            Property::ReceiveMaximum(_) => ReceiveMaximum,
            Property::TopicAliasMaximum(_) => TopicAliasMaximum,
            Property::TopicAlias(_) => TopicAlias,
            Property::MaximumQoS(_) => MaximumQoS,
            Property::RetainAvailable(_) => RetainAvailable,
            Property::UserProp(_) => UserProp,
            Property::MaximumPacketSize(_) => MaximumPacketSize,
            Property::WildcardSubscriptionAvailable(_) => WildcardSubscriptionAvailable,
            Property::SubscriptionIdentifierAvailable(_) => {
                SubscriptionIdentifierAvailable
            }
            Property::SharedSubscriptionAvailable(_) => SharedSubscriptionAvailable,
        }
    }

    /// Encoded size, property identifier included.
    pub fn size(&self) -> usize {
        use Property::*;

        let val = match self {
            PayloadFormatIndicator(_)
            | RequestProblemInformation(_)
            | RequestResponseInformation(_)
            | MaximumQoS(_)
            | RetainAvailable(_)
            | WildcardSubscriptionAvailable(_)
            | SubscriptionIdentifierAvailable(_)
            | SharedSubscriptionAvailable(_) => 1,
            ServerKeepAlive(_) | ReceiveMaximum(_) | TopicAliasMaximum(_) | TopicAlias(_) => 2,
            MessageExpiryInterval(_)
            | SessionExpiryInterval(_)
            | WillDelayInterval(_)
            | MaximumPacketSize(_) => 4,
            ContentType(s)
            | ResponseTopic(s)
            | AssignedClientIdentifier(s)
            | AuthenticationMethod(s)
            | ResponseInformation(s)
            | ServerReference(s)
            | ReasonString(s) => 2 + s.len(),
            CorrelationData(b) | AuthenticationData(b) => 2 + b.len(),
            SubscriptionIdentifier(val) => val.size(),
            UserProp((key, val)) => 4 + key.len() + val.len(),
        };

        VarU32(self.to_property_type() as u32).size() + val
    }
}

/// Ordered list of properties, the MQTT-5 property block. Order is preserved
/// across decode and encode so that re-serialization is byte exact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties(pub Vec<Property>);

#[cfg(any(feature = "fuzzy", test))]
impl<'a> Arbitrary<'a> for Properties {
    fn arbitrary(uns: &mut Unstructured<'a>) -> result::Result<Self, ArbitraryError> {
        let n = uns.arbitrary::<u8>()? % 4;
        let mut props = vec![];
        for _ in 0..n {
            props.push(uns.arbitrary()?);
        }
        Ok(Properties(props))
    }
}

impl Packetize for Properties {
    fn decode<T: AsRef<[u8]>>(stream: T) -> Result<(Self, usize)> {
        let stream: &[u8] = stream.as_ref();

        let (len, m) = dec_field!(VarU32, stream, 0);
        let end = m + usize::try_from(*len)?;
        if end > stream.len() {
            err!(InsufficientBytes, code: MalformedPacket, "property-len {}", *len)?;
        }

        let block = &stream[..end];
        let (mut props, mut n) = (vec![], m);
        while n < end {
            let (prop, k) = dec_field!(Property, block, n);
            props.push(prop);
            n = k;
        }

        Ok((Properties(props), n))
    }

    fn encode(&self) -> Result<Blob> {
        let len = self.len();

        let mut data = Vec::with_capacity(self.size());
        data.extend_from_slice(VarU32(u32::try_from(len)?).encode()?.as_ref());
        for prop in self.0.iter() {
            data.extend_from_slice(prop.encode()?.as_ref());
        }

        Ok(Blob::Large { data })
    }
}

impl fmt::Display for Properties {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        let props: Vec<String> = self.0.iter().map(|p| format!("{:?}", p)).collect();
        write!(f, "[{}]", props.join(", "))
    }
}

impl Properties {
    pub fn new() -> Properties {
        Properties::default()
    }

    /// Property block carrying just the session-expiry interval, in seconds.
    pub fn with_session_expiry(secs: u32) -> Properties {
        Properties(vec![Property::SessionExpiryInterval(secs)])
    }

    pub fn push(&mut self, prop: Property) {
        self.0.push(prop)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Byte length of the properties, not counting the length prefix.
    pub fn len(&self) -> usize {
        self.0.iter().map(|p| p.size()).sum()
    }

    /// Encoded size of the block, length prefix included.
    pub fn size(&self) -> usize {
        let len = self.len();
        // lengths beyond u32 fail at encode.
        VarU32(u32::try_from(len).unwrap_or(u32::MAX)).size() + len
    }

    pub fn session_expiry_interval(&self) -> Option<u32> {
        self.0.iter().find_map(|p| match p {
            Property::SessionExpiryInterval(val) => Some(*val),
            _ => None,
        })
    }

    pub fn reason_string(&self) -> Option<&str> {
        self.0.iter().find_map(|p| match p {
            Property::ReasonString(val) => Some(val.as_str()),
            _ => None,
        })
    }

    pub fn user_properties(&self) -> Vec<&UserProperty> {
        self.0
            .iter()
            .filter_map(|p| match p {
                Property::UserProp(val) => Some(val),
                _ => None,
            })
            .collect()
    }
}

/// Size of a length prefixed UTF8 string or binary field.
pub(crate) fn field_len(bytes: &[u8]) -> usize {
    2 + bytes.len()
}

/// Size of an optional property block, zero when absent.
pub(crate) fn props_len(props: &Option<Properties>) -> usize {
    props.as_ref().map(|p| p.size()).unwrap_or(0)
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
