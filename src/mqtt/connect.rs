use std::{fmt, result};

use crate::mqtt::{field_len, FixedHeader, PacketType, Properties, Property};
use crate::{Blob, ClientID, Framing, MqttProtocol, Packetize, VarU32};
use crate::{Error, ErrorKind, Result};

const PP: &'static str = "Packet::Connect";

/// Flags byte in CONNECT's variable header.
///
/// ```txt
///   7         6         5           4   3      2          1            0
/// user-name password will-retain  will-qos  will-flag clean-start  reserved
/// ```
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct ConnectFlags(pub u8);

impl ConnectFlags {
    pub const RESERVED: u8 = 0b_0000_0001;
    pub const CLEAN_START: u8 = 0b_0000_0010;
    pub const WILL_FLAG: u8 = 0b_0000_0100;
    pub const WILL_QOS_MASK: u8 = 0b_0001_1000;
    pub const WILL_RETAIN: u8 = 0b_0010_0000;
    pub const PASSWORD: u8 = 0b_0100_0000;
    pub const USERNAME: u8 = 0b_1000_0000;

    pub fn is_clean_start(&self) -> bool {
        (self.0 & Self::CLEAN_START) > 0
    }

    pub fn is_will(&self) -> bool {
        (self.0 & Self::WILL_FLAG) > 0
    }

    pub fn will_qos(&self) -> u8 {
        (self.0 & Self::WILL_QOS_MASK) >> 3
    }

    pub fn is_will_retain(&self) -> bool {
        (self.0 & Self::WILL_RETAIN) > 0
    }

    pub fn is_password(&self) -> bool {
        (self.0 & Self::PASSWORD) > 0
    }

    pub fn is_username(&self) -> bool {
        (self.0 & Self::USERNAME) > 0
    }

    fn set(&mut self, mask: u8, on: bool) {
        match on {
            true => self.0 |= mask,
            false => self.0 &= !mask,
        }
    }
}

/// Payload of CONNECT, fields other than `client_id` are present only when
/// their flag is set.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ConnectPayload {
    pub client_id: ClientID,
    /// MQTT-5 only, written before will-topic.
    pub will_properties: Properties,
    pub will_topic: Option<String>,
    pub will_payload: Option<Vec<u8>>,
    pub username: Option<String>,
    pub password: Option<Vec<u8>>,
}

/// CONNECT Packet
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Connect {
    pub protocol_name: String,
    pub protocol_level: u8,
    pub flags: ConnectFlags,
    pub keep_alive: u16,
    /// MQTT-5 only. Empty block encodes as a single zero byte.
    pub properties: Properties,
    pub payload: ConnectPayload,
}

impl fmt::Display for Connect {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        write!(
            f,
            "CONNECT {}/{} client_id:{:?} flags:0x{:02x} keep_alive:{}",
            self.protocol_name,
            self.protocol_level,
            self.payload.client_id.as_str(),
            self.flags.0,
            self.keep_alive
        )?;
        if !self.properties.is_empty() {
            write!(f, " properties:{}", self.properties)?;
        }
        if let Some(topic) = &self.payload.will_topic {
            write!(f, " will:{:?} qos:{}", topic, self.flags.will_qos())?;
        }
        if let Some(username) = &self.payload.username {
            write!(f, " username:{:?}", username)?;
        }
        Ok(())
    }
}

impl Framing for Connect {
    fn decode<T: AsRef<[u8]>>(stream: T, proto: MqttProtocol) -> Result<(Self, usize)> {
        let stream: &[u8] = stream.as_ref();

        let (fh, n) = dec_field!(FixedHeader, stream, 0);
        fh.validate(proto)?;
        let stream = fh.frame(stream)?;

        let (protocol_name, n) = dec_field!(String, stream, n);
        let (protocol_level, n) = dec_field!(u8, stream, n);
        let (flags, n) = dec_field!(u8, stream, n);
        let flags = ConnectFlags(flags);
        let (keep_alive, n) = dec_field!(u16, stream, n);
        let (properties, n) = dec_field!(Properties, stream, n; proto.is_v5());

        let will = flags.is_will();
        let (client_id, n) = dec_field!(String, stream, n);
        let (will_properties, n) = dec_field!(Properties, stream, n; will && proto.is_v5());
        let (will_topic, n) = dec_field!(String, stream, n; will);
        let (will_payload, n) = dec_field!(Vec<u8>, stream, n; will);
        let (username, n) = dec_field!(String, stream, n; flags.is_username());
        let (password, n) = dec_field!(Vec<u8>, stream, n; flags.is_password());

        fh.consumed(n, PP)?;

        let payload = ConnectPayload {
            client_id: ClientID(client_id),
            will_properties: will_properties.unwrap_or_default(),
            will_topic,
            will_payload,
            username,
            password,
        };
        let pkt = Connect {
            protocol_name,
            protocol_level,
            flags,
            keep_alive,
            properties: properties.unwrap_or_default(),
            payload,
        };

        Ok((pkt, n))
    }

    fn encode(&self, proto: MqttProtocol) -> Result<Blob> {
        let remlen = self.body_len(proto)?;
        let fh = FixedHeader::new(PacketType::Connect, VarU32(remlen.try_into()?))?;

        let mut data = fh.to_frame()?;
        data.extend_from_slice(self.protocol_name.encode()?.as_ref());
        data.extend_from_slice(self.protocol_level.encode()?.as_ref());
        data.extend_from_slice(self.flags.0.encode()?.as_ref());
        data.extend_from_slice(self.keep_alive.encode()?.as_ref());
        if proto.is_v5() {
            data.extend_from_slice(self.properties.encode()?.as_ref());
        }

        let payload = &self.payload;
        data.extend_from_slice(payload.client_id.0.encode()?.as_ref());
        if self.flags.is_will() {
            if proto.is_v5() {
                data.extend_from_slice(payload.will_properties.encode()?.as_ref());
            }
            let topic = flagged(&payload.will_topic, "will_topic")?;
            data.extend_from_slice(topic.encode()?.as_ref());
            let will_payload = flagged(&payload.will_payload, "will_payload")?;
            data.extend_from_slice(will_payload.encode()?.as_ref());
        }
        if self.flags.is_username() {
            let username = flagged(&payload.username, "username")?;
            data.extend_from_slice(username.encode()?.as_ref());
        }
        if self.flags.is_password() {
            let password = flagged(&payload.password, "password")?;
            data.extend_from_slice(password.encode()?.as_ref());
        }

        Ok(Blob::Large { data })
    }
}

impl Connect {
    /// CONNECT for `proto` with no will and no credentials.
    pub fn new(
        proto: MqttProtocol,
        client_id: &str,
        clean_start: bool,
        keep_alive: u16,
    ) -> Connect {
        let mut flags = ConnectFlags::default();
        flags.set(ConnectFlags::CLEAN_START, clean_start);

        let payload = ConnectPayload {
            client_id: ClientID::from(client_id),
            will_properties: Properties::default(),
            will_topic: None,
            will_payload: None,
            username: None,
            password: None,
        };
        Connect {
            protocol_name: proto.protocol_name().to_string(),
            protocol_level: u8::from(proto),
            flags,
            keep_alive,
            properties: Properties::default(),
            payload,
        }
    }

    pub fn set_will(&mut self, topic: &str, payload: &[u8], qos: u8, retain: bool) {
        self.flags.set(ConnectFlags::WILL_FLAG, true);
        self.flags.set(ConnectFlags::WILL_QOS_MASK, false);
        self.flags.0 |= (qos & 0b11) << 3;
        self.flags.set(ConnectFlags::WILL_RETAIN, retain);
        self.payload.will_topic = Some(topic.to_string());
        self.payload.will_payload = Some(payload.to_vec());
    }

    pub fn set_username(&mut self, username: Option<&str>) {
        self.flags.set(ConnectFlags::USERNAME, username.is_some());
        self.payload.username = username.map(|s| s.to_string());
    }

    pub fn set_password(&mut self, password: Option<&[u8]>) {
        self.flags.set(ConnectFlags::PASSWORD, password.is_some());
        self.payload.password = password.map(|s| s.to_vec());
    }

    /// MQTT-5 session-expiry, written as property 0x11. Replaces a previous value.
    pub fn set_session_expiry(&mut self, secs: u32) {
        self.properties.0.retain(|p| !matches!(p, Property::SessionExpiryInterval(_)));
        self.properties.push(Property::SessionExpiryInterval(secs));
    }

    pub fn client_id(&self) -> &str {
        self.payload.client_id.as_str()
    }

    fn body_len(&self, proto: MqttProtocol) -> Result<usize> {
        let payload = &self.payload;

        let mut n = field_len(self.protocol_name.as_bytes()) + 1 + 1 + 2;
        if proto.is_v5() {
            n += self.properties.size();
        }
        n += field_len(payload.client_id.as_bytes());
        if self.flags.is_will() {
            if proto.is_v5() {
                n += payload.will_properties.size();
            }
            n += field_len(flagged(&payload.will_topic, "will_topic")?.as_bytes());
            n += field_len(flagged(&payload.will_payload, "will_payload")?);
        }
        if self.flags.is_username() {
            n += field_len(flagged(&payload.username, "username")?.as_bytes());
        }
        if self.flags.is_password() {
            n += field_len(flagged(&payload.password, "password")?);
        }

        Ok(n)
    }
}

fn flagged<'a, T>(val: &'a Option<T>, what: &str) -> Result<&'a T> {
    match val {
        Some(val) => Ok(val),
        None => err!(ProtocolError, desc: "{} flag set, {} missing", PP, what),
    }
}
