//! Package implement MQTT protocol-framing for versions 3.1, 3.1.1 and 5, along
//! with a comparator to verify a broker's responses against expected packets.
//!
//! Packets are serialized byte-exact for the chosen [MqttProtocol] and parsed
//! from raw streams without knowing their type in advance. A [Message] pairs a
//! typed packet with its wire bytes, [PacketReader] pulls messages off a blocking
//! stream, and [Client] drives request/response exchanges whose outcome is judged
//! by the [oracle] module.

#[macro_use]
mod error;

pub mod mqtt;
pub mod oracle;

mod client;
mod config;
mod message;
mod packet;
mod pktid;
mod types;
mod util;

#[cfg(any(feature = "fuzzy", test))]
pub mod fuzzy;

pub use client::{Client, Stream};
pub use config::Config;
pub use error::{Error, ErrorKind, ReasonCode};
pub use message::Message;
pub use packet::{PacketReader, Received};
pub use pktid::PacketIds;
pub use types::{utf8_length, Blob, ClientID, MqttProtocol, UserProperty, VarU32};
pub use util::{from_hex, to_hex};

/// Default port for MQTT over TCP.
pub const MQTT_PORT: u16 = 1883;

/// Result returned by this methods and functions defined in this package.
pub type Result<T> = std::result::Result<T, Error>;

/// Type alias for PacketID.
pub type PacketID = u16;

/// Trait for data-encoding and decoding of packet fields, whose wire form does
/// not change across protocol versions.
pub trait Packetize: Sized {
    /// Deserialize bytes and construct a packet's field. Return the value and the
    /// number of bytes consumed from `stream`.
    fn decode<T: AsRef<[u8]>>(stream: T) -> Result<(Self, usize)>;

    /// Serialize value into bytes.
    fn encode(&self) -> Result<Blob>;
}

/// Trait for protocol framing of control packets. Wire form depends on the
/// protocol version, which is passed on every call.
///
/// Shall return one of the following error-kind: `ProtocolError`,
/// `MalformedPacket`, `InsufficientBytes`.
pub trait Framing: Sized {
    /// Deserialize one complete packet from the head of `stream`. Bytes beyond the
    /// packet's remaining-length are left untouched.
    fn decode<T: AsRef<[u8]>>(stream: T, proto: MqttProtocol) -> Result<(Self, usize)>;

    /// Serialize packet into a single contiguous frame.
    fn encode(&self, proto: MqttProtocol) -> Result<Blob>;
}
