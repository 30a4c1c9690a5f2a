use log::{debug, trace};

use std::{io, thread, time};

use crate::mqtt::PacketType;
use crate::util::{io_error, to_hex};
use crate::{Config, Message, MqttProtocol, Packetize, VarU32};
use crate::{Error, ErrorKind, ReasonCode, Result};

const PP: &'static str = "PacketReader";

/// Outcome of reading a packet when a specific type was awaited.
#[derive(Debug, Clone, PartialEq)]
pub enum Received {
    Expected(Message),
    /// Some other packet arrived, fully parsed.
    Unexpected { expected: PacketType, msg: Message },
}

impl Received {
    pub fn is_expected(&self) -> bool {
        matches!(self, Received::Expected(_))
    }

    pub fn as_message(&self) -> &Message {
        match self {
            Received::Expected(msg) => msg,
            Received::Unexpected { msg, .. } => msg,
        }
    }

    /// Convert an unexpected arrival into `UnexpectedPacket` error.
    pub fn into_expected(self) -> Result<Message> {
        match self {
            Received::Expected(msg) => Ok(msg),
            Received::Unexpected { expected, msg } => err!(
                UnexpectedPacket,
                code: ProtocolError,
                "expected {} got {}",
                expected,
                msg.render()
            ),
        }
    }
}

/// Read MQTT packets off a blocking byte stream. The packet type is not known
/// until its first byte arrives, whatever arrives is parsed.
#[derive(Debug, Clone)]
pub struct PacketReader {
    proto: MqttProtocol,
    eof_retry: time::Duration,
    max_packet_size: u32,
}

impl PacketReader {
    pub fn new(proto: MqttProtocol) -> PacketReader {
        PacketReader {
            proto,
            eof_retry: time::Duration::from_millis(Config::DEF_EOF_RETRY_DELAY),
            max_packet_size: Config::DEF_MAX_PACKET_SIZE,
        }
    }

    pub fn from_config(config: &Config) -> Result<PacketReader> {
        let val = PacketReader {
            proto: config.protocol()?,
            eof_retry: config.eof_retry_delay(),
            max_packet_size: config.max_packet_size(),
        };
        Ok(val)
    }

    pub fn set_eof_retry(&mut self, eof_retry: time::Duration) -> &mut Self {
        self.eof_retry = eof_retry;
        self
    }

    pub fn set_max_packet_size(&mut self, max_packet_size: u32) -> &mut Self {
        self.max_packet_size = max_packet_size;
        self
    }

    pub fn proto(&self) -> MqttProtocol {
        self.proto
    }

    /// Block for the next complete packet.
    ///
    /// End of stream before the first byte is retried once, after the eof-retry
    /// delay, and only then reported as `Disconnected`. End of stream within the
    /// packet is `MalformedPacket`.
    pub fn read_message<R: io::Read>(&self, stream: &mut R) -> Result<Message> {
        let byte1 = self.read_first_byte(stream)?;

        let mut data = Vec::with_capacity(64);
        data.push(byte1);
        loop {
            let byte = read_byte(stream, "remaining-len")?;
            data.push(byte);
            match data.len() - 1 {
                _ if byte < 0x80 => break,
                n if n >= VarU32::MAX_BYTES => err!(
                    MalformedPacket,
                    code: MalformedPacket,
                    "{} continuation at remaining-len byte {}",
                    PP,
                    n
                )?,
                _ => (),
            }
        }

        let (remaining_len, _) = VarU32::decode(&data[1..])?;
        let remaining_len = usize::try_from(*remaining_len)?;
        let frame_len = data.len() + remaining_len;
        if frame_len > usize::try_from(self.max_packet_size)? {
            err!(
                MalformedPacket,
                code: PacketTooLarge,
                "{} packet size {} > {}",
                PP,
                frame_len,
                self.max_packet_size
            )?;
        }

        let m = data.len();
        data.resize(frame_len, 0);
        match stream.read_exact(&mut data[m..]) {
            Ok(()) => (),
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => err!(
                MalformedPacket,
                code: MalformedPacket,
                cause: err,
                "{} stream ended within {} bytes body",
                PP,
                remaining_len
            )?,
            Err(err) => io_error(err)?,
        }

        trace!("{} rx [{}]", PP, to_hex(&data));
        let (msg, n) = Message::parse(&data, self.proto)?;
        if n != data.len() {
            err!(
                MalformedPacket,
                code: MalformedPacket,
                "{} parsed {} bytes of {} bytes frame",
                PP,
                n,
                data.len()
            )?;
        }
        debug!("{} rx {}", PP, msg);

        Ok(msg)
    }

    /// Read the next packet, awaiting `expected`. A packet of another type is
    /// returned as [Received::Unexpected].
    pub fn read_expecting<R: io::Read>(
        &self,
        stream: &mut R,
        expected: PacketType,
    ) -> Result<Received> {
        let msg = self.read_message(stream)?;
        match msg.packet_type() {
            pkt_type if pkt_type == expected => Ok(Received::Expected(msg)),
            pkt_type => {
                debug!("{} expected {} got {}", PP, expected, pkt_type);
                Ok(Received::Unexpected { expected, msg })
            }
        }
    }

    fn read_first_byte<R: io::Read>(&self, stream: &mut R) -> Result<u8> {
        let mut retried = false;
        loop {
            let mut byte = [0_u8; 1];
            match stream.read(&mut byte) {
                Ok(1) => break Ok(byte[0]),
                Ok(_) if !retried => {
                    debug!("{} end of stream, retry after {:?}", PP, self.eof_retry);
                    thread::sleep(self.eof_retry);
                    retried = true;
                }
                Ok(_) => break err!(Disconnected, desc: "{} end of stream", PP),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => (),
                Err(err) => break io_error(err),
            }
        }
    }
}

fn read_byte<R: io::Read>(stream: &mut R, what: &str) -> Result<u8> {
    let mut byte = [0_u8; 1];
    match stream.read_exact(&mut byte) {
        Ok(()) => Ok(byte[0]),
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => err!(
            MalformedPacket,
            code: MalformedPacket,
            cause: err,
            "{} stream ended within {}",
            PP,
            what
        ),
        Err(err) => io_error(err),
    }
}

#[cfg(test)]
#[path = "packet_test.rs"]
mod packet_test;
