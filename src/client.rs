//! Blocking client driving request/response exchanges with a broker under
//! test. Every packet sent or received is a [Message], so the exact bytes are
//! available to the [oracle](crate::oracle).

use log::{debug, info, trace};

use std::{io, net};

use crate::mqtt::{ConnAck, Disconnect, Packet, PacketType, Pub, Publish, SubAck, UnsubAck};
use crate::oracle::{self, Acknowledge, Verdict};
use crate::util::{io_error, to_hex};
use crate::{Config, Message, MqttProtocol, PacketReader, Received, ReasonCode};
use crate::{Error, ErrorKind, Result};

/// Blocking duplex byte stream, a connected socket or an in-memory stand-in.
pub trait Stream: io::Read + io::Write {
    /// Shutdown both halves of the stream.
    fn shutdown(&self) -> io::Result<()>;

    fn local_addr(&self) -> String;

    fn peer_addr(&self) -> String;
}

impl Stream for net::TcpStream {
    fn shutdown(&self) -> io::Result<()> {
        net::TcpStream::shutdown(self, net::Shutdown::Both)
    }

    fn local_addr(&self) -> String {
        match net::TcpStream::local_addr(self) {
            Ok(addr) => addr.to_string(),
            Err(_) => "-".to_string(),
        }
    }

    fn peer_addr(&self) -> String {
        match net::TcpStream::peer_addr(self) {
            Ok(addr) => addr.to_string(),
            Err(_) => "-".to_string(),
        }
    }
}

/// Client connection to the broker under test.
///
/// All calls block, reads are bounded by the configured read-timeout. Dropping
/// the client shuts down the stream.
pub struct Client<S = net::TcpStream>
where
    S: Stream,
{
    name: String,
    stream: S,
    reader: PacketReader,
    local_addr: String,
    peer_addr: String,
}

impl<S> Drop for Client<S>
where
    S: Stream,
{
    fn drop(&mut self) {
        if let Err(err) = self.stream.shutdown() {
            debug!("{} shutdown {}", self.name, err);
        }
        info!("{} closed {} -> {}", self.name, self.local_addr, self.peer_addr);
    }
}

impl Client<net::TcpStream> {
    /// Open a TCP connection to the broker described by `config`. No packets are
    /// exchanged, CONNECT is the caller's first step.
    pub fn connect(config: &Config) -> Result<Client> {
        let addr = config.address()?;
        let sock = match net::TcpStream::connect_timeout(&addr, config.connect_timeout()) {
            Ok(sock) => sock,
            Err(err) => io_error(err)?,
        };
        if let Err(err) = sock.set_read_timeout(Some(config.read_timeout())) {
            io_error(err)?;
        }
        if let Err(err) = sock.set_nodelay(true) {
            io_error(err)?;
        }

        let reader = PacketReader::from_config(config)?;
        Ok(Client::from_stream(&config.name(), sock, reader))
    }
}

impl<S> Client<S>
where
    S: Stream,
{
    /// Wrap an already connected stream.
    pub fn from_stream(name: &str, stream: S, reader: PacketReader) -> Client<S> {
        let (local_addr, peer_addr) = (stream.local_addr(), stream.peer_addr());
        info!("{} connected {} -> {} {}", name, local_addr, peer_addr, reader.proto());

        Client { name: name.to_string(), stream, reader, local_addr, peer_addr }
    }

    pub fn proto(&self) -> MqttProtocol {
        self.reader.proto()
    }

    pub fn local_addr(&self) -> &str {
        &self.local_addr
    }

    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// Build `packet` for this client's protocol.
    pub fn to_message(&self, packet: Packet) -> Result<Message> {
        Message::build(self.proto(), packet)
    }

    pub fn send(&mut self, msg: &Message) -> Result<()> {
        debug!("{} tx {}", self.name, msg);
        self.send_raw(msg.as_bytes())
    }

    /// Write bytes as they are, for packets no encoder would produce.
    pub fn send_raw(&mut self, data: &[u8]) -> Result<()> {
        trace!("{} tx [{}]", self.name, to_hex(data));
        match self.stream.write_all(data).and_then(|_| self.stream.flush()) {
            Ok(()) => Ok(()),
            Err(err) => io_error(err),
        }
    }

    /// Block for the next packet, whatever its type.
    pub fn recv(&mut self) -> Result<Message> {
        self.reader.read_message(&mut self.stream)
    }

    pub fn recv_expecting(&mut self, expected: PacketType) -> Result<Received> {
        self.reader.read_expecting(&mut self.stream, expected)
    }

    /// Block for `n` packets, in arrival order.
    pub fn recv_many(&mut self, n: usize) -> Result<Vec<Message>> {
        let mut msgs = Vec::with_capacity(n);
        for _ in 0..n {
            msgs.push(self.recv()?);
        }
        Ok(msgs)
    }

    /// Send `msg`, block for one reply and compare it with `expected`.
    pub fn send_and_ack(&mut self, msg: &Message, expected: &Message) -> Result<Verdict> {
        self.send(msg)?;
        let got = self.recv()?;
        oracle::compare(&got, expected)
    }

    /// Send `msg` and verify the reply a conforming broker must send for it.
    ///
    /// * CONNECT, accepted CONNACK without session.
    /// * SUBSCRIBE, SUBACK granting the requested QoS for every filter.
    /// * UNSUBSCRIBE, UNSUBACK with success codes.
    /// * PUBLISH, nothing at QoS 0, PUBACK at QoS 1, PUBREC then PUBCOMP at QoS 2.
    /// * PINGREQ, PINGRESP.
    ///
    /// Other packets have no derivable reply and fail with `ProtocolError`.
    pub fn send_and_acknowledge(&mut self, msg: &Message) -> Result<Verdict> {
        let proto = self.proto();
        let reply = match msg.packet() {
            Packet::Connect(_) => Packet::ConnAck(ConnAck::new(proto, false, 0)),
            Packet::Subscribe(sub) => Packet::SubAck(SubAck::from_subscribe(sub)),
            Packet::UnSubscribe(unsub) => {
                let code = ReasonCode::Success;
                Packet::UnsubAck(UnsubAck::from_unsubscribe(unsub, proto, code))
            }
            Packet::Publish(publish) => match (publish.qos, publish.packet_id) {
                (0, _) => {
                    self.send(msg)?;
                    return Ok(Verdict::Exact);
                }
                (1, Some(packet_id)) => Packet::PubAck(Pub::new_pub_ack(packet_id)),
                (2, Some(packet_id)) => return self.publish_qos2(msg, packet_id),
                (qos, packet_id) => err!(
                    ProtocolError,
                    desc: "{} publish qos:{} packet_id:{:?}",
                    self.name,
                    qos,
                    packet_id
                )?,
            },
            Packet::PingReq => Packet::PingResp,
            pkt => err!(
                ProtocolError,
                desc: "{} no reply defined for {}",
                self.name,
                pkt.to_packet_type()
            )?,
        };

        let expected = self.to_message(reply)?;
        self.send_and_ack(msg, &expected)
    }

    /// Assert that no packet arrives within the read-timeout.
    pub fn expect_silence(&mut self) -> Result<()> {
        match self.recv() {
            Ok(msg) => err!(
                ConformanceFailure,
                desc: "{} expected silence got {}",
                self.name,
                msg.render()
            ),
            Err(err) if err.is_timeout() => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Send a plain DISCONNECT.
    pub fn disconnect(&mut self) -> Result<()> {
        let msg = self.to_message(Packet::Disconnect(Disconnect::new()))?;
        self.send(&msg)
    }

    fn publish_qos2(&mut self, msg: &Message, packet_id: u16) -> Result<Verdict> {
        let pubrec = self.to_message(Packet::PubRec(Pub::new_pub_rec(packet_id)))?;
        let verdict = self.send_and_ack(msg, &pubrec)?;

        let pubrel = self.to_message(Packet::PubRel(Pub::new_pub_rel(packet_id)))?;
        let pubcomp = self.to_message(Packet::PubComp(Pub::new_pub_comp(packet_id)))?;
        match self.send_and_ack(&pubrel, &pubcomp)? {
            Verdict::Exact => Ok(verdict),
            Verdict::Relaxed => Ok(Verdict::Relaxed),
        }
    }

    fn publish_packet_id(&self, publish: &Publish) -> Result<u16> {
        match publish.packet_id {
            Some(packet_id) => Ok(packet_id),
            None => err!(
                ProtocolError,
                desc: "{} qos:{} publish without packet_id",
                self.name,
                publish.qos
            ),
        }
    }
}

impl<S> Acknowledge for Client<S>
where
    S: Stream,
{
    fn ack_qos1(&mut self, publish: &Publish) -> Result<()> {
        let packet_id = self.publish_packet_id(publish)?;
        let puback = self.to_message(Packet::PubAck(Pub::new_pub_ack(packet_id)))?;
        self.send(&puback)
    }

    fn ack_qos2(&mut self, publish: &Publish) -> Result<()> {
        let packet_id = self.publish_packet_id(publish)?;
        let pubrec = self.to_message(Packet::PubRec(Pub::new_pub_rec(packet_id)))?;
        let pubrel = self.to_message(Packet::PubRel(Pub::new_pub_rel(packet_id)))?;
        self.send(&pubrec)?;

        let got = self.recv_expecting(PacketType::PubRel)?.into_expected()?;
        oracle::compare(&got, &pubrel)?;

        let pubcomp = self.to_message(Packet::PubComp(Pub::new_pub_comp(packet_id)))?;
        self.send(&pubcomp)
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;
