//! Module implement the conformance oracle, deciding whether a packet received
//! from the broker is the packet a test step expected.
//!
//! Matching is byte oriented, [compare] accepts byte-exact messages, and for
//! MQTT-5 a relaxed per-type equivalence. [match_unordered] pairs up sets of
//! messages that may arrive in any order. [Scorecard] accumulates per step
//! outcomes for a whole test sequence.

use log::{info, warn};

use std::{fmt, result};

use crate::mqtt::{Packet, PacketType, Publish};
use crate::{Error, ErrorKind, Message, MqttProtocol, Result};

/// First observed difference between two byte sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difference {
    Length { got: usize, expected: usize },
    Byte { offset: usize, got: u8, expected: u8 },
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        match self {
            Difference::Length { got, expected } => {
                write!(f, "length {} expected {}", got, expected)
            }
            Difference::Byte { offset, got, expected } => write!(
                f,
                "byte at offset {} 0x{:02X} expected 0x{:02X}",
                offset, got, expected
            ),
        }
    }
}

/// Length difference is reported ahead of byte differences.
pub fn first_difference(got: &[u8], expected: &[u8]) -> Option<Difference> {
    if got.len() != expected.len() {
        return Some(Difference::Length { got: got.len(), expected: expected.len() });
    }

    got.iter()
        .zip(expected.iter())
        .enumerate()
        .find(|(_, (g, e))| g != e)
        .map(|(offset, (g, e))| Difference::Byte { offset, got: *g, expected: *e })
}

/// How a received message satisfied the expected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Exact,
    Relaxed,
}

/// Same as [compare_with], without ignoring QoS.
pub fn compare(got: &Message, expected: &Message) -> Result<Verdict> {
    compare_with(got, expected, false)
}

/// Compare `got` against `expected`.
///
/// Byte-exact messages match. Otherwise, when both header bytes are equal and
/// protocol is MQTT-5, acknowledgements are compared on packet-id and reason
/// code alone, refer to [relaxed_eq]. When `ignore_qos` is true and the
/// expected message is MQTT-3.1, header QoS bits are not compared.
///
/// Mismatch is `ConformanceFailure`, its description carries both renderings.
pub fn compare_with(got: &Message, expected: &Message, ignore_qos: bool) -> Result<Verdict> {
    let (gbytes, ebytes) = (got.as_bytes(), expected.as_bytes());
    let diff = match first_difference(gbytes, ebytes) {
        None => return Ok(Verdict::Exact),
        Some(diff) => diff,
    };

    if ignore_qos && expected.proto() == MqttProtocol::V31 {
        let (ghdr, ehdr) = (got.header_byte() & 0xF9, expected.header_byte() & 0xF9);
        if ghdr == ehdr && gbytes.get(1..) == ebytes.get(1..) {
            return Ok(Verdict::Relaxed);
        }
    }

    let relaxed = expected.proto().is_v5()
        && got.header_byte() == expected.header_byte()
        && relaxed_eq(got.packet(), expected.packet());
    if relaxed {
        return Ok(Verdict::Relaxed);
    }

    warn!("oracle mismatch {}: {}", expected.packet_type(), diff);
    err!(
        ConformanceFailure,
        desc: "{}, expected {} got {}",
        diff,
        expected.render(),
        got.render()
    )
}

/// Per type equivalence for MQTT-5 acknowledgements, which brokers may encode
/// with or without optional reason code and properties.
///
/// SUBACK and UNSUBACK compare only the first return code.
pub fn relaxed_eq(got: &Packet, expected: &Packet) -> bool {
    use Packet::*;

    match (got, expected) {
        (ConnAck(g), ConnAck(e)) => {
            g.flags.is_session_present() == e.flags.is_session_present() && g.code == e.code
        }
        (PubAck(g), PubAck(e))
        | (PubRec(g), PubRec(e))
        | (PubRel(g), PubRel(e))
        | (PubComp(g), PubComp(e)) => {
            g.packet_id == e.packet_id && g.reason_code() == e.reason_code()
        }
        (SubAck(g), SubAck(e)) => {
            g.packet_id == e.packet_id && g.return_codes.first() == e.return_codes.first()
        }
        (UnsubAck(g), UnsubAck(e)) => {
            g.packet_id == e.packet_id && g.return_codes.first() == e.return_codes.first()
        }
        (_, _) => false,
    }
}

/// Header bits compared when matching unordered sets. SUBACK ignores the
/// QoS bits.
pub fn header_mask(pkt_type: PacketType) -> u8 {
    match pkt_type {
        PacketType::SubAck => 0xF9,
        _ => 0xFF,
    }
}

fn matches_unordered(got: &Message, expected: &Message) -> bool {
    let mask = header_mask(expected.packet_type());
    let (gbytes, ebytes) = (got.as_bytes(), expected.as_bytes());

    (got.header_byte() & mask) == (expected.header_byte() & mask)
        && gbytes.len() == ebytes.len()
        && gbytes.get(1..) == ebytes.get(1..)
}

/// Send acknowledgements for a matched PUBLISH, implemented by the transport.
pub trait Acknowledge {
    /// Send PUBACK.
    fn ack_qos1(&mut self, publish: &Publish) -> Result<()>;

    /// Send PUBREC, await PUBREL and send PUBCOMP.
    fn ack_qos2(&mut self, publish: &Publish) -> Result<()>;
}

/// Outcome of [match_unordered].
#[derive(Debug, Clone, Default)]
pub struct Unordered {
    /// Matched pairs of (expected, received).
    pub matched: Vec<(Message, Message)>,
    pub unmatched_expected: Vec<Message>,
    pub unmatched_received: Vec<Message>,
}

impl Unordered {
    pub fn is_ok(&self) -> bool {
        self.unmatched_expected.is_empty() && self.unmatched_received.is_empty()
    }

    /// Fail with `ConformanceFailure` listing every unmatched message.
    pub fn into_result(self) -> Result<Vec<(Message, Message)>> {
        if self.is_ok() {
            return Ok(self.matched);
        }

        let mut lines = vec![];
        for msg in self.unmatched_expected.iter() {
            warn!("oracle missing {}", msg);
            lines.push(format!("missing {}", msg.render()));
        }
        for msg in self.unmatched_received.iter() {
            warn!("oracle unexpected {}", msg);
            lines.push(format!("unexpected {}", msg.render()));
        }
        err!(ConformanceFailure, desc: "unordered match, {}", lines.join("; "))
    }
}

/// Pair each expected message with a received message, in any order.
///
/// A pair matches on masked header byte, refer to [header_mask], equal length
/// and equal bytes after the header. Matched messages are removed from both
/// pools. When `acker` is supplied, a matched PUBLISH at QoS 1 or 2 is
/// acknowledged as soon as it is paired.
pub fn match_unordered(
    expected: Vec<Message>,
    received: Vec<Message>,
    mut acker: Option<&mut dyn Acknowledge>,
) -> Result<Unordered> {
    let mut received = received;
    let mut res = Unordered::default();

    for exp in expected.into_iter() {
        let index = received.iter().position(|got| matches_unordered(got, &exp));
        match index {
            Some(index) => {
                let got = received.remove(index);
                if let (Packet::Publish(publish), Some(acker)) =
                    (got.packet(), acker.as_deref_mut())
                {
                    match publish.qos {
                        1 => acker.ack_qos1(publish)?,
                        2 => acker.ack_qos2(publish)?,
                        _ => (),
                    }
                }
                res.matched.push((exp, got));
            }
            None => res.unmatched_expected.push(exp),
        }
    }
    res.unmatched_received = received;

    Ok(res)
}

/// Pass/fail record for a sequence of test steps. Failures accumulate, a
/// failing step does not stop the sequence.
pub struct Scorecard {
    name: String,
    n_steps: usize,
    failures: Vec<(String, Error)>,
}

impl Scorecard {
    pub fn new(name: &str) -> Scorecard {
        Scorecard { name: name.to_string(), n_steps: 0, failures: Vec::default() }
    }

    /// Record outcome of `step`, return the value when it passed.
    pub fn record<T>(&mut self, step: &str, res: Result<T>) -> Option<T> {
        self.n_steps += 1;
        match res {
            Ok(val) => {
                info!("{} step {:?} passed", self.name, step);
                Some(val)
            }
            Err(err) => {
                warn!("{} step {:?} failed: {}", self.name, step, err);
                self.failures.push((step.to_string(), err));
                None
            }
        }
    }

    /// Record [compare] of `got` against `expected` as `step`.
    pub fn check(&mut self, step: &str, got: &Message, expected: &Message) -> bool {
        self.record(step, compare(got, expected)).is_some()
    }

    pub fn failures(&self) -> &[(String, Error)] {
        &self.failures
    }

    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn summary(&self) -> String {
        let n_passed = self.n_steps - self.failures.len();
        let mut s = format!("{}: {}/{} steps passed", self.name, n_passed, self.n_steps);
        for (step, err) in self.failures.iter() {
            s.push_str(&format!("\n  {}: {}", step, err));
        }
        s
    }
}

#[cfg(test)]
#[path = "oracle_test.rs"]
mod oracle_test;
