use std::cell::Cell;

use crate::PacketID;

/// Allocate packet identifiers, starting from 1 and skipping 0 on wrap-around.
///
/// Single threaded, share it between clients of the same thread with
/// `Rc<PacketIds>`.
#[derive(Debug)]
pub struct PacketIds {
    next: Cell<PacketID>,
}

impl Default for PacketIds {
    fn default() -> PacketIds {
        PacketIds::new()
    }
}

impl PacketIds {
    pub fn new() -> PacketIds {
        PacketIds { next: Cell::new(1) }
    }

    pub fn next_id(&self) -> PacketID {
        let packet_id = self.next.get();
        self.next.set(match packet_id.wrapping_add(1) {
            0 => 1,
            n => n,
        });
        packet_id
    }

    /// Identifier that the next call to [PacketIds::next_id] will return.
    pub fn peek(&self) -> PacketID {
        self.next.get()
    }
}

#[cfg(test)]
#[path = "pktid_test.rs"]
mod pktid_test;
