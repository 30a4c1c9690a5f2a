use std::{fmt::Write, io};

use crate::{Error, ErrorKind, ReasonCode, Result};

pub fn advance(stream: &[u8], n: usize) -> Result<&[u8]> {
    if n <= stream.len() {
        Ok(&stream[n..])
    } else {
        err!(InsufficientBytes, code: MalformedPacket, "insufficient bytes in packet")
    }
}

/// Wrap a socket error, timeouts and disconnections keep their own kinds.
pub fn io_error<T>(err: io::Error) -> Result<T> {
    let e = Error::from(err);
    log_error!(e);
    Err(e)
}

/// Render bytes as space separated, two-digit upper-case hex.
pub fn to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 3);
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            s.push(' ');
        }
        write!(s, "{:02X}", byte).ok();
    }
    s
}

/// Parse hex text into bytes, ignoring whitespace, `0x` prefixes and commas.
pub fn from_hex(text: &str) -> Result<Vec<u8>> {
    let digits: String = text
        .split(|ch: char| ch.is_whitespace() || ch == ',')
        .map(|tok| tok.trim_start_matches("0x").trim_start_matches("0X"))
        .collect();

    if digits.len() % 2 != 0 {
        err!(InvalidInput, desc: "odd number of hex digits {}", digits.len())?;
    }

    let mut out = Vec::with_capacity(digits.len() / 2);
    for i in (0..digits.len()).step_by(2) {
        let byte = match digits.get(i..i + 2) {
            Some(pair) => u8::from_str_radix(pair, 16),
            None => err!(InvalidInput, desc: "non-ascii hex input")?,
        };
        out.push(err!(FailConvert, try: byte, "hex digit at {}", i)?);
    }

    Ok(out)
}

#[cfg(test)]
#[path = "util_test.rs"]
mod util_test;
