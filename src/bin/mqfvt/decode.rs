use structopt::StructOpt;

use crate::{Opt, Result, SubCommand};
use mqfvt::{from_hex, Message, MqttProtocol};

#[derive(Clone, StructOpt)]
pub struct Decode {
    /// Protocol level, 3, 4 or 5.
    #[structopt(long = "protocol", default_value = "4")]
    protocol: u8,

    /// Packet bytes in hex, whitespace and 0x prefixes are ignored.
    hex: Vec<String>,
}

pub fn run(opts: Opt) -> Result<()> {
    let decode = match &opts.subcmd {
        SubCommand::Decode(decode) => decode.clone(),
        _ => unreachable!(),
    };

    let proto = MqttProtocol::try_from(decode.protocol).map_err(|e| e.to_string())?;
    let bytes = from_hex(&decode.hex.join(" ")).map_err(|e| e.to_string())?;

    let mut stream = bytes.as_slice();
    while !stream.is_empty() {
        let (msg, n) = Message::parse(stream, proto).map_err(|e| e.to_string())?;
        println!("{}", msg.render());
        stream = &stream[n..];
    }

    Ok(())
}
