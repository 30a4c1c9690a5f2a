use log::info;
use structopt::StructOpt;

use std::path;

use crate::{Opt, Result, SubCommand};
use mqfvt::mqtt::{Connect, Packet};
use mqfvt::{oracle::Scorecard, Client, Config};

#[derive(Clone, StructOpt)]
pub struct Ping {
    /// Session configuration, toml.
    #[structopt(long = "config")]
    config_loc: Option<path::PathBuf>,
}

pub fn run(opts: Opt) -> Result<()> {
    let ping = match &opts.subcmd {
        SubCommand::Ping(ping) => ping.clone(),
        _ => unreachable!(),
    };

    let config = match &ping.config_loc {
        Some(loc) => {
            info!("config_location {:?}", loc.to_str());
            Config::from_file(loc).map_err(|e| e.to_string())?
        }
        None => {
            info!("using default configuration");
            Config::default()
        }
    };
    let proto = config.protocol().map_err(|e| e.to_string())?;

    let mut card = Scorecard::new(&config.name());
    let mut client = Client::connect(&config).map_err(|e| e.to_string())?;

    let client_id = config.client_id();
    let connect = Connect::new(proto, &client_id, true, config.keep_alive());
    let res = client
        .to_message(Packet::Connect(connect))
        .and_then(|msg| client.send_and_acknowledge(&msg));
    card.record("connect", res);

    let res = client
        .to_message(Packet::PingReq)
        .and_then(|msg| client.send_and_acknowledge(&msg));
    card.record("ping", res);

    card.record("disconnect", client.disconnect());

    println!("{}", card.summary());
    match card.passed() {
        true => Ok(()),
        false => Err(format!("{} failed steps", card.failures().len())),
    }
}
