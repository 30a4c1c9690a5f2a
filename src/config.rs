use serde::de::DeserializeOwned;
use serde::Deserialize;

use std::{fs, net, path, time};

use crate::{ClientID, MqttProtocol, VarU32, MQTT_PORT};
use crate::{Error, ErrorKind, Result};

/// Configuration for a verification session against a single broker.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// Human readable name for this session, used in logs.
    /// * **Default**: [Config::DEF_NAME]
    pub name: Option<String>,

    /// Broker's host name or ip-address.
    /// * **Default**: [Config::DEF_HOST]
    pub host: Option<String>,

    /// Broker's MQTT port.
    /// * **Default**: [MQTT_PORT]
    pub port: Option<u16>,

    /// Protocol level, 3 for MQTT-3.1, 4 for MQTT-3.1.1 and 5 for MQTT-5.
    /// * **Default**: [Config::DEF_PROTOCOL]
    pub protocol: Option<u8>,

    /// Client identifier to use in CONNECT.
    /// * **Default**: uuid-v4, generated per call.
    pub client_id: Option<String>,

    /// Timeout for establishing the TCP connection, in milliseconds.
    /// * **Default**: [Config::DEF_CONNECT_TIMEOUT]
    pub connect_timeout: Option<u64>,

    /// Read timeout on the socket, in milliseconds. Waiting for a packet beyond
    /// this period fails with `Timeout`, which is also how silence is asserted.
    /// * **Default**: [Config::DEF_READ_TIMEOUT]
    pub read_timeout: Option<u64>,

    /// Delay before the single retry, when the stream ends before the first byte
    /// of a packet, in milliseconds.
    /// * **Default**: [Config::DEF_EOF_RETRY_DELAY]
    pub eof_retry_delay: Option<u64>,

    /// Keep-alive to send in CONNECT, in seconds.
    /// * **Default**: [Config::DEF_KEEP_ALIVE]
    pub keep_alive: Option<u16>,

    /// Largest packet accepted from the broker, fixed header included.
    /// * **Default**: [Config::DEF_MAX_PACKET_SIZE]
    pub max_packet_size: Option<u32>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            name: Some(Self::DEF_NAME.to_string()),
            host: Some(Self::DEF_HOST.to_string()),
            port: Some(MQTT_PORT),
            protocol: Some(Self::DEF_PROTOCOL),
            client_id: None,
            connect_timeout: Some(Self::DEF_CONNECT_TIMEOUT),
            read_timeout: Some(Self::DEF_READ_TIMEOUT),
            eof_retry_delay: Some(Self::DEF_EOF_RETRY_DELAY),
            keep_alive: Some(Self::DEF_KEEP_ALIVE),
            max_packet_size: Some(Self::DEF_MAX_PACKET_SIZE),
        }
    }
}

impl Config {
    /// Refer to [Config::name]
    pub const DEF_NAME: &'static str = "mqfvt";
    /// Refer to [Config::host]
    pub const DEF_HOST: &'static str = "127.0.0.1";
    /// Refer to [Config::protocol]
    pub const DEF_PROTOCOL: u8 = 4;
    /// Refer to [Config::connect_timeout]
    pub const DEF_CONNECT_TIMEOUT: u64 = 5000; // in milliseconds.
    /// Refer to [Config::read_timeout]
    pub const DEF_READ_TIMEOUT: u64 = 1000; // in milliseconds.
    /// Refer to [Config::eof_retry_delay]
    pub const DEF_EOF_RETRY_DELAY: u64 = 10_000; // in milliseconds.
    /// Refer to [Config::keep_alive]
    pub const DEF_KEEP_ALIVE: u16 = 60; // in seconds.
    /// Refer to [Config::max_packet_size]
    pub const DEF_MAX_PACKET_SIZE: u32 = 268_435_460;

    /// Construct a new configuration from a file located by `loc`.
    pub fn from_file<P>(loc: P) -> Result<Config>
    where
        P: AsRef<path::Path>,
    {
        let config: Config = load_toml(loc)?;
        config.validate()?;
        Ok(config)
    }

    /// Check configured values for sanity.
    pub fn validate(&self) -> Result<()> {
        self.protocol()?;

        if self.port() == 0 {
            err!(InvalidInput, desc: "config port 0")?;
        }
        if self.connect_timeout().is_zero() {
            err!(InvalidInput, desc: "config connect_timeout 0")?;
        }
        if self.read_timeout().is_zero() {
            err!(InvalidInput, desc: "config read_timeout 0")?;
        }
        match self.max_packet_size.unwrap_or(Self::DEF_MAX_PACKET_SIZE) {
            n if n < 2 || n > Self::DEF_MAX_PACKET_SIZE => {
                err!(InvalidInput, desc: "config max_packet_size {}", n)?
            }
            _ => (),
        }

        Ok(())
    }

    pub fn name(&self) -> String {
        self.name.clone().unwrap_or_else(|| Self::DEF_NAME.to_string())
    }

    pub fn host(&self) -> String {
        self.host.clone().unwrap_or_else(|| Self::DEF_HOST.to_string())
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(MQTT_PORT)
    }

    pub fn protocol(&self) -> Result<MqttProtocol> {
        let level = self.protocol.unwrap_or(Self::DEF_PROTOCOL);
        match MqttProtocol::try_from(level) {
            Ok(proto) => Ok(proto),
            Err(err) => err!(InvalidInput, cause: err, "config protocol {}", level),
        }
    }

    pub fn client_id(&self) -> ClientID {
        match &self.client_id {
            Some(client_id) => ClientID(client_id.clone()),
            None => ClientID::new_uuid_v4(),
        }
    }

    /// Resolve host and port, first address wins.
    pub fn address(&self) -> Result<net::SocketAddr> {
        use std::net::ToSocketAddrs;

        let (host, port) = (self.host(), self.port());
        let mut addrs = err!(
            InvalidInput,
            try: (host.as_str(), port).to_socket_addrs(),
            "resolve {}:{}",
            host,
            port
        )?;
        match addrs.next() {
            Some(addr) => Ok(addr),
            None => err!(InvalidInput, desc: "no address for {}:{}", host, port),
        }
    }

    pub fn connect_timeout(&self) -> time::Duration {
        let millis = self.connect_timeout.unwrap_or(Self::DEF_CONNECT_TIMEOUT);
        time::Duration::from_millis(millis)
    }

    pub fn read_timeout(&self) -> time::Duration {
        let millis = self.read_timeout.unwrap_or(Self::DEF_READ_TIMEOUT);
        time::Duration::from_millis(millis)
    }

    pub fn eof_retry_delay(&self) -> time::Duration {
        let millis = self.eof_retry_delay.unwrap_or(Self::DEF_EOF_RETRY_DELAY);
        time::Duration::from_millis(millis)
    }

    pub fn keep_alive(&self) -> u16 {
        self.keep_alive.unwrap_or(Self::DEF_KEEP_ALIVE)
    }

    /// Largest packet, never more than what a 4-byte remaining-length allows.
    pub fn max_packet_size(&self) -> u32 {
        let max = *VarU32::MAX + 5;
        self.max_packet_size.unwrap_or(Self::DEF_MAX_PACKET_SIZE).min(max)
    }
}

fn load_toml<P, T>(loc: P) -> Result<T>
where
    P: AsRef<path::Path>,
    T: DeserializeOwned,
{
    use std::str::from_utf8;

    let ploc: &path::Path = loc.as_ref();
    let data = err!(IOError, try: fs::read(ploc), "reading config from {:?}", ploc)?;
    let s = err!(FailConvert, try: from_utf8(&data), "config not utf8 {:?}", ploc)?;
    err!(FailConvert, try: toml::from_str(s), "config not toml {:?}", ploc)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
